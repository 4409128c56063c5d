//! Types for the PostgrestClient

use serde::Deserialize;
use std::fmt;

use crate::error::Error;

/// Options for returning data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOption {
    /// Return the affected rows
    Representation,

    /// Return nothing
    Minimal,
}

impl ReturnOption {
    /// Value of the `Prefer` header
    pub fn prefer_header(&self) -> &'static str {
        match self {
            ReturnOption::Representation => "return=representation",
            ReturnOption::Minimal => "return=minimal",
        }
    }
}

/// Error body returned by PostgREST
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Replace a raw error body with the parsed PostgREST details when it has them
pub(crate) fn with_api_details(err: Error) -> Error {
    match err {
        Error::Request { status, message } => {
            let message = match serde_json::from_str::<PostgrestApiErrorDetails>(&message) {
                Ok(details) if details != PostgrestApiErrorDetails::default() => {
                    details.to_string()
                }
                _ => message,
            };
            Error::Request { status, message }
        }
        other => other,
    }
}
