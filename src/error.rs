//! Error handling for the job tracker client

use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the job tracker
#[derive(Error, Debug)]
pub enum Error {
    /// Row create/read/update/delete failed against the remote store
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Blob upload, public URL resolution or removal failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Session operation failed or nobody is signed in
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A draft, patch or file was rejected before reaching the gateway
    #[error("Validation error: {0}")]
    Validation(String),

    /// The application is not present in local state
    #[error("Application not found: {0}")]
    NotFound(String),

    /// The requested lifecycle transition is not allowed
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Response body or parsed error message
        message: String,
    },

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT decoding errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl Error {
    /// Create a new persistence error
    pub fn persistence<T: fmt::Display>(msg: T) -> Self {
        Error::Persistence(msg.to_string())
    }

    /// Create a new upload error
    pub fn upload<T: fmt::Display>(msg: T) -> Self {
        Error::Upload(msg.to_string())
    }

    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Fold a low-level failure into a persistence error.
    /// Service-level variants pass through untouched.
    pub(crate) fn into_persistence(self) -> Self {
        match self {
            Error::Http(_) | Error::Json(_) | Error::Url(_) | Error::Request { .. } => {
                Error::Persistence(self.to_string())
            }
            other => other,
        }
    }

    /// Fold a low-level failure into an upload error
    pub(crate) fn into_upload(self) -> Self {
        match self {
            Error::Http(_) | Error::Json(_) | Error::Url(_) | Error::Request { .. } => {
                Error::Upload(self.to_string())
            }
            other => other,
        }
    }

    /// Fold a low-level failure into an authentication error
    pub(crate) fn into_auth(self) -> Self {
        match self {
            Error::Http(_)
            | Error::Json(_)
            | Error::Url(_)
            | Error::Jwt(_)
            | Error::Request { .. } => Error::Auth(self.to_string()),
            other => other,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Request { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
