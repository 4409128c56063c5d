//! Configuration for the job tracker client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Connection settings for the hosted project.
/// Load these from the environment or a secure config source.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// The base URL for the project
    pub url: Url,

    /// The anonymous API key for the project
    pub anon_key: String,
}

impl TrackerConfig {
    /// Creates a new configuration, validating the URL and key
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
        })
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY` from the environment
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;
        Self::new(&url, &anon_key)
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

/// Tuning options for the tracker
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Table holding the job applications
    pub table: String,

    /// Storage bucket for uploaded resumes
    pub resume_bucket: String,

    /// Object path prefix inside the resume bucket
    pub resume_prefix: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Whether the auth client keeps the session after sign-in
    pub persist_session: bool,

    /// Buffer size of the observer channels
    pub event_capacity: usize,

    /// Value sent in the `X-Client-Info` header
    pub client_info: String,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            table: "applications".to_string(),
            resume_bucket: "resumes".to_string(),
            resume_prefix: "applications".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            persist_session: true,
            event_capacity: 64,
            client_info: format!("jobtrail/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TrackerOptions {
    /// Set the applications table
    pub fn with_table(mut self, value: &str) -> Self {
        self.table = value.to_string();
        self
    }

    /// Set the resume bucket
    pub fn with_resume_bucket(mut self, value: &str) -> Self {
        self.resume_bucket = value.to_string();
        self
    }

    /// Set the object path prefix for resumes
    pub fn with_resume_prefix(mut self, value: &str) -> Self {
        self.resume_prefix = value.trim_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the observer channel capacity (at least 1)
    pub fn with_event_capacity(mut self, value: usize) -> Self {
        self.event_capacity = value.max(1);
        self
    }
}
