//! Database operations through the PostgREST API

mod filter;
mod query;
mod types;

use reqwest::Client;
use serde::Serialize;

use crate::config::TrackerOptions;

pub use filter::*;
pub use query::*;
pub use types::*;

use query::Target;

/// Client for database operations
#[derive(Clone)]
pub struct PostgrestClient {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// Value of the `X-Client-Info` header
    client_info: String,

    /// HTTP client
    client: Client,

    /// Bearer token; the anon key is used when absent
    token: Option<String>,
}

impl PostgrestClient {
    /// Create a new PostgrestClient
    pub(crate) fn new(url: &str, key: &str, client: Client, options: &TrackerOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client_info: options.client_info.clone(),
            client,
            token: None,
        }
    }

    /// A client acting as the holder of `token`, for row level security
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }

    fn target(&self, path: &str) -> Target {
        Target {
            client: self.client.clone(),
            url: format!("{}/rest/v1/{}", self.url, path),
            key: self.key.clone(),
            client_info: self.client_info.clone(),
            token: self.token.clone(),
        }
    }

    /// Select specific columns from a table
    pub fn select(&self, table: &str, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target(table), columns)
    }

    /// Insert data into a table
    pub fn insert<T: Serialize>(&self, table: &str, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target(table), values)
    }

    /// Update data in a table
    pub fn update<T: Serialize>(&self, table: &str, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.target(table), values)
    }

    /// Delete data from a table
    pub fn delete(&self, table: &str) -> DeleteBuilder {
        DeleteBuilder::new(self.target(table))
    }

    /// Call a stored procedure or function
    pub fn rpc<T: Serialize>(&self, function: &str, params: T) -> RpcBuilder<T> {
        RpcBuilder::new(self.target(&format!("rpc/{}", function)), params)
    }
}
