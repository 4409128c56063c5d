//! Query builders for PostgrestClient

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use super::filter::{Filter, FilterOperator};
use super::types::{with_api_details, ReturnOption};
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};

/// Endpoint and credentials shared by every builder
#[derive(Clone)]
pub(crate) struct Target {
    pub(crate) client: Client,
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) client_info: String,
    pub(crate) token: Option<String>,
}

impl Target {
    fn prepare<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = self.token.as_deref().unwrap_or(&self.key);
        builder
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .bearer_auth(token)
    }
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_param).collect()
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    target: Target,
    columns: String,
    filters: Vec<Filter>,
    order: Option<String>,
}

impl SelectBuilder {
    pub(crate) fn new(target: Target, columns: &str) -> Self {
        Self {
            target,
            columns: columns.to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.filters.push(Filter::new(column, FilterOperator::Eq, value));
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order = Some(format!("{}.{}", column, direction));
        self
    }

    /// Execute the query and return the rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut fetch = self
            .target
            .prepare(Fetch::get(&self.target.client, &self.target.url))
            .query_param("select", &self.columns)
            .query(&filter_params(&self.filters));
        if let Some(order) = &self.order {
            fetch = fetch.query_param("order", order);
        }

        fetch.execute::<Vec<T>>().await.map_err(with_api_details)
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    target: Target,
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self { target, values }
    }

    /// Insert and return the created rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        self.target
            .prepare(Fetch::post(&self.target.client, &self.target.url))
            .header("Prefer", ReturnOption::Representation.prefer_header())
            .json(&self.values)?
            .execute::<Vec<R>>()
            .await
            .map_err(with_api_details)
    }

    /// Insert a single row and return it
    pub async fn execute_single<R: DeserializeOwned>(&self) -> Result<R> {
        self.execute::<R>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::persistence("insert returned no row"))
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    target: Target,
    values: T,
    filters: Vec<Filter>,
}

impl<T: Serialize> UpdateBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            filters: Vec::new(),
        }
    }

    /// Restrict the update to rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.filters.push(Filter::new(column, FilterOperator::Eq, value));
        self
    }

    fn request(&self, returning: ReturnOption) -> Result<FetchBuilder<'_>> {
        self.target
            .prepare(Fetch::patch(&self.target.client, &self.target.url))
            .header("Prefer", returning.prefer_header())
            .query(&filter_params(&self.filters))
            .json(&self.values)
    }

    /// Update and return the affected rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        self.request(ReturnOption::Representation)?
            .execute::<Vec<R>>()
            .await
            .map_err(with_api_details)
    }

    /// Update without asking for the rows back
    pub async fn execute_no_return(&self) -> Result<()> {
        self.request(ReturnOption::Minimal)?
            .execute_empty()
            .await
            .map_err(with_api_details)
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    target: Target,
    filters: Vec<Filter>,
}

impl DeleteBuilder {
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            filters: Vec::new(),
        }
    }

    /// Restrict the delete to rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.filters.push(Filter::new(column, FilterOperator::Eq, value));
        self
    }

    /// Execute the delete.
    /// Refuses to run without a filter so a table is never wiped by accident.
    pub async fn execute(&self) -> Result<()> {
        if self.filters.is_empty() {
            return Err(Error::validation("delete requires at least one filter"));
        }
        self.target
            .prepare(Fetch::delete(&self.target.client, &self.target.url))
            .header("Prefer", ReturnOption::Minimal.prefer_header())
            .query(&filter_params(&self.filters))
            .execute_empty()
            .await
            .map_err(with_api_details)
    }
}

/// Builder for stored procedure calls
pub struct RpcBuilder<T: Serialize> {
    target: Target,
    params: T,
}

impl<T: Serialize> RpcBuilder<T> {
    pub(crate) fn new(target: Target, params: T) -> Self {
        Self { target, params }
    }

    fn request(&self) -> Result<FetchBuilder<'_>> {
        self.target
            .prepare(Fetch::post(&self.target.client, &self.target.url))
            .json(&self.params)
    }

    /// Call the function and parse its result
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R> {
        self.request()?
            .execute::<R>()
            .await
            .map_err(with_api_details)
    }

    /// Call a function returning void
    pub async fn execute_empty(&self) -> Result<()> {
        self.request()?
            .execute_empty()
            .await
            .map_err(with_api_details)
    }
}
