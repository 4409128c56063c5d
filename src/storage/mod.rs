//! Storage operations for resume uploads

mod types;

use bytes::Bytes;
use reqwest::{multipart, Client};
use std::path::Path;

use crate::config::TrackerOptions;
use crate::error::Result;
use crate::fetch::{request_error, Fetch};

pub use types::*;

/// Client for object storage
#[derive(Clone)]
pub struct StorageClient {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// Value of the `X-Client-Info` header
    client_info: String,

    /// HTTP client used for requests
    client: Client,

    /// Bearer token; the anon key is used when absent
    token: Option<String>,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    /// Reference to the storage client
    storage: &'a StorageClient,

    /// The bucket ID
    bucket_id: String,
}

impl StorageClient {
    /// Create a new StorageClient
    pub(crate) fn new(url: &str, key: &str, client: Client, options: &TrackerOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client_info: options.client_info.clone(),
            client,
            token: None,
        }
    }

    /// A client acting as the holder of `token`
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }

    /// Get the base URL for storage operations
    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    fn bearer(&self) -> &str {
        self.token.as_deref().unwrap_or(&self.key)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient<'_> {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketClient<'a> {
    /// Upload a file to the bucket
    pub async fn upload(
        &self,
        path: &str,
        data: Bytes,
        options: FileOptions,
    ) -> Result<UploadedObject> {
        let url = self
            .storage
            .storage_url(&format!("/object/{}/{}", self.bucket_id, path));

        let file_name = Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let part = multipart::Part::bytes(data.to_vec())
            .file_name(file_name)
            .mime_str(&options.content_type)?;
        let form = multipart::Form::new()
            .text("cacheControl", options.cache_control.clone())
            .part("file", part);

        log::debug!("Uploading {} to bucket {}", path, self.bucket_id);
        let response = self
            .storage
            .client
            .post(&url)
            .header("apikey", &self.storage.key)
            .header("X-Client-Info", &self.storage.client_info)
            .bearer_auth(self.storage.bearer())
            .header("Cache-Control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(request_error(response).await);
        }

        Ok(response.json::<UploadedObject>().await?)
    }

    /// Public URL of an object in a public bucket. No request is made.
    pub fn get_public_url(&self, path: &str) -> String {
        self.storage.storage_url(&format!(
            "/object/public/{}/{}",
            self.bucket_id,
            path.trim_start_matches('/')
        ))
    }

    /// Remove objects from the bucket
    pub async fn remove(&self, paths: &[String]) -> Result<Vec<FileObject>> {
        let url = self
            .storage
            .storage_url(&format!("/object/{}", self.bucket_id));

        Fetch::delete(&self.storage.client, &url)
            .header("apikey", &self.storage.key)
            .header("X-Client-Info", &self.storage.client_info)
            .bearer_auth(self.storage.bearer())
            .json(&RemoveRequest { prefixes: paths })?
            .execute::<Vec<FileObject>>()
            .await
    }
}
