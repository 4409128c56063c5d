//! Seams between the stores and the remote backend.
//!
//! The stores only ever talk to these traits. [`SupabaseGateway`] implements all
//! three over HTTP; tests plug in an in-memory double.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Duration;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::auth::{Auth, SessionChange, User};
use crate::config::{TrackerConfig, TrackerOptions};
use crate::error::{Error, Result};
use crate::model::{ApplicationPatch, JobApplication, NewRecord};
use crate::postgrest::PostgrestClient;
use crate::storage::{FileOptions, StorageClient};

/// Row CRUD for job applications
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Every record owned by `owner_id`, most recently updated first
    async fn list_records(&self, owner_id: &str) -> Result<Vec<JobApplication>>;

    /// Insert a record and return the canonical row
    async fn create_record(&self, record: &NewRecord) -> Result<JobApplication>;

    /// Merge `patch` into record `id` and return the canonical row
    async fn update_record(&self, id: &str, patch: &ApplicationPatch) -> Result<JobApplication>;

    /// Merge `patch` into record `id` without reading it back
    async fn touch_record(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        self.update_record(id, patch).await.map(|_| ())
    }

    /// Hard delete of one record
    async fn delete_record(&self, id: &str) -> Result<()>;

    /// Hard delete of every record owned by `owner_id`
    async fn delete_records_for_owner(&self, owner_id: &str) -> Result<()>;
}

/// Opaque file storage
#[async_trait]
pub trait BlobGateway: Send + Sync {
    async fn upload_blob(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()>;

    /// Publicly reachable URL of a stored blob
    async fn public_url(&self, path: &str) -> Result<String>;

    async fn remove_blob(&self, path: &str) -> Result<()>;
}

/// Session and account management
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// The signed-in user, if any
    async fn current_user(&self) -> Result<Option<User>>;

    /// Stream of session transitions
    fn subscribe_sessions(&self) -> broadcast::Receiver<SessionChange>;

    async fn sign_out(&self) -> Result<()>;

    /// Delete the signed-in account server-side
    async fn delete_account(&self) -> Result<()>;
}

/// Gateway over the hosted REST, storage and auth services
pub struct SupabaseGateway {
    auth: Arc<Auth>,
    rest: PostgrestClient,
    storage: StorageClient,
    table: String,
    bucket: String,
}

/// Sessions this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

impl SupabaseGateway {
    /// Create a gateway sharing one HTTP client across services
    pub fn new(config: &TrackerConfig, options: &TrackerOptions, client: Client) -> Self {
        let url = config.base_url();
        Self {
            auth: Arc::new(Auth::new(&url, &config.anon_key, client.clone(), options)),
            rest: PostgrestClient::new(&url, &config.anon_key, client.clone(), options),
            storage: StorageClient::new(&url, &config.anon_key, client, options),
            table: options.table.clone(),
            bucket: options.resume_bucket.clone(),
        }
    }

    /// The auth client, for sign-in flows
    pub fn auth(&self) -> &Arc<Auth> {
        &self.auth
    }

    fn rest(&self) -> PostgrestClient {
        self.rest.with_token(self.auth.access_token())
    }

    fn storage(&self) -> StorageClient {
        self.storage.with_token(self.auth.access_token())
    }
}

#[async_trait]
impl RecordGateway for SupabaseGateway {
    async fn list_records(&self, owner_id: &str) -> Result<Vec<JobApplication>> {
        self.rest()
            .select(&self.table, "*")
            .eq("user_id", owner_id)
            .order("updated_at", false)
            .execute::<JobApplication>()
            .await
            .map_err(Error::into_persistence)
    }

    async fn create_record(&self, record: &NewRecord) -> Result<JobApplication> {
        self.rest()
            .insert(&self.table, record)
            .execute_single::<JobApplication>()
            .await
            .map_err(Error::into_persistence)
    }

    async fn update_record(&self, id: &str, patch: &ApplicationPatch) -> Result<JobApplication> {
        self.rest()
            .update(&self.table, patch)
            .eq("id", id)
            .execute::<JobApplication>()
            .await
            .map_err(Error::into_persistence)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::persistence(format!("no application with id {}", id)))
    }

    async fn touch_record(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        self.rest()
            .update(&self.table, patch)
            .eq("id", id)
            .execute_no_return()
            .await
            .map_err(Error::into_persistence)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.rest()
            .delete(&self.table)
            .eq("id", id)
            .execute()
            .await
            .map_err(Error::into_persistence)
    }

    async fn delete_records_for_owner(&self, owner_id: &str) -> Result<()> {
        self.rest()
            .delete(&self.table)
            .eq("user_id", owner_id)
            .execute()
            .await
            .map_err(Error::into_persistence)
    }
}

#[async_trait]
impl BlobGateway for SupabaseGateway {
    async fn upload_blob(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.storage()
            .from(&self.bucket)
            .upload(
                path,
                bytes,
                FileOptions::default().with_content_type(content_type),
            )
            .await
            .map(|uploaded| log::debug!("Stored {}", uploaded.key))
            .map_err(Error::into_upload)
    }

    async fn public_url(&self, path: &str) -> Result<String> {
        Ok(self.storage.from(&self.bucket).get_public_url(path))
    }

    async fn remove_blob(&self, path: &str) -> Result<()> {
        self.storage()
            .from(&self.bucket)
            .remove(&[path.to_string()])
            .await
            .map(|_| ())
            .map_err(Error::into_upload)
    }
}

#[async_trait]
impl IdentityGateway for SupabaseGateway {
    async fn current_user(&self) -> Result<Option<User>> {
        let session = self
            .auth
            .valid_session(Duration::seconds(REFRESH_MARGIN_SECS))
            .await?;
        Ok(session.map(|s| s.user))
    }

    fn subscribe_sessions(&self) -> broadcast::Receiver<SessionChange> {
        self.auth.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }

    async fn delete_account(&self) -> Result<()> {
        if self.auth.access_token().is_none() {
            return Err(Error::auth("Not logged in"));
        }
        self.rest()
            .rpc("delete_user", json!({}))
            .execute_empty()
            .await
            .map_err(Error::into_auth)
    }
}
