//! Job application tracker client
//!
//! Observable stores for a Supabase-backed job tracker: the signed-in user's
//! applications with their soft-delete lifecycle and resume uploads, and the
//! session state that gates them.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod model;
pub mod postgrest;
pub mod storage;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::Auth;
use crate::config::{TrackerConfig, TrackerOptions};
use crate::error::{Error, Result};
use crate::gateway::{BlobGateway, IdentityGateway, RecordGateway, SupabaseGateway};
use crate::store::{ApplicationStore, AuthStore};

/// The main entry point: one gateway shared by both stores
pub struct JobTracker {
    /// Auth client for sign-in flows, when backed by the hosted service
    auth_client: Option<Arc<Auth>>,
    records: Arc<dyn RecordGateway>,
    identity: Arc<dyn IdentityGateway>,
    applications: Arc<ApplicationStore>,
    auth: Arc<AuthStore>,
}

impl JobTracker {
    /// Connect to the hosted project and start both stores
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use jobtrail::config::{TrackerConfig, TrackerOptions};
    /// use jobtrail::JobTracker;
    ///
    /// # async fn run() -> jobtrail::error::Result<()> {
    /// let config = TrackerConfig::from_env()?;
    /// let tracker = JobTracker::start(config, TrackerOptions::default())?;
    /// tracker.auth().resolved().await;
    /// tracker.applications().fetch_applications().await;
    /// println!("{} active", tracker.applications().snapshot().active().len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(config: TrackerConfig, options: TrackerOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let gateway = Arc::new(SupabaseGateway::new(&config, &options, client));
        let auth_client = gateway.auth().clone();

        log::info!("Starting job tracker against {}", config.base_url());
        let mut tracker = Self::with_gateway(gateway, &options);
        tracker.auth_client = Some(auth_client);
        Ok(tracker)
    }

    /// Start both stores over any gateway implementation
    pub fn with_gateway<G>(gateway: Arc<G>, options: &TrackerOptions) -> Self
    where
        G: RecordGateway + BlobGateway + IdentityGateway + 'static,
    {
        let records: Arc<dyn RecordGateway> = gateway.clone();
        let blobs: Arc<dyn BlobGateway> = gateway.clone();
        let identity: Arc<dyn IdentityGateway> = gateway;

        let auth = AuthStore::start(identity.clone(), options.event_capacity);
        let applications = Arc::new(ApplicationStore::new(
            records.clone(),
            blobs,
            identity.clone(),
            &options.resume_prefix,
            options.event_capacity,
        ));

        Self {
            auth_client: None,
            records,
            identity,
            applications,
            auth,
        }
    }

    /// The application store
    pub fn applications(&self) -> &Arc<ApplicationStore> {
        &self.applications
    }

    /// The auth store
    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    /// The auth client for sign-up and sign-in, when connected to the hosted service
    pub fn auth_client(&self) -> Option<&Arc<Auth>> {
        self.auth_client.as_ref()
    }

    /// Sign out and drop the local records
    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
        self.applications.clear();
    }

    /// Permanently delete the signed-in account and all of its applications.
    ///
    /// Any failure before the final sign-out is returned and leaves the
    /// session in place.
    pub async fn delete_account(&self) -> Result<()> {
        let user = self
            .auth
            .user()
            .ok_or_else(|| Error::auth("no signed-in user"))?;

        log::warn!("Deleting account {} and all of its applications", user.id);
        self.records
            .delete_records_for_owner(&user.id)
            .await
            .map_err(Error::into_persistence)?;
        self.identity
            .delete_account()
            .await
            .map_err(Error::into_auth)?;

        self.sign_out().await;
        Ok(())
    }

    /// Stop background work
    pub fn shutdown(&self) {
        self.auth.shutdown();
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{TrackerConfig, TrackerOptions};
    pub use crate::error::{Error, Result};
    pub use crate::model::{
        ApplicationPatch, JobApplication, JobStatus, Lifecycle, NewApplication, ResumeFile,
        StatusFilter,
    };
    pub use crate::store::{AuthStatus, StoreEvent, Summary};
    pub use crate::JobTracker;
}
