//! Authentication against the hosted auth service

mod session;
mod types;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use url::Url;

use crate::config::TrackerOptions;
use crate::error::{Error, Result};
use crate::fetch::{Fetch, FetchBuilder};

pub use session::*;
pub use types::*;

/// Client for authentication
pub struct Auth {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// Value of the `X-Client-Info` header
    client_info: String,

    /// Whether sessions are kept after sign-in
    persist_session: bool,

    /// The current session
    session: Arc<RwLock<Option<Session>>>,

    /// Session change fan-out
    changes: broadcast::Sender<SessionChange>,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: &TrackerOptions) -> Self {
        let (changes, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            client_info: options.client_info.clone(),
            persist_session: options.persist_session,
            session: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn with_headers<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        builder
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    fn emit(&self, event: SessionEvent, session: Option<Session>) {
        // No subscribers is fine
        let _ = self.changes.send(SessionChange::new(event, session));
    }

    fn store_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = session;
    }

    /// Get the current session
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Install a session obtained elsewhere, e.g. restored from disk
    pub fn set_session(&self, session: Session) {
        if self.persist_session {
            self.store_session(Some(session.clone()));
        }
        self.emit(SessionEvent::SignedIn, Some(session));
    }

    /// The current access token, if signed in
    pub fn access_token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }

    fn accept_session(&self, event: SessionEvent, session: &Session) {
        if self.persist_session {
            self.store_session(Some(session.clone()));
        }
        self.emit(event, Some(session.clone()));
    }

    /// Sign up a new user with email and password, storing `full_name` in the
    /// user metadata. A session is only returned when the project auto-confirms.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpResponse> {
        let url = self.auth_url("/signup");

        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = full_name {
            body["data"] = json!({ "full_name": name });
        }

        let response = self
            .with_headers(Fetch::post(&self.client, &url))
            .json(&body)?
            .execute::<SignUpResponse>()
            .await
            .map_err(Error::into_auth)?;

        if let Some(session) = response.session() {
            log::info!("Signed up and signed in as {}", session.user.id);
            self.accept_session(SessionEvent::SignedIn, session);
        } else {
            log::info!("Signed up {}, confirmation pending", response.user().id);
        }

        Ok(response)
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.auth_url("/token");

        let session = self
            .with_headers(Fetch::post(&self.client, &url))
            .query_param("grant_type", "password")
            .json(&json!({ "email": email, "password": password }))?
            .execute::<Session>()
            .await
            .map_err(Error::into_auth)?;

        log::info!("Signed in as {}", session.user.id);
        self.accept_session(SessionEvent::SignedIn, &session);
        Ok(session)
    }

    /// URL that starts an OAuth sign-in with `provider` (e.g. `google`).
    /// The browser is sent back to `redirect_to` with the session.
    pub fn oauth_sign_in_url(&self, provider: &str, redirect_to: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&self.auth_url("/authorize"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("provider", provider);
            if let Some(redirect_to) = redirect_to {
                query.append_pair("redirect_to", redirect_to);
            }
        }
        Ok(url.to_string())
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Session> {
        let current = self
            .session()
            .ok_or_else(|| Error::auth("Not logged in"))?;
        let url = self.auth_url("/token");

        let session = self
            .with_headers(Fetch::post(&self.client, &url))
            .query_param("grant_type", "refresh_token")
            .json(&json!({ "refresh_token": current.refresh_token }))?
            .execute::<Session>()
            .await
            .map_err(Error::into_auth)?;

        log::debug!("Refreshed session for {}", session.user.id);
        self.accept_session(SessionEvent::TokenRefreshed, &session);
        Ok(session)
    }

    /// The current session, refreshed first when it expires within `margin`
    pub async fn valid_session(&self, margin: Duration) -> Result<Option<Session>> {
        match self.session() {
            Some(session) if session.expires_within(Utc::now(), margin) => {
                self.refresh_session().await.map(Some)
            }
            other => Ok(other),
        }
    }

    /// Get the user data for the currently authenticated user
    pub async fn get_user(&self) -> Result<User> {
        let token = self
            .access_token()
            .ok_or_else(|| Error::auth("Not logged in"))?;
        let url = self.auth_url("/user");

        self.with_headers(Fetch::get(&self.client, &url))
            .bearer_auth(&token)
            .execute::<User>()
            .await
            .map_err(Error::into_auth)
    }

    /// Sign out the current user.
    ///
    /// The local session is dropped and `SignedOut` emitted even when the
    /// server call fails; the failure is still returned.
    pub async fn sign_out(&self) -> Result<()> {
        let result = match self.access_token() {
            Some(token) => {
                let url = self.auth_url("/logout");
                self.with_headers(Fetch::post(&self.client, &url))
                    .bearer_auth(&token)
                    .execute_empty()
                    .await
                    .map_err(Error::into_auth)
            }
            None => Ok(()),
        };

        self.store_session(None);
        self.emit(SessionEvent::SignedOut, None);
        result
    }
}
