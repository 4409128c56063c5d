//! The auth store: who is signed in, once that is known

use std::sync::{Arc, Mutex, RwLock, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::User;
use crate::gateway::IdentityGateway;

/// Immutable copy of the auth store state
#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    /// True until the first session resolution
    pub loading: bool,
}

/// What consumers may conclude about the session.
/// `Unknown` must never be treated as signed out.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Unknown,
    SignedIn(User),
    SignedOut,
}

/// Change notifications of the auth store
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

/// Tracks the session through the identity gateway's change stream
pub struct AuthStore {
    identity: Arc<dyn IdentityGateway>,
    state: RwLock<AuthState>,
    events: broadcast::Sender<AuthEvent>,
    listener: Mutex<Option<JoinHandle<()>>>,
    stopped: watch::Sender<bool>,
}

impl AuthStore {
    /// Start listening for session changes and resolve the initial session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(identity: Arc<dyn IdentityGateway>, event_capacity: usize) -> Arc<Self> {
        // Subscribe before resolving so no change slips in between
        let sessions = identity.subscribe_sessions();
        let (events, _) = broadcast::channel(event_capacity.max(1));

        let store = Arc::new(Self {
            identity: identity.clone(),
            state: RwLock::new(AuthState {
                user: None,
                loading: true,
            }),
            events,
            listener: Mutex::new(None),
            stopped: watch::channel(false).0,
        });

        let handle = tokio::spawn(Self::listen(Arc::downgrade(&store), identity, sessions));
        *store.listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        store
    }

    async fn listen(
        store: Weak<Self>,
        identity: Arc<dyn IdentityGateway>,
        mut sessions: broadcast::Receiver<crate::auth::SessionChange>,
    ) {
        let initial = match identity.current_user().await {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Could not resolve initial session, treating as signed out: {}", e);
                None
            }
        };
        match store.upgrade() {
            Some(store) => store.apply(initial),
            None => return,
        }

        loop {
            match sessions.recv().await {
                Ok(change) => {
                    let Some(store) = store.upgrade() else { break };
                    log::debug!("Session change: {:?}", change.event);
                    store.apply(change.user().cloned());
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Auth listener skipped {} session changes", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        log::debug!("Auth listener stopped");
    }

    /// Record the resolved identity. Observers only hear about actual changes.
    fn apply(&self, user: Option<User>) {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            if !state.loading && state.user == user {
                return;
            }
            state.user = user.clone();
            state.loading = false;
        }
        let event = match user {
            Some(user) => AuthEvent::SignedIn(user),
            None => AuthEvent::SignedOut,
        };
        let _ = self.events.send(event);
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> AuthState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().loading
    }

    /// Gate for protected content
    pub fn status(&self) -> AuthStatus {
        let state = self.snapshot();
        match (state.loading, state.user) {
            (true, _) => AuthStatus::Unknown,
            (false, Some(user)) => AuthStatus::SignedIn(user),
            (false, None) => AuthStatus::SignedOut,
        }
    }

    /// Wait until the session is known and return it.
    ///
    /// Returns `Unknown` if the store is shut down before that happens.
    pub async fn resolved(&self) -> AuthStatus {
        let mut events = self.subscribe();
        let mut stopped = self.stopped.subscribe();
        loop {
            let status = self.status();
            if status != AuthStatus::Unknown || *stopped.borrow_and_update() {
                return status;
            }
            tokio::select! {
                event = events.recv() => {
                    if let Err(RecvError::Closed) = event {
                        return self.status();
                    }
                }
                _ = stopped.changed() => {}
            }
        }
    }

    /// Register an observer
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// End the session. A remote failure is logged and the local identity is
    /// cleared regardless.
    pub async fn sign_out(&self) {
        if let Err(e) = self.identity.sign_out().await {
            log::warn!("Sign-out failed, clearing local session anyway: {}", e.into_auth());
        }
        self.apply(None);
    }

    /// Stop listening for session changes
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
        self.stopped.send_replace(true);
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}
