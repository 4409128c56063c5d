//! Observable client-side stores

mod applications;
mod auth;
mod view;

pub use applications::ApplicationStore;
pub use auth::{AuthEvent, AuthState, AuthStatus, AuthStore};
pub use view::{ApplicationsState, Summary};

/// Change notifications of the application store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    LoadingChanged(bool),
    /// The whole collection was replaced by a fetch
    Replaced { count: usize },
    Inserted { id: String },
    Updated { id: String },
    TrashToggled { id: String, is_trash: bool },
    PurgeStarted { id: String },
    /// The hard delete failed and the record is back in trash
    PurgeReverted { id: String },
    Purged { id: String },
    SearchChanged,
    FilterChanged,
    Cleared,
}
