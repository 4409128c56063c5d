//! Types for authentication and user management

use serde::{Deserialize, Serialize};

use super::Session;

/// User data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID, owner of every application row
    pub id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// Metadata set at sign-up (`full_name`)
    #[serde(default)]
    pub user_metadata: serde_json::Value,

    /// Provider metadata managed by the server
    #[serde(default)]
    pub app_metadata: serde_json::Value,

    /// The creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// A user with only an id, as recovered from token claims
    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            user_metadata: serde_json::Value::Null,
            app_metadata: serde_json::Value::Null,
            created_at: None,
        }
    }

    /// The `full_name` given at sign-up, if any
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Name shown in the UI: full name, then email, then a fallback
    pub fn display_name(&self) -> &str {
        self.full_name()
            .or(self.email.as_deref())
            .unwrap_or("User")
    }

    /// Up to two uppercase initials of the full name, else the email's first letter
    pub fn initials(&self) -> String {
        match self.full_name() {
            Some(name) => name
                .split_whitespace()
                .filter_map(|part| part.chars().next())
                .take(2)
                .flat_map(char::to_uppercase)
                .collect(),
            None => self
                .email
                .as_deref()
                .and_then(|e| e.chars().next())
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_else(|| "U".to_string()),
        }
    }
}

/// What a sign-up returns: a session when the project auto-confirms emails,
/// otherwise just the pending user
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(Session),
    User(User),
}

impl SignUpResponse {
    pub fn user(&self) -> &User {
        match self {
            SignUpResponse::Session(session) => &session.user,
            SignUpResponse::User(user) => user,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SignUpResponse::Session(session) => Some(session),
            SignUpResponse::User(_) => None,
        }
    }
}

/// Kind of session transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A session transition as broadcast to listeners
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub event: SessionEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn new(event: SessionEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// The identity after this change, `None` when signed out
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_and_initials() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "ada@example.com",
            "user_metadata": { "full_name": "ada king lovelace" }
        }))
        .unwrap();
        assert_eq!(user.display_name(), "ada king lovelace");
        assert_eq!(user.initials(), "AK");

        let bare = User {
            email: Some("grace@example.com".to_string()),
            ..User::with_id("u2")
        };
        assert_eq!(bare.display_name(), "grace@example.com");
        assert_eq!(bare.initials(), "G");
        assert_eq!(User::with_id("u3").display_name(), "User");
    }

    #[test]
    fn sign_up_without_session_yields_user() {
        let response: SignUpResponse = serde_json::from_value(json!({
            "id": "u1",
            "email": "new@example.com",
            "user_metadata": {}
        }))
        .unwrap();
        assert!(response.session().is_none());
        assert_eq!(response.user().id, "u1");
    }
}
