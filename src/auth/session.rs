//! Session data and access token claims

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::User;
use crate::error::Result;

/// Session data returned by the token endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token (a JWT)
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    #[serde(default)]
    pub expires_in: i64,

    /// The expiry timestamp in seconds since the epoch
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// The signed-in user
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Claims read from an access token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    /// Decode the access token claims.
    /// The signature is not checked: only the server can verify it.
    pub fn claims(&self) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// When the access token stops being valid.
    /// Prefers `expires_at`, then the token's `exp` claim.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self
            .expires_at
            .or_else(|| self.claims().ok().and_then(|c| c.exp))?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Check if the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_within(now, Duration::zero())
    }

    /// Whether the session expires within `margin` of `now`.
    /// A session without a known expiry never expires.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at() {
            Some(expires_at) => now + margin >= expires_at,
            None => false,
        }
    }
}
