//! Access tokens issued by providers

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access token obtained from an authorization code exchange
///
/// Tokens are owned by the token store; service handles only read them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer credential itself
    pub access_token: String,

    /// Token type reported by the provider (usually "bearer")
    pub token_type: String,

    /// Refresh token (if provided)
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When the token stops being valid; `None` when the provider reported no lifetime
    #[serde(default)]
    pub end_of_life: Option<DateTime<Utc>>,

    /// Scopes granted by the provider, when it reports them
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Remaining fields of the token response
    #[serde(default)]
    pub extra_params: serde_json::Map<String, serde_json::Value>,
}

impl AccessToken {
    /// Create a token without expiry information
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            refresh_token: None,
            end_of_life: None,
            scopes: Vec::new(),
            extra_params: serde_json::Map::new(),
        }
    }

    /// Set an absolute end of life
    #[must_use]
    pub fn with_end_of_life(mut self, end_of_life: DateTime<Utc>) -> Self {
        self.end_of_life = Some(end_of_life);
        self
    }

    /// Set the end of life relative to now
    ///
    /// Lifetimes past the representable range saturate at its bounds.
    #[must_use]
    pub fn with_lifetime(self, lifetime: TimeDelta) -> Self {
        let end_of_life = match Utc::now().checked_add_signed(lifetime) {
            Some(end_of_life) => end_of_life,
            None if lifetime > TimeDelta::zero() => DateTime::<Utc>::MAX_UTC,
            None => DateTime::<Utc>::MIN_UTC,
        };
        self.with_end_of_life(end_of_life)
    }

    /// Set the refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Whether the token is still valid at `now`
    ///
    /// A token is alive while its end of life lies strictly in the future.
    /// An unknown end of life never counts as alive.
    #[must_use]
    pub fn is_alive_at(&self, now: DateTime<Utc>) -> bool {
        self.end_of_life.is_some_and(|end_of_life| end_of_life > now)
    }

    /// Whether the token has expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_alive_at(now)
    }

    /// Whether the token is still valid right now
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.is_alive_at(Utc::now())
    }
}

// Keep the secret out of logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("end_of_life", &self.end_of_life)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
