//! Session-backed token storage
//!
//! Tokens and authorization states are stored inside the current user's
//! `tower-sessions` session, so they live exactly as long as the session.
//!
//! ```rust,ignore
//! use acton_oauth::storage::SessionTokenStore;
//!
//! async fn callback(store: SessionTokenStore, uri: CurrentUri) -> Result<Redirect, Error> {
//!     let mut broker = OAuthBroker::new(uri.into_url())?;
//!     broker.set_token_storage(Arc::new(store));
//!     // ...
//! }
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{de::DeserializeOwned, Serialize};
use tower_sessions::Session;

use super::TokenStore;
use crate::error::{Error, Result};
use crate::token::AccessToken;

const TOKENS_SESSION_KEY: &str = "_oauth_tokens";
const STATES_SESSION_KEY: &str = "_oauth_states";

/// Token store persisted in the user's session
///
/// Every provider's token and state live under their own session key
/// (`_oauth_tokens.<provider>`, `_oauth_states.<provider>`), so writes for
/// different providers never overwrite each other. The provider names seen
/// so far are kept under the bare prefix for the `clear_all_*` operations.
#[derive(Clone, Debug)]
pub struct SessionTokenStore {
    session: Session,
}

impl SessionTokenStore {
    /// Wrap a session
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Get a reference to the underlying session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.session
            .get(key)
            .await
            .map_err(|e| Error::Session(format!("Failed to read {key}: {e}")))
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        self.session
            .insert(key, value)
            .await
            .map_err(|e| Error::Session(format!("Failed to write {key}: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.session
            .remove_value(key)
            .await
            .map(|removed| removed.is_some())
            .map_err(|e| Error::Session(format!("Failed to clear {key}: {e}")))
    }

    async fn contains(&self, key: &str) -> bool {
        match self.read::<serde_json::Value>(key).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(key, "Treating unreadable session entry as missing: {e}");
                false
            }
        }
    }

    async fn remember(&self, prefix: &str, provider: &str) -> Result<()> {
        let mut providers: BTreeSet<String> = self.read(prefix).await?.unwrap_or_default();
        if providers.insert(provider.to_string()) {
            self.write(prefix, &providers).await?;
        }
        Ok(())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<()> {
        let providers: BTreeSet<String> = self.read(prefix).await?.unwrap_or_default();
        for provider in &providers {
            self.delete(&entry_key(prefix, provider)).await?;
        }
        self.delete(prefix).await?;
        Ok(())
    }
}

fn entry_key(prefix: &str, provider: &str) -> String {
    format!("{prefix}.{provider}")
}

#[async_trait]
impl TokenStore for SessionTokenStore {
    async fn store_access_token(&self, provider: &str, token: AccessToken) -> Result<()> {
        self.write(&entry_key(TOKENS_SESSION_KEY, provider), &token)
            .await?;
        self.remember(TOKENS_SESSION_KEY, provider).await
    }

    async fn retrieve_access_token(&self, provider: &str) -> Result<AccessToken> {
        self.read(&entry_key(TOKENS_SESSION_KEY, provider))
            .await?
            .ok_or_else(|| Error::TokenNotFound(provider.to_string()))
    }

    async fn has_access_token(&self, provider: &str) -> bool {
        self.contains(&entry_key(TOKENS_SESSION_KEY, provider))
            .await
    }

    async fn clear_token(&self, provider: &str) -> Result<()> {
        self.delete(&entry_key(TOKENS_SESSION_KEY, provider))
            .await?;
        Ok(())
    }

    async fn clear_all_tokens(&self) -> Result<()> {
        self.clear_prefix(TOKENS_SESSION_KEY).await
    }

    async fn store_authorization_state(&self, provider: &str, state: &str) -> Result<()> {
        self.write(&entry_key(STATES_SESSION_KEY, provider), &state)
            .await?;
        self.remember(STATES_SESSION_KEY, provider).await
    }

    async fn retrieve_authorization_state(&self, provider: &str) -> Result<String> {
        self.read(&entry_key(STATES_SESSION_KEY, provider))
            .await?
            .ok_or_else(|| Error::AuthorizationStateNotFound(provider.to_string()))
    }

    async fn has_authorization_state(&self, provider: &str) -> bool {
        self.contains(&entry_key(STATES_SESSION_KEY, provider))
            .await
    }

    async fn clear_authorization_state(&self, provider: &str) -> Result<()> {
        self.delete(&entry_key(STATES_SESSION_KEY, provider))
            .await?;
        Ok(())
    }

    async fn clear_all_authorization_states(&self) -> Result<()> {
        self.clear_prefix(STATES_SESSION_KEY).await
    }
}

impl<S> FromRequestParts<S> for SessionTokenStore
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            Error::Session("Session not found in request extensions for token storage".to_string())
        })?;

        Ok(Self::new(session))
    }
}
