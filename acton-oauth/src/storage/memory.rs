//! In-memory token storage

use async_trait::async_trait;
use dashmap::DashMap;

use super::TokenStore;
use crate::error::{Error, Result};
use crate::token::AccessToken;

/// Token store kept in process memory
///
/// State lives only as long as this value. Suitable for tests and for flows
/// that do not need to survive the current request.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<String, AccessToken>,
    states: DashMap<String, String>,
}

impl MemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store_access_token(&self, provider: &str, token: AccessToken) -> Result<()> {
        self.tokens.insert(provider.to_string(), token);
        Ok(())
    }

    async fn retrieve_access_token(&self, provider: &str) -> Result<AccessToken> {
        self.tokens
            .get(provider)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::TokenNotFound(provider.to_string()))
    }

    async fn has_access_token(&self, provider: &str) -> bool {
        self.tokens.contains_key(provider)
    }

    async fn clear_token(&self, provider: &str) -> Result<()> {
        self.tokens.remove(provider);
        Ok(())
    }

    async fn clear_all_tokens(&self) -> Result<()> {
        self.tokens.clear();
        Ok(())
    }

    async fn store_authorization_state(&self, provider: &str, state: &str) -> Result<()> {
        self.states.insert(provider.to_string(), state.to_string());
        Ok(())
    }

    async fn retrieve_authorization_state(&self, provider: &str) -> Result<String> {
        self.states
            .get(provider)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::AuthorizationStateNotFound(provider.to_string()))
    }

    async fn has_authorization_state(&self, provider: &str) -> bool {
        self.states.contains_key(provider)
    }

    async fn clear_authorization_state(&self, provider: &str) -> Result<()> {
        self.states.remove(provider);
        Ok(())
    }

    async fn clear_all_authorization_states(&self) -> Result<()> {
        self.states.clear();
        Ok(())
    }
}
