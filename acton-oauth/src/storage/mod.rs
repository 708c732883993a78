//! Token storage
//!
//! Access tokens and authorization-state nonces are kept per provider name.
//! Two backends are available:
//!
//! - [`MemoryTokenStore`]: lives as long as the store object (tests, CLIs,
//!   non-persistent flows)
//! - [`SessionTokenStore`]: persists into the current user's
//!   `tower-sessions` session (requires the `session` feature)
//!
//! Both can be shared across tasks behind an `Arc<dyn TokenStore>`.

use async_trait::async_trait;

use crate::error::Result;
use crate::token::AccessToken;

mod memory;
#[cfg(feature = "session")]
mod session;

pub use memory::MemoryTokenStore;
#[cfg(feature = "session")]
pub use session::SessionTokenStore;

/// Storage for access tokens and authorization states, keyed by provider name
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store (or replace) the access token for a provider
    async fn store_access_token(&self, provider: &str, token: AccessToken) -> Result<()>;

    /// Retrieve the access token for a provider
    ///
    /// Fails with `Error::TokenNotFound` when none is stored.
    async fn retrieve_access_token(&self, provider: &str) -> Result<AccessToken>;

    /// Check whether a token is stored for a provider
    ///
    /// Never fails; backend errors are reported as `false`.
    async fn has_access_token(&self, provider: &str) -> bool;

    /// Remove the token for a provider (no error if absent)
    async fn clear_token(&self, provider: &str) -> Result<()>;

    /// Remove every stored token
    async fn clear_all_tokens(&self) -> Result<()>;

    /// Store (or replace) the authorization state nonce for a provider
    async fn store_authorization_state(&self, provider: &str, state: &str) -> Result<()>;

    /// Retrieve the authorization state nonce for a provider
    ///
    /// Fails with `Error::AuthorizationStateNotFound` when none is stored.
    async fn retrieve_authorization_state(&self, provider: &str) -> Result<String>;

    /// Check whether an authorization state is stored for a provider
    ///
    /// Never fails; backend errors are reported as `false`.
    async fn has_authorization_state(&self, provider: &str) -> bool;

    /// Remove the authorization state for a provider (no error if absent)
    async fn clear_authorization_state(&self, provider: &str) -> Result<()>;

    /// Remove every stored authorization state
    async fn clear_all_authorization_states(&self) -> Result<()>;
}
