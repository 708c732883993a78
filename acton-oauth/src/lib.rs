//! # acton-oauth
//!
//! OAuth2 client broker for "login with X" flows across several identity
//! providers.
//!
//! ## Features
//!
//! - **Provider registry**: Facebook, Google, GitHub and LinkedIn built in, custom providers pluggable
//! - **Authorization-code flow**: state nonces, code exchange, signed API requests
//! - **Token storage**: in-memory or per user session (tower-sessions)
//! - **Identity normalization**: every provider's profile mapped onto one [`Identity`] shape
//! - **Pluggable transport**: reqwest by default, any [`transport::HttpClient`] for tests or custom policy
//! - **Configuration**: Figment (TOML + environment)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use acton_oauth::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = OAuthConfig::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config.logging)?;
//!
//!     // One service per configured provider
//!     let broker = OAuthBroker::from_config(
//!         &config,
//!         Url::parse("http://localhost:8080/login")?,
//!         Arc::new(MemoryTokenStore::new()),
//!         Arc::new(ReqwestHttpClient::new()?),
//!     )?;
//!
//!     let github = broker.service("github")?;
//!     println!("Continue at {}", github.authorization_uri(&[]).await?);
//!
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod identity;
pub mod observability;
pub mod providers;
pub mod service;
pub mod storage;
pub mod token;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use broker::OAuthBroker;
pub use error::{Error, Result};
pub use identity::Identity;
pub use service::ServiceHandle;
pub use token::AccessToken;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::broker::OAuthBroker;
    pub use crate::config::{LoggingConfig, OAuthConfig, ProviderSettings};
    pub use crate::credentials::{ClientCredentials, Credentials, CurrentUri};
    pub use crate::error::{Error, ErrorResponse, Result};
    pub use crate::flow::{ApiRequest, AuthorizationFlow, ProviderEndpoints, TokenPlacement};
    pub use crate::identity::Identity;
    pub use crate::observability::init_tracing;
    pub use crate::providers::{ProviderFlow, ProviderRegistry};
    pub use crate::service::ServiceHandle;
    pub use crate::storage::{MemoryTokenStore, TokenStore};
    pub use crate::token::AccessToken;
    pub use crate::transport::HttpClient;

    #[cfg(feature = "session")]
    pub use crate::storage::SessionTokenStore;

    #[cfg(feature = "reqwest")]
    pub use crate::transport::ReqwestHttpClient;

    pub use url::Url;
}
