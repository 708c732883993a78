//! Configuration management using Figment
//!
//! Configuration is loaded from the following sources (highest precedence first):
//! 1. Environment variables (prefix: `ACTON_OAUTH_`, nesting with `__`)
//! 2. A TOML file (`./oauth.toml` unless a path is given)
//! 3. Default values
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [providers.github]
//! key = "client-id"
//! secret = "client-secret"
//! redirect_uri = "/login/github"
//! scopes = ["user:email"]
//! ```
//!
//! `ACTON_OAUTH_PROVIDERS__GITHUB__SECRET=...` overrides the secret above.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::credentials::ClientCredentials;
use crate::error::Result;

const DEFAULT_CONFIG_FILE: &str = "oauth.toml";
const ENV_PREFIX: &str = "ACTON_OAUTH_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Provider credentials by provider name, in file order
    #[serde(default)]
    pub providers: IndexMap<String, ProviderSettings>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (e.g. "info", "acton_oauth=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: true,
        }
    }
}

/// Credentials and scopes for one provider
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Application key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Application secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Callback path or absolute URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Requested scopes; empty means the provider's defaults
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ProviderSettings {
    /// Credentials part of the settings
    #[must_use]
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            key: self.key.clone(),
            secret: self.secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl OAuthConfig {
    /// Load configuration from `./oauth.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file and the environment
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading OAuth configuration from: {}", path.display());
        } else {
            tracing::debug!("No OAuth configuration file at: {}", path.display());
        }

        let config = Self::figment(path).extract()?;
        Ok(config)
    }

    /// The layered figment used by [`load_from`](Self::load_from)
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(OAuthConfig::default()))
            // Load from config file (if exists)
            .merge(Toml::file(path.as_ref()))
            // Override with environment variables
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Settings for a provider
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.get(name)
    }
}
