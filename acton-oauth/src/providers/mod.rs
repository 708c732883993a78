//! Provider dialects and the registry that resolves them by name
//!
//! Each built-in provider is a small [`ProviderFlow`] implementation that
//! describes its endpoints and default scopes and knows how to turn its
//! profile payload into an [`Identity`]. Everything else is shared through
//! [`OAuth2Flow`].
//!
//! Custom providers are added with [`ProviderRegistry::register`]:
//!
//! ```rust,ignore
//! let mut registry = ProviderRegistry::builtin();
//! registry.register("gitlab", || Arc::new(GitLab));
//! let broker = OAuthBroker::new(base_uri)?.with_registry(registry);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::flow::{AuthorizationFlow, OAuth2Flow, ProviderEndpoints};
use crate::identity::Identity;
use crate::storage::TokenStore;
use crate::transport::HttpClient;

mod facebook;
mod github;
mod google;
mod linkedin;

pub use facebook::Facebook;
pub use github::GitHub;
pub use google::Google;
pub use linkedin::LinkedIn;

/// One provider's OAuth2 dialect
pub trait ProviderFlow: Send + Sync {
    /// Registry name of the provider (e.g. "github")
    fn provider_name(&self) -> &str;

    /// Scopes requested when the caller supplies none
    fn default_scopes(&self) -> Vec<String>;

    /// Endpoints and request conventions
    fn endpoints(&self) -> ProviderEndpoints;

    /// Profile endpoint, relative to the API base or absolute
    fn profile_path(&self) -> &str;

    /// Map the raw profile payload onto an [`Identity`]
    ///
    /// Fails with `Error::Decode` when the payload is not a JSON object.
    fn extract_identity(&self, raw: &Value) -> Result<Identity>;

    /// Build the authorization flow for validated credentials
    ///
    /// `name` is the registry name; tokens and state nonces are stored under
    /// it. Empty `scopes` fall back to [`default_scopes`](Self::default_scopes).
    fn build_authorization_flow(
        &self,
        name: &str,
        credentials: Credentials,
        scopes: Vec<String>,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpClient>,
    ) -> Result<Arc<dyn AuthorizationFlow>> {
        let scopes = if scopes.is_empty() {
            self.default_scopes()
        } else {
            scopes
        };

        let flow = OAuth2Flow::new(
            name,
            credentials,
            scopes,
            self.endpoints(),
            store,
            transport,
        )?;

        Ok(Arc::new(flow))
    }
}

/// Constructor for a provider flow
pub type ProviderFactory = fn() -> Arc<dyn ProviderFlow>;

/// Provider flows by name
#[derive(Clone)]
pub struct ProviderRegistry {
    factories: IndexMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Registry without any provider
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Registry with Facebook, Google, GitHub and LinkedIn
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("facebook", || Arc::new(Facebook));
        registry.register("google", || Arc::new(Google));
        registry.register("github", || Arc::new(GitHub));
        registry.register("linkedin", || Arc::new(LinkedIn));
        registry
    }

    /// Register (or replace) a provider
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) -> &mut Self {
        self.factories.insert(name.into(), factory);
        self
    }

    /// Resolve a provider by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ProviderFlow>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    /// Check whether a provider is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Build an identity from JSON pointers into a profile payload
///
/// Missing and null values become empty strings.
pub(crate) fn map_identity(
    service: &str,
    raw: &Value,
    email: &str,
    fields: &[(&str, &str)],
) -> Result<Identity> {
    if !raw.is_object() {
        return Err(Error::Decode(format!(
            "{} profile response is not a JSON object",
            service
        )));
    }

    let mut identity = Identity::new(service, "");
    identity.set("email", lookup(raw, email));
    for (name, pointer) in fields {
        identity.set(*name, lookup(raw, pointer));
    }

    Ok(identity)
}

fn lookup(raw: &Value, pointer: &str) -> Value {
    match raw.pointer(pointer) {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(value) => value.clone(),
    }
}
