//! Provider registry and service factory

use std::sync::Arc;

use indexmap::IndexMap;
use url::Url;

use crate::config::OAuthConfig;
use crate::credentials::ClientCredentials;
use crate::error::{Error, Result};
use crate::providers::ProviderRegistry;
use crate::service::ServiceHandle;
use crate::storage::{MemoryTokenStore, TokenStore};
use crate::transport::HttpClient;

/// Entry point: validates credentials and hands out one [`ServiceHandle`]
/// per provider name
///
/// A broker is meant to live for one request or session context. The token
/// store and HTTP client in effect when a service is created are the ones
/// that service keeps; changing them later only affects services created
/// afterwards.
///
/// ```rust,ignore
/// async fn login(uri: CurrentUri, store: SessionTokenStore, Query(q): Query<Callback>)
///     -> Result<Json<Identity>, Error>
/// {
///     let mut broker = OAuthBroker::new(uri.into_url())?;
///     broker.set_token_storage(Arc::new(store));
///
///     let github = broker.create_service(
///         "github",
///         &ClientCredentials::new(key, secret).with_redirect_uri("/login/github"),
///         vec!["user:email".into()],
///     )?;
///
///     github.authorize(q.code.as_deref(), q.state.as_deref()).await?;
///     Ok(Json(github.identity().await?))
/// }
/// ```
pub struct OAuthBroker {
    base_uri: Url,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpClient>,
    registry: ProviderRegistry,
    services: IndexMap<String, Arc<ServiceHandle>>,
}

impl OAuthBroker {
    /// Broker with in-memory token storage and the reqwest transport
    #[cfg(feature = "reqwest")]
    pub fn new(base_uri: Url) -> Result<Self> {
        let transport = crate::transport::ReqwestHttpClient::new()?;
        Ok(Self::with_parts(
            base_uri,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(transport),
        ))
    }

    /// Broker with explicit storage and transport
    pub fn with_parts(
        mut base_uri: Url,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpClient>,
    ) -> Self {
        base_uri.set_query(None);
        base_uri.set_fragment(None);

        Self {
            base_uri,
            store,
            transport,
            registry: ProviderRegistry::builtin(),
            services: IndexMap::new(),
        }
    }

    /// Broker with a service created for every configured provider
    pub fn from_config(
        config: &OAuthConfig,
        base_uri: Url,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        Self::with_parts(base_uri, store, transport).configure(config)
    }

    /// Create a service for every provider in `config`
    pub fn configure(mut self, config: &OAuthConfig) -> Result<Self> {
        for (name, settings) in &config.providers {
            self.create_service(name, &settings.credentials(), settings.scopes.clone())?;
        }
        Ok(self)
    }

    /// Replace the provider registry
    #[must_use]
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Base URI callbacks are resolved against (query stripped)
    #[must_use]
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Registered provider flows
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Validate credentials, build the service and register it under `name`
    ///
    /// Any previous service with the same name is replaced.
    pub fn create_service(
        &mut self,
        name: &str,
        credentials: &ClientCredentials,
        scopes: Vec<String>,
    ) -> Result<Arc<ServiceHandle>> {
        let credentials = credentials.validate(&self.base_uri)?;
        let provider = self.registry.resolve(name)?;

        let flow = provider.build_authorization_flow(
            name,
            credentials,
            scopes,
            Arc::clone(&self.store),
            Arc::clone(&self.transport),
        )?;

        let service = Arc::new(ServiceHandle::new(
            name,
            provider,
            flow,
            Arc::clone(&self.store),
        ));
        self.services.insert(name.to_string(), Arc::clone(&service));

        tracing::debug!(service = name, "Registered OAuth service");
        Ok(service)
    }

    /// Previously created service
    pub fn service(&self, name: &str) -> Result<Arc<ServiceHandle>> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ServiceNotInitialized(name.to_string()))
    }

    /// All created services, in creation order
    #[must_use]
    pub fn services(&self) -> IndexMap<String, Arc<ServiceHandle>> {
        self.services.clone()
    }

    /// Log out of one service, or of every service when `name` is `None`
    pub async fn logout(&self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) => self.service(name)?.gc().await,
            None => {
                for service in self.services.values() {
                    service.gc().await?;
                }
                Ok(())
            }
        }
    }

    /// Set the token store for services created from now on
    pub fn set_token_storage(&mut self, store: Arc<dyn TokenStore>) -> &mut Self {
        self.store = store;
        self
    }

    /// Current token store
    #[must_use]
    pub fn token_storage(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Set the HTTP client for services created from now on
    pub fn set_http_client(&mut self, transport: Arc<dyn HttpClient>) -> &mut Self {
        self.transport = transport;
        self
    }

    /// Current HTTP client
    #[must_use]
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.transport)
    }
}

impl std::fmt::Debug for OAuthBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthBroker")
            .field("base_uri", &self.base_uri.as_str())
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
