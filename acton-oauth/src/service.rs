//! Provider-bound service handle

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::flow::{ApiRequest, AuthorizationFlow};
use crate::identity::Identity;
use crate::providers::ProviderFlow;
use crate::storage::TokenStore;
use crate::token::AccessToken;

/// Handle for one registered provider
///
/// Created by [`OAuthBroker::create_service`](crate::OAuthBroker::create_service)
/// and shared as `Arc<ServiceHandle>`. All token and state bookkeeping goes
/// through the broker's token store under the provider name.
pub struct ServiceHandle {
    name: String,
    provider: Arc<dyn ProviderFlow>,
    flow: Arc<dyn AuthorizationFlow>,
    store: Arc<dyn TokenStore>,
}

impl ServiceHandle {
    pub(crate) fn new(
        name: impl Into<String>,
        provider: Arc<dyn ProviderFlow>,
        flow: Arc<dyn AuthorizationFlow>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            flow,
            store,
        }
    }

    /// Provider name this handle is registered under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider dialect bound to this handle
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ProviderFlow> {
        &self.provider
    }

    /// Underlying authorization flow, for provider-specific needs
    #[must_use]
    pub fn flow(&self) -> &Arc<dyn AuthorizationFlow> {
        &self.flow
    }

    /// Complete the redirect dance
    ///
    /// Returns `Ok(None)` without touching the network when no `code` was
    /// supplied (the user has not been to the provider yet). Any failure of
    /// the exchange is reported as `Error::FailedAuthorization`.
    pub async fn authorize(
        &self,
        code: Option<&str>,
        state: Option<&str>,
    ) -> Result<Option<AccessToken>> {
        let Some(code) = code else {
            return Ok(None);
        };

        match self.flow.request_access_token(code, state).await {
            Ok(token) => {
                tracing::debug!(service = %self.name, "Authorization succeeded");
                Ok(Some(token))
            }
            Err(e) => {
                tracing::debug!(service = %self.name, "Authorization failed: {}", e);
                Err(Error::FailedAuthorization(e.to_string()))
            }
        }
    }

    /// Whether a live access token is stored
    pub async fn is_authenticated(&self) -> bool {
        match self.store.retrieve_access_token(&self.name).await {
            Ok(token) => token.is_alive_at(Utc::now()),
            Err(Error::TokenNotFound(_)) => false,
            Err(e) => {
                tracing::warn!(service = %self.name, "Token lookup failed: {}", e);
                false
            }
        }
    }

    /// Stored access token
    pub async fn access_token(&self) -> Result<AccessToken> {
        self.store.retrieve_access_token(&self.name).await
    }

    /// Stored authorization state nonce
    pub async fn authorization_state(&self) -> Result<String> {
        self.store.retrieve_authorization_state(&self.name).await
    }

    /// Whether an authorization is in progress
    pub async fn has_authorization_state(&self) -> bool {
        self.store.has_authorization_state(&self.name).await
    }

    /// URL to send the user to; stores a fresh state nonce
    pub async fn authorization_uri(&self, extra_params: &[(&str, &str)]) -> Result<Url> {
        self.flow.authorization_uri(extra_params).await
    }

    /// Authenticated API call returning the decoded JSON body
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        let path = request.path.clone();
        let body = self.flow.request(request).await?;

        serde_json::from_slice(&body).map_err(|e| {
            Error::Decode(format!(
                "{} returned invalid JSON for {}: {}",
                self.name, path, e
            ))
        })
    }

    /// Authenticated API call returning the raw body
    pub async fn request_raw(&self, request: ApiRequest) -> Result<Vec<u8>> {
        self.flow.request(request).await
    }

    /// Fetch the user's profile and normalize it
    pub async fn identity(&self) -> Result<Identity> {
        let raw = self
            .request(ApiRequest::get(self.provider.profile_path()))
            .await?;
        self.provider.extract_identity(&raw)
    }

    /// Forget the token and any pending authorization state
    ///
    /// Idempotent; only backend failures are reported.
    pub async fn gc(&self) -> Result<()> {
        self.store.clear_token(&self.name).await?;
        self.store.clear_authorization_state(&self.name).await?;
        tracing::debug!(service = %self.name, "Cleared token and authorization state");
        Ok(())
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.name)
            .field("provider", &self.provider.provider_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ClientCredentials;
    use crate::providers::{Facebook, LinkedIn};
    use crate::storage::MemoryTokenStore;
    use crate::test_support::StubHttpClient;
    use chrono::Duration;
    use serde_json::json;

    fn handle_for(
        provider: Arc<dyn ProviderFlow>,
    ) -> (ServiceHandle, Arc<MemoryTokenStore>, Arc<StubHttpClient>) {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(StubHttpClient::new());
        let credentials = ClientCredentials::new("key", "secret")
            .validate(&Url::parse("http://localhost/login").unwrap())
            .unwrap();
        let name = provider.provider_name().to_string();
        let flow = provider
            .build_authorization_flow(
                &name,
                credentials,
                Vec::new(),
                store.clone(),
                transport.clone(),
            )
            .unwrap();
        (
            ServiceHandle::new(name, provider, flow, store.clone()),
            store,
            transport,
        )
    }

    fn state_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorize_without_code_is_a_no_op() {
        let (handle, _, transport) = handle_for(Arc::new(Facebook));

        assert!(handle.authorize(None, None).await.unwrap().is_none());
        assert!(handle.authorize(None, Some("state")).await.unwrap().is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_is_authenticated() {
        let (handle, store, _) = handle_for(Arc::new(Facebook));
        assert!(!handle.is_authenticated().await);

        let expired = AccessToken::new("a").with_end_of_life(Utc::now() - Duration::seconds(1));
        store.store_access_token("facebook", expired).await.unwrap();
        assert!(!handle.is_authenticated().await);

        let alive = AccessToken::new("a").with_lifetime(Duration::hours(1));
        store.store_access_token("facebook", alive).await.unwrap();
        assert!(handle.is_authenticated().await);

        // No reported lifetime means the end of life is unknown
        store
            .store_access_token("facebook", AccessToken::new("a"))
            .await
            .unwrap();
        assert!(!handle.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_full_login_flow() {
        let (handle, _, transport) = handle_for(Arc::new(Facebook));

        let url = handle.authorization_uri(&[]).await.unwrap();
        let state = state_of(&url);
        assert!(handle.has_authorization_state().await);
        assert_eq!(handle.authorization_state().await.unwrap(), state);

        transport.push_json(200, r#"{"access_token":"tok","expires_in":3600}"#);
        let token = handle
            .authorize(Some("code"), Some(&state))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.access_token, "tok");
        assert!(handle.is_authenticated().await);
        assert!(!handle.has_authorization_state().await);

        transport.push_json(
            200,
            r#"{"email":"test@test.com","id":1234,"first_name":"First","last_name":"Last","picture":{"data":{"url":"picture.jpg"}},"link":"www.test.com"}"#,
        );
        let identity = handle.identity().await.unwrap();
        assert_eq!(
            identity.to_json(),
            json!({
                "service": "facebook",
                "email": "test@test.com",
                "id": 1234,
                "firstName": "First",
                "lastName": "Last",
                "picture": "picture.jpg",
                "link": "www.test.com"
            })
        );

        let profile_request = &transport.requests()[1];
        assert_eq!(
            profile_request.uri,
            "https://graph.facebook.com/me?fields=id,first_name,last_name,picture,link,email"
        );
        assert_eq!(profile_request.headers[http::header::AUTHORIZATION], "Bearer tok");
    }

    #[tokio::test]
    async fn test_linkedin_identity_without_picture() {
        let (handle, store, transport) = handle_for(Arc::new(LinkedIn));
        store
            .store_access_token("linkedin", AccessToken::new("tok"))
            .await
            .unwrap();
        transport.push_json(
            200,
            r#"{"emailAddress":"test@test.com","id":"x1","firstName":"First","lastName":"Last","publicProfileUrl":"www.test.com"}"#,
        );

        let identity = handle.identity().await.unwrap();
        assert_eq!(identity.get_str("picture"), Some(""));
        assert_eq!(identity.email(), "test@test.com");

        let uri = &transport.requests()[0].uri;
        assert!(uri.starts_with("https://api.linkedin.com/v1/people/~:("));
        assert!(uri.ends_with("format=json&oauth2_access_token=tok"));
    }

    #[tokio::test]
    async fn test_state_mismatch_is_failed_authorization() {
        let (handle, store, transport) = handle_for(Arc::new(Facebook));
        handle.authorization_uri(&[]).await.unwrap();

        let err = handle
            .authorize(Some("code"), Some("forged"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FailedAuthorization(_)));
        assert_eq!(transport.call_count(), 0);
        assert!(!store.has_authorization_state("facebook").await);
    }

    #[tokio::test]
    async fn test_provider_error_is_failed_authorization() {
        let (handle, _, transport) = handle_for(Arc::new(Facebook));
        let state = state_of(&handle.authorization_uri(&[]).await.unwrap());
        transport.push_json(400, r#"{"error":"invalid_grant"}"#);

        let err = handle
            .authorize(Some("code"), Some(&state))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FailedAuthorization(ref msg) if msg.contains("invalid_grant")));
        assert!(!handle.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_failed_authorization() {
        let (handle, store, transport) = handle_for(Arc::new(Facebook));
        let state = state_of(&handle.authorization_uri(&[]).await.unwrap());
        transport.push_json(200, r#"{"access_token":"tok","expires_in":10000000000000}"#);

        let err = handle
            .authorize(Some("code"), Some(&state))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FailedAuthorization(_)));
        assert!(!store.has_access_token("facebook").await);
    }

    #[tokio::test]
    async fn test_gc_clears_token_and_state() {
        let (handle, store, _) = handle_for(Arc::new(Facebook));
        store
            .store_access_token("facebook", AccessToken::new("tok"))
            .await
            .unwrap();
        store
            .store_authorization_state("facebook", "nonce")
            .await
            .unwrap();

        handle.gc().await.unwrap();

        assert!(!handle.is_authenticated().await);
        assert!(!handle.has_authorization_state().await);
        assert!(matches!(
            handle.access_token().await.unwrap_err(),
            Error::TokenNotFound(_)
        ));
        assert!(matches!(
            handle.authorization_state().await.unwrap_err(),
            Error::AuthorizationStateNotFound(_)
        ));

        // Nothing left to clear
        handle.gc().await.unwrap();
    }

    #[tokio::test]
    async fn test_request_decode_and_transport_errors() {
        let (handle, store, transport) = handle_for(Arc::new(Facebook));
        store
            .store_access_token("facebook", AccessToken::new("tok"))
            .await
            .unwrap();

        transport.push(200, "<html>not json</html>");
        let err = handle.request(ApiRequest::get("/me")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        transport.push_failure("connection reset");
        let err = handle.request(ApiRequest::get("/me")).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        transport.push(200, "<html>raw</html>");
        let body = handle.request_raw(ApiRequest::get("/me")).await.unwrap();
        assert_eq!(body, b"<html>raw</html>");
    }
}
