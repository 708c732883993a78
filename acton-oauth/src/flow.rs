//! Authorization-code flow mechanics
//!
//! An [`AuthorizationFlow`] is built once per registered provider. It knows
//! how to send the user to the provider, how to trade the returned code for an
//! [`AccessToken`], and how to sign API requests with that token.
//!
//! [`OAuth2Flow`] is the standard implementation. Provider differences
//! (endpoints, scope separator, where the token goes on API calls) are
//! described by [`ProviderEndpoints`] rather than by separate code paths.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use oauth2::{
    basic::{BasicErrorResponse, BasicTokenType},
    AuthUrl, Client, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields, RedirectUrl, Scope,
    StandardRevocableToken, StandardTokenIntrospectionResponse, StandardTokenResponse, TokenUrl,
};
use serde_json::{Map, Value};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::storage::TokenStore;
use crate::token::AccessToken;
use crate::transport::{HttpClient, HttpRequest};

/// Type alias for our configured OAuth client
type ConfiguredClient = Client<
    BasicErrorResponse,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    BasicErrorResponse,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

/// Where the access token goes on authenticated API calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>`
    BearerHeader,

    /// `Authorization: <scheme> <token>`
    AuthorizationScheme(String),

    /// `?<name>=<token>`
    QueryParameter(String),
}

/// A provider's OAuth2 dialect
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// Where users are sent to grant access
    pub authorization_url: String,

    /// Where codes are exchanged for tokens
    pub token_url: String,

    /// Base that relative API paths are resolved against
    pub api_base_url: String,

    /// Separator used to join scopes into the `scope` parameter
    pub scope_separator: String,

    /// How API requests carry the token
    pub token_placement: TokenPlacement,

    /// Headers sent with every API request
    pub default_headers: HeaderMap,
}

impl ProviderEndpoints {
    /// Endpoints with space-separated scopes and bearer tokens
    pub fn new(
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            api_base_url: api_base_url.into(),
            scope_separator: " ".to_string(),
            token_placement: TokenPlacement::BearerHeader,
            default_headers: HeaderMap::new(),
        }
    }

    /// Set the scope separator
    #[must_use]
    pub fn with_scope_separator(mut self, separator: impl Into<String>) -> Self {
        self.scope_separator = separator.into();
        self
    }

    /// Set how the token is attached to API requests
    #[must_use]
    pub fn with_token_placement(mut self, placement: TokenPlacement) -> Self {
        self.token_placement = placement;
        self
    }

    /// Add a header sent with every API request
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }
}

/// Authenticated API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method (GET unless set)
    pub method: Method,

    /// Path relative to the provider's API base, or an absolute URL
    pub path: String,

    /// Request body
    pub body: Option<Vec<u8>>,

    /// Extra headers; they override the provider's defaults
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// Request with an explicit method
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request with a body
    pub fn post(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Raw OAuth2 mechanics for one provider
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Build the URL that starts the authorization dance
    ///
    /// A fresh state nonce is generated and stored before returning.
    async fn authorization_uri(&self, extra_params: &[(&str, &str)]) -> Result<Url>;

    /// Exchange an authorization code for a token and store it
    ///
    /// `state` must match the stored nonce. The nonce is consumed whether or
    /// not the exchange succeeds.
    async fn request_access_token(&self, code: &str, state: Option<&str>) -> Result<AccessToken>;

    /// Perform an authenticated API call and return the raw body
    async fn request(&self, request: ApiRequest) -> Result<Vec<u8>>;
}

/// Generate a cryptographically secure random state value
pub fn generate_state() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Standard authorization-code flow
pub struct OAuth2Flow {
    provider: String,
    client: ConfiguredClient,
    credentials: Credentials,
    scopes: Vec<String>,
    endpoints: ProviderEndpoints,
    api_base: Url,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpClient>,
}

impl OAuth2Flow {
    /// Create a flow for a provider
    pub fn new(
        provider: impl Into<String>,
        credentials: Credentials,
        scopes: Vec<String>,
        endpoints: ProviderEndpoints,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let provider = provider.into();

        let client = Client::new(ClientId::new(credentials.client_key.clone()))
            .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(endpoints.authorization_url.clone()).map_err(|e| {
                Error::InvalidUri(format!("Invalid {} auth URL: {}", provider, e))
            })?)
            .set_token_uri(TokenUrl::new(endpoints.token_url.clone()).map_err(|e| {
                Error::InvalidUri(format!("Invalid {} token URL: {}", provider, e))
            })?)
            .set_redirect_uri(
                RedirectUrl::new(credentials.callback_uri.to_string())
                    .map_err(|e| Error::InvalidUri(format!("Invalid redirect URI: {}", e)))?,
            );

        let api_base = Url::parse(&endpoints.api_base_url)
            .map_err(|e| Error::InvalidUri(format!("Invalid {} API URL: {}", provider, e)))?;

        Ok(Self {
            provider,
            client,
            credentials,
            scopes,
            endpoints,
            api_base,
            store,
            transport,
        })
    }

    /// Provider name this flow is bound to
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Scopes requested during authorization
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Endpoints and conventions of the provider
    #[must_use]
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    async fn exchange(&self, code: &str, state: Option<&str>) -> Result<AccessToken> {
        let expected = self.store.retrieve_authorization_state(&self.provider).await?;
        match state {
            Some(state) if state == expected => {}
            Some(_) => {
                return Err(Error::Protocol(
                    "Authorization state does not match".to_string(),
                ))
            }
            None => return Err(Error::Protocol("Authorization state is missing".to_string())),
        }

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", self.credentials.callback_uri.as_str())
            .append_pair("client_id", &self.credentials.client_key)
            .append_pair("client_secret", &self.credentials.client_secret)
            .finish();

        let request = http::Request::builder()
            .method(Method::POST)
            .uri(self.endpoints.token_url.as_str())
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.into_bytes())
            .map_err(|e| Error::Internal(format!("Failed to build token request: {}", e)))?;

        tracing::debug!(provider = %self.provider, "Exchanging authorization code");
        let response = self.transport.send(request).await?;
        let token = parse_token_response(response.status(), response.body())?;

        self.store
            .store_access_token(&self.provider, token.clone())
            .await?;

        Ok(token)
    }

    fn api_url(&self, path: &str, token: &AccessToken) -> Result<Url> {
        let mut url = match Url::parse(path) {
            Ok(absolute) => absolute,
            Err(_) => self.api_base.join(path.trim_start_matches('/'))?,
        };

        if let TokenPlacement::QueryParameter(name) = &self.endpoints.token_placement {
            url.query_pairs_mut().append_pair(name, &token.access_token);
        }

        Ok(url)
    }

    fn authorization_header(&self, token: &AccessToken) -> Result<Option<HeaderValue>> {
        let value = match &self.endpoints.token_placement {
            TokenPlacement::BearerHeader => format!("Bearer {}", token.access_token),
            TokenPlacement::AuthorizationScheme(scheme) => {
                format!("{} {}", scheme, token.access_token)
            }
            TokenPlacement::QueryParameter(_) => return Ok(None),
        };

        let mut value = HeaderValue::from_str(&value)
            .map_err(|_| Error::Internal("Access token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

#[async_trait]
impl AuthorizationFlow for OAuth2Flow {
    async fn authorization_uri(&self, extra_params: &[(&str, &str)]) -> Result<Url> {
        let state = generate_state();

        let url = {
            let mut request = self
                .client
                .authorize_url(|| CsrfToken::new(state.clone()));

            let scope = self.scopes.join(&self.endpoints.scope_separator);
            if !scope.is_empty() {
                request = request.add_scope(Scope::new(scope));
            }

            for (name, value) in extra_params {
                request = request.add_extra_param(*name, *value);
            }

            let (url, _) = request.url();
            url
        };

        self.store
            .store_authorization_state(&self.provider, &state)
            .await?;

        tracing::debug!(provider = %self.provider, "Built authorization URI");
        Ok(url)
    }

    async fn request_access_token(&self, code: &str, state: Option<&str>) -> Result<AccessToken> {
        let result = self.exchange(code, state).await;

        if let Err(e) = self.store.clear_authorization_state(&self.provider).await {
            tracing::warn!(provider = %self.provider, "Failed to clear authorization state: {}", e);
        }

        result
    }

    async fn request(&self, api_request: ApiRequest) -> Result<Vec<u8>> {
        let token = self.store.retrieve_access_token(&self.provider).await?;
        let url = self.api_url(&api_request.path, &token)?;

        let uri: http::Uri = url
            .as_str()
            .parse()
            .map_err(|e| Error::InvalidUri(format!("Invalid API URL for {}: {}", self.provider, e)))?;

        let mut request: HttpRequest = http::Request::new(api_request.body.unwrap_or_default());
        *request.method_mut() = api_request.method.clone();
        *request.uri_mut() = uri;

        let headers = request.headers_mut();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &self.endpoints.default_headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(value) = self.authorization_header(&token)? {
            headers.insert(header::AUTHORIZATION, value);
        }
        for (name, value) in &api_request.headers {
            headers.insert(name.clone(), value.clone());
        }

        tracing::debug!(
            provider = %self.provider,
            method = %api_request.method,
            path = %api_request.path,
            "Sending API request"
        );

        let response = self.transport.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "{} API request {} {} failed: {} - {}",
                self.provider,
                api_request.method,
                api_request.path,
                status,
                String::from_utf8_lossy(response.body())
            )));
        }

        Ok(response.into_body())
    }
}

/// Turn a token endpoint response into an [`AccessToken`]
///
/// Accepts JSON bodies and the legacy `application/x-www-form-urlencoded`
/// form some providers still return. An `error` field means failure even on
/// a 2xx status.
fn parse_token_response(status: http::StatusCode, body: &[u8]) -> Result<AccessToken> {
    if let Ok(err) = serde_json::from_slice::<BasicErrorResponse>(body) {
        return Err(Error::Protocol(format!("Token endpoint returned {}: {}", status, err)));
    }

    if !status.is_success() {
        return Err(Error::Protocol(format!(
            "Token endpoint returned {}: {}",
            status,
            String::from_utf8_lossy(body)
        )));
    }

    let mut fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            return Err(Error::Decode(
                "Token response is not a JSON object".to_string(),
            ))
        }
        Err(_) => url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect::<Map<String, Value>>(),
    };

    let access_token = match fields.remove("access_token") {
        Some(Value::String(token)) if !token.is_empty() => token,
        _ => {
            return Err(Error::Decode(
                "Token response has no access_token".to_string(),
            ))
        }
    };

    let mut token = AccessToken::new(access_token);

    if let Some(Value::String(token_type)) = fields.remove("token_type") {
        token.token_type = token_type;
    }

    if let Some(Value::String(refresh_token)) = fields.remove("refresh_token") {
        token.refresh_token = Some(refresh_token);
    }

    // "expires" is the legacy Facebook spelling
    let lifetime = fields
        .remove("expires_in")
        .or_else(|| fields.remove("expires"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });
    if let Some(seconds) = lifetime {
        let end_of_life = TimeDelta::try_seconds(seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::Decode(format!("Token lifetime of {} seconds is out of range", seconds))
            })?;
        token = token.with_end_of_life(end_of_life);
    }

    if let Some(Value::String(scope)) = fields.remove("scope") {
        token.scopes = scope
            .split(|c: char| c == ' ' || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    token.extra_params = fields;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use crate::test_support::StubHttpClient;
    use std::collections::HashMap;

    fn credentials() -> Credentials {
        Credentials {
            client_key: "client-key".to_string(),
            client_secret: "client-secret".to_string(),
            callback_uri: Url::parse("http://localhost/login").unwrap(),
        }
    }

    fn endpoints() -> ProviderEndpoints {
        ProviderEndpoints::new(
            "https://provider.test/authorize",
            "https://provider.test/token",
            "https://api.provider.test/v1/",
        )
    }

    fn flow_with(
        endpoints: ProviderEndpoints,
        scopes: Vec<String>,
    ) -> (OAuth2Flow, Arc<MemoryTokenStore>, Arc<StubHttpClient>) {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(StubHttpClient::new());
        let flow = OAuth2Flow::new(
            "test",
            credentials(),
            scopes,
            endpoints,
            store.clone(),
            transport.clone(),
        )
        .unwrap();
        (flow, store, transport)
    }

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_generate_state() {
        let state1 = generate_state();
        let state2 = generate_state();

        // States should be unique
        assert_ne!(state1, state2);

        // 32 bytes base64-encoded without padding
        assert_eq!(state1.len(), 43);
    }

    #[tokio::test]
    async fn test_authorization_uri_stores_state() {
        let (flow, store, transport) = flow_with(
            endpoints().with_scope_separator(","),
            vec!["email".to_string(), "profile".to_string()],
        );

        let url = flow.authorization_uri(&[("approval_prompt", "force")]).await.unwrap();
        let params = query(&url);

        assert!(url.as_str().starts_with("https://provider.test/authorize?"));
        assert_eq!(params["client_id"], "client-key");
        assert_eq!(params["redirect_uri"], "http://localhost/login");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], "email,profile");
        assert_eq!(params["approval_prompt"], "force");
        assert!(!params.contains_key("client_secret"));

        let stored = store.retrieve_authorization_state("test").await.unwrap();
        assert_eq!(params["state"], stored);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_authorization_uri_without_scopes() {
        let (flow, _, _) = flow_with(endpoints(), Vec::new());
        let url = flow.authorization_uri(&[]).await.unwrap();
        assert!(!query(&url).contains_key("scope"));
    }

    #[tokio::test]
    async fn test_successful_exchange_stores_token() {
        let (flow, store, transport) = flow_with(endpoints(), Vec::new());
        store.store_authorization_state("test", "nonce").await.unwrap();
        transport.push_json(
            200,
            r#"{"access_token":"tok","token_type":"bearer","expires_in":3600,"refresh_token":"ref","scope":"a b","id_token":"x"}"#,
        );

        let token = flow.request_access_token("the-code", Some("nonce")).await.unwrap();

        assert_eq!(token.access_token, "tok");
        assert_eq!(token.refresh_token.as_deref(), Some("ref"));
        assert_eq!(token.scopes, vec!["a", "b"]);
        assert_eq!(token.extra_params.get("id_token"), Some(&Value::from("x")));
        assert!(token.is_alive());

        assert_eq!(store.retrieve_access_token("test").await.unwrap(), token);
        assert!(!store.has_authorization_state("test").await);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.uri, "https://provider.test/token");
        assert_eq!(sent.headers[header::ACCEPT], "application/json");

        let form: HashMap<String, String> = url::form_urlencoded::parse(&sent.body)
            .into_owned()
            .collect();
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "the-code");
        assert_eq!(form["client_id"], "client-key");
        assert_eq!(form["client_secret"], "client-secret");
        assert_eq!(form["redirect_uri"], "http://localhost/login");
    }

    #[tokio::test]
    async fn test_state_mismatch_skips_exchange() {
        let (flow, store, transport) = flow_with(endpoints(), Vec::new());
        store.store_authorization_state("test", "nonce").await.unwrap();

        let err = flow.request_access_token("code", Some("forged")).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(transport.call_count(), 0);
        assert!(!store.has_authorization_state("test").await);
        assert!(!store.has_access_token("test").await);
    }

    #[tokio::test]
    async fn test_missing_state_is_rejected() {
        let (flow, store, _) = flow_with(endpoints(), Vec::new());

        let err = flow.request_access_token("code", Some("nonce")).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationStateNotFound(_)));

        store.store_authorization_state("test", "nonce").await.unwrap();
        let err = flow.request_access_token("code", None).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_error_body_with_success_status() {
        let (flow, store, transport) = flow_with(endpoints(), Vec::new());
        store.store_authorization_state("test", "nonce").await.unwrap();
        transport.push_json(
            200,
            r#"{"error":"invalid_grant","error_description":"The code has expired"}"#,
        );

        let err = flow.request_access_token("code", Some("nonce")).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ref msg) if msg.contains("invalid_grant")));
        assert!(!store.has_access_token("test").await);
        assert!(!store.has_authorization_state("test").await);
    }

    #[test]
    fn test_legacy_form_token_response() {
        let token =
            parse_token_response(http::StatusCode::OK, b"access_token=abc&expires=5183999")
                .unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.end_of_life.is_some());
    }

    #[test]
    fn test_token_response_without_lifetime() {
        let token = parse_token_response(http::StatusCode::OK, br#"{"access_token":"abc"}"#)
            .unwrap();
        assert!(token.end_of_life.is_none());
        assert_eq!(token.token_type, "bearer");
    }

    #[test]
    fn test_token_lifetime_out_of_range() {
        let huge = br#"{"access_token":"a","expires_in":10000000000000}"#;
        let err = parse_token_response(http::StatusCode::OK, huge).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        let max = format!(r#"{{"access_token":"a","expires_in":{}}}"#, i64::MAX);
        let err = parse_token_response(http::StatusCode::OK, max.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_huge_lifetime_fails_exchange_without_storing() {
        let (flow, store, transport) = flow_with(endpoints(), Vec::new());
        store.store_authorization_state("test", "nonce").await.unwrap();
        transport.push_json(200, r#"{"access_token":"a","expires_in":10000000000000}"#);

        let err = flow.request_access_token("code", Some("nonce")).await.unwrap_err();

        assert!(matches!(err, Error::Decode(_)));
        assert!(!store.has_access_token("test").await);
    }

    #[test]
    fn test_token_response_without_token() {
        let err = parse_token_response(http::StatusCode::OK, br#"{"token_type":"bearer"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        let err = parse_token_response(http::StatusCode::BAD_GATEWAY, b"upstream down")
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_request_with_bearer_header() {
        let (flow, store, transport) = flow_with(
            endpoints().with_header(header::USER_AGENT, HeaderValue::from_static("test-agent")),
            Vec::new(),
        );
        store.store_access_token("test", AccessToken::new("tok")).await.unwrap();
        transport.push_json(200, r#"{"id":1}"#);

        let body = flow.request(ApiRequest::get("/me?fields=id")).await.unwrap();
        assert_eq!(body, br#"{"id":1}"#);

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.uri, "https://api.provider.test/v1/me?fields=id");
        assert_eq!(sent.headers[header::AUTHORIZATION], "Bearer tok");
        assert_eq!(sent.headers[header::USER_AGENT], "test-agent");
    }

    #[tokio::test]
    async fn test_request_with_custom_scheme_and_absolute_url() {
        let (flow, store, transport) = flow_with(
            endpoints().with_token_placement(TokenPlacement::AuthorizationScheme(
                "token".to_string(),
            )),
            Vec::new(),
        );
        store.store_access_token("test", AccessToken::new("tok")).await.unwrap();
        transport.push_json(200, "{}");

        flow.request(
            ApiRequest::post("https://other.test/items", b"{}".to_vec())
                .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        )
        .await
        .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.uri, "https://other.test/items");
        assert_eq!(sent.headers[header::AUTHORIZATION], "token tok");
        assert_eq!(sent.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(sent.body, b"{}");
    }

    #[tokio::test]
    async fn test_request_with_query_token() {
        let (flow, store, transport) = flow_with(
            endpoints().with_token_placement(TokenPlacement::QueryParameter(
                "oauth2_access_token".to_string(),
            )),
            Vec::new(),
        );
        store.store_access_token("test", AccessToken::new("tok")).await.unwrap();
        transport.push_json(200, "{}");

        flow.request(ApiRequest::get("people?format=json")).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(
            sent.uri,
            "https://api.provider.test/v1/people?format=json&oauth2_access_token=tok"
        );
        assert!(sent.headers.get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_without_token() {
        let (flow, _, transport) = flow_with(endpoints(), Vec::new());
        let err = flow.request(ApiRequest::get("me")).await.unwrap_err();
        assert!(matches!(err, Error::TokenNotFound(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_protocol_error() {
        let (flow, store, transport) = flow_with(endpoints(), Vec::new());
        store.store_access_token("test", AccessToken::new("tok")).await.unwrap();
        transport.push(403, "rate limited");

        let err = flow.request(ApiRequest::get("me")).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ref msg) if msg.contains("403") && msg.contains("rate limited")));
    }
}
