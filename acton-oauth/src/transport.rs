//! HTTP transport used for token exchanges and API calls
//!
//! Flows never talk to the network directly. Every outbound request goes
//! through an [`HttpClient`], so tests can swap in a stub and applications
//! can bring their own timeout and proxy policy.

use async_trait::async_trait;

use crate::error::Result;

/// Outbound request
pub type HttpRequest = http::Request<Vec<u8>>;

/// Inbound response
pub type HttpResponse = http::Response<Vec<u8>>;

/// Low-level HTTP transport
///
/// Implementations return `Error::Transport` when no response could be
/// obtained. Non-2xx responses are still responses and are returned as-is.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and collect the full response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::error::Error;

    /// [`HttpClient`] backed by `reqwest`
    ///
    /// Redirects are not followed, so a provider answering a token request
    /// with a redirect is reported instead of silently chased.
    #[derive(Debug, Clone)]
    pub struct ReqwestHttpClient {
        client: reqwest::Client,
    }

    impl ReqwestHttpClient {
        /// Create a client with the default policy
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .user_agent(concat!("acton-oauth/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self { client })
        }

        /// Wrap a preconfigured `reqwest::Client` (timeouts, proxies, ...)
        #[must_use]
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl HttpClient for ReqwestHttpClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            let method = request.method().clone();
            let uri = request.uri().clone();

            let request = reqwest::Request::try_from(request)
                .map_err(|e| Error::Transport(format!("Invalid request to {}: {}", uri, e)))?;

            let response = self
                .client
                .execute(request)
                .await
                .map_err(|e| Error::Transport(format!("{} {} failed: {}", method, uri, e)))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| {
                Error::Transport(format!("Failed to read response from {}: {}", uri, e))
            })?;

            tracing::debug!(%method, %uri, status = status.as_u16(), "HTTP request completed");

            let mut built = http::Response::new(body.to_vec());
            *built.status_mut() = status;
            *built.headers_mut() = headers;
            Ok(built)
        }
    }

}
