//! Application credentials and callback URI resolution

use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Raw application credentials as supplied by configuration or the caller
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientCredentials {
    /// Application (client) id issued by the provider
    #[serde(default)]
    pub key: Option<String>,

    /// Application (client) secret issued by the provider
    #[serde(default)]
    pub secret: Option<String>,

    /// Callback path or absolute URI; defaults to the current request URI
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

impl ClientCredentials {
    /// Credentials with key and secret
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            secret: Some(secret.into()),
            redirect_uri: None,
        }
    }

    /// Set the callback path or absolute callback URI
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Validate and bind to a callback URI
    ///
    /// The key is checked before the secret. A relative `redirect_uri`
    /// replaces the path of `base_uri`; an absolute one is used as is.
    pub fn validate(&self, base_uri: &Url) -> Result<Credentials> {
        let client_key = non_empty(self.key.as_deref()).ok_or(Error::InvalidApplicationKey)?;
        let client_secret =
            non_empty(self.secret.as_deref()).ok_or(Error::InvalidApplicationSecretKey)?;

        let callback_uri = match non_empty(self.redirect_uri.as_deref()) {
            Some(redirect) => resolve_redirect(base_uri, redirect)?,
            None => strip_query(base_uri.clone()),
        };

        Ok(Credentials {
            client_key: client_key.to_string(),
            client_secret: client_secret.to_string(),
            callback_uri,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Validated credentials bound to an absolute callback URI
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Application (client) id
    pub client_key: String,

    /// Application (client) secret
    pub client_secret: String,

    /// Absolute URI the provider redirects back to
    pub callback_uri: Url,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_key", &self.client_key)
            .field("client_secret", &"[REDACTED]")
            .field("callback_uri", &self.callback_uri.as_str())
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn strip_query(mut uri: Url) -> Url {
    uri.set_query(None);
    uri.set_fragment(None);
    uri
}

fn resolve_redirect(base_uri: &Url, redirect: &str) -> Result<Url> {
    if let Ok(absolute) = Url::parse(redirect) {
        return Ok(absolute);
    }

    let mut uri = strip_query(base_uri.clone());
    if uri.cannot_be_a_base() {
        return Err(Error::InvalidUri(format!(
            "Cannot resolve redirect {} against {}",
            redirect, base_uri
        )));
    }

    // The redirect may carry its own query string
    match redirect.split_once('?') {
        Some((path, query)) => {
            uri.set_path(path);
            uri.set_query(Some(query));
        }
        None => uri.set_path(redirect),
    }

    Ok(uri)
}

/// URI of the request being handled, without its query string
///
/// Used as the base for callback URIs. The scheme comes from
/// `X-Forwarded-Proto` when a proxy sets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUri(pub Url);

impl CurrentUri {
    /// Borrow the URI
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Take the URI
    #[must_use]
    pub fn into_url(self) -> Url {
        self.0
    }

    fn from_parts(parts: &Parts) -> Result<Self> {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");

        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .ok_or_else(|| Error::InvalidUri("Request has no Host header".to_string()))?;

        let url = Url::parse(&format!("{}://{}{}", scheme, host, parts.uri.path()))?;
        Ok(Self(strip_query(url)))
    }
}

impl<S> FromRequestParts<S> for CurrentUri
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}
