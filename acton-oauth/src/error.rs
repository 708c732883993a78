//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the broker, its service handles and token stores
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were supplied without an application key
    #[error("Invalid application key")]
    InvalidApplicationKey,

    /// Credentials were supplied without an application secret
    #[error("Invalid application secret key")]
    InvalidApplicationSecretKey,

    /// No provider flow is registered under the requested name
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The service was never created on this broker
    #[error("Service not initialized: {0}")]
    ServiceNotInitialized(String),

    /// The provider rejected the authorization code exchange
    #[error("Failed authorization: {0}")]
    FailedAuthorization(String),

    /// No access token is stored for the provider
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// No authorization state is stored for the provider
    #[error("Authorization state not found: {0}")]
    AuthorizationStateNotFound(String),

    /// A response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The HTTP transport failed before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with an OAuth2 or API level error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A URI could not be parsed or resolved
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for this error
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidApplicationKey => "INVALID_APPLICATION_KEY",
            Self::InvalidApplicationSecretKey => "INVALID_APPLICATION_SECRET_KEY",
            Self::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            Self::ServiceNotInitialized(_) => "SERVICE_NOT_INITIALIZED",
            Self::FailedAuthorization(_) => "FAILED_AUTHORIZATION",
            Self::TokenNotFound(_) => "TOKEN_NOT_FOUND",
            Self::AuthorizationStateNotFound(_) => "AUTHORIZATION_STATE_NOT_FOUND",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::InvalidUri(_) => "INVALID_URI",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Session(_) => "SESSION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ServiceNotFound(_) | Self::ServiceNotInitialized(_) => StatusCode::NOT_FOUND,
            Self::FailedAuthorization(_)
            | Self::TokenNotFound(_)
            | Self::AuthorizationStateNotFound(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidUri(_) => StatusCode::BAD_REQUEST,
            Self::Decode(_) | Self::Transport(_) | Self::Protocol(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidApplicationKey
            | Self::InvalidApplicationSecretKey
            | Self::Config(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            status: status.as_u16(),
        }
    }

    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged; the client only sees a generic message
        let message = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(code = self.code(), "OAuth broker error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse::with_code(status, self.code(), message);
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUri(err.to_string())
    }
}
