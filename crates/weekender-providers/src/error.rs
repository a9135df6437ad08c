//! Error types for booked-date providers.
//!
//! Errors never cross the fetcher boundary: the token provider and the event
//! fetcher log them and fall back to "no token" or a partial/empty
//! [`BookedDateSet`](weekender_core::BookedDateSet). Inside the provider every
//! HTTP step still returns a [`ProviderResult`] so the fallback happens in one
//! place.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The access token was rejected (401) or could not be exchanged.
    AuthenticationFailed,
    /// The account lacks access to the calendar (403).
    AuthorizationFailed,
    /// Connection failed, timed out, or the body could not be read.
    NetworkError,
    /// The provider throttled us (429).
    RateLimited,
    /// Any other non-success status.
    ServerError,
    /// The response body was not the expected JSON.
    InvalidResponse,
    /// The calendar does not exist (404).
    NotFound,
    /// Missing or invalid provider configuration.
    ConfigurationError,
    /// Unexpected local failure, e.g. building the HTTP client.
    InternalError,
}

impl ProviderErrorCode {
    /// Maps an HTTP status code to an error code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::ServerError,
        }
    }

    /// Returns true if the next refresh cycle may succeed without any
    /// configuration change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns the snake_case name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while talking to a booking provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// HTTP status of the failed response, when there was one.
    status: Option<u16>,
    /// The provider that generated this error (e.g. "graph").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            provider: None,
            source: None,
        }
    }

    /// Creates an error from a non-success HTTP response.
    ///
    /// The body is kept in the message, trimmed to a readable length.
    pub fn from_status(status: u16, context: &str, body: &str) -> Self {
        const MAX_BODY: usize = 512;
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_BODY) {
            Some((idx, _)) => &body[..idx],
            None => body,
        };
        let mut err = Self::new(
            ProviderErrorCode::from_status(status),
            format!("{context} returned HTTP {status}: {body}"),
        );
        err.status = Some(status);
        err
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if the credential used for the request was rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.code == ProviderErrorCode::AuthenticationFailed && self.status == Some(401)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
