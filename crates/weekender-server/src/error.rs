//! Server error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (static files, venue file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The requested venue is not configured.
    #[error("Venue not found. Valid venues: {}", .valid.join(", "))]
    UnknownVenue { venue: String, valid: Vec<String> },

    /// The requested year is outside the bookable range.
    #[error("Year must be between {min} and {max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    /// The year query parameter is not a number.
    #[error("Invalid year {value:?}: expected a four-digit year")]
    MalformedYear { value: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }

    /// Creates an unknown venue error.
    pub fn unknown_venue(venue: impl Into<String>, valid: Vec<String>) -> Self {
        Self::UnknownVenue {
            venue: venue.into(),
            valid,
        }
    }

    /// Returns true if the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownVenue { .. } | Self::YearOutOfRange { .. } | Self::MalformedYear { .. }
        )
    }
}
