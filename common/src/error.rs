//! Error types for outbound fetches.

use thiserror::Error;

/// Errors raised while fetching a remote document.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body could not be read as text.
    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    /// Client could not be constructed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl FetchError {
    /// Check if this error came from the network rather than the payload.
    pub fn is_timeout_or_network(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Status { .. })
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
