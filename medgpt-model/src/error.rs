//! Error types for completion clients.

use thiserror::Error;

/// Errors raised while requesting or streaming a completion.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// The API credential is absent or empty.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be sent or the connection dropped mid-stream.
    #[error("Request failed ({provider}): {message}")]
    Request {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The API answered with an error status or an in-stream error object.
    #[error("API error ({provider}){}: {message}", status.map(|s| format!(" {s}")).unwrap_or_default())]
    Api {
        /// The provider that produced the error.
        provider: String,
        /// HTTP status, absent for errors reported inside the event stream.
        status: Option<u16>,
        /// Server-supplied error message.
        message: String,
    },

    /// The event stream carried a payload of an unexpected shape.
    #[error("Malformed response ({provider}): {message}")]
    MalformedResponse {
        /// The provider that produced the error.
        provider: String,
        /// A description of what could not be decoded.
        message: String,
    },
}

impl ModelError {
    /// Whether the failure is a protocol violation rather than an availability problem.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }
}

/// Result type alias for completion operations.
pub type Result<T> = std::result::Result<T, ModelError>;
