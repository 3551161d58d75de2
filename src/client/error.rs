//! Client Error Types
use thiserror::Error;

/// Errors surfaced by the client API and relay consumer
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected the bearer token (401)
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server rejected the request as invalid (400)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Unexpected response status
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Failed to decode a response or event payload
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
