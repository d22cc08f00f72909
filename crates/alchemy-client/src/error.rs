//! Error types for the Alchemy client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure. Never carries the request URL, which
    /// embeds the API key.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// JSON-RPC error object returned by the node
    #[error("{message}")]
    Rpc { code: i64, message: String },

    /// Non-success reply from a REST endpoint, or a backend-reported fault
    #[error("{0}")]
    Api(String),

    /// WebSocket connection or framing failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The subscription stream has already ended
    #[error("Subscription stream already closed")]
    SubscriptionClosed,

    /// Reply body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reply decoded but did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e.without_url())
    }
}

// tungstenite errors report status, IO or scheme problems, never the URL
impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(e.to_string())
    }
}
