use thiserror::Error;

/// Result type alias for hub client operations.
pub type Result<T> = std::result::Result<T, HubClientError>;

/// Errors that can occur while connecting to or talking with the hub.
#[derive(Debug, Error)]
pub enum HubClientError {
    /// Hub URL cannot be used for a connection.
    #[error("Invalid hub URL: {0}")]
    InvalidUrl(String),

    /// Negotiate request failed at the HTTP level.
    #[error("Negotiate request failed: {0}")]
    Negotiate(#[from] reqwest::Error),

    /// Server answered negotiate with an error or without a token.
    #[error("Negotiate rejected: {0}")]
    NegotiateRejected(String),

    /// Server does not offer the WebSocket transport.
    #[error("Server does not support WebSockets")]
    NoWebSocketTransport,

    /// Negotiate kept redirecting.
    #[error("Negotiate redirect limit exceeded ({0})")]
    TooManyRedirects(usize),

    /// Connection attempt (upgrade and handshake) timed out.
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Connection was closed before the handshake completed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Framing or handshake error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] kiosk_protocol::ProtocolError),
}

impl HubClientError {
    /// Create a new invalid URL error.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl(message.into())
    }

    /// Create a new connection lost error.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }
}
