//! Error types for hub framing and message parsing.

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or parsing hub records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Record is not valid JSON or does not have the expected shape.
    #[error("Invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),

    /// Record bytes are not UTF-8.
    #[error("Record is not valid UTF-8")]
    InvalidUtf8,

    /// Record grew past the configured limit without a terminator.
    #[error("Record too large: {size} bytes (max {max})")]
    RecordTooLarge { size: usize, max: usize },

    /// A message kind is missing a field it requires.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The server rejected the handshake.
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
