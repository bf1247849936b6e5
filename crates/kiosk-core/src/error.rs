use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid product status: {0}")]
    InvalidStatus(String),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
