//! Error types for sound playback.

/// Result type alias for sound operations.
pub type Result<T> = std::result::Result<T, SoundError>;

/// Errors that can occur while playing the notification sound.
///
/// None of these ever reach the screen; the kiosk logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    /// No usable audio output.
    #[error("Audio device unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// Sound asset could not be decoded.
    #[error("Cannot decode sound: {message}")]
    Decode { message: String },

    /// Volume outside 0.0..=1.0.
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    /// Reading the asset or writing the bell failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SoundError {
    /// Create a new device unavailable error.
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: message.into(),
        }
    }

    /// Create a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
