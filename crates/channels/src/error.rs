/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared across channel implementations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid at the call site.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// No live peer connection to send against.
    #[error("no active channel connection")]
    NoConnection,

    /// Operation is currently unavailable (not configured/ready).
    #[error("channel operation unavailable: {message}")]
    Unavailable { message: String },

    /// A frame send kept failing until its retries were exhausted.
    #[error("channel send failed: {message}")]
    SendFailed { message: String },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn send_failed(message: impl std::fmt::Display) -> Self {
        Self::SendFailed {
            message: message.to_string(),
        }
    }
}
