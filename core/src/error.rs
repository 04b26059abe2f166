//! Domain error type for monitor operations.

use thiserror::Error;

/// Typed error enum for monitor operations, allowing callers to match on
/// specific failure modes instead of inspecting opaque `anyhow::Error` messages.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network failure, timeout, or a non-2xx response from the backend.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Request rejected, either by the server (e.g. duplicate address) or
    /// locally before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// A successful response whose body did not match the expected shape.
    #[error("{0}")]
    Decode(String),

    /// Invalid client configuration.
    #[error("{0}")]
    Config(String),

    /// Unexpected error from internal subsystems.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Alias for `std::result::Result<T, MonitorError>`.
pub type Result<T> = std::result::Result<T, MonitorError>;
