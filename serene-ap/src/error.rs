//! Error types for serene-ap
//!
//! Defines the audio core's error taxonomy using thiserror. Only permission
//! and file errors are meant to reach the UI; everything else is recovered
//! locally by the component that detects it.

use serene_common::Consumer;
use thiserror::Error;

/// Main error type for serene-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Capture permission refused by the user or platform
    #[error("Recording permission denied")]
    PermissionDenied,

    /// Platform refused to activate the hardware audio session
    #[error("Audio session activation failed: {0}")]
    HardwareActivationFailed(String),

    /// Capture file could not be finalized or removed
    #[error("Recording file error: {0}")]
    FileFinalizeFailed(String),

    /// Capture hardware refused to start or finish
    #[error("Capture error: {0}")]
    Capture(String),

    /// Transport command issued with no queue loaded
    #[error("Playback queue is empty")]
    QueueEmpty,

    /// Playback rate must be finite and positive
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f32),

    /// Duration argument outside the accepted range
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The audio controller task is gone
    #[error("Audio controller unavailable")]
    ControllerUnavailable,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from shared helpers
    #[error(transparent)]
    Common(#[from] serene_common::Error),
}

/// Convenience Result type using serene-ap Error
pub type Result<T> = std::result::Result<T, Error>;

/// The arbiter refused a grant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("session denied to {consumer}: {reason}")]
pub struct SessionDenied {
    pub consumer: Consumer,
    pub reason: String,
}

impl From<SessionDenied> for Error {
    fn from(denied: SessionDenied) -> Self {
        Error::HardwareActivationFailed(denied.reason)
    }
}
