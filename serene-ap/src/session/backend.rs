//! Hardware audio session backend
//!
//! The only code allowed to physically engage or disengage the platform audio
//! session. Called exclusively by [`SessionArbiter`](super::SessionArbiter).

use thiserror::Error;
use tracing::info;

/// Platform activation/deactivation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// Platform reports the session busy (already being activated); the session is usable
    #[error("audio session busy")]
    Busy,

    /// Category conflict or other hard failure
    #[error("{0}")]
    Failed(String),
}

/// Physical audio session control
pub trait SessionBackend: Send {
    fn activate(&mut self) -> Result<(), ActivationError>;
    fn deactivate(&mut self) -> Result<(), ActivationError>;
}

/// Backend for hosts without a session concept; records the transitions in the log
#[derive(Debug, Default)]
pub struct LoggingSessionBackend {
    active: bool,
}

impl LoggingSessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl SessionBackend for LoggingSessionBackend {
    fn activate(&mut self) -> Result<(), ActivationError> {
        self.active = true;
        info!("Hardware audio session activated");
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), ActivationError> {
        self.active = false;
        info!("Hardware audio session deactivated");
        Ok(())
    }
}
