//! Hardware audio session arbitration

pub mod arbiter;
pub mod backend;

pub use arbiter::{ReleaseOutcome, SessionArbiter, SessionGrant};
pub use backend::{ActivationError, LoggingSessionBackend, SessionBackend};
