//! Voice-memo recording

pub mod capture;
pub mod controller;
pub mod storage;

pub use capture::{CaptureBackend, CaptureError, RecordPermission};
pub use controller::{
    RecorderController, RecordingLimits, RecordingOutcome, RecordingSnapshot, RecordingStarted,
};
pub use storage::RecordingStore;
