//! Platform capture seams

use futures::future::BoxFuture;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture could not start: {0}")]
    Start(String),

    #[error("capture did not finish cleanly: {0}")]
    Finish(String),
}

/// Writes microphone input to a file target
pub trait CaptureBackend: Send {
    fn begin(&mut self, target: &Path) -> Result<(), CaptureError>;

    /// Flush and close the current target
    fn finish(&mut self) -> Result<(), CaptureError>;
}

/// Capture-permission check
///
/// May show a prompt, so it resolves asynchronously and is awaited outside
/// the audio controller's serialized context.
pub trait RecordPermission: Send + Sync {
    fn request(&self) -> BoxFuture<'static, bool>;
}
