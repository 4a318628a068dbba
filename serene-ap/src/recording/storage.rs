//! Capture file lifecycle
//!
//! Allocates `voice_<unix-millis>.m4a` targets under the recordings directory
//! and deletes or verifies them when a take ends.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "voice_";
const FILE_EXTENSION: &str = "m4a";

#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick an unused file name for a take started at `at`
    ///
    /// Creates the recordings directory on first use.
    pub fn allocate(&self, at: DateTime<Utc>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let stem = format!("{}{}", FILE_PREFIX, at.timestamp_millis());
        let mut candidate = self.dir.join(format!("{}.{}", stem, FILE_EXTENSION));
        let mut suffix = 1u32;
        while candidate.exists() {
            candidate = self
                .dir
                .join(format!("{}_{}.{}", stem, suffix, FILE_EXTENSION));
            suffix += 1;
        }

        debug!("Allocated capture file {}", candidate.display());
        Ok(candidate)
    }

    /// Remove a discarded take. A file that never got written is not an error.
    pub fn discard(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Deleted capture file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Capture file {} already absent", path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete capture file {}: {}", path.display(), e);
                Err(Error::FileFinalizeFailed(format!(
                    "could not delete {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    /// Confirm a kept take exists on disk
    pub fn finalize(&self, path: &Path) -> Result<PathBuf> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                info!(
                    "Recording saved to {} ({} bytes)",
                    path.display(),
                    meta.len()
                );
                Ok(path.to_path_buf())
            }
            Ok(_) => Err(Error::FileFinalizeFailed(format!(
                "{} is not a file",
                path.display()
            ))),
            Err(e) => Err(Error::FileFinalizeFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }
}
