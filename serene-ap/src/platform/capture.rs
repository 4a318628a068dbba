//! File-backed capture

use crate::recording::{CaptureBackend, CaptureError};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Creates the target file on `begin` and syncs it on `finish`
///
/// No audio is captured; the file holds a short marker so kept takes are
/// non-empty.
#[derive(Debug, Default)]
pub struct FileCaptureBackend {
    current: Option<File>,
}

impl FileCaptureBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureBackend for FileCaptureBackend {
    fn begin(&mut self, target: &Path) -> Result<(), CaptureError> {
        let mut file = File::create(target)
            .map_err(|e| CaptureError::Start(format!("{}: {}", target.display(), e)))?;
        file.write_all(b"serene-capture\n")
            .map_err(|e| CaptureError::Start(e.to_string()))?;
        debug!("Capturing to {}", target.display());
        self.current = Some(file);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        match self.current.take() {
            Some(file) => file
                .sync_all()
                .map_err(|e| CaptureError::Finish(e.to_string())),
            None => Err(CaptureError::Finish("no capture in progress".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_begin_creates_file_and_finish_closes_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voice_1.m4a");
        let mut backend = FileCaptureBackend::new();

        backend.begin(&path).unwrap();
        assert!(path.exists());
        backend.finish().unwrap();
        assert!(backend.finish().is_err());
    }

    #[test]
    fn test_begin_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let mut backend = FileCaptureBackend::new();
        let err = backend
            .begin(&dir.path().join("nope").join("voice.m4a"))
            .unwrap_err();
        assert!(matches!(err, CaptureError::Start(_)));
    }
}
