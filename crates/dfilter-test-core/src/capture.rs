//! Capture-file resolution.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture file '{trace}' not found in {}", dir.display())]
    NotFound { trace: String, dir: PathBuf },
}

/// Maps trace identifiers (file names) to paths under a capture directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResolver {
    dir: PathBuf,
}

impl CaptureResolver {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve `trace` to an existing file.
    ///
    /// # Errors
    /// Returns [`CaptureError::NotFound`] if the file does not exist.
    pub fn resolve(&self, trace: &str) -> Result<PathBuf, CaptureError> {
        let path = self.dir.join(trace);
        if path.is_file() {
            Ok(path)
        } else {
            Err(CaptureError::NotFound {
                trace: trace.to_string(),
                dir: self.dir.clone(),
            })
        }
    }
}
