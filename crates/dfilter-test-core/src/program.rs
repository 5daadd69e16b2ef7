//! Locating the analyzer and checker executables.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("program '{name}' not found in {}", dir.display())]
    NotInDir { name: String, dir: PathBuf },
    #[error("program '{name}' not found in PATH: {source}")]
    NotInPath {
        name: String,
        #[source]
        source: which::Error,
    },
}

/// Locate `name` in `dir` if given, otherwise on `PATH`.
///
/// The platform executable suffix is appended when looking in `dir`.
///
/// # Errors
/// Returns an error if no such executable exists.
pub fn locate(name: &str, dir: Option<&Path>) -> Result<PathBuf, ProgramError> {
    match dir {
        Some(dir) => {
            let path = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
            if path.is_file() {
                Ok(path)
            } else {
                Err(ProgramError::NotInDir {
                    name: name.to_string(),
                    dir: dir.to_path_buf(),
                })
            }
        }
        None => which::which(name).map_err(|source| ProgramError::NotInPath {
            name: name.to_string(),
            source,
        }),
    }
}
