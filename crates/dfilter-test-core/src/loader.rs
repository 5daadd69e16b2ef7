//! Suite file discovery, loading and validation.

use crate::types::{Expect, Suite, SuiteFile, TestCase};
use glob::glob;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("suite path not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid case '{case}' in {}: {reason}", path.display())]
    InvalidCase {
        path: PathBuf,
        case: String,
        reason: String,
    },
}

/// Expand suite arguments into suite files.
///
/// Files are taken as given; directories contribute their `*.yaml` and
/// `*.yml` files, sorted by name. Duplicates are dropped.
///
/// # Errors
/// Returns an error if a path does not exist.
pub fn discover_suite_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, LoaderError> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        if path.is_file() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
            continue;
        }
        if !path.is_dir() {
            return Err(LoaderError::NotFound(path.clone()));
        }

        let mut found = Vec::new();
        for ext in ["yaml", "yml"] {
            let pattern = path.join(format!("*.{ext}"));
            found.extend(glob(&pattern.to_string_lossy())?.flatten());
        }
        found.sort();
        for file in found {
            if is_config_file(&file) {
                continue;
            }
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name == crate::config::CONFIG_FILE_NAME)
}

/// Load and validate one suite file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or a case is
/// invalid.
pub fn load_suite(path: &Path) -> Result<Suite, LoaderError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SuiteFile = serde_yml::from_str(&content).map_err(|source| LoaderError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    validate_suite(path, &file)?;

    let name = path
        .file_stem()
        .map_or_else(|| "suite".to_string(), |s| s.to_string_lossy().into_owned());

    Ok(Suite {
        name,
        path: path.to_path_buf(),
        file,
    })
}

/// Load every suite named by `paths`.
///
/// # Errors
/// Returns the first discovery or loading error.
pub fn load_suites(paths: &[PathBuf]) -> Result<Vec<Suite>, LoaderError> {
    discover_suite_files(paths)?
        .iter()
        .map(|path| load_suite(path))
        .collect()
}

fn validate_suite(path: &Path, file: &SuiteFile) -> Result<(), LoaderError> {
    let mut names = HashSet::new();
    for case in &file.cases {
        let invalid = |reason: &str| LoaderError::InvalidCase {
            path: path.to_path_buf(),
            case: case.name.clone(),
            reason: reason.to_string(),
        };

        if case.name.trim().is_empty() {
            return Err(invalid("empty case name"));
        }
        if !names.insert(case.name.as_str()) {
            return Err(invalid("duplicate case name"));
        }
        validate_case(case, file).map_err(invalid)?;
    }
    Ok(())
}

fn validate_case(case: &TestCase, file: &SuiteFile) -> Result<(), &'static str> {
    let has_mode = case.selected_frame.is_some() || case.prefs.is_some() || case.read_filter;
    match case.expect {
        Expect::Count(_) => {
            if case.read_filter && (case.selected_frame.is_some() || case.prefs.is_some()) {
                return Err("read-filter cannot be combined with selected-frame or prefs");
            }
            if case.resolved_trace_file(file).is_none() {
                return Err("count expectations need a trace-file");
            }
        }
        Expect::Fail(_) | Expect::Succeed(_) => {
            if has_mode {
                return Err("selected-frame, prefs and read-filter only apply to count expectations");
            }
        }
    }
    Ok(())
}
