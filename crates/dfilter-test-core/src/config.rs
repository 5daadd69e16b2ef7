//! Configuration loader for dfilter-test.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dfilter-test.config.yaml";

/// Errors that can occur during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
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
    #[error("parallel must be at least 1")]
    ZeroParallel,
    #[error("{0} program name must not be empty")]
    EmptyProgramName(&'static str),
}

/// Harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory holding the analyzer and checker. `PATH` is searched if unset.
    #[serde(default)]
    pub program_dir: Option<PathBuf>,
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
    #[serde(default = "default_checker")]
    pub checker: String,
    /// Directory trace files are resolved against.
    #[serde(default = "default_capture_dir")]
    pub capture_dir: PathBuf,
    /// Variables set on the base environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Variables removed from the base environment.
    #[serde(default)]
    pub env_remove: Vec<String>,
    #[serde(default)]
    pub parallel: Option<usize>,
}

fn default_analyzer() -> String {
    "tshark".to_string()
}

fn default_checker() -> String {
    "dftest".to_string()
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program_dir: None,
            analyzer: default_analyzer(),
            checker: default_checker(),
            capture_dir: default_capture_dir(),
            env: BTreeMap::new(),
            env_remove: Vec::new(),
            parallel: None,
        }
    }
}

/// Load configuration from `path`.
///
/// If the file doesn't exist, returns default configuration. Relative
/// directories in the file are taken relative to the file's directory.
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The YAML is invalid
/// - A value is out of range
pub fn load_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    if !path.exists() {
        let config = HarnessConfig::default();
        validate_config(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: HarnessConfig =
        serde_yml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(base) = path.parent() {
        config.capture_dir = base.join(&config.capture_dir);
        config.program_dir = config.program_dir.map(|dir| base.join(dir));
    }

    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration.
///
/// # Errors
/// Returns an error if `parallel` is zero or a program name is empty.
pub fn validate_config(config: &HarnessConfig) -> Result<(), ConfigError> {
    if config.parallel == Some(0) {
        return Err(ConfigError::ZeroParallel);
    }
    if config.analyzer.is_empty() {
        return Err(ConfigError::EmptyProgramName("analyzer"));
    }
    if config.checker.is_empty() {
        return Err(ConfigError::EmptyProgramName("checker"));
    }
    Ok(())
}

/// CLI override options for configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub program_dir: Option<PathBuf>,
    pub analyzer: Option<String>,
    pub checker: Option<String>,
    pub capture_dir: Option<PathBuf>,
    pub parallel: Option<usize>,
}

/// Apply CLI overrides to a configuration.
#[must_use]
pub fn apply_overrides(mut config: HarnessConfig, overrides: &ConfigOverrides) -> HarnessConfig {
    if let Some(ref dir) = overrides.program_dir {
        config.program_dir = Some(dir.clone());
    }
    if let Some(ref analyzer) = overrides.analyzer {
        config.analyzer.clone_from(analyzer);
    }
    if let Some(ref checker) = overrides.checker {
        config.checker.clone_from(checker);
    }
    if let Some(ref dir) = overrides.capture_dir {
        config.capture_dir.clone_from(dir);
    }
    if let Some(parallel) = overrides.parallel {
        config.parallel = Some(parallel);
    }
    config
}
