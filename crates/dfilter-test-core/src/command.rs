//! Analyzer command-line construction.
//!
//! Maps a filter expression and a set of [`FilterOptions`] onto the argument
//! vector understood by the analyzer. Token order is significant to the
//! analyzer's option parser:
//!
//! ```text
//! -n -r <capture> [-2 --selected-frame=N] (-Y <filter> | -2 -R <filter>) [-o <prefs>]
//! ```

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// Disable name resolution.
pub const NO_NAME_RESOLUTION: &str = "-n";
/// Next argument is the capture file to read.
pub const READ_FILE: &str = "-r";
/// Two-pass analysis.
pub const TWO_PASS: &str = "-2";
/// Packet display filter.
pub const DISPLAY_FILTER: &str = "-Y";
/// Read filter (requires two-pass mode).
pub const READ_FILTER: &str = "-R";
/// Preference override (`name:value`).
pub const PREFERENCE: &str = "-o";

/// Which analyzer stage the filter is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterRole {
    /// Applied per record while printing (`-Y`).
    #[default]
    DisplayFilter,
    /// Applied while the capture file is ingested (`-R`).
    ReadFilter,
}

/// Invocation options for a single analyzer run.
///
/// The default is a plain single-pass display filter with no frame selection
/// and no preference override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Select this frame; forces two-pass mode.
    pub frame_number: Option<NonZeroU32>,
    /// Preference override passed verbatim after `-o`. Empty means none.
    pub prefs: Option<String>,
    /// Apply the filter as a read filter; forces two-pass mode.
    pub read_filter: bool,
}

impl FilterOptions {
    /// Display filter with a selected frame.
    #[must_use]
    pub const fn selected_frame(frame_number: NonZeroU32) -> Self {
        Self {
            frame_number: Some(frame_number),
            prefs: None,
            read_filter: false,
        }
    }

    /// Read filter in two-pass mode.
    #[must_use]
    pub const fn read_filter() -> Self {
        Self {
            frame_number: None,
            prefs: None,
            read_filter: true,
        }
    }

    /// Attach a preference override.
    #[must_use]
    pub fn with_prefs(mut self, prefs: impl Into<String>) -> Self {
        self.prefs = Some(prefs.into());
        self
    }

    /// The invocation mode these options describe.
    #[must_use]
    pub const fn mode(&self) -> InvocationMode {
        InvocationMode {
            role: if self.read_filter {
                FilterRole::ReadFilter
            } else {
                FilterRole::DisplayFilter
            },
            selected_frame: self.frame_number,
        }
    }
}

/// How a filter is applied by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationMode {
    pub role: FilterRole,
    pub selected_frame: Option<NonZeroU32>,
}

impl InvocationMode {
    /// Read filters and frame selection each require two passes.
    #[must_use]
    pub const fn uses_two_pass(&self) -> bool {
        matches!(self.role, FilterRole::ReadFilter) || self.selected_frame.is_some()
    }
}

/// A fully built analyzer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl AnalyzerCommand {
    /// Build the invocation of `program` for `filter` against `capture_file`.
    #[must_use]
    pub fn new(program: &Path, capture_file: &Path, filter: &str, options: &FilterOptions) -> Self {
        Self {
            program: program.to_path_buf(),
            args: build_args(capture_file, filter, options),
        }
    }
}

/// Build the analyzer argument vector (without the program name).
///
/// `-2` is emitted once for frame selection and once more for a read filter;
/// the analyzer accepts the repeat and callers rely on both being present.
#[must_use]
pub fn build_args(capture_file: &Path, filter: &str, options: &FilterOptions) -> Vec<String> {
    let mut args = vec![
        NO_NAME_RESOLUTION.to_string(),
        READ_FILE.to_string(),
        capture_file.to_string_lossy().into_owned(),
    ];

    if let Some(frame) = options.frame_number {
        args.push(TWO_PASS.to_string());
        args.push(format!("--selected-frame={frame}"));
    }

    if options.read_filter {
        args.push(TWO_PASS.to_string());
        args.push(READ_FILTER.to_string());
    } else {
        args.push(DISPLAY_FILTER.to_string());
    }
    args.push(filter.to_string());

    // An empty preference string means no override.
    if let Some(prefs) = options.prefs.as_ref().filter(|p| !p.is_empty()) {
        args.push(PREFERENCE.to_string());
        args.push(prefs.clone());
    }

    args
}
