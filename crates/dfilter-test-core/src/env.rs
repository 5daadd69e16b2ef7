//! Base process environment shared by every invocation.

use std::collections::BTreeMap;
use std::ffi::OsString;

/// The complete environment a child process is started with.
///
/// Children never inherit the harness environment implicitly; whatever is in
/// this map is exactly what they see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl BaseEnv {
    /// An empty environment.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    #[must_use]
    pub fn inherit() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// Set a variable, replacing any previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a variable.
    #[must_use]
    pub fn without(mut self, key: impl Into<OsString>) -> Self {
        self.remove(key);
        self
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: impl Into<OsString>) {
        self.vars.remove(&key.into());
    }

    /// Apply configured overrides: removals first, then assignments.
    #[must_use]
    pub fn with_overrides<'a>(
        mut self,
        set: impl IntoIterator<Item = (&'a String, &'a String)>,
        remove: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        for key in remove {
            self.remove(key);
        }
        for (key, value) in set {
            self.set(key, value);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.vars.get(std::ffi::OsStr::new(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsString, &OsString)> {
        self.vars.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
