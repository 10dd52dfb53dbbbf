use std::ffi::OsString;

use async_std::path::{Path, PathBuf};

/// Suffix appended to a files path to get the path of its index.
pub const DEFAULT_INDEX_SUFFIX: &str = ".idx";

/// Name of the environment variable enabling debug output.
pub const DEBUG_ENV: &str = "DEBUG";

/// Decides whether an existing index gets used without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// An existing index is always used as-is. Keeping the index in sync with its file is up to
    /// the caller.
    Trust,
    /// The index gets rebuilt if the file was modified after the index was written.
    Modified,
}

impl Default for Freshness {
    #[inline]
    fn default() -> Self {
        Freshness::Trust
    }
}

/// Settings shared by the indexer and the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Appended to a files path to derive its index path
    pub index_suffix: String,
    /// Emit debug diagnostics
    pub debug: bool,
    /// Always rebuild the index, even if it exists
    pub rebuild: bool,
    /// When an existing index counts as stale and gets rebuilt
    pub freshness: Freshness,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_suffix: DEFAULT_INDEX_SUFFIX.to_owned(),
            debug: false,
            rebuild: false,
            freshness: Freshness::default(),
        }
    }
}

impl Config {
    /// Create a default config and enable debug output if `DEBUG` is set to a non empty value.
    pub fn from_env() -> Self {
        let debug = std::env::var_os(DEBUG_ENV).map_or(false, |v| !v.is_empty());
        Self::default().with_debug(debug)
    }

    #[inline]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[inline]
    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    #[inline]
    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = freshness;
        self
    }

    #[inline]
    pub fn with_index_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.index_suffix = suffix.into();
        self
    }

    /// Returns the path of the index belonging to `source`.
    pub fn index_path(&self, source: &Path) -> PathBuf {
        let mut path: OsString = source.as_os_str().to_owned();
        path.push(&self.index_suffix);
        PathBuf::from(path)
    }

    /// Default log filter directive for this config.
    #[inline]
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "warn"
        }
    }
}
