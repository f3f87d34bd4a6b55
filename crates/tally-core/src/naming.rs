//! Output file naming
//!
//! Composite outputs write one file per member. Every member path is derived
//! from a single base path by inserting a suffix in front of the extension.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Separator placed between the file stem and the inserted suffix
pub const SUFFIX_SEPARATOR: &str = "_";

/// Insert `suffix` immediately before the final extension of `path`.
///
/// `run.json` + `quotient` becomes `run_quotient.json`; only the last
/// extension counts, so `a.b.tar` + `x` becomes `a.b_x.tar`. A path without
/// extension gets the suffix appended. An empty suffix leaves the path
/// unchanged.
pub fn insert_suffix(path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    if suffix.is_empty() {
        return path.to_path_buf();
    }
    let Some(stem) = path.file_stem() else {
        return path.to_path_buf();
    };

    let mut name = OsString::from(stem);
    name.push(SUFFIX_SEPARATOR);
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Key of an entry in a naming map
///
/// Stored members are addressed by position, derived outputs by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputSelector {
    /// Stored member at this position
    Index(usize),
    /// Output computed on demand from stored members
    Derived(String),
}

impl OutputSelector {
    /// Selector for a derived output
    pub fn derived(name: impl Into<String>) -> Self {
        Self::Derived(name.into())
    }

    /// Default suffix of this selector when no override exists
    pub fn default_suffix(&self) -> String {
        match self {
            Self::Index(i) => format!("item_{i}"),
            Self::Derived(name) => name.clone(),
        }
    }
}

impl From<usize> for OutputSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for OutputSelector {
    fn from(name: &str) -> Self {
        Self::Derived(name.to_string())
    }
}

impl fmt::Display for OutputSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Derived(name) => f.write_str(name),
        }
    }
}
