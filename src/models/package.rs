use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two library directories holds a package.
///
/// The state is never stored on disk as data; it is derived from whether the
/// file sits in the content root or in its `_disabled` sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageState {
    Enabled,
    Disabled,
}

impl PackageState {
    /// The opposite state, i.e. where a toggle without a target moves the file.
    pub fn flipped(self) -> Self {
        match self {
            PackageState::Enabled => PackageState::Disabled,
            PackageState::Disabled => PackageState::Enabled,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, PackageState::Enabled)
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageState::Enabled => write!(f, "ENABLED"),
            PackageState::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// One package file as seen by the most recent scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub path: Utf8PathBuf,
    pub name: String,
    pub state: PackageState,
    pub size_bytes: u64,
}

impl PackageEntry {
    /// Lowercased name used for ordering and lookups.
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size_bytes)
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Snapshot of a package emitted by an export.
///
/// Field names match the manifest format written by earlier releases, so the
/// serde renames must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    #[serde(rename = "status")]
    pub state: PackageState,
    pub load_order: usize,
    pub size_mb: f64,
    pub path: Utf8PathBuf,
    #[serde(rename = "sha256")]
    pub digest_hex: String,
    pub last_modified: String,
}

pub(crate) fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
