//! Read-only listing of the packages in a content root.
//!
//! A content root holds the enabled packages directly and the disabled ones in
//! its [`DISABLED_DIR_NAME`] sub-directory. A missing directory is an empty
//! directory here; per-entry read failures are logged and skipped so one bad
//! file never hides the rest of the library.

use crate::models::{PackageEntry, PackageState};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Sub-directory of the content root holding disabled packages.
pub const DISABLED_DIR_NAME: &str = "_disabled";

/// Extension (without dot) of a recognized package file.
pub const PACKAGE_EXTENSION: &str = "pk3";

/// Base-game archives that are never listed or modified.
pub const PROTECTED_PACKAGES: &[&str] = &[
    "assets0.pk3",
    "assets1.pk3",
    "assets2.pk3",
    "assets3.pk3",
    "assets5.pk3",
    "assetsmv.pk3",
    "assetsmv2.pk3",
];

/// Whether `name` belongs to the base-game denylist (case-insensitive).
pub fn is_protected(name: &str) -> bool {
    PROTECTED_PACKAGES
        .iter()
        .any(|protected| protected.eq_ignore_ascii_case(name))
}

/// Whether `name` carries the package extension (case-insensitive).
pub fn has_package_extension(name: &str) -> bool {
    Utf8Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// The `_disabled` directory belonging to a content root.
pub fn disabled_dir(root: &Utf8Path) -> Utf8PathBuf {
    root.join(DISABLED_DIR_NAME)
}

/// List both directories of `root`, sorted case-insensitively by name.
///
/// When `filter` is given, only names containing it (case-insensitive) are kept.
pub fn scan(root: &Utf8Path, filter: Option<&str>) -> Vec<PackageEntry> {
    let needle = filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let mut entries = list_directory(root, PackageState::Enabled);
    entries.extend(list_directory(&disabled_dir(root), PackageState::Disabled));

    if let Some(needle) = needle {
        entries.retain(|entry| entry.sort_key().contains(&needle));
    }

    entries.sort_by_key(PackageEntry::sort_key);

    tracing::debug!("Scanned {}: {} packages", root, entries.len());
    entries
}

/// List one directory, treating every file in it as having `state`.
///
/// Returned in directory order; callers sort.
pub fn list_directory(dir: &Utf8Path, state: PackageState) -> Vec<PackageEntry> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::error!("Error collecting mods from {}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut entries = Vec::new();

    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(dir_entry) => dir_entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {}", dir, e);
                continue;
            }
        };

        let Ok(path) = Utf8PathBuf::try_from(dir_entry.path()) else {
            tracing::warn!("Skipping non UTF-8 file name in {}", dir);
            continue;
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path, e);
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let Some(name) = path.file_name().map(str::to_string) else {
            continue;
        };

        if !has_package_extension(&name) || is_protected(&name) {
            continue;
        }

        entries.push(PackageEntry {
            path,
            name,
            state,
            size_bytes: metadata.len(),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_protected_is_case_insensitive() {
        assert!(is_protected("assets1.pk3"));
        assert!(is_protected("ASSETS1.PK3"));
        assert!(!is_protected("assets4.pk3"));
    }

    #[test]
    fn test_package_extension() {
        assert!(has_package_extension("map.pk3"));
        assert!(has_package_extension("MAP.PK3"));
        assert!(!has_package_extension("map.zip"));
        assert!(!has_package_extension("pk3"));
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let (_temp_dir, root) = temp_root();
        fs::create_dir(disabled_dir(&root)).unwrap();
        fs::write(root.join("Zeta.pk3"), b"z").unwrap();
        fs::write(root.join("alpha.PK3"), b"a").unwrap();
        fs::write(root.join("assets0.pk3"), b"base").unwrap();
        fs::write(root.join("readme.txt"), b"text").unwrap();
        fs::create_dir(root.join("folder.pk3")).unwrap();
        fs::write(disabled_dir(&root).join("beta.pk3"), b"bb").unwrap();

        let entries = scan(&root, None);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.PK3", "beta.pk3", "Zeta.pk3"]);
        assert_eq!(entries[1].state, PackageState::Disabled);
        assert_eq!(entries[1].size_bytes, 2);
    }

    #[test]
    fn test_scan_with_filter() {
        let (_temp_dir, root) = temp_root();
        fs::write(root.join("zz_Saber.pk3"), b"").unwrap();
        fs::write(root.join("map_ffa.pk3"), b"").unwrap();

        let entries = scan(&root, Some("SABER"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "zz_Saber.pk3");

        assert_eq!(scan(&root, Some("  ")).len(), 2);
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let (_temp_dir, root) = temp_root();
        assert!(scan(&root.join("nope"), None).is_empty());
    }
}
