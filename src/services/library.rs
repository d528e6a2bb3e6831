use crate::models::package::bytes_to_mb;
use crate::models::{ExportRecord, PackageEntry, PackageState, Profile};
use crate::services::ErrorCategory;
use crate::services::catalog::{self, PACKAGE_EXTENSION};
use crate::services::digest;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use filetime::FileTime;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use thiserror::Error;

static PACKAGE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("Invalid package name regex"));

/// Errors raised by library operations on a single package
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("No base folder is configured for the active profile")]
    NoLibraryConfigured,

    #[error("Base folder {0} does not exist")]
    LibraryMissing(Utf8PathBuf),

    #[error("{0} is a protected base-game asset")]
    Protected(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("{0} already exists")]
    NameCollision(String),

    #[error("{0} was not found in the library")]
    NotFound(String),

    #[error("Failed to move {0}: {1}")]
    ToggleFailed(String, #[source] io::Error),

    #[error("Failed to rename {0}: {1}")]
    RenameFailed(String, #[source] io::Error),

    #[error("Failed to delete {0}: {1}")]
    DeleteFailed(String, #[source] io::Error),
}

impl LibraryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::NoLibraryConfigured | LibraryError::LibraryMissing(_) => {
                ErrorCategory::Configuration
            }
            LibraryError::Protected(_) | LibraryError::InvalidName(_) => ErrorCategory::Validation,
            LibraryError::NameCollision(_) => ErrorCategory::Collision,
            LibraryError::NotFound(_) => ErrorCategory::NotFound,
            LibraryError::ToggleFailed(..)
            | LibraryError::RenameFailed(..)
            | LibraryError::DeleteFailed(..) => ErrorCategory::Filesystem,
        }
    }
}

/// Result of a single toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The file was moved and now has this state.
    Moved(PackageState),
    /// The file already had the requested state; nothing was touched.
    Unchanged(PackageState),
}

impl ToggleOutcome {
    pub fn state(self) -> PackageState {
        match self {
            ToggleOutcome::Moved(state) | ToggleOutcome::Unchanged(state) => state,
        }
    }
}

/// Aggregated result of a toggle batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub moved: usize,
    pub unchanged: usize,
    /// `(package name, error message)` for every entry that failed
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Toggled {} mods ({} unchanged, {} errors).",
            self.moved,
            self.unchanged,
            self.failed()
        )
    }
}

/// Counts returned by [`ModLibrary::install`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl InstallReport {
    pub fn summary(&self) -> String {
        format!(
            "Installed {} mods ({} skipped, {} errors).",
            self.installed, self.skipped, self.failed
        )
    }
}

/// Counts returned by [`ModLibrary::remove`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub removed: usize,
    pub failures: Vec<(String, String)>,
}

impl RemoveReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> String {
        format!("Deleted {} files ({} errors).", self.removed, self.failed())
    }
}

/// Asks whether an already installed package may be replaced.
///
/// Consulted on the front-end thread while resolving an [`InstallPlan`],
/// never from inside the install worker.
#[cfg_attr(test, mockall::automock)]
pub trait OverwritePrompt {
    fn confirm_overwrite(&mut self, name: &str) -> bool;
}

/// Pre-collected answers keyed by package name; unknown names are declined.
impl OverwritePrompt for HashMap<String, bool> {
    fn confirm_overwrite(&mut self, name: &str) -> bool {
        self.get(name).copied().unwrap_or(false)
    }
}

/// One source file scheduled for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallItem {
    pub source: Utf8PathBuf,
    pub name: String,
    /// Path of an installed package with the same (case-insensitive) name
    pub existing: Option<Utf8PathBuf>,
    pub overwrite: bool,
    /// Reason the item cannot be installed at all
    pub problem: Option<String>,
}

/// Install batch with every overwrite decision made up front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub items: Vec<InstallItem>,
}

impl InstallPlan {
    /// Names that already exist in the library and still need a decision.
    pub fn conflicts(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.problem.is_none() && item.existing.is_some())
            .map(|item| item.name.clone())
            .collect()
    }

    pub fn set_overwrite(&mut self, name: &str, overwrite: bool) {
        for item in self.items.iter_mut().filter(|item| item.name == name) {
            item.overwrite = overwrite;
        }
    }

    /// Ask `prompt` about every conflicting item.
    pub fn resolve_with<P: OverwritePrompt + ?Sized>(&mut self, prompt: &mut P) {
        for item in &mut self.items {
            if item.problem.is_none() && item.existing.is_some() {
                item.overwrite = prompt.confirm_overwrite(&item.name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-content-root locks shared by every [`ModLibrary`] of a session.
///
/// Two libraries opened on the same root serialize their mutating calls on
/// the same mutex.
#[derive(Debug, Clone, Default)]
pub struct RootLocks {
    inner: Arc<Mutex<HashMap<Utf8PathBuf, Arc<Mutex<()>>>>>,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, root: &Utf8Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(root.to_path_buf()).or_default())
    }
}

/// Enable/disable/install/remove/rename/export over one content root.
///
/// The enabled/disabled state of a package is its directory: the content root
/// or its `_disabled` sibling. Every move is a same-filesystem rename, so a
/// package is always in exactly one of the two.
#[derive(Debug, Clone)]
pub struct ModLibrary {
    root: Utf8PathBuf,
    disabled: Utf8PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ModLibrary {
    /// Open the library of `profile`.
    ///
    /// # Errors
    /// [`LibraryError::NoLibraryConfigured`] when the profile has no content root,
    /// [`LibraryError::LibraryMissing`] when it is not an existing directory.
    pub fn open(profile: &Profile, locks: &RootLocks) -> Result<Self, LibraryError> {
        let root = profile
            .content_root()
            .ok_or(LibraryError::NoLibraryConfigured)?;
        Self::open_root(root, locks)
    }

    pub fn open_root(root: &Utf8Path, locks: &RootLocks) -> Result<Self, LibraryError> {
        if !root.is_dir() {
            return Err(LibraryError::LibraryMissing(root.to_path_buf()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            disabled: catalog::disabled_dir(root),
            lock: locks.lock_for(root),
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn disabled_dir(&self) -> &Utf8Path {
        &self.disabled
    }

    pub fn dir_for(&self, state: PackageState) -> &Utf8Path {
        match state {
            PackageState::Enabled => &self.root,
            PackageState::Disabled => &self.disabled,
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scan(&self, filter: Option<&str>) -> Vec<PackageEntry> {
        catalog::scan(&self.root, filter)
    }

    /// Look a package up by name, case-insensitively.
    pub fn find(&self, name: &str) -> Result<PackageEntry, LibraryError> {
        if catalog::is_protected(name) {
            return Err(LibraryError::Protected(name.to_string()));
        }

        self.scan(None)
            .into_iter()
            .find(|entry| entry.is_named(name))
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))
    }

    /// Current state of the file called exactly `name`, read from disk.
    pub fn state_of(&self, name: &str) -> Result<PackageState, LibraryError> {
        let enabled = self.root.join(name).is_file();
        let disabled = self.disabled.join(name).is_file();

        match (enabled, disabled) {
            (true, false) => Ok(PackageState::Enabled),
            (false, true) => Ok(PackageState::Disabled),
            (true, true) => Err(LibraryError::NameCollision(name.to_string())),
            (false, false) => Err(LibraryError::NotFound(name.to_string())),
        }
    }

    /// Move a package to `desired`, or to the other directory when `None`.
    ///
    /// Requesting the state a package already has is a successful no-op.
    pub fn toggle(
        &self,
        entry: &PackageEntry,
        desired: Option<PackageState>,
    ) -> Result<ToggleOutcome, LibraryError> {
        ensure_not_protected(&entry.name)?;

        let _guard = self.guard();
        let current = self.state_of(&entry.name)?;
        let target = desired.unwrap_or_else(|| current.flipped());

        if target == current {
            tracing::debug!("{} already {}", entry.name, current);
            return Ok(ToggleOutcome::Unchanged(current));
        }

        let source = self.dir_for(current).join(&entry.name);
        let dest_dir = self.dir_for(target);

        fs::create_dir_all(dest_dir)
            .map_err(|e| LibraryError::ToggleFailed(entry.name.clone(), e))?;

        if let Some(existing) = existing_name(dest_dir, &entry.name) {
            return Err(LibraryError::NameCollision(existing));
        }

        ensure_writable(&source).map_err(|e| LibraryError::ToggleFailed(entry.name.clone(), e))?;

        let dest = dest_dir.join(&entry.name);
        fs::rename(&source, &dest)
            .map_err(|e| LibraryError::ToggleFailed(entry.name.clone(), e))?;

        tracing::info!("Moved {} -> {}", source, dest);
        Ok(ToggleOutcome::Moved(target))
    }

    /// Toggle every entry, collecting failures instead of stopping at the first.
    pub fn toggle_batch(
        &self,
        entries: &[PackageEntry],
        desired: Option<PackageState>,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for entry in entries {
            match self.toggle(entry, desired) {
                Ok(ToggleOutcome::Moved(_)) => report.moved += 1,
                Ok(ToggleOutcome::Unchanged(_)) => report.unchanged += 1,
                Err(e) => {
                    tracing::error!("Toggle failed for {}: {}", entry.name, e);
                    report.failures.push((entry.name.clone(), e.to_string()));
                }
            }
        }

        report
    }

    /// Inspect `sources` and find the names that are already installed.
    pub fn plan_install(&self, sources: &[Utf8PathBuf]) -> InstallPlan {
        let items = sources
            .iter()
            .map(|source| {
                let name = source.file_name().unwrap_or_default().to_string();
                let problem = if name.is_empty() {
                    Some("no file name".to_string())
                } else if !catalog::has_package_extension(&name) {
                    Some(format!("not a .{} file", PACKAGE_EXTENSION))
                } else if catalog::is_protected(&name) {
                    Some("protected base-game asset".to_string())
                } else if !source.is_file() {
                    Some("source file not found".to_string())
                } else {
                    None
                };

                let existing = if problem.is_none() {
                    self.installed_path(&name)
                } else {
                    None
                };

                InstallItem {
                    source: source.clone(),
                    name,
                    existing,
                    overwrite: false,
                    problem,
                }
            })
            .collect();

        InstallPlan { items }
    }

    /// Copy the planned files into the content root.
    ///
    /// Content, permissions and modification time are preserved. An item whose
    /// name exists (in either directory) is only written when its `overwrite`
    /// flag is set; the replaced copy is removed so the name stays unique.
    pub fn install(&self, plan: InstallPlan) -> InstallReport {
        let _guard = self.guard();
        let mut report = InstallReport::default();
        let total = plan.items.len();

        for (index, item) in plan.items.into_iter().enumerate() {
            tracing::info!("Installing... ({}/{}) {}", index + 1, total, item.name);

            if let Some(problem) = &item.problem {
                tracing::error!("Failed to install {}: {}", item.source, problem);
                report.failed += 1;
                continue;
            }

            // Re-check: the file may have appeared since the plan was made.
            let existing = self.installed_path(&item.name);
            if existing.is_some() && !(item.overwrite && item.existing.is_some()) {
                tracing::info!("Skipping {}: already installed", item.name);
                report.skipped += 1;
                continue;
            }

            let dest = self.root.join(&item.name);
            let result = copy_preserving(&item.source, &dest).and_then(|()| match existing {
                Some(old) if old != dest => fs::remove_file(&old),
                _ => Ok(()),
            });

            match result {
                Ok(()) => report.installed += 1,
                Err(e) => {
                    tracing::error!("Failed to install {}: {}", item.name, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!("{}", report.summary());
        report
    }

    /// Permanently delete the files behind `entries`.
    pub fn remove(&self, entries: &[PackageEntry]) -> RemoveReport {
        let _guard = self.guard();
        let mut report = RemoveReport::default();

        for entry in entries {
            let result = ensure_not_protected(&entry.name)
                .and_then(|()| self.state_of(&entry.name))
                .and_then(|state| {
                    let path = self.dir_for(state).join(&entry.name);
                    fs::remove_file(&path)
                        .map_err(|e| LibraryError::DeleteFailed(entry.name.clone(), e))
                });

            match result {
                Ok(()) => {
                    tracing::info!("Deleted {}", entry.name);
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to delete {}: {}", entry.name, e);
                    report.failures.push((entry.name.clone(), e.to_string()));
                }
            }
        }

        report
    }

    /// Rename a package inside its current directory.
    ///
    /// `.pk3` is appended when missing. Returns the renamed entry.
    pub fn rename(&self, entry: &PackageEntry, new_name: &str) -> Result<PackageEntry, LibraryError> {
        ensure_not_protected(&entry.name)?;
        let new_name = normalize_package_name(new_name)?;

        let _guard = self.guard();
        let state = self.state_of(&entry.name)?;
        let dir = self.dir_for(state);

        if new_name != entry.name {
            for candidate_dir in [self.root.as_path(), self.disabled.as_path()] {
                if let Some(existing) = existing_name(candidate_dir, &new_name) {
                    let is_self = candidate_dir == dir && existing == entry.name;
                    if !is_self {
                        return Err(LibraryError::NameCollision(new_name));
                    }
                }
            }

            fs::rename(dir.join(&entry.name), dir.join(&new_name))
                .map_err(|e| LibraryError::RenameFailed(entry.name.clone(), e))?;
            tracing::info!("Renamed {} -> {}", entry.name, new_name);
        }

        let path = dir.join(&new_name);
        let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(entry.size_bytes);

        Ok(PackageEntry {
            path,
            name: new_name,
            state,
            size_bytes,
        })
    }

    /// Build the load-order manifest: enabled packages first, then disabled,
    /// each alphabetical, numbered from 1.
    pub fn export(&self) -> Vec<ExportRecord> {
        let _guard = self.guard();
        let mut records = Vec::new();
        let mut load_order = 1;

        for state in [PackageState::Enabled, PackageState::Disabled] {
            let mut entries = catalog::list_directory(self.dir_for(state), state);
            entries.sort_by_key(PackageEntry::sort_key);

            for entry in entries {
                let (size_bytes, last_modified) = match fs::metadata(&entry.path) {
                    Ok(metadata) => (
                        metadata.len(),
                        metadata.modified().map(format_timestamp).unwrap_or_default(),
                    ),
                    Err(e) => {
                        tracing::warn!("Could not stat {}: {}", entry.path, e);
                        (entry.size_bytes, String::new())
                    }
                };

                records.push(ExportRecord {
                    digest_hex: digest::sha256_or_sentinel(&entry.path),
                    name: entry.name,
                    state,
                    load_order,
                    size_mb: bytes_to_mb(size_bytes),
                    path: entry.path,
                    last_modified,
                });
                load_order += 1;
            }
        }

        tracing::info!("Exported {} records from {}", records.len(), self.root);
        records
    }

    /// Path of an installed package named `name` in either directory.
    fn installed_path(&self, name: &str) -> Option<Utf8PathBuf> {
        [self.root.as_path(), self.disabled.as_path()]
            .into_iter()
            .find_map(|dir| existing_name(dir, name).map(|found| dir.join(found)))
    }
}

/// Write records as a JSON array with 4-space indentation.
pub fn write_manifest(path: &Utf8Path, records: &[ExportRecord]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create manifest: {}", path))?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records
        .serialize(&mut serializer)
        .context("Failed to serialize export manifest")?;

    writer
        .flush()
        .with_context(|| format!("Failed to write manifest: {}", path))?;

    tracing::info!("List saved to {}", path);
    Ok(())
}

/// Validate a user supplied package name, appending `.pk3` when missing.
pub fn normalize_package_name(raw: &str) -> Result<String, LibraryError> {
    let trimmed = raw.trim();
    let suffix = format!(".{}", PACKAGE_EXTENSION);

    // Path::extension() is None for ".pk3", so compare the suffix directly
    let stem = if trimmed.to_ascii_lowercase().ends_with(&suffix) {
        &trimmed[..trimmed.len() - suffix.len()]
    } else {
        trimmed
    };
    if stem.is_empty() {
        return Err(LibraryError::InvalidName(raw.to_string()));
    }

    let name = if stem.len() == trimmed.len() {
        format!("{}{}", trimmed, suffix)
    } else {
        trimmed.to_string()
    };
    if !PACKAGE_NAME_PATTERN.is_match(&name) {
        return Err(LibraryError::InvalidName(raw.to_string()));
    }

    // A protected name is never a valid target
    if catalog::is_protected(&name) {
        return Err(LibraryError::InvalidName(raw.to_string()));
    }

    Ok(name)
}

fn ensure_not_protected(name: &str) -> Result<(), LibraryError> {
    if catalog::is_protected(name) {
        Err(LibraryError::Protected(name.to_string()))
    } else {
        Ok(())
    }
}

/// File name in `dir` equal to `name` ignoring ASCII case, exact match first.
fn existing_name(dir: &Utf8Path, name: &str) -> Option<String> {
    if dir.join(name).is_file() {
        return Some(name.to_string());
    }

    fs::read_dir(dir).ok()?.flatten().find_map(|dir_entry| {
        let file_name = dir_entry.file_name().into_string().ok()?;
        let is_file = dir_entry.file_type().ok()?.is_file();
        (is_file && file_name.eq_ignore_ascii_case(name)).then_some(file_name)
    })
}

/// Copy through a temporary sibling so `dest` never holds a partial file.
fn copy_preserving(source: &Utf8Path, dest: &Utf8Path) -> io::Result<()> {
    let file_name = dest.file_name().unwrap_or("package");
    let temp = dest.with_file_name(format!(".{}.partial", file_name));

    let result = (|| {
        let metadata = fs::metadata(source)?;
        fs::copy(source, &temp)?;
        filetime::set_file_times(
            &temp,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )?;
        fs::rename(&temp, dest)
    })();

    if result.is_err() && temp.exists() {
        let _ = fs::remove_file(&temp);
    }

    result
}

#[cfg(unix)]
fn ensure_writable(path: &Utf8Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o200 == 0 {
        permissions.set_mode(mode | 0o200);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_writable(_path: &Utf8Path) -> io::Result<()> {
    Ok(())
}

fn format_timestamp(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
