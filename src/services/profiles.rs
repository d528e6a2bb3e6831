//! Named profiles with exactly one active.
//!
//! [`ProfileStore`] is the authoritative in-memory copy for a session. It is
//! loaded from and written back into an [`AppConfig`]; persisting that config
//! after every mutation is the caller's job (see [`crate::session::Session`]).

use crate::models::{AppConfig, DEFAULT_PROFILE_NAME, LaunchOptions, Profile};
use crate::services::ErrorCategory;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Profile '{0}' already exists")]
    DuplicateProfile(String),

    #[error("Profile '{0}' not found")]
    NotFound(String),

    #[error("Invalid profile name: '{0}'")]
    InvalidName(String),
}

impl ProfileError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProfileError::DuplicateProfile(_) => ErrorCategory::Collision,
            ProfileError::NotFound(_) => ErrorCategory::NotFound,
            ProfileError::InvalidName(_) => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStore {
    profiles: IndexMap<String, Profile>,
    active: String,
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore {
    /// A store holding only the empty `"Default"` profile.
    pub fn new() -> Self {
        let mut profiles = IndexMap::new();
        profiles.insert(
            DEFAULT_PROFILE_NAME.to_string(),
            Profile::empty(DEFAULT_PROFILE_NAME),
        );

        Self {
            profiles,
            active: DEFAULT_PROFILE_NAME.to_string(),
        }
    }

    /// Build from persisted config.
    ///
    /// An empty profile map yields the default store; an unknown active name
    /// falls back to the first profile.
    pub fn from_config(config: &AppConfig) -> Self {
        let profiles: IndexMap<String, Profile> = config
            .profiles
            .iter()
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, record)| (name.clone(), Profile::from_record(name.as_str(), record)))
            .collect();

        let Some(first) = profiles.keys().next().cloned() else {
            tracing::warn!("No profiles in configuration, creating '{}'", DEFAULT_PROFILE_NAME);
            return Self::new();
        };

        let active = match config.active_profile.as_deref() {
            Some(name) if profiles.contains_key(name) => name.to_string(),
            Some(name) => {
                tracing::warn!("Active profile '{}' is unknown, using '{}'", name, first);
                first
            }
            None => first,
        };

        Self { profiles, active }
    }

    /// Overwrite the profile part of `config` with this store.
    pub fn write_into(&self, config: &mut AppConfig) {
        config.profiles = self
            .profiles
            .iter()
            .map(|(name, profile)| (name.clone(), profile.to_record()))
            .collect();
        config.active_profile = Some(self.active.clone());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Profile {
        // The active name always refers to a stored profile.
        &self.profiles[self.active.as_str()]
    }

    fn active_mut(&mut self) -> &mut Profile {
        let active = self.active.as_str();
        &mut self.profiles[active]
    }

    /// Add an empty profile and make it active.
    pub fn create(&mut self, name: &str) -> Result<(), ProfileError> {
        let name = validate_name(name)?;
        if self.profiles.contains_key(&name) {
            return Err(ProfileError::DuplicateProfile(name));
        }

        self.profiles.insert(name.clone(), Profile::empty(name.as_str()));
        tracing::info!("Created profile '{}'", name);
        self.active = name;
        Ok(())
    }

    /// Rename a profile in place; the active selection follows it.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), ProfileError> {
        let new_name = validate_name(new_name)?;
        let Some(index) = self.profiles.get_index_of(old_name) else {
            return Err(ProfileError::NotFound(old_name.to_string()));
        };

        if new_name == old_name {
            return Ok(());
        }
        if self.profiles.contains_key(&new_name) {
            return Err(ProfileError::DuplicateProfile(new_name));
        }

        if let Some(mut profile) = self.profiles.shift_remove(old_name) {
            profile.name = new_name.clone();
            self.profiles.shift_insert(index, new_name.clone(), profile);
        }

        if self.active == old_name {
            self.active = new_name.clone();
        }

        tracing::info!("Renamed profile '{}' -> '{}'", old_name, new_name);
        Ok(())
    }

    /// Delete a profile.
    ///
    /// Deleting the active profile activates the first remaining one; deleting
    /// the last profile leaves a fresh empty `"Default"`.
    pub fn delete(&mut self, name: &str) -> Result<(), ProfileError> {
        if self.profiles.shift_remove(name).is_none() {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        tracing::info!("Deleted profile '{}'", name);

        match self.profiles.keys().next().cloned() {
            None => *self = Self::new(),
            Some(first) if self.active == name => self.active = first,
            Some(_) => {}
        }

        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::NotFound(name.to_string()));
        }

        self.active = name.to_string();
        tracing::info!("Active profile: '{}'", name);
        Ok(())
    }

    pub fn set_content_root(&mut self, root: Option<Utf8PathBuf>) {
        self.active_mut().content_root = root;
    }

    pub fn set_executable_path(&mut self, path: Option<Utf8PathBuf>) {
        self.active_mut().executable_path = path;
    }

    pub fn set_launch_options(&mut self, options: LaunchOptions) {
        self.active_mut().launch_options = options;
    }

    pub fn launch_options_mut(&mut self) -> &mut LaunchOptions {
        &mut self.active_mut().launch_options
    }
}

fn validate_name(name: &str) -> Result<String, ProfileError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
        return Err(ProfileError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_activates_new_profile() {
        let mut store = ProfileStore::new();
        store.create("Competitive").unwrap();
        assert_eq!(store.active_name(), "Competitive");
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.create("Competitive"),
            Err(ProfileError::DuplicateProfile("Competitive".to_string()))
        );
        assert!(matches!(store.create("  "), Err(ProfileError::InvalidName(_))));
    }

    #[test]
    fn test_rename_keeps_position_and_active() {
        let mut store = ProfileStore::new();
        store.create("B").unwrap();
        store.create("C").unwrap();
        store.set_active("B").unwrap();

        store.rename("B", "Bee").unwrap();
        let names: Vec<_> = store.names().collect();
        assert_eq!(names, vec!["Default", "Bee", "C"]);
        assert_eq!(store.active_name(), "Bee");
        assert_eq!(store.active().name, "Bee");

        assert_eq!(
            store.rename("Missing", "X"),
            Err(ProfileError::NotFound("Missing".to_string()))
        );
        assert_eq!(
            store.rename("Bee", "C"),
            Err(ProfileError::DuplicateProfile("C".to_string()))
        );
    }

    #[test]
    fn test_delete_last_profile_recreates_default() {
        let mut store = ProfileStore::new();
        store.set_content_root(Some(Utf8PathBuf::from("/jk2/base")));
        store.delete("Default").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.active_name(), DEFAULT_PROFILE_NAME);
        assert!(store.active().content_root.is_none());
        assert!(store.active().executable_path.is_none());
    }

    #[test]
    fn test_delete_active_selects_first_remaining() {
        let mut store = ProfileStore::new();
        store.create("Second").unwrap();
        store.delete("Second").unwrap();
        assert_eq!(store.active_name(), "Default");

        assert_eq!(
            store.delete("Second"),
            Err(ProfileError::NotFound("Second".to_string()))
        );
    }

    #[test]
    fn test_config_round_trip() {
        let mut store = ProfileStore::new();
        store.create("MP").unwrap();
        store.set_executable_path(Some(Utf8PathBuf::from("/jk2/jk2mvmp")));
        store.launch_options_mut().developer_mode = true;

        let mut config = AppConfig::default();
        store.write_into(&mut config);
        assert_eq!(config.active_profile.as_deref(), Some("MP"));
        assert!(config.profiles["MP"].devmode);

        assert_eq!(ProfileStore::from_config(&config), store);
    }

    #[test]
    fn test_unknown_active_falls_back_to_first() {
        let mut config = AppConfig::default();
        config.active_profile = Some("Ghost".to_string());
        let store = ProfileStore::from_config(&config);
        assert_eq!(store.active_name(), "Default");

        config.profiles.clear();
        assert_eq!(ProfileStore::from_config(&config), ProfileStore::new());
    }
}
