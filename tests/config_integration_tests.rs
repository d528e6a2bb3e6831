//! Integration tests for persisted configuration
//!
//! These tests verify:
//! - Profiles survive a save/load cycle through config.json
//! - Corrupt config files fall back to defaults
//! - Saved servers persist in servers.ini

use camino::Utf8PathBuf;
use jk2mm::ConfigManager;
use jk2mm::services::{Confirmation, ErrorCategory, ProfileError, ProfileStore, ServerError, ServerRegistry};
use std::fs;
use tempfile::TempDir;

fn create_test_config_manager() -> (ConfigManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let dir = Utf8PathBuf::try_from(temp_dir.path().join("JK2ModManager")).unwrap();
    let manager = ConfigManager::new(&dir).unwrap();
    (manager, temp_dir)
}

#[test]
fn test_profiles_persist_across_sessions() {
    let (manager, _temp_dir) = create_test_config_manager();

    let mut config = manager.load_app_config();
    let mut store = ProfileStore::from_config(&config);
    assert_eq!(store.active_name(), "Default");

    store.create("Movie Battles").unwrap();
    store.set_content_root(Some(Utf8PathBuf::from("/games/jk2/base")));
    store.launch_options_mut().developer_mode = true;
    store.launch_options_mut().extra_arguments = vec!["+set".into(), "fs_game".into(), "mb2".into()];
    store.write_into(&mut config);
    manager.save_app_config(&config).unwrap();

    let reloaded = ProfileStore::from_config(&manager.load_app_config());
    assert_eq!(reloaded.names().collect::<Vec<_>>(), vec!["Default", "Movie Battles"]);
    assert_eq!(reloaded.active_name(), "Movie Battles");

    let active = reloaded.active();
    assert_eq!(active.content_root().map(|p| p.as_str()), Some("/games/jk2/base"));
    assert!(active.executable_path().is_none());
    assert!(active.launch_options.developer_mode);
    assert_eq!(active.launch_options.extra_arguments, vec!["+set", "fs_game", "mb2"]);
}

#[test]
fn test_config_file_layout() {
    let (manager, _temp_dir) = create_test_config_manager();

    let mut config = manager.load_app_config();
    let mut store = ProfileStore::from_config(&config);
    store.set_executable_path(Some(Utf8PathBuf::from("/games/jk2/jk2mvmp")));
    store.write_into(&mut config);
    manager.save_app_config(&config).unwrap();

    let contents = fs::read_to_string(manager.app_config_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(value["active_profile"], "Default");
    assert_eq!(value["profiles"]["Default"]["game_exe"], "/games/jk2/jk2mvmp");
    assert_eq!(value["profiles"]["Default"]["mod_folder"], "");
    assert!(contents.contains("\n    \""));
}

#[test]
fn test_corrupt_config_falls_back_to_default() {
    let (manager, _temp_dir) = create_test_config_manager();
    fs::write(manager.app_config_path(), "{ not json").unwrap();

    let store = ProfileStore::from_config(&manager.load_app_config());
    assert_eq!(store.len(), 1);
    assert_eq!(store.active_name(), "Default");
    assert!(store.active().content_root().is_none());
}

#[test]
fn test_unknown_active_profile_uses_first() {
    let (manager, _temp_dir) = create_test_config_manager();
    fs::write(
        manager.app_config_path(),
        r#"{"profiles": {"A": {}, "B": {"devmode": true}}, "active_profile": "Gone"}"#,
    )
    .unwrap();

    let store = ProfileStore::from_config(&manager.load_app_config());
    assert_eq!(store.active_name(), "A");
    assert!(store.get("B").unwrap().launch_options.developer_mode);
}

#[test]
fn test_profile_lifecycle_rules() {
    let mut store = ProfileStore::new();
    store.create("A").unwrap();
    store.create("B").unwrap();

    let err = store.create("A").unwrap_err();
    assert_eq!(err, ProfileError::DuplicateProfile("A".to_string()));
    assert_eq!(err.category(), ErrorCategory::Collision);

    store.rename("B", "C").unwrap();
    assert_eq!(store.active_name(), "C");
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["Default", "A", "C"]);

    store.delete("C").unwrap();
    assert_eq!(store.active_name(), "Default");

    store.delete("Default").unwrap();
    store.delete("A").unwrap();
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["Default"]);
    assert_eq!(store.active_name(), "Default");

    assert!(matches!(store.set_active("Nope"), Err(ProfileError::NotFound(_))));
}

#[test]
fn test_servers_persist_in_ini() {
    let (manager, _temp_dir) = create_test_config_manager();
    let registry = ServerRegistry::new(manager.servers_path());
    assert!(registry.list().unwrap().is_empty());

    registry.save("local", "127.0.0.1", "28070", "secret").unwrap();
    registry.save("public", "jk2.example.net", "28071", "").unwrap();
    // Upsert replaces in place
    registry.save("local", "127.0.0.1", "28072", "other").unwrap();

    let reopened = ServerRegistry::new(manager.servers_path());
    let local = reopened.get("local").unwrap();
    assert_eq!(local.port, 28072);
    assert_eq!(local.password, "other");
    assert_eq!(local.address(), "127.0.0.1:28072");
    assert_eq!(reopened.list().unwrap(), vec!["local", "public"]);

    assert!(!reopened.delete("public", Confirmation::Declined).unwrap());
    assert!(reopened.get("public").is_ok());
    assert!(reopened.delete("public", Confirmation::Confirmed).unwrap());
    assert!(matches!(reopened.get("public"), Err(ServerError::NotFound(_))));
}

#[test]
fn test_server_validation() {
    let (manager, _temp_dir) = create_test_config_manager();
    let registry = ServerRegistry::new(manager.servers_path());

    let err = registry.save("bad name", "127.0.0.1", "28070", "").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(matches!(
        registry.save("ok", "127.0.0.1", "0", ""),
        Err(ServerError::InvalidPort(_))
    ));
    assert!(matches!(
        registry.save("ok", "  ", "28070", ""),
        Err(ServerError::MissingHost)
    ));
    assert!(matches!(
        registry.delete("missing", Confirmation::Confirmed),
        Err(ServerError::NotFound(_))
    ));
}
