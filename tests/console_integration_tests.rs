//! Integration tests for the console front-end
//!
//! These tests drive ConsoleController with typed lines and worker completions
//! the same way `run` does, against a temporary configuration directory and
//! content root.

use camino::{Utf8Path, Utf8PathBuf};
use jk2mm::models::AppSettings;
use jk2mm::services::catalog::DISABLED_DIR_NAME;
use jk2mm::ui::{ConsoleController, UiEvent, WorkerBridge};
use jk2mm::{ConfigManager, Session};
use std::fs;
use tempfile::TempDir;
use tokio::runtime::Runtime;

struct TestConsole {
    console: ConsoleController<Vec<u8>>,
    root: Utf8PathBuf,
    temp_dir: TempDir,
    runtime: Runtime,
}

impl TestConsole {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let root = base.join("base");
        fs::create_dir_all(&root).unwrap();

        let runtime = Runtime::new().unwrap();
        let config = ConfigManager::new(base.join("config")).unwrap();
        let session = runtime
            .block_on(Session::init(config, AppSettings::default()))
            .unwrap();

        let (bridge, events) = WorkerBridge::new(runtime.handle().clone());
        let console = ConsoleController::new(session, bridge, events, Vec::new());

        Self {
            console,
            root,
            temp_dir,
            runtime,
        }
    }

    /// New console whose active profile points at the content root
    fn with_library() -> Self {
        let mut test = Self::new();
        let command = format!("profile root \"{}\"", test.root);
        test.input(&command);
        test
    }

    fn input(&mut self, line: &str) {
        self.console.handle_event(UiEvent::Input(line.to_string()));
    }

    /// Wait for the next worker completion and handle it
    fn complete(&mut self) {
        assert!(self.console.process_next());
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(self.console.output()).into_owned()
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::try_from(self.temp_dir.path().join(name)).unwrap()
    }
}

fn write_package(dir: &Utf8Path, name: &str, contents: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_commands_require_a_content_root() {
    let mut test = TestConsole::new();

    test.input("list");
    assert!(
        test.output()
            .contains("Error (configuration): No base folder is configured for the active profile")
    );
}

#[test]
fn test_profile_root_is_persisted() {
    let test = TestConsole::with_library();

    let config = fs::read_to_string(test.console.session().config.app_config_path()).unwrap();
    assert!(config.contains(test.root.as_str()));
    assert!(test.output().contains("Profile: Default"));
}

#[test]
fn test_disable_runs_as_batch() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "foo.pk3", "foo");

    test.input("disable FOO.pk3");
    assert!(test.console.session().state.is_processing());

    test.complete();
    assert!(test.output().contains("Toggled 1 mods (0 unchanged, 0 errors)."));
    assert!(test.root.join(DISABLED_DIR_NAME).join("foo.pk3").is_file());
    assert!(!test.root.join("foo.pk3").exists());

    let state = test.console.session().state.snapshot();
    assert!(!state.is_processing);
    assert_eq!(state.disabled_count, 1);
    assert_eq!(state.enabled_count, 0);
}

#[test]
fn test_second_batch_is_refused_while_one_runs() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "a.pk3", "a");
    write_package(&test.root, "b.pk3", "b");

    test.input("disable a.pk3");
    test.input("disable b.pk3");
    assert!(test.output().contains("Another operation is already running: toggle"));

    test.complete();
    assert!(test.root.join("b.pk3").is_file());
    assert!(!test.console.session().state.is_processing());
}

#[test]
fn test_rename_is_refused_while_batch_runs() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "a.pk3", "a");
    write_package(&test.root, "b.pk3", "b");

    let manifest = test.path("mods.json");
    test.input(&format!("export \"{}\"", manifest));
    test.input("rename b.pk3 c");
    assert!(test.output().contains("Another operation is already running: export"));

    test.complete();
    assert!(test.root.join("b.pk3").is_file());
    assert!(!test.root.join("c.pk3").exists());

    test.input("rename b.pk3 c");
    assert!(test.output().contains("Renamed b.pk3 -> c.pk3"));
    assert!(test.root.join("c.pk3").is_file());
}

#[test]
fn test_protected_package_is_rejected() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "assets0.pk3", "base game");

    test.input("disable assets0.pk3");
    assert!(
        test.output()
            .contains("Error (validation): assets0.pk3 is a protected base-game asset")
    );
    assert!(!test.console.session().state.is_processing());
    assert!(test.root.join("assets0.pk3").is_file());
}

#[test]
fn test_install_asks_before_overwriting() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "dup.pk3", "old");

    let downloads = test.path("downloads");
    write_package(&downloads, "dup.pk3", "new");
    write_package(&downloads, "new.pk3", "fresh");

    let command = format!(
        "install \"{}\" \"{}\"",
        downloads.join("dup.pk3"),
        downloads.join("new.pk3")
    );
    test.input(&command);
    assert!(test.output().contains("dup.pk3 already exists. Overwrite? [y/N]"));
    assert!(!test.console.session().state.is_processing());

    test.input("n");
    test.complete();

    assert!(test.output().contains("Installed 1 mods (1 skipped, 0 errors)."));
    assert_eq!(fs::read_to_string(test.root.join("dup.pk3")).unwrap(), "old");
    assert!(test.root.join("new.pk3").is_file());
}

#[test]
fn test_remove_needs_confirmation() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "a.pk3", "a");

    test.input("remove a.pk3");
    assert!(test.output().contains("Permanently delete 1 file(s): a.pk3? [y/N]"));
    test.input("no");
    assert!(test.output().contains("Nothing deleted."));
    assert!(test.root.join("a.pk3").is_file());

    test.input("remove a.pk3");
    test.input("y");
    test.complete();
    assert!(test.output().contains("Deleted 1 files (0 errors)."));
    assert!(!test.root.join("a.pk3").exists());
}

#[test]
fn test_export_writes_manifest() {
    let mut test = TestConsole::with_library();
    write_package(&test.root, "a.pk3", "a");
    write_package(&test.root.join(DISABLED_DIR_NAME), "b.pk3", "b");

    let manifest = test.path("mods.json");
    test.input(&format!("export \"{}\"", manifest));
    test.complete();

    assert!(test.output().contains("Exported 2 records"));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(test.console.session().metrics.exports.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[test]
fn test_rcon_requires_a_selected_server() {
    let mut test = TestConsole::new();

    test.input("rcon status");
    assert!(test.output().contains("No server selected."));
}

#[test]
fn test_rcon_through_saved_server() {
    let mut test = TestConsole::new();

    let server = test
        .runtime
        .block_on(tokio::net::UdpSocket::bind("127.0.0.1:0"))
        .unwrap();
    let port = server.local_addr().unwrap().port();
    test.runtime.spawn(async move {
        let mut buffer = [0u8; 1024];
        if let Ok((_, from)) = server.recv_from(&mut buffer).await {
            let mut reply = vec![0xFF; 4];
            reply.extend_from_slice(b"print\n^2Hello from server\n");
            let _ = server.send_to(&reply, from).await;
        }
    });

    test.input(&format!("server save local 127.0.0.1 {} secret", port));
    test.input("server use local");
    assert!(test.output().contains("RCON target: local"));

    test.input("rcon status");
    test.complete();
    assert!(test.output().contains("Hello from server"));
    assert!(!test.console.session().state.is_processing());
}

#[test]
fn test_quit_and_unknown_commands() {
    let mut test = TestConsole::new();

    test.input("frobnicate");
    assert!(test.output().contains("Unknown command 'frobnicate'"));
    assert!(!test.console.is_finished());

    test.input("quit");
    assert!(test.console.is_finished());
}
