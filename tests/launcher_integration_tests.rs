//! Integration tests for GameLauncher with a stand-in game script (Unix only)

#![cfg(unix)]

use camino::Utf8PathBuf;
use jk2mm::models::Profile;
use jk2mm::services::GameLauncher;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_launch_passes_flags_and_terminates() {
    let temp_dir = TempDir::new().unwrap();
    let game_dir = Utf8PathBuf::try_from(temp_dir.path().join("game")).unwrap();
    fs::create_dir_all(&game_dir).unwrap();

    // Records its arguments in the working directory, then idles
    let executable = game_dir.join("jk2mvmp");
    fs::write(&executable, "#!/bin/sh\necho \"$@\" > args.txt\nexec sleep 30\n").unwrap();

    let mut profile = Profile::empty("Default");
    profile.executable_path = Some(executable);
    profile.launch_options.developer_mode = true;
    profile.launch_options.logging = true;
    profile.launch_options.extra_arguments = vec!["+set".into(), "fs_game".into(), "mymod".into()];

    let launcher = GameLauncher::new(Duration::from_secs(2));
    let mut game = launcher.launch(&profile).unwrap();
    assert!(game.is_running());

    let args_file = game_dir.join("args.txt");
    let mut recorded = String::new();
    for _ in 0..50 {
        if let Ok(contents) = fs::read_to_string(&args_file) {
            if !contents.is_empty() {
                recorded = contents;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(recorded.trim(), "+developer 1 +logfile 2 +set fs_game mymod");

    game.terminate().await.unwrap();
    assert!(!game.is_running());
}
