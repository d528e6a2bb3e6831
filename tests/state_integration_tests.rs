//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on mutations
//! - Admits a single library batch at a time
//! - Handles concurrent access from multiple threads

use jk2mm::models::{PackageEntry, PackageState};
use jk2mm::state::Busy;
use jk2mm::{StateChange, StateManager};
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn entry(name: &str, state: PackageState) -> PackageEntry {
    PackageEntry {
        path: Utf8PathBuf::from(name),
        name: name.to_string(),
        state,
        size_bytes: 0,
    }
}

#[tokio::test]
async fn test_operation_events_emitted() {
    let state = StateManager::new();
    let mut rx = state.subscribe();

    state.begin_operation("toggle").unwrap();

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert_eq!(
        event,
        StateChange::OperationStarted {
            operation: "toggle".to_string()
        }
    );

    state.finish_operation("Toggled 2 mods (0 unchanged, 0 errors).");
    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert!(matches!(event, StateChange::OperationFinished { .. }));
    assert_eq!(
        state.snapshot().last_message,
        "Toggled 2 mods (0 unchanged, 0 errors)."
    );
}

#[tokio::test]
async fn test_counts_update_once_per_change() {
    let state = StateManager::new();
    let mut rx = state.subscribe();

    let entries = vec![
        entry("a.pk3", PackageState::Enabled),
        entry("b.pk3", PackageState::Disabled),
        entry("c.pk3", PackageState::Enabled),
    ];
    state.set_counts_from_scan(&entries);

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event,
        StateChange::CountsUpdated {
            enabled: 2,
            disabled: 1
        }
    );

    // Same counts again: nothing emitted
    assert!(state.set_counts_from_scan(&entries).is_empty());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_concurrent_batches_admit_exactly_one() {
    let state = Arc::new(StateManager::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let state = Arc::clone(&state);
            std::thread::spawn(move || state.begin_operation(format!("job {}", i)).is_ok())
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|admitted| *admitted)
        .count();

    assert_eq!(admitted, 1);
    assert!(state.is_processing());

    let Busy(running) = state.begin_operation("export").unwrap_err();
    assert!(running.starts_with("job "));

    state.finish_operation("done");
    assert!(state.begin_operation("export").is_ok());
}

#[test]
fn test_status_line_follows_profile_and_counts() {
    let state = StateManager::new();
    assert_eq!(state.status_line(), "No profile selected.");

    state.set_active_profile("Default");
    state.set_counts_from_scan(&[entry("a.pk3", PackageState::Disabled)]);
    assert_eq!(
        state.status_line(),
        "Profile: Default | Enabled: 0 | Disabled: 1 | Total: 1"
    );
}
