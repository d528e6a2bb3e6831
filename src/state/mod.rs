// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for the front-end.

use crate::models::{AppState, PackageEntry, PackageState};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Another profile became active
    ProfileChanged { name: String },

    /// Package counts changed after a scan
    CountsUpdated { enabled: usize, disabled: usize },

    /// A library batch or other background operation has started
    OperationStarted { operation: String },

    /// The running operation has finished
    OperationFinished { message: String },

    /// The game process was started or has exited
    GameStatusChanged { running: bool },
}

/// Returned when a library batch is requested while another one runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Another operation is already running: {0}")]
pub struct Busy(pub String);

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Admits one library batch at a time through
///   [`begin_operation`](Self::begin_operation)
///
/// Clones share the same state.
#[derive(Clone)]
pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        f(&self.read_guard())
    }

    /// Apply `update_fn`, then emit and return the detected changes
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let changes = {
            let mut state = self.write_guard();
            let old_state = state.clone();
            update_fn(&mut state);
            detect_changes(&old_state, &state)
        };

        for change in &changes {
            // Nobody listening is fine
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Mark an operation as running.
    ///
    /// Fails with [`Busy`] when one is already in progress; the check and the
    /// flag update happen under one write lock.
    pub fn begin_operation(&self, operation: impl Into<String>) -> Result<Vec<StateChange>, Busy> {
        let operation = operation.into();
        let changes = {
            let mut state = self.write_guard();
            if state.is_processing {
                return Err(Busy(state.current_operation.clone()));
            }

            let old_state = state.clone();
            state.is_processing = true;
            state.current_operation = operation;
            detect_changes(&old_state, &state)
        };

        for change in &changes {
            let _ = self.state_tx.send(change.clone());
        }
        Ok(changes)
    }

    /// Clear the running flag and record the outcome message
    pub fn finish_operation(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            state.is_processing = false;
            state.current_operation.clear();
            state.last_message = message;
        })
    }

    pub fn is_processing(&self) -> bool {
        self.read(|state| state.is_processing)
    }

    /// Record a message without touching the running flag
    pub fn set_message(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| state.last_message = message)
    }

    pub fn set_active_profile(&self, name: &str) -> Vec<StateChange> {
        self.update(|state| state.active_profile = name.to_string())
    }

    /// Recount enabled and disabled packages from a full scan
    pub fn set_counts_from_scan(&self, entries: &[PackageEntry]) -> Vec<StateChange> {
        let enabled = entries
            .iter()
            .filter(|entry| entry.state == PackageState::Enabled)
            .count();
        let disabled = entries.len() - enabled;

        self.update(|state| {
            state.enabled_count = enabled;
            state.disabled_count = disabled;
        })
    }

    pub fn set_game_running(&self, running: bool) -> Vec<StateChange> {
        self.update(|state| state.is_game_running = running)
    }

    pub fn status_line(&self) -> String {
        self.read(AppState::status_line)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if old.active_profile != new.active_profile {
        changes.push(StateChange::ProfileChanged {
            name: new.active_profile.clone(),
        });
    }

    if old.enabled_count != new.enabled_count || old.disabled_count != new.disabled_count {
        changes.push(StateChange::CountsUpdated {
            enabled: new.enabled_count,
            disabled: new.disabled_count,
        });
    }

    if old.is_processing != new.is_processing {
        if new.is_processing {
            changes.push(StateChange::OperationStarted {
                operation: new.current_operation.clone(),
            });
        } else {
            changes.push(StateChange::OperationFinished {
                message: new.last_message.clone(),
            });
        }
    }

    if old.is_game_running != new.is_game_running {
        changes.push(StateChange::GameStatusChanged {
            running: new.is_game_running,
        });
    }

    changes
}
