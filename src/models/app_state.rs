/// Maximum number of library batches (toggle/install/remove/export) in flight.
///
/// The console refuses a second batch while one runs; mutating library calls
/// additionally serialize on a per-content-root lock, see
/// [`crate::services::library::RootLocks`].
pub const MAX_CONCURRENT_LIBRARY_BATCHES: usize = 1;

/// Session-level view state shown by the front-end.
///
/// Wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]; go
/// through its `read()` and `update()` methods instead of touching it directly.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub active_profile: String,

    // Counts from the latest scan
    pub enabled_count: usize,
    pub disabled_count: usize,

    // Runtime state
    pub is_processing: bool,
    pub current_operation: String,
    pub last_message: String,

    pub is_game_running: bool,
}

impl AppState {
    pub fn total_count(&self) -> usize {
        self.enabled_count + self.disabled_count
    }

    /// Status bar text.
    pub fn status_line(&self) -> String {
        if self.active_profile.is_empty() {
            return "No profile selected.".to_string();
        }

        format!(
            "Profile: {} | Enabled: {} | Disabled: {} | Total: {}",
            self.active_profile,
            self.enabled_count,
            self.disabled_count,
            self.total_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let state = AppState {
            active_profile: "Default".to_string(),
            enabled_count: 3,
            disabled_count: 2,
            ..Default::default()
        };
        assert_eq!(
            state.status_line(),
            "Profile: Default | Enabled: 3 | Disabled: 2 | Total: 5"
        );
    }

    #[test]
    fn test_status_line_without_profile() {
        assert_eq!(AppState::default().status_line(), "No profile selected.");
        assert_eq!(MAX_CONCURRENT_LIBRARY_BATCHES, 1);
    }
}
