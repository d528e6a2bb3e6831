use crate::models::profile::{DEFAULT_PROFILE_NAME, ProfileRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persisted application state from config.json
///
/// Holds the profile map, the active profile and window preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,

    #[serde(default)]
    pub profiles: IndexMap<String, ProfileRecord>,

    #[serde(default)]
    pub active_profile: Option<String>,

    #[serde(default = "default_appearance_mode")]
    pub appearance_mode: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = IndexMap::new();
        profiles.insert(DEFAULT_PROFILE_NAME.to_string(), ProfileRecord::default());

        Self {
            geometry: None,
            profiles,
            active_profile: Some(DEFAULT_PROFILE_NAME.to_string()),
            appearance_mode: default_appearance_mode(),
        }
    }
}

fn default_appearance_mode() -> String {
    "Dark".to_string()
}

/// Runtime settings from settings.yaml, overridable with `JK2MM_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub debug_mode: bool,

    pub log_to_console: bool,

    /// Seconds to wait for an RCON reply datagram.
    pub rcon_timeout_secs: u64,

    /// Seconds the game gets to exit after the termination signal.
    pub shutdown_grace_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            log_to_console: false,
            rcon_timeout_secs: 5,
            shutdown_grace_secs: 5,
        }
    }
}
