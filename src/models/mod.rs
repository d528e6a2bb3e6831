//! Data models for the mod manager.
//!
//! - [`PackageEntry`] / [`PackageState`]: a `.pk3` file and which library directory holds it
//! - [`ExportRecord`]: one row of an exported load-order manifest
//! - [`Profile`]: content root, executable and launch flags under a unique name
//! - [`ServerPreset`]: a saved RCON connection
//! - [`AppConfig`]: the persisted `config.json` layout
//! - [`AppSettings`]: runtime settings layered from `settings.yaml` and the environment
//! - [`AppState`]: session view state held by [`StateManager`](crate::state::StateManager)

pub mod app_state;
pub mod config;
pub mod package;
pub mod profile;
pub mod server;

pub use app_state::{AppState, MAX_CONCURRENT_LIBRARY_BATCHES};
pub use config::{AppConfig, AppSettings};
pub use package::{ExportRecord, PackageEntry, PackageState};
pub use profile::{DEFAULT_PROFILE_NAME, LaunchOptions, Profile, ProfileRecord};
pub use server::ServerPreset;
