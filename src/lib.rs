// jk2mm - Mod library manager and RCON console for Jedi Knight II
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the console entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppConfig, AppSettings, AppState, PackageEntry, PackageState, Profile};
pub use session::Session;
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
