//! Services module - business logic for the mod library, profiles, saved servers,
//! RCON and the game process.
//!
//! The services have no dependency on the front-end layer. Library operations are
//! synchronous filesystem work and are run on blocking worker threads by
//! [`crate::ui::WorkerBridge`]; RCON and the game launcher are async.
//!
//! # Components
//!
//! - [`ModLibrary`]: enable/disable/install/remove/rename/export over one content root.
//!   The enabled/disabled state of a package is the directory holding it.
//! - [`catalog`]: read-only listing of a content root.
//! - [`digest`]: chunked SHA-256 used by export manifests.
//! - [`ProfileStore`]: named profiles with exactly one active.
//! - [`ServerRegistry`]: saved RCON presets in `servers.ini`.
//! - [`RconClient`]: one-datagram RCON exchange over UDP.
//! - [`GameLauncher`]: spawns the game with profile flags and terminates it on exit.
//! - [`preview`]: finds a preview image inside a package archive.
//!
//! Every service error maps to an [`ErrorCategory`] so the front-end can
//! present failures consistently.

pub mod catalog;
pub mod digest;
pub mod launcher;
pub mod library;
pub mod preview;
pub mod profiles;
pub mod rcon;
pub mod servers;

pub use launcher::{GameLauncher, GameProcess, LaunchError, build_launch_args};
pub use library::{
    BatchReport, InstallPlan, InstallReport, LibraryError, ModLibrary, OverwritePrompt,
    RemoveReport, RootLocks, ToggleOutcome, write_manifest,
};
pub use preview::{PreviewImage, find_preview};
pub use profiles::{ProfileError, ProfileStore};
pub use rcon::{RconClient, RconError, RconOutcome, sanitize_response};
pub use servers::{Confirmation, ServerError, ServerRegistry};

/// Broad classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid settings (no content root, no executable)
    Configuration,
    /// Rejected user input (bad name, bad port, protected package)
    Validation,
    /// A file operation failed
    Filesystem,
    /// Name resolution, send or receive failed
    Network,
    /// The target name is already taken
    Collision,
    /// The named item does not exist
    NotFound,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Filesystem => "filesystem",
            ErrorCategory::Network => "network",
            ErrorCategory::Collision => "collision",
            ErrorCategory::NotFound => "not found",
        };
        f.write_str(label)
    }
}
