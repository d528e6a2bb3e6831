// UI module - console front-end and worker bridge
//
// This module contains:
// - WorkerBridge: Runs library and RCON jobs on the tokio runtime and posts completions
// - ConsoleController: Reads commands, prompts for confirmations and presents results

pub mod bridge;
pub mod controller;

pub use bridge::{Completion, UiEvent, WorkerBridge};
pub use controller::{ConsoleController, spawn_stdin_reader};
