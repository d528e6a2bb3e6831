//! jk2mm - Mod library manager and RCON console for Jedi Knight II
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! The binary initializes:
//! - Settings ([`ConfigManager`]) from `settings.yaml` and `JK2MM_*` variables
//! - Logging infrastructure (daily rotating file, optional stderr output)
//! - Tokio runtime for library workers, the RCON socket and the game process
//! - The [`Session`] (profiles, saved servers, state, metrics)
//! - The [`ConsoleController`] on the main thread
//!
//! Threading model:
//! - **Main thread**: reads the event channel and does all presentation
//! - **stdin thread**: forwards typed lines to the event channel
//! - **Tokio workers**: filesystem batches (blocking pool), RCON, game process
//!
//! # Shutdown
//!
//! On `quit` or end of input the controller waits for a running library batch,
//! then the game is terminated, `config.json` is written and the runtime stops
//! with a 5s timeout.

use anyhow::Result;
use jk2mm::logging::{LOG_PREFIX, setup_logging_with_console};
use jk2mm::ui::{ConsoleController, WorkerBridge, spawn_stdin_reader};
use jk2mm::{APP_NAME, ConfigManager, Session, VERSION};
use std::time::Duration;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(ConfigManager::default_dir()?)?;
    let settings = config_manager.load_settings()?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = setup_logging_with_console(
        &config_manager.log_dir(),
        LOG_PREFIX,
        settings.debug_mode,
        settings.log_to_console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Configuration directory: {}", config_manager.config_dir());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("jk2mm-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    let session = runtime.block_on(Session::init(config_manager, settings))?;

    let (bridge, events) = WorkerBridge::new(runtime.handle().clone());
    spawn_stdin_reader(bridge.sender())?;

    let controller = ConsoleController::new(session, bridge, events, std::io::stdout());
    let mut session = controller.run();

    tracing::info!("Console closed, shutting down");

    let result = runtime.block_on(session.flush());
    session.metrics.log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("Shutdown error: {:#}", e);
        e
    })
}
