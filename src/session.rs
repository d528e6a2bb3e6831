//! Process-wide context for one run of the application.
//!
//! Created once with [`Session::init`] and flushed with [`Session::flush`] on
//! shutdown. Owns the persisted configuration, the profile store, the shared
//! RCON socket and the game process handle.

use crate::config::ConfigManager;
use crate::metrics::Metrics;
use crate::models::{AppConfig, AppSettings, PackageEntry, ServerPreset};
use crate::services::{
    GameLauncher, GameProcess, LaunchError, LibraryError, ModLibrary, ProfileStore, RconClient,
    RootLocks, ServerRegistry,
};
use crate::state::StateManager;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct Session {
    pub config: ConfigManager,
    pub settings: AppSettings,
    app_config: AppConfig,
    pub profiles: ProfileStore,
    pub servers: ServerRegistry,
    pub rcon: Arc<RconClient>,
    /// Server that `rcon` commands go to
    pub rcon_target: Option<ServerPreset>,
    pub root_locks: RootLocks,
    pub state: StateManager,
    pub metrics: Arc<Metrics>,
    launcher: GameLauncher,
    game: Option<GameProcess>,
}

impl Session {
    /// Load configuration and bind the RCON socket.
    pub async fn init(config: ConfigManager, settings: AppSettings) -> Result<Self> {
        let app_config = config.load_app_config();
        let profiles = ProfileStore::from_config(&app_config);

        let rcon = RconClient::bind_with_timeout(Duration::from_secs(settings.rcon_timeout_secs))
            .await
            .context("Failed to create the RCON socket")?;

        let state = StateManager::new();
        state.set_active_profile(profiles.active_name());

        tracing::info!(
            "Session started: {} profiles, active '{}'",
            profiles.len(),
            profiles.active_name()
        );

        Ok(Self {
            servers: ServerRegistry::new(config.servers_path()),
            launcher: GameLauncher::new(Duration::from_secs(settings.shutdown_grace_secs)),
            config,
            settings,
            app_config,
            profiles,
            rcon: Arc::new(rcon),
            rcon_target: None,
            root_locks: RootLocks::new(),
            state,
            metrics: Arc::new(Metrics::new()),
            game: None,
        })
    }

    /// Write the profile store back to `config.json`.
    pub fn persist(&mut self) -> Result<()> {
        self.profiles.write_into(&mut self.app_config);
        self.config.save_app_config(&self.app_config)
    }

    /// Persist after a profile change and publish the active name.
    pub fn profiles_changed(&mut self) -> Result<()> {
        self.state.set_active_profile(self.profiles.active_name());
        self.persist()
    }

    /// Library of the active profile.
    pub fn open_library(&self) -> Result<ModLibrary, LibraryError> {
        ModLibrary::open(self.profiles.active(), &self.root_locks)
    }

    /// Rescan the active library and update the counts shown in the status line.
    pub fn refresh_counts(&self) -> Vec<PackageEntry> {
        let entries = match self.open_library() {
            Ok(library) => library.scan(None),
            Err(e) => {
                tracing::debug!("No library to scan: {}", e);
                Vec::new()
            }
        };

        self.state.set_counts_from_scan(&entries);
        entries
    }

    /// Launch the active profile's game. Needs a tokio runtime context.
    pub fn launch_game(&mut self) -> Result<(), LaunchError> {
        if let Some(game) = self.game.as_mut() {
            if game.is_running() {
                return Err(LaunchError::AlreadyRunning(game.id().unwrap_or_default()));
            }
        }

        let game = self.launcher.launch(self.profiles.active())?;
        self.game = Some(game);
        self.state.set_game_running(true);
        Ok(())
    }

    pub fn is_game_running(&mut self) -> bool {
        let running = self.game.as_mut().is_some_and(GameProcess::is_running);
        self.state.set_game_running(running);
        running
    }

    /// Terminate the game and save configuration.
    pub async fn flush(&mut self) -> Result<()> {
        if let Some(mut game) = self.game.take() {
            if let Err(e) = game.terminate().await {
                tracing::error!("Failed to terminate game process: {}", e);
            }
            self.state.set_game_running(false);
        }

        self.persist()?;
        tracing::info!("Session flushed");
        Ok(())
    }
}
