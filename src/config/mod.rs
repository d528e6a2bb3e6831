use crate::models::{AppConfig, AppSettings};
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Directory name under the platform configuration directory.
pub const APP_DIR_NAME: &str = "JK2ModManager";

/// Prefix of environment variables overriding [`AppSettings`].
pub const ENV_PREFIX: &str = "JK2MM";

/// Configuration manager for the files in the application directory.
///
/// - `config.json`: profiles, active profile and window preferences ([`AppConfig`])
/// - `servers.ini`: saved RCON servers, handled by
///   [`ServerRegistry`](crate::services::ServerRegistry)
/// - `settings.yaml`: runtime settings ([`AppSettings`]), layered with
///   `JK2MM_*` environment variables
/// - `logs/`: rolling log files
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    app_config_path: Utf8PathBuf,
    servers_path: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            app_config_path: config_dir.join("config.json"),
            servers_path: config_dir.join("servers.ini"),
            settings_path: config_dir.join("settings.yaml"),
            config_dir,
        })
    }

    /// `<platform config dir>/JK2ModManager`, e.g. `~/.config/JK2ModManager`.
    pub fn default_dir() -> Result<Utf8PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| anyhow!("No configuration directory on this platform"))?;
        let base = Utf8PathBuf::from_path_buf(base)
            .map_err(|path| anyhow!("Configuration directory is not UTF-8: {}", path.display()))?;
        Ok(base.join(APP_DIR_NAME))
    }

    /// Load `config.json`.
    ///
    /// A missing, unreadable or corrupt file yields [`AppConfig::default`]
    /// (a single empty "Default" profile); the problem is logged.
    pub fn load_app_config(&self) -> AppConfig {
        let contents = match fs::read_to_string(&self.app_config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "Config file not found at {}, using defaults",
                    self.app_config_path
                );
                return AppConfig::default();
            }
            Err(e) => {
                tracing::error!("Failed to read config {}: {}", self.app_config_path, e);
                return AppConfig::default();
            }
        };

        match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", self.app_config_path);
                config
            }
            Err(e) => {
                tracing::error!("Config error in {}: {}", self.app_config_path, e);
                AppConfig::default()
            }
        }
    }

    /// Save `config.json` with 4-space indentation.
    pub fn save_app_config(&self, config: &AppConfig) -> Result<()> {
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        serde::Serialize::serialize(config, &mut serializer)
            .context("Failed to serialize config to JSON")?;

        // Write beside the target and swap so a crash never leaves half a file.
        let temp_path = self.app_config_path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .with_context(|| format!("Failed to write config: {}", temp_path))?;
        fs::rename(&temp_path, &self.app_config_path)
            .with_context(|| format!("Failed to write config: {}", self.app_config_path))?;

        tracing::debug!("Saved config to {}", self.app_config_path);
        Ok(())
    }

    /// Load runtime settings: defaults, then `settings.yaml`, then `JK2MM_*`
    /// environment variables.
    ///
    /// Writes a default `settings.yaml` when none exists.
    pub fn load_settings(&self) -> Result<AppSettings> {
        self.load_settings_with(config::Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn load_settings_with(&self, environment: config::Environment) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            self.save_settings(&AppSettings::default())?;
        }

        let settings = config::Config::builder()
            .add_source(
                config::Config::try_from(&AppSettings::default())
                    .context("Failed to build default settings")?,
            )
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(environment.try_parsing(true))
            .build()
            .with_context(|| format!("Failed to load settings: {}", self.settings_path))?;

        let settings: AppSettings = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!(
            "Loaded settings: debug={}, console={}, rcon_timeout={}s, shutdown_grace={}s",
            settings.debug_mode,
            settings.log_to_console,
            settings.rcon_timeout_secs,
            settings.shutdown_grace_secs
        );
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn app_config_path(&self) -> &Utf8Path {
        &self.app_config_path
    }

    pub fn servers_path(&self) -> &Utf8Path {
        &self.servers_path
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn log_dir(&self) -> Utf8PathBuf {
        self.config_dir.join("logs")
    }
}
