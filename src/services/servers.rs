//! Saved RCON presets in `servers.ini`.
//!
//! One section per server with the keys `ip`, `port` and `password`. The file
//! is re-read on every call; nothing is cached between calls.

use crate::models::ServerPreset;
use crate::services::ErrorCategory;
use camino::{Utf8Path, Utf8PathBuf};
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static SERVER_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("Invalid server name regex"));

const KEY_HOST: &str = "ip";
const KEY_HOST_FALLBACK: &str = "host";
const KEY_PORT: &str = "port";
const KEY_PASSWORD: &str = "password";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid server name: '{0}'")]
    InvalidName(String),

    #[error("Invalid port: '{0}'")]
    InvalidPort(String),

    #[error("Server address is empty")]
    MissingHost,

    #[error("Server '{0}' not found")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ServerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServerError::InvalidName(_) | ServerError::InvalidPort(_) | ServerError::MissingHost => {
                ErrorCategory::Validation
            }
            ServerError::NotFound(_) => ErrorCategory::NotFound,
            ServerError::Read { .. } | ServerError::Write { .. } => ErrorCategory::Filesystem,
        }
    }
}

/// Caller's answer to "delete this server?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone)]
pub struct ServerRegistry {
    path: Utf8PathBuf,
}

impl ServerRegistry {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn load(&self) -> Result<Ini, ServerError> {
        match Ini::load_from_file_opt(&self.path, parse_option()) {
            Ok(ini) => Ok(ini),
            Err(ini::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(Ini::new()),
            Err(source) => Err(ServerError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, ini: &Ini) -> Result<(), ServerError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ServerError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        ini.write_to_file_opt(&self.path, write_option())
            .map_err(|source| ServerError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Names of all saved servers, in file order.
    pub fn list(&self) -> Result<Vec<String>, ServerError> {
        Ok(self.presets()?.into_iter().map(|preset| preset.name).collect())
    }

    /// Every readable preset; sections with a bad port are skipped.
    pub fn presets(&self) -> Result<Vec<ServerPreset>, ServerError> {
        let ini = self.load()?;

        let presets = ini
            .iter()
            .filter_map(|(section, properties)| {
                let name = section?;
                let host = properties
                    .get(KEY_HOST)
                    .or_else(|| properties.get(KEY_HOST_FALLBACK))
                    .unwrap_or_default();
                let port_raw = properties.get(KEY_PORT).unwrap_or_default();

                let Ok(port) = parse_port(port_raw) else {
                    tracing::warn!("Skipping server '{}' with invalid port '{}'", name, port_raw);
                    return None;
                };

                Some(ServerPreset {
                    name: name.to_string(),
                    host: host.to_string(),
                    port,
                    password: properties.get(KEY_PASSWORD).unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(presets)
    }

    pub fn get(&self, name: &str) -> Result<ServerPreset, ServerError> {
        self.presets()?
            .into_iter()
            .find(|preset| preset.name == name)
            .ok_or_else(|| ServerError::NotFound(name.to_string()))
    }

    /// Insert or replace a preset.
    pub fn save(
        &self,
        name: &str,
        host: &str,
        port: &str,
        password: &str,
    ) -> Result<ServerPreset, ServerError> {
        let name = name.trim();
        if !SERVER_NAME_PATTERN.is_match(name) {
            return Err(ServerError::InvalidName(name.to_string()));
        }
        let host = host.trim();
        if host.is_empty() {
            return Err(ServerError::MissingHost);
        }
        let port = parse_port(port)?;

        let mut ini = self.load()?;
        ini.with_section(Some(name))
            .set(KEY_HOST, host)
            .set(KEY_PORT, port.to_string())
            .set(KEY_PASSWORD, password);
        self.store(&ini)?;

        tracing::info!("Saved server '{}' ({}:{})", name, host, port);
        Ok(ServerPreset {
            name: name.to_string(),
            host: host.to_string(),
            port,
            password: password.to_string(),
        })
    }

    /// Delete a preset. Returns `false` when the caller declined.
    pub fn delete(&self, name: &str, confirmation: Confirmation) -> Result<bool, ServerError> {
        let mut ini = self.load()?;
        if ini.section(Some(name)).is_none() {
            return Err(ServerError::NotFound(name.to_string()));
        }

        if confirmation == Confirmation::Declined {
            tracing::debug!("Deletion of server '{}' declined", name);
            return Ok(false);
        }

        ini.delete(Some(name));
        self.store(&ini)?;

        tracing::info!("Deleted server '{}'", name);
        Ok(true)
    }
}

/// Values are stored verbatim; quotes and backslashes belong to the password.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

fn write_option() -> WriteOption {
    WriteOption {
        escape_policy: EscapePolicy::Nothing,
        ..Default::default()
    }
}

fn parse_port(port: &str) -> Result<u16, ServerError> {
    match port.trim().parse::<u16>() {
        Ok(value) if value != 0 => Ok(value),
        _ => Err(ServerError::InvalidPort(port.to_string())),
    }
}
