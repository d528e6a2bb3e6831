use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Name of the fallback profile synthesized whenever no other profile exists.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Flags passed to the game executable at launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub developer_mode: bool,
    pub logging: bool,
    pub extra_arguments: Vec<String>,
}

impl LaunchOptions {
    /// Parse a free-form argument string the way it is stored in `config.json`.
    pub fn parse_extra_arguments(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }
}

/// A named bundle of content root, executable and launch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub content_root: Option<Utf8PathBuf>,
    pub executable_path: Option<Utf8PathBuf>,
    pub launch_options: LaunchOptions,
}

impl Profile {
    /// A profile with every field empty.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_root: None,
            executable_path: None,
            launch_options: LaunchOptions::default(),
        }
    }

    pub fn content_root(&self) -> Option<&Utf8Path> {
        self.content_root.as_deref()
    }

    pub fn executable_path(&self) -> Option<&Utf8Path> {
        self.executable_path.as_deref()
    }

    /// Convert into the on-disk record, keyed externally by `name`.
    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            mod_folder: path_to_field(self.content_root.as_deref()),
            game_exe: path_to_field(self.executable_path.as_deref()),
            devmode: self.launch_options.developer_mode,
            logfile: self.launch_options.logging,
            custom_params: self.launch_options.extra_arguments.join(" "),
        }
    }

    pub fn from_record(name: impl Into<String>, record: &ProfileRecord) -> Self {
        Self {
            name: name.into(),
            content_root: field_to_path(&record.mod_folder),
            executable_path: field_to_path(&record.game_exe),
            launch_options: LaunchOptions {
                developer_mode: record.devmode,
                logging: record.logfile,
                extra_arguments: LaunchOptions::parse_extra_arguments(&record.custom_params),
            },
        }
    }
}

/// Profile as persisted inside `config.json`.
///
/// Empty strings stand for "not configured"; every field is optional on read
/// so files written by older versions still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub mod_folder: String,

    #[serde(default)]
    pub game_exe: String,

    #[serde(default)]
    pub devmode: bool,

    #[serde(default)]
    pub logfile: bool,

    #[serde(default)]
    pub custom_params: String,
}

fn path_to_field(path: Option<&Utf8Path>) -> String {
    path.map(|p| p.to_string()).unwrap_or_default()
}

fn field_to_path(field: &str) -> Option<Utf8PathBuf> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Utf8PathBuf::from(trimmed))
    }
}
