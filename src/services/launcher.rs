//! Game process launch and shutdown.

use crate::models::{LaunchOptions, Profile};
use crate::services::ErrorCategory;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Default time the game gets to exit after the termination signal.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("No game executable is configured for the active profile")]
    ExecutableNotConfigured,

    #[error("Game executable not found: {0}")]
    ExecutableMissing(Utf8PathBuf),

    #[error("The game is already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("Failed to launch {path}: {source}")]
    Spawn {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LaunchError::ExecutableNotConfigured | LaunchError::ExecutableMissing(_) => {
                ErrorCategory::Configuration
            }
            LaunchError::AlreadyRunning(_) => ErrorCategory::Validation,
            LaunchError::Spawn { .. } => ErrorCategory::Filesystem,
        }
    }
}

/// Command-line arguments in fixed order: developer flag, log flag, extras.
pub fn build_launch_args(options: &LaunchOptions) -> Vec<String> {
    let mut args = Vec::new();

    if options.developer_mode {
        args.push("+developer".to_string());
        args.push("1".to_string());
    }

    if options.logging {
        args.push("+logfile".to_string());
        args.push("2".to_string());
    }

    args.extend(options.extra_arguments.iter().cloned());
    args
}

#[derive(Debug, Clone)]
pub struct GameLauncher {
    shutdown_grace: Duration,
}

impl Default for GameLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_GRACE)
    }
}

impl GameLauncher {
    pub fn new(shutdown_grace: Duration) -> Self {
        Self { shutdown_grace }
    }

    /// Start the profile's executable from its own directory.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(&self, profile: &Profile) -> Result<GameProcess, LaunchError> {
        let executable = profile
            .executable_path()
            .ok_or(LaunchError::ExecutableNotConfigured)?;

        if !executable.is_file() {
            return Err(LaunchError::ExecutableMissing(executable.to_path_buf()));
        }

        let spawn_error = |source| LaunchError::Spawn {
            path: executable.to_path_buf(),
            source,
        };

        ensure_executable(executable).map_err(spawn_error)?;

        let working_dir = executable
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        let args = build_launch_args(&profile.launch_options);

        tracing::info!(
            "Launching {} {} (in {})",
            executable,
            args.join(" "),
            working_dir
        );

        let child = Command::new(executable)
            .args(&args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        Ok(GameProcess {
            child,
            executable: executable.to_path_buf(),
            shutdown_grace: self.shutdown_grace,
        })
    }
}

/// Handle to a launched game, owned by the session that started it.
#[derive(Debug)]
pub struct GameProcess {
    child: Child,
    executable: Utf8PathBuf,
    shutdown_grace: Duration,
}

impl GameProcess {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Ask the game to exit, force-kill it after the grace period.
    pub async fn terminate(&mut self) -> std::io::Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        if let Some(pid) = self.child.id() {
            tracing::info!("Terminating game process {}", pid);
            if let Err(e) = request_exit(pid).await {
                tracing::warn!("Termination signal to {} failed: {}", pid, e);
            }
        }

        match tokio::time::timeout(self.shutdown_grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!("Game exited: {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(
                    "Game did not exit within {:?}, killing it",
                    self.shutdown_grace
                );
                self.child.kill().await
            }
        }
    }
}

#[cfg(unix)]
async fn request_exit(pid: u32) -> std::io::Result<()> {
    let status = Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("kill exited with {}", status)))
    }
}

#[cfg(windows)]
async fn request_exit(pid: u32) -> std::io::Result<()> {
    let status = Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("taskkill exited with {}", status)))
    }
}

#[cfg(unix)]
fn ensure_executable(path: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o111);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}
