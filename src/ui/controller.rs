// Console Controller - Line-based front-end over the session
//
// This module contains the ConsoleController which coordinates between:
// - the user (one command per line, read on a separate stdin thread)
// - Session (profiles, servers, RCON socket, game process)
// - ModLibrary jobs run through the WorkerBridge
//
// All presentation happens on the thread that calls `run`; workers only post
// completions to the event channel.

use crate::models::{PackageEntry, PackageState};
use crate::services::{
    Confirmation, ErrorCategory, InstallPlan, LaunchError, LibraryError, ModLibrary, ProfileError,
    RconError, RconOutcome, ServerError, find_preview, write_manifest,
};
use crate::session::Session;
use crate::state::Busy;
use crate::ui::bridge::{Completion, UiEvent, WorkerBridge};
use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8PathBuf;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  list [filter]                      list packages (optionally filtered)
  enable|disable|toggle <names..>    move packages between enabled and disabled
  install <files..>                  copy .pk3 files into the base folder
  remove <names..>                   delete packages permanently
  rename <name> <new name>           rename a package in place
  export <file>                      write the load-order manifest as JSON
  preview <name> [save as]           find the preview image inside a package
  profile list|show|new|rename|delete|use <..>
  profile root|exe <path|->          set or clear the base folder / executable
  profile dev|log on|off             launch flags
  profile args [arguments..]         extra launch arguments
  server list|save|delete|use|connect <..>
  rcon <command..>                   send a command to the selected server
  launch                             start the game
  status                             show the status line
  help                               show this text
  quit                               exit";

/// Question waiting for the next input line
enum Pending {
    Overwrite {
        library: ModLibrary,
        plan: InstallPlan,
        queue: VecDeque<String>,
        answers: HashMap<String, bool>,
    },
    Remove {
        library: ModLibrary,
        entries: Vec<PackageEntry>,
    },
    DeleteServer {
        name: String,
    },
}

/// Console front-end
///
/// Reads [`UiEvent`]s from the single event channel and dispatches them:
/// typed commands, answers to pending questions and worker completions.
pub struct ConsoleController<W: Write> {
    session: Session,
    bridge: WorkerBridge,
    events: mpsc::Receiver<UiEvent>,
    pending: Option<Pending>,
    out: W,
    finished: bool,
}

impl<W: Write> ConsoleController<W> {
    pub fn new(
        session: Session,
        bridge: WorkerBridge,
        events: mpsc::Receiver<UiEvent>,
        out: W,
    ) -> Self {
        session.refresh_counts();
        tracing::info!("Console controller initialized");

        Self {
            session,
            bridge,
            events,
            pending: None,
            out,
            finished: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Process events until `quit` or end of input, then wait for a running
    /// library batch to complete. Returns the session for flushing.
    ///
    /// Must not be called from within the tokio runtime.
    pub fn run(mut self) -> Session {
        self.say(HELP);
        self.prompt();

        while !self.finished {
            if !self.process_next() {
                break;
            }
        }

        while self.session.state.is_processing() {
            let operation = self.session.state.read(|state| state.current_operation.clone());
            self.say(format!("Waiting for {} to finish...", operation));
            if !self.process_next() {
                break;
            }
        }

        self.session
    }

    /// Block for one event and handle it. `false` once the channel is closed.
    pub fn process_next(&mut self) -> bool {
        match self.events.blocking_recv() {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Input(line) => self.handle_line(&line),
            UiEvent::InputClosed => {
                tracing::info!("Input closed");
                self.finished = true;
            }
            UiEvent::Completed(completion) => self.handle_completion(completion),
        }
        self.prompt();
    }

    fn say(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn prompt(&mut self) {
        if self.pending.is_none() && !self.finished {
            let _ = write!(self.out, "> ");
        }
        let _ = self.out.flush();
    }

    fn handle_line(&mut self, line: &str) {
        if let Some(pending) = self.pending.take() {
            self.answer(pending, line);
            return;
        }

        let args = split_args(line);
        if args.is_empty() {
            return;
        }

        if let Err(e) = self.dispatch(&args) {
            tracing::warn!("Command '{}' failed: {:#}", args[0], e);
            self.say(describe_error(&e));
        }
    }

    fn dispatch(&mut self, args: &[String]) -> Result<()> {
        let rest = &args[1..];
        match args[0].to_lowercase().as_str() {
            "help" | "?" => self.say(HELP),
            "list" | "ls" => self.cmd_list(rest)?,
            "enable" => self.cmd_toggle(rest, Some(PackageState::Enabled))?,
            "disable" => self.cmd_toggle(rest, Some(PackageState::Disabled))?,
            "toggle" => self.cmd_toggle(rest, None)?,
            "install" => self.cmd_install(rest)?,
            "remove" | "delete" => self.cmd_remove(rest)?,
            "rename" => self.cmd_rename(rest)?,
            "export" => self.cmd_export(rest)?,
            "preview" => self.cmd_preview(rest)?,
            "profile" => self.cmd_profile(rest)?,
            "server" => self.cmd_server(rest)?,
            "rcon" => self.cmd_rcon(rest)?,
            "launch" => self.cmd_launch()?,
            "status" => self.cmd_status(),
            "quit" | "exit" => self.finished = true,
            other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
        }
        Ok(())
    }

    fn answer(&mut self, pending: Pending, line: &str) {
        let yes = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");

        match pending {
            Pending::Overwrite {
                library,
                plan,
                mut queue,
                mut answers,
            } => {
                if let Some(name) = queue.pop_front() {
                    answers.insert(name, yes);
                }

                if let Some(next) = queue.front() {
                    self.say(format!("{} already exists. Overwrite? [y/N]", next));
                    self.pending = Some(Pending::Overwrite {
                        library,
                        plan,
                        queue,
                        answers,
                    });
                } else {
                    let mut plan = plan;
                    plan.resolve_with(&mut answers);
                    if let Err(e) = self.start_install(library, plan) {
                        self.say(describe_error(&e));
                    }
                }
            }
            Pending::Remove { library, entries } => {
                if !yes {
                    self.say("Nothing deleted.");
                    return;
                }
                if let Err(e) = self.begin_batch("remove") {
                    self.say(describe_error(&e));
                    return;
                }
                self.bridge.spawn_blocking_job("remove", move || {
                    Completion::Removed(library.remove(&entries))
                });
            }
            Pending::DeleteServer { name } => {
                let confirmation = if yes {
                    Confirmation::Confirmed
                } else {
                    Confirmation::Declined
                };
                match self.session.servers.delete(&name, confirmation) {
                    Ok(true) => {
                        if self
                            .session
                            .rcon_target
                            .as_ref()
                            .is_some_and(|target| target.name == name)
                        {
                            self.session.rcon_target = None;
                        }
                        self.say(format!("Server '{}' deleted.", name));
                    }
                    Ok(false) => self.say("Nothing deleted."),
                    Err(e) => self.say(describe_error(&e.into())),
                }
            }
        }
    }

    /// Fail with [`Busy`] while a library batch runs.
    fn ensure_idle(&self) -> Result<()> {
        if self.session.state.is_processing() {
            let operation = self.session.state.read(|state| state.current_operation.clone());
            return Err(Busy(operation).into());
        }
        Ok(())
    }

    fn begin_batch(&self, operation: &str) -> Result<()> {
        self.session.state.begin_operation(operation)?;
        Ok(())
    }

    fn cmd_list(&mut self, rest: &[String]) -> Result<()> {
        let library = self.session.open_library()?;
        let filter = rest.join(" ");
        let filter = (!filter.trim().is_empty()).then_some(filter);

        let entries = library.scan(filter.as_deref());
        for entry in &entries {
            let mark = if entry.state.is_enabled() { 'x' } else { ' ' };
            self.say(format!(
                "[{}] {:<40} {:>9.2} MB",
                mark,
                entry.name,
                entry.size_mb()
            ));
        }

        if filter.is_some() {
            self.say(format!("{} matching packages.", entries.len()));
            self.session.refresh_counts();
        } else {
            self.session.state.set_counts_from_scan(&entries);
        }
        self.say(self.session.state.status_line());
        Ok(())
    }

    /// Resolve names against the library, reporting the ones that fail.
    fn find_entries(&mut self, library: &ModLibrary, names: &[String]) -> Vec<PackageEntry> {
        let mut entries = Vec::new();
        for name in names {
            match library.find(name) {
                Ok(entry) => entries.push(entry),
                Err(e) => self.say(describe_error(&e.into())),
            }
        }
        entries
    }

    fn cmd_toggle(&mut self, rest: &[String], desired: Option<PackageState>) -> Result<()> {
        if rest.is_empty() {
            bail!("Usage: enable|disable|toggle <names..>");
        }

        let library = self.session.open_library()?;
        let entries = self.find_entries(&library, rest);
        if entries.is_empty() {
            return Ok(());
        }

        self.begin_batch("toggle")?;
        self.bridge.spawn_blocking_job("toggle", move || {
            Completion::Toggled(library.toggle_batch(&entries, desired))
        });
        Ok(())
    }

    fn cmd_install(&mut self, rest: &[String]) -> Result<()> {
        if rest.is_empty() {
            bail!("Usage: install <files..>");
        }
        self.ensure_idle()?;

        let library = self.session.open_library()?;
        let sources: Vec<Utf8PathBuf> = rest.iter().map(Utf8PathBuf::from).collect();
        let plan = library.plan_install(&sources);

        let queue: VecDeque<String> = plan.conflicts().into();
        if let Some(first) = queue.front() {
            self.say(format!("{} already exists. Overwrite? [y/N]", first));
            self.pending = Some(Pending::Overwrite {
                library,
                plan,
                queue,
                answers: HashMap::new(),
            });
            return Ok(());
        }

        self.start_install(library, plan)
    }

    fn start_install(&mut self, library: ModLibrary, plan: InstallPlan) -> Result<()> {
        self.begin_batch("install")?;
        self.bridge.spawn_blocking_job("install", move || {
            Completion::Installed(library.install(plan))
        });
        Ok(())
    }

    fn cmd_remove(&mut self, rest: &[String]) -> Result<()> {
        if rest.is_empty() {
            bail!("Usage: remove <names..>");
        }

        let library = self.session.open_library()?;
        let entries = self.find_entries(&library, rest);
        if entries.is_empty() {
            return Ok(());
        }

        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        self.say(format!(
            "Permanently delete {} file(s): {}? [y/N]",
            entries.len(),
            names.join(", ")
        ));
        self.pending = Some(Pending::Remove { library, entries });
        Ok(())
    }

    fn cmd_rename(&mut self, rest: &[String]) -> Result<()> {
        let [old_name, new_name] = rest else {
            bail!("Usage: rename <name> <new name>");
        };
        // A running batch holds the library lock
        self.ensure_idle()?;

        let library = self.session.open_library()?;
        let entry = library.find(old_name)?;
        let renamed = library.rename(&entry, new_name)?;
        self.say(format!("Renamed {} -> {}", entry.name, renamed.name));
        Ok(())
    }

    fn cmd_export(&mut self, rest: &[String]) -> Result<()> {
        let [path] = rest else {
            bail!("Usage: export <file>");
        };

        let library = self.session.open_library()?;
        let path = Utf8PathBuf::from(path);

        self.begin_batch("export")?;
        self.bridge.spawn_blocking_job("export", move || {
            let started = Instant::now();
            let records = library.export();
            match write_manifest(&path, &records) {
                Ok(()) => Completion::Exported {
                    path,
                    records: records.len(),
                    elapsed: started.elapsed(),
                },
                Err(e) => {
                    tracing::error!("Export failed: {:#}", e);
                    Completion::Failed {
                        operation: "export".to_string(),
                        message: format!("{:#}", e),
                    }
                }
            }
        });
        Ok(())
    }

    fn cmd_preview(&mut self, rest: &[String]) -> Result<()> {
        let (name, save_to) = match rest {
            [name] => (name, None),
            [name, save_to] => (name, Some(Utf8PathBuf::from(save_to))),
            _ => bail!("Usage: preview <name> [save as]"),
        };

        let library = self.session.open_library()?;
        let entry = library.find(name)?;

        self.bridge.spawn_blocking_job("preview", move || {
            let result = find_preview(&entry.path).and_then(|image| {
                if let (Some(image), Some(target)) = (&image, &save_to) {
                    std::fs::write(target, &image.bytes)
                        .with_context(|| format!("Failed to save preview to {}", target))?;
                }
                Ok(image)
            });

            match result {
                Ok(image) => Completion::Preview {
                    saved_to: save_to.filter(|_| image.is_some()),
                    package: entry.name,
                    image,
                },
                Err(e) => Completion::Failed {
                    operation: "preview".to_string(),
                    message: format!("{:#}", e),
                },
            }
        });
        Ok(())
    }

    fn cmd_profile(&mut self, rest: &[String]) -> Result<()> {
        let Some((sub, args)) = rest.split_first() else {
            bail!("Usage: profile list|show|new|rename|delete|use|root|exe|dev|log|args");
        };

        let profiles = &mut self.session.profiles;
        let mut rescan = false;

        match (sub.to_lowercase().as_str(), args) {
            ("list", []) => {
                let lines: Vec<String> = profiles
                    .names()
                    .map(|name| {
                        let mark = if name == profiles.active_name() { '*' } else { ' ' };
                        format!("{} {}", mark, name)
                    })
                    .collect();
                for line in lines {
                    self.say(line);
                }
                return Ok(());
            }
            ("show", []) => {
                let profile = profiles.active().clone();
                let unset = || "(not set)".to_string();
                self.say(format!("Profile:    {}", profile.name));
                self.say(format!(
                    "Base:       {}",
                    profile.content_root().map(|p| p.to_string()).unwrap_or_else(unset)
                ));
                self.say(format!(
                    "Executable: {}",
                    profile.executable_path().map(|p| p.to_string()).unwrap_or_else(unset)
                ));
                self.say(format!(
                    "Arguments:  {}",
                    crate::services::build_launch_args(&profile.launch_options).join(" ")
                ));
                return Ok(());
            }
            ("new", [name]) => {
                profiles.create(name)?;
                rescan = true;
            }
            ("rename", [old_name, new_name]) => profiles.rename(old_name, new_name)?,
            ("delete", [name]) => {
                profiles.delete(name)?;
                rescan = true;
            }
            ("use", [name]) => {
                profiles.set_active(name)?;
                rescan = true;
            }
            ("root", [path]) => {
                let root = optional_path(path);
                if let Some(root) = &root {
                    if !root.is_dir() {
                        bail!("{} is not a directory", root);
                    }
                }
                profiles.set_content_root(root);
                rescan = true;
            }
            ("exe", [path]) => profiles.set_executable_path(optional_path(path)),
            ("dev", [flag]) => profiles.launch_options_mut().developer_mode = parse_flag(flag)?,
            ("log", [flag]) => profiles.launch_options_mut().logging = parse_flag(flag)?,
            ("args", extra) => {
                profiles.launch_options_mut().extra_arguments = extra.to_vec();
            }
            _ => bail!("Usage: profile list|show|new|rename|delete|use|root|exe|dev|log|args"),
        }

        self.session.profiles_changed()?;
        if rescan {
            self.session.refresh_counts();
        }
        self.say(self.session.state.status_line());
        Ok(())
    }

    fn cmd_server(&mut self, rest: &[String]) -> Result<()> {
        let Some((sub, args)) = rest.split_first() else {
            bail!("Usage: server list|save|delete|use|connect");
        };

        match (sub.to_lowercase().as_str(), args) {
            ("list", []) => {
                let presets = self.session.servers.presets()?;
                if presets.is_empty() {
                    self.say("No saved servers.");
                }
                let target = self.session.rcon_target.as_ref().map(|t| t.name.clone());
                for preset in presets {
                    let mark = if target.as_deref() == Some(preset.name.as_str()) {
                        '*'
                    } else {
                        ' '
                    };
                    self.say(format!("{} {} ({})", mark, preset.name, preset.address()));
                }
            }
            ("save", [name, host, port]) => self.save_server(name, host, port, "")?,
            ("save", [name, host, port, password]) => self.save_server(name, host, port, password)?,
            ("delete", [name]) => {
                let preset = self.session.servers.get(name)?;
                self.say(format!("Delete server '{}'? [y/N]", preset.name));
                self.pending = Some(Pending::DeleteServer { name: preset.name });
            }
            ("use", [name]) => {
                let preset = self.session.servers.get(name)?;
                self.say(format!("RCON target: {} ({})", preset.name, preset.address()));
                self.session.rcon_target = Some(preset);
            }
            ("connect", [host, port, password @ ..]) if password.len() <= 1 => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| RconError::InvalidPort(port.to_string()))?;
                let preset = crate::models::ServerPreset {
                    name: "(direct)".to_string(),
                    host: host.to_string(),
                    port,
                    password: password.first().cloned().unwrap_or_default(),
                };
                self.say(format!("RCON target: {}", preset.address()));
                self.session.rcon_target = Some(preset);
            }
            _ => bail!("Usage: server list|save <name> <host> <port> [password]|delete <name>|use <name>|connect <host> <port> [password]"),
        }
        Ok(())
    }

    fn save_server(&mut self, name: &str, host: &str, port: &str, password: &str) -> Result<()> {
        let preset = self.session.servers.save(name, host, port, password)?;
        self.say(format!("Saved server '{}' ({}).", preset.name, preset.address()));
        Ok(())
    }

    fn cmd_rcon(&mut self, rest: &[String]) -> Result<()> {
        let Some(target) = self.session.rcon_target.clone() else {
            bail!("No server selected. Use 'server use <name>' first.");
        };
        let command = rest.join(" ");
        crate::services::rcon::validate_command(&command)?;

        let client = Arc::clone(&self.session.rcon);
        self.bridge.spawn_async(move || async move {
            let result = client
                .send_command(
                    &target.host,
                    &target.port.to_string(),
                    &target.password,
                    &command,
                )
                .await;
            Completion::Rcon { command, result }
        });
        Ok(())
    }

    fn cmd_launch(&mut self) -> Result<()> {
        let handle = self.bridge.handle().clone();
        let _runtime = handle.enter();
        self.session.launch_game()?;
        self.say("Game launched.");
        Ok(())
    }

    fn cmd_status(&mut self) {
        self.session.is_game_running();
        let state = self.session.state.snapshot();

        self.say(state.status_line());
        if state.is_processing {
            self.say(format!("Running: {}", state.current_operation));
        }
        if !state.last_message.is_empty() {
            self.say(format!("Last: {}", state.last_message));
        }
        self.say(format!(
            "Game: {}",
            if state.is_game_running { "running" } else { "not running" }
        ));
    }

    fn handle_completion(&mut self, completion: Completion) {
        let ends_batch = completion.ends_library_batch();
        let metrics = Arc::clone(&self.session.metrics);

        let message = match completion {
            Completion::Toggled(report) => {
                metrics.record_toggle_batch(&report);
                for (name, error) in &report.failures {
                    self.say(format!("  {}: {}", name, error));
                }
                report.summary()
            }
            Completion::Installed(report) => {
                metrics.record_install(&report);
                report.summary()
            }
            Completion::Removed(report) => {
                metrics.record_remove(&report);
                for (name, error) in &report.failures {
                    self.say(format!("  {}: {}", name, error));
                }
                report.summary()
            }
            Completion::Exported {
                path,
                records,
                elapsed,
            } => {
                metrics.record_export(elapsed);
                format!("Exported {} records to {}.", records, path)
            }
            Completion::Preview {
                package,
                image: Some(image),
                saved_to,
            } => {
                let saved = saved_to
                    .map(|path| format!(", saved to {}", path))
                    .unwrap_or_default();
                format!(
                    "Preview of {}: {} ({} bytes){}",
                    package,
                    image.entry_name,
                    image.bytes.len(),
                    saved
                )
            }
            Completion::Preview {
                package,
                image: None,
                ..
            } => format!("No image found in {}.", package),
            Completion::Rcon { command, result } => {
                self.say(format!("rcon> {}", command));
                match result {
                    Ok(outcome) => {
                        match outcome {
                            RconOutcome::TimedOut => metrics.record_rcon_timeout(),
                            RconOutcome::Response(_) => metrics.record_rcon_response(),
                        }
                        outcome.display_text().to_string()
                    }
                    Err(e) => {
                        metrics.record_rcon_error();
                        tracing::warn!("RCON '{}' failed: {}", command, e);
                        describe_error(&e.into())
                    }
                }
            }
            Completion::Failed { operation, message } => {
                metrics.record_worker_failure();
                format!("{} failed: {}", operation, message)
            }
        };

        self.say(&message);

        if ends_batch {
            self.session.state.finish_operation(message);
            self.session.refresh_counts();
            self.say(self.session.state.status_line());
        } else {
            self.session.state.set_message(message);
        }
    }
}

/// Read lines from stdin on a dedicated thread and post them as events.
pub fn spawn_stdin_reader(sender: mpsc::Sender<UiEvent>) -> io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("jk2mm-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.blocking_send(UiEvent::Input(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            let _ = sender.blocking_send(UiEvent::InputClosed);
        })
}

/// Split a command line on whitespace; double quotes group words.
pub fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }
    args
}

/// `-` clears a path setting.
fn optional_path(raw: &str) -> Option<Utf8PathBuf> {
    (raw != "-").then(|| Utf8PathBuf::from(raw))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(anyhow!("Expected on or off, got '{}'", raw)),
    }
}

/// Display text for an error, prefixed with its category when known.
fn describe_error(error: &anyhow::Error) -> String {
    let category: Option<ErrorCategory> = if let Some(e) = error.downcast_ref::<LibraryError>() {
        Some(e.category())
    } else if let Some(e) = error.downcast_ref::<ProfileError>() {
        Some(e.category())
    } else if let Some(e) = error.downcast_ref::<ServerError>() {
        Some(e.category())
    } else if let Some(e) = error.downcast_ref::<RconError>() {
        Some(e.category())
    } else if let Some(e) = error.downcast_ref::<LaunchError>() {
        Some(e.category())
    } else {
        None
    };

    match category {
        Some(category) => format!("Error ({}): {}", category, error),
        None => format!("Error: {:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("  enable a.pk3   b.pk3 "), vec!["enable", "a.pk3", "b.pk3"]);
        assert_eq!(
            split_args(r#"install "/my mods/x.pk3" y.pk3"#),
            vec!["install", "/my mods/x.pk3", "y.pk3"]
        );
        assert_eq!(split_args(r#"profile args """#), vec!["profile", "args", ""]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("ON").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_optional_path() {
        assert_eq!(optional_path("-"), None);
        assert_eq!(optional_path("/jk2/base"), Some(Utf8PathBuf::from("/jk2/base")));
    }

    #[test]
    fn test_describe_error_includes_category() {
        let error = anyhow::Error::from(LibraryError::NameCollision("a.pk3".to_string()));
        assert_eq!(describe_error(&error), "Error (collision): a.pk3 already exists");

        let error = anyhow!("plain failure");
        assert_eq!(describe_error(&error), "Error: plain failure");
    }
}
