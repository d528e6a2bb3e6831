//! Remote console client.
//!
//! One exchange is one datagram out and at most one datagram back:
//! `FF FF FF FF "rcon <password> <command>\n"`, answered by the server with
//! `FF FF FF FF "print\n<text>"`. There is no session, no retry and no
//! reassembly. The local socket is bound once and reused for every exchange.

use crate::services::ErrorCategory;
use regex::Regex;
use std::net::SocketAddr;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

/// Default wait for the reply datagram.
pub const RCON_TIMEOUT: Duration = Duration::from_secs(5);

/// Out-of-band marker prefixed to every request and reply.
pub const OOB_HEADER: [u8; 4] = [0xFF; 4];

const MAX_DATAGRAM: usize = 65_536;

static COMMAND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_. \-]+$").expect("Invalid RCON command regex"));

/// Shown in place of a reply when none arrived in time.
pub const TIMEOUT_MESSAGE: &str = "Connection timed out.";

#[derive(Error, Debug)]
pub enum RconError {
    #[error("Invalid characters in command: '{0}'")]
    InvalidCommand(String),

    #[error("RCON password contains control characters")]
    InvalidPassword,

    #[error("Server address is empty")]
    MissingHost,

    #[error("Invalid port: '{0}'")]
    InvalidPort(String),

    #[error("Failed to resolve {0}: {1}")]
    Resolve(String, #[source] std::io::Error),

    #[error("No usable address for {0}")]
    NoAddress(String),

    #[error("Failed to bind RCON socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Failed to send RCON command: {0}")]
    Send(#[source] std::io::Error),

    #[error("Failed to receive RCON reply: {0}")]
    Receive(#[source] std::io::Error),
}

impl RconError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RconError::InvalidCommand(_)
            | RconError::InvalidPassword
            | RconError::MissingHost
            | RconError::InvalidPort(_) => ErrorCategory::Validation,
            RconError::Resolve(..)
            | RconError::NoAddress(_)
            | RconError::Bind(_)
            | RconError::Send(_)
            | RconError::Receive(_) => ErrorCategory::Network,
        }
    }
}

/// Non-error result of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RconOutcome {
    /// Sanitized reply text
    Response(String),
    TimedOut,
}

impl RconOutcome {
    pub fn display_text(&self) -> &str {
        match self {
            RconOutcome::Response(text) => text,
            RconOutcome::TimedOut => TIMEOUT_MESSAGE,
        }
    }
}

pub struct RconClient {
    // At most one exchange in flight on the shared socket.
    socket: Mutex<UdpSocket>,
    timeout: Duration,
}

impl RconClient {
    /// Bind an ephemeral local socket with the default timeout.
    pub async fn bind() -> Result<Self, RconError> {
        Self::bind_with_timeout(RCON_TIMEOUT).await
    }

    pub async fn bind_with_timeout(timeout: Duration) -> Result<Self, RconError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(RconError::Bind)?;

        if let Ok(local) = socket.local_addr() {
            tracing::debug!("RCON socket bound to {}", local);
        }

        Ok(Self {
            socket: Mutex::new(socket),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one exchange.
    ///
    /// Input is validated before any network I/O. A missing reply is
    /// [`RconOutcome::TimedOut`], not an error.
    pub async fn send_command(
        &self,
        host: &str,
        port: &str,
        password: &str,
        command: &str,
    ) -> Result<RconOutcome, RconError> {
        validate_command(command)?;
        if password.chars().any(char::is_control) {
            return Err(RconError::InvalidPassword);
        }
        let host = host.trim();
        if host.is_empty() {
            return Err(RconError::MissingHost);
        }
        let port = parse_port(port)?;

        let target = resolve(host, port).await?;
        let request = build_request(password, command);

        let socket = self.socket.lock().await;

        // Drop late replies left over from an earlier timed-out exchange.
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        while socket.try_recv_from(&mut buffer).is_ok() {}

        tracing::info!("RCON -> {}: {}", target, command);
        socket
            .send_to(&request, target)
            .await
            .map_err(RconError::Send)?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            match tokio::time::timeout_at(deadline, socket.recv_from(&mut buffer)).await {
                Err(_) => {
                    tracing::warn!("RCON reply from {} timed out after {:?}", target, self.timeout);
                    return Ok(RconOutcome::TimedOut);
                }
                Ok(Err(e)) => return Err(RconError::Receive(e)),
                Ok(Ok((len, from))) if from != target => {
                    tracing::warn!("Ignoring {} bytes from unexpected peer {}", len, from);
                }
                Ok(Ok((len, from))) => {
                    tracing::debug!("RCON <- {}: {} bytes", from, len);
                    return Ok(RconOutcome::Response(decode_response(&buffer[..len])));
                }
            }
        }
    }
}

/// Reject anything outside alphanumerics, space and `_-.`.
pub fn validate_command(command: &str) -> Result<(), RconError> {
    if command.trim().is_empty() || !COMMAND_PATTERN.is_match(command) {
        return Err(RconError::InvalidCommand(command.to_string()));
    }
    Ok(())
}

/// Request datagram for `password` and `command`.
pub fn build_request(password: &str, command: &str) -> Vec<u8> {
    let mut request = OOB_HEADER.to_vec();
    request.extend_from_slice(format!("rcon {} {}\n", password, command).as_bytes());
    request
}

/// Decode a reply datagram into display text.
///
/// Strips the out-of-band marker and the `print` line, replaces invalid UTF-8
/// and then applies [`sanitize_response`].
pub fn decode_response(payload: &[u8]) -> String {
    let body = payload.strip_prefix(&OOB_HEADER[..]).unwrap_or(payload);
    let text = String::from_utf8_lossy(body);
    let text: &str = &text;
    let text = text
        .strip_prefix("print\n")
        .or_else(|| text.strip_prefix("print\r\n"))
        .unwrap_or(text);
    sanitize_response(text)
}

/// Remove `^0`..`^7` color codes, trim every line and drop blank ones.
pub fn sanitize_response(text: &str) -> String {
    let mut cleaned = text.to_string();
    for digit in 0..=7 {
        cleaned = cleaned.replace(&format!("^{}", digit), "");
    }

    cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_port(port: &str) -> Result<u16, RconError> {
    match port.trim().parse::<u16>() {
        Ok(value) if value != 0 => Ok(value),
        _ => Err(RconError::InvalidPort(port.to_string())),
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, RconError> {
    let addresses: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| RconError::Resolve(host.to_string(), e))?
        .collect();

    // The local socket is IPv4.
    addresses
        .iter()
        .copied()
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| RconError::NoAddress(host.to_string()))
}
