/// mpv JSON IPC, reduced to what radiopad needs.
///
/// Every command opens a fresh connection to the `--input-ipc-server`
/// socket, writes one `{"command": [...]}` line and tries to read the reply.
/// The reply is informational only: a missing, partial or error reply is
/// logged and the send still counts as delivered.  Failing to connect or
/// write is the only hard error.
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};

use crate::error::PlayerError;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands radiopad sends to a running mpv.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpvCommand {
    SetVolume(u8),
    Stop,
}

impl MpvCommand {
    pub fn to_json(self) -> Value {
        match self {
            MpvCommand::SetVolume(v) => json!({ "command": ["set_property", "volume", v] }),
            MpvCommand::Stop => json!({ "command": ["stop"] }),
        }
    }

    /// Serialised line, newline-terminated.
    pub fn encode(self) -> String {
        terminate(self.to_json().to_string())
    }
}

fn terminate(mut message: String) -> String {
    if !message.ends_with('\n') {
        message.push('\n');
    }
    message
}

/// Short-lived-connection client for the mpv IPC socket.
#[derive(Debug, Clone)]
pub struct IpcChannel {
    path: PathBuf,
    timeout: Duration,
}

impl IpcChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn send(&self, command: MpvCommand) -> Result<(), PlayerError> {
        self.send_raw(command.encode()).await
    }

    /// Send one message.  A trailing newline is added if missing.
    pub async fn send_raw(&self, message: String) -> Result<(), PlayerError> {
        let message = terminate(message);
        let mut stream = self.connect().await?;

        debug!("mpv ipc: send {}", message.trim_end());
        match tokio::time::timeout(self.timeout, stream.write_all(message.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PlayerError::channel(&self.path, e)),
            Err(_) => return Err(PlayerError::channel(&self.path, "write timed out")),
        }

        let mut buf = [0u8; 1024];
        match tokio::time::timeout(self.timeout, stream.read(&mut buf)).await {
            Ok(Ok(0)) => warn!("mpv ipc: connection closed before reply"),
            Ok(Ok(n)) => check_reply(&buf[..n]),
            Ok(Err(e)) => warn!("mpv ipc: couldn't read reply: {}", e),
            Err(_) => warn!("mpv ipc: no reply within {:?}", self.timeout),
        }
        Ok(())
    }

    /// True if the socket accepts a connection right now.
    pub async fn probe(&self) -> bool {
        self.connect().await.is_ok()
    }

    async fn connect(&self) -> Result<UnixStream, PlayerError> {
        match tokio::time::timeout(self.timeout, UnixStream::connect(&self.path)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(PlayerError::channel(&self.path, e)),
            Err(_) => Err(PlayerError::channel(&self.path, "connect timed out")),
        }
    }
}

// mpv may interleave event lines with the reply; only the line carrying an
// "error" field is the reply.
fn check_reply(raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let reply = text
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
        .find(|v| v.get("error").is_some());

    match reply {
        Some(v) if v["error"].as_str() == Some("success") => debug!("mpv ipc: reply ok"),
        Some(v) => warn!("mpv ipc: mpv reported error: {}", v["error"]),
        None => warn!("mpv ipc: unreadable reply {:?}", text.trim()),
    }
}
