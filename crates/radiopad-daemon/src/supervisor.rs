/// Owns the single mpv child process.
///
/// ```text
///   start(url, volume)
///     lock process slot
///       ├── kill + reap previous child
///       ├── remove stale IPC socket
///       ├── spawn mpv --input-ipc-server=<socket> <url>
///       ├── poll connect() until ready  (≤ ceiling, bails if child exits)
///       ├── settle
///       └── re-apply volume
///     unlock
/// ```
///
/// `stop()` only tells mpv to stop; the process stays alive and idle until the
/// next `start()` replaces it or `shutdown()` kills it.
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::mpv::{IpcChannel, MpvCommand};

/// What the playback state machine needs from a player.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Replace whatever is running with a fresh player on `url`, at `volume`.
    async fn start(&self, url: &str, volume: u8) -> Result<(), PlayerError>;

    /// Deliver a control command to the running player.
    async fn send(&self, command: MpvCommand) -> Result<(), PlayerError>;

    /// Terminate the player, if any.
    async fn shutdown(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessTimings {
    pub poll_interval: Duration,
    pub ceiling: Duration,
    /// Extra wait after the socket accepts before the first command.
    pub settle: Duration,
}

impl Default for ReadinessTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            ceiling: Duration::from_secs(5),
            settle: Duration::from_millis(500),
        }
    }
}

pub struct MpvSupervisor {
    binary: PathBuf,
    channel: IpcChannel,
    timings: ReadinessTimings,
    process: Mutex<Option<Child>>,
}

impl MpvSupervisor {
    pub fn new(binary: impl Into<PathBuf>, channel: IpcChannel) -> Self {
        Self {
            binary: binary.into(),
            channel,
            timings: ReadinessTimings::default(),
            process: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub fn with_timings(mut self, timings: ReadinessTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Pid of the current child, if one is running.
    #[cfg(test)]
    pub async fn current_pid(&self) -> Option<u32> {
        let mut slot = self.process.lock().await;
        match slot.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => child.id(),
                _ => None,
            },
            None => None,
        }
    }

    async fn kill_current(slot: &mut Option<Child>) {
        if let Some(mut child) = slot.take() {
            if let Ok(Some(status)) = child.try_wait() {
                debug!("mpv: previous process already exited ({})", status);
                return;
            }
            // kill() also waits for the exit, so the old process is gone
            // before anyone else binds the socket path.
            if let Err(e) = child.kill().await {
                warn!("mpv: failed to kill previous process: {}", e);
            } else {
                debug!("mpv: previous process terminated");
            }
        }
    }

    async fn remove_stale_socket(&self) {
        match tokio::fs::remove_file(self.channel.path()).await {
            Ok(()) => debug!("mpv: removed stale socket {}", self.channel.path().display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("mpv: couldn't remove stale socket: {}", e),
        }
    }

    fn spawn(&self, url: &str) -> Result<Child, PlayerError> {
        Command::new(&self.binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(radiopad_proto::platform::mpv_socket_arg(self.channel.path()))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::SpawnFailed(format!("{}: {}", self.binary.display(), e)))
    }

    async fn wait_ready(&self, child: &mut Child) -> Result<(), PlayerError> {
        let deadline = tokio::time::Instant::now() + self.timings.ceiling;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(PlayerError::SpawnFailed(format!(
                    "mpv exited during startup ({})",
                    status
                )));
            }
            if self.channel.probe().await {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PlayerError::channel(
                    self.channel.path(),
                    format!("socket not ready after {:?}", self.timings.ceiling),
                ));
            }
            tokio::time::sleep(self.timings.poll_interval).await;
        }
    }
}

#[async_trait]
impl PlayerBackend for MpvSupervisor {
    async fn start(&self, url: &str, volume: u8) -> Result<(), PlayerError> {
        let mut slot = self.process.lock().await;

        Self::kill_current(&mut slot).await;
        self.remove_stale_socket().await;

        info!("mpv: spawning for {}", url);
        let child = slot.insert(self.spawn(url)?);
        if let Err(e) = self.wait_ready(child).await {
            if matches!(e, PlayerError::SpawnFailed(_)) {
                *slot = None;
            }
            return Err(e);
        }
        tokio::time::sleep(self.timings.settle).await;

        // A fresh process starts at mpv's own default volume.
        if let Err(e) = self.channel.send(MpvCommand::SetVolume(volume)).await {
            warn!("mpv: couldn't set initial volume: {}", e);
        }
        Ok(())
    }

    async fn send(&self, command: MpvCommand) -> Result<(), PlayerError> {
        self.channel.send(command).await
    }

    async fn shutdown(&self) {
        let mut slot = self.process.lock().await;
        if slot.is_some() {
            info!("mpv: shutting down player process");
        }
        Self::kill_current(&mut slot).await;
        self.remove_stale_socket().await;
    }
}
