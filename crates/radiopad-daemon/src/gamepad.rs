/// Linux joystick (`/dev/input/jsN`) listener.
///
/// The device yields 8-byte little-endian records:
///
/// ```text
///   u32 timestamp (ms) | i16 value | u8 type | u8 number
/// ```
///
/// Only button-press edges (`type == JS_EVENT_BUTTON`, `value == 1`) do
/// anything.  Releases, axis motion and the synthetic `JS_EVENT_INIT` burst
/// the driver sends on open are dropped.
use radiopad_proto::config::ButtonMappings;
use radiopad_proto::protocol::ButtonAction;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::playback::PlaybackController;
use crate::supervisor::PlayerBackend;

pub const EVENT_SIZE: usize = 8;
pub const JS_EVENT_BUTTON: u8 = 0x01;
pub const BUTTON_PRESSED: i16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEvent {
    pub timestamp: u32,
    pub value: i16,
    pub kind: u8,
    pub button_number: u8,
}

impl DeviceEvent {
    pub fn from_bytes(raw: [u8; EVENT_SIZE]) -> Self {
        Self {
            timestamp: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            value: i16::from_le_bytes([raw[4], raw[5]]),
            kind: raw[6],
            button_number: raw[7],
        }
    }

    pub fn is_button_press(&self) -> bool {
        self.kind == JS_EVENT_BUTTON && self.value == BUTTON_PRESSED
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GamepadError {
    #[error("error opening gamepad device {path}: {source}")]
    DeviceOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error reading gamepad event: {0}")]
    DeviceReadFailed(#[source] std::io::Error),
}

/// Joystick device opened non-blocking and driven by the reactor.  Unlike
/// `tokio::fs::File`, no blocking-pool read is left behind when a pending
/// read is dropped, so cancelling the listener releases the runtime.
pub struct JoystickDevice {
    fd: AsyncFd<std::fs::File>,
}

impl JoystickDevice {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        Ok(Self {
            fd: AsyncFd::new(file)?,
        })
    }
}

impl AsyncRead for JoystickDevice {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        loop {
            let mut guard = ready!(this.fd.poll_read_ready(cx))?;
            let unfilled = buf.initialize_unfilled();
            match guard.try_io(|inner| inner.get_ref().read(unfilled)) {
                Ok(Ok(n)) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Ok(Err(e)) => return Poll::Ready(Err(e)),
                Err(_would_block) => continue,
            }
        }
    }
}

pub struct GamepadListener<B> {
    mappings: ButtonMappings,
    controller: Arc<PlaybackController<B>>,
    cancel: CancellationToken,
}

impl<B: PlayerBackend> GamepadListener<B> {
    pub fn new(
        mappings: ButtonMappings,
        controller: Arc<PlaybackController<B>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            mappings,
            controller,
            cancel,
        }
    }

    pub async fn run_device(&self, path: &Path) -> Result<(), GamepadError> {
        let device = JoystickDevice::open(path).map_err(|source| GamepadError::DeviceOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Gamepad listener started on device: {}", path.display());
        self.run(device).await
    }

    /// Read and dispatch records until cancelled (`Ok`) or the stream fails
    /// or ends (`Err`).  A failing command does not stop the loop.
    pub async fn run<R>(&self, mut reader: R) -> Result<(), GamepadError>
    where
        R: AsyncRead + Unpin,
    {
        let mut raw = [0u8; EVENT_SIZE];
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Gamepad listener stopped");
                    return Ok(());
                }
                read = reader.read_exact(&mut raw) => {
                    read.map_err(GamepadError::DeviceReadFailed)?;
                }
            }
            self.handle(DeviceEvent::from_bytes(raw)).await;
        }
    }

    /// Dispatch one record.  Returns the action that ran, if any.
    pub async fn handle(&self, event: DeviceEvent) -> Option<ButtonAction> {
        if !event.is_button_press() {
            return None;
        }
        let action = self.mappings.action_for(event.button_number)?;
        debug!(
            "Gamepad button {} -> {:?} (t={}ms)",
            event.button_number, action, event.timestamp
        );
        if let Err(e) = self.controller.apply(action).await {
            warn!(
                "Error executing command for button {}: {}",
                event.button_number, e
            );
        }
        Some(action)
    }
}
