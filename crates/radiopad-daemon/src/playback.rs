//! Playback state machine: the one place `current_index` and `volume` change.
//!
//! Every mutating operation runs under `op_lock`, so a station switch
//! (which replaces the player process) completes before the next operation
//! starts, whichever source it came from.  `state` is a separate short-held
//! lock so `/status` never waits on a process replace.
use radiopad_proto::catalog::Catalog;
use radiopad_proto::protocol::{ButtonAction, Station, StatusResponse};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::error::PlayerError;
use crate::mpv::MpvCommand;
use crate::supervisor::PlayerBackend;

pub const DEFAULT_VOLUME: u8 = 50;
pub const VOLUME_STEP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub volume: u8,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_index: 0,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Saturating volume arithmetic, kept within 0..=100.
pub fn clamp_volume(volume: u8, delta: i32) -> u8 {
    (i32::from(volume) + delta).clamp(0, 100) as u8
}

pub struct PlaybackController<B> {
    catalog: Catalog,
    backend: B,
    op_lock: Mutex<()>,
    state: RwLock<PlaybackState>,
}

impl<B: PlayerBackend> PlaybackController<B> {
    pub fn new(catalog: Catalog, backend: B) -> Self {
        Self {
            catalog,
            backend,
            op_lock: Mutex::new(()),
            state: RwLock::new(PlaybackState::default()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn snapshot(&self) -> PlaybackState {
        *self.state.read().await
    }

    pub async fn status(&self) -> StatusResponse {
        let state = self.snapshot().await;
        StatusResponse {
            current_station: self.catalog.get(state.current_index).name.clone(),
            volume: state.volume,
        }
    }

    /// (Re)start the selected station without moving the selection.
    pub async fn play(&self) -> Result<Station, PlayerError> {
        self.switch(|idx, _| idx).await
    }

    pub async fn next(&self) -> Result<Station, PlayerError> {
        self.switch(|idx, len| (idx + 1) % len).await
    }

    pub async fn previous(&self) -> Result<Station, PlayerError> {
        self.switch(|idx, len| (idx + len - 1) % len).await
    }

    /// Stop playback.  The player process stays alive and idle.
    pub async fn stop(&self) -> Result<(), PlayerError> {
        let _op = self.op_lock.lock().await;
        info!("Stopping playback");
        self.backend.send(MpvCommand::Stop).await
    }

    /// Move the volume by `delta`, saturating at 0 and 100, and push it to the
    /// player.  The stored volume changes even if the push fails, so the next
    /// process start picks it up.
    pub async fn adjust_volume(&self, delta: i32) -> Result<u8, PlayerError> {
        let _op = self.op_lock.lock().await;
        let volume = {
            let mut state = self.state.write().await;
            state.volume = clamp_volume(state.volume, delta);
            state.volume
        };
        info!("Volume: {}", volume);
        self.backend.send(MpvCommand::SetVolume(volume)).await?;
        Ok(volume)
    }

    /// Run the operation bound to a gamepad action.
    pub async fn apply(&self, action: ButtonAction) -> Result<(), PlayerError> {
        match action {
            ButtonAction::Play => self.play().await.map(drop),
            ButtonAction::Next => self.next().await.map(drop),
            ButtonAction::Previous => self.previous().await.map(drop),
            ButtonAction::Stop => self.stop().await,
            ButtonAction::VolumeUp => self.adjust_volume(VOLUME_STEP).await.map(drop),
            ButtonAction::VolumeDown => self.adjust_volume(-VOLUME_STEP).await.map(drop),
        }
    }

    pub async fn shutdown(&self) {
        let _op = self.op_lock.lock().await;
        self.backend.shutdown().await;
    }

    // The selection moves before the player is started; a failed start
    // leaves it on the new station.
    async fn switch(
        &self,
        select: impl FnOnce(usize, usize) -> usize,
    ) -> Result<Station, PlayerError> {
        let _op = self.op_lock.lock().await;
        let (station, volume) = {
            let mut state = self.state.write().await;
            state.current_index = select(state.current_index, self.catalog.len());
            (self.catalog.get(state.current_index).clone(), state.volume)
        };
        info!("Playing station: {}", station.name);
        self.backend.start(&station.url, volume).await?;
        Ok(station)
    }
}
