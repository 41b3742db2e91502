use std::path::PathBuf;

/// Runtime failures of a playback operation.  None of these are fatal to the
/// daemon; they are reported back to whoever triggered the operation.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("failed to start mpv: {0}")]
    SpawnFailed(String),
    #[error("mpv control channel {path} unavailable: {reason}")]
    ChannelUnavailable { path: PathBuf, reason: String },
}

impl PlayerError {
    pub(crate) fn channel(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        PlayerError::ChannelUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
