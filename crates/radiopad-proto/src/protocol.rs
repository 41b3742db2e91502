use serde::{Deserialize, Serialize};

/// A playable stream.  Identity is positional within the catalog, so two
/// stations with the same name and URL are still distinct entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub url: String,
}

impl Station {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Playback operations that a gamepad button can be bound to.
///
/// Declaration order is the evaluation order used when several actions share
/// one button number: the first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    Play,
    Next,
    Previous,
    Stop,
    VolumeUp,
    VolumeDown,
}

impl ButtonAction {
    pub const PRIORITY: [ButtonAction; 6] = [
        ButtonAction::Play,
        ButtonAction::Next,
        ButtonAction::Previous,
        ButtonAction::Stop,
        ButtonAction::VolumeUp,
        ButtonAction::VolumeDown,
    ];
}

// ── HTTP bodies ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub current_station: String,
    pub volume: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionResponse {
    pub version: String,
}
