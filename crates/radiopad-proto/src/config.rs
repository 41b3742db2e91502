use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::protocol::ButtonAction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port", deserialize_with = "port_from_number_or_string")]
    pub server_port: u16,
    #[serde(default = "default_gamepad_device", alias = "gamepad_device")]
    pub gamepad_device_path: PathBuf,
    #[serde(default = "default_stations_api_url")]
    pub stations_api_url: String,
    #[serde(default)]
    pub button_mappings: ButtonMappings,
}

/// Button numbers (as reported by the joystick driver) for each action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonMappings {
    #[serde(default = "default_play")]
    pub play: u8,
    #[serde(default = "default_next")]
    pub next: u8,
    #[serde(default = "default_previous")]
    pub previous: u8,
    #[serde(default = "default_stop")]
    pub stop: u8,
    #[serde(default = "default_volume_up")]
    pub volume_up: u8,
    #[serde(default = "default_volume_down")]
    pub volume_down: u8,
}

impl ButtonMappings {
    pub fn button_for(&self, action: ButtonAction) -> u8 {
        match action {
            ButtonAction::Play => self.play,
            ButtonAction::Next => self.next,
            ButtonAction::Previous => self.previous,
            ButtonAction::Stop => self.stop,
            ButtonAction::VolumeUp => self.volume_up,
            ButtonAction::VolumeDown => self.volume_down,
        }
    }

    /// Resolve a button number to an action.  When several actions share the
    /// same number only the first in `ButtonAction::PRIORITY` fires.
    pub fn action_for(&self, button: u8) -> Option<ButtonAction> {
        ButtonAction::PRIORITY
            .into_iter()
            .find(|action| self.button_for(*action) == button)
    }
}

impl Default for ButtonMappings {
    fn default() -> Self {
        Self {
            play: default_play(),
            next: default_next(),
            previous: default_previous(),
            stop: default_stop(),
            volume_up: default_volume_up(),
            volume_down: default_volume_down(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: default_port(),
            gamepad_device_path: default_gamepad_device(),
            stations_api_url: default_stations_api_url(),
            button_mappings: ButtonMappings::default(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_gamepad_device() -> PathBuf {
    PathBuf::from("/dev/input/js0")
}

fn default_stations_api_url() -> String {
    "https://bxmusic-stations-1111.bxmedia.workers.dev".to_string()
}

fn default_play() -> u8 {
    0
}

fn default_next() -> u8 {
    1
}

fn default_previous() -> u8 {
    2
}

fn default_stop() -> u8 {
    3
}

fn default_volume_up() -> u8 {
    7
}

fn default_volume_down() -> u8 {
    6
}

// Older config files stored the port as a string ("8080").
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl Config {
    /// Load the config at `path`, writing defaults there first if it does not
    /// exist.  A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Created default config file at {}", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing config file {}", path.display()))?;
        Ok(())
    }
}
