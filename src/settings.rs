//! Game settings and tunables
//!
//! Loaded from a JSON file; every field has a default so partial files work.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Gameplay balance, copied into each player's match state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Lines cleared in one falling-block stage before the board flips
    pub lines_to_transition: u32,
    /// Length of the paddle stage (seconds)
    pub survive_seconds: f32,
    /// Base fall speed (world units per second)
    pub fall_speed: f32,
    /// Extra fall speed while soft drop is held
    pub soft_drop_bonus: f32,
    /// Difficulty level; scales fall and ball speed
    pub level: u32,
    /// Board flip speed during transitions (degrees per second)
    pub transition_speed: f32,
    /// Board spin speed of the severity-3 attack (degrees per second)
    pub spin_speed: f32,
    /// Paddle slide speed (world units per second)
    pub paddle_speed: f32,
    /// Ball speed per axis
    pub ball_speed: (f32, f32),
    /// Ball speed per axis while the fast-ball attack is active
    pub fast_ball_speed: (f32, f32),
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lines_to_transition: 4,
            survive_seconds: 30.0,
            fall_speed: 1.0,
            soft_drop_bonus: 4.3,
            level: 1,
            transition_speed: 180.0,
            spin_speed: 180.0,
            paddle_speed: 5.0,
            ball_speed: (1.5, 2.5),
            fast_ball_speed: (2.5, 4.0),
        }
    }
}

/// Network preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetSettings {
    /// TCP port to host on or connect to
    pub port: u16,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self { port: 4455 }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tuning: Tuning,

    // === Input ===
    /// Hold time before a held key starts repeating (seconds)
    pub key_repeat_delay: f32,
    /// Interval between repeats once repeating (seconds)
    pub key_repeat_interval: f32,

    // === HUD ===
    /// How long a notice ("ATTACK", "YOU WIN", ...) stays up (seconds)
    pub notice_seconds: f32,

    /// Fixed RNG seed; random per run when unset
    pub seed: Option<u64>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    pub network: NetSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            key_repeat_delay: 0.35,
            key_repeat_interval: 0.05,
            notice_seconds: 3.0,
            seed: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            network: NetSettings::default(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read settings: {e}"),
            Self::Parse(e) => write!(f, "invalid settings: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }
}
