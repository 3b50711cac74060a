use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use tabled::Tabled;

use crate::error::GatewayError;

/// Spotify sends `null` for fields that are merely unknown; treat them as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The configured Spotify identities. `Home` drives the living room speaker,
/// `Main` is the personal account used on phone and laptop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Home,
    Main,
}

impl EnvironmentKind {
    pub const ALL: [EnvironmentKind; 2] = [EnvironmentKind::Home, EnvironmentKind::Main];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Home => "home",
            EnvironmentKind::Main => "main",
        }
    }

    /// Prefix of the environment variables holding this identity's settings.
    pub fn config_prefix(&self) -> &'static str {
        match self {
            EnvironmentKind::Home => "HOME_",
            EnvironmentKind::Main => "MAIN_",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(EnvironmentKind::Home),
            "main" => Ok(EnvironmentKind::Main),
            other => Err(GatewayError::NotFound(format!(
                "environment '{other}' (expected home or main)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub supports_volume: bool,
    #[serde(default)]
    pub volume_percent: Option<u8>,
}

impl Device {
    /// A statically configured device whose id is not known yet.
    pub fn named(name: impl Into<String>) -> Self {
        Device {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub id: String,
    pub active: String,
    pub volume: String,
}

impl From<&Device> for DeviceTableRow {
    fn from(device: &Device) -> Self {
        DeviceTableRow {
            name: device.name.clone(),
            id: device.id.clone(),
            active: if device.is_active { "yes" } else { "no" }.to_string(),
            volume: match (device.supports_volume, device.volume_percent) {
                (true, Some(v)) => format!("{v}%"),
                (true, None) => "?".to_string(),
                (false, _) => "-".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
}

/// Snapshot of what an account is playing right now.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playback {
    #[serde(default)]
    pub device: Device,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repeat_state: String,
    #[serde(default)]
    pub shuffle_state: bool,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress_ms: u64,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<Track>,
}

impl Playback {
    /// Context uri, or an empty string when playing without one.
    pub fn context_uri(&self) -> &str {
        self.context.as_ref().map(|c| c.uri.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQueue {
    #[serde(default)]
    pub currently_playing: Option<Track>,
    #[serde(default)]
    pub queue: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSummary {
    pub tracks: PlaylistTotal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTotal {
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatState {
    Track,
    Context,
    Off,
}

impl RepeatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatState::Track => "track",
            RepeatState::Context => "context",
            RepeatState::Off => "off",
        }
    }
}

/// Result of a queue-preserving transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Playback moved; `tracks` uris were handed to the destination.
    Transferred { tracks: usize },
    /// The source had nothing to move.
    NothingPlaying,
}
