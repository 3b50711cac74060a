//! Configuration management for the home gateway.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Every setting has a getter here so the rest of the
//! crate never reads the process environment directly.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)
//!
//! Spotify identities are configured per environment with a prefix, e.g.
//! `HOME_SP_CLIENT_ID` and `MAIN_SP_CLIENT_ID`.

use std::{env, path::PathBuf, time::Duration};

use crate::{management::EnvironmentSettings, types::EnvironmentKind, utils};

pub const APP_NAME: &str = "homelink";

/// Playlist started by the alarm schedule.
pub const RELAX_PLAYLIST_URI: &str = "spotify:playlist:0qPA1tBtiCLVHCUfREECnO";

/// Volume used by the alarm schedule.
pub const ALARM_VOLUME: u8 = 60;

/// Loads environment variables from `.env` files.
///
/// Looks first in the working directory, then in the platform-specific local
/// data directory under `homelink/.env`. Variables already present in the
/// process environment are never overridden.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/homelink/.env`
/// - macOS: `~/Library/Application Support/homelink/.env`
/// - Windows: `%LOCALAPPDATA%/homelink/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or if neither
/// location holds a readable `.env` file.
pub async fn load_env() -> Result<(), String> {
    if dotenv::dotenv().is_ok() {
        return Ok(());
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(format!("{APP_NAME}/.env"));
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    dotenv::from_path(&path)
        .map_err(|e| format!("failed to load {}: {}", path.display(), e))
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Address the HTTP server binds to (`SERVER_ADDRESS`, default `0.0.0.0:8080`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", "0.0.0.0:8080")
}

/// Returns the Spotify Web API base URL.
///
/// Retrieves `SPOTIFY_API_URL`, falling back to the public endpoint. Tests and
/// local proxies point this elsewhere.
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", "https://api.spotify.com/v1")
}

/// Returns the Spotify OAuth authorization URL (`SPOTIFY_API_AUTH_URL`).
pub fn spotify_apiauth_url() -> String {
    var_or(
        "SPOTIFY_API_AUTH_URL",
        "https://accounts.spotify.com/authorize",
    )
}

/// Returns the Spotify OAuth token exchange URL (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> String {
    var_or(
        "SPOTIFY_API_TOKEN_URL",
        "https://accounts.spotify.com/api/token",
    )
}

/// Timeout applied to every outbound HTTP call (`HTTP_TIMEOUT_SECS`, default 10).
pub fn http_timeout() -> Duration {
    let secs = optional_var("HTTP_TIMEOUT_SECS")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);
    Duration::from_secs(secs)
}

/// Directory holding one token file per environment (`TOKENS_DIR`, default `.tokens`).
pub fn tokens_dir() -> PathBuf {
    PathBuf::from(var_or("TOKENS_DIR", ".tokens"))
}

pub fn token_file(kind: EnvironmentKind) -> PathBuf {
    tokens_dir().join(format!(".tokens-{kind}.txt"))
}

fn default_devices(kind: EnvironmentKind) -> &'static str {
    match kind {
        EnvironmentKind::Home => "librespot",
        EnvironmentKind::Main => "",
    }
}

/// Collects everything needed to build one Spotify environment.
///
/// Missing credentials are kept as `None`; the environment itself decides
/// that it cannot be built, so one bad identity does not take the other down.
pub fn environment_settings(kind: EnvironmentKind) -> EnvironmentSettings {
    let prefix = kind.config_prefix();
    EnvironmentSettings {
        kind,
        client_id: optional_var(&format!("{prefix}SP_CLIENT_ID")),
        client_secret: optional_var(&format!("{prefix}SP_CLIENT_SECRET")),
        callback_uri: optional_var(&format!("{prefix}SP_CALLBACK_URI")),
        devices: utils::parse_list(&var_or(
            &format!("{prefix}SP_DEVICES"),
            default_devices(kind),
        )),
        tokens_path: token_file(kind),
    }
}

/// Destination devices that cannot take a raw uri queue and need a hard transfer.
pub fn hard_transfer_devices() -> Vec<String> {
    utils::parse_list(&var_or("HARD_TRANSFER_DEVICES", "librespot,iPhone"))
}

pub fn tailscale_api_url() -> String {
    var_or("TS_API_URL", "https://api.tailscale.com/api/v2")
}

pub fn tailscale_api_key() -> Option<String> {
    optional_var("TS_API_KEY")
}

/// Tailnet name; `-` selects the tailnet of the API key.
pub fn tailnet() -> String {
    var_or("TS_TAILNET", "-")
}

pub fn ssh_user() -> Option<String> {
    optional_var("SSH_USER").or_else(|| optional_var("USER"))
}

/// MAC address of a managed machine, read from the variable named by its profile.
pub fn machine_mac(variable: &str) -> Option<String> {
    optional_var(variable)
}

/// Sysfs value file of the lamp's GPIO line; unset runs the lamp in dev mode.
pub fn lamp_gpio_value_path() -> Option<PathBuf> {
    optional_var("LAMP_GPIO_VALUE_PATH").map(PathBuf::from)
}
