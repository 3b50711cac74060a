use reqwest::Method;
use tracing::{debug, info};

use crate::{
    error::{GatewayError, Result},
    management::Environment,
    spotify::{SpotifyClient, ensure_success},
    types::{Device, DevicesResponse},
};

/// Retrieves the live device list of an environment.
///
/// Calls `GET /me/player/devices` with the environment's access token and
/// folds the result back into the environment's known devices, so device ids
/// (which rotate when machines restart) stay current.
///
/// # Errors
///
/// - `Auth` when the environment has no access token
/// - `Api` for non-2xx responses
/// - `Http`/`Json` for transport or decoding failures
pub async fn fetch_devices(client: &SpotifyClient, env: &Environment) -> Result<Vec<Device>> {
    let token = env.access_token().await?;
    let response = client
        .send(client.request(Method::GET, "/me/player/devices", &token))
        .await?;
    let devices = ensure_success(response)
        .await?
        .json::<DevicesResponse>()
        .await?
        .devices;

    debug!(
        "Devices found for {}: {:?}",
        env.kind(),
        devices.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
    );
    env.merge_live_devices(&devices).await;
    Ok(devices)
}

/// Resolves a device name to its current Spotify id.
///
/// Matching is exact and case-sensitive; the first match wins.
///
/// # Errors
///
/// - `Validation` for an empty name, without any network call
/// - `NotFound` when no live device carries the name
pub async fn device_id(client: &SpotifyClient, env: &Environment, name: &str) -> Result<String> {
    Ok(named_device(client, env, name).await?.id)
}

async fn named_device(client: &SpotifyClient, env: &Environment, name: &str) -> Result<Device> {
    if name.is_empty() {
        return Err(GatewayError::Validation(
            "device name must not be empty".to_string(),
        ));
    }

    info!("Retrieving id for device {}", name);
    let devices = fetch_devices(client, env).await?;

    let device = devices
        .into_iter()
        .find(|d| d.name == name && !d.id.is_empty())
        .ok_or_else(|| GatewayError::NotFound(format!("device '{}' in {}", name, env.kind())))?;

    debug!("Device id found: {}", device.id);
    Ok(device)
}

/// Returns the device Spotify reports as active.
///
/// When nothing is active the first configured device is used instead, so a
/// single-speaker environment stays addressable while idle.
pub async fn active_device(client: &SpotifyClient, env: &Environment) -> Result<Device> {
    let devices = fetch_devices(client, env).await?;

    if let Some(active) = devices.into_iter().find(|d| d.is_active) {
        return Ok(active);
    }

    debug!("No active device in {}, falling back to the default", env.kind());
    env.devices()
        .await
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NotFound(format!("no devices known for {}", env.kind())))
}

/// The named device when one is given, otherwise the active device.
pub async fn target_device(
    client: &SpotifyClient,
    env: &Environment,
    name: Option<&str>,
) -> Result<Device> {
    match name {
        Some(name) => named_device(client, env, name).await,
        None => active_device(client, env).await,
    }
}
