use std::{sync::Arc, time::Duration};

use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::{GatewayError, Result},
    management::Environment,
    scheduler::Scheduler,
    spotify::{SpotifyClient, devices, ensure_success, playlist},
    types::{Device, Playback, RepeatState, UserQueue},
    utils,
};

/// Delay before shuffle and repeat are switched on after starting a playlist.
/// Spotify drops these toggles when they arrive right after a play call on a
/// device that just woke up.
pub const SHUFFLE_REPEAT_DELAY: Duration = Duration::from_secs(5);

/// What to start with [`play_playlist`].
#[derive(Debug, Clone)]
pub struct PlaylistRequest {
    pub context_uri: String,
    pub volume_percent: u8,
    pub device_name: Option<String>,
    /// Track to start at; `None` picks a random one.
    pub offset: Option<u64>,
}

fn device_query(device_id: &str) -> Vec<(&'static str, String)> {
    if device_id.is_empty() {
        Vec::new()
    } else {
        vec![("device_id", device_id.to_string())]
    }
}

/// Reads the current playback state; an idle account yields an empty snapshot.
pub async fn current_playback(client: &SpotifyClient, env: &Environment) -> Result<Playback> {
    let token = env.access_token().await?;
    let response = client
        .send(client.request(Method::GET, "/me/player", &token))
        .await?;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Playback::default());
    }

    let playback = ensure_success(response).await?.json::<Playback>().await?;
    debug!(
        "Playback of {}: playing={} device={} context={}",
        env.kind(),
        playback.is_playing,
        playback.device.name,
        playback.context_uri()
    );
    Ok(playback)
}

/// Reads the current user queue; an idle account yields an empty queue.
pub async fn user_queue(client: &SpotifyClient, env: &Environment) -> Result<UserQueue> {
    let token = env.access_token().await?;
    let response = client
        .send(client.request(Method::GET, "/me/player/queue", &token))
        .await?;

    if response.status() == StatusCode::NO_CONTENT {
        return Ok(UserQueue::default());
    }

    let queue = ensure_success(response).await?.json::<UserQueue>().await?;
    debug!("Queue of {} holds {} tracks", env.kind(), queue.queue.len());
    Ok(queue)
}

/// Resumes playback on the named device, or on the active one.
pub async fn play(client: &SpotifyClient, env: &Environment, device_name: Option<&str>) -> Result<()> {
    let device = devices::target_device(client, env, device_name).await?;
    let token = env.access_token().await?;

    info!("Playing on {} ({})", device.name, env.kind());
    let request = client
        .request(Method::PUT, "/me/player/play", &token)
        .query(&device_query(&device.id));
    ensure_success(client.send(request).await?).await?;
    Ok(())
}

/// Pauses the named device, or the active one.
pub async fn pause(client: &SpotifyClient, env: &Environment, device_name: Option<&str>) -> Result<()> {
    let device = devices::target_device(client, env, device_name).await?;
    pause_on(client, env, &device.id).await
}

/// Pauses a device whose id is already known.
///
/// The id is always sent so an account with several registered devices
/// pauses the intended one.
pub async fn pause_on(client: &SpotifyClient, env: &Environment, device_id: &str) -> Result<()> {
    let token = env.access_token().await?;

    info!("Pausing playback of {} on {}", env.kind(), device_id);
    let request = client
        .request(Method::PUT, "/me/player/pause", &token)
        .json(&json!({ "device_id": device_id }));
    ensure_success(client.send(request).await?).await?;
    Ok(())
}

/// Sets the volume of the active device.
pub async fn set_volume(client: &SpotifyClient, env: &Environment, percent: u8) -> Result<()> {
    let device = devices::active_device(client, env).await?;
    set_device_volume(client, env, &device, percent).await
}

/// Sets the volume of a specific device.
///
/// # Errors
///
/// - `Validation` when `percent` is above 100
/// - `Unsupported` when the device cannot report or change its volume; no
///   call is made in that case
pub async fn set_device_volume(
    client: &SpotifyClient,
    env: &Environment,
    device: &Device,
    percent: u8,
) -> Result<()> {
    if percent > 100 {
        return Err(GatewayError::Validation(format!(
            "volume must be between 0 and 100, got {percent}"
        )));
    }

    if !device.supports_volume {
        return Err(GatewayError::Unsupported(format!(
            "device '{}' does not support volume control",
            device.name
        )));
    }

    let token = env.access_token().await?;
    info!("Setting volume of {} to {}%", device.name, percent);

    let mut query = vec![("volume_percent", percent.to_string())];
    query.extend(device_query(&device.id));
    let request = client
        .request(Method::PUT, "/me/player/volume", &token)
        .query(&query);
    ensure_success(client.send(request).await?).await?;
    Ok(())
}

/// Starts a playlist, by default at a random track.
///
/// Without an explicit offset the playlist size is looked up once and the
/// start track is drawn uniformly from it. The volume is applied first when
/// the device supports it. Shuffle and repeat (`context`) are switched on
/// [`SHUFFLE_REPEAT_DELAY`] later on a background task; failures there are
/// only logged.
pub async fn play_playlist(
    client: &SpotifyClient,
    env: &Arc<Environment>,
    scheduler: &Scheduler,
    request: PlaylistRequest,
) -> Result<()> {
    let device = devices::target_device(client, env, request.device_name.as_deref()).await?;

    let offset = match request.offset {
        Some(offset) => offset,
        None => {
            let playlist_id = playlist::parse_playlist_id(&request.context_uri)?;
            let total = playlist::track_count(client, env, &playlist_id).await?;
            utils::random_offset(total)
        }
    };

    if device.supports_volume {
        if let Err(e) = set_device_volume(client, env, &device, request.volume_percent).await {
            warn!("Could not set volume before playing: {}", e);
        }
    } else {
        debug!("Device {} has no volume control, skipping volume", device.name);
    }

    info!(
        "Playing list {} at track {} on {}",
        request.context_uri, offset, device.name
    );
    let token = env.access_token().await?;
    let body = json!({
        "context_uri": request.context_uri,
        "position_ms": 0,
        "offset": { "position": offset },
    });
    let play = client
        .request(Method::PUT, "/me/player/play", &token)
        .query(&device_query(&device.id))
        .json(&body);
    ensure_success(client.send(play).await?).await?;

    let client = client.clone();
    let env = Arc::clone(env);
    let device_id = device.id;
    scheduler.run_after(SHUFFLE_REPEAT_DELAY, async move {
        toggle_shuffle(&client, &env, &device_id, true).await;
        enable_repeat(&client, &env, &device_id, RepeatState::Context).await;
    });

    Ok(())
}

/// Switches shuffle on or off. Best effort: failures are logged.
pub async fn toggle_shuffle(client: &SpotifyClient, env: &Environment, device_id: &str, on: bool) {
    let result = async {
        let token = env.access_token().await?;
        let mut query = vec![("state", on.to_string())];
        query.extend(device_query(device_id));
        let request = client
            .request(Method::PUT, "/me/player/shuffle", &token)
            .query(&query);
        ensure_success(client.send(request).await?).await?;
        Ok::<_, GatewayError>(())
    }
    .await;

    match result {
        Ok(()) => debug!("Shuffle set to {} on {}", on, env.kind()),
        Err(e) => warn!("Failed to set shuffle on {}: {}", env.kind(), e),
    }
}

/// Sets the repeat mode. Best effort: failures are logged.
pub async fn enable_repeat(
    client: &SpotifyClient,
    env: &Environment,
    device_id: &str,
    state: RepeatState,
) {
    let result = async {
        let token = env.access_token().await?;
        let mut query = vec![("state", state.as_str().to_string())];
        query.extend(device_query(device_id));
        let request = client
            .request(Method::PUT, "/me/player/repeat", &token)
            .query(&query);
        ensure_success(client.send(request).await?).await?;
        Ok::<_, GatewayError>(())
    }
    .await;

    match result {
        Ok(()) => debug!("Repeat set to {} on {}", state.as_str(), env.kind()),
        Err(e) => warn!("Failed to set repeat on {}: {}", env.kind(), e),
    }
}
