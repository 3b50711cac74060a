//! Moving an in-progress playback session between environments.
//!
//! Two strategies exist. [`transfer_playback`] hands the destination the
//! current track plus the whole queue as explicit uris. [`hard_transfer_playback`]
//! is for devices that refuse a raw uri list: it restarts the source's context
//! (playlist) at the same track and position instead.
//!
//! Neither strategy is transactional. When the source was paused but the
//! destination refuses to start, the source stays paused.

use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{GatewayError, Result},
    management::Environment,
    spotify::{SpotifyClient, auth, devices, ensure_success, player, playlist},
    types::{Device, TransferOutcome},
};

/// Volume used on the destination when the source cannot report one.
pub const DEFAULT_TRANSFER_VOLUME: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// [`transfer_playback`]
    Queue,
    /// [`hard_transfer_playback`]
    Hard,
}

impl TransferStrategy {
    /// Hard transfer for destinations listed in `hard_devices`, queue otherwise.
    pub fn for_device(to_device: &str, hard_devices: &[String]) -> Self {
        if hard_devices.iter().any(|d| d == to_device) {
            TransferStrategy::Hard
        } else {
            TransferStrategy::Queue
        }
    }
}

/// Moves the current track and queue from `from` to the device `to_device`
/// of `to`, resuming at the same position.
///
/// # Returns
///
/// - `Transferred` with the number of uris handed over
/// - `NothingPlaying` when the source is idle or its queue is empty; nothing
///   is paused or started in that case
///
/// # Errors
///
/// - `Auth` when the destination token cannot be refreshed (checked first)
/// - `Transfer` when every queued entry lacks a uri
/// - any error of pausing the source; the destination is not touched then
/// - `Transfer` with the response body when the destination refuses to play
pub async fn transfer_playback(
    client: &SpotifyClient,
    from: &Environment,
    to: &Environment,
    to_device: &str,
) -> Result<TransferOutcome> {
    auth::refresh(client, to).await?;

    let playback = player::current_playback(client, from).await?;
    let queue = player::user_queue(client, from).await?;

    if queue.queue.is_empty() || !playback.is_playing {
        info!("Nothing playing on {}, no transfer needed", from.kind());
        return Ok(TransferOutcome::NothingPlaying);
    }

    let uris: Vec<String> = queue
        .currently_playing
        .iter()
        .chain(queue.queue.iter())
        .map(|track| track.uri.clone())
        .filter(|uri| !uri.is_empty())
        .collect();

    if uris.is_empty() {
        return Err(GatewayError::Transfer(
            "no valid URIs to transfer".to_string(),
        ));
    }

    let destination = devices::device_id(client, to, to_device).await?;

    info!("Pausing {} before transfer", from.kind());
    player::pause_on(client, from, &playback.device.id).await?;

    info!(
        "Playing {} tracks on {} ({}) from {} ms",
        uris.len(),
        to_device,
        to.kind(),
        playback.progress_ms
    );
    let token = to.access_token().await?;
    let request = client
        .request(Method::PUT, "/me/player/play", &token)
        .query(&[("device_id", destination.as_str())])
        .json(&json!({
            "uris": uris,
            "position_ms": playback.progress_ms,
        }));
    expect_started(client.send(request).await?).await?;

    Ok(TransferOutcome::Transferred { tracks: uris.len() })
}

/// Restarts the source's context on the destination at the same track.
///
/// Used for destinations that cannot accept a uri list. The track is located
/// by name inside the context playlist; when the name occurs more than once
/// the first occurrence is used, and when it cannot be found playback starts
/// at the first track. The destination gets the source's volume, or
/// [`DEFAULT_TRANSFER_VOLUME`] when the source cannot report one.
///
/// # Errors
///
/// - `Auth` when the destination token cannot be refreshed
/// - `NotFound` when the destination device is unknown; the source keeps
///   playing
/// - any error of pausing the source
/// - `Transfer` when the source plays without a context; this happens after
///   the source was paused and before playback is started on the destination
/// - `Api` when the destination refuses to play
pub async fn hard_transfer_playback(
    client: &SpotifyClient,
    from: &Environment,
    to: &Environment,
    to_device: &str,
) -> Result<()> {
    auth::refresh(client, to).await?;

    let playback = player::current_playback(client, from).await?;
    let volume = transfer_volume(&playback.device);
    let destination = devices::target_device(client, to, Some(to_device)).await?;

    info!("Pausing {} before hard transfer", from.kind());
    player::pause_on(client, from, &playback.device.id).await?;

    let context_uri = playback.context_uri().to_string();
    if context_uri.is_empty() {
        return Err(GatewayError::Transfer(format!(
            "{} is not playing from a context, cannot hard transfer",
            from.kind()
        )));
    }

    let track_name = playback
        .item
        .as_ref()
        .map(|t| t.name.clone())
        .unwrap_or_default();
    let position = match playlist::parse_playlist_id(&context_uri) {
        Ok(playlist_id) => {
            playlist::find_track_position(
                client,
                from,
                &playlist_id,
                &track_name,
                playlist::TRACKS_PAGE_SIZE,
            )
            .await?
        }
        Err(_) => {
            warn!("Context {} is not a playlist, starting at its first track", context_uri);
            0
        }
    };

    if let Err(e) = player::set_device_volume(client, to, &destination, volume).await {
        warn!("Could not set volume on {}: {}", to_device, e);
    }

    info!(
        "Playing {} at track {} on {} ({}) from {} ms",
        context_uri,
        position,
        to_device,
        to.kind(),
        playback.progress_ms
    );
    let token = to.access_token().await?;
    let request = client
        .request(Method::PUT, "/me/player/play", &token)
        .query(&[("device_id", destination.id.as_str())])
        .json(&json!({
            "context_uri": context_uri,
            "offset": { "position": position },
            "position_ms": playback.progress_ms,
        }));
    ensure_success(client.send(request).await?).await?;

    Ok(())
}

fn transfer_volume(source: &Device) -> u8 {
    match (source.supports_volume, source.volume_percent) {
        (true, Some(volume)) => volume,
        _ => DEFAULT_TRANSFER_VOLUME,
    }
}

async fn expect_started(response: reqwest::Response) -> Result<()> {
    match response.status() {
        StatusCode::ACCEPTED | StatusCode::NO_CONTENT => Ok(()),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Transfer(format!(
                "destination refused playback ({status}): {body}"
            )))
        }
    }
}
