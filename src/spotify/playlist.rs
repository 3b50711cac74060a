use reqwest::Method;
use tracing::{debug, info};

use crate::{
    error::Result,
    management::Environment,
    spotify::{SpotifyClient, ensure_success},
    types::{PlaylistSummary, PlaylistTracksPage},
};

pub use crate::utils::parse_playlist_id;

/// Largest page the playlist tracks endpoint serves.
pub const TRACKS_PAGE_SIZE: u64 = 100;

/// Reads the number of tracks in a playlist (`tracks.total`).
pub async fn track_count(client: &SpotifyClient, env: &Environment, playlist_id: &str) -> Result<u64> {
    let token = env.access_token().await?;
    let request = client
        .request(Method::GET, &format!("/playlists/{playlist_id}"), &token)
        .query(&[("fields", "tracks.total")]);

    let summary = ensure_success(client.send(request).await?)
        .await?
        .json::<PlaylistSummary>()
        .await?;

    debug!("Playlist {} has {} tracks", playlist_id, summary.tracks.total);
    Ok(summary.tracks.total)
}

/// Finds the position of a track, by name, inside a playlist.
///
/// Walks the playlist page by page until a track with that exact name shows
/// up or the listing is exhausted. With duplicate names the first one wins.
///
/// # Returns
///
/// The zero-based position, or 0 when no track matches.
pub async fn find_track_position(
    client: &SpotifyClient,
    env: &Environment,
    playlist_id: &str,
    track_name: &str,
    page_size: u64,
) -> Result<u64> {
    let token = env.access_token().await?;
    let page_size = page_size.clamp(1, TRACKS_PAGE_SIZE);
    let mut offset = 0;

    loop {
        let request = client
            .request(Method::GET, &format!("/playlists/{playlist_id}/tracks"), &token)
            .query(&[
                ("offset", offset.to_string()),
                ("limit", page_size.to_string()),
                ("fields", "items(track(name)),total".to_string()),
            ]);

        let page = ensure_success(client.send(request).await?)
            .await?
            .json::<PlaylistTracksPage>()
            .await?;

        let found = page
            .items
            .iter()
            .position(|item| item.track.as_ref().is_some_and(|t| t.name == track_name));

        if let Some(index) = found {
            let position = offset + index as u64;
            info!("Track {} found at position {}", track_name, position);
            return Ok(position);
        }

        offset += page_size;
        if page.items.is_empty() || offset >= page.total {
            break;
        }
    }

    debug!("Track {} not found in playlist {}", track_name, playlist_id);
    Ok(0)
}
