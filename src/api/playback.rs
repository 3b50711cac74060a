use axum::{
    Extension,
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    api::SessionEnvironment,
    error::{GatewayError, Result},
    server::AppState,
    spotify::{
        devices,
        player::{self, PlaylistRequest},
    },
};

const DEFAULT_PLAYLIST_VOLUME: u8 = 80;

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    uri: Option<String>,
    volume: Option<String>,
    device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeQuery {
    percentage: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_percent(value: &str, field: &str) -> Result<u8> {
    value
        .parse::<u8>()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| GatewayError::Validation(format!("{field} must be a number between 0 and 100")))
}

pub async fn play(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<Value>> {
    let device = non_empty(query.device_name);
    player::play(state.client(), &env, device.as_deref()).await?;

    Ok(Json(json!({ "message": "Music playing successfully" })))
}

pub async fn pause(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<Value>> {
    let device = non_empty(query.device_name);
    player::pause(state.client(), &env, device.as_deref()).await?;

    Ok(Json(json!({ "message": "Music paused successfully" })))
}

pub async fn playlist(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
    Query(query): Query<PlaylistQuery>,
) -> Result<Json<Value>> {
    let uri = non_empty(query.uri)
        .ok_or_else(|| GatewayError::Validation("URI is required".to_string()))?;
    let volume = match non_empty(query.volume) {
        Some(v) => parse_percent(&v, "volume")?,
        None => DEFAULT_PLAYLIST_VOLUME,
    };

    let request = PlaylistRequest {
        context_uri: uri,
        volume_percent: volume,
        device_name: non_empty(query.device_name),
        offset: None,
    };
    player::play_playlist(state.client(), &env, &state.scheduler, request).await?;

    Ok(Json(json!({ "message": "Playlist started successfully" })))
}

pub async fn volume(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
    Query(query): Query<VolumeQuery>,
) -> Result<Json<Value>> {
    let percentage = non_empty(query.percentage)
        .ok_or_else(|| GatewayError::Validation("percentage is required".to_string()))?;
    let percent = parse_percent(&percentage, "percentage")?;

    player::set_volume(state.client(), &env, percent).await?;

    Ok(Json(json!({ "message": "Volume set successfully" })))
}

pub async fn devices(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
) -> Result<Json<Value>> {
    let devices = devices::fetch_devices(state.client(), &env).await?;

    Ok(Json(json!({
        "environment": env.kind(),
        "devices": devices,
    })))
}
