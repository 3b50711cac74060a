use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    api::SessionEnvironment,
    config,
    error::{GatewayError, Result},
    server::AppState,
    spotify::{
        self,
        transfer::{self, TransferStrategy},
    },
    types::TransferOutcome,
};

#[derive(Debug, Deserialize)]
pub struct TransferQuery {
    from: Option<String>,
    to: Option<String>,
}

/// Moves playback from the device `from` to the device `to`.
///
/// Devices on the hard transfer list cannot take over a queue, so they
/// restart the source playlist at the current track instead.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(SessionEnvironment(session)): Extension<SessionEnvironment>,
    Query(query): Query<TransferQuery>,
) -> Result<Json<Value>> {
    let (Some(from), Some(to)) = (
        query.from.filter(|f| !f.is_empty()),
        query.to.filter(|t| !t.is_empty()),
    ) else {
        return Err(GatewayError::Validation(
            "from and to devices are required".to_string(),
        ));
    };

    let client = state.client();
    let from_env = state.registry.find_by_device(&from).await?;
    if !Arc::ptr_eq(&from_env, &session) {
        spotify::auth::refresh(client, &from_env).await?;
    }
    let to_env = state.registry.find_by_device(&to).await?;

    info!(
        "Transferring playback from {} ({}) to {} ({})",
        from,
        from_env.kind(),
        to,
        to_env.kind()
    );

    let strategy = TransferStrategy::for_device(&to, &config::hard_transfer_devices());
    if strategy == TransferStrategy::Hard {
        transfer::hard_transfer_playback(client, &from_env, &to_env, &to).await?;
        return Ok(Json(json!({
            "message": "Playback transferred successfully",
            "mode": "hard",
        })));
    }

    match transfer::transfer_playback(client, &from_env, &to_env, &to).await? {
        TransferOutcome::Transferred { tracks } => Ok(Json(json!({
            "message": "Playback transferred successfully",
            "mode": "queue",
            "tracks": tracks,
        }))),
        TransferOutcome::NothingPlaying => Ok(Json(json!({
            "message": "Nothing is playing, no need to transfer",
        }))),
    }
}
