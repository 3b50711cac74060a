use std::{future::Future, pin::Pin, sync::Arc};

use axum::{
    Extension,
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::{
    api::SessionEnvironment,
    config,
    error::{GatewayError, Result},
    management::Environment,
    scheduler::Scheduler,
    server::AppState,
    spotify::{
        self, SpotifyClient,
        player::{self, PlaylistRequest},
    },
};

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    action: Option<String>,
    time_millis: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Alarm,
    Sleep,
}

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Builds the scheduled task. The token is refreshed when it fires, since the
/// one refreshed for this request may have expired by then.
fn task(action: Action, client: SpotifyClient, env: Arc<Environment>, scheduler: Scheduler) -> Task {
    Box::pin(async move {
        if let Err(e) = spotify::auth::refresh(&client, &env).await {
            error!("Scheduled {:?} for {} aborted: {}", action, env.kind(), e);
            return;
        }

        let result = match action {
            Action::Alarm => {
                let request = PlaylistRequest {
                    context_uri: config::RELAX_PLAYLIST_URI.to_string(),
                    volume_percent: config::ALARM_VOLUME,
                    device_name: None,
                    offset: None,
                };
                player::play_playlist(&client, &env, &scheduler, request).await
            }
            Action::Sleep => player::pause(&client, &env, None).await,
        };

        match result {
            Ok(()) => info!("Scheduled {:?} for {} done", action, env.kind()),
            Err(e) => error!("Scheduled {:?} for {} failed: {}", action, env.kind(), e),
        }
    })
}

pub async fn schedule(
    State(state): State<AppState>,
    Extension(SessionEnvironment(env)): Extension<SessionEnvironment>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>> {
    let (Some(action), Some(time_millis)) = (query.action, query.time_millis) else {
        return Err(GatewayError::Validation(
            "action and time_millis are required".to_string(),
        ));
    };

    let action = match action.as_str() {
        "alarm" => Action::Alarm,
        "sleep" => Action::Sleep,
        other => {
            return Err(GatewayError::Validation(format!(
                "unknown action '{other}', expected alarm or sleep"
            )));
        }
    };

    let epoch_millis = time_millis
        .parse::<i64>()
        .map_err(|_| GatewayError::Validation("time_millis must be an integer".to_string()))?;

    let job = task(
        action,
        state.client().clone(),
        env,
        state.scheduler.clone(),
    );

    if state.scheduler.schedule(epoch_millis, job) {
        Ok(Json(json!({ "message": "Schedule set successfully", "scheduled": true })))
    } else {
        Ok(Json(json!({
            "message": "time_millis is in the past, nothing scheduled",
            "scheduled": false,
        })))
    }
}
