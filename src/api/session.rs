use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::{GatewayError, Result},
    management::Environment,
    server::AppState,
    spotify,
};

/// The environment a Spotify request acts for, with a fresh access token.
#[derive(Clone)]
pub struct SessionEnvironment(pub Arc<Environment>);

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    env: Option<String>,
    device_name: Option<String>,
    from: Option<String>,
}

/// Resolves the target environment and refreshes its token before the
/// handler runs. A failed refresh stops the request with `401`.
pub async fn spotify_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let device = query.device_name.as_deref().or(query.from.as_deref());
    let env = state.registry.resolve(query.env.as_deref(), device).await?;

    if let Err(e) = spotify::auth::refresh(state.client(), &env).await {
        warn!("Error refreshing token of {}: {}", env.kind(), e);
        return Err(match e {
            GatewayError::Auth { .. } => e,
            other => GatewayError::auth(other.to_string()),
        });
    }

    request.extensions_mut().insert(SessionEnvironment(env));
    Ok(next.run(request).await)
}
