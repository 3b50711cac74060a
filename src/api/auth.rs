use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    error::{GatewayError, Result},
    server::AppState,
    spotify,
    types::EnvironmentKind,
};

const ENV_REQUIRED: &str = "You need to pass the account type as a URL argument: env={account type}. It should be either home or main.";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    env: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
    let kind: EnvironmentKind = query
        .env
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| GatewayError::Validation(ENV_REQUIRED.to_string()))?
        .parse()
        .map_err(|_| GatewayError::Validation(ENV_REQUIRED.to_string()))?;

    let env = state.registry.resolve(Some(kind.as_str()), None).await?;
    let url = spotify::auth::authorize_url(&env)?;

    info!("Redirecting {} login to Spotify", kind);
    Ok(Redirect::temporary(&url))
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>> {
    if let Some(error) = query.error {
        return Err(GatewayError::auth(format!("Spotify denied the login: {error}")));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GatewayError::Validation("missing callback code".to_string()))?;

    let env = match query.state.as_deref().map(str::parse::<EnvironmentKind>) {
        Some(Ok(kind)) => {
            let env = state.registry.environment(kind).await?;
            state.registry.set_current(kind).await;
            env
        }
        _ => state.registry.current().await.ok_or_else(|| {
            GatewayError::Validation("missing spotify account type (home or main)".to_string())
        })?,
    };

    spotify::auth::exchange_code(state.client(), &env, &code).await?;

    Ok(Json(json!({
        "message": "Login ready!",
        "environment": env.kind(),
    })))
}
