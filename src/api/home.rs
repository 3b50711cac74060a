use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    error::{GatewayError, Result},
    server::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MachineQuery {
    name: Option<String>,
}

impl MachineQuery {
    fn name(self) -> Result<String> {
        self.name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| GatewayError::Validation("machine name is required".to_string()))
    }
}

pub async fn toggle_lamp(State(state): State<AppState>) -> Result<Json<Value>> {
    let status = state.lamp.toggle().await?;
    Ok(Json(json!({ "status": status })))
}

pub async fn wake(
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> Result<Json<Value>> {
    let output = state.machines.wake(&query.name()?).await?;
    Ok(Json(json!({ "message": "Machine is waking up", "output": output })))
}

pub async fn sleep(
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> Result<Json<Value>> {
    let output = state.machines.sleep(&query.name()?).await?;
    Ok(Json(json!({ "message": "Machine is going to sleep", "output": output })))
}

pub async fn battery(
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
) -> Result<Json<Value>> {
    let output = state.machines.battery(&query.name()?).await?;
    Ok(Json(json!({ "battery": output.trim() })))
}
