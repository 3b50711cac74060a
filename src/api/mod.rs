//! # API Module
//!
//! HTTP handlers of the gateway. Spotify routes share the
//! [`spotify_session`] middleware, which resolves the environment a request
//! acts for and refreshes its access token before the handler runs. The
//! handler receives that environment as a [`SessionEnvironment`] extension.
//!
//! ## Endpoints
//!
//! ### Spotify
//!
//! - [`login`] / [`callback`] - OAuth authorization code flow per environment
//! - [`play`], [`pause`], [`volume`] - basic playback control
//! - [`playlist`] - starts a playlist at a random track
//! - [`schedule`] - alarm and sleep timers
//! - [`transfer`] - moves playback between devices and accounts
//! - [`devices`] - live device list of the environment
//!
//! ### Home
//!
//! - [`toggle_lamp`] - flips the GPIO lamp
//! - [`wake`], [`sleep`], [`battery`] - machine management over the tailnet
//!
//! ### Monitoring
//!
//! - [`health`] - service status, current environment and pending tasks
//!
//! ## Errors
//!
//! Handlers return [`GatewayError`], rendered as `{"error": "..."}` with the
//! status code of its kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::GatewayError;

mod auth;
mod health;
mod home;
mod playback;
mod schedule;
mod session;
mod transfer;

pub use auth::{callback, login};
pub use health::health;
pub use home::{battery, sleep, toggle_lamp, wake};
pub use playback::{devices, pause, play, playlist, volume};
pub use schedule::schedule;
pub use session::{SessionEnvironment, spotify_session};
pub use transfer::transfer;

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Auth { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Api { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unsupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Transfer(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Command(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Http(_) | GatewayError::Json(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
