use thiserror::Error;

/// Unified error type for the gateway.
///
/// Every Spotify, machine and configuration failure ends up here so the
/// HTTP layer can map it to a status code in one place.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An environment could not be built from its configuration.
    #[error("environment {environment} is not configured: {reason}")]
    Configuration { environment: String, reason: String },

    /// Token exchange or refresh failed, or no token is on file.
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    /// Unknown device, environment or machine.
    #[error("not found: {0}")]
    NotFound(String),

    /// Spotify answered with a non-success status.
    #[error("Spotify API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Missing or malformed input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The target cannot perform the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A playback transfer could not be completed.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A local or remote shell command failed.
    #[error("command failed: {0}")]
    Command(String),

    #[error("network request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn auth(reason: impl Into<String>) -> Self {
        GatewayError::Auth {
            reason: reason.into(),
        }
    }

    pub fn configuration(environment: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::Configuration {
            environment: environment.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results with `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;
