use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use crate::{
    config,
    error::{GatewayError, Result},
    management::Environment,
    spotify::SpotifyClient,
    types::{TokenResponse, Tokens},
};

/// Permissions requested for every environment.
pub const SCOPES: [&str; 5] = [
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "app-remote-control",
    "user-read-recently-played",
];

/// Builds the Spotify authorization URL for an environment.
///
/// The environment name travels in the OAuth `state` parameter so the
/// callback knows which identity the code belongs to, even when the login
/// was started outside the server (e.g. from the CLI).
///
/// # Errors
///
/// Returns a configuration error when the authorization endpoint is not a
/// valid URL.
pub fn authorize_url(env: &Environment) -> Result<String> {
    let credentials = env.credentials();
    let url = Url::parse_with_params(
        &config::spotify_apiauth_url(),
        &[
            ("client_id", credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", credentials.callback_uri.as_str()),
            ("scope", SCOPES.join(" ").as_str()),
            ("state", env.kind().as_str()),
        ],
    )
    .map_err(|e| GatewayError::configuration(env.kind().as_str(), e.to_string()))?;

    Ok(url.to_string())
}

/// Exchanges an authorization code for a token pair and persists it.
///
/// Completes the OAuth authorization code flow using the environment's
/// client credentials. Both tokens are written to the environment's token
/// file before returning.
///
/// # Errors
///
/// - `Auth` when Spotify rejects the code (carries status and body)
/// - `Auth` when the response holds no refresh token
/// - `Http`/`Io` for network or persistence failures
pub async fn exchange_code(client: &SpotifyClient, env: &Environment, code: &str) -> Result<Tokens> {
    let credentials = env.credentials();
    info!("Exchanging authorization code for {}", env.kind());

    let response = client
        .http()
        .post(client.token_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", credentials.callback_uri.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await?;

    let token = read_token_response(response).await?;
    let tokens = Tokens {
        access_token: token.access_token,
        refresh_token: token
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::auth("no refresh token in token response"))?,
    };

    env.set_tokens(tokens.clone()).await?;
    Ok(tokens)
}

/// Refreshes the access token of an environment.
///
/// Posts the stored refresh token together with the client credentials to
/// the token endpoint. On success the new access token replaces the old one
/// in memory and on disk; the refresh token is kept as it is.
///
/// # Returns
///
/// The new access token.
///
/// # Errors
///
/// - `Auth` when no refresh token is on file
/// - `Auth` with status and raw body when Spotify does not answer 200
/// - `Http` for network failures, including the client timeout
pub async fn refresh(client: &SpotifyClient, env: &Environment) -> Result<String> {
    let refresh_token = env.refresh_token().await?;
    let credentials = env.credentials();
    debug!("Refreshing access token for {}", env.kind());

    let response = client
        .http()
        .post(client.token_url())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await?;

    let token = read_token_response(response).await?;
    env.set_access_token(token.access_token.clone()).await?;

    info!("Access token refreshed for {}", env.kind());
    Ok(token.access_token)
}

async fn read_token_response(response: reqwest::Response) -> Result<TokenResponse> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::auth(format!("bad response ({status}): {body}")));
    }

    let token: TokenResponse = response.json().await?;
    if token.access_token.is_empty() {
        return Err(GatewayError::auth("no access token in response"));
    }

    Ok(token)
}
