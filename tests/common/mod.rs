#![allow(dead_code)]

use std::{path::Path, sync::Arc, time::Duration};

use homelink::{
    management::{Environment, EnvironmentSettings},
    spotify::SpotifyClient,
    types::{EnvironmentKind, Tokens},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

pub const TOKEN_PATH: &str = "/api/token";

pub fn client(server: &MockServer) -> SpotifyClient {
    SpotifyClient::new(
        server.uri(),
        format!("{}{}", server.uri(), TOKEN_PATH),
        Duration::from_secs(5),
    )
    .expect("client")
}

pub fn settings(kind: EnvironmentKind, dir: &Path, devices: &[&str]) -> EnvironmentSettings {
    EnvironmentSettings {
        kind,
        client_id: Some(format!("{kind}-client")),
        client_secret: Some(format!("{kind}-secret")),
        callback_uri: Some("http://localhost:8080/spotify/callback".to_string()),
        devices: devices.iter().map(|d| d.to_string()).collect(),
        tokens_path: dir.join(format!(".tokens-{kind}.txt")),
    }
}

/// Environment holding `<access>` as access token and `<access>-refresh` as refresh token.
pub async fn environment(
    kind: EnvironmentKind,
    dir: &Path,
    access: &str,
    devices: &[&str],
) -> Arc<Environment> {
    let env = Environment::load(settings(kind, dir, devices))
        .await
        .expect("environment");
    env.set_tokens(Tokens {
        access_token: access.to_string(),
        refresh_token: format!("{access}-refresh"),
    })
    .await
    .expect("tokens");
    Arc::new(env)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Answers refreshes of `access`'s refresh token with the same access token.
pub async fn mount_refresh(server: &MockServer, access: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("refresh_token={access}-refresh")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}
