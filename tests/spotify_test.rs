mod common;

use std::time::Duration;

use homelink::{
    error::GatewayError,
    scheduler::Scheduler,
    spotify::{
        auth, devices,
        player::{self, PlaylistRequest, SHUFFLE_REPEAT_DELAY},
    },
    types::{Device, EnvironmentKind},
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

async fn mount_devices(server: &MockServer, token: &str, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .and(header("authorization", common::bearer(token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": devices })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_refresh_replaces_access_token() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "old", &[]).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = auth::refresh(&client, &env).await.unwrap();
    assert_eq!(token, "fresh");
    assert_eq!(env.access_token().await.unwrap(), "fresh");
    assert_eq!(env.refresh_token().await.unwrap(), "old-refresh");

    let on_disk = std::fs::read_to_string(dir.path().join(".tokens-home.txt")).unwrap();
    assert_eq!(on_disk, "access_token:fresh\nrefresh_token:old-refresh\n");
}

#[tokio::test]
async fn test_refresh_rejected() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "old", &[]).await;

    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"error\":\"invalid_grant\"}"))
        .mount(&server)
        .await;

    match auth::refresh(&client, &env).await {
        Err(GatewayError::Auth { reason }) => {
            assert!(reason.contains("400"));
            assert!(reason.contains("invalid_grant"));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(env.access_token().await.unwrap(), "old");
}

#[tokio::test]
async fn test_refresh_without_login_makes_no_call() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = homelink::management::Environment::load(common::settings(
        EnvironmentKind::Main,
        dir.path(),
        &[],
    ))
    .await
    .unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        auth::refresh(&client, &env).await,
        Err(GatewayError::Auth { .. })
    ));
}

#[tokio::test]
async fn test_authorize_url_carries_environment() {
    let dir = tempdir().unwrap();
    let env = common::environment(EnvironmentKind::Main, dir.path(), "a", &[]).await;

    let url = auth::authorize_url(&env).unwrap();
    assert!(url.contains("client_id=main-client"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("state=main"));
    assert!(url.contains("user-modify-playback-state"));
}

#[tokio::test]
async fn test_device_id_lookup() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;

    mount_devices(
        &server,
        "tok",
        json!([
            { "id": "ls-1", "name": "librespot", "is_active": false, "supports_volume": true, "volume_percent": 40 },
            { "id": "tv-1", "name": "TV", "is_active": true, "supports_volume": false, "volume_percent": null }
        ]),
    )
    .await;

    assert_eq!(devices::device_id(&client, &env, "TV").await.unwrap(), "tv-1");
    assert!(matches!(
        devices::device_id(&client, &env, "tv").await,
        Err(GatewayError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_device_id_empty_name_makes_no_call() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &[]).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        devices::device_id(&client, &env, "").await,
        Err(GatewayError::Validation(_))
    ));
}

#[tokio::test]
async fn test_active_device_falls_back_to_configured_device() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;

    mount_devices(
        &server,
        "tok",
        json!([
            { "id": "tv-1", "name": "TV", "is_active": false },
            { "id": "ls-1", "name": "librespot", "is_active": false, "supports_volume": true }
        ]),
    )
    .await;

    let device = devices::active_device(&client, &env).await.unwrap();
    assert_eq!(device.name, "librespot");
    assert_eq!(device.id, "ls-1");
}

#[tokio::test]
async fn test_volume_on_unsupported_device_makes_no_call() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Main, dir.path(), "tok", &[]).await;

    Mock::given(method("PUT"))
        .and(path("/me/player/volume"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let phone = Device {
        id: "phone-1".to_string(),
        name: "iPhone".to_string(),
        is_active: true,
        supports_volume: false,
        volume_percent: None,
    };
    assert!(matches!(
        player::set_device_volume(&client, &env, &phone, 50).await,
        Err(GatewayError::Unsupported(_))
    ));

    let speaker = Device {
        supports_volume: true,
        ..phone
    };
    assert!(matches!(
        player::set_device_volume(&client, &env, &speaker, 101).await,
        Err(GatewayError::Validation(_))
    ));
}

#[tokio::test]
async fn test_idle_account_has_empty_playback() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Main, dir.path(), "tok", &[]).await;

    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let playback = player::current_playback(&client, &env).await.unwrap();
    assert!(!playback.is_playing);
    assert_eq!(playback.context_uri(), "");
}

#[tokio::test]
async fn test_pause_sends_device_id() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;

    mount_devices(
        &server,
        "tok",
        json!([{ "id": "ls-1", "name": "librespot", "is_active": true }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/pause"))
        .and(body_json(json!({ "device_id": "ls-1" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    player::pause(&client, &env, None).await.unwrap();
}

#[tokio::test]
async fn test_single_track_playlist_starts_at_zero() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;
    let scheduler = Scheduler::new();

    mount_devices(
        &server,
        "tok",
        json!([{ "id": "ls-1", "name": "librespot", "is_active": true, "supports_volume": true, "volume_percent": 20 }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/playlists/pl1"))
        .and(query_param("fields", "tracks.total"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tracks": { "total": 1 } })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/volume"))
        .and(query_param("volume_percent", "80"))
        .and(query_param("device_id", "ls-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .and(query_param("device_id", "ls-1"))
        .and(body_json(json!({
            "context_uri": "spotify:playlist:pl1",
            "position_ms": 0,
            "offset": { "position": 0 },
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/shuffle"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let request = PlaylistRequest {
        context_uri: "spotify:playlist:pl1".to_string(),
        volume_percent: 80,
        device_name: None,
        offset: None,
    };
    player::play_playlist(&client, &env, &scheduler, request)
        .await
        .unwrap();

    assert_eq!(scheduler.pending(), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_playlist_enables_shuffle_and_repeat_after_delay() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;
    let scheduler = Scheduler::new();

    mount_devices(
        &server,
        "tok",
        json!([{ "id": "ls-1", "name": "librespot", "is_active": true }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/shuffle"))
        .and(query_param("state", "true"))
        .and(query_param("device_id", "ls-1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/repeat"))
        .and(query_param("state", "context"))
        .and(query_param("device_id", "ls-1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = PlaylistRequest {
        context_uri: "spotify:playlist:pl1".to_string(),
        volume_percent: 80,
        device_name: None,
        offset: Some(3),
    };
    player::play_playlist(&client, &env, &scheduler, request)
        .await
        .unwrap();

    // Nothing fires before the delay is over.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let early = server.received_requests().await.unwrap();
    assert!(!early.iter().any(|r| r.url.path() == "/me/player/shuffle"));

    let deadline = tokio::time::Instant::now() + SHUFFLE_REPEAT_DELAY + Duration::from_secs(3);
    while scheduler.pending() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(scheduler.pending(), 0);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_playlist_rejects_non_playlist_uri() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);
    let env = common::environment(EnvironmentKind::Home, dir.path(), "tok", &["librespot"]).await;
    let scheduler = Scheduler::new();

    mount_devices(
        &server,
        "tok",
        json!([{ "id": "ls-1", "name": "librespot", "is_active": true }]),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/me/player/play"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let request = PlaylistRequest {
        context_uri: "spotify:album:abc".to_string(),
        volume_percent: 50,
        device_name: None,
        offset: None,
    };
    assert!(matches!(
        player::play_playlist(&client, &env, &scheduler, request).await,
        Err(GatewayError::Validation(_))
    ));
    assert_eq!(scheduler.pending(), 0);
}
