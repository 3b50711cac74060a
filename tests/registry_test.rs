mod common;

use std::sync::Arc;

use homelink::{
    error::GatewayError,
    management::EnvironmentRegistry,
    types::EnvironmentKind,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn offline_client() -> homelink::spotify::SpotifyClient {
    homelink::spotify::SpotifyClient::new(
        "http://127.0.0.1:9",
        "http://127.0.0.1:9/api/token",
        std::time::Duration::from_millis(200),
    )
    .unwrap()
}

#[tokio::test]
async fn test_environment_is_built_once() {
    let dir = tempdir().unwrap();
    let registry = EnvironmentRegistry::new(
        offline_client(),
        vec![common::settings(EnvironmentKind::Home, dir.path(), &["librespot"])],
    );

    let (a, b) = tokio::join!(
        registry.environment(EnvironmentKind::Home),
        registry.environment(EnvironmentKind::Home)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));

    let c = registry.environment(EnvironmentKind::Home).await.unwrap();
    assert!(Arc::ptr_eq(&a, &c));
}

#[tokio::test]
async fn test_missing_credentials_only_affect_their_environment() {
    let dir = tempdir().unwrap();
    let mut main = common::settings(EnvironmentKind::Main, dir.path(), &[]);
    main.client_secret = None;

    let registry = EnvironmentRegistry::new(
        offline_client(),
        vec![
            common::settings(EnvironmentKind::Home, dir.path(), &["librespot"]),
            main,
        ],
    );

    match registry.environment(EnvironmentKind::Main).await {
        Err(GatewayError::Configuration { environment, reason }) => {
            assert_eq!(environment, "main");
            assert!(reason.contains("MAIN_SP_CLIENT_SECRET"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }

    assert!(registry.environment(EnvironmentKind::Home).await.is_ok());
}

#[tokio::test]
async fn test_resolve_defaults_to_home_and_tracks_current() {
    let dir = tempdir().unwrap();
    let registry = EnvironmentRegistry::new(
        offline_client(),
        vec![
            common::settings(EnvironmentKind::Home, dir.path(), &["librespot"]),
            common::settings(EnvironmentKind::Main, dir.path(), &["iPhone"]),
        ],
    );

    assert!(registry.current().await.is_none());

    let env = registry.resolve(None, None).await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Home);
    assert_eq!(registry.current().await.unwrap().kind(), EnvironmentKind::Home);

    let env = registry.resolve(Some("main"), None).await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Main);

    let env = registry.resolve(None, None).await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Main);
}

#[tokio::test]
async fn test_resolve_by_configured_device() {
    let dir = tempdir().unwrap();
    let registry = EnvironmentRegistry::new(
        offline_client(),
        vec![
            common::settings(EnvironmentKind::Home, dir.path(), &["librespot"]),
            common::settings(EnvironmentKind::Main, dir.path(), &["iPhone", "MacBook"]),
        ],
    );

    let env = registry.resolve(None, Some("MacBook")).await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Main);

    let env = registry.resolve(None, Some("librespot")).await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Home);

    let explicit = registry.resolve(Some("main"), Some("librespot")).await.unwrap();
    assert_eq!(explicit.kind(), EnvironmentKind::Main);
}

#[tokio::test]
async fn test_unknown_environment_and_device() {
    let dir = tempdir().unwrap();
    let registry = EnvironmentRegistry::new(
        offline_client(),
        vec![
            common::settings(EnvironmentKind::Home, dir.path(), &["librespot"]),
            common::settings(EnvironmentKind::Main, dir.path(), &["iPhone"]),
        ],
    );

    assert!(matches!(
        registry.resolve(Some("office"), None).await,
        Err(GatewayError::NotFound(_))
    ));
    assert!(matches!(
        registry.find_by_device("Toaster").await,
        Err(GatewayError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_find_by_device_loads_live_devices() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    let client = common::client(&server);

    // Tokens of main land on disk before the registry loads it.
    common::environment(EnvironmentKind::Main, dir.path(), "main-access", &[]).await;
    common::mount_refresh(&server, "main-access").await;

    Mock::given(method("GET"))
        .and(path("/me/player/devices"))
        .and(header("authorization", common::bearer("main-access").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                { "id": "phone-1", "name": "iPhone", "is_active": true, "supports_volume": false }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = EnvironmentRegistry::new(
        client,
        vec![
            common::settings(EnvironmentKind::Home, dir.path(), &["librespot"]),
            common::settings(EnvironmentKind::Main, dir.path(), &[]),
        ],
    );

    let env = registry.find_by_device("iPhone").await.unwrap();
    assert_eq!(env.kind(), EnvironmentKind::Main);
    assert!(env.has_device("iPhone").await);
}

#[tokio::test]
async fn test_broken_token_file_requires_login() {
    let dir = tempdir().unwrap();
    let settings = common::settings(EnvironmentKind::Main, dir.path(), &["iPhone"]);
    std::fs::write(&settings.tokens_path, "access_token:stale\n").unwrap();

    let env = homelink::management::Environment::load(settings).await.unwrap();

    assert!(matches!(env.access_token().await, Err(GatewayError::Auth { .. })));
    assert!(matches!(env.refresh_token().await, Err(GatewayError::Auth { .. })));
}
