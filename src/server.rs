use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Router, middleware, routing::get};
use tracing::{info, warn};

use crate::{
    api, config,
    error::{GatewayError, Result},
    lamp::Lamp,
    machines::MachineManager,
    management::EnvironmentRegistry,
    scheduler::Scheduler,
    spotify::SpotifyClient,
};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EnvironmentRegistry>,
    pub scheduler: Scheduler,
    pub lamp: Arc<Lamp>,
    pub machines: Arc<MachineManager>,
}

impl AppState {
    pub fn new(
        registry: EnvironmentRegistry,
        scheduler: Scheduler,
        lamp: Lamp,
        machines: MachineManager,
    ) -> Self {
        AppState {
            registry: Arc::new(registry),
            scheduler,
            lamp: Arc::new(lamp),
            machines: Arc::new(machines),
        }
    }

    pub fn from_config() -> Result<Self> {
        let client = SpotifyClient::from_config()?;
        let machines = MachineManager::from_config(client.http().clone());
        Ok(Self::new(
            EnvironmentRegistry::from_config(client),
            Scheduler::new(),
            Lamp::from_config(),
            machines,
        ))
    }

    pub fn client(&self) -> &SpotifyClient {
        self.registry.client()
    }
}

pub fn router(state: AppState) -> Router {
    let session = middleware::from_fn_with_state(state.clone(), api::spotify_session);

    let spotify = Router::new()
        .route("/play", get(api::play))
        .route("/pause", get(api::pause))
        .route("/playlist", get(api::playlist))
        .route("/volume", get(api::volume))
        .route("/schedule", get(api::schedule))
        .route("/transfer", get(api::transfer))
        .route("/devices", get(api::devices))
        .route_layer(session)
        .route("/login", get(api::login))
        .route("/callback", get(api::callback));

    Router::new()
        .route("/health", get(api::health))
        .nest("/spotify", spotify)
        .route("/lamp/toggle", get(api::toggle_lamp))
        .route("/manage/wake", get(api::wake))
        .route("/manage/sleep", get(api::sleep))
        .route("/manage/battery", get(api::battery))
        .with_state(state)
}

pub async fn start_api_server(state: AppState) -> Result<()> {
    let addr = SocketAddr::from_str(&config::server_addr()).map_err(|e| {
        GatewayError::configuration("server", format!("invalid SERVER_ADDRESS: {e}"))
    })?;

    let scheduler = state.scheduler.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cancelling {} background tasks", scheduler.pending());
    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
