use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    config,
    error::{GatewayError, Result},
    management::{Environment, EnvironmentSettings},
    spotify::{self, SpotifyClient},
    types::EnvironmentKind,
};

/// Lazily built, deduplicated set of environments plus the
/// "current environment" pointer.
///
/// Creation is serialized behind one lock, so two first references to the
/// same environment still build a single instance. The current pointer is a
/// single value with last-writer-wins semantics, which is all a one-user
/// gateway needs.
pub struct EnvironmentRegistry {
    client: SpotifyClient,
    settings: Vec<EnvironmentSettings>,
    environments: Mutex<HashMap<EnvironmentKind, Arc<Environment>>>,
    current: RwLock<Option<EnvironmentKind>>,
}

impl EnvironmentRegistry {
    pub fn new(client: SpotifyClient, settings: Vec<EnvironmentSettings>) -> Self {
        EnvironmentRegistry {
            client,
            settings,
            environments: Mutex::new(HashMap::new()),
            current: RwLock::new(None),
        }
    }

    pub fn from_config(client: SpotifyClient) -> Self {
        let settings = EnvironmentKind::ALL
            .into_iter()
            .map(config::environment_settings)
            .collect();
        Self::new(client, settings)
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    /// Returns the environment of `kind`, building it on first use.
    pub async fn environment(&self, kind: EnvironmentKind) -> Result<Arc<Environment>> {
        let mut environments = self.environments.lock().await;

        if let Some(env) = environments.get(&kind) {
            debug!("Returning existing {} environment", kind);
            return Ok(Arc::clone(env));
        }

        let settings = self
            .settings
            .iter()
            .find(|s| s.kind == kind)
            .cloned()
            .ok_or_else(|| GatewayError::configuration(kind.as_str(), "no settings registered"))?;

        info!("Creating {} environment", kind);
        let env = Arc::new(Environment::load(settings).await?);
        environments.insert(kind, Arc::clone(&env));
        Ok(env)
    }

    /// Picks the environment a request targets.
    ///
    /// An explicit environment name wins, then the owner of `device_name`,
    /// then the current environment, then `home`. The result becomes the
    /// current environment.
    pub async fn resolve(
        &self,
        env_name: Option<&str>,
        device_name: Option<&str>,
    ) -> Result<Arc<Environment>> {
        let env = if let Some(name) = env_name.filter(|n| !n.is_empty()) {
            self.environment(name.parse()?).await?
        } else if let Some(device) = device_name.filter(|n| !n.is_empty()) {
            self.find_by_device(device).await?
        } else {
            let kind = self.current.read().await.unwrap_or(EnvironmentKind::Home);
            self.environment(kind).await?
        };

        self.set_current(env.kind()).await;
        Ok(env)
    }

    /// Finds the environment owning a device name.
    ///
    /// Environments without known devices fetch their live list first.
    /// Environments that cannot be built or reached are skipped.
    pub async fn find_by_device(&self, name: &str) -> Result<Arc<Environment>> {
        for settings in &self.settings {
            let env = match self.environment(settings.kind).await {
                Ok(env) => env,
                Err(e) => {
                    warn!("Skipping {} while looking for {}: {}", settings.kind, name, e);
                    continue;
                }
            };

            if env.devices().await.is_empty() {
                if let Err(e) = self.load_live_devices(&env).await {
                    warn!("Could not load devices of {}: {}", env.kind(), e);
                    continue;
                }
            }

            if env.has_device(name).await {
                debug!("Device {} belongs to {}", name, env.kind());
                return Ok(env);
            }
        }

        Err(GatewayError::NotFound(format!("device '{name}'")))
    }

    async fn load_live_devices(&self, env: &Environment) -> Result<()> {
        spotify::auth::refresh(&self.client, env).await?;
        spotify::devices::fetch_devices(&self.client, env).await?;
        Ok(())
    }

    pub async fn current(&self) -> Option<Arc<Environment>> {
        let kind = (*self.current.read().await)?;
        self.environments.lock().await.get(&kind).cloned()
    }

    pub async fn set_current(&self, kind: EnvironmentKind) {
        let mut current = self.current.write().await;
        if *current != Some(kind) {
            info!("Setting current environment to {}", kind);
        }
        *current = Some(kind);
    }
}
