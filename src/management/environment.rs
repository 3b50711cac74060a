use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    error::{GatewayError, Result},
    management::TokenStore,
    types::{Device, EnvironmentKind, Tokens},
};

/// Raw settings for one environment, as read from configuration.
#[derive(Debug, Clone)]
pub struct EnvironmentSettings {
    pub kind: EnvironmentKind,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub callback_uri: Option<String>,
    pub devices: Vec<String>,
    pub tokens_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub callback_uri: String,
}

/// One Spotify identity with its devices and tokens.
///
/// Shared between requests behind an `Arc`; token and device state are
/// updated in place.
#[derive(Debug)]
pub struct Environment {
    kind: EnvironmentKind,
    credentials: Credentials,
    store: TokenStore,
    devices: RwLock<Vec<Device>>,
    tokens: RwLock<Option<Tokens>>,
}

impl Environment {
    /// Validates `settings` and loads the token file when there is one.
    pub async fn load(settings: EnvironmentSettings) -> Result<Self> {
        let kind = settings.kind;
        let require = |value: Option<String>, suffix: &str| {
            value.ok_or_else(|| {
                GatewayError::configuration(
                    kind.as_str(),
                    format!("{}{} is not set", kind.config_prefix(), suffix),
                )
            })
        };

        let credentials = Credentials {
            client_id: require(settings.client_id, "SP_CLIENT_ID")?,
            client_secret: require(settings.client_secret, "SP_CLIENT_SECRET")?,
            callback_uri: require(settings.callback_uri, "SP_CALLBACK_URI")?,
        };

        let store = TokenStore::new(settings.tokens_path);
        let tokens = if store.exists() {
            match store.read().await {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    warn!(
                        "Ignoring token file {} of {}: {}",
                        store.path().display(),
                        kind,
                        e
                    );
                    None
                }
            }
        } else {
            debug!(
                "No token file at {} for {} yet, login required",
                store.path().display(),
                kind
            );
            None
        };

        Ok(Environment {
            kind,
            credentials,
            store,
            devices: RwLock::new(settings.devices.into_iter().map(Device::named).collect()),
            tokens: RwLock::new(tokens),
        })
    }

    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn access_token(&self) -> Result<String> {
        match self.tokens.read().await.as_ref() {
            Some(tokens) if !tokens.access_token.is_empty() => Ok(tokens.access_token.clone()),
            _ => Err(GatewayError::auth(format!(
                "no access token for {}, login first",
                self.kind
            ))),
        }
    }

    pub async fn refresh_token(&self) -> Result<String> {
        match self.tokens.read().await.as_ref() {
            Some(tokens) if !tokens.refresh_token.is_empty() => Ok(tokens.refresh_token.clone()),
            _ => Err(GatewayError::auth(format!(
                "no refresh token for {}, login first",
                self.kind
            ))),
        }
    }

    /// Replaces both tokens and persists them.
    pub async fn set_tokens(&self, tokens: Tokens) -> Result<()> {
        self.store.write(&tokens).await?;
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    /// Replaces the access token, keeping the refresh token, and persists.
    pub async fn set_access_token(&self, access_token: String) -> Result<()> {
        let mut guard = self.tokens.write().await;
        let tokens = Tokens {
            access_token,
            refresh_token: guard
                .as_ref()
                .map(|t| t.refresh_token.clone())
                .unwrap_or_default(),
        };
        self.store.write(&tokens).await?;
        *guard = Some(tokens);
        Ok(())
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.devices.read().await.clone()
    }

    pub async fn has_device(&self, name: &str) -> bool {
        self.devices.read().await.iter().any(|d| d.name == name)
    }

    /// Folds a live device list into the known devices.
    ///
    /// Ids and state of configured devices are refreshed by name; devices
    /// missing from the live list are marked inactive. An environment without
    /// configured devices adopts the live list.
    pub async fn merge_live_devices(&self, live: &[Device]) {
        let mut devices = self.devices.write().await;

        if devices.is_empty() {
            *devices = live.to_vec();
            return;
        }

        for known in devices.iter_mut() {
            match live.iter().find(|d| d.name == known.name) {
                Some(found) => *known = found.clone(),
                None => known.is_active = false,
            }
        }
    }
}
