use tabled::Table;

use crate::{
    error, info,
    management::EnvironmentRegistry,
    spotify::{self, SpotifyClient},
    types::{DeviceTableRow, EnvironmentKind},
    warning,
};

pub async fn devices(kind: EnvironmentKind) {
    let client = match SpotifyClient::from_config() {
        Ok(c) => c,
        Err(e) => error!("Cannot build Spotify client. Err: {}", e),
    };
    let registry = EnvironmentRegistry::from_config(client);

    let env = match registry.environment(kind).await {
        Ok(env) => env,
        Err(e) => error!("{}", e),
    };

    if let Err(e) = spotify::auth::refresh(registry.client(), &env).await {
        error!("Cannot refresh token of {}. Run `login` first. Err: {}", kind, e);
    }

    match spotify::devices::fetch_devices(registry.client(), &env).await {
        Ok(devices) if devices.is_empty() => {
            info!("No devices of {} are online", kind)
        }
        Ok(devices) => {
            let rows: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => warning!("Failed to load devices. Err: {}", e),
    }
}
