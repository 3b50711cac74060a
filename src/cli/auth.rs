use crate::{
    config, error, info,
    management::EnvironmentRegistry,
    spotify::{self, SpotifyClient},
    success,
    types::EnvironmentKind,
    warning,
};

/// Opens the Spotify consent page of `kind` in the browser.
///
/// The code comes back to the running gateway's `/spotify/callback`, which
/// stores the tokens.
pub async fn login(kind: EnvironmentKind) {
    let client = match SpotifyClient::from_config() {
        Ok(c) => c,
        Err(e) => error!("Cannot build Spotify client. Err: {}", e),
    };
    let registry = EnvironmentRegistry::from_config(client);

    let env = match registry.environment(kind).await {
        Ok(env) => env,
        Err(e) => error!("{}", e),
    };

    let url = match spotify::auth::authorize_url(&env) {
        Ok(url) => url,
        Err(e) => error!("Cannot build authorization url. Err: {}", e),
    };

    info!(
        "Make sure the gateway is running on {} to receive the callback",
        config::server_addr()
    );

    match webbrowser::open(&url) {
        Ok(_) => success!("Opened Spotify login for {}", kind),
        Err(_) => {
            warning!("Cannot open browser. Please open the following url manually:");
            println!("{}", url);
        }
    }
}
