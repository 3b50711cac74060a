use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, header};
use tracing::debug;

use crate::{
    config,
    error::{GatewayError, Result},
};

/// Thin wrapper over `reqwest` for the Spotify Web API.
///
/// Owns the base URLs and one pooled HTTP client whose timeout applies to
/// every call, and centralizes bearer token injection.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
}

impl SpotifyClient {
    pub fn new(
        api_url: impl Into<String>,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(SpotifyClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
        })
    }

    pub fn from_config() -> Result<Self> {
        Self::new(
            config::spotify_apiurl(),
            config::spotify_apitoken_url(),
            config::http_timeout(),
        )
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Starts an authenticated API request for `path` (e.g. `/me/player`).
    pub fn request(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        let (method, url) = (request.method().clone(), request.url().clone());

        debug!("Making request {} {}", method, url);
        let response = self.http.execute(request).await?;
        debug!("Request {} {} returned {}", method, url.path(), response.status());

        Ok(response)
    }
}

/// Passes 2xx responses through and turns anything else into `Api`.
pub async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Api { status, body })
}
