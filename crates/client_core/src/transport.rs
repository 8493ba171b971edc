use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    error::ApiError,
    protocol::{
        DiscoveryInfo, LoginRequest, LoginResponse, VersionsResponse, LOGIN_PATH, VERSIONS_PATH,
        WELL_KNOWN_CLIENT_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::{config::ClientConfig, error::TransportError};

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Fetches `/.well-known/matrix/client` from `server_url`.
    /// `Ok(None)` means the server does not publish the document.
    async fn well_known(&self, server_url: &Url) -> Result<Option<DiscoveryInfo>, TransportError>;

    async fn versions(&self, base_url: &Url) -> Result<VersionsResponse, TransportError>;
}

#[async_trait]
pub trait LoginTransport: Send + Sync {
    async fn login(
        &self,
        base_url: &Url,
        request: &LoginRequest,
    ) -> Result<LoginResponse, TransportError>;
}

/// `reqwest`-backed implementation of both network seams.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }
}

pub(crate) fn endpoint(base_url: &Url, path: &str) -> String {
    format!("{}{path}", base_url.as_str().trim_end_matches('/'))
}

async fn error_from_response(res: Response) -> TransportError {
    let status = res.status().as_u16();
    match res.bytes().await {
        Ok(raw) => match serde_json::from_slice::<ApiError>(&raw) {
            Ok(body) => TransportError::Server { status, body },
            Err(_) => TransportError::Status(status),
        },
        Err(err) => err.into(),
    }
}

#[async_trait]
impl DiscoveryClient for HttpTransport {
    async fn well_known(&self, server_url: &Url) -> Result<Option<DiscoveryInfo>, TransportError> {
        let url = endpoint(server_url, WELL_KNOWN_CLIENT_PATH);
        debug!(%url, "fetching discovery document");

        let res = self.http.get(&url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            return Err(TransportError::Status(res.status().as_u16()));
        }

        let raw = res.bytes().await?;
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|err| TransportError::Decode(err.to_string()))
    }

    async fn versions(&self, base_url: &Url) -> Result<VersionsResponse, TransportError> {
        let res = self
            .http
            .get(endpoint(base_url, VERSIONS_PATH))
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }
}

#[async_trait]
impl LoginTransport for HttpTransport {
    async fn login(
        &self,
        base_url: &Url,
        request: &LoginRequest,
    ) -> Result<LoginResponse, TransportError> {
        let res = self
            .http
            .post(endpoint(base_url, LOGIN_PATH))
            .json(request)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(error_from_response(res).await);
        }
        Ok(res.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
