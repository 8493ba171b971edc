//! Resolution of the homeserver a login request should be sent to.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientConfig, error::LoginError, identifier::Identifier, transport::DiscoveryClient,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoint {
    pub base_url: Url,
}

/// Picks the login endpoint for an identifier. Local usernames and email
/// addresses use the client's default homeserver; qualified account ids are
/// resolved through discovery on their own server. Nothing is cached.
#[derive(Clone)]
pub struct EndpointResolver {
    discovery: Arc<dyn DiscoveryClient>,
    config: Arc<ClientConfig>,
}

impl EndpointResolver {
    pub fn new(discovery: Arc<dyn DiscoveryClient>, config: Arc<ClientConfig>) -> Self {
        Self { discovery, config }
    }

    pub async fn resolve(&self, identifier: &Identifier) -> Result<AuthEndpoint, LoginError> {
        match identifier {
            Identifier::LocalUsername(_) | Identifier::EmailAddress(_) => Ok(AuthEndpoint {
                base_url: self.config.default_homeserver.clone(),
            }),
            Identifier::QualifiedAccountId { server, .. } => {
                let base_url = self.discover(server).await?;
                Ok(AuthEndpoint { base_url })
            }
        }
    }

    async fn discover(&self, server: &str) -> Result<Url, LoginError> {
        if !self.config.is_server_allowed(server) {
            warn!(server, "server is not in the client allow-list");
            return Err(LoginError::ServerNotAllowed);
        }

        let server_url = server_url(server)?;
        let candidate = match self.discovery.well_known(&server_url).await {
            Ok(Some(info)) => {
                let raw = info
                    .homeserver
                    .map(|homeserver| homeserver.base_url)
                    .ok_or_else(|| {
                        warn!(server, "discovery document has no m.homeserver entry");
                        LoginError::InvalidServer
                    })?;
                parse_base_url(&raw).ok_or_else(|| {
                    warn!(server, base_url = %raw, "discovery returned an unusable base url");
                    LoginError::InvalidServer
                })?
            }
            Ok(None) => {
                debug!(server, "no discovery document; using server url directly");
                server_url
            }
            Err(err) => {
                warn!(server, error = %err, "discovery request failed");
                return Err(LoginError::InvalidServer);
            }
        };

        if let Err(err) = self.discovery.versions(&candidate).await {
            warn!(server, base_url = %candidate, error = %err, "homeserver failed validation");
            return Err(LoginError::InvalidServer);
        }

        info!(server, base_url = %candidate, "resolved homeserver");
        Ok(candidate)
    }
}

/// URL discovery is attempted against. A bare server name is assumed to be
/// served over https; an explicit scheme is kept.
pub fn server_url(server: &str) -> Result<Url, LoginError> {
    let raw = if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("https://{server}")
    };
    Url::parse(&raw).map_err(|_| LoginError::InvalidServer)
}

fn parse_base_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim().trim_end_matches('/')).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
#[path = "tests/discovery_tests.rs"]
mod tests;
