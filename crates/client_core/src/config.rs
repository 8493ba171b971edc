use std::{fs, path::Path};

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_HOMESERVER: &str = "https://matrix.org";
pub const DEFAULT_DEVICE_DISPLAY_NAME: &str = "Desktop Client";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Static, read-only configuration the login flow consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the homeserver the client is already bound to.
    pub default_homeserver: Url,
    /// When false, only servers in `server_allow_list` may be logged into.
    pub allow_custom_servers: bool,
    pub server_allow_list: Vec<String>,
    pub device_display_name: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_homeserver: Url::parse(DEFAULT_HOMESERVER)
                .expect("default homeserver is a valid url"),
            allow_custom_servers: true,
            server_allow_list: Vec::new(),
            device_display_name: DEFAULT_DEVICE_DISPLAY_NAME.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn with_default_homeserver(default_homeserver: Url) -> Self {
        Self {
            default_homeserver,
            ..Self::default()
        }
    }

    pub fn is_server_allowed(&self, server: &str) -> bool {
        self.allow_custom_servers
            || self
                .server_allow_list
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(server))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    default_homeserver: Option<String>,
    allow_custom_servers: Option<bool>,
    server_allow_list: Option<Vec<String>>,
    device_display_name: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Loads config from an optional TOML file, then applies environment
/// overrides. A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Some(path) = path {
        if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            apply_file_config(&mut config, &raw).map_err(|err| match err {
                ConfigError::Parse { source, .. } => ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                },
                other => other,
            })?;
            debug!(path = %path.display(), "loaded client config file");
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn apply_file_config(config: &mut ClientConfig, raw: &str) -> Result<(), ConfigError> {
    let file_cfg: FileConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: String::new(),
        source,
    })?;

    if let Some(v) = file_cfg.default_homeserver {
        config.default_homeserver = parse_homeserver("default_homeserver", &v)?;
    }
    if let Some(v) = file_cfg.allow_custom_servers {
        config.allow_custom_servers = v;
    }
    if let Some(v) = file_cfg.server_allow_list {
        config.server_allow_list = v;
    }
    if let Some(v) = file_cfg.device_display_name {
        config.device_display_name = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        config.request_timeout_secs = nonzero_timeout("request_timeout_secs", v)?;
    }
    Ok(())
}

fn apply_env_overrides<F>(config: &mut ClientConfig, var: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("CLIENT_DEFAULT_HOMESERVER") {
        config.default_homeserver = parse_homeserver("CLIENT_DEFAULT_HOMESERVER", &v)?;
    }
    if let Some(v) = var("APP__DEFAULT_HOMESERVER") {
        config.default_homeserver = parse_homeserver("APP__DEFAULT_HOMESERVER", &v)?;
    }

    if let Some(v) = var("APP__ALLOW_CUSTOM_SERVERS") {
        config.allow_custom_servers = match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => {
                return Err(ConfigError::Invalid {
                    key: "APP__ALLOW_CUSTOM_SERVERS",
                    reason: format!("expected a boolean, got '{other}'"),
                })
            }
        };
    }

    if let Some(v) = var("APP__SERVER_ALLOW_LIST") {
        config.server_allow_list = v
            .split(',')
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(v) = var("APP__DEVICE_DISPLAY_NAME") {
        config.device_display_name = v;
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        config.request_timeout_secs = parse_timeout_secs("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }

    Ok(())
}

fn parse_timeout_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
    })?;
    nonzero_timeout(key, secs)
}

fn nonzero_timeout(key: &'static str, secs: u64) -> Result<u64, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "timeout must be at least one second".to_string(),
        });
    }
    Ok(secs)
}

/// Parses a homeserver base URL, accepting only `http` and `https`. `key`
/// names the setting the value came from in the returned error.
pub fn parse_homeserver(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
