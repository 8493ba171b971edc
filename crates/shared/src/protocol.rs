use serde::{Deserialize, Serialize};

use crate::domain::{DeviceId, ThirdPartyMedium, UserId};

pub const LOGIN_TYPE_PASSWORD: &str = "m.login.password";
pub const LOGIN_PATH: &str = "/_matrix/client/v3/login";
pub const VERSIONS_PATH: &str = "/_matrix/client/versions";
pub const WELL_KNOWN_CLIENT_PATH: &str = "/.well-known/matrix/client";

/// Identifies the account a password login is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoginIdentifier {
    #[serde(rename = "m.id.user")]
    User { user: String },
    #[serde(rename = "m.id.thirdparty")]
    ThirdParty {
        medium: ThirdPartyMedium,
        address: String,
    },
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "type")]
    pub login_type: String,
    pub identifier: LoginIdentifier,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_device_display_name: Option<String>,
}

impl LoginRequest {
    pub fn password(
        identifier: LoginIdentifier,
        password: impl Into<String>,
        device_display_name: Option<String>,
    ) -> Self {
        Self {
            login_type: LOGIN_TYPE_PASSWORD.to_string(),
            identifier,
            password: password.into(),
            initial_device_display_name: device_display_name,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login_type", &self.login_type)
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .field(
                "initial_device_display_name",
                &self.initial_device_display_name,
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub access_token: String,
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_known: Option<DiscoveryInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeserverInfo {
    pub base_url: String,
}

/// Body of `/.well-known/matrix/client`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    #[serde(rename = "m.homeserver")]
    pub homeserver: Option<HomeserverInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsResponse {
    pub versions: Vec<String>,
}
