//! Error taxonomy for password login.

use serde::Serialize;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

use crate::identifier::IdentifierError;

const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Closed set of reasons a submitted login attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum LoginError {
    #[error("login with a custom server is not allowed by this client")]
    ServerNotAllowed,
    #[error("failed to discover the account's server")]
    InvalidServer,
    #[error("invalid username or password")]
    Forbidden,
    #[error("account has been deactivated")]
    UserDeactivated,
    #[error("login request was rejected as invalid")]
    InvalidRequest,
    #[error("login request was rate-limited")]
    RateLimited,
    #[error("login failed for an unknown reason")]
    Unknown,
}

impl LoginError {
    /// Text shown next to the login form for this failure.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ServerNotAllowed => {
                "Login with custom server not allowed by your client instance."
            }
            Self::InvalidServer => "Failed to find your Matrix ID server.",
            Self::Forbidden => "Invalid Username or Password.",
            Self::UserDeactivated => "This account has been deactivated.",
            Self::InvalidRequest => "Failed to login. Part of your request data is invalid.",
            Self::RateLimited => {
                "Failed to login. Your login request has been rate-limited by server, Please try after some time."
            }
            Self::Unknown => "Failed to login. Unknown reason.",
        }
    }
}

/// Maps a server `errcode` and optional HTTP status onto [`LoginError`].
///
/// Rate limiting wins over every other signal; after that only the code table
/// is consulted and anything outside it is `Unknown`.
pub fn map_server_error(raw_error_code: &str, http_status: Option<u16>) -> LoginError {
    let code = ErrorCode::from_errcode(raw_error_code);

    if code == ErrorCode::LimitExceeded || http_status == Some(HTTP_TOO_MANY_REQUESTS) {
        return LoginError::RateLimited;
    }

    match code {
        ErrorCode::UserDeactivated => LoginError::UserDeactivated,
        ErrorCode::Forbidden => LoginError::Forbidden,
        ErrorCode::BadJson
        | ErrorCode::NotJson
        | ErrorCode::MissingParam
        | ErrorCode::InvalidParam
        | ErrorCode::InvalidUsername
        | ErrorCode::Unrecognized => LoginError::InvalidRequest,
        _ => LoginError::Unknown,
    }
}

/// Failures raised by the HTTP layer underneath discovery and login.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("failed to reach server: {0}")]
    Connect(String),
    #[error("server responded with status {status}: {body}")]
    Server { status: u16, body: ApiError },
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Connect(err.to_string())
        }
    }
}

impl From<TransportError> for LoginError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Server { status, body } => {
                map_server_error(body.errcode.as_str(), Some(status))
            }
            TransportError::Status(status) => map_server_error("", Some(status)),
            TransportError::Timeout | TransportError::Connect(_) | TransportError::Decode(_) => {
                LoginError::Unknown
            }
        }
    }
}

/// Input problems caught before any network request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyIdentifier,
    #[error("password must not be empty")]
    EmptySecret,
    #[error(transparent)]
    MalformedAccountId(IdentifierError),
}

impl From<IdentifierError> for ValidationError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::Empty => Self::EmptyIdentifier,
            malformed @ IdentifierError::MalformedAccountId { .. } => {
                Self::MalformedAccountId(malformed)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
