use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable `errcode` values a homeserver may return from the login
/// endpoint. Anything outside this vocabulary is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    Forbidden,
    UserDeactivated,
    LimitExceeded,
    BadJson,
    NotJson,
    MissingParam,
    InvalidParam,
    InvalidUsername,
    Unrecognized,
    Unknown,
    Other(String),
}

impl ErrorCode {
    pub fn from_errcode(raw: &str) -> Self {
        match raw {
            "M_FORBIDDEN" => Self::Forbidden,
            "M_USER_DEACTIVATED" => Self::UserDeactivated,
            "M_LIMIT_EXCEEDED" => Self::LimitExceeded,
            "M_BAD_JSON" => Self::BadJson,
            "M_NOT_JSON" => Self::NotJson,
            "M_MISSING_PARAM" => Self::MissingParam,
            "M_INVALID_PARAM" => Self::InvalidParam,
            "M_INVALID_USERNAME" => Self::InvalidUsername,
            "M_UNRECOGNIZED" => Self::Unrecognized,
            "M_UNKNOWN" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Forbidden => "M_FORBIDDEN",
            Self::UserDeactivated => "M_USER_DEACTIVATED",
            Self::LimitExceeded => "M_LIMIT_EXCEEDED",
            Self::BadJson => "M_BAD_JSON",
            Self::NotJson => "M_NOT_JSON",
            Self::MissingParam => "M_MISSING_PARAM",
            Self::InvalidParam => "M_INVALID_PARAM",
            Self::InvalidUsername => "M_INVALID_USERNAME",
            Self::Unrecognized => "M_UNRECOGNIZED",
            Self::Unknown => "M_UNKNOWN",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        Self::from_errcode(&value)
    }
}

impl From<ErrorCode> for String {
    fn from(value: ErrorCode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error body returned by the client-server API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{errcode}: {}", .error.as_deref().unwrap_or("no error message"))]
pub struct ApiError {
    pub errcode: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl ApiError {
    pub fn new(errcode: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            errcode,
            error: Some(message.into()),
            retry_after_ms: None,
        }
    }
}
