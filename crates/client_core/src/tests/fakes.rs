//! In-memory doubles for the network seams.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{DeviceId, UserId},
    error::{ApiError, ErrorCode},
    protocol::{DiscoveryInfo, HomeserverInfo, LoginRequest, LoginResponse, VersionsResponse},
};
use tokio::sync::{oneshot, Mutex};
use url::Url;

use crate::{
    error::TransportError,
    transport::{DiscoveryClient, LoginTransport},
};

#[derive(Debug, Clone)]
pub enum WellKnown {
    BaseUrl(String),
    NoHomeserver,
    NotFound,
    Unreachable,
}

pub struct FakeDiscovery {
    well_known: WellKnown,
    versions_ok: bool,
    pub well_known_calls: Arc<Mutex<Vec<Url>>>,
    pub versions_calls: Arc<Mutex<Vec<Url>>>,
}

impl FakeDiscovery {
    pub fn new(well_known: WellKnown) -> Self {
        Self {
            well_known,
            versions_ok: true,
            well_known_calls: Arc::new(Mutex::new(Vec::new())),
            versions_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failing_versions(mut self) -> Self {
        self.versions_ok = false;
        self
    }
}

#[async_trait]
impl DiscoveryClient for FakeDiscovery {
    async fn well_known(&self, server_url: &Url) -> Result<Option<DiscoveryInfo>, TransportError> {
        self.well_known_calls.lock().await.push(server_url.clone());
        match &self.well_known {
            WellKnown::BaseUrl(base_url) => Ok(Some(DiscoveryInfo {
                homeserver: Some(HomeserverInfo {
                    base_url: base_url.clone(),
                }),
            })),
            WellKnown::NoHomeserver => Ok(Some(DiscoveryInfo { homeserver: None })),
            WellKnown::NotFound => Ok(None),
            WellKnown::Unreachable => Err(TransportError::Connect("dns error".to_string())),
        }
    }

    async fn versions(&self, base_url: &Url) -> Result<VersionsResponse, TransportError> {
        self.versions_calls.lock().await.push(base_url.clone());
        if self.versions_ok {
            Ok(VersionsResponse {
                versions: vec!["v1.11".to_string()],
            })
        } else {
            Err(TransportError::Status(404))
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoginReply {
    Success,
    Error { status: u16, errcode: &'static str },
    Timeout,
}

pub struct FakeLogin {
    reply: LoginReply,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub calls: Arc<Mutex<Vec<(Url, LoginRequest)>>>,
}

impl FakeLogin {
    pub fn new(reply: LoginReply) -> Self {
        Self {
            reply,
            gate: Mutex::new(None),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Holds the first login call until the returned sender fires.
    pub fn gated(reply: LoginReply) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let fake = Self {
            reply,
            gate: Mutex::new(Some(rx)),
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        (fake, tx)
    }
}

pub fn login_response(user_id: &str) -> LoginResponse {
    LoginResponse {
        user_id: UserId(user_id.to_string()),
        access_token: "syt_access_token".to_string(),
        device_id: DeviceId("DEVICEID".to_string()),
        home_server: None,
        well_known: None,
    }
}

#[async_trait]
impl LoginTransport for FakeLogin {
    async fn login(
        &self,
        base_url: &Url,
        request: &LoginRequest,
    ) -> Result<LoginResponse, TransportError> {
        self.calls
            .lock()
            .await
            .push((base_url.clone(), request.clone()));

        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match &self.reply {
            LoginReply::Success => Ok(login_response("@someone:example.org")),
            LoginReply::Error { status, errcode } => Err(TransportError::Server {
                status: *status,
                body: ApiError::new(ErrorCode::from_errcode(errcode), "rejected"),
            }),
            LoginReply::Timeout => Err(TransportError::Timeout),
        }
    }
}
