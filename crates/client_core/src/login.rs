//! Password login: classify the typed identifier, resolve where to send it,
//! run a single login attempt and report the outcome.

use std::sync::Arc;

use shared::{
    domain::ThirdPartyMedium,
    protocol::{LoginIdentifier, LoginRequest, LoginResponse},
};
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use crate::{
    async_operation::{AsyncOperation, AsyncState, StartOutcome},
    config::ClientConfig,
    discovery::EndpointResolver,
    error::{LoginError, TransportError, ValidationError},
    identifier::{classify, Identifier},
    transport::{DiscoveryClient, HttpTransport, LoginTransport},
};

/// Credentials issued by a successful login, along with the homeserver that
/// issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub base_url: Url,
    pub response: LoginResponse,
}

pub type LoginState = AsyncState<LoginSuccess, LoginError>;

/// Receives the credentials of each successful login exactly once.
pub trait SessionHook: Send + Sync {
    fn login_complete(&self, success: LoginSuccess);
}

impl<F> SessionHook for F
where
    F: Fn(LoginSuccess) + Send + Sync,
{
    fn login_complete(&self, success: LoginSuccess) {
        self(success)
    }
}

pub fn build_login_request(
    identifier: &Identifier,
    secret: &str,
    device_display_name: &str,
) -> LoginRequest {
    let login_identifier = match identifier {
        Identifier::LocalUsername(username) => LoginIdentifier::User {
            user: username.clone(),
        },
        Identifier::QualifiedAccountId { local_part, .. } => LoginIdentifier::User {
            user: local_part.clone(),
        },
        Identifier::EmailAddress(address) => LoginIdentifier::ThirdParty {
            medium: ThirdPartyMedium::Email,
            address: address.clone(),
        },
    };

    let device_display_name =
        (!device_display_name.is_empty()).then(|| device_display_name.to_string());
    LoginRequest::password(login_identifier, secret, device_display_name)
}

/// Owns the login form's single-flight operation. Observers get snapshots
/// through [`state`](Self::state) or [`subscribe`](Self::subscribe).
pub struct LoginOrchestrator {
    config: Arc<ClientConfig>,
    resolver: EndpointResolver,
    transport: Arc<dyn LoginTransport>,
    hook: Arc<dyn SessionHook>,
    operation: AsyncOperation<LoginSuccess, LoginError>,
}

impl LoginOrchestrator {
    pub fn new(
        config: Arc<ClientConfig>,
        discovery: Arc<dyn DiscoveryClient>,
        transport: Arc<dyn LoginTransport>,
        hook: Arc<dyn SessionHook>,
    ) -> Self {
        Self {
            resolver: EndpointResolver::new(discovery, Arc::clone(&config)),
            config,
            transport,
            hook,
            operation: AsyncOperation::new(),
        }
    }

    /// Wires discovery and login to one shared [`HttpTransport`].
    pub fn with_http(
        config: ClientConfig,
        hook: Arc<dyn SessionHook>,
    ) -> Result<Self, TransportError> {
        let http = Arc::new(HttpTransport::from_config(&config)?);
        Ok(Self::new(Arc::new(config), http.clone(), http, hook))
    }

    /// Validates the input and starts a login attempt.
    ///
    /// Validation failures are returned directly and leave the operation
    /// untouched. If an attempt is already in flight the call is dropped and
    /// `StartOutcome::AlreadyPending` is returned.
    pub fn submit(
        &self,
        raw_identifier: &str,
        secret: &str,
    ) -> Result<StartOutcome, ValidationError> {
        if raw_identifier.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }
        if secret.is_empty() {
            return Err(ValidationError::EmptySecret);
        }
        let identifier = classify(raw_identifier).map_err(|err| {
            warn!(error = %err, "rejecting login input");
            ValidationError::from(err)
        })?;

        let kind = identifier.kind();
        let request = build_login_request(&identifier, secret, &self.config.device_display_name);
        let resolver = self.resolver.clone();
        let transport = Arc::clone(&self.transport);
        let hook = Arc::clone(&self.hook);

        let outcome = self.operation.start_then(
            move || async move {
                let endpoint = resolver.resolve(&identifier).await?;
                let response = transport
                    .login(&endpoint.base_url, &request)
                    .await
                    .map_err(|err| {
                        warn!(base_url = %endpoint.base_url, error = %err, "login request failed");
                        LoginError::from(err)
                    })?;
                Ok(LoginSuccess {
                    base_url: endpoint.base_url,
                    response,
                })
            },
            move |result| match result {
                Ok(success) => {
                    info!(
                        user_id = %success.response.user_id,
                        device_id = %success.response.device_id,
                        base_url = %success.base_url,
                        "login complete"
                    );
                    hook.login_complete(success.clone());
                }
                Err(err) => warn!(%kind, error = ?err, "login failed"),
            },
        );

        if let StartOutcome::Started(handle) = &outcome {
            info!(%kind, attempt = handle.attempt(), "login attempt started");
        }
        Ok(outcome)
    }

    /// Detaches from any in-flight attempt and returns to idle.
    pub fn reset(&self) {
        self.operation.reset();
    }

    pub fn state(&self) -> LoginState {
        self.operation.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginState> {
        self.operation.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.operation.is_pending()
    }
}

#[cfg(test)]
#[path = "tests/login_tests.rs"]
mod tests;
