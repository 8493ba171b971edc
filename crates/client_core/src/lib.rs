//! Client-side password login: identifier classification, homeserver
//! discovery, a single-flight login operation and error normalization.

pub mod async_operation;
pub mod config;
pub mod discovery;
pub mod error;
pub mod identifier;
pub mod login;
pub mod transport;

#[cfg(test)]
#[path = "tests/fakes.rs"]
mod fakes;

pub use async_operation::{AsyncOperation, AsyncState, AttemptHandle, Settlement, StartOutcome};
pub use config::{load_config, parse_homeserver, ClientConfig};
pub use discovery::{AuthEndpoint, EndpointResolver};
pub use error::{map_server_error, ConfigError, LoginError, TransportError, ValidationError};
pub use identifier::{classify, Identifier, IdentifierError, IdentifierKind};
pub use login::{build_login_request, LoginOrchestrator, LoginState, LoginSuccess, SessionHook};
pub use transport::{DiscoveryClient, HttpTransport, LoginTransport};
