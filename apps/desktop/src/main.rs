use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    load_config, parse_homeserver, AsyncState, LoginOrchestrator, LoginSuccess, StartOutcome,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Username, `@user:server` account id, or email address.
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "client.toml")]
    config: PathBuf,
    /// Overrides the configured default homeserver.
    #[arg(long)]
    homeserver: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut config = load_config(Some(&args.config)).context("failed to load client config")?;
    if let Some(homeserver) = &args.homeserver {
        config.default_homeserver = parse_homeserver("--homeserver", homeserver)
            .with_context(|| format!("invalid homeserver url '{homeserver}'"))?;
    }
    info!(default_homeserver = %config.default_homeserver, "starting login");

    let session: Arc<Mutex<Option<LoginSuccess>>> = Arc::new(Mutex::new(None));
    let hook = {
        let session = Arc::clone(&session);
        move |success: LoginSuccess| {
            if let Ok(mut slot) = session.lock() {
                *slot = Some(success);
            }
        }
    };
    let orchestrator = LoginOrchestrator::with_http(config, Arc::new(hook))
        .context("failed to build http transport")?;

    let handle = match orchestrator.submit(&args.username, &args.password)? {
        StartOutcome::Started(handle) => handle,
        StartOutcome::AlreadyPending => bail!("a login attempt is already in progress"),
    };
    handle.settled().await;

    match orchestrator.state() {
        AsyncState::Succeeded(_) => {
            let success = session
                .lock()
                .map_err(|_| anyhow!("session slot poisoned"))?
                .take()
                .context("login succeeded but no session was delivered")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "homeserver": success.base_url.as_str(),
                    "user_id": success.response.user_id,
                    "device_id": success.response.device_id,
                }))?
            );
            Ok(())
        }
        AsyncState::Failed(err) => bail!("{}", err.message()),
        state => bail!("login did not settle: {state:?}"),
    }
}
