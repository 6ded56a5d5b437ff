//! Conversion server binary entry point

use anyhow::Context;
use docshift_server::{start_server, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docshift_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let state = AppState::from_config(&config);
    tracing::debug!("Office binary candidates: {:?}", state.options.binary_paths);

    start_server(&config.addr, state)
        .await
        .with_context(|| format!("Server on {} stopped", config.addr))?;

    Ok(())
}
