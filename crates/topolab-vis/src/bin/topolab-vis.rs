//! Topolab control surface server
//!
//! Usage: `topolab-vis [ADDR] [BACKEND_URL]`. Arguments override the
//! `TOPOLAB_*` environment variables.

use std::env;
use std::sync::Arc;

use topolab_vis::{Error, HttpBackend, VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "topolab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = VisConfig::from_env()?;

    // Parse command line args
    let args: Vec<String> = env::args().collect();
    if let Some(addr) = args.get(1) {
        config.addr = addr
            .parse()
            .map_err(|_| Error::Config(format!("invalid listen address '{addr}'")))?;
    }
    if let Some(url) = args.get(2) {
        config.backend_url = url.clone();
    }

    tracing::info!(backend = %config.backend_url, "starting control surface");

    let backend = Arc::new(HttpBackend::new(config.backend_url.clone()));
    VisServer::new(config, backend).serve().await?;

    Ok(())
}
