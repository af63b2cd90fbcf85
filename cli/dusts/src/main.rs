//! dusts - upgrade stability scenarios for a diego deployment.
//!
//! Suite configuration comes from the environment, see `SuiteConfig::from_env`.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;

use commands::Cli;

/// Log filter used when `RUST_LOG` is unset.
const LOG_LEVEL_VAR: &str = "DUSTS_LOG_LEVEL";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            std::env::var(LOG_LEVEL_VAR)
                .ok()
                .and_then(|level| EnvFilter::try_new(level).ok())
                .unwrap_or_else(|| "info".into())
        }))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
