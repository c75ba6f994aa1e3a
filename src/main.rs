mod cli;

use clap::Parser;
use remit_core::config::Config;
use remit_core::session::Session;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = cli::Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;

    // Resolved once; injected wherever the credential is needed
    let session = Session::from_env();
    tracing::debug!("session credential: {}", session.masked());

    cli::run(args, config, session).await
}
