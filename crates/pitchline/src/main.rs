//! Pitchline server binary: CLI parsing, logging, config, and lifecycle.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pitchline_server::{AppConfig, PitchlineServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pitchline", version, about = "Startup/investor platform server")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "pitchline.json")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path.
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    if config.auth.secret.is_empty() {
        warn!("no signing secret configured, using an ephemeral one; tokens will not survive a restart");
        config.auth.secret = ephemeral_secret();
    }

    let server = PitchlineServer::start(&config)
        .await
        .context("starting server")?;
    info!(addr = %server.addr(), "pitchline ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for shutdown signal")?;
    info!("shutdown signal received");
    server.shutdown().await;
    Ok(())
}

fn ephemeral_secret() -> String {
    use rand::distr::Alphanumeric;
    use rand::Rng;
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
