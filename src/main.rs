use anyhow::{Context, Result};
use clap::Parser;
use hospital_records::app::{router, AppState};
use hospital_records::config::Config;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hospital records service.
///
/// Settings come from the optional TOML file; the flags below override it.
#[derive(Parser, Debug)]
#[command(name = "hospital-records", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(long, env = "HOSPITAL_LISTEN")]
    listen: Option<SocketAddr>,

    /// SQLite database file
    #[arg(long, env = "HOSPITAL_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }

    let state = AppState::from_config(&config)?;
    let app = router(state);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!(addr = %config.listen, database = %config.database.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
