// Main entry point for the gateway process

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use server_core::kernel::FsJobStore;
use server_core::server::{build_app, AppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "server", about = "Mailsift upload gateway and status API")]
struct Args {
    /// Override the PORT environment variable
    #[arg(long)]
    port: Option<u16>,
    /// Override the DATA_DIR environment variable
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Mailsift gateway");

    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    tracing::info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let store = Arc::new(
        FsJobStore::open(&config.data_dir)
            .await
            .context("Failed to open job store")?,
    );

    let state = AppState {
        store,
        data_dir: config.data_dir.clone(),
        max_attempts: config.max_attempts,
    };
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
