// Main entry point for the worker process

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use extraction::ScannerRegistry;
use server_core::kernel::{
    Dispatcher, DispatcherConfig, FsJobStore, WorkerPool, WorkerPoolConfig,
};
use server_core::Config;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "worker", about = "Mailsift extraction worker pool")]
struct Args {
    /// Override the WORKER_COUNT environment variable
    #[arg(long)]
    workers: Option<usize>,
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

    tracing::info!("Starting Mailsift worker");

    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    tracing::info!(
        data_dir = %config.data_dir.display(),
        workers = config.worker_count,
        "Configuration loaded"
    );

    let store = Arc::new(
        FsJobStore::open(&config.data_dir)
            .await
            .context("Failed to open job store")?,
    );

    let dispatcher = Arc::new(Dispatcher::new(
        store,
        DispatcherConfig {
            liveness_deadline: config.liveness_deadline,
            // Sweep well inside the deadline so stale jobs are picked up
            // promptly without hammering the store.
            sweep_interval: config.liveness_deadline / 4,
            max_attempts: config.max_attempts,
        },
    ));

    let scanners = Arc::new(ScannerRegistry::with_defaults());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
            shutdown.cancel();
        });
    }

    // Recovery sweep: requeues jobs orphaned by a crashed worker, starting
    // with one pass at boot.
    tokio::spawn(dispatcher.clone().run_recovery_loop(shutdown.clone()));

    let pool = WorkerPool::with_config(
        dispatcher,
        scanners,
        config.data_dir.clone(),
        WorkerPoolConfig {
            worker_count: config.worker_count,
            poll_interval: config.poll_interval,
            heartbeat_interval: config.heartbeat_interval,
        },
    );

    pool.run(shutdown).await
}
