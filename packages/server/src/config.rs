use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the shared data layout (jobs/, uploaded_files/, outputs/)
    pub data_dir: PathBuf,
    pub port: u16,
    pub worker_count: usize,
    /// Worker sleep between polls when the queue is empty
    pub poll_interval: Duration,
    /// Lease extension cadence; must stay strictly under the deadline
    pub heartbeat_interval: Duration,
    /// How long a running job may go without a heartbeat before the
    /// dispatcher requeues it
    pub liveness_deadline: Duration,
    pub max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            worker_count: env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("WORKER_COUNT must be a valid number")?,
            poll_interval: duration_var("POLL_INTERVAL_SECS", 5)?,
            heartbeat_interval: duration_var("HEARTBEAT_INTERVAL_SECS", 10)?,
            liveness_deadline: duration_var("LIVENESS_DEADLINE_SECS", 60)?,
            max_attempts: env::var("MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("MAX_ATTEMPTS must be a valid number")?,
        };

        ensure!(
            config.worker_count > 0,
            "WORKER_COUNT must be at least 1"
        );
        ensure!(
            config.heartbeat_interval < config.liveness_deadline,
            "HEARTBEAT_INTERVAL_SECS must be strictly shorter than LIVENESS_DEADLINE_SECS"
        );

        Ok(config)
    }
}

fn duration_var(name: &str, default_secs: u64) -> Result<Duration> {
    let secs: u64 = env::var(name)
        .unwrap_or_else(|_| default_secs.to_string())
        .parse()
        .with_context(|| format!("{name} must be a valid number of seconds"))?;
    Ok(Duration::from_secs(secs))
}
