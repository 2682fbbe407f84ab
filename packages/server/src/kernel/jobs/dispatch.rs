//! Dispatcher: claim ordering, stale-job recovery, cancellation.
//!
//! The dispatcher does not hold queue state of its own. Claimable work is
//! derived from the durable job records on every poll, so the queue is
//! rebuilt for free after a restart; what lives here is the policy around
//! it: lease length, the recovery sweep, and the retry budget.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::JobResult;
use super::job::{Job, JobStatus};
use super::store::JobStore;

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Lease granted per claim; a running job missing heartbeats for this
    /// long is considered abandoned. Keep generous relative to per-file
    /// extraction latency to bound false-positive requeues.
    pub liveness_deadline: Duration,
    /// How often the recovery sweep looks for expired leases
    pub sweep_interval: Duration,
    /// Claims a job may burn before it fails for good
    pub max_attempts: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            liveness_deadline: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(15),
            max_attempts: 3,
        }
    }
}

/// Hands claimable jobs to workers and recovers jobs whose worker died.
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn JobStore>, config: DispatcherConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn liveness_deadline(&self) -> Duration {
        self.config.liveness_deadline
    }

    /// Claim the oldest pending job for `worker_id`, if any.
    pub async fn claim_next(&self, worker_id: &str) -> JobResult<Option<Job>> {
        self.store
            .claim_next(worker_id, self.config.liveness_deadline)
            .await
    }

    /// Mark a job for cancellation (immediate while pending, cooperative
    /// while running).
    pub async fn request_cancel(&self, id: Uuid) -> JobResult<Job> {
        self.store.request_cancel(id).await
    }

    /// One recovery pass: requeue running jobs with lapsed leases, failing
    /// the ones that already exhausted their retry budget.
    pub async fn recover_stale(&self) -> JobResult<Vec<Job>> {
        let touched = self.store.requeue_stale(self.config.max_attempts).await?;

        for job in &touched {
            match job.status {
                JobStatus::Pending => warn!(
                    job_id = %job.id,
                    attempt = job.attempt,
                    "requeued job after missed liveness deadline"
                ),
                JobStatus::Failed => warn!(
                    job_id = %job.id,
                    attempt = job.attempt,
                    "stale job exhausted its retry budget"
                ),
                _ => {}
            }
        }

        Ok(touched)
    }

    /// Run recovery sweeps until shutdown. The first pass runs immediately
    /// so jobs orphaned by a crash are recovered on startup.
    pub async fn run_recovery_loop(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            deadline_secs = self.config.liveness_deadline.as_secs(),
            sweep_secs = self.config.sweep_interval.as_secs(),
            "dispatcher recovery loop starting"
        );

        loop {
            if let Err(e) = self.recover_stale().await {
                error!(error = %e, "stale-job recovery sweep failed");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.sweep_interval) => {}
            }
        }

        info!("dispatcher recovery loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::store::{FsJobStore, UPLOADS_DIR};
    use crate::kernel::jobs::InputFileRef;

    async fn dispatcher_with_job(
        config: DispatcherConfig,
    ) -> (tempfile::TempDir, Dispatcher, Uuid) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsJobStore::open(dir.path()).await.unwrap();

        let rel = format!("{UPLOADS_DIR}/t/a.txt");
        let path = store.data_dir().join(&rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"a@b.com").unwrap();

        let file = InputFileRef {
            path: rel,
            name: "a.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            size_bytes: 7,
        };
        let max_attempts = config.max_attempts;
        let job = store.create(vec![file], max_attempts).await.unwrap();

        (dir, Dispatcher::new(Arc::new(store), config), job.id)
    }

    #[test]
    fn config_defaults_keep_heartbeat_headroom() {
        let config = DispatcherConfig::default();
        assert!(config.sweep_interval < config.liveness_deadline);
        assert_eq!(config.max_attempts, 3);
    }

    #[tokio::test]
    async fn recover_requeues_then_fails_after_budget() {
        let config = DispatcherConfig {
            liveness_deadline: Duration::from_millis(10),
            sweep_interval: Duration::from_millis(10),
            max_attempts: 2,
        };
        let (_dir, dispatcher, id) = dispatcher_with_job(config).await;

        // Attempt 1: claim, miss the deadline, get requeued.
        dispatcher.claim_next("w1").await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let touched = dispatcher.recover_stale().await.unwrap();
        assert_eq!(touched[0].status, JobStatus::Pending);

        // Attempt 2: claim again, miss again, budget is gone.
        dispatcher.claim_next("w1").await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let touched = dispatcher.recover_stale().await.unwrap();
        assert_eq!(touched[0].status, JobStatus::Failed);

        let job = dispatcher.store().get(id).await.unwrap();
        assert_eq!(job.attempt, 2);
        assert!(job.error_summary.is_some());
    }
}
