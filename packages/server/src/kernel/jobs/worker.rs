//! Worker pool: claims jobs and runs extraction over their input files.
//!
//! # Architecture
//!
//! ```text
//! WorkerPool (N independent loops)
//!     │
//!     ├─► Dispatcher.claim_next  (atomic Pending -> Running)
//!     ├─► for each input file:
//!     │       check cancellation / ownership
//!     │       ScannerRegistry.scan_file  (per-file errors absorbed)
//!     │       fold hits into ResultSet
//!     ├─► write output artifact
//!     └─► JobStore.complete / fail
//! ```
//!
//! While a worker owns a job it keeps a heartbeat task extending the lease
//! at an interval strictly shorter than the dispatcher's liveness deadline;
//! a worker that dies simply stops heartbeating and the recovery sweep
//! requeues its job.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use extraction::{ResultSet, ScannerRegistry};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::artifact::write_artifact;
use super::dispatch::Dispatcher;
use super::error::JobStoreError;
use super::job::{Job, JobProgress, JobStatus};
use super::store::JobStore;

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers
    pub worker_count: usize,
    /// How long to wait before re-polling when no job is claimable
    pub poll_interval: Duration,
    /// How often to extend the lease of an owned job. Must be strictly
    /// shorter than the dispatcher's liveness deadline.
    pub heartbeat_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            poll_interval: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}

/// Fixed-size pool of job-processing workers.
pub struct WorkerPool {
    dispatcher: Arc<Dispatcher>,
    scanners: Arc<ScannerRegistry>,
    data_dir: PathBuf,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        scanners: Arc<ScannerRegistry>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_config(dispatcher, scanners, data_dir, WorkerPoolConfig::default())
    }

    pub fn with_config(
        dispatcher: Arc<Dispatcher>,
        scanners: Arc<ScannerRegistry>,
        data_dir: impl Into<PathBuf>,
        config: WorkerPoolConfig,
    ) -> Self {
        Self {
            dispatcher,
            scanners,
            data_dir: data_dir.into(),
            config,
        }
    }

    /// Run all workers until shutdown is signalled. Workers finish the job
    /// they hold before exiting.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(worker_count = self.config.worker_count, "worker pool starting");

        let mut handles = Vec::with_capacity(self.config.worker_count);
        for n in 0..self.config.worker_count {
            let worker_id = format!("worker-{}-{}", n, Uuid::new_v4());
            handles.push(tokio::spawn(worker_loop(
                self.dispatcher.clone(),
                self.scanners.clone(),
                self.data_dir.clone(),
                self.config.clone(),
                worker_id,
                shutdown.clone(),
            )));
        }

        futures::future::join_all(handles).await;
        info!("worker pool stopped");
        Ok(())
    }
}

async fn worker_loop(
    dispatcher: Arc<Dispatcher>,
    scanners: Arc<ScannerRegistry>,
    data_dir: PathBuf,
    config: WorkerPoolConfig,
    worker_id: String,
    shutdown: CancellationToken,
) {
    info!(worker_id = %worker_id, "worker started");

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match dispatcher.claim_next(&worker_id).await {
            Ok(Some(job)) => {
                process_job(
                    &dispatcher,
                    &scanners,
                    &data_dir,
                    config.heartbeat_interval,
                    &worker_id,
                    job,
                )
                .await;
            }
            Ok(None) => {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(config.poll_interval) => {}
                }
            }
            Err(e) => {
                error!(worker_id = %worker_id, error = %e, "failed to claim job");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    info!(worker_id = %worker_id, "worker stopped");
}

/// What one processing attempt produced.
enum JobOutcome {
    /// All files iterated; at least one was readable
    Finished {
        results: ResultSet,
        failures: Vec<String>,
        attempted: u32,
    },
    /// Nothing could be read at all, or the record itself broke
    Fatal { reason: String },
    /// The cancellation flag was observed at a file boundary
    Cancelled,
    /// The job was requeued and reclaimed out from under us
    LostOwnership,
}

async fn process_job(
    dispatcher: &Dispatcher,
    scanners: &ScannerRegistry,
    data_dir: &Path,
    heartbeat_interval: Duration,
    worker_id: &str,
    job: Job,
) {
    let store = dispatcher.store().clone();
    let lease = dispatcher.liveness_deadline();

    info!(
        job_id = %job.id,
        worker_id = %worker_id,
        files = job.input_files.len(),
        attempt = job.attempt,
        "processing job"
    );

    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = tokio::spawn(heartbeat_loop(
        store.clone(),
        job.id,
        worker_id.to_string(),
        heartbeat_interval,
        lease,
        heartbeat_cancel.clone(),
    ));

    let outcome = run_extraction(store.as_ref(), scanners, data_dir, worker_id, &job).await;

    heartbeat_cancel.cancel();
    let _ = heartbeat_handle.await;

    match outcome {
        JobOutcome::Finished {
            results,
            failures,
            attempted,
        } => {
            let final_progress = JobProgress {
                files_done: attempted,
                emails_found: results.len() as u32,
                current_file: None,
            };
            if let Err(e) = store.update_progress(job.id, worker_id, final_progress).await {
                warn!(job_id = %job.id, error = %e, "final progress update failed");
            }

            match write_artifact(data_dir, job.id, results).await {
                Ok(output) => {
                    let addresses = output.addresses;
                    let summary = (!failures.is_empty()).then(|| failures.join("; "));
                    match store.complete(job.id, worker_id, output, summary).await {
                        Ok(_) => info!(job_id = %job.id, addresses, "job completed"),
                        Err(e) => {
                            error!(job_id = %job.id, error = %e, "failed to record completion")
                        }
                    }
                }
                Err(e) => {
                    // Storage failures are job-fatal, not retried: the crash
                    // requeue path is reserved for dead workers.
                    let reason = format!("failed to write output artifact: {e}");
                    error!(job_id = %job.id, error = %e, "artifact write failed");
                    if let Err(e) = store.fail(job.id, Some(worker_id), &reason).await {
                        error!(job_id = %job.id, error = %e, "failed to record failure");
                    }
                }
            }
        }
        JobOutcome::Fatal { reason } => {
            warn!(job_id = %job.id, reason = %reason, "job failed");
            if let Err(e) = store.fail(job.id, Some(worker_id), &reason).await {
                error!(job_id = %job.id, error = %e, "failed to record failure");
            }
        }
        JobOutcome::Cancelled => {
            info!(job_id = %job.id, "job cancelled");
            if let Err(e) = store.fail(job.id, Some(worker_id), "cancelled").await {
                error!(job_id = %job.id, error = %e, "failed to record cancellation");
            }
        }
        JobOutcome::LostOwnership => {
            warn!(job_id = %job.id, worker_id = %worker_id, "lost ownership mid-run; dropping work");
        }
    }
}

async fn run_extraction(
    store: &dyn JobStore,
    scanners: &ScannerRegistry,
    data_dir: &Path,
    worker_id: &str,
    job: &Job,
) -> JobOutcome {
    let mut results = ResultSet::new();
    let mut failures: Vec<String> = Vec::new();
    let mut scanned = 0u32;
    let mut attempted = 0u32;

    for file in &job.input_files {
        // Cancellation and ownership both live on the durable record, so
        // re-read it at every file boundary.
        let fresh = match store.get(job.id).await {
            Ok(j) => j,
            Err(e) => {
                return JobOutcome::Fatal {
                    reason: format!("job record unreadable mid-run: {e}"),
                }
            }
        };
        if fresh.status != JobStatus::Running || fresh.worker_id.as_deref() != Some(worker_id) {
            return JobOutcome::LostOwnership;
        }
        if fresh.cancel_requested {
            return JobOutcome::Cancelled;
        }

        let progress = JobProgress {
            files_done: attempted,
            emails_found: results.len() as u32,
            current_file: Some(file.name.clone()),
        };
        if let Err(e) = store.update_progress(job.id, worker_id, progress).await {
            warn!(job_id = %job.id, error = %e, "progress update failed");
        }

        attempted += 1;
        let path = data_dir.join(&file.path);
        match scanners.scan_file(&path, &file.meta()).await {
            Ok(mut stream) => {
                let mut failed = false;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(hit) => results.absorb(hit),
                        Err(e) => {
                            warn!(job_id = %job.id, file = %file.name, error = %e, "file scan aborted");
                            failures.push(format!("{}: {}", file.name, e));
                            failed = true;
                            break;
                        }
                    }
                }
                if !failed {
                    scanned += 1;
                }
            }
            Err(e) => {
                warn!(job_id = %job.id, file = %file.name, error = %e, "file skipped");
                failures.push(format!("{}: {}", file.name, e));
            }
        }
    }

    if scanned == 0 {
        return JobOutcome::Fatal {
            reason: format!("no processable input: {}", failures.join("; ")),
        };
    }

    JobOutcome::Finished {
        results,
        failures,
        attempted,
    }
}

async fn heartbeat_loop(
    store: Arc<dyn JobStore>,
    job_id: Uuid,
    worker_id: String,
    interval: Duration,
    lease: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // Skip the immediate first tick

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match store.heartbeat(job_id, &worker_id, lease).await {
                    Ok(()) => {}
                    Err(JobStoreError::NotOwner { .. } | JobStoreError::InvalidTransition { .. }) => {
                        warn!(job_id = %job_id, "job no longer owned; stopping heartbeats");
                        break;
                    }
                    Err(e) => warn!(job_id = %job_id, error = %e, "heartbeat failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.worker_count, 4);
        assert!(config.heartbeat_interval < Duration::from_secs(60));
    }
}
