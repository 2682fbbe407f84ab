//! Durable job store: one JSON document per job.
//!
//! The store is the single source of truth for job lifecycle. Records live
//! under `<data_dir>/jobs/<job_id>.json` and every write goes through a
//! write-to-temp + rename so readers only ever see whole documents. All
//! mutations run as read-check-write cycles under one async mutex, which is
//! what makes `claim_next` an atomic check-state-and-set: exactly one
//! claimant can move a job out of `Pending`.
//!
//! The claimable queue is not separate state: it is derived from the job
//! records on every poll, so it survives process restarts for free and the
//! gateway process can add jobs by simply writing new records.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use super::error::{JobResult, JobStoreError};
use super::job::{InputFileRef, Job, JobProgress, JobStatus, OutputRef};

/// Data-directory layout, shared between the gateway and worker processes.
pub const JOBS_DIR: &str = "jobs";
pub const UPLOADS_DIR: &str = "uploaded_files";
pub const OUTPUTS_DIR: &str = "outputs";

/// Trait for job persistence and lifecycle operations.
///
/// All state transitions are funneled through this interface; callers never
/// mutate job records directly.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a job for the given input files.
    ///
    /// Fails with `InvalidInput` if the list is empty or any referenced
    /// file is unreadable.
    async fn create(&self, input_files: Vec<InputFileRef>, max_attempts: u32) -> JobResult<Job>;

    /// Fetch a job snapshot. Never mutates.
    async fn get(&self, id: Uuid) -> JobResult<Job>;

    /// All jobs, newest first. Never mutates.
    async fn list(&self) -> JobResult<Vec<Job>>;

    /// Atomically claim the oldest `Pending` job, if any.
    ///
    /// The winner gets the job transitioned to `Running` with a fresh
    /// lease; concurrent claimants observe the job as no longer `Pending`.
    async fn claim_next(&self, worker_id: &str, lease: Duration) -> JobResult<Option<Job>>;

    /// Extend the lease of a running job owned by `worker_id`.
    async fn heartbeat(&self, id: Uuid, worker_id: &str, lease: Duration) -> JobResult<()>;

    /// Update advisory progress fields on a running job.
    async fn update_progress(
        &self,
        id: Uuid,
        worker_id: &str,
        progress: JobProgress,
    ) -> JobResult<()>;

    /// Transition a running job to `Completed` with its output reference.
    ///
    /// `error_summary` carries any per-file failures absorbed along the way.
    async fn complete(
        &self,
        id: Uuid,
        worker_id: &str,
        output: OutputRef,
        error_summary: Option<String>,
    ) -> JobResult<Job>;

    /// Transition a job to `Failed`, recording the reason.
    ///
    /// Pass the owning worker's ID when failing a running job; `None` is
    /// reserved for dispatcher-initiated failures.
    async fn fail(&self, id: Uuid, worker_id: Option<&str>, reason: &str) -> JobResult<Job>;

    /// Requeue running jobs whose lease lapsed (missed heartbeats).
    ///
    /// Jobs that already burned `max_attempts` claims transition to
    /// `Failed` instead. Returns every job that was touched, in its new
    /// state.
    async fn requeue_stale(&self, max_attempts: u32) -> JobResult<Vec<Job>>;

    /// Mark a job for cancellation.
    ///
    /// `Pending` jobs fail immediately; `Running` jobs get the cooperative
    /// flag and stop at the next input-file boundary; terminal jobs are
    /// left untouched.
    async fn request_cancel(&self, id: Uuid) -> JobResult<Job>;

    /// Open a completed job's output artifact for streaming.
    ///
    /// Fails with `NotReady` unless the job is `Completed`.
    async fn open_output(
        &self,
        id: Uuid,
    ) -> JobResult<(OutputRef, Pin<Box<dyn AsyncRead + Send>>)>;
}

/// Filesystem-backed [`JobStore`].
pub struct FsJobStore {
    data_dir: PathBuf,
    jobs_dir: PathBuf,
    /// Serializes every read-check-write cycle.
    write_lock: Mutex<()>,
}

impl FsJobStore {
    /// Open (and lay out) a store rooted at `data_dir`.
    pub async fn open(data_dir: impl Into<PathBuf>) -> JobResult<Self> {
        let data_dir = data_dir.into();
        let jobs_dir = data_dir.join(JOBS_DIR);

        fs::create_dir_all(&jobs_dir).await?;
        fs::create_dir_all(data_dir.join(UPLOADS_DIR)).await?;
        fs::create_dir_all(data_dir.join(OUTPUTS_DIR)).await?;

        Ok(Self {
            data_dir,
            jobs_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn job_path(&self, id: Uuid) -> PathBuf {
        self.jobs_dir.join(format!("{id}.json"))
    }

    async fn read_job(&self, id: Uuid) -> JobResult<Job> {
        let bytes = match fs::read(self.job_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(JobStoreError::NotFound(id));
            }
            Err(e) => return Err(JobStoreError::Storage(e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist a record atomically: whole-document write, then rename.
    async fn write_job(&self, job: &mut Job) -> JobResult<()> {
        job.updated_at = Utc::now();
        let bytes = serde_json::to_vec_pretty(job)?;
        let tmp = self.jobs_dir.join(format!("{}.json.tmp", job.id));
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, self.job_path(job.id)).await?;
        Ok(())
    }

    /// Scan the jobs directory. Unparseable records are skipped with a
    /// warning rather than poisoning every listing.
    async fn load_all(&self) -> JobResult<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(&self.jobs_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<Job>(&bytes) {
                    Ok(job) => jobs.push(job),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping corrupt job record"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable job record"),
            }
        }

        Ok(jobs)
    }

    fn lease_deadline(lease: Duration) -> chrono::DateTime<Utc> {
        Utc::now() + chrono::Duration::milliseconds(lease.as_millis() as i64)
    }

    fn ensure_transition(job: &Job, to: JobStatus) -> JobResult<()> {
        if !job.status.can_transition_to(to) {
            return Err(JobStoreError::InvalidTransition {
                id: job.id,
                from: job.status,
                to,
            });
        }
        Ok(())
    }

    fn ensure_owner(job: &Job, caller: &str) -> JobResult<()> {
        if job.worker_id.as_deref() != Some(caller) {
            return Err(JobStoreError::NotOwner {
                id: job.id,
                owner: job.worker_id.clone(),
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn fail_in_place(job: &mut Job, reason: &str) -> JobResult<()> {
        Self::ensure_transition(job, JobStatus::Failed)?;
        job.status = JobStatus::Failed;
        job.error_summary = Some(reason.to_string());
        job.completed_at = Some(Utc::now());
        job.lease_expires_at = None;
        job.current_file = None;
        Ok(())
    }
}

#[async_trait]
impl JobStore for FsJobStore {
    async fn create(&self, input_files: Vec<InputFileRef>, max_attempts: u32) -> JobResult<Job> {
        if input_files.is_empty() {
            return Err(JobStoreError::InvalidInput(
                "a job needs at least one input file".to_string(),
            ));
        }

        for file in &input_files {
            let path = self.data_dir.join(&file.path);
            if let Err(e) = fs::metadata(&path).await {
                return Err(JobStoreError::InvalidInput(format!(
                    "input file {} is not readable: {}",
                    file.name, e
                )));
            }
        }

        let mut job = Job::new(input_files, max_attempts);

        let _guard = self.write_lock.lock().await;
        self.write_job(&mut job).await?;
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> JobResult<Job> {
        self.read_job(id).await
    }

    async fn list(&self) -> JobResult<Vec<Job>> {
        let mut jobs = self.load_all().await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn claim_next(&self, worker_id: &str, lease: Duration) -> JobResult<Option<Job>> {
        let _guard = self.write_lock.lock().await;

        let mut candidates: Vec<Job> = self
            .load_all()
            .await?
            .into_iter()
            .filter(Job::is_claimable)
            .collect();
        // First-submitted-first-claimed; the ID tie-break keeps the order
        // deterministic when timestamps collide.
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let Some(mut job) = candidates.into_iter().next() else {
            return Ok(None);
        };

        Self::ensure_transition(&job, JobStatus::Running)?;
        job.status = JobStatus::Running;
        job.attempt += 1;
        job.worker_id = Some(worker_id.to_string());
        job.lease_expires_at = Some(Self::lease_deadline(lease));
        job.started_at.get_or_insert_with(Utc::now);
        job.current_file = None;

        self.write_job(&mut job).await?;
        Ok(Some(job))
    }

    async fn heartbeat(&self, id: Uuid, worker_id: &str, lease: Duration) -> JobResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut job = self.read_job(id).await?;
        if job.status != JobStatus::Running {
            return Err(JobStoreError::InvalidTransition {
                id,
                from: job.status,
                to: JobStatus::Running,
            });
        }
        Self::ensure_owner(&job, worker_id)?;

        job.lease_expires_at = Some(Self::lease_deadline(lease));
        self.write_job(&mut job).await
    }

    async fn update_progress(
        &self,
        id: Uuid,
        worker_id: &str,
        progress: JobProgress,
    ) -> JobResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut job = self.read_job(id).await?;
        if job.status != JobStatus::Running {
            return Err(JobStoreError::InvalidTransition {
                id,
                from: job.status,
                to: JobStatus::Running,
            });
        }
        Self::ensure_owner(&job, worker_id)?;

        job.files_done = progress.files_done;
        job.emails_found = progress.emails_found;
        job.current_file = progress.current_file;
        self.write_job(&mut job).await
    }

    async fn complete(
        &self,
        id: Uuid,
        worker_id: &str,
        output: OutputRef,
        error_summary: Option<String>,
    ) -> JobResult<Job> {
        let _guard = self.write_lock.lock().await;

        let mut job = self.read_job(id).await?;
        Self::ensure_transition(&job, JobStatus::Completed)?;
        Self::ensure_owner(&job, worker_id)?;

        job.status = JobStatus::Completed;
        job.output = Some(output);
        job.error_summary = error_summary;
        job.completed_at = Some(Utc::now());
        job.lease_expires_at = None;
        job.current_file = None;

        self.write_job(&mut job).await?;
        Ok(job)
    }

    async fn fail(&self, id: Uuid, worker_id: Option<&str>, reason: &str) -> JobResult<Job> {
        let _guard = self.write_lock.lock().await;

        let mut job = self.read_job(id).await?;
        if let Some(caller) = worker_id {
            Self::ensure_owner(&job, caller)?;
        }
        Self::fail_in_place(&mut job, reason)?;

        self.write_job(&mut job).await?;
        Ok(job)
    }

    async fn requeue_stale(&self, max_attempts: u32) -> JobResult<Vec<Job>> {
        let _guard = self.write_lock.lock().await;

        let now = Utc::now();
        let mut touched = Vec::new();

        for mut job in self.load_all().await? {
            if !job.lease_expired(now) {
                continue;
            }

            if job.attempt >= max_attempts {
                let reason = format!(
                    "gave up after {} attempts; worker missed liveness deadline",
                    job.attempt
                );
                Self::fail_in_place(&mut job, &reason)?;
            } else {
                Self::ensure_transition(&job, JobStatus::Pending)?;
                job.status = JobStatus::Pending;
                job.worker_id = None;
                job.lease_expires_at = None;
                job.current_file = None;
            }

            self.write_job(&mut job).await?;
            touched.push(job);
        }

        Ok(touched)
    }

    async fn request_cancel(&self, id: Uuid) -> JobResult<Job> {
        let _guard = self.write_lock.lock().await;

        let mut job = self.read_job(id).await?;
        match job.status {
            JobStatus::Pending => {
                Self::fail_in_place(&mut job, "cancelled before start")?;
                self.write_job(&mut job).await?;
            }
            JobStatus::Running => {
                job.cancel_requested = true;
                self.write_job(&mut job).await?;
            }
            // Cancelling a finished job is a no-op, not an error.
            JobStatus::Completed | JobStatus::Failed => {}
        }
        Ok(job)
    }

    async fn open_output(
        &self,
        id: Uuid,
    ) -> JobResult<(OutputRef, Pin<Box<dyn AsyncRead + Send>>)> {
        let job = self.read_job(id).await?;
        if job.status != JobStatus::Completed {
            return Err(JobStoreError::NotReady(id));
        }
        let output = job.output.ok_or(JobStoreError::NotReady(id))?;

        let file = fs::File::open(self.data_dir.join(&output.path)).await?;
        Ok((output, Box::pin(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn upload(store: &FsJobStore, name: &str, content: &[u8]) -> InputFileRef {
        let rel = format!("{UPLOADS_DIR}/test/{name}");
        let path = store.data_dir().join(&rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        InputFileRef {
            path: rel,
            name: name.to_string(),
            content_type: Some("text/plain".to_string()),
            size_bytes: content.len() as u64,
        }
    }

    async fn open_store() -> (tempfile::TempDir, FsJobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsJobStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    const LEASE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn create_rejects_empty_input_list() {
        let (_dir, store) = open_store().await;
        let err = store.create(vec![], 3).await.err().unwrap();
        assert!(matches!(err, JobStoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_rejects_unreadable_files() {
        let (_dir, store) = open_store().await;
        let missing = InputFileRef {
            path: format!("{UPLOADS_DIR}/test/ghost.txt"),
            name: "ghost.txt".to_string(),
            content_type: None,
            size_bytes: 0,
        };
        let err = store.create(vec![missing], 3).await.err().unwrap();
        assert!(matches!(err, JobStoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"x@y.com");
        let job = store.create(vec![file], 3).await.unwrap();

        let fetched = store.get(job.id).await.unwrap();
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.status, JobStatus::Pending);
        assert_eq!(fetched.input_files.len(), 1);
    }

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let (_dir, store) = open_store().await;
        let err = store.get(Uuid::new_v4()).await.err().unwrap();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn claims_follow_submission_order() {
        let (_dir, store) = open_store().await;
        let mut created = Vec::new();
        for i in 0..3 {
            let file = upload(&store, &format!("f{i}.txt"), b"a@b.com");
            created.push(store.create(vec![file], 3).await.unwrap().id);
        }

        for expected in created {
            let claimed = store.claim_next("w", LEASE).await.unwrap().unwrap();
            assert_eq!(claimed.id, expected);
        }
        assert!(store.claim_next("w", LEASE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();

        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .claim_next(&format!("worker-{i}"), LEASE)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let after = store.get(job.id).await.unwrap();
        assert_eq!(after.status, JobStatus::Running);
        assert_eq!(after.attempt, 1);
    }

    #[tokio::test]
    async fn claim_sets_lease_owner_and_started_at() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        store.create(vec![file], 3).await.unwrap();

        let claimed = store.claim_next("w1", LEASE).await.unwrap().unwrap();
        assert_eq!(claimed.worker_id.as_deref(), Some("w1"));
        assert!(claimed.lease_expires_at.is_some());
        assert!(claimed.started_at.is_some());
        assert_eq!(claimed.attempt, 1);
    }

    #[tokio::test]
    async fn heartbeat_requires_ownership() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        store.create(vec![file], 3).await.unwrap();
        let claimed = store.claim_next("w1", LEASE).await.unwrap().unwrap();

        assert!(store.heartbeat(claimed.id, "w1", LEASE).await.is_ok());
        let err = store.heartbeat(claimed.id, "w2", LEASE).await.err().unwrap();
        assert!(matches!(err, JobStoreError::NotOwner { .. }));
    }

    #[tokio::test]
    async fn heartbeat_keeps_a_job_off_the_stale_list() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        store.create(vec![file], 3).await.unwrap();
        let claimed = store
            .claim_next("w1", Duration::from_millis(30))
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.heartbeat(claimed.id, "w1", LEASE).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.requeue_stale(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_job_requeues_exactly_once() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store
            .claim_next("w1", Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let touched = store.requeue_stale(3).await.unwrap();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].status, JobStatus::Pending);
        assert!(touched[0].worker_id.is_none());

        // Already back in Pending: a second sweep finds nothing.
        assert!(store.requeue_stale(3).await.unwrap().is_empty());

        let after = store.get(job.id).await.unwrap();
        assert_eq!(after.status, JobStatus::Pending);
        assert_eq!(after.attempt, 1);
    }

    #[tokio::test]
    async fn exhausted_attempts_fail_on_requeue() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 1).await.unwrap();
        store
            .claim_next("w1", Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let touched = store.requeue_stale(1).await.unwrap();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].status, JobStatus::Failed);

        let after = store.get(job.id).await.unwrap();
        assert_eq!(after.status, JobStatus::Failed);
        assert!(after.error_summary.as_deref().unwrap().contains("gave up"));
    }

    #[tokio::test]
    async fn complete_sets_output_and_snapshots_stay_identical() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store.claim_next("w1", LEASE).await.unwrap().unwrap();

        let output = OutputRef {
            path: format!("{OUTPUTS_DIR}/{}.json", job.id),
            size_bytes: 2,
            sha256: "00".to_string(),
            addresses: 1,
        };
        store.complete(job.id, "w1", output.clone(), None).await.unwrap();

        let first = store.get(job.id).await.unwrap();
        let second = store.get(job.id).await.unwrap();
        assert_eq!(first.status, JobStatus::Completed);
        assert_eq!(first.output, Some(output));
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn terminal_jobs_reject_every_transition() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store.claim_next("w1", LEASE).await.unwrap().unwrap();
        store.fail(job.id, Some("w1"), "boom").await.unwrap();

        let before = store.get(job.id).await.unwrap();

        let output = OutputRef {
            path: "outputs/x.json".to_string(),
            size_bytes: 0,
            sha256: String::new(),
            addresses: 0,
        };
        assert!(matches!(
            store.complete(job.id, "w1", output, None).await,
            Err(JobStoreError::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.fail(job.id, None, "again").await,
            Err(JobStoreError::InvalidTransition { .. })
        ));
        assert!(store.requeue_stale(3).await.unwrap().is_empty());

        let after = store.get(job.id).await.unwrap();
        assert_eq!(
            serde_json::to_value(&before).unwrap(),
            serde_json::to_value(&after).unwrap()
        );
    }

    #[tokio::test]
    async fn complete_requires_ownership() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store.claim_next("w1", LEASE).await.unwrap().unwrap();

        let output = OutputRef {
            path: "outputs/x.json".to_string(),
            size_bytes: 0,
            sha256: String::new(),
            addresses: 0,
        };
        let err = store
            .complete(job.id, "w2", output, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, JobStoreError::NotOwner { .. }));
    }

    #[tokio::test]
    async fn cancel_pending_fails_immediately() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();

        let cancelled = store.request_cancel(job.id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Failed);
        assert_eq!(
            cancelled.error_summary.as_deref(),
            Some("cancelled before start")
        );
        // And it is no longer claimable.
        assert!(store.claim_next("w", LEASE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancel_running_sets_the_cooperative_flag() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store.claim_next("w1", LEASE).await.unwrap().unwrap();

        let cancelled = store.request_cancel(job.id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Running);
        assert!(cancelled.cancel_requested);
    }

    #[tokio::test]
    async fn cancel_terminal_job_is_a_noop() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();
        store.claim_next("w1", LEASE).await.unwrap().unwrap();
        store.fail(job.id, Some("w1"), "boom").await.unwrap();

        let after = store.request_cancel(job.id).await.unwrap();
        assert_eq!(after.status, JobStatus::Failed);
        assert_eq!(after.error_summary.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn reopening_the_store_rehydrates_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let id;
        {
            let store = FsJobStore::open(dir.path()).await.unwrap();
            let file = upload(&store, "a.txt", b"a@b.com");
            id = store.create(vec![file], 3).await.unwrap().id;
        }

        let store = FsJobStore::open(dir.path()).await.unwrap();
        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, id);

        // And it is still claimable after the restart.
        let claimed = store.claim_next("w1", LEASE).await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
    }

    #[tokio::test]
    async fn open_output_is_not_ready_before_completion() {
        let (_dir, store) = open_store().await;
        let file = upload(&store, "a.txt", b"a@b.com");
        let job = store.create(vec![file], 3).await.unwrap();

        let err = store.open_output(job.id).await.err().unwrap();
        assert!(matches!(err, JobStoreError::NotReady(_)));
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let (_dir, store) = open_store().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let file = upload(&store, &format!("f{i}.txt"), b"a@b.com");
            ids.push(store.create(vec![file], 3).await.unwrap().id);
        }

        let listed: Vec<_> = store.list().await.unwrap().iter().map(|j| j.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
