//! Job model for asynchronous extraction requests.

use chrono::{DateTime, Utc};
use extraction::FileMeta;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The legal state machine: `Pending -> Running -> {Completed, Failed}`,
    /// `Running -> Pending` as a crash-recovery requeue, and
    /// `Pending -> Failed` for immediate cancellation.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Pending)
        )
    }
}

// ============================================================================
// References
// ============================================================================

/// One uploaded input file. Immutable once the job is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFileRef {
    /// Path relative to the data directory
    pub path: String,
    /// Original file name
    pub name: String,
    /// Declared or sniffed MIME type
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

impl InputFileRef {
    /// Scanner-facing metadata for this file.
    pub fn meta(&self) -> FileMeta {
        let mut meta = FileMeta::new(self.name.clone()).with_size(self.size_bytes);
        if let Some(ct) = &self.content_type {
            meta = meta.with_content_type(ct.clone());
        }
        meta
    }
}

/// Reference to a written output artifact. Set if and only if the job
/// completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Path relative to the data directory
    pub path: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the artifact bytes
    pub sha256: String,
    /// Number of distinct addresses in the artifact
    pub addresses: u32,
}

/// Advisory progress fields, updated by the owning worker between files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub files_done: u32,
    pub emails_found: u32,
    pub current_file: Option<String>,
}

// ============================================================================
// Job Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub input_files: Vec<InputFileRef>,

    #[builder(default)]
    pub status: JobStatus,

    // Retry accounting
    #[builder(default = 0u32)]
    pub attempt: u32,
    #[builder(default = 3u32)]
    pub max_attempts: u32,

    // Ownership and liveness
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,
    #[builder(default, setter(strip_option))]
    pub lease_expires_at: Option<DateTime<Utc>>,

    // Cooperative cancellation
    #[builder(default = false)]
    pub cancel_requested: bool,

    // Progress
    #[builder(default = 0u32)]
    pub files_done: u32,
    #[builder(default = 0u32)]
    pub emails_found: u32,
    #[builder(default, setter(strip_option))]
    pub current_file: Option<String>,

    // Outcome
    #[builder(default, setter(strip_option))]
    pub error_summary: Option<String>,
    #[builder(default, setter(strip_option))]
    pub output: Option<OutputRef>,

    // Timestamps
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub started_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a fresh pending job (convenience constructor).
    pub fn new(input_files: Vec<InputFileRef>, max_attempts: u32) -> Self {
        Self::builder()
            .input_files(input_files)
            .max_attempts(max_attempts)
            .build()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether a worker may claim this job right now.
    pub fn is_claimable(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// Whether a running job's lease has lapsed (missed heartbeats).
    ///
    /// A running job without a lease is treated as stale: that state can
    /// only come from a torn record and recovery is the safe answer.
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running
            && self.lease_expires_at.map_or(true, |at| at < now)
    }

    /// Total number of input files.
    pub fn files_total(&self) -> u32 {
        self.input_files.len() as u32
    }
}
