//! Typed errors for the job layer.

use thiserror::Error;
use uuid::Uuid;

use super::job::JobStatus;

/// Errors surfaced by the job store and dispatcher.
///
/// Query errors (`NotFound`, `NotReady`) never mutate state; transition
/// errors (`InvalidTransition`, `NotOwner`) leave the record untouched.
#[derive(Debug, Error)]
pub enum JobStoreError {
    /// Malformed request; no job was created
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown job ID
    #[error("job {0} not found")]
    NotFound(Uuid),

    /// Output requested before the job completed
    #[error("job {0} has no output artifact yet")]
    NotReady(Uuid),

    /// The requested state change is not permitted by the state machine
    #[error("job {id}: illegal transition {from:?} -> {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    /// A worker tried to act on a job it no longer owns
    #[error("job {id} is owned by {owner:?}, not {caller}")]
    NotOwner {
        id: Uuid,
        owner: Option<String>,
        caller: String,
    },

    /// Reading or writing the durable record failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A durable record could not be (de)serialized
    #[error("corrupt job record: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for job-store operations.
pub type JobResult<T> = std::result::Result<T, JobStoreError>;
