//! Output artifact: the immutable, downloadable result of a completed job.

use std::path::Path;

use chrono::{DateTime, Utc};
use extraction::{EmailEntry, ResultSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use super::error::JobResult;
use super::job::OutputRef;
use super::store::OUTPUTS_DIR;

/// The artifact document written to `<data_dir>/outputs/<job_id>.json`.
///
/// Written once, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub job_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Distinct addresses
    pub total_addresses: u32,
    /// Raw occurrences across all sources
    pub total_occurrences: u64,
    pub entries: Vec<EmailEntry>,
}

impl OutputArtifact {
    pub fn from_results(job_id: Uuid, results: ResultSet) -> Self {
        Self {
            job_id,
            generated_at: Utc::now(),
            total_addresses: results.len() as u32,
            total_occurrences: results.total_occurrences(),
            entries: results.into_entries(),
        }
    }
}

/// Durably write a job's artifact and return the reference to record on the
/// job. Uses write-to-temp + rename so a crash never leaves a partial
/// artifact behind.
pub async fn write_artifact(
    data_dir: &Path,
    job_id: Uuid,
    results: ResultSet,
) -> JobResult<OutputRef> {
    let artifact = OutputArtifact::from_results(job_id, results);
    let bytes = serde_json::to_vec_pretty(&artifact)?;

    let rel = format!("{OUTPUTS_DIR}/{job_id}.json");
    let path = data_dir.join(&rel);
    let tmp = data_dir.join(format!("{OUTPUTS_DIR}/{job_id}.json.tmp"));

    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, &path).await?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);

    Ok(OutputRef {
        path: rel,
        size_bytes: bytes.len() as u64,
        sha256: hex::encode(hasher.finalize()),
        addresses: artifact.total_addresses,
    })
}
