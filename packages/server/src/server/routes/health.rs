use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::kernel::JobStatus;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    jobs: JobCounts,
}

#[derive(Serialize, Default)]
pub struct JobCounts {
    pending: usize,
    running: usize,
    completed: usize,
    failed: usize,
}

/// Health check endpoint
///
/// Verifies the job store is readable and reports queue depth by state.
/// Returns 200 OK when healthy, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.store.list().await {
        Ok(jobs) => {
            let mut counts = JobCounts::default();
            for job in &jobs {
                match job.status {
                    JobStatus::Pending => counts.pending += 1,
                    JobStatus::Running => counts.running += 1,
                    JobStatus::Completed => counts.completed += 1,
                    JobStatus::Failed => counts.failed += 1,
                }
            }
            (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "ok".to_string(),
                    error: None,
                    jobs: counts,
                }),
            )
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "error".to_string(),
                error: Some(format!("job store unavailable: {e}")),
                jobs: JobCounts::default(),
            }),
        ),
    }
}
