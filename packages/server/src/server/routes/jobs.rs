//! Job lifecycle routes: upload, status, artifact download, cancellation.

use std::path::Path;

use axum::body::Body;
use axum::extract::{Extension, Multipart, Path as UrlPath};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

use super::ApiError;
use crate::kernel::jobs::UPLOADS_DIR;
use crate::kernel::{InputFileRef, Job, JobStatus, JobStoreError, OutputRef};
use crate::server::app::AppState;

/// Caller-facing view of a job record.
#[derive(Debug, Serialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    pub files_total: u32,
    pub files_done: u32,
    pub emails_found: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputRef>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            files_total: job.files_total(),
            files_done: job.files_done,
            emails_found: job.emails_found,
            current_file: job.current_file.clone(),
            attempt: job.attempt,
            error_summary: job.error_summary.clone(),
            output: job.output.clone(),
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// `POST /jobs`: multipart upload creating one job over all uploaded files.
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let batch_id = Uuid::new_v4();
    let upload_rel = format!("{UPLOADS_DIR}/{batch_id}");
    let upload_dir = state.data_dir.join(&upload_rel);

    let mut input_files: Vec<InputFileRef> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JobStoreError::InvalidInput(format!("malformed multipart request: {e}")))?
    {
        // Only file parts carry a filename; plain form fields are ignored.
        let Some(file_name) = field.file_name().map(sanitize_file_name) else {
            continue;
        };
        let declared_type = field.content_type().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| JobStoreError::InvalidInput(format!("upload truncated: {e}")))?;

        if input_files.is_empty() {
            fs::create_dir_all(&upload_dir)
                .await
                .map_err(JobStoreError::Storage)?;
        }

        fs::write(upload_dir.join(&file_name), &data)
            .await
            .map_err(JobStoreError::Storage)?;

        let content_type = declared_type.or_else(|| {
            mime_guess::from_path(&file_name)
                .first_raw()
                .map(|m| m.to_string())
        });

        input_files.push(InputFileRef {
            path: format!("{upload_rel}/{file_name}"),
            name: file_name,
            content_type,
            size_bytes: data.len() as u64,
        });
    }

    let job = state.store.create(input_files, state.max_attempts).await?;
    info!(job_id = %job.id, files = job.input_files.len(), "job created");

    Ok((StatusCode::CREATED, Json(JobSnapshot::from(&job))))
}

/// `GET /jobs`: all jobs, newest first.
pub async fn list_jobs_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<JobSnapshot>>, ApiError> {
    let jobs = state.store.list().await?;
    Ok(Json(jobs.iter().map(JobSnapshot::from).collect()))
}

/// `GET /jobs/:id`: one job snapshot.
pub async fn get_job_handler(
    Extension(state): Extension<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job = state.store.get(id).await?;
    Ok(Json(JobSnapshot::from(&job)))
}

/// `GET /jobs/:id/output`: stream the output artifact of a completed job.
pub async fn download_output_handler(
    Extension(state): Extension<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (output, reader) = state.store.open_output(id).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (header::CONTENT_LENGTH, output.size_bytes.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}.json\""),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(reader));

    Ok((headers, body))
}

/// `POST /jobs/:id/cancel`: immediate for pending jobs, cooperative for
/// running ones.
pub async fn cancel_job_handler(
    Extension(state): Extension<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job = state.store.request_cancel(id).await?;
    info!(job_id = %id, status = ?job.status, "cancellation requested");
    Ok(Json(JobSnapshot::from(&job)))
}

/// Strip any path components an upload name may smuggle in.
fn sanitize_file_name(raw: &str) -> String {
    let name = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        "upload.bin".to_string()
    } else {
        name.to_string()
    }
}
