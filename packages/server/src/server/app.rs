//! Application setup and server configuration.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Extension};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::JobStore;
use crate::server::routes::{
    cancel_job_handler, create_job_handler, download_output_handler, get_job_handler,
    health_handler, list_jobs_handler,
};

/// Maximum accepted upload size (all parts combined).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub data_dir: PathBuf,
    pub max_attempts: u32,
}

/// Build the gateway router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/jobs", post(create_job_handler).get(list_jobs_handler))
        .route("/jobs/:id", get(get_job_handler))
        .route("/jobs/:id/output", get(download_output_handler))
        .route("/jobs/:id/cancel", post(cancel_job_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
