//! HTTP endpoints for sync-service.
//!
//! - `GET /hashes`: every vault file with digest and base64 content
//! - `POST /changes`: write pushed files, then save the baseline
//! - `GET /health`: status and counters

pub mod health;
mod sync;

use crate::server::SyncService;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(service: Arc<SyncService>) -> Router {
    let body_limit = service.config().http.max_body_bytes;
    Router::new()
        .route("/hashes", get(sync::hashes_handler))
        .route("/changes", post(sync::changes_handler))
        .route("/health", get(health::health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(service))
}
