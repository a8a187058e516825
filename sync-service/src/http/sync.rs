//! Fetch and Accept-Changes handlers.

use crate::server::SyncService;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::{debug, warn};
use vaultsync_types::{ChangeRecord, ErrorBody};

fn error_response(status: StatusCode, error: String, failed: Vec<String>) -> Response {
    (status, Json(ErrorBody { error, failed })).into_response()
}

/// `GET /hashes`
pub async fn hashes_handler(Extension(service): Extension<Arc<SyncService>>) -> Response {
    match service.fetch().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            warn!(error = %e, "Fetch failed");
            service.record_error();
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Vec::new())
        }
    }
}

/// `POST /changes`
///
/// The body is taken as raw bytes and decoded here so that a bad body gets
/// a JSON error instead of the extractor's plain-text rejection.
pub async fn changes_handler(
    Extension(service): Extension<Arc<SyncService>>,
    body: Bytes,
) -> Response {
    let changes: Vec<ChangeRecord> = match serde_json::from_slice(&body) {
        Ok(changes) => changes,
        Err(e) => {
            debug!(error = %e, "Rejected malformed changes body");
            service.record_error();
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("malformed request body: {}", e),
                Vec::new(),
            );
        }
    };

    match service.accept_changes(changes).await {
        Ok(report) if report.is_ok() => StatusCode::OK.into_response(),
        Ok(report) => {
            service.record_error();
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} file(s) could not be written", report.failed.len()),
                report.failed_paths(),
            )
        }
        Err(e) => {
            warn!(error = %e, "Accept-Changes failed");
            service.record_error();
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Vec::new())
        }
    }
}
