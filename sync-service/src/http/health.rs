//! Health check endpoint.

use crate::server::SyncService;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Global start time for uptime calculation.
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call once at startup).
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Fetch requests served.
    pub fetches: u64,
    /// Change batches accepted.
    pub changes: u64,
    /// Files written from received changes.
    pub files_written: u64,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
pub async fn health_handler(
    Extension(service): Extension<Arc<SyncService>>,
) -> Json<HealthStatus> {
    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);
    let m = service.metrics();

    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        fetches: m.fetches_total.load(Ordering::Relaxed),
        changes: m.changes_total.load(Ordering::Relaxed),
        files_written: m.files_written.load(Ordering::Relaxed),
        uptime_seconds: uptime,
    })
}
