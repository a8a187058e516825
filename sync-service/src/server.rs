//! The sync service: what a listening peer does for Fetch and
//! Accept-Changes, independent of HTTP.

use crate::config::Config;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vaultsync_types::{ChangeRecord, FileRecord};
use vaultsync_vault::{
    apply_changes, build_snapshot, collect_records, ApplyReport, BaselineStore, StateStore, Vault,
    VaultError,
};

/// Operational counters.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Total Fetch requests served.
    pub fetches_total: AtomicU64,
    /// Total Accept-Changes batches processed.
    pub changes_total: AtomicU64,
    /// Total files written from received changes.
    pub files_written: AtomicU64,
    /// Total files that failed to write.
    pub files_failed: AtomicU64,
    /// Total content bytes sent in Fetch responses.
    pub bytes_sent: AtomicU64,
    /// Total content bytes received in changes.
    pub bytes_received: AtomicU64,
    /// Total rejected or failed requests.
    pub errors_total: AtomicU64,
    /// Total listening sessions started.
    pub sessions_total: AtomicU64,
}

/// The serving side of a sync.
pub struct SyncService {
    config: Config,
    vault: Arc<dyn Vault>,
    baseline: BaselineStore<Arc<dyn StateStore>>,
    /// Serializes Accept-Changes batches.
    apply_lock: Mutex<()>,
    metrics: ServiceMetrics,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl SyncService {
    /// Create a service over a vault and its state store.
    pub fn new(config: Config, vault: Arc<dyn Vault>, state: Arc<dyn StateStore>) -> Self {
        Self {
            config,
            vault,
            baseline: BaselineStore::new(state),
            apply_lock: Mutex::new(()),
            metrics: ServiceMetrics::default(),
        }
    }

    /// Get the service configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the vault being served.
    pub fn vault(&self) -> &dyn Vault {
        self.vault.as_ref()
    }

    /// Get the baseline store.
    pub fn baseline(&self) -> &BaselineStore<Arc<dyn StateStore>> {
        &self.baseline
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    /// Every file in the vault with its digest and content.
    pub async fn fetch(&self) -> Result<Vec<FileRecord>, VaultError> {
        let records = collect_records(self.vault.as_ref()).await?;

        let bytes: usize = records.iter().map(|r| r.data.len()).sum();
        self.metrics.fetches_total.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_sent
            .fetch_add(bytes as u64, Ordering::Relaxed);
        debug!(files = records.len(), bytes, "Serving fetch");

        Ok(records)
    }

    /// Write a batch of changes, then save the resulting snapshot as the new
    /// baseline.
    ///
    /// Per-file write failures are reported in the returned
    /// [`ApplyReport`]; the baseline is saved regardless so that it reflects
    /// the files that did land. An error is returned only when the snapshot
    /// or the baseline cannot be produced.
    pub async fn accept_changes(
        &self,
        changes: Vec<ChangeRecord>,
    ) -> Result<ApplyReport, VaultError> {
        let _guard = self.apply_lock.lock().await;

        let count = changes.len();
        let bytes: usize = changes.iter().map(|c| c.data.len()).sum();
        self.metrics
            .bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);

        let report = apply_changes(self.vault.as_ref(), changes).await;

        let snapshot = build_snapshot(self.vault.as_ref()).await?;
        self.baseline.save(&snapshot).await?;

        self.metrics.changes_total.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .files_written
            .fetch_add(report.written.len() as u64, Ordering::Relaxed);
        self.metrics
            .files_failed
            .fetch_add(report.failed.len() as u64, Ordering::Relaxed);

        if report.is_ok() {
            info!(
                received = count,
                written = report.written.len(),
                unchanged = report.unchanged.len(),
                "Accepted changes"
            );
        } else {
            warn!(
                received = count,
                failed = report.failed.len(),
                "Accepted changes with failures"
            );
        }

        Ok(report)
    }

    /// Record a rejected or failed request.
    pub fn record_error(&self) {
        self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
    }
}
