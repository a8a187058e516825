//! Baseline store: the snapshot remembered from the last completed sync.
//!
//! Loading is advisory. A missing, unreadable or unparseable baseline
//! yields an empty snapshot, which makes the next sync treat every file as
//! new on both sides.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use vaultsync_types::Snapshot;

use crate::error::VaultError;
use crate::state::StateStore;

/// Current on-disk schema version.
pub const BASELINE_VERSION: u32 = 1;

/// The persisted baseline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRecord {
    /// Schema version.
    pub version: u32,
    /// Unix seconds at which the baseline was saved.
    pub saved_at: u64,
    /// Path to digest map.
    pub files: Snapshot,
}

/// Loads and saves the baseline through a [`StateStore`].
pub struct BaselineStore<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: StateStore> BaselineStore<S> {
    /// Wrap a state store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying state store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the full baseline record, if a valid one exists.
    pub async fn load_record(&self) -> Option<BaselineRecord> {
        let value = match self.store.load_json().await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("No baseline saved yet");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not read baseline, treating as empty");
                return None;
            }
        };

        match serde_json::from_value::<BaselineRecord>(value) {
            Ok(record) if record.version == BASELINE_VERSION => Some(record),
            Ok(record) => {
                warn!(version = record.version, "Unsupported baseline version, treating as empty");
                None
            }
            Err(e) => {
                warn!(error = %e, "Corrupt baseline, treating as empty");
                None
            }
        }
    }

    /// Load the baseline snapshot; empty if none is usable.
    pub async fn load(&self) -> Snapshot {
        self.load_record()
            .await
            .map(|r| r.files)
            .unwrap_or_default()
    }

    /// Persist `snapshot` as the new baseline.
    ///
    /// Concurrent saves are serialized; the last one to run wins.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), VaultError> {
        let _guard = self.write_lock.lock().await;

        let record = BaselineRecord {
            version: BASELINE_VERSION,
            saved_at: now_secs(),
            files: snapshot.clone(),
        };
        self.store.save_json(&serde_json::to_value(&record)?).await?;

        debug!(files = snapshot.len(), "Saved baseline");
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{JsonFileStore, MemoryStateStore};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;
    use vaultsync_types::{ContentDigest, PathKey};

    fn snapshot(files: &[(&str, &[u8])]) -> Snapshot {
        files
            .iter()
            .map(|(p, c)| (PathKey::new(p).unwrap(), ContentDigest::of(c)))
            .collect()
    }

    #[tokio::test]
    async fn absent_baseline_is_empty() {
        let baseline = BaselineStore::new(MemoryStateStore::new());
        assert!(baseline.load().await.is_empty());
        assert!(baseline.load_record().await.is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let baseline = BaselineStore::new(MemoryStateStore::new());
        let snap = snapshot(&[("a.md", b"1"), ("dir/b.md", b"2")]);

        baseline.save(&snap).await.unwrap();

        assert_eq!(baseline.load().await, snap);
        let record = baseline.load_record().await.unwrap();
        assert_eq!(record.version, BASELINE_VERSION);
        assert!(record.saved_at > 0);
    }

    #[tokio::test]
    async fn document_layout() {
        let store = MemoryStateStore::new();
        let baseline = BaselineStore::new(store.clone());

        baseline.save(&snapshot(&[("a", b"")])).await.unwrap();

        let raw = store.raw().unwrap();
        assert_eq!(raw["version"], json!(1));
        assert_eq!(
            raw["files"]["a"],
            json!("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[tokio::test]
    async fn corrupt_baseline_is_empty() {
        let store = MemoryStateStore::new();
        store.set_raw(json!({"version": 1, "files": "not a map"}));

        let baseline = BaselineStore::new(store);

        assert!(baseline.load().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_path_in_baseline_is_empty() {
        let store = MemoryStateStore::new();
        store.set_raw(json!({
            "version": 1,
            "saved_at": 0,
            "files": {"../escape": "da39a3ee5e6b4b0d3255bfef95601890afd80709"}
        }));

        assert!(BaselineStore::new(store).load().await.is_empty());
    }

    #[tokio::test]
    async fn future_version_is_empty() {
        let store = MemoryStateStore::new();
        store.set_raw(json!({"version": 99, "saved_at": 0, "files": {}}));

        assert!(BaselineStore::new(store).load().await.is_empty());
    }

    #[tokio::test]
    async fn unparseable_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, b"\0\0garbage").unwrap();

        let baseline = BaselineStore::new(JsonFileStore::new(&path));

        assert!(baseline.load().await.is_empty());
    }

    #[tokio::test]
    async fn file_backed_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".vaultsync/baseline.json");
        let snap = snapshot(&[("x.md", b"x")]);

        BaselineStore::new(JsonFileStore::new(&path))
            .save(&snap)
            .await
            .unwrap();

        let reopened = BaselineStore::new(JsonFileStore::new(&path));
        assert_eq!(reopened.load().await, snap);
    }

    #[tokio::test]
    async fn concurrent_saves_leave_one_complete_document() {
        let store = MemoryStateStore::new();
        let baseline = Arc::new(BaselineStore::new(store.clone()));

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let baseline = baseline.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("f{}", i);
                let snap = snapshot(&[(name.as_str(), &[i][..])]);
                baseline.save(&snap).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.save_count(), 8);
        assert_eq!(baseline.load().await.len(), 1);
    }
}
