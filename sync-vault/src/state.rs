//! Persistent key-less state storage.
//!
//! A [`StateStore`] holds a single JSON document. The baseline store layers
//! its schema on top; the store itself only guarantees that a save either
//! fully replaces the previous document or leaves it untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::VaultError;

/// Trait for storing one JSON document.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the stored document, `None` if nothing was ever saved.
    async fn load_json(&self) -> Result<Option<Value>, VaultError>;

    /// Replace the stored document.
    async fn save_json(&self, value: &Value) -> Result<(), VaultError>;
}

/// State stored in a JSON file.
///
/// Saves go to a sibling temporary file which is fsynced and then renamed
/// over the target, so a crash never leaves a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_json(&self) -> Result<Option<Value>, VaultError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::io(self.path.display(), e)),
        };
        Ok(Some(serde_json::from_slice(&contents)?))
    }

    async fn save_json(&self, value: &Value) -> Result<(), VaultError> {
        let bytes = serde_json::to_vec_pretty(value)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultError::io(self.path.display(), e))?;
        }

        let tmp = self.tmp_path();
        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            set_file_permissions_0600(&tmp).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(VaultError::io(self.path.display(), e));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn load_json(&self) -> Result<Option<Value>, VaultError> {
        (**self).load_json().await
    }

    async fn save_json(&self, value: &Value) -> Result<(), VaultError> {
        (**self).save_json(value).await
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// In-memory state store for testing.
#[derive(Default, Clone)]
pub struct MemoryStateStore {
    value: Arc<Mutex<Option<Value>>>,
    saves: Arc<AtomicU64>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored document directly (e.g. with a corrupt value).
    pub fn set_raw(&self, value: Value) {
        *self.value.lock().unwrap() = Some(value);
    }

    /// The stored document.
    pub fn raw(&self) -> Option<Value> {
        self.value.lock().unwrap().clone()
    }

    /// Number of saves since creation.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_json(&self) -> Result<Option<Value>, VaultError> {
        Ok(self.value.lock().unwrap().clone())
    }

    async fn save_json(&self, value: &Value) -> Result<(), VaultError> {
        *self.value.lock().unwrap() = Some(value.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
