//! The vault abstraction.
//!
//! A vault is a flat set of files addressed by [`PathKey`]. This module
//! provides the trait plus a memory-based implementation for testing; the
//! directory-backed implementation lives in [`crate::fs`].

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vaultsync_types::PathKey;

use crate::error::VaultError;

/// Trait for the file tree being synchronized.
#[async_trait]
pub trait Vault: Send + Sync {
    /// List every file in the vault, excluding ignored entries.
    async fn list_files(&self) -> Result<Vec<PathKey>, VaultError>;

    /// Read a file's exact bytes.
    ///
    /// Returns `NotFound` if the path does not exist.
    async fn read_bytes(&self, path: &PathKey) -> Result<Vec<u8>, VaultError>;

    /// Create or overwrite a file, creating parent directories as needed.
    async fn write_bytes(&self, path: &PathKey, data: &[u8]) -> Result<(), VaultError>;

    /// Check if a file exists.
    async fn exists(&self, path: &PathKey) -> bool;
}

#[derive(Default)]
struct MemoryInner {
    files: BTreeMap<PathKey, Vec<u8>>,
    read_only: HashSet<PathKey>,
}

/// In-memory vault for testing.
///
/// Not persistent - all data is lost when the last clone is dropped.
#[derive(Default, Clone)]
pub struct MemoryVault {
    inner: Arc<Mutex<MemoryInner>>,
    writes: Arc<AtomicU64>,
}

impl MemoryVault {
    /// Create a new empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault pre-populated with `(path, content)` pairs.
    ///
    /// # Panics
    /// Panics if a path is invalid. Intended for test fixtures.
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        let vault = Self::new();
        {
            let mut inner = vault.inner.lock().unwrap();
            for (path, data) in files {
                let key = PathKey::new(path).expect("valid fixture path");
                inner.files.insert(key, data.to_vec());
            }
        }
        vault
    }

    /// Make writes to `path` fail.
    pub fn deny_writes(&self, path: &PathKey) {
        self.inner.lock().unwrap().read_only.insert(path.clone());
    }

    /// Current content of `path`, if present.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        let key = PathKey::new(path).ok()?;
        self.inner.lock().unwrap().files.get(&key).cloned()
    }

    /// Number of files currently stored.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }

    /// Check if the vault is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().files.is_empty()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn list_files(&self) -> Result<Vec<PathKey>, VaultError> {
        Ok(self.inner.lock().unwrap().files.keys().cloned().collect())
    }

    async fn read_bytes(&self, path: &PathKey) -> Result<Vec<u8>, VaultError> {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| VaultError::NotFound {
                path: path.to_string(),
            })
    }

    async fn write_bytes(&self, path: &PathKey, data: &[u8]) -> Result<(), VaultError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.read_only.contains(path) {
            return Err(VaultError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        inner.files.insert(path.clone(), data.to_vec());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn exists(&self, path: &PathKey) -> bool {
        self.inner.lock().unwrap().files.contains_key(path)
    }
}

#[async_trait]
impl<T: Vault + ?Sized> Vault for Arc<T> {
    async fn list_files(&self) -> Result<Vec<PathKey>, VaultError> {
        (**self).list_files().await
    }

    async fn read_bytes(&self, path: &PathKey) -> Result<Vec<u8>, VaultError> {
        (**self).read_bytes(path).await
    }

    async fn write_bytes(&self, path: &PathKey, data: &[u8]) -> Result<(), VaultError> {
        (**self).write_bytes(path, data).await
    }

    async fn exists(&self, path: &PathKey) -> bool {
        (**self).exists(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> PathKey {
        PathKey::new(path).unwrap()
    }

    #[tokio::test]
    async fn memory_vault_write_read() {
        let vault = MemoryVault::new();
        vault.write_bytes(&key("notes/a.md"), b"hello").await.unwrap();

        assert_eq!(vault.read_bytes(&key("notes/a.md")).await.unwrap(), b"hello");
        assert!(vault.exists(&key("notes/a.md")).await);
        assert_eq!(vault.write_count(), 1);
    }

    #[tokio::test]
    async fn memory_vault_not_found() {
        let vault = MemoryVault::new();
        let result = vault.read_bytes(&key("missing.md")).await;
        assert!(matches!(result, Err(VaultError::NotFound { .. })));
    }

    #[tokio::test]
    async fn memory_vault_lists_sorted() {
        let vault = MemoryVault::with_files([("b.md", &b"2"[..]), ("a.md", &b"1"[..])]);
        let files = vault.list_files().await.unwrap();
        assert_eq!(files, vec![key("a.md"), key("b.md")]);
    }

    #[tokio::test]
    async fn memory_vault_denied_write_fails() {
        let vault = MemoryVault::with_files([("locked.md", &b"old"[..])]);
        vault.deny_writes(&key("locked.md"));

        let result = vault.write_bytes(&key("locked.md"), b"new").await;

        assert!(matches!(result, Err(VaultError::Io { .. })));
        assert_eq!(vault.get("locked.md").unwrap(), b"old");
        assert_eq!(vault.write_count(), 0);
    }
}
