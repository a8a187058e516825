//! Snapshot builder: hash every file in a vault.

use tracing::debug;
use vaultsync_types::{ContentDigest, FileRecord, Snapshot};

use crate::error::VaultError;
use crate::vault::Vault;

/// Compute the digest of every file in `vault`.
///
/// A read failure aborts the whole build; files are never left out.
pub async fn build_snapshot(vault: &dyn Vault) -> Result<Snapshot, VaultError> {
    let mut snapshot = Snapshot::new();
    for path in vault.list_files().await? {
        let data = vault.read_bytes(&path).await?;
        snapshot.insert(path, ContentDigest::of(&data));
    }
    debug!(files = snapshot.len(), "Built snapshot");
    Ok(snapshot)
}

/// Like [`build_snapshot`], but keeps each file's content.
pub async fn collect_records(vault: &dyn Vault) -> Result<Vec<FileRecord>, VaultError> {
    let paths = vault.list_files().await?;
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let data = vault.read_bytes(&path).await?;
        records.push(FileRecord::new(path, data));
    }
    Ok(records)
}
