//! Apply incoming file content to a vault.

use tracing::{debug, warn};
use vaultsync_types::{ChangeRecord, ContentDigest, PathKey};

use crate::vault::Vault;

/// Outcome of applying a batch of changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Paths whose content was written.
    pub written: Vec<PathKey>,
    /// Paths whose existing content already matched; not rewritten.
    pub unchanged: Vec<PathKey>,
    /// Paths that could not be written, with the error message.
    pub failed: Vec<(PathKey, String)>,
}

impl ApplyReport {
    /// Whether every change was applied.
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed paths as strings.
    pub fn failed_paths(&self) -> Vec<String> {
        self.failed.iter().map(|(p, _)| p.to_string()).collect()
    }
}

/// Write each change to `vault` (create or overwrite).
///
/// A failure on one file is recorded and the rest of the batch proceeds.
pub async fn apply_changes<I>(vault: &dyn Vault, changes: I) -> ApplyReport
where
    I: IntoIterator<Item = ChangeRecord>,
{
    let mut report = ApplyReport::default();

    for change in changes {
        if vault.exists(&change.path).await {
            if let Ok(current) = vault.read_bytes(&change.path).await {
                if ContentDigest::of(&current) == ContentDigest::of(&change.data) {
                    report.unchanged.push(change.path);
                    continue;
                }
            }
        }

        match vault.write_bytes(&change.path, &change.data).await {
            Ok(()) => {
                debug!(path = %change.path, "Applied change");
                report.written.push(change.path);
            }
            Err(e) => {
                warn!(path = %change.path, error = %e, "Failed to apply change");
                report.failed.push((change.path, e.to_string()));
            }
        }
    }

    report
}
