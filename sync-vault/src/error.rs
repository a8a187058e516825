//! Error types for sync-vault.

use thiserror::Error;
use vaultsync_types::SyncError;

/// Errors that can occur during vault and state operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File does not exist in the vault.
    #[error("file not found: {path}")]
    NotFound {
        /// Vault-relative path.
        path: String,
    },

    /// The path lies in the state directory, an ignored directory, or is a
    /// temporary file. Such paths are never written from a peer.
    #[error("path is excluded from sync: {path}")]
    Excluded {
        /// Vault-relative path.
        path: String,
    },

    /// A file name could not be turned into a vault path.
    #[error(transparent)]
    InvalidPath(#[from] SyncError),

    /// Stored state could not be (de)serialized.
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(String),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl VaultError {
    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }
}
