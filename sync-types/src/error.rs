//! Error types for vaultsync wire and snapshot types.

use thiserror::Error;

/// Errors raised while constructing or decoding vaultsync types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A path could not be normalized into a vault-relative key.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The path as received.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A digest string was not 40 hex characters.
    #[error("invalid content digest: {0:?}")]
    InvalidDigest(String),

    /// A record's content does not hash to its advertised digest.
    #[error("digest mismatch for {path}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Path of the offending record.
        path: String,
        /// Digest carried by the record.
        expected: String,
        /// Digest computed from the record's content.
        actual: String,
    },
}
