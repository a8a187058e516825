//! Wire records exchanged between peers.
//!
//! Bodies are JSON. File content travels as standard (padded) base64 so that
//! arbitrary bytes survive the JSON encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ContentDigest, PathKey, SyncError};

/// A file as served by `GET /hashes`: path, digest and full content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Vault-relative path.
    pub path: PathKey,
    /// Digest of `data` as computed by the sender.
    pub hash: ContentDigest,
    /// File content.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl FileRecord {
    /// Build a record, computing the digest from `data`.
    pub fn new(path: PathKey, data: Vec<u8>) -> Self {
        let hash = ContentDigest::of(&data);
        Self { path, hash, data }
    }

    /// Check that `data` actually hashes to `hash`.
    pub fn verify(&self) -> Result<(), SyncError> {
        let actual = ContentDigest::of(&self.data);
        if actual == self.hash {
            Ok(())
        } else {
            Err(SyncError::DigestMismatch {
                path: self.path.to_string(),
                expected: self.hash.to_hex(),
                actual: actual.to_hex(),
            })
        }
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("path", &self.path)
            .field("hash", &self.hash)
            .field("data", &format!("[{} bytes]", self.data.len()))
            .finish()
    }
}

/// A file the sender wants the receiver to adopt (`POST /changes`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Vault-relative path.
    pub path: PathKey,
    /// Full file content.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl ChangeRecord {
    /// Create a change record.
    pub fn new(path: PathKey, data: Vec<u8>) -> Self {
        Self { path, data }
    }
}

impl fmt::Debug for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRecord")
            .field("path", &self.path)
            .field("data", &format!("[{} bytes]", self.data.len()))
            .finish()
    }
}

impl From<FileRecord> for ChangeRecord {
    fn from(record: FileRecord) -> Self {
        Self {
            path: record.path,
            data: record.data,
        }
    }
}

/// Error body returned by the service for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
    /// Paths that could not be applied, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
