//! Snapshot: a point-in-time mapping from path to content digest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ContentDigest, PathKey};

/// One file's identity and state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Vault-relative path.
    pub path: PathKey,
    /// Digest of the file's bytes.
    pub digest: ContentDigest,
}

/// Every file present in a vault, keyed by path.
///
/// Ordered so that iteration and serialized form are deterministic. Serializes
/// as a flat JSON object of `path -> hex digest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    files: BTreeMap<PathKey, ContentDigest>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file. Returns the previous digest if the path was present.
    pub fn insert(&mut self, path: PathKey, digest: ContentDigest) -> Option<ContentDigest> {
        self.files.insert(path, digest)
    }

    /// Forget a file. Returns its digest if the path was present.
    pub fn remove(&mut self, path: &PathKey) -> Option<ContentDigest> {
        self.files.remove(path)
    }

    /// Digest recorded for `path`.
    pub fn get(&self, path: &PathKey) -> Option<&ContentDigest> {
        self.files.get(path)
    }

    /// Whether `path` is present.
    pub fn contains(&self, path: &PathKey) -> bool {
        self.files.contains_key(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the snapshot has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, &ContentDigest)> {
        self.files.iter()
    }

    /// Iterate over paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &PathKey> {
        self.files.keys()
    }

    /// Paths whose digest differs from `other`, or which `other` lacks.
    pub fn changed_since(&self, other: &Snapshot) -> Vec<PathKey> {
        self.files
            .iter()
            .filter(|(path, digest)| other.get(path) != Some(*digest))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl FromIterator<FileEntry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().map(|e| (e.path, e.digest)).collect(),
        }
    }
}

impl FromIterator<(PathKey, ContentDigest)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (PathKey, ContentDigest)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, content: &[u8]) -> FileEntry {
        FileEntry {
            path: PathKey::new(path).unwrap(),
            digest: ContentDigest::of(content),
        }
    }

    #[test]
    fn snapshot_from_entries() {
        let snapshot: Snapshot = vec![entry("a.md", b"a"), entry("b/c.md", b"c")]
            .into_iter()
            .collect();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get(&PathKey::new("a.md").unwrap()),
            Some(&ContentDigest::of(b"a"))
        );
        assert!(!snapshot.contains(&PathKey::new("missing.md").unwrap()));
    }

    #[test]
    fn snapshot_keys_are_unique() {
        let mut snapshot = Snapshot::new();
        let path = PathKey::new("a.md").unwrap();
        assert!(snapshot.insert(path.clone(), ContentDigest::of(b"1")).is_none());
        assert_eq!(
            snapshot.insert(path, ContentDigest::of(b"2")),
            Some(ContentDigest::of(b"1"))
        );
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn snapshot_serializes_as_object() {
        let snapshot: Snapshot = vec![entry("a.md", b"")].into_iter().collect();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"a.md":"da39a3ee5e6b4b0d3255bfef95601890afd80709"}"#
        );

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn snapshot_iterates_in_path_order() {
        let snapshot: Snapshot = vec![entry("z.md", b"z"), entry("a.md", b"a"), entry("m.md", b"m")]
            .into_iter()
            .collect();
        let paths: Vec<&str> = snapshot.paths().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "m.md", "z.md"]);
    }

    #[test]
    fn changed_since_reports_new_and_modified() {
        let baseline: Snapshot = vec![entry("same.md", b"s"), entry("edit.md", b"old")]
            .into_iter()
            .collect();
        let current: Snapshot = vec![
            entry("same.md", b"s"),
            entry("edit.md", b"new"),
            entry("added.md", b"+"),
        ]
        .into_iter()
        .collect();

        let changed: Vec<String> = current
            .changed_since(&baseline)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(changed, vec!["added.md", "edit.md"]);
    }
}
