//! Three-way diff between a local snapshot, a remote file set and the
//! baseline recorded at the end of the last successful sync.
//!
//! The engine is a pure function: it reads its inputs and returns a
//! [`SyncPlan`]. Executing the plan (writing pulled files, sending pushed
//! files) is left to the caller.
//!
//! Per path `p` offered by the remote:
//!
//! | local        | baseline vs local | baseline vs remote | decision            |
//! |--------------|-------------------|--------------------|---------------------|
//! | missing      | -                 | -                  | Pull                |
//! | same digest  | -                 | -                  | Skip                |
//! | differs      | same              | differs            | Pull                |
//! | differs      | differs           | same               | Push                |
//! | differs      | differs           | differs            | conflict → policy   |
//!
//! Every local path the remote does not have is pushed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vaultsync_types::{FileRecord, PathKey, Snapshot};

/// Remote file set keyed by path, as received from `GET /hashes`.
pub type RemoteFiles = BTreeMap<PathKey, FileRecord>;

/// Index a list of remote records by path.
///
/// If the remote lists a path twice, the later record wins.
pub fn index_remote(records: Vec<FileRecord>) -> RemoteFiles {
    records.into_iter().map(|r| (r.path.clone(), r)).collect()
}

/// What to do with one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Materialize the remote content locally.
    Pull,
    /// Send the local content to the remote.
    Push,
    /// Nothing to transfer.
    Skip,
    /// Both sides changed since the baseline; left untouched.
    Conflict,
}

/// How to settle a path that changed on both sides since the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Adopt the remote content (pull). Matches the historical behaviour of
    /// favouring any remote divergence from the baseline.
    #[default]
    PreferRemote,
    /// Keep the local content and send it to the remote (push).
    PreferLocal,
    /// Transfer nothing and report the path as [`Decision::Conflict`].
    Report,
}

impl ConflictPolicy {
    fn resolve(self) -> Decision {
        match self {
            Self::PreferRemote => Decision::Pull,
            Self::PreferLocal => Decision::Push,
            Self::Report => Decision::Conflict,
        }
    }
}

/// Output of [`plan`]: one decision per path in `local ∪ remote`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    decisions: BTreeMap<PathKey, Decision>,
    conflicts: Vec<PathKey>,
}

impl SyncPlan {
    /// Decision for `path`, if the path was considered.
    pub fn decision(&self, path: &PathKey) -> Option<Decision> {
        self.decisions.get(path).copied()
    }

    /// All decisions in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, Decision)> {
        self.decisions.iter().map(|(p, d)| (p, *d))
    }

    /// Paths to pull.
    pub fn pulls(&self) -> Vec<&PathKey> {
        self.with(Decision::Pull)
    }

    /// Paths to push.
    pub fn pushes(&self) -> Vec<&PathKey> {
        self.with(Decision::Push)
    }

    /// Paths needing no transfer.
    pub fn skips(&self) -> Vec<&PathKey> {
        self.with(Decision::Skip)
    }

    /// Paths that changed on both sides since the baseline, regardless of
    /// how the policy resolved them.
    pub fn conflicts(&self) -> &[PathKey] {
        &self.conflicts
    }

    /// Number of paths considered.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Whether no paths were considered.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    fn with(&self, wanted: Decision) -> Vec<&PathKey> {
        self.decisions
            .iter()
            .filter(|(_, d)| **d == wanted)
            .map(|(p, _)| p)
            .collect()
    }
}

/// Compute per-path decisions.
pub fn plan(
    local: &Snapshot,
    baseline: &Snapshot,
    remote: &RemoteFiles,
    policy: ConflictPolicy,
) -> SyncPlan {
    let mut out = SyncPlan::default();

    for (path, record) in remote {
        let decision = match local.get(path) {
            None => Decision::Pull,
            Some(local_digest) if *local_digest == record.hash => Decision::Skip,
            Some(local_digest) => {
                let base = baseline.get(path);
                let remote_changed = base != Some(&record.hash);
                let local_changed = base != Some(local_digest);

                match (local_changed, remote_changed) {
                    (true, true) => {
                        out.conflicts.push(path.clone());
                        policy.resolve()
                    }
                    (false, true) => Decision::Pull,
                    // local_changed only; (false, false) is unreachable since
                    // local != remote means at most one can equal the baseline
                    _ => Decision::Push,
                }
            }
        };
        out.decisions.insert(path.clone(), decision);
    }

    for path in local.paths() {
        if !remote.contains_key(path) {
            out.decisions.insert(path.clone(), Decision::Push);
        }
    }

    out
}
