//! # sync-vault
//!
//! Storage collaborators for vaultsync.
//!
//! - [`Vault`]: the file tree being synchronized ([`FsVault`] on disk,
//!   [`MemoryVault`] for tests)
//! - [`StateStore`]: one persisted JSON document ([`JsonFileStore`],
//!   [`MemoryStateStore`])
//! - [`BaselineStore`]: the snapshot remembered from the last completed sync
//! - [`build_snapshot`] / [`collect_records`]: hash every file in a vault
//! - [`apply_changes`]: write incoming content, per-file failures isolated
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultsync_vault::{build_snapshot, BaselineStore, FsVault, JsonFileStore};
//!
//! let vault = FsVault::new("/home/me/notes").with_ignore([".git"]);
//! let baseline = BaselineStore::new(JsonFileStore::new(vault.state_dir().join("baseline.json")));
//!
//! let current = build_snapshot(&vault).await?;
//! let pending = current.changed_since(&baseline.load().await);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod baseline;
pub mod error;
pub mod fs;
pub mod snapshot;
pub mod state;
pub mod vault;

pub use apply::{apply_changes, ApplyReport};
pub use baseline::{BaselineRecord, BaselineStore, BASELINE_VERSION};
pub use error::VaultError;
pub use fs::{FsVault, STATE_DIR};
pub use snapshot::{build_snapshot, collect_records};
pub use state::{JsonFileStore, MemoryStateStore, StateStore};
pub use vault::{MemoryVault, Vault};

/// File name of the baseline inside the state directory.
pub const BASELINE_FILE: &str = "baseline.json";
