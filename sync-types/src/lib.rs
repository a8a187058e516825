//! # sync-types
//!
//! Wire format and snapshot types for vaultsync.
//!
//! This crate provides the vocabulary shared by every vaultsync crate:
//! - [`PathKey`], [`ContentDigest`] - file identity
//! - [`Snapshot`], [`FileEntry`] - point-in-time vault state
//! - [`FileRecord`], [`ChangeRecord`], [`ErrorBody`] - JSON wire records
//! - [`SyncError`] - error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod snapshot;

pub use error::SyncError;
pub use ids::{ContentDigest, PathKey};
pub use messages::{ChangeRecord, ErrorBody, FileRecord};
pub use snapshot::{FileEntry, Snapshot};
