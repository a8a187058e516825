//! # sync-service
//!
//! The listening side of vaultsync.
//!
//! A peer that wants to be synced against starts a listener, shows its
//! pairing code, and serves two operations over plain HTTP on the LAN:
//! - Fetch (`GET /hashes`): every file with digest and content
//! - Accept-Changes (`POST /changes`): write pushed files, save the baseline
//!
//! ## Architecture
//!
//! ```text
//!  SyncController ── one slot ──► ServiceHandle (axum, graceful shutdown)
//!        │                              │
//!        │ ListenerState                ▼
//!        │ (sync-core)            build_router ──► SyncService
//!        ▼                                           │
//!  start / stop / wait                        Vault + BaselineStore
//! ```
//!
//! The listener lives for a flat session timeout (default 30s), then closes
//! on its own. There is no authentication: anyone on the subnet who reaches
//! the port during the session can read and write the vault.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod listener;
pub mod server;

pub use config::{Config, ConfigError};
pub use controller::SyncController;
pub use error::ServiceError;
pub use listener::{ServiceHandle, SessionEnd};
pub use server::{ServiceMetrics, SyncService};
