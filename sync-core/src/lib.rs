//! # sync-core
//!
//! Pure logic for vaultsync (no vault or network I/O, instant tests).
//!
//! - [`engine`]: the three-way diff that decides pull / push / skip per path
//! - [`pairing`]: pairing codes and same-subnet address derivation
//! - [`state`]: the listener lifecycle state machine
//!
//! All of these take input and produce output without side effects, except
//! [`pairing::probe_local_ipv4`], which asks the OS for a routing decision.
//! The actual I/O is performed by `sync-vault`, `sync-service` and
//! `sync-client`, which interpret the plans and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod pairing;
pub mod state;

pub use engine::{index_remote, plan, ConflictPolicy, Decision, RemoteFiles, SyncPlan};
pub use pairing::{probe_local_ipv4, PairingAddress, PairingCode, PairingError, DEFAULT_PORT};
pub use state::{ListenerAction, ListenerEvent, ListenerState, DEFAULT_SESSION_TIMEOUT};
