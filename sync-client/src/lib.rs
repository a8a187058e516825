//! # sync-client
//!
//! Client library for vaultsync.
//!
//! This is the initiating side: it reaches a listening peer, compares the
//! peer's files with the local vault and the last baseline, pulls what the
//! peer changed and pushes what changed here.
//!
//! ## Features
//!
//! - **Three-way diff**: pure decisions from sync-core, no false conflicts
//!   for one-sided edits
//! - **Content verification**: every received record is checked against its
//!   SHA-1 digest before anything is written
//! - **Transport Abstraction**: pluggable transport layer (HTTP, mock)
//! - **Pairing codes**: the peer is addressed by one octet on the shared /24
//!
//! ## Example
//!
//! ```ignore
//! use vaultsync_client::{HttpTransport, SyncClient};
//!
//! let client = SyncClient::new(HttpTransport::new(timeout)?, vault, state);
//! let report = client.sync("192.168.1.42:27125".parse()?).await?;
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod transport;

pub use client::{ClientError, SyncClient, SyncReport};
pub use transport::{HttpTransport, MockTransport, Transport, TransportError};
