//! Transport abstraction for vaultsync.
//!
//! This module provides a pluggable transport layer that abstracts how the
//! client reaches a listening peer (plain HTTP, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` checks that the peer is reachable
//! - `fetch()` retrieves every remote file (`GET /hashes`)
//! - `send_changes()` pushes a batch (`POST /changes`)
//! - `close()` forgets the peer
//!
//! # Example
//!
//! ```ignore
//! let transport = HttpTransport::new(Duration::from_secs(30))?;
//! transport.connect("192.168.1.42:27125".parse()?).await?;
//! let remote = transport.fetch().await?;
//! transport.send_changes(&changes).await?;
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use std::net::SocketAddr;
use thiserror::Error;
use vaultsync_types::{ChangeRecord, FileRecord};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// The peer answered with an error status.
    #[error("peer returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text from the peer.
        message: String,
        /// Paths the peer could not write, if reported.
        failed: Vec<String>,
    },

    /// The peer's response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Transport trait for talking to a listening peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the peer at `addr` and check that it is serving.
    async fn connect(&self, addr: SocketAddr) -> Result<(), TransportError>;

    /// Retrieve every file the peer has (Fetch).
    async fn fetch(&self) -> Result<Vec<FileRecord>, TransportError>;

    /// Send a batch of changes (Accept-Changes).
    async fn send_changes(&self, changes: &[ChangeRecord]) -> Result<(), TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Forget the peer.
    async fn close(&self) -> Result<(), TransportError>;
}
