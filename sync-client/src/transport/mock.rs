//! Mock transport for testing.
//!
//! Allows queueing fetch responses and capturing sent batches for
//! verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use vaultsync_types::{ChangeRecord, FileRecord};

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the client owns another.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_address: Option<SocketAddr>,
    sent_batches: Vec<Vec<ChangeRecord>>,
    fetch_queue: VecDeque<Vec<FileRecord>>,
    fail_next_connect: Option<String>,
    fail_next_send: Option<String>,
    fail_next_fetch: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file list to be returned by the next `fetch()` call.
    pub fn queue_response(&self, records: Vec<FileRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner.fetch_queue.push_back(records);
    }

    /// Get all batches that were sent.
    pub fn sent_batches(&self) -> Vec<Vec<ChangeRecord>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_batches.clone()
    }

    /// Get the last batch that was sent.
    pub fn last_sent(&self) -> Option<Vec<ChangeRecord>> {
        let inner = self.inner.lock().unwrap();
        inner.sent_batches.last().cloned()
    }

    /// Get the address that was connected to.
    pub fn connected_address(&self) -> Option<SocketAddr> {
        let inner = self.inner.lock().unwrap();
        inner.connected_address
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_connect = Some(error.to_string());
    }

    /// Cause the next send_changes() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Cause the next fetch() to fail with the given error.
    pub fn fail_next_fetch(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_fetch = Some(error.to_string());
    }

    /// Clear all state (batches, queue, connection).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, addr: SocketAddr) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connected_address = Some(addr);
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<FileRecord>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(TransportError::ReceiveFailed(error));
        }

        // An empty queue behaves like an empty remote vault
        Ok(inner.fetch_queue.pop_front().unwrap_or_default())
    }

    async fn send_changes(&self, changes: &[ChangeRecord]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_batches.push(changes.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        Ok(())
    }
}
