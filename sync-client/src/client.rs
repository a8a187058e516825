//! SyncClient - the initiating side of a vaultsync exchange.
//!
//! # Architecture
//!
//! SyncClient uses the pure diff engine (from sync-core) to decide what to
//! transfer and interprets the plan to perform actual I/O via the Transport
//! and Vault traits.
//!
//! ```text
//! connect ─► fetch ─► verify ─► snapshot + baseline ─► plan
//!                                                       │
//!          save baseline ◄─ recompute ◄─ push batch ◄─ apply pulls
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vaultsync_client::{HttpTransport, SyncClient};
//! use vaultsync_vault::{FsVault, JsonFileStore};
//!
//! let vault = FsVault::new("/home/me/notes");
//! let state = JsonFileStore::new(vault.state_dir().join("baseline.json"));
//! let client = SyncClient::new(HttpTransport::new(timeout)?, vault, state);
//!
//! let report = client.connect_with_code("42".parse()?).await?;
//! ```

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;
use tracing::{debug, info, warn};
use vaultsync_core::{
    index_remote, plan, probe_local_ipv4, ConflictPolicy, Decision, PairingAddress, PairingCode,
    PairingError, DEFAULT_PORT,
};
use vaultsync_types::{ChangeRecord, PathKey};
use vaultsync_vault::{
    apply_changes, build_snapshot, BaselineStore, StateStore, Vault, VaultError,
};

use crate::transport::{Transport, TransportError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error after the connection was established.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local vault or state error.
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// The peer could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer address could not be derived.
    #[error("addressing failed: {0}")]
    Addressing(#[from] PairingError),

    /// The peer sent data that fails verification.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Outcome of one sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Paths written locally from the peer.
    pub pulled: Vec<PathKey>,
    /// Paths sent to the peer.
    pub pushed: Vec<PathKey>,
    /// Paths already identical on both sides.
    pub skipped: Vec<PathKey>,
    /// Paths changed on both sides since the baseline.
    pub conflicts: Vec<PathKey>,
    /// Paths that could not be read or written, with the error message.
    pub failed: Vec<(PathKey, String)>,
}

impl SyncReport {
    /// Whether nothing was transferred.
    pub fn is_noop(&self) -> bool {
        self.pulled.is_empty() && self.pushed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pulled, {} pushed, {} unchanged",
            self.pulled.len(),
            self.pushed.len(),
            self.skipped.len()
        )?;
        if !self.conflicts.is_empty() {
            write!(f, ", {} conflict(s)", self.conflicts.len())?;
        }
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// The sync client.
///
/// Owns a transport, the local vault, and the baseline store.
pub struct SyncClient<T: Transport, V: Vault, S: StateStore> {
    transport: T,
    vault: V,
    baseline: BaselineStore<S>,
    policy: ConflictPolicy,
    port: u16,
}

impl<T: Transport, V: Vault, S: StateStore> SyncClient<T, V, S> {
    /// Create a new SyncClient with the default conflict policy and port.
    pub fn new(transport: T, vault: V, state: S) -> Self {
        Self {
            transport,
            vault,
            baseline: BaselineStore::new(state),
            policy: ConflictPolicy::default(),
            port: DEFAULT_PORT,
        }
    }

    /// Set how paths changed on both sides are settled.
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the peer's service port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the local vault.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Get the baseline store.
    pub fn baseline(&self) -> &BaselineStore<S> {
        &self.baseline
    }

    /// Resolve a pairing code against this machine's address and sync.
    pub async fn connect_with_code(&self, code: PairingCode) -> Result<SyncReport, ClientError> {
        let local = probe_local_ipv4()?;
        self.connect_with_code_from(local, code).await
    }

    /// Like [`SyncClient::connect_with_code`], with an explicit local address.
    pub async fn connect_with_code_from(
        &self,
        local: Ipv4Addr,
        code: PairingCode,
    ) -> Result<SyncReport, ClientError> {
        let peer = PairingAddress::resolve(local, code);
        info!(%peer, code = %code, "Resolved pairing code");
        self.sync(peer.socket_addr(self.port)).await
    }

    /// Run one full sync against the peer at `addr`.
    ///
    /// A network failure aborts the attempt. Pulls already applied are kept
    /// and the baseline is left as it was.
    pub async fn sync(&self, addr: SocketAddr) -> Result<SyncReport, ClientError> {
        self.transport
            .connect(addr)
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {}", addr, e)))?;

        let result = self.exchange().await;
        let _ = self.transport.close().await;
        result
    }

    async fn exchange(&self) -> Result<SyncReport, ClientError> {
        let records = self.transport.fetch().await?;
        for record in &records {
            record
                .verify()
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
        }
        let remote = index_remote(records);

        let local = build_snapshot(&self.vault).await?;
        let baseline = self.baseline.load().await;
        let plan = plan(&local, &baseline, &remote, self.policy);
        debug!(
            remote = remote.len(),
            local = local.len(),
            baseline = baseline.len(),
            "Planned sync"
        );

        let mut report = SyncReport {
            skipped: plan.skips().into_iter().cloned().collect(),
            conflicts: plan.conflicts().to_vec(),
            ..SyncReport::default()
        };
        for path in &report.conflicts {
            warn!(path = %path, policy = ?self.policy, "Changed on both sides");
        }

        // Pull
        let pulls: Vec<ChangeRecord> = plan
            .pulls()
            .into_iter()
            .filter_map(|p| remote.get(p).cloned().map(ChangeRecord::from))
            .collect();
        let applied = apply_changes(&self.vault, pulls).await;
        report.pulled = applied.written;
        report.pulled.extend(applied.unchanged);
        report.failed.extend(applied.failed);

        // Push
        let mut batch = Vec::new();
        for path in plan.pushes() {
            match self.vault.read_bytes(path).await {
                Ok(data) => batch.push(ChangeRecord::new(path.clone(), data)),
                Err(e) => {
                    warn!(path = %path, error = %e, "Could not read file to push");
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }
        if !batch.is_empty() {
            self.transport.send_changes(&batch).await?;
            report.pushed = batch.into_iter().map(|c| c.path).collect();
        }

        let mut snapshot = build_snapshot(&self.vault).await?;
        // Unresolved conflicts keep their old baseline entry so both sides
        // still count as changed on the next sync.
        for (path, decision) in plan.iter() {
            if decision != Decision::Conflict {
                continue;
            }
            match baseline.get(path) {
                Some(digest) => snapshot.insert(path.clone(), *digest),
                None => snapshot.remove(path),
            };
        }
        self.baseline.save(&snapshot).await?;

        info!(%report, "Sync complete");
        Ok(report)
    }
}
