//! A running listener: one bound socket serving the router until it is
//! stopped or its session timer fires.
//!
//! Shutdown is graceful. Once triggered, no new connections are accepted,
//! the socket is closed and in-flight requests run to completion.

use crate::error::ServiceError;
use crate::http::{build_router, health};
use crate::server::SyncService;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Why a listening session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Stopped on request.
    Stopped,
    /// The flat session lifetime elapsed.
    Expired,
    /// The server loop failed.
    Failed,
}

/// Handle to a spawned listener.
#[derive(Debug)]
pub struct ServiceHandle {
    local_addr: SocketAddr,
    stop_tx: mpsc::Sender<SessionEnd>,
    done_rx: watch::Receiver<Option<SessionEnd>>,
    timer: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    /// Bind the configured address and start serving.
    pub async fn spawn(service: Arc<SyncService>) -> Result<Self, ServiceError> {
        let address = service.config().server.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServiceError::Bind { address, source })?;
        Self::serve(service, listener)
    }

    /// Start serving on an already-bound listener.
    pub fn serve(service: Arc<SyncService>, listener: TcpListener) -> Result<Self, ServiceError> {
        let local_addr = listener.local_addr()?;
        let (stop_tx, mut stop_rx) = mpsc::channel::<SessionEnd>(1);
        let (done_tx, done_rx) = watch::channel(None);

        health::init_start_time();
        service.metrics().sessions_total.fetch_add(1, Ordering::Relaxed);
        let app = build_router(service);

        tokio::spawn(async move {
            let (reason_tx, reason_rx) = tokio::sync::oneshot::channel();
            let signal = async move {
                let end = stop_rx.recv().await.unwrap_or(SessionEnd::Stopped);
                debug!(?end, "Shutdown triggered");
                let _ = reason_tx.send(end);
            };

            let end = match axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(signal)
                .await
            {
                Ok(()) => reason_rx.await.unwrap_or(SessionEnd::Stopped),
                Err(e) => {
                    warn!(error = %e, "Listener failed");
                    SessionEnd::Failed
                }
            };

            info!(?end, "Listener closed");
            let _ = done_tx.send(Some(end));
        });

        info!(addr = %local_addr, "Listening");
        Ok(Self {
            local_addr,
            stop_tx,
            done_rx,
            timer: None,
        })
    }

    /// Shut the listener down after `timeout`, regardless of activity.
    ///
    /// Re-arming replaces the previous timer.
    pub fn arm_timer(&mut self, timeout: Duration) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let stop_tx = self.stop_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = stop_tx.try_send(SessionEnd::Expired);
        }));
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Request a graceful shutdown. Returns immediately.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let _ = self.stop_tx.try_send(SessionEnd::Stopped);
    }

    /// Whether the server loop has exited.
    pub fn is_finished(&self) -> bool {
        self.done_rx.borrow().is_some() || self.done_rx.has_changed().is_err()
    }

    /// A receiver that resolves once the listener has closed.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionEnd>> {
        self.done_rx.clone()
    }

    /// Wait for the listener to close.
    pub async fn wait(&self) -> SessionEnd {
        wait_for_end(self.subscribe()).await
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolve once `rx` reports a session end.
pub async fn wait_for_end(mut rx: watch::Receiver<Option<SessionEnd>>) -> SessionEnd {
    let end = rx.wait_for(|end| end.is_some()).await.map(|end| *end);
    match end {
        Ok(Some(end)) => end,
        // Sender dropped without reporting: the task panicked
        _ => SessionEnd::Failed,
    }
}
