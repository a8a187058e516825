//! Single-slot listener controller.
//!
//! At most one listener exists at a time. Starting while a live listener
//! exists is refused; a listener that already ended on its own is reclaimed
//! by the next start. The lifecycle decisions come from
//! [`vaultsync_core::ListenerState`]; this module performs the actions.

use crate::error::ServiceError;
use crate::listener::{wait_for_end, ServiceHandle, SessionEnd};
use crate::server::SyncService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vaultsync_core::{ListenerAction, ListenerEvent, ListenerState, PairingCode};

#[derive(Default)]
struct Slot {
    state: ListenerState,
    handle: Option<ServiceHandle>,
}

/// Owns the listener slot for one service.
pub struct SyncController {
    service: Arc<SyncService>,
    slot: Mutex<Slot>,
}

impl SyncController {
    /// Create a controller with an empty slot.
    pub fn new(service: Arc<SyncService>) -> Self {
        Self {
            service,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// The service served by this controller.
    pub fn service(&self) -> &Arc<SyncService> {
        &self.service
    }

    /// Start listening. `code` is only used for the user notification.
    ///
    /// # Errors
    ///
    /// `AlreadyListening` if a live listener exists, `Bind` if the port is
    /// unavailable.
    pub async fn start(&self, code: PairingCode) -> Result<SocketAddr, ServiceError> {
        let mut slot = self.slot.lock().await;

        if slot.handle.as_ref().is_some_and(|h| h.is_finished()) {
            debug!("Reclaiming finished listener slot");
            let state = std::mem::take(&mut slot.state);
            let (state, _) = state.on_event(ListenerEvent::SessionExpired);
            slot.state = state;
            slot.handle = None;
        }

        let timeout = self.service.config().server.session_timeout();
        let state = std::mem::take(&mut slot.state);
        let previous = state.clone();
        let (state, actions) = state.on_event(ListenerEvent::StartRequested {
            code: code.octet(),
            timeout,
        });
        slot.state = state;

        for action in actions {
            match action {
                ListenerAction::RejectStart => return Err(ServiceError::AlreadyListening),
                ListenerAction::Bind => match ServiceHandle::spawn(self.service.clone()).await {
                    Ok(handle) => slot.handle = Some(handle),
                    Err(e) => {
                        slot.state = previous;
                        return Err(e);
                    }
                },
                ListenerAction::ArmTimer { timeout } => {
                    if let Some(handle) = slot.handle.as_mut() {
                        handle.arm_timer(timeout);
                    }
                }
                ListenerAction::Notify(message) => info!("{}", message),
                ListenerAction::Shutdown => {}
            }
        }

        slot.handle
            .as_ref()
            .map(|h| h.local_addr())
            .ok_or(ServiceError::AlreadyListening)
    }

    /// Stop the current listener, if any, and wait for it to close.
    pub async fn stop(&self) -> Option<SessionEnd> {
        let handle = {
            let mut slot = self.slot.lock().await;
            let state = std::mem::take(&mut slot.state);
            let (state, actions) = state.on_event(ListenerEvent::StopRequested);
            slot.state = state;

            let mut handle = slot.handle.take();
            for action in actions {
                match action {
                    ListenerAction::Shutdown => {
                        if let Some(h) = handle.as_mut() {
                            h.stop();
                        }
                    }
                    ListenerAction::Notify(message) => info!("{}", message),
                    _ => {}
                }
            }
            handle
        };

        match handle {
            Some(h) => Some(h.wait().await),
            None => None,
        }
    }

    /// Wait until the current listener closes. `None` if there is none.
    ///
    /// The slot is not locked while waiting, so [`SyncController::stop`]
    /// can run concurrently.
    pub async fn wait(&self) -> Option<SessionEnd> {
        let rx = {
            let slot = self.slot.lock().await;
            slot.handle.as_ref()?.subscribe()
        };
        Some(wait_for_end(rx).await)
    }

    /// Whether a live listener exists.
    pub async fn is_listening(&self) -> bool {
        let slot = self.slot.lock().await;
        slot.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Address of the live listener, if any.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let slot = self.slot.lock().await;
        slot.handle
            .as_ref()
            .filter(|h| !h.is_finished())
            .map(|h| h.local_addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use vaultsync_vault::{MemoryStateStore, MemoryVault};

    fn controller(timeout_secs: u64) -> SyncController {
        let mut config = Config::default();
        config.server.bind_address = "127.0.0.1:0".to_string();
        config.server.session_timeout_secs = timeout_secs;
        SyncController::new(Arc::new(SyncService::new(
            config,
            Arc::new(MemoryVault::new()),
            Arc::new(MemoryStateStore::new()),
        )))
    }

    #[tokio::test]
    async fn start_then_stop() {
        let ctl = controller(30);

        let addr = ctl.start(PairingCode::new(5)).await.unwrap();
        assert!(ctl.is_listening().await);
        assert_eq!(ctl.local_addr().await, Some(addr));

        assert_eq!(ctl.stop().await, Some(SessionEnd::Stopped));
        assert!(!ctl.is_listening().await);
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let ctl = controller(30);
        let first = ctl.start(PairingCode::new(5)).await.unwrap();

        let second = ctl.start(PairingCode::new(5)).await;

        assert!(matches!(second, Err(ServiceError::AlreadyListening)));
        // The original listener is untouched
        assert_eq!(ctl.local_addr().await, Some(first));
        ctl.stop().await;
    }

    #[tokio::test]
    async fn restart_after_stop_is_allowed() {
        let ctl = controller(30);
        ctl.start(PairingCode::new(1)).await.unwrap();
        ctl.stop().await;

        assert!(ctl.start(PairingCode::new(1)).await.is_ok());
        ctl.stop().await;
    }

    #[tokio::test]
    async fn expired_slot_is_reclaimed() {
        let ctl = controller(0);
        ctl.start(PairingCode::new(1)).await.unwrap();

        assert_eq!(ctl.wait().await, Some(SessionEnd::Expired));
        assert!(!ctl.is_listening().await);

        assert!(ctl.start(PairingCode::new(1)).await.is_ok());
        ctl.stop().await;
    }

    #[tokio::test]
    async fn stop_without_listener_is_noop() {
        let ctl = controller(30);
        assert_eq!(ctl.stop().await, None);
        assert_eq!(ctl.wait().await, None);
    }

    #[tokio::test]
    async fn bind_failure_leaves_slot_idle() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = Config::default();
        config.server.bind_address = taken.local_addr().unwrap().to_string();
        let ctl = SyncController::new(Arc::new(SyncService::new(
            config,
            Arc::new(MemoryVault::new()),
            Arc::new(MemoryStateStore::new()),
        )));

        assert!(matches!(
            ctl.start(PairingCode::new(1)).await,
            Err(ServiceError::Bind { .. })
        ));
        assert!(!ctl.is_listening().await);
        drop(taken);
    }
}
