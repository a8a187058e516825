//! Listener lifecycle state machine.
//!
//! A pure, side-effect-free state machine for the sync service: it takes
//! events and returns the new state plus the actions the caller must perform.
//! Binding sockets and shutting servers down happens in sync-service, not
//! here.
//!
//! ```text
//! Idle --StartRequested--> Listening --StopRequested---> Idle
//!                                    --SessionExpired--> Idle
//! ```
//!
//! The session timeout is a flat lifetime: traffic does not extend it.

use std::time::Duration;

/// Default flat session lifetime for a listener.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Listener state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListenerState {
    /// Not accepting connections.
    #[default]
    Idle,
    /// Accepting connections on the service port.
    Listening {
        /// Pairing code shown to the user.
        code: u8,
        /// Flat session lifetime.
        timeout: Duration,
    },
}

impl ListenerState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: ListenerEvent) -> (Self, Vec<ListenerAction>) {
        match (self, event) {
            (Self::Idle, ListenerEvent::StartRequested { code, timeout }) => (
                Self::Listening { code, timeout },
                vec![
                    ListenerAction::Bind,
                    ListenerAction::ArmTimer { timeout },
                    ListenerAction::Notify(format!("Listening. Pairing code: {}", code)),
                ],
            ),
            (state @ Self::Listening { .. }, ListenerEvent::StartRequested { .. }) => (
                state,
                vec![ListenerAction::RejectStart],
            ),

            (Self::Listening { .. }, ListenerEvent::StopRequested) => (
                Self::Idle,
                vec![
                    ListenerAction::Shutdown,
                    ListenerAction::Notify("Stopped listening.".into()),
                ],
            ),
            (Self::Listening { timeout, .. }, ListenerEvent::SessionExpired) => (
                Self::Idle,
                vec![
                    ListenerAction::Shutdown,
                    ListenerAction::Notify(format!(
                        "Session ended after {}s.",
                        timeout.as_secs()
                    )),
                ],
            ),

            // Stopping an idle listener, or a late timer, does nothing
            (state, _) => (state, vec![]),
        }
    }

    /// Check if currently listening.
    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening { .. })
    }
}

/// Events that drive the listener lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// User asked to start listening.
    StartRequested {
        /// Pairing code derived from the local address.
        code: u8,
        /// Session lifetime.
        timeout: Duration,
    },
    /// User asked to stop listening.
    StopRequested,
    /// The session lifetime elapsed.
    SessionExpired,
}

/// Actions the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerAction {
    /// Bind the service port and begin serving.
    Bind,
    /// Arm the flat session timer.
    ArmTimer {
        /// Delay before the session expires.
        timeout: Duration,
    },
    /// Stop accepting connections; let in-flight requests finish.
    Shutdown,
    /// Refuse the start request: a listener is already active.
    RejectStart,
    /// Show a message to the user.
    Notify(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(code: u8) -> ListenerEvent {
        ListenerEvent::StartRequested {
            code,
            timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    #[test]
    fn starts_idle() {
        assert_eq!(ListenerState::new(), ListenerState::Idle);
        assert!(!ListenerState::default().is_listening());
    }

    #[test]
    fn start_binds_and_arms_timer() {
        let (state, actions) = ListenerState::Idle.on_event(start(42));

        assert!(state.is_listening());
        assert!(actions.contains(&ListenerAction::Bind));
        assert!(actions.contains(&ListenerAction::ArmTimer {
            timeout: DEFAULT_SESSION_TIMEOUT
        }));
        assert!(actions
            .iter()
            .any(|a| matches!(a, ListenerAction::Notify(m) if m.contains("42"))));
    }

    #[test]
    fn second_start_is_rejected() {
        let (state, _) = ListenerState::Idle.on_event(start(1));
        let (state, actions) = state.on_event(start(2));

        assert_eq!(
            state,
            ListenerState::Listening {
                code: 1,
                timeout: DEFAULT_SESSION_TIMEOUT
            }
        );
        assert_eq!(actions, vec![ListenerAction::RejectStart]);
    }

    #[test]
    fn stop_returns_to_idle() {
        let (state, _) = ListenerState::Idle.on_event(start(1));
        let (state, actions) = state.on_event(ListenerEvent::StopRequested);

        assert_eq!(state, ListenerState::Idle);
        assert!(actions.contains(&ListenerAction::Shutdown));
    }

    #[test]
    fn expiry_returns_to_idle() {
        let (state, _) = ListenerState::Idle.on_event(start(1));
        let (state, actions) = state.on_event(ListenerEvent::SessionExpired);

        assert_eq!(state, ListenerState::Idle);
        assert!(actions.contains(&ListenerAction::Shutdown));
        assert!(actions
            .iter()
            .any(|a| matches!(a, ListenerAction::Notify(m) if m.contains("30s"))));
    }

    #[test]
    fn idle_ignores_stop_and_expiry() {
        let (state, actions) = ListenerState::Idle.on_event(ListenerEvent::StopRequested);
        assert_eq!(state, ListenerState::Idle);
        assert!(actions.is_empty());

        let (state, actions) = state.on_event(ListenerEvent::SessionExpired);
        assert_eq!(state, ListenerState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn restart_after_expiry_is_allowed() {
        let (state, _) = ListenerState::Idle.on_event(start(1));
        let (state, _) = state.on_event(ListenerEvent::SessionExpired);
        let (state, actions) = state.on_event(start(7));

        assert!(state.is_listening());
        assert!(actions.contains(&ListenerAction::Bind));
    }
}
