//! Connection status state machine for roomtimer sync.
//!
//! This module provides a pure, side-effect-free mapping from transport
//! signals to connection statuses. The state machine takes events as input
//! and produces a new state plus a list of actions to execute.
//!
//! The actual I/O (reporting status, logging, running the bootstrap fetches)
//! is performed by sync-client, not by this module.

use sync_types::{ConnectionStatus, LogLevel, LOCAL_DISCONNECT_REASON};

/// Current observable status of one session - NO I/O, just transitions.
///
/// `None` until the session is started; afterwards exactly one
/// [`ConnectionStatus`] is current.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    status: Option<ConnectionStatus>,
}

impl ConnectionState {
    /// Create a new state machine with no status emitted yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status last emitted, if any.
    pub fn status(&self) -> Option<ConnectionStatus> {
        self.status
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.status == Some(ConnectionStatus::Ok)
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions, in order.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match event {
            Event::StartRequested => self.transition(
                ConnectionStatus::Connecting,
                LogLevel::Info,
                "Connecting to room".into(),
            ),

            Event::ConnectSucceeded => {
                let (state, mut actions) = self.transition(
                    ConnectionStatus::Ok,
                    LogLevel::Info,
                    "Connected to room".into(),
                );
                actions.push(Action::Bootstrap);
                (state, actions)
            }

            Event::ConnectFailed { error } => self.transition(
                ConnectionStatus::ConnectionFailure,
                LogLevel::Warn,
                format!("Connection failed: {error}"),
            ),

            // Expected result of a local stop(); not a status change.
            Event::Disconnected { reason } if reason == LOCAL_DISCONNECT_REASON => (
                self,
                vec![Action::Log {
                    level: LogLevel::Debug,
                    message: "Disconnected by client".into(),
                }],
            ),

            Event::Disconnected { reason } => self.transition(
                ConnectionStatus::Disconnected,
                LogLevel::Warn,
                format!("Disconnected: {reason}"),
            ),

            Event::ChannelError { error } => self.transition(
                ConnectionStatus::UnknownError,
                LogLevel::Error,
                format!("Socket error: {error}"),
            ),

            Event::ReconnectAttempt { attempt } => self.transition(
                ConnectionStatus::Connecting,
                LogLevel::Info,
                format!("Reconnecting (attempt {attempt})"),
            ),

            Event::ReconnectSucceeded { attempt } => {
                let (state, mut actions) = self.transition(
                    ConnectionStatus::Ok,
                    LogLevel::Info,
                    format!("Reconnected after {attempt} attempt(s)"),
                );
                actions.push(Action::Bootstrap);
                (state, actions)
            }

            Event::ReconnectExhausted => self.transition(
                ConnectionStatus::ConnectionFailure,
                LogLevel::Error,
                "Reconnection failed, giving up".into(),
            ),
        }
    }

    fn transition(
        self,
        status: ConnectionStatus,
        level: LogLevel,
        message: String,
    ) -> (Self, Vec<Action>) {
        (
            Self {
                status: Some(status),
            },
            vec![Action::Log { level, message }, Action::EmitStatus(status)],
        )
    }
}

/// Signals that drive the connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Caller started a session.
    StartRequested,
    /// Transport connected (first connection of a handle).
    ConnectSucceeded,
    /// Transport failed to connect.
    ConnectFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// Transport lost the connection.
    Disconnected {
        /// Reason reported by the transport.
        reason: String,
    },
    /// Channel-level error while connected.
    ChannelError {
        /// Error message describing the failure.
        error: String,
    },
    /// Transport is about to make a reconnection attempt.
    ReconnectAttempt {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// A reconnection attempt succeeded.
    ReconnectSucceeded {
        /// Attempt number that succeeded.
        attempt: u32,
    },
    /// Every reconnection attempt failed.
    ReconnectExhausted,
}

/// Actions to be executed by the sync-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write a human-readable line to the status sink's log.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
    /// Report a new status to the status sink.
    EmitStatus(ConnectionStatus),
    /// Run the bootstrap fetches for the fresh connection.
    Bootstrap,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed events in order and collect every emitted status.
    fn statuses(events: Vec<Event>) -> Vec<ConnectionStatus> {
        let mut state = ConnectionState::new();
        let mut emitted = Vec::new();
        for event in events {
            let (next, actions) = state.on_event(event);
            state = next;
            emitted.extend(actions.into_iter().filter_map(|a| match a {
                Action::EmitStatus(s) => Some(s),
                _ => None,
            }));
        }
        emitted
    }

    fn bootstraps(event: Event) -> usize {
        let (_, actions) = ConnectionState::new().on_event(event);
        actions
            .iter()
            .filter(|a| matches!(a, Action::Bootstrap))
            .count()
    }

    #[test]
    fn starts_with_no_status() {
        let state = ConnectionState::new();
        assert_eq!(state.status(), None);
        assert!(!state.is_connected());
    }

    #[test]
    fn start_emits_connecting() {
        assert_eq!(
            statuses(vec![Event::StartRequested]),
            vec![ConnectionStatus::Connecting]
        );
    }

    #[test]
    fn connect_emits_ok_and_bootstraps_once() {
        let (state, actions) = ConnectionState::new().on_event(Event::ConnectSucceeded);
        assert!(state.is_connected());
        assert!(actions.contains(&Action::EmitStatus(ConnectionStatus::Ok)));
        assert_eq!(bootstraps(Event::ConnectSucceeded), 1);
    }

    #[test]
    fn connect_error_is_connection_failure() {
        assert_eq!(
            statuses(vec![
                Event::StartRequested,
                Event::ConnectFailed {
                    error: "bad api key".into()
                },
            ]),
            vec![
                ConnectionStatus::Connecting,
                ConnectionStatus::ConnectionFailure
            ]
        );
    }

    #[test]
    fn local_disconnect_is_suppressed() {
        assert_eq!(
            statuses(vec![
                Event::StartRequested,
                Event::ConnectSucceeded,
                Event::Disconnected {
                    reason: LOCAL_DISCONNECT_REASON.into()
                },
            ]),
            vec![ConnectionStatus::Connecting, ConnectionStatus::Ok]
        );
    }

    #[test]
    fn local_disconnect_keeps_current_status() {
        let (state, _) = ConnectionState::new().on_event(Event::ConnectSucceeded);
        let (state, actions) = state.on_event(Event::Disconnected {
            reason: LOCAL_DISCONNECT_REASON.into(),
        });
        assert_eq!(state.status(), Some(ConnectionStatus::Ok));
        assert!(!actions.iter().any(|a| matches!(a, Action::EmitStatus(_))));
    }

    #[test]
    fn remote_disconnect_is_disconnected() {
        assert_eq!(
            statuses(vec![
                Event::ConnectSucceeded,
                Event::Disconnected {
                    reason: "io server disconnect".into()
                },
            ]),
            vec![ConnectionStatus::Ok, ConnectionStatus::Disconnected]
        );
    }

    #[test]
    fn channel_error_is_unknown_error() {
        assert_eq!(
            statuses(vec![Event::ChannelError {
                error: "parse error".into()
            }]),
            vec![ConnectionStatus::UnknownError]
        );
    }

    #[test]
    fn full_reconnect_flow() {
        assert_eq!(
            statuses(vec![
                Event::StartRequested,
                Event::ConnectSucceeded,
                Event::Disconnected {
                    reason: "transport close".into()
                },
                Event::ReconnectAttempt { attempt: 1 },
                Event::ReconnectAttempt { attempt: 2 },
                Event::ReconnectSucceeded { attempt: 2 },
            ]),
            vec![
                ConnectionStatus::Connecting,
                ConnectionStatus::Ok,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connecting,
                ConnectionStatus::Connecting,
                ConnectionStatus::Ok,
            ]
        );
    }

    #[test]
    fn reconnect_success_bootstraps_again() {
        assert_eq!(bootstraps(Event::ReconnectSucceeded { attempt: 3 }), 1);
        assert_eq!(bootstraps(Event::ReconnectAttempt { attempt: 3 }), 0);
    }

    #[test]
    fn reconnect_exhausted_is_terminal_failure() {
        let mut events = vec![Event::StartRequested];
        for attempt in 1..=5 {
            events.push(Event::ReconnectAttempt { attempt });
        }
        events.push(Event::ReconnectExhausted);

        let emitted = statuses(events);
        assert_eq!(emitted.last(), Some(&ConnectionStatus::ConnectionFailure));
        assert_eq!(emitted.len(), 7);
    }

    #[test]
    fn every_transition_logs_before_emitting() {
        let (_, actions) = ConnectionState::new().on_event(Event::ChannelError {
            error: "boom".into(),
        });
        assert!(matches!(
            &actions[0],
            Action::Log { level: LogLevel::Error, message } if message.contains("boom")
        ));
        assert_eq!(
            actions[1],
            Action::EmitStatus(ConnectionStatus::UnknownError)
        );
    }

    #[test]
    fn only_connect_signals_bootstrap() {
        let others = vec![
            Event::StartRequested,
            Event::ConnectFailed { error: "x".into() },
            Event::Disconnected { reason: "x".into() },
            Event::ChannelError { error: "x".into() },
            Event::ReconnectExhausted,
        ];
        for event in others {
            assert_eq!(bootstraps(event), 0);
        }
    }
}
