//! Event and request names used on top of the transport.

use std::fmt;

/// Disconnect reason reported by the transport after a local, intentional close.
pub const LOCAL_DISCONNECT_REASON: &str = "io client disconnect";

/// Push events the service sends without being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Timer playback changed (start/stop/next timer)
    PlaybackStatus,
    /// Room display settings changed (blackout, focus message)
    Room,
    /// On-screen message changed
    Message,
    /// Flash the display
    Flash,
}

impl EventKind {
    /// All push events a session subscribes to.
    pub const ALL: [EventKind; 4] = [
        EventKind::PlaybackStatus,
        EventKind::Room,
        EventKind::Message,
        EventKind::Flash,
    ];

    /// Wire name of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlaybackStatus => "playback_status",
            EventKind::Room => "room",
            EventKind::Message => "message",
            EventKind::Flash => "flash",
        }
    }

    /// Look up an event by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response calls the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Room details
    GetRoom,
    /// Current playback status
    GetStatus,
    /// Details of one timer (params: `{timer_id}`)
    GetTimer,
}

impl RequestKind {
    /// Wire name of this request.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::GetRoom => "get_room",
            RequestKind::GetStatus => "get_status",
            RequestKind::GetTimer => "get_timer",
        }
    }

    /// Look up a request by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::GetRoom, Self::GetStatus, Self::GetTimer]
            .into_iter()
            .find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log line forwarded to a status sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine detail
    Debug,
    /// Normal transitions
    Info,
    /// Recoverable problems
    Warn,
    /// Failures
    Error,
}
