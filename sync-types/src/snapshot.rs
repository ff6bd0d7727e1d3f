//! Snapshots handed to the state store, and the connection status.
//!
//! Snapshots are transient: the client builds one from a payload, moves it
//! into the store, and keeps nothing.

use std::fmt;

use crate::messages::{
    MessagePayload, RoomChangePayload, RoomPayload, StatusPayload, TimerPayload, Timestamp,
};
use crate::{RoomId, TimerId};

/// Observable connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Connect or reconnect attempt in flight
    Connecting,
    /// Connected and authenticated
    Ok,
    /// Connection dropped by the server or network
    Disconnected,
    /// Connect failed, or all reconnection attempts failed
    ConnectionFailure,
    /// Channel-level error while connected
    UnknownError,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Ok => "ok",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::ConnectionFailure => "connection failure",
            ConnectionStatus::UnknownError => "unknown error",
        };
        f.write_str(label)
    }
}

/// Partial room state. `None` fields are left untouched by the store.
///
/// `room_focus` is nullable on the service side, so `Some(None)` clears it
/// while `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomUpdate {
    /// Room identifier
    pub room_id: Option<RoomId>,
    /// Room name
    pub room_name: Option<String>,
    /// Blackout flag
    pub room_blackout: Option<bool>,
    /// Focus message
    pub room_focus: Option<Option<String>>,
}

impl RoomUpdate {
    /// Whether this update carries the room's identity fields.
    pub fn touches_identity(&self) -> bool {
        self.room_id.is_some() || self.room_name.is_some()
    }
}

impl From<RoomPayload> for RoomUpdate {
    fn from(room: RoomPayload) -> Self {
        Self {
            room_id: Some(RoomId::new(room.id)),
            room_name: Some(room.name),
            room_blackout: Some(room.blackout),
            room_focus: Some(room.focus_message),
        }
    }
}

impl From<RoomChangePayload> for RoomUpdate {
    fn from(change: RoomChangePayload) -> Self {
        Self {
            room_id: None,
            room_name: None,
            room_blackout: Some(change.blackout),
            room_focus: Some(change.focus_message),
        }
    }
}

/// Playback state of the room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    /// Timer currently loaded, if any
    pub current_timer_id: Option<TimerId>,
    /// Whether the timer is running
    pub is_running: bool,
    /// Start time
    pub kickoff: Option<Timestamp>,
    /// Time the timer reaches zero
    pub deadline: Option<Timestamp>,
    /// Time the timer was last stopped
    pub last_stop: Option<Timestamp>,
}

impl From<StatusPayload> for PlaybackSnapshot {
    fn from(status: StatusPayload) -> Self {
        Self {
            current_timer_id: TimerId::from_optional(status.timer_id),
            is_running: status.running,
            kickoff: status.start,
            deadline: status.finish,
            last_stop: status.pause,
        }
    }
}

/// Details of one timer, tagged with the id it was fetched for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerSnapshot {
    /// The id the fetch was keyed by
    pub timer_id: Option<TimerId>,
    /// Timer title
    pub name: String,
    /// Speaker
    pub speaker: String,
    /// Notes
    pub notes: String,
    /// Duration in milliseconds
    pub duration: u64,
    /// Yellow wrap-up threshold in milliseconds
    pub wrap_up_yellow_at: Option<u64>,
    /// Red wrap-up threshold in milliseconds
    pub wrap_up_red_at: Option<u64>,
}

impl TimerSnapshot {
    /// Build a snapshot from a `get_timer` response for `timer_id`.
    pub fn from_payload(timer_id: TimerId, timer: TimerPayload) -> Self {
        Self {
            timer_id: Some(timer_id),
            name: timer.name.unwrap_or_default(),
            speaker: timer.speaker.unwrap_or_default(),
            notes: timer.notes.unwrap_or_default(),
            duration: timer.duration,
            wrap_up_yellow_at: timer.wrap_up_yellow,
            wrap_up_red_at: timer.wrap_up_red,
        }
    }
}

/// On-screen message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Whether the message is displayed
    pub showing: bool,
    /// Text
    pub text: String,
    /// Color
    pub color: String,
    /// Bold
    pub bold: bool,
    /// Uppercase
    pub uppercase: bool,
}

impl From<MessagePayload> for MessageSnapshot {
    fn from(message: MessagePayload) -> Self {
        Self {
            showing: message.showing,
            text: message.text,
            color: message.color,
            bold: message.bold,
            uppercase: message.uppercase,
        }
    }
}
