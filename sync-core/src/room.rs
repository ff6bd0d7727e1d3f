//! Merged view of one room.
//!
//! [`RoomState`] applies the partial snapshots produced by the client, one
//! facet at a time. It has no ordering logic: whatever arrives last wins,
//! field by field. Every `apply_*` method reports whether anything changed so
//! that hosts can skip redundant redraws.

use sync_types::{MessageSnapshot, PlaybackSnapshot, RoomId, RoomUpdate, TimerSnapshot};

/// Everything known about the room, merged from pushes and fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomState {
    /// Room identifier (only set by a full fetch)
    pub room_id: Option<RoomId>,
    /// Room name (only set by a full fetch)
    pub room_name: Option<String>,
    /// Blackout flag
    pub room_blackout: bool,
    /// Focus message
    pub room_focus: Option<String>,
    /// Latest playback status
    pub playback: PlaybackSnapshot,
    /// Details of the current timer
    pub timer: TimerSnapshot,
    /// On-screen message
    pub message: MessageSnapshot,
    /// Count from the most recent flash signal
    pub last_flash: Option<u32>,
}

impl RoomState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial room update; omitted fields are left untouched.
    pub fn apply_room(&mut self, update: RoomUpdate) -> bool {
        let mut changed = false;
        if let Some(room_id) = update.room_id {
            changed |= replace(&mut self.room_id, Some(room_id));
        }
        if let Some(room_name) = update.room_name {
            changed |= replace(&mut self.room_name, Some(room_name));
        }
        if let Some(blackout) = update.room_blackout {
            changed |= replace(&mut self.room_blackout, blackout);
        }
        if let Some(focus) = update.room_focus {
            changed |= replace(&mut self.room_focus, focus);
        }
        changed
    }

    /// Replace the playback status.
    pub fn apply_playback(&mut self, playback: PlaybackSnapshot) -> bool {
        replace(&mut self.playback, playback)
    }

    /// Replace the timer details.
    ///
    /// Applied regardless of whether `timer.timer_id` still matches the
    /// current playback timer: a late response overwrites a newer one.
    pub fn apply_timer(&mut self, timer: TimerSnapshot) -> bool {
        replace(&mut self.timer, timer)
    }

    /// Replace the on-screen message.
    pub fn apply_message(&mut self, message: MessageSnapshot) -> bool {
        replace(&mut self.message, message)
    }

    /// Record a flash signal. Always counts as a change, even for a repeat.
    pub fn record_flash(&mut self, count: u32) -> bool {
        self.last_flash = Some(count);
        true
    }

    /// Whether the stored timer details belong to the current playback timer.
    pub fn timer_is_current(&self) -> bool {
        self.timer.timer_id.is_some() && self.timer.timer_id == self.playback.current_timer_id
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
