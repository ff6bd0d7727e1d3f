//! State store seam and an in-memory implementation.
//!
//! The client never reads state back; it only pushes partial updates. How
//! they are merged is the store's business.

use sync_core::RoomState;
use sync_types::{MessageSnapshot, PlaybackSnapshot, RoomUpdate, TimerSnapshot};
use tokio::sync::{broadcast, watch};

/// Flash signals buffered per subscriber before old ones are dropped.
const FLASH_BUFFER: usize = 16;

/// Accepts partial-field updates and merges them.
///
/// Every method is a complete, atomic merge of the fields it is given.
pub trait StateStore: Send + Sync {
    /// Merge room fields; `None` fields are left untouched.
    fn update_room_state(&self, update: RoomUpdate);

    /// Replace the playback status.
    fn update_playback_state(&self, playback: PlaybackSnapshot);

    /// Replace the current timer's details.
    fn update_timer_state(&self, timer: TimerSnapshot);

    /// Replace the on-screen message.
    fn update_message_state(&self, message: MessageSnapshot);

    /// One-shot flash signal.
    fn update_flashing_state(&self, count: u32);
}

/// In-memory [`StateStore`] that publishes every change.
///
/// State changes go out on a `watch` channel, flashes on a `broadcast`
/// channel.
#[derive(Debug)]
pub struct MemoryStore {
    state: watch::Sender<RoomState>,
    flashes: broadcast::Sender<u32>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(RoomState::new());
        let (flashes, _) = broadcast::channel(FLASH_BUFFER);
        Self { state, flashes }
    }

    /// Watch the merged state.
    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state.subscribe()
    }

    /// Receive flash signals sent after this call.
    pub fn subscribe_flashes(&self) -> broadcast::Receiver<u32> {
        self.flashes.subscribe()
    }

    /// Copy of the current merged state.
    pub fn snapshot(&self) -> RoomState {
        self.state.borrow().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn update_room_state(&self, update: RoomUpdate) {
        self.state.send_if_modified(|state| state.apply_room(update));
    }

    fn update_playback_state(&self, playback: PlaybackSnapshot) {
        self.state
            .send_if_modified(|state| state.apply_playback(playback));
    }

    fn update_timer_state(&self, timer: TimerSnapshot) {
        self.state.send_if_modified(|state| state.apply_timer(timer));
    }

    fn update_message_state(&self, message: MessageSnapshot) {
        self.state
            .send_if_modified(|state| state.apply_message(message));
    }

    fn update_flashing_state(&self, count: u32) {
        self.state
            .send_if_modified(|state| state.record_flash(count));
        // No subscribers is fine.
        let _ = self.flashes.send(count);
    }
}
