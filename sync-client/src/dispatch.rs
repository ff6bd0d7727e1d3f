//! Push-event dispatch table.
//!
//! Built once per connection. Each handler decodes its payload, applies a
//! snapshot to the store, and returns; the `playback_status` handler also
//! spawns the timer fetch so it never holds up the next event.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use sync_types::{
    EventKind, FlashPayload, LogLevel, MessagePayload, MessageSnapshot, PlaybackSnapshot,
    RoomChangePayload, RoomUpdate, StatusPayload, SyncError,
};

use crate::bootstrap::SyncContext;

type Handler = fn(&Dispatcher, Value) -> Result<(), SyncError>;

/// Routes push events to their handlers.
pub struct Dispatcher {
    context: SyncContext,
    handlers: HashMap<EventKind, Handler>,
}

impl Dispatcher {
    /// Build the table for one connection.
    pub fn new(context: SyncContext) -> Self {
        let mut handlers: HashMap<EventKind, Handler> = HashMap::new();
        handlers.insert(EventKind::PlaybackStatus, Self::on_playback_status);
        handlers.insert(EventKind::Room, Self::on_room);
        handlers.insert(EventKind::Message, Self::on_message);
        handlers.insert(EventKind::Flash, Self::on_flash);
        Self { context, handlers }
    }

    /// Handle one push event, logging any failure.
    pub fn dispatch(&self, name: &str, payload: Value) {
        match self.handle(name, payload) {
            Ok(()) => {}
            Err(SyncError::UnknownEvent(name)) => {
                self.context
                    .log(LogLevel::Debug, &format!("Ignoring unknown event {name}"));
            }
            Err(e) => self
                .context
                .log(LogLevel::Error, &format!("Failed to handle {name}: {e}")),
        }
    }

    /// Handle one push event.
    pub fn handle(&self, name: &str, payload: Value) -> Result<(), SyncError> {
        let handler = EventKind::from_name(name)
            .and_then(|kind| self.handlers.get(&kind))
            .ok_or_else(|| SyncError::UnknownEvent(name.to_string()))?;
        handler(self, payload)
    }

    fn on_playback_status(&self, payload: Value) -> Result<(), SyncError> {
        let status: StatusPayload = decode(EventKind::PlaybackStatus, payload)?;
        let playback = PlaybackSnapshot::from(status);
        let timer_id = playback.current_timer_id.clone();
        self.context.store().update_playback_state(playback);

        if let Some(timer_id) = timer_id {
            let context = self.context.clone();
            tokio::spawn(async move { context.sync_timer(timer_id).await });
        }
        Ok(())
    }

    fn on_room(&self, payload: Value) -> Result<(), SyncError> {
        let room: RoomChangePayload = decode(EventKind::Room, payload)?;
        self.context.store().update_room_state(RoomUpdate::from(room));
        Ok(())
    }

    fn on_message(&self, payload: Value) -> Result<(), SyncError> {
        let message: MessagePayload = decode(EventKind::Message, payload)?;
        self.context
            .store()
            .update_message_state(MessageSnapshot::from(message));
        Ok(())
    }

    fn on_flash(&self, payload: Value) -> Result<(), SyncError> {
        let flash: FlashPayload = decode(EventKind::Flash, payload)?;
        self.context.store().update_flashing_state(flash.count);
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: Value) -> Result<T, SyncError> {
    serde_json::from_value(payload).map_err(|e| SyncError::decode(kind.as_str(), e))
}
