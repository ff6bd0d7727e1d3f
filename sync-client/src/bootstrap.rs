//! Seeding local state after each successful (re)connection.
//!
//! `get_room` and `get_status` go out together. The status branch chains
//! into `get_timer` when a timer is loaded. Every failure is logged and
//! swallowed: a failed fetch never affects the connection, the other branch,
//! or live event handling.

use std::sync::Arc;
use sync_types::{LogLevel, PlaybackSnapshot, RoomUpdate, TimerId, TimerSnapshot};

use crate::api::ApiClient;
use crate::sink::StatusSink;
use crate::store::StateStore;

/// What a fetch chain needs: the API, where results go, where logs go.
///
/// Cheap to clone; each spawned fetch takes its own copy.
#[derive(Clone)]
pub struct SyncContext {
    api: ApiClient,
    store: Arc<dyn StateStore>,
    sink: Arc<dyn StatusSink>,
}

impl SyncContext {
    /// Bundle the collaborators of one connection.
    pub fn new(api: ApiClient, store: Arc<dyn StateStore>, sink: Arc<dyn StatusSink>) -> Self {
        Self { api, store, sink }
    }

    /// The state store updates go to.
    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Forward a log line to the status sink.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.sink.log(level, message);
    }

    /// Run the bootstrap sequence to completion.
    pub async fn bootstrap(&self) {
        self.log(LogLevel::Debug, "Fetching room and playback status");
        tokio::join!(self.sync_room(), self.sync_status());
    }

    async fn sync_room(&self) {
        match self.api.get_room().await {
            Ok(room) => self.store.update_room_state(RoomUpdate::from(room)),
            Err(e) => self.log(LogLevel::Error, &format!("Failed to fetch room: {e}")),
        }
    }

    async fn sync_status(&self) {
        let status = match self.api.get_status().await {
            Ok(status) => status,
            Err(e) => {
                self.log(LogLevel::Error, &format!("Failed to fetch status: {e}"));
                return;
            }
        };

        let playback = PlaybackSnapshot::from(status);
        let timer_id = playback.current_timer_id.clone();
        self.store.update_playback_state(playback);

        if let Some(timer_id) = timer_id {
            self.sync_timer(timer_id).await;
        }
    }

    /// Fetch one timer's details and apply them, keyed by `timer_id`.
    pub async fn sync_timer(&self, timer_id: TimerId) {
        match self.api.get_timer(&timer_id).await {
            Ok(timer) => self
                .store
                .update_timer_state(TimerSnapshot::from_payload(timer_id, timer)),
            Err(e) => self.log(
                LogLevel::Error,
                &format!("Failed to fetch timer {timer_id}: {e}"),
            ),
        }
    }
}
