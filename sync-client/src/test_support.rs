//! Helpers shared by the unit tests.

use std::sync::Mutex;
use std::time::Duration;
use sync_types::{ConnectionStatus, LogLevel};

use crate::sink::StatusSink;

/// Status sink that records everything it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    statuses: Mutex<Vec<ConnectionStatus>>,
    logs: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn has_log(&self, level: LogLevel, needle: &str) -> bool {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl StatusSink for RecordingSink {
    fn update_status(&self, status: ConnectionStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.logs.lock().unwrap().push((level, message.to_string()));
    }
}

/// Let spawned tasks run until `condition` holds (or fail after ~2s).
pub(crate) async fn settle(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached");
}
