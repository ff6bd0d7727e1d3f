//! Error types for roomtimer sync.

use thiserror::Error;

/// Errors that can occur while interpreting service data.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A push event or response payload did not match the expected shape
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded (event or request name)
        what: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Unknown push event name
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl SyncError {
    /// Build a decode error for the named event or request.
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }
}
