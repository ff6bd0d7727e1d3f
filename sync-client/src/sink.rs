//! Where connection status and log lines go.

use sync_types::{ConnectionStatus, LogLevel};

/// Receives connection status transitions and human-readable log lines.
///
/// Called inline from the session's event loop; implementations must not
/// block.
pub trait StatusSink: Send + Sync {
    /// A new connection status is current.
    fn update_status(&self, status: ConnectionStatus);

    /// A log line from the client. Forwards to `tracing` by default.
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Status sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn update_status(&self, status: ConnectionStatus) {
        tracing::info!("Connection status: {}", status);
    }
}
