//! Transport abstraction for roomtimer sync.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (Socket.IO over WebSocket, mock for
//! testing).
//!
//! # Design
//!
//! A transport is one handle to one authenticated room:
//! - `connect()` starts connecting; progress is reported as [`TransportSignal`]s
//! - `request()` emits a request and awaits its single reply
//! - `close()` gracefully terminates and stops any reconnection
//!
//! Signals (lifecycle changes and push events) arrive in transport order on
//! the [`SignalReceiver`] handed out by [`TransportFactory::open`]. The channel
//! closes once the transport has shut down for good.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut signals) = SocketIoFactory::default().open(&config, &policy)?;
//! transport.connect().await?;
//! while let Some(signal) = signals.recv().await {
//!     println!("{signal:?}");
//! }
//! ```

mod mock;
mod packet;
mod socketio;

pub use mock::{MockFactory, MockTransport};
pub use socketio::{SocketIoConfig, SocketIoFactory, SocketIoTransport};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use sync_core::ReconnectPolicy;
use sync_types::RequestKind;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ConnectionConfig;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed before the operation finished.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The service answered a request with a failure.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Everything a transport reports, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    /// First successful connection of this handle.
    Connected,
    /// A connection attempt failed.
    ConnectError(String),
    /// The connection was lost or closed, with the transport's reason.
    Disconnected(String),
    /// Channel-level error while connected.
    Error(String),
    /// About to make reconnection attempt `n` (1-based).
    ReconnectAttempt(u32),
    /// Reconnection attempt `n` succeeded.
    Reconnected(u32),
    /// All reconnection attempts failed; the transport has given up.
    ReconnectFailed,
    /// A push event from the service.
    Event {
        /// Event name.
        name: String,
        /// Event payload.
        payload: Value,
    },
}

/// Receiving end of a transport's signal stream.
pub type SignalReceiver = mpsc::UnboundedReceiver<TransportSignal>;

/// Sending end of a transport's signal stream.
pub type SignalSender = mpsc::UnboundedSender<TransportSignal>;

/// Transport trait for one connection to one room.
///
/// Implementations handle the underlying connection mechanism
/// and its bounded reconnection schedule.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start connecting. Success or failure is reported as signals.
    ///
    /// Returns an error only if the connection cannot even be started.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Emit a request and await exactly one reply.
    async fn request(&self, kind: RequestKind, params: Value) -> Result<Value, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully and stop reconnecting.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds a fresh transport handle for each session start.
pub trait TransportFactory: Send + Sync {
    /// Create a transport scoped to the config's room and API key.
    fn open(
        &self,
        config: &ConnectionConfig,
        policy: &ReconnectPolicy,
    ) -> Result<(Arc<dyn Transport>, SignalReceiver), TransportError>;
}
