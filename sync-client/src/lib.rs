//! # sync-client
//!
//! Real-time client for a room on the roomtimer service.
//!
//! Keeps one auto-reconnecting connection per room, turns transport signals
//! into a connection status, seeds local state after each (re)connection,
//! and folds push events into a host-supplied state store.
//!
//! ## Features
//!
//! - **Connection lifecycle**: bounded reconnection (5 attempts, 10 s cap)
//! - **Bootstrap**: `get_room` and `get_status` in parallel, then `get_timer`
//! - **Event dispatch**: `playback_status`, `room`, `message`, `flash`
//! - **Transport Abstraction**: Pluggable transport layer (Socket.IO, mock)
//! - **Pure State Machine**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use sync_client::{ConnectionConfig, ConnectionSession, MemoryStore, SessionHandlers,
//!     SocketIoFactory, TracingSink};
//!
//! let config = ConnectionConfig::from_api_url("https://api.example.io/v1/", "r1", api_key)?;
//! let store = Arc::new(MemoryStore::new());
//! let mut session = ConnectionSession::new(SocketIoFactory::default());
//! session
//!     .start(config, SessionHandlers { sink: Arc::new(TracingSink), store: store.clone() })
//!     .await?;
//!
//! let mut changes = store.subscribe();
//! while changes.changed().await.is_ok() {
//!     println!("{:?}", *changes.borrow());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod session;
pub mod sink;
pub mod store;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError};
pub use bootstrap::SyncContext;
pub use config::{ConfigError, ConnectionConfig};
pub use dispatch::Dispatcher;
pub use session::{ConnectionSession, SessionError, SessionHandlers};
pub use sink::{StatusSink, TracingSink};
pub use store::{MemoryStore, StateStore};
pub use transport::{
    MockFactory, MockTransport, SignalReceiver, SocketIoConfig, SocketIoFactory,
    SocketIoTransport, Transport, TransportError, TransportFactory, TransportSignal,
};
