//! # sync-types
//!
//! Application-level types for the roomtimer sync protocol.
//!
//! This crate provides the foundational types used across all roomtimer crates:
//! - [`RoomId`], [`TimerId`] - Identity types
//! - [`EventKind`], [`RequestKind`] - Push event and request names
//! - Payload types ([`StatusPayload`], [`RoomPayload`], ...) - what the service sends
//! - Snapshot types ([`PlaybackSnapshot`], [`RoomUpdate`], ...) - what the store receives
//! - [`ConnectionStatus`] - Observable connection status
//! - [`SyncError`] - Error types
//!
//! The wire encoding of the transport is not defined here; these types only
//! describe the JSON values carried inside it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod ids;
mod messages;
mod snapshot;

pub use error::SyncError;
pub use events::{EventKind, LogLevel, RequestKind, LOCAL_DISCONNECT_REASON};
pub use ids::{RoomId, TimerId};
pub use messages::{
    ApiResponse, FlashPayload, MessagePayload, RoomChangePayload, RoomPayload, StatusPayload,
    TimerPayload, TimerRequest, Timestamp,
};
pub use snapshot::{
    ConnectionStatus, MessageSnapshot, PlaybackSnapshot, RoomUpdate, TimerSnapshot,
};
