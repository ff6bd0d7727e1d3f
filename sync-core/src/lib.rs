//! # sync-core
//!
//! Pure logic for the roomtimer sync client (no I/O, instant tests).
//!
//! This crate implements the state machines and merge rules for sync
//! without any network I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`state`] maps transport signals to connection statuses and actions
//! - [`reconnect`] decides when to retry and how long to wait
//! - [`room`] merges partial snapshots into one view of the room
//!
//! The actual I/O (sockets, fetches, timers) is performed by `sync-client`,
//! which interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod reconnect;
pub mod room;
pub mod state;

pub use reconnect::{ReconnectAction, ReconnectPolicy, ReconnectState};
pub use room::RoomState;
pub use state::{Action, ConnectionState, Event};
