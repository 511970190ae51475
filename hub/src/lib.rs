//! Real-time connection hub.
//!
//! Tracks every live client connection, organizes connections into named
//! groups and routes messages to one connection, one group, or everyone.
//!
//! # Architecture
//!
//! - **Single-writer hub loop**: register, unregister and broadcast events are
//!   funneled through one task ([`Hub::run`]), so the registry always reflects
//!   the serialized event history.
//! - **Dual-index registry**: connections by id and members by group, behind
//!   one read/write lock. Direct sends and snapshots only take the read side.
//! - **Bounded per-connection queues**: delivery is a non-blocking enqueue.
//!   A connection whose queue is full is evicted rather than waited on.
//! - **Ephemeral messages**: there is no persistence and no at-least-once
//!   delivery. A dropped or evicted connection simply stops receiving.
//!
//! # Message Flow
//!
//! 1. A transport is upgraded and handed to [`Session::connect`], which
//!    registers a new [`ConnectionRecord`] with the hub
//! 2. [`Session::run`] starts the send loop and liveness monitor, then reads
//!    frames until the transport fails or goes quiet
//! 3. Text frames are parsed as [`Command`]s (`broadcast:`, `group:`, `to:`)
//!    and submitted to the hub
//! 4. The hub loop resolves targets and enqueues the payload on each
//!    target's outbound queue, evicting slow consumers
//! 5. Each target's send loop writes queued payloads to its transport
//!
//! # Modules
//!
//! - `connection`: ConnectionRecord, ConnectionId and the outbound queue
//! - `registry`: id and group indices
//! - `hub`: the control loop and its cloneable handle
//! - `dispatch`: target resolution and enqueue-or-evict
//! - `session`: per-connection receive, send and liveness activities
//! - `command`: the textual command scheme

pub mod command;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod registry;
pub mod session;

pub use command::Command;
pub use connection::{ConnectionId, ConnectionRecord, OutboundQueue, UserId};
pub use dispatch::BroadcastRequest;
pub use hub::{Hub, HubConfig, HubHandle};
pub use registry::Registry;
pub use session::{Frame, Session};
