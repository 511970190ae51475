use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

// Caller supplied and opaque to the hub, not required to be unique
pub type UserId = String;

/// Receiving half of a connection's outbound queue, drained by the send loop.
pub type OutboundQueue = mpsc::Receiver<Bytes>;

/// Number of payloads a connection may have pending before it is treated as slow.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Unique identifier for a connection (hub-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh 128-bit random identity.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Result of a non-blocking enqueue attempt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Offer {
    Queued,
    // The consumer is not keeping up
    Full,
    // Queue already closed, or its send loop has exited
    Closed,
}

/// Per-connection state tracked by the registry.
///
/// The record only holds the producing side of the outbound queue. The
/// transport itself stays with the session that owns the connection.
pub struct ConnectionRecord {
    id: ConnectionId,
    user_id: UserId,
    group: String,
    outbound: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl ConnectionRecord {
    /// Creates a record together with the receiving end of its outbound queue.
    ///
    /// An empty `group` means the connection only takes part in global broadcasts.
    pub fn new(
        id: ConnectionId,
        user_id: impl Into<UserId>,
        group: impl Into<String>,
        capacity: usize,
    ) -> (Arc<Self>, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let record = Arc::new(Self {
            id,
            user_id: user_id.into(),
            group: group.into(),
            outbound: Mutex::new(Some(tx)),
        });
        (record, rx)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The connection's group, `None` when ungrouped.
    pub fn group(&self) -> Option<&str> {
        if self.group.is_empty() {
            None
        } else {
            Some(&self.group)
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.lock().is_none()
    }

    /// Attempts to enqueue without waiting for room.
    pub(crate) fn try_offer(&self, payload: Bytes) -> Offer {
        let outbound = self.outbound.lock();
        match outbound.as_ref() {
            None => Offer::Closed,
            Some(tx) => match tx.try_send(payload) {
                Ok(()) => Offer::Queued,
                Err(TrySendError::Full(_)) => Offer::Full,
                Err(TrySendError::Closed(_)) => Offer::Closed,
            },
        }
    }

    /// Drops the producing side so the send loop drains what is left and stops.
    ///
    /// Returns `true` only for the call that actually closed the queue.
    pub(crate) fn close(&self) -> bool {
        self.outbound.lock().take().is_some()
    }
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("group", &self.group)
            .field("closed", &self.is_closed())
            .finish()
    }
}
