//! Target selection and the drop-the-slow-consumer delivery rule.
//!
//! Delivery never waits for room in a queue. A connection whose queue is
//! full (or already closed) is treated as gone and evicted, so one slow
//! reader cannot stall the hub loop and with it every other connection.
//! There is no retry and no delivery guarantee to any individual
//! connection beyond the fixed-capacity queue.

use crate::connection::{ConnectionId, ConnectionRecord, Offer};
use crate::registry::Registry;
use bytes::Bytes;
use log::*;
use std::sync::Arc;

/// A message to fan out, consumed once by the hub loop.
#[derive(Debug, Clone)]
pub struct BroadcastRequest {
    /// Target group; empty means every registered connection
    pub group: String,
    /// Connection to skip, usually the sender
    pub exclude: Option<ConnectionId>,
    pub payload: Bytes,
}

impl BroadcastRequest {
    pub fn all(payload: impl Into<Bytes>, exclude: Option<ConnectionId>) -> Self {
        Self {
            group: String::new(),
            exclude,
            payload: payload.into(),
        }
    }

    pub fn group(
        group: impl Into<String>,
        payload: impl Into<Bytes>,
        exclude: Option<ConnectionId>,
    ) -> Self {
        Self {
            group: group.into(),
            exclude,
            payload: payload.into(),
        }
    }
}

/// What happened to a single delivery attempt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Delivered,
    Evict,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DispatchOutcome {
    pub delivered: usize,
    pub evicted: usize,
}

/// Resolves the snapshot of connections a request is aimed at, minus the excluded id.
pub(crate) fn resolve_targets(
    registry: &Registry,
    request: &BroadcastRequest,
) -> Vec<Arc<ConnectionRecord>> {
    let snapshot = if request.group.is_empty() {
        registry.snapshot_all()
    } else {
        registry.snapshot_group(&request.group)
    };

    snapshot
        .into_iter()
        .filter(|record| request.exclude.as_ref() != Some(record.id()))
        .collect()
}

/// Single non-blocking enqueue attempt.
pub(crate) fn offer(record: &ConnectionRecord, payload: Bytes) -> Verdict {
    match record.try_offer(payload) {
        Offer::Queued => Verdict::Delivered,
        Offer::Full => {
            warn!(
                "Outbound queue full, evicting slow connection: id={}, user={}, group={}",
                record.id(),
                record.user_id(),
                record.group().unwrap_or_default()
            );
            Verdict::Evict
        }
        Offer::Closed => {
            debug!(
                "Outbound queue of connection {} already closed, evicting",
                record.id()
            );
            Verdict::Evict
        }
    }
}

/// Fans a request out to its targets, evicting every target that cannot take it.
///
/// Must only be called from the hub loop, which owns registry mutation.
pub(crate) fn broadcast(registry: &Registry, request: &BroadcastRequest) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for record in resolve_targets(registry, request) {
        match offer(&record, request.payload.clone()) {
            Verdict::Delivered => outcome.delivered += 1,
            Verdict::Evict => {
                registry.remove(&record);
                outcome.evicted += 1;
            }
        }
    }

    outcome
}
