use crate::connection::{
    ConnectionId, ConnectionRecord, OutboundQueue, UserId, DEFAULT_QUEUE_CAPACITY,
};
use crate::dispatch::{self, BroadcastRequest, Verdict};
use crate::error::{Error, HubErrorKind};
use crate::registry::Registry;
use bytes::Bytes;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Tunables shared by the hub and the sessions attached to it.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of every connection's outbound queue
    pub queue_capacity: usize,
    /// How often a liveness ping is sent; periods under 1ms are raised to 1ms
    pub ping_interval: Duration,
    /// How long a connection may go without answering a ping
    pub read_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ping_interval: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
        }
    }
}

struct Registration {
    record: Arc<ConnectionRecord>,
    ack: oneshot::Sender<Result<(), Error>>,
}

/// The single control loop that owns every structural change to the registry.
///
/// Events are handled in submission order per channel. There is no ordering
/// across the register, unregister and broadcast channels.
pub struct Hub {
    registry: Arc<Registry>,
    register_rx: mpsc::UnboundedReceiver<Registration>,
    unregister_rx: mpsc::UnboundedReceiver<Arc<ConnectionRecord>>,
    broadcast_rx: mpsc::UnboundedReceiver<BroadcastRequest>,
}

impl Hub {
    pub fn new(config: HubConfig) -> (Hub, HubHandle) {
        let registry = Arc::new(Registry::new());
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

        let hub = Hub {
            registry: Arc::clone(&registry),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };
        let handle = HubHandle {
            registry,
            register_tx,
            unregister_tx,
            broadcast_tx,
            config,
        };

        (hub, handle)
    }

    /// Creates a hub and runs its loop on the current tokio runtime.
    pub fn spawn(config: HubConfig) -> HubHandle {
        let (hub, handle) = Hub::new(config);
        tokio::spawn(hub.run());
        handle
    }

    /// Runs until every handle has been dropped.
    pub async fn run(mut self) {
        info!("Connection hub started");

        loop {
            tokio::select! {
                Some(registration) = self.register_rx.recv() => self.on_register(registration),
                Some(record) = self.unregister_rx.recv() => self.on_unregister(&record),
                Some(request) = self.broadcast_rx.recv() => self.on_broadcast(&request),
                else => break,
            }
        }

        info!("Connection hub stopped");
    }

    fn on_register(&self, registration: Registration) {
        let Registration { record, ack } = registration;

        let result = self.registry.insert(Arc::clone(&record));
        match &result {
            Ok(()) => info!(
                "Registered connection: id={}, user={}, group={}",
                record.id(),
                record.user_id(),
                record.group().unwrap_or_default()
            ),
            Err(e) => {
                error!("Rejected connection registration: {e}");
                record.close();
            }
        }

        if ack.send(result).is_err() {
            // The session went away while waiting, don't leave it behind
            debug!(
                "Registration of connection {} was abandoned, unregistering",
                record.id()
            );
            self.on_unregister(&record);
        }
    }

    fn on_unregister(&self, record: &Arc<ConnectionRecord>) {
        if self.registry.remove(record) {
            info!(
                "Unregistered connection: id={}, user={}, group={}",
                record.id(),
                record.user_id(),
                record.group().unwrap_or_default()
            );
        } else {
            trace!("Connection {} was already unregistered", record.id());
        }
    }

    fn on_broadcast(&self, request: &BroadcastRequest) {
        let outcome = dispatch::broadcast(&self.registry, request);
        debug!(
            "Broadcast to {}: delivered={}, evicted={}",
            if request.group.is_empty() {
                "all"
            } else {
                request.group.as_str()
            },
            outcome.delivered,
            outcome.evicted
        );
    }
}

/// Cloneable entry point to a running hub.
///
/// Submitting events never waits on the hub loop or on any connection.
#[derive(Clone)]
pub struct HubHandle {
    registry: Arc<Registry>,
    register_tx: mpsc::UnboundedSender<Registration>,
    unregister_tx: mpsc::UnboundedSender<Arc<ConnectionRecord>>,
    broadcast_tx: mpsc::UnboundedSender<BroadcastRequest>,
    config: HubConfig,
}

impl HubHandle {
    /// Returns a process-unique connection identity.
    pub fn generate_id() -> ConnectionId {
        ConnectionId::new()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Read-only view of the current topology.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds a record with a fresh id and this hub's queue capacity.
    pub fn new_record(
        &self,
        user_id: impl Into<UserId>,
        group: impl Into<String>,
    ) -> (Arc<ConnectionRecord>, OutboundQueue) {
        ConnectionRecord::new(
            Self::generate_id(),
            user_id,
            group,
            self.config.queue_capacity,
        )
    }

    /// Registers a record and waits for the hub loop to confirm it.
    pub async fn register(&self, record: Arc<ConnectionRecord>) -> Result<(), Error> {
        let (ack, confirmed) = oneshot::channel();

        self.register_tx
            .send(Registration { record, ack })
            .map_err(|_| Error::hub_closed())?;

        confirmed.await.map_err(|_| Error::hub_closed())?
    }

    /// Asks the hub loop to remove a record and close its queue. Safe to repeat.
    pub fn unregister(&self, record: Arc<ConnectionRecord>) {
        if let Err(e) = self.unregister_tx.send(record) {
            debug!(
                "Hub stopped before connection {} could be unregistered",
                e.0.id()
            );
        }
    }

    /// Submits a broadcast; delivery happens later on the hub loop.
    pub fn broadcast(&self, request: BroadcastRequest) {
        if self.broadcast_tx.send(request).is_err() {
            warn!("Hub stopped, dropping broadcast");
        }
    }

    pub fn broadcast_all(&self, payload: impl Into<Bytes>, exclude: Option<&ConnectionId>) {
        self.broadcast(BroadcastRequest::all(payload, exclude.cloned()));
    }

    pub fn broadcast_group(
        &self,
        group: &str,
        payload: impl Into<Bytes>,
        exclude: Option<&ConnectionId>,
    ) {
        self.broadcast(BroadcastRequest::group(group, payload, exclude.cloned()));
    }

    /// Enqueues a payload for exactly one connection without waiting.
    ///
    /// Fails with `TargetNotFound` for unknown ids. A target that cannot take
    /// the payload is evicted and the call fails with `TargetGone`.
    pub fn send_to_id(&self, id: &ConnectionId, payload: impl Into<Bytes>) -> Result<(), Error> {
        let record = self
            .registry
            .find_by_id(id)
            .ok_or_else(|| Error::new(HubErrorKind::TargetNotFound, id.as_str()))?;

        match dispatch::offer(&record, payload.into()) {
            Verdict::Delivered => Ok(()),
            Verdict::Evict => {
                self.unregister(record);
                Err(Error::new(HubErrorKind::TargetGone, id.as_str()))
            }
        }
    }
}
