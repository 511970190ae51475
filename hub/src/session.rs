//! Bridges one live transport to the hub.
//!
//! A session runs three activities against the same connection record:
//!
//! - the **receive loop** reads frames and turns text frames into hub commands,
//! - the **send loop** drains the outbound queue onto the transport,
//! - the **liveness monitor** pings the peer on a fixed interval.
//!
//! Lifecycle: `Connecting` (transport upgraded, [`Session::connect`] in
//! progress) → `Registered`/`Active` ([`Session::run`]) → `Unregistering`
//! (deferred cleanup, runs once on every exit path) → `Closed`.
//!
//! The transport is any `Stream` + `Sink` of [`Frame`]s so the web layer can
//! plug in a WebSocket and tests can plug in channels.

use crate::command::Command;
use crate::connection::{ConnectionId, ConnectionRecord, OutboundQueue};
use crate::error::Error;
use crate::hub::HubHandle;
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, timeout_at, Instant};

/// Transport-agnostic frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl Frame {
    /// Payloads go out as text frames when they are valid UTF-8.
    pub fn from_payload(payload: Bytes) -> Self {
        match String::from_utf8(payload.to_vec()) {
            Ok(text) => Frame::Text(text),
            Err(e) => Frame::Binary(e.into_bytes()),
        }
    }
}

type SharedWriter<W> = Arc<Mutex<W>>;

/// Shortest ping period; a zero period would never tick.
const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

/// A registered connection that has not started its loops yet.
pub struct Session<T> {
    hub: HubHandle,
    record: Arc<ConnectionRecord>,
    outbound: OutboundQueue,
    transport: T,
}

impl<T, E> Session<T>
where
    T: Stream<Item = Result<Frame, E>> + Sink<Frame, Error = E> + Send + 'static,
    E: Display + Send + 'static,
{
    /// Creates a record for the transport and registers it with the hub.
    ///
    /// On failure the transport is dropped, which closes it.
    pub async fn connect(
        hub: HubHandle,
        user_id: impl Into<String>,
        group: impl Into<String>,
        transport: T,
    ) -> Result<Self, Error> {
        let (record, outbound) = hub.new_record(user_id, group);
        hub.register(Arc::clone(&record)).await?;

        Ok(Self {
            hub,
            record,
            outbound,
            transport,
        })
    }

    pub fn id(&self) -> &ConnectionId {
        self.record.id()
    }

    pub fn record(&self) -> &Arc<ConnectionRecord> {
        &self.record
    }

    /// Runs the session until the receive loop ends or a liveness ping
    /// fails, then cleans up.
    pub async fn run(self) {
        let Session {
            hub,
            record,
            outbound,
            transport,
        } = self;
        let config = hub.config().clone();

        let mut cleanup = Cleanup::new(hub.clone(), Arc::clone(&record));
        let (writer, mut reader) = transport.split::<Frame>();
        let writer: SharedWriter<_> = Arc::new(Mutex::new(writer));

        tokio::spawn(send_loop(
            record.id().clone(),
            outbound,
            Arc::clone(&writer),
        ));
        let mut liveness = tokio::spawn(liveness_monitor(
            Arc::clone(&record),
            Arc::clone(&writer),
            config.ping_interval,
        ));
        cleanup.stop_on_exit(liveness.abort_handle());

        // A failed ping is fatal, the receive loop must not outlive it
        tokio::select! {
            _ = receive_loop(&hub, &record, &mut reader, config.read_timeout) => {}
            _ = &mut liveness => {}
        }

        cleanup.finish();

        if let Err(e) = writer.lock().await.close().await {
            debug!("Error closing transport of connection {}: {e}", record.id());
        }
        debug!("Session for connection {} closed", record.id());
    }
}

/// Unregisters the record exactly once and stops the liveness monitor, even
/// if the session future is dropped.
struct Cleanup {
    pending: Option<(HubHandle, Arc<ConnectionRecord>)>,
    liveness: Option<AbortHandle>,
}

impl Cleanup {
    fn new(hub: HubHandle, record: Arc<ConnectionRecord>) -> Self {
        Self {
            pending: Some((hub, record)),
            liveness: None,
        }
    }

    fn stop_on_exit(&mut self, liveness: AbortHandle) {
        self.liveness = Some(liveness);
    }

    fn finish(&mut self) {
        if let Some(liveness) = self.liveness.take() {
            liveness.abort();
        }
        if let Some((hub, record)) = self.pending.take() {
            debug!("Unregistering connection {}", record.id());
            hub.unregister(record);
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.finish();
    }
}

async fn receive_loop<R, E>(
    hub: &HubHandle,
    record: &ConnectionRecord,
    reader: &mut R,
    read_timeout: Duration,
) where
    R: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let mut deadline = Instant::now() + read_timeout;

    loop {
        let frame = match timeout_at(deadline, reader.next()).await {
            Err(_) => {
                info!(
                    "No liveness response from connection {} in {:?}, closing",
                    record.id(),
                    read_timeout
                );
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!("Read error on connection {}: {e}", record.id());
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Frame::Text(text) => route(hub, record, &text),
            Frame::Pong(_) => deadline = Instant::now() + read_timeout,
            Frame::Close => break,
            Frame::Binary(_) | Frame::Ping(_) => {}
        }
    }
}

/// Translates one text frame into a hub operation on behalf of `sender`.
pub fn route(hub: &HubHandle, sender: &ConnectionRecord, text: &str) {
    let Some(command) = Command::parse(text) else {
        trace!("Ignoring malformed frame from connection {}", sender.id());
        return;
    };
    let from = Some(sender.id());

    match command {
        Command::Broadcast { payload } => {
            hub.broadcast_all(Bytes::copy_from_slice(payload.as_bytes()), from)
        }
        Command::Group { group, payload } => {
            hub.broadcast_group(group, Bytes::copy_from_slice(payload.as_bytes()), from)
        }
        Command::To { target, payload } => {
            let target = ConnectionId::from(target);
            if let Err(e) = hub.send_to_id(&target, Bytes::copy_from_slice(payload.as_bytes())) {
                debug!("Direct send from {} ignored: {e}", sender.id());
            }
        }
        Command::Relay { payload } => {
            let payload = Bytes::copy_from_slice(payload.as_bytes());
            match sender.group() {
                Some(group) => hub.broadcast_group(group, payload, from),
                None => hub.broadcast_all(payload, from),
            }
        }
    }
}

async fn send_loop<W>(id: ConnectionId, mut outbound: OutboundQueue, writer: SharedWriter<W>)
where
    W: Sink<Frame> + Unpin,
    W::Error: Display,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = writer.lock().await.send(Frame::from_payload(payload)).await {
            warn!("Failed to write to connection {id}: {e}");
            return;
        }
    }

    debug!("Outbound queue of connection {id} closed, send loop done");
}

/// Returns only when a ping cannot be written.
async fn liveness_monitor<W>(
    record: Arc<ConnectionRecord>,
    writer: SharedWriter<W>,
    period: Duration,
) where
    W: Sink<Frame> + Unpin,
    W::Error: Display,
{
    let period = period.max(MIN_PING_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;

        if let Err(e) = writer.lock().await.send(Frame::Ping(Vec::new())).await {
            warn!(
                "Liveness ping failed, closing connection: id={}, user={}, group={}, err={e}",
                record.id(),
                record.user_id(),
                record.group().unwrap_or_default()
            );
            return;
        }
    }
}
