//! In-process set + pub/sub server.
//!
//! A [`MemoryServer`] holds the data. [`MemoryServer::connect`] spawns one
//! connection task that services frames in arrival order; every batch of
//! frames it picks up counts as one round trip and pays the configured
//! latency once. Frames queued while a round trip is in progress are
//! coalesced into the next one, the way a multiplexed client pipelines
//! concurrent commands onto one socket.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::{Batch, Store, StoreFuture};
use crate::error::StoreError;

pub const DEFAULT_ADDRESS: &str = "memory://local";
const DEFAULT_SUBSCRIBER_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address clients must pass to [`MemoryServer::connect`].
    pub address: String,
    /// Simulated network delay paid once per round trip.
    pub round_trip_latency: Duration,
    /// Messages buffered per subscriber before it starts lagging.
    pub subscriber_buffer: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            round_trip_latency: Duration::ZERO,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

#[derive(Default)]
struct ServerState {
    sets: HashMap<String, HashSet<Vec<u8>>>,
    channels: HashMap<String, broadcast::Sender<Vec<u8>>>,
    shut_down: bool,
}

struct Shared {
    options: ServerOptions,
    state: Mutex<ServerState>,
    round_trips: AtomicU64,
}

#[derive(Clone)]
pub struct MemoryServer {
    shared: Arc<Shared>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new(ServerOptions::default())
    }
}

impl MemoryServer {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                state: Mutex::new(ServerState::default()),
                round_trips: AtomicU64::new(0),
            }),
        }
    }

    pub fn address(&self) -> &str {
        &self.shared.options.address
    }

    /// Open a connection. Must be called inside a tokio runtime.
    pub async fn connect(&self, address: &str) -> Result<MemoryConnection, StoreError> {
        if address != self.address() {
            return Err(StoreError::Connect {
                address: address.to_string(),
                reason: "no server listening at this address".to_string(),
            });
        }
        if self.shared.state.lock().shut_down {
            return Err(StoreError::Connect {
                address: address.to_string(),
                reason: "server is shut down".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(serve(self.clone(), rx));
        debug!(address, "connected");
        Ok(MemoryConnection { tx })
    }

    /// Subscribe to `channel`. Only messages published after this call are
    /// delivered.
    pub fn subscribe(&self, channel: &str) -> Subscription {
        let capacity = self.shared.options.subscriber_buffer.max(1);
        let mut state = self.shared.state.lock();
        let rx = state
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe();
        Subscription {
            channel: channel.to_string(),
            rx,
        }
    }

    pub fn members(&self, key: &str) -> Option<BTreeSet<Vec<u8>>> {
        let state = self.shared.state.lock();
        state.sets.get(key).map(|set| set.iter().cloned().collect())
    }

    pub fn key_count(&self) -> usize {
        self.shared.state.lock().sets.len()
    }

    /// Every set, ordered by key, for comparing store contents.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<Vec<u8>>> {
        let state = self.shared.state.lock();
        state
            .sets
            .iter()
            .map(|(key, set)| (key.clone(), set.iter().cloned().collect()))
            .collect()
    }

    /// Round trips served across all connections so far.
    pub fn round_trips(&self) -> u64 {
        self.shared.round_trips.load(Ordering::Relaxed)
    }

    /// Drop every set. Channels and subscribers are kept.
    pub fn flush_all(&self) {
        self.shared.state.lock().sets.clear();
    }

    /// Reject every further command and connection attempt.
    pub fn shutdown(&self) {
        self.shared.state.lock().shut_down = true;
        debug!(address = self.address(), "server shut down");
    }

    async fn round_trip(&self) {
        self.shared.round_trips.fetch_add(1, Ordering::Relaxed);
        let latency = self.shared.options.round_trip_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn apply(&self, request: Request) {
        let mut state = self.shared.state.lock();
        match request {
            Request::SetAdd { key, member, reply } => {
                let result = if state.shut_down {
                    Err(rejected())
                } else {
                    Ok(state.sets.entry(key).or_default().insert(member))
                };
                let _ = reply.send(result);
            }
            Request::Publish {
                channel,
                payload,
                reply,
            } => {
                let result = if state.shut_down {
                    Err(rejected())
                } else {
                    // send only fails when nobody is subscribed
                    Ok(state
                        .channels
                        .get(&channel)
                        .and_then(|tx| tx.send(payload).ok())
                        .unwrap_or(0) as u64)
                };
                let _ = reply.send(result);
            }
        }
    }
}

fn rejected() -> StoreError {
    StoreError::Rejected("server is shut down".to_string())
}

#[derive(Debug)]
enum Request {
    SetAdd {
        key: String,
        member: Vec<u8>,
        reply: oneshot::Sender<Result<bool, StoreError>>,
    },
    Publish {
        channel: String,
        payload: Vec<u8>,
        reply: oneshot::Sender<Result<u64, StoreError>>,
    },
}

#[derive(Debug)]
enum Command {
    Frame(Vec<Request>),
    Close(oneshot::Sender<()>),
}

async fn serve(server: MemoryServer, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending = Vec::new();
    while let Some(first) = rx.recv().await {
        pending.push(first);
        while let Ok(next) = rx.try_recv() {
            pending.push(next);
        }

        server.round_trip().await;
        for command in pending.drain(..) {
            match command {
                Command::Frame(requests) => {
                    trace!(commands = requests.len(), "frame");
                    for request in requests {
                        server.apply(request);
                    }
                }
                Command::Close(ack) => {
                    // refuse new commands before acknowledging
                    rx.close();
                    let _ = ack.send(());
                    debug!(address = server.address(), "connection closed");
                    return;
                }
            }
        }
    }
    debug!(address = server.address(), "all connection handles dropped");
}

/// Handle to one connection. Clones share it.
#[derive(Clone, Debug)]
pub struct MemoryConnection {
    tx: mpsc::UnboundedSender<Command>,
}

impl MemoryConnection {
    /// Close the connection after every command already submitted has been
    /// served. Commands submitted afterwards on any clone fail with
    /// [`StoreError::ConnectionClosed`].
    pub async fn close(self) -> Result<(), StoreError> {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Close(ack)).is_err() {
            return Ok(());
        }
        // a dropped ack means the task already stopped
        let _ = done.await;
        Ok(())
    }

    fn submit(&self, requests: Vec<Request>) -> Result<(), StoreError> {
        self.tx
            .send(Command::Frame(requests))
            .map_err(|_| StoreError::ConnectionClosed)
    }
}

fn await_reply<T: Send + 'static>(
    submitted: Result<(), StoreError>,
    reply: oneshot::Receiver<Result<T, StoreError>>,
) -> StoreFuture<T> {
    Box::pin(async move {
        submitted?;
        reply.await.map_err(|_| StoreError::Cancelled)?
    })
}

impl Store for MemoryConnection {
    type Batch = MemoryBatch;

    fn set_add(&self, key: String, member: Vec<u8>) -> StoreFuture<bool> {
        let (reply, rx) = oneshot::channel();
        let submitted = self.submit(vec![Request::SetAdd { key, member, reply }]);
        await_reply(submitted, rx)
    }

    fn batch(&self) -> MemoryBatch {
        MemoryBatch {
            tx: self.tx.clone(),
            queued: Vec::new(),
        }
    }

    fn publish(&self, channel: String, payload: Vec<u8>) -> StoreFuture<u64> {
        let (reply, rx) = oneshot::channel();
        let submitted = self.submit(vec![Request::Publish {
            channel,
            payload,
            reply,
        }]);
        await_reply(submitted, rx)
    }
}

/// Commands held client-side until [`Batch::flush`]. Dropping an unflushed
/// batch cancels its commands.
#[derive(Debug)]
pub struct MemoryBatch {
    tx: mpsc::UnboundedSender<Command>,
    queued: Vec<Request>,
}

impl Batch for MemoryBatch {
    fn set_add(&mut self, key: String, member: Vec<u8>) -> StoreFuture<bool> {
        let (reply, rx) = oneshot::channel();
        self.queued.push(Request::SetAdd { key, member, reply });
        await_reply(Ok(()), rx)
    }

    fn len(&self) -> usize {
        self.queued.len()
    }

    fn flush(self) -> StoreFuture<()> {
        let submitted = if self.queued.is_empty() {
            Ok(())
        } else {
            self.tx
                .send(Command::Frame(self.queued))
                .map_err(|_| StoreError::ConnectionClosed)
        };
        Box::pin(async move { submitted })
    }
}

/// Receiving end of a channel subscription.
pub struct Subscription {
    channel: String,
    rx: broadcast::Receiver<Vec<u8>>,
}

impl Subscription {
    /// Next message, or `None` once the server dropped the channel. Messages
    /// lost to a full buffer are skipped with a warning.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "subscriber lagging, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next message if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.try_recv() {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "subscriber lagging, messages dropped");
                }
                Err(_) => return None,
            }
        }
    }
}
