//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use signal_benchmarks::store::{MemoryConnection, MemoryServer, ServerOptions};
use signal_benchmarks::{Batch, SignalRecord, Store, StoreError, StoreFuture};

// =============================================================================
// In-memory server
// =============================================================================

pub fn server() -> MemoryServer {
    MemoryServer::new(ServerOptions::default())
}

pub async fn connected() -> (MemoryServer, MemoryConnection) {
    let server = server();
    let connection = server
        .connect(server.address())
        .await
        .expect("failed to connect");
    (server, connection)
}

// =============================================================================
// Records
// =============================================================================

pub fn scalar(device: &str, object: &str, timestamp: i64, value: &str) -> SignalRecord {
    SignalRecord::new(device, object, timestamp, Some(value))
}

pub fn wire(record: &SignalRecord) -> Vec<u8> {
    record.to_wire().expect("record serializes")
}

// =============================================================================
// Failing store double
// =============================================================================

/// Accepts every command except the one with index `fail_at` (counted across
/// set insertions and publishes), which is rejected.
#[derive(Clone)]
pub struct FailingStore {
    fail_at: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply<T: Send + 'static>(&self, ok: T, what: String) -> StoreFuture<T> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = call == self.fail_at;
        Box::pin(async move {
            if fail {
                Err(StoreError::Rejected(what))
            } else {
                Ok(ok)
            }
        })
    }
}

impl Store for FailingStore {
    type Batch = FailingBatch;

    fn set_add(&self, key: String, _member: Vec<u8>) -> StoreFuture<bool> {
        self.reply(true, format!("SADD {key}"))
    }

    fn batch(&self) -> FailingBatch {
        FailingBatch {
            store: self.clone(),
            queued: 0,
        }
    }

    fn publish(&self, channel: String, _payload: Vec<u8>) -> StoreFuture<u64> {
        self.reply(1, format!("PUBLISH {channel}"))
    }
}

pub struct FailingBatch {
    store: FailingStore,
    queued: usize,
}

impl Batch for FailingBatch {
    fn set_add(&mut self, key: String, member: Vec<u8>) -> StoreFuture<bool> {
        self.queued += 1;
        self.store.set_add(key, member)
    }

    fn len(&self) -> usize {
        self.queued
    }

    fn flush(self) -> StoreFuture<()> {
        Box::pin(async { Ok(()) })
    }
}
