//! Store capabilities the driver depends on.
//!
//! Every command returns a boxed `'static` future so completions can be
//! collected and joined after the command was submitted. Submission happens
//! when the method is called; awaiting only waits for the reply.

pub mod memory;

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

pub use memory::{MemoryConnection, MemoryServer, ServerOptions, Subscription};

pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'static>>;

/// A shared, multiplexed connection to a set + pub/sub store.
///
/// Clones share the underlying connection.
pub trait Store: Clone + Send + Sync + 'static {
    type Batch: Batch;

    /// Add `member` to the set at `key`. Resolves to `true` if the member was
    /// not already present.
    fn set_add(&self, key: String, member: Vec<u8>) -> StoreFuture<bool>;

    /// Open a batch. Commands queued on it are held back until
    /// [`Batch::flush`].
    fn batch(&self) -> Self::Batch;

    /// Publish `payload` on `channel`. Resolves to the number of subscribers
    /// the message was delivered to.
    fn publish(&self, channel: String, payload: Vec<u8>) -> StoreFuture<u64>;
}

/// Commands queued for a single round trip.
pub trait Batch: Send {
    /// Queue a set insertion. The returned future resolves only after the
    /// batch has been flushed and the store has replied.
    fn set_add(&mut self, key: String, member: Vec<u8>) -> StoreFuture<bool>;

    /// Number of queued commands.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send every queued command as one frame.
    fn flush(self) -> StoreFuture<()>;
}
