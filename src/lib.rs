//! Write-path benchmarks for content-addressed signal records.
//!
//! A [`SignalRecord`] is keyed by its [`Identity`], an MD5 digest of the
//! record's semantic fields. The [`driver`] pushes a fixed set of records
//! through a [`Store`] in three shapes (batched, sequential, publish) and
//! times each one. [`store::memory`] provides an in-process store so the
//! harness runs without an external server.

pub mod config;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod identity;
pub mod recorder;
pub mod report;
pub mod schema;
pub mod signal;
pub mod stats;
pub mod store;

pub use driver::{AccessPattern, AccessPatternDriver, PatternRun};
pub use error::{BenchError, ConfigError, Result, SignalError, StoreError};
pub use identity::{identity_of, Identity};
pub use signal::{KeyValue, SignalBuilder, SignalContext, SignalRecord};
pub use store::{Batch, Store, StoreFuture};
