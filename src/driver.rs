//! The three write shapes being measured.
//!
//! - **batched**: queue one set insertion per record, flush once, then join
//!   every completion.
//! - **sequential**: one set insertion per record, each awaited before the
//!   next is issued.
//! - **publish**: one publish per record on a fixed channel, all submitted
//!   before any is awaited, then joined.
//!
//! Set keys are the record identity in text form; members and published
//! payloads are the record's wire form. Any failure aborts the run.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{ConfigError, Result, StoreError};
use crate::signal::SignalRecord;
use crate::store::{Batch, Store, StoreFuture};

pub const DEFAULT_CHANNEL: &str = "benchmarkChannel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPattern {
    Batched,
    Sequential,
    Publish,
}

impl AccessPattern {
    pub const ALL: [AccessPattern; 3] = [
        AccessPattern::Batched,
        AccessPattern::Sequential,
        AccessPattern::Publish,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Batched => "batched",
            Self::Sequential => "sequential",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccessPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Self::Batched),
            "sequential" | "seq" => Ok(Self::Sequential),
            "publish" | "pubsub" => Ok(Self::Publish),
            _ => Err(ConfigError::UnknownPattern(s.to_string())),
        }
    }
}

/// Outcome of one pattern run.
#[derive(Debug, Clone)]
pub struct PatternRun {
    pub pattern: AccessPattern,
    /// Store commands issued.
    pub operations: usize,
    /// For writes, members that were not already present. For publishes,
    /// total subscriber deliveries.
    pub acknowledged: u64,
    pub elapsed: Duration,
}

/// Runs the access patterns over a fixed set of records against one store
/// handle.
pub struct AccessPatternDriver<'a, S> {
    store: S,
    records: &'a [SignalRecord],
    channel: String,
}

impl<'a, S: Store> AccessPatternDriver<'a, S> {
    pub fn new(store: S, records: &'a [SignalRecord]) -> Self {
        Self {
            store,
            records,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn records(&self) -> &[SignalRecord] {
        self.records
    }

    /// Run `pattern` once and time it.
    pub async fn run(&self, pattern: AccessPattern) -> Result<PatternRun> {
        let start = Instant::now();
        let acknowledged = match pattern {
            AccessPattern::Batched => self.batched_write().await?,
            AccessPattern::Sequential => self.sequential_write().await?,
            AccessPattern::Publish => self.publish().await?,
        };
        let elapsed = start.elapsed();

        debug!(
            pattern = pattern.label(),
            operations = self.records.len(),
            acknowledged,
            elapsed_us = elapsed.as_micros() as u64,
            "run complete"
        );
        Ok(PatternRun {
            pattern,
            operations: self.records.len(),
            acknowledged,
            elapsed,
        })
    }

    /// Returns the number of newly inserted members.
    pub async fn batched_write(&self) -> Result<u64> {
        let mut batch = self.store.batch();
        let mut completions = Vec::with_capacity(self.records.len());
        for record in self.records {
            completions.push(batch.set_add(record.identity().to_string(), record.to_wire()?));
        }
        batch.flush().await?;

        let added = join_all(completions).await?;
        Ok(added.into_iter().filter(|&new| new).count() as u64)
    }

    /// Returns the number of newly inserted members.
    pub async fn sequential_write(&self) -> Result<u64> {
        let mut added = 0;
        for record in self.records {
            let key = record.identity().to_string();
            if self.store.set_add(key, record.to_wire()?).await? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Returns the total number of subscriber deliveries.
    pub async fn publish(&self) -> Result<u64> {
        let mut publications = Vec::with_capacity(self.records.len());
        for record in self.records {
            publications.push(self.store.publish(self.channel.clone(), record.to_wire()?));
        }

        let delivered = join_all(publications).await?;
        Ok(delivered.into_iter().sum())
    }
}

/// Wait for every submitted command. Completion order is unspecified; the
/// first failure is returned and the remaining waits are aborted.
async fn join_all<T: Send + 'static>(completions: Vec<StoreFuture<T>>) -> Result<Vec<T>> {
    let mut set = JoinSet::new();
    for completion in completions {
        set.spawn(completion);
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        let value: std::result::Result<T, StoreError> = joined?;
        results.push(value?);
    }
    Ok(results)
}
