//! Saved benchmark result format.
//!
//! `signal-bench --save <dir>` writes one [`BenchmarkReport`] per invocation;
//! `bench-compare` reads two of them back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::stats::Summary;

pub const SCHEMA_VERSION: u32 = 1;

/// Top-level benchmark report written to a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    pub metadata: RunMetadata,
    pub results: Vec<BenchmarkResult>,
}

/// Metadata captured at the start of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// ISO 8601 timestamp of the run start.
    pub timestamp: String,
    /// Short git commit hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Crate version that produced the report.
    pub version: String,
    pub hardware: HardwareInfo,
}

/// Hardware information for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: String,
    /// Number of logical cores.
    pub cores: usize,
    pub ram_gb: u64,
    pub os: String,
    pub arch: String,
}

/// A single benchmark measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Benchmark name (e.g. "signals/batched").
    pub benchmark: String,
    pub category: String,
    /// Run parameters such as record count and simulated latency.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    pub metrics: BenchmarkMetrics,
}

/// Metrics of one pattern. Durations are per run, not per operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_per_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations_per_run: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_trips_per_run: Option<f64>,
}

impl From<&Summary> for BenchmarkMetrics {
    fn from(s: &Summary) -> Self {
        BenchmarkMetrics {
            mean_ns: Some(s.mean.as_nanos() as u64),
            stddev_ns: Some(s.stddev.as_nanos() as u64),
            min_ns: Some(s.min.as_nanos() as u64),
            p50_ns: Some(s.p50.as_nanos() as u64),
            p95_ns: Some(s.p95.as_nanos() as u64),
            max_ns: Some(s.max.as_nanos() as u64),
            ops_per_sec: Some(s.ops_per_sec),
            samples: Some(s.samples as u64),
            operations_per_run: Some(s.operations as u64),
            round_trips_per_run: None,
        }
    }
}
