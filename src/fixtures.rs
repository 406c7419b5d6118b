//! Fixed record set the benchmarks run over.

use crate::signal::SignalRecord;

const BASE_TIMESTAMP: i64 = 1_621_123_456;

/// Ten scalar signals, `Device1/Object1/Value1` through
/// `Device10/Object10/Value10`, one millisecond apart.
pub fn benchmark_signals() -> Vec<SignalRecord> {
    signals(10)
}

/// `count` distinct scalar signals following the same naming scheme.
pub fn signals(count: usize) -> Vec<SignalRecord> {
    (1..=count)
        .map(|n| {
            SignalRecord::new(
                format!("Device{n}"),
                format!("Object{n}"),
                BASE_TIMESTAMP + n as i64 - 1,
                Some(&format!("Value{n}")),
            )
        })
        .collect()
}
