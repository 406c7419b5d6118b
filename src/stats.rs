//! Summary statistics over per-run wall times.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub samples: usize,
    /// Store operations per run.
    pub operations: usize,
    pub mean: Duration,
    pub stddev: Duration,
    pub min: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub max: Duration,
    /// Operations per second over the summed wall time.
    pub ops_per_sec: f64,
}

impl Summary {
    /// Returns `None` for an empty sample set.
    pub fn from_samples(samples: &[Duration], operations: usize) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let len = sorted.len();
        let total: Duration = sorted.iter().sum();
        let mean_ns = total.as_nanos() as f64 / len as f64;
        let variance = sorted
            .iter()
            .map(|d| {
                let diff = d.as_nanos() as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;

        let total_secs = total.as_secs_f64();
        Some(Summary {
            samples: len,
            operations,
            mean: Duration::from_nanos(mean_ns as u64),
            stddev: Duration::from_nanos(variance.sqrt() as u64),
            min: sorted[0],
            p50: sorted[len * 50 / 100],
            p95: sorted[(len * 95 / 100).min(len - 1)],
            max: sorted[len - 1],
            ops_per_sec: if total_secs > 0.0 {
                (operations * len) as f64 / total_secs
            } else {
                0.0
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn empty_samples_have_no_summary() {
        assert!(Summary::from_samples(&[], 10).is_none());
    }

    #[test]
    fn summary_of_known_samples() {
        let s = Summary::from_samples(&[ms(4), ms(2), ms(6), ms(8)], 10).unwrap();
        assert_eq!(s.samples, 4);
        assert_eq!(s.mean, ms(5));
        assert_eq!(s.min, ms(2));
        assert_eq!(s.max, ms(8));
        assert_eq!(s.p50, ms(6));
        // population stddev of 2,4,6,8 is sqrt(5) ms
        let expected = (5.0f64).sqrt() * 1_000_000.0;
        assert!((s.stddev.as_nanos() as f64 - expected).abs() < 1.0);
        // 40 operations in 20 ms
        assert!((s.ops_per_sec - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn single_sample() {
        let s = Summary::from_samples(&[ms(3)], 1).unwrap();
        assert_eq!(s.p50, ms(3));
        assert_eq!(s.p95, ms(3));
        assert_eq!(s.stddev, Duration::ZERO);
    }
}
