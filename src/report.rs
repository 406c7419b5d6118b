//! Console output for the binaries.

use std::time::Duration;

use crate::stats::Summary;

fn duration_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

pub fn print_verbose(name: &str, s: &Summary, round_trips_per_run: Option<f64>) {
    eprintln!("====== {} ======", name);
    eprintln!(
        "  {} runs of {} operations",
        s.samples, s.operations
    );
    if let Some(rt) = round_trips_per_run {
        eprintln!("  {:.1} round trips per run", rt);
    }
    eprintln!("  throughput summary: {:.2} operations per second", s.ops_per_sec);
    eprintln!("  run time summary (msec):");
    eprintln!("         mean    stddev       min       p50       p95       max");
    eprintln!(
        "     {:>8.3}  {:>8.3}  {:>8.3}  {:>8.3}  {:>8.3}  {:>8.3}",
        duration_ms(s.mean),
        duration_ms(s.stddev),
        duration_ms(s.min),
        duration_ms(s.p50),
        duration_ms(s.p95),
        duration_ms(s.max),
    );
    eprintln!();
}

pub fn print_quiet(name: &str, s: &Summary) {
    eprintln!(
        "{}: mean={} stddev={} ({:.2} ops/sec)",
        name,
        format_ns(s.mean.as_nanos() as u64),
        format_ns(s.stddev.as_nanos() as u64),
        s.ops_per_sec,
    );
}

pub fn print_csv_header() {
    println!("\"pattern\",\"runs\",\"ops_per_run\",\"mean_ms\",\"stddev_ms\",\"min_ms\",\"p50_ms\",\"p95_ms\",\"max_ms\",\"ops_per_sec\"");
}

pub fn print_csv_row(name: &str, s: &Summary) {
    println!("{}", csv_row(name, s));
}

pub fn csv_row(name: &str, s: &Summary) -> String {
    format!(
        "\"{}\",{},{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.2}",
        name,
        s.samples,
        s.operations,
        duration_ms(s.mean),
        duration_ms(s.stddev),
        duration_ms(s.min),
        duration_ms(s.p50),
        duration_ms(s.p95),
        duration_ms(s.max),
        s.ops_per_sec,
    )
}

pub fn format_ns(ns: u64) -> String {
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.2} us", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.2} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.2} s", ns as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ns_units() {
        assert_eq!(format_ns(999), "999 ns");
        assert_eq!(format_ns(1_500), "1.50 us");
        assert_eq!(format_ns(21_410_000), "21.41 ms");
        assert_eq!(format_ns(2_000_000_000), "2.00 s");
    }

    #[test]
    fn csv_row_layout() {
        let s = Summary::from_samples(&[Duration::from_millis(2)], 10).unwrap();
        assert_eq!(
            csv_row("batched", &s),
            "\"batched\",1,10,2.000,0.000,2.000,2.000,2.000,2.000,5000.00"
        );
    }
}
