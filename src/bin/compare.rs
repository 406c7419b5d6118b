//! Benchmark comparison tool.
//!
//! Compares two JSON result files written by `signal-bench --save` and prints
//! the change in mean run time per pattern.
//!
//! Usage: `cargo run --bin bench-compare -- <baseline.json> <candidate.json>`

use std::collections::HashMap;
use std::path::Path;

use signal_benchmarks::recorder::load_report;
use signal_benchmarks::report::format_ns;
use signal_benchmarks::schema::{BenchmarkMetrics, BenchmarkReport, BenchmarkResult};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <baseline.json> <candidate.json>", args[0]);
        std::process::exit(1);
    }

    let baseline = load(&args[1]);
    let candidate = load(&args[2]);

    let base_map: HashMap<&str, &BenchmarkResult> = baseline
        .results
        .iter()
        .map(|r| (r.benchmark.as_str(), r))
        .collect();

    eprintln!("Baseline: {} ({})", args[1], baseline.metadata.timestamp);
    eprintln!("Candidate: {} ({})", args[2], candidate.metadata.timestamp);
    eprintln!();

    println!(
        "{:<32} | {:>12} | {:>12} | {:>12}",
        "Benchmark", "Base mean", "New mean", "Delta"
    );
    println!("{}", "-".repeat(76));

    let mut matched = 0u32;
    let mut only_cand = 0u32;
    for cand in &candidate.results {
        match base_map.get(cand.benchmark.as_str()) {
            Some(base) => {
                matched += 1;
                print_comparison(&cand.benchmark, &base.metrics, &cand.metrics);
            }
            None => only_cand += 1,
        }
    }
    let only_base = baseline
        .results
        .iter()
        .filter(|b| !candidate.results.iter().any(|c| c.benchmark == b.benchmark))
        .count();

    println!("{}", "-".repeat(76));
    println!(
        "Compared: {} | Baseline only: {} | Candidate only: {}",
        matched, only_base, only_cand
    );
}

fn load(path: &str) -> BenchmarkReport {
    load_report(Path::new(path)).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        std::process::exit(1);
    })
}

// every saved result carries `mean_ns`; results without one are skipped
fn print_comparison(name: &str, base: &BenchmarkMetrics, cand: &BenchmarkMetrics) {
    if let (Some(base_mean), Some(cand_mean)) = (base.mean_ns, cand.mean_ns) {
        let delta_pct = percent_change(base_mean as f64, cand_mean as f64);
        println!(
            "{:<32} | {:>12} | {:>12} | {:>+.1}% ({})",
            name,
            format_ns(base_mean),
            format_ns(cand_mean),
            delta_pct,
            hint(delta_pct),
        );
    }
}

/// Lower run time is better.
fn hint(delta_pct: f64) -> &'static str {
    if delta_pct < -1.0 {
        "faster"
    } else if delta_pct > 1.0 {
        "slower"
    } else {
        "~same"
    }
}

fn percent_change(base: f64, cand: f64) -> f64 {
    if base > 0.0 {
        (cand - base) / base * 100.0
    } else {
        0.0
    }
}
