//! Signal write-path benchmark.
//!
//! Pushes the ten fixture signals through an in-process store using each
//! access pattern and prints per-run timings. The simulated round-trip
//! latency is what separates the patterns; set it to zero to measure the
//! harness overhead alone.
//!
//! Run:   `cargo run --release --bin signal-bench`
//! Quick: `cargo run --release --bin signal-bench -- -n 20 -t batched,publish -q`
//! CSV:   `cargo run --release --bin signal-bench -- --csv`
//! Save:  `cargo run --release --bin signal-bench -- --save results`

use std::collections::HashMap;
use std::time::Duration;

use signal_benchmarks::config::{RunConfig, LOG_ENV};
use signal_benchmarks::fixtures::benchmark_signals;
use signal_benchmarks::recorder::ResultRecorder;
use signal_benchmarks::report::{print_csv_header, print_csv_row, print_quiet, print_verbose};
use signal_benchmarks::stats::Summary;
use signal_benchmarks::store::{MemoryConnection, MemoryServer, ServerOptions, Subscription};
use signal_benchmarks::{AccessPattern, AccessPatternDriver, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match RunConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: RunConfig) -> Result<()> {
    let server = MemoryServer::new(ServerOptions {
        address: config.address.clone(),
        round_trip_latency: config.latency,
        ..ServerOptions::default()
    });
    // a subscriber on the channel so publishes are actually delivered
    let mut subscription = server.subscribe(&config.channel);

    let connection = server.connect(&config.address).await?;
    let signals = benchmark_signals();
    let driver = AccessPatternDriver::new(connection.clone(), &signals)
        .with_channel(config.channel.clone());

    if config.csv {
        print_csv_header();
    } else {
        eprintln!("=== Signal Write-Path Benchmark ===");
        eprintln!(
            "Parameters: {} records, {} runs ({} warm-up), {} us simulated round trip",
            signals.len(),
            config.iterations,
            config.warmup,
            config.latency.as_micros()
        );
        eprintln!();
    }

    let mut recorder = config.save_dir.as_ref().map(|_| ResultRecorder::new("signals"));
    let outcome = measure_all(
        &config,
        &server,
        &driver,
        &mut subscription,
        recorder.as_mut(),
    )
    .await;

    // released on every path, including a failed measurement
    connection.close().await?;
    outcome?;

    if let (Some(recorder), Some(dir)) = (recorder, config.save_dir.as_ref()) {
        let path = recorder.save(dir)?;
        if !config.csv {
            eprintln!("Results saved to {}", path.display());
        }
    }
    if !config.csv {
        eprintln!("=== Benchmark complete ===");
    }
    Ok(())
}

async fn measure_all(
    config: &RunConfig,
    server: &MemoryServer,
    driver: &AccessPatternDriver<'_, MemoryConnection>,
    subscription: &mut Subscription,
    mut recorder: Option<&mut ResultRecorder>,
) -> Result<()> {
    for &pattern in &config.patterns {
        for _ in 0..config.warmup {
            driver.run(pattern).await?;
            drain(subscription);
        }

        let round_trips_before = server.round_trips();
        let mut samples = Vec::with_capacity(config.iterations);
        for _ in 0..config.iterations {
            // writes are idempotent; start each run from an empty store so
            // every run inserts the same members
            server.flush_all();
            let run = driver.run(pattern).await?;
            samples.push(run.elapsed);
            drain(subscription);
        }
        let round_trips =
            (server.round_trips() - round_trips_before) as f64 / config.iterations as f64;

        let Some(summary) = Summary::from_samples(&samples, driver.records().len()) else {
            continue;
        };
        let name = format!("signals/{}", pattern.label());
        info!(benchmark = %name, mean_us = summary.mean.as_micros() as u64, "measured");

        if config.csv {
            print_csv_row(&name, &summary);
        } else if config.quiet {
            print_quiet(&name, &summary);
        } else {
            print_verbose(&name, &summary, Some(round_trips));
        }

        if let Some(recorder) = recorder.as_deref_mut() {
            recorder.record_summary(
                &name,
                parameters(config, pattern, driver.records().len()),
                &summary,
                Some(round_trips),
            );
        }
    }
    Ok(())
}

fn drain(subscription: &mut Subscription) {
    while subscription.try_recv().is_some() {}
}

fn parameters(
    config: &RunConfig,
    pattern: AccessPattern,
    records: usize,
) -> HashMap<String, serde_json::Value> {
    let mut params = HashMap::new();
    params.insert("pattern".into(), serde_json::json!(pattern.label()));
    params.insert("records".into(), serde_json::json!(records));
    params.insert(
        "latency_us".into(),
        serde_json::json!(duration_us(config.latency)),
    );
    params
}

fn duration_us(d: Duration) -> u64 {
    d.as_micros() as u64
}
