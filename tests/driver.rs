//! Access-pattern driver against the in-memory store and a failing double.

mod common;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use common::{connected, wire, FailingStore};
use signal_benchmarks::fixtures::{benchmark_signals, signals};
use signal_benchmarks::store::{MemoryServer, ServerOptions};
use signal_benchmarks::{
    AccessPattern, AccessPatternDriver, BenchError, SignalRecord, Store, StoreError,
};

fn expected_contents(records: &[SignalRecord]) -> BTreeMap<String, BTreeSet<Vec<u8>>> {
    records
        .iter()
        .map(|r| (r.identity().to_string(), BTreeSet::from([wire(r)])))
        .collect()
}

// =============================================================================
// Batched write
// =============================================================================

#[tokio::test]
async fn batched_write_of_ten_records_creates_ten_single_member_sets() {
    let (server, connection) = connected().await;
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(connection, &records);

    let run = driver.run(AccessPattern::Batched).await.unwrap();
    assert_eq!(run.operations, 10);
    assert_eq!(run.acknowledged, 10);

    assert_eq!(server.key_count(), 10);
    for record in &records {
        let members = server.members(&record.identity().to_string()).unwrap();
        assert_eq!(members, BTreeSet::from([wire(record)]));
    }
}

#[tokio::test]
async fn batched_write_costs_one_round_trip() {
    let (server, connection) = connected().await;
    let records = signals(50);
    let driver = AccessPatternDriver::new(connection, &records);

    driver.batched_write().await.unwrap();
    assert_eq!(server.round_trips(), 1);
}

#[tokio::test]
async fn repeated_writes_are_idempotent() {
    let (server, connection) = connected().await;
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(connection, &records);

    assert_eq!(driver.batched_write().await.unwrap(), 10);
    assert_eq!(driver.batched_write().await.unwrap(), 0);
    assert_eq!(driver.sequential_write().await.unwrap(), 0);
    assert_eq!(server.snapshot(), expected_contents(&records));
}

// =============================================================================
// Sequential write
// =============================================================================

#[tokio::test]
async fn sequential_write_costs_one_round_trip_per_record() {
    let (server, connection) = connected().await;
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(connection, &records);

    let run = driver.run(AccessPattern::Sequential).await.unwrap();
    assert_eq!(run.acknowledged, 10);
    assert_eq!(server.round_trips(), 10);
}

#[tokio::test]
async fn batched_and_sequential_store_the_same_pairs() {
    let records = signals(25);

    let (batched_server, batched) = connected().await;
    AccessPatternDriver::new(batched, &records)
        .batched_write()
        .await
        .unwrap();

    let (sequential_server, sequential) = connected().await;
    AccessPatternDriver::new(sequential, &records)
        .sequential_write()
        .await
        .unwrap();

    assert_eq!(batched_server.snapshot(), sequential_server.snapshot());
    assert_eq!(batched_server.snapshot(), expected_contents(&records));
}

// =============================================================================
// Publish
// =============================================================================

#[tokio::test]
async fn publish_delivers_every_payload_to_subscribers() {
    let (server, connection) = connected().await;
    let mut first = server.subscribe("benchmarkChannel");
    let mut second = server.subscribe("benchmarkChannel");
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(connection, &records);

    let run = driver.run(AccessPattern::Publish).await.unwrap();
    assert_eq!(run.acknowledged, 20);

    let expected: HashSet<Vec<u8>> = records.iter().map(wire).collect();
    for subscription in [&mut first, &mut second] {
        let mut received = HashSet::new();
        for _ in 0..records.len() {
            received.insert(subscription.recv().await.unwrap());
        }
        assert_eq!(received, expected);
        assert!(subscription.try_recv().is_none());
    }

    // publishing never writes sets
    assert_eq!(server.key_count(), 0);
    assert!(server.round_trips() >= 1 && server.round_trips() <= 10);
}

#[tokio::test]
async fn publish_without_subscribers_succeeds() {
    let (_server, connection) = connected().await;
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(connection, &records);

    assert_eq!(driver.publish().await.unwrap(), 0);
}

#[tokio::test]
async fn publish_uses_configured_channel() {
    let (server, connection) = connected().await;
    let mut other = server.subscribe("benchmarkChannel");
    let mut alerts = server.subscribe("alerts");
    let records = signals(3);
    let driver = AccessPatternDriver::new(connection, &records).with_channel("alerts");
    assert_eq!(driver.channel(), "alerts");

    assert_eq!(driver.publish().await.unwrap(), 3);
    assert!(alerts.recv().await.is_some());
    assert!(other.try_recv().is_none());
}

#[tokio::test]
async fn empty_record_set_is_a_no_op() {
    let (server, connection) = connected().await;
    let driver = AccessPatternDriver::new(connection, &[]);

    for pattern in AccessPattern::ALL {
        let run = driver.run(pattern).await.unwrap();
        assert_eq!(run.operations, 0);
        assert_eq!(run.acknowledged, 0);
    }
    assert_eq!(server.round_trips(), 0);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn sequential_write_stops_at_first_failure() {
    let store = FailingStore::new(3);
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(store.clone(), &records);

    let err = driver.run(AccessPattern::Sequential).await.unwrap_err();
    assert!(matches!(err, BenchError::Store(StoreError::Rejected(_))));
    assert_eq!(store.calls(), 4);
}

#[tokio::test]
async fn batched_write_failure_fails_the_run() {
    let store = FailingStore::new(7);
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(store, &records);

    let err = driver.run(AccessPattern::Batched).await.unwrap_err();
    assert!(matches!(err, BenchError::Store(StoreError::Rejected(_))));
}

#[tokio::test]
async fn publish_failure_fails_the_run() {
    let store = FailingStore::new(0);
    let records = benchmark_signals();
    let driver = AccessPatternDriver::new(store, &records);

    let err = driver.run(AccessPattern::Publish).await.unwrap_err();
    assert!(matches!(err, BenchError::Store(StoreError::Rejected(_))));
}

#[tokio::test]
async fn commands_after_close_fail() {
    let (_server, connection) = connected().await;
    let handle = connection.clone();
    connection.close().await.unwrap();

    let err = handle.set_add("k".into(), b"m".to_vec()).await.unwrap_err();
    assert!(matches!(err, StoreError::ConnectionClosed));

    let records = benchmark_signals();
    let err = AccessPatternDriver::new(handle, &records)
        .run(AccessPattern::Batched)
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::Store(StoreError::ConnectionClosed)));
}

#[tokio::test]
async fn shut_down_server_rejects_commands_and_connections() {
    let (server, connection) = connected().await;
    server.shutdown();

    let records = benchmark_signals();
    let err = AccessPatternDriver::new(connection, &records)
        .run(AccessPattern::Sequential)
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::Store(StoreError::Rejected(_))));

    let err = server.connect(server.address()).await.unwrap_err();
    assert!(matches!(err, StoreError::Connect { .. }));
}

#[tokio::test]
async fn connecting_to_unknown_address_fails() {
    let server = MemoryServer::new(ServerOptions {
        address: "memory://bench".into(),
        ..ServerOptions::default()
    });
    let err = server.connect("memory://elsewhere").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Connect { ref address, .. } if address == "memory://elsewhere"
    ));
}

#[tokio::test]
async fn dropped_batch_cancels_its_commands() {
    use signal_benchmarks::Batch;

    let (server, connection) = connected().await;
    let mut batch = connection.batch();
    let pending = batch.set_add("k".into(), b"m".to_vec());
    assert_eq!(batch.len(), 1);
    drop(batch);

    assert!(matches!(pending.await, Err(StoreError::Cancelled)));
    assert_eq!(server.key_count(), 0);
}
