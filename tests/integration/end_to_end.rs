use std::time::Duration;

use vertexload::harness::{Benchmark, RunOutcome};
use vertexload::store::{LoopbackOptions, LoopbackStore};
use vertexload::{BenchConfig, Result};

fn two_client_config() -> BenchConfig {
    BenchConfig {
        num_clients: 2,
        num_requests: 10,
        num_nodes: 100,
        num_vts: 1,
        tx_sz: 10,
        seed: Some(2014),
        ..BenchConfig::default()
    }
}

#[test]
fn two_clients_ten_requests() -> Result<()> {
    let store = LoopbackStore::new(LoopbackOptions {
        read_latency: Duration::from_millis(2),
        ..LoopbackOptions::default()
    });
    let report = Benchmark::new(two_client_config())?.run(&store.connector())?;

    assert_eq!(report.seed.write_nodes, 100);
    assert_eq!(report.seed.transactions, 10);

    let result = match report.outcome {
        RunOutcome::Complete(result) => result,
        RunOutcome::Incomplete { .. } => panic!("run did not complete"),
    };
    assert_eq!(result.per_client_elapsed.len(), 2);
    assert!(result.per_client_elapsed.iter().all(|d| !d.is_zero()));

    // Overlapping workers: no faster than the slowest client, no slower than
    // running them back to back.
    assert!(result.outer_elapsed >= result.max_client_elapsed());
    assert!(result.outer_elapsed <= result.sum_client_elapsed());

    let expected = 20.0 / result.outer_elapsed.as_secs_f64();
    assert!((result.throughput - expected).abs() <= expected * 1e-9);
    assert_eq!(store.stats().reads, 20);
    Ok(())
}

#[test]
fn repeated_runs_are_independent() -> Result<()> {
    for _ in 0..5 {
        let store = LoopbackStore::default();
        let report = Benchmark::new(two_client_config())?.run(&store.connector())?;
        assert!(report.outcome.result().is_some());
        assert_eq!(store.stats().reads, 20);
    }
    Ok(())
}

#[test]
fn seeded_properties_are_readable_after_run() -> Result<()> {
    let store = LoopbackStore::default();
    let config = BenchConfig {
        num_nodes: 105,
        ..two_client_config()
    };
    let report = Benchmark::new(config)?.run(&store.connector())?;
    assert_eq!(report.seed.write_nodes, 100);

    let with_color = (0..100)
        .filter(|vertex| store.properties(*vertex).contains_key("color"))
        .count() as u64;
    assert_eq!(with_color, report.seed.color_only + report.seed.color_and_type);
    for vertex in 100..105 {
        assert!(store.properties(vertex).is_empty());
    }
    Ok(())
}

#[test]
fn many_partitions_and_clients() -> Result<()> {
    let store = LoopbackStore::default();
    let config = BenchConfig {
        num_clients: 16,
        num_vts: 4,
        num_requests: 250,
        num_nodes: 5000,
        tx_sz: 500,
        progress_interval: 100,
        seed: Some(7),
        ..BenchConfig::default()
    };
    let report = Benchmark::new(config)?.run(&store.connector())?;
    let result = report.outcome.result().expect("complete run");
    assert_eq!(result.total_requests, 4000);
    assert_eq!(store.stats().reads, 4000);
    assert_eq!(store.stats().max_open_tx, 1);
    Ok(())
}
