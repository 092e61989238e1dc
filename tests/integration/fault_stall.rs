use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use vertexload::harness::{Benchmark, RunOutcome};
use vertexload::store::{FaultPlan, LoopbackOptions, LoopbackStore};
use vertexload::{BenchConfig, BenchError};

fn faulty_store() -> LoopbackStore {
    LoopbackStore::new(LoopbackOptions {
        fault: FaultPlan::FailReads {
            client_id: 1,
            after: 3,
        },
        ..LoopbackOptions::default()
    })
}

fn config() -> BenchConfig {
    BenchConfig {
        num_clients: 2,
        num_requests: 10,
        num_nodes: 100,
        tx_sz: 10,
        seed: Some(1),
        ..BenchConfig::default()
    }
}

#[test]
fn unbounded_finish_wait_never_returns() {
    let store = faulty_store();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = Benchmark::new(config()).and_then(|bench| bench.run(&store.connector()));
        let _ = tx.send(outcome.map(|report| report.outcome.result().is_some()));
    });

    // The orchestrator stays parked in its completion wait, so no throughput
    // ever comes back.
    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(500)),
        Err(mpsc::RecvTimeoutError::Timeout)
    ));
}

#[test]
fn bounded_finish_wait_surfaces_the_failure() {
    let store = faulty_store();
    let config = BenchConfig {
        finish_timeout_ms: Some(300),
        ..config()
    };
    let report = Benchmark::new(config)
        .and_then(|bench| bench.run(&store.connector()))
        .unwrap();

    match report.outcome {
        RunOutcome::Incomplete {
            finished,
            expected,
            failures,
        } => {
            assert_eq!((finished, expected), (1, 2));
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                failures[0].error,
                BenchError::Read {
                    client: 1,
                    request: 3,
                    ..
                }
            ));
        }
        RunOutcome::Complete(result) => {
            panic!("unexpected throughput {}", result.throughput)
        }
    }
}
