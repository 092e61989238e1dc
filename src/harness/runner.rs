use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use super::aggregate::BenchmarkResult;
use super::barrier::Barrier;
use super::seeder::{DataSeeder, SeedReport};
use super::worker::{ClientHandle, ClientWorker, WorkerFailure, WorkerOutcome, WorkerReport};
use super::workload::{RequestBatch, WorkloadGenerator};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::store::StoreConnector;

/// How the timed phase ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every worker signalled completion.
    Complete(BenchmarkResult),
    /// The bounded completion wait expired before every worker finished.
    Incomplete {
        /// Workers that signalled completion.
        finished: usize,
        /// Workers in the run.
        expected: usize,
        /// Workers known to have aborted.
        failures: Vec<WorkerFailure>,
    },
}

impl RunOutcome {
    /// The result, if the run completed.
    pub fn result(&self) -> Option<&BenchmarkResult> {
        match self {
            RunOutcome::Complete(result) => Some(result),
            RunOutcome::Incomplete { .. } => None,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Seeding summary.
    pub seed: SeedReport,
    /// Timed phase outcome.
    pub outcome: RunOutcome,
}

/// How long an incomplete run keeps listening for worker failures.
const FAILURE_GRACE: Duration = Duration::from_millis(50);

struct Spawned {
    client_index: usize,
    thread: JoinHandle<()>,
    results: Receiver<WorkerOutcome>,
}

/// Drives one benchmark run: connect, seed, generate, measure.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: BenchConfig,
}

impl Benchmark {
    /// Validates `config` and builds the driver.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration of this run.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs all phases against stores reached through `connector`.
    pub fn run(&self, connector: &dyn StoreConnector) -> Result<RunReport> {
        let config = &self.config;
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut clients = (0..config.num_clients)
            .map(|idx| ClientHandle::connect(connector, config.base_client_id, idx, config.num_vts))
            .collect::<Result<Vec<_>>>()?;
        info!(
            clients = clients.len(),
            partitions = config.num_vts,
            "bench.run.connected"
        );

        let seeder = DataSeeder::new(config.num_nodes, config.tx_sz)?;
        let seed = seeder.seed(clients[0].connection.as_mut(), &mut rng)?;

        let batches = WorkloadGenerator::new(config.num_nodes, config.num_requests)?
            .generate(config.num_clients, &mut rng);

        let outcome = self.measure(clients, batches)?;
        Ok(RunReport { seed, outcome })
    }

    /// Runs the timed phase over prepared clients and batches.
    ///
    /// `clients[i]` reads `batches[i]`. Throughput counts the reads the
    /// workers actually issued, whatever the batch lengths. Without a finish
    /// timeout this blocks forever if any worker aborts.
    pub fn measure(
        &self,
        clients: Vec<ClientHandle>,
        batches: Vec<RequestBatch>,
    ) -> Result<RunOutcome> {
        if clients.len() != batches.len() {
            return Err(BenchError::InvalidConfig(format!(
                "{} clients but {} request batches",
                clients.len(),
                batches.len()
            )));
        }
        let num_clients = clients.len();
        let barrier = Arc::new(Barrier::new(num_clients));

        let mut spawned = Vec::with_capacity(num_clients);
        for (handle, batch) in clients.into_iter().zip(batches) {
            let client_index = handle.client_index;
            let (tx, results) = mpsc::channel();
            let worker = ClientWorker::new(
                handle,
                batch,
                Arc::clone(&barrier),
                self.config.progress_interval,
            );
            let thread = match worker.spawn(tx) {
                Ok(thread) => thread,
                Err(err) => {
                    abandon_spawned(&barrier, spawned);
                    return Err(err.into());
                }
            };
            spawned.push(Spawned {
                client_index,
                thread,
                results,
            });
        }

        barrier.wait_for_arrivals();
        info!(clients = num_clients, "bench.run.release");
        let start = Instant::now();
        barrier.release_start();
        let all_finished = match self.config.finish_timeout() {
            Some(timeout) => barrier.wait_for_finish_timeout(timeout),
            None => {
                barrier.wait_for_finish();
                true
            }
        };
        let outer_elapsed = start.elapsed();

        if !all_finished {
            let failures = collect_failures(&spawned);
            let finished = barrier.snapshot().finished;
            warn!(
                finished,
                expected = num_clients,
                failed = failures.len(),
                "bench.run.incomplete"
            );
            return Ok(RunOutcome::Incomplete {
                finished,
                expected: num_clients,
                failures,
            });
        }

        let mut reports: Vec<WorkerReport> = Vec::with_capacity(num_clients);
        for worker in spawned {
            let client = worker.client_index;
            worker
                .thread
                .join()
                .map_err(|_| BenchError::WorkerPanicked { client })?;
            let report = worker
                .results
                .recv()
                .map_err(|_| BenchError::WorkerPanicked { client })??;
            reports.push(report);
        }
        reports.sort_by_key(|report| report.client_index);

        let result = BenchmarkResult::from_total(
            reports.iter().map(|report| report.requests as u64).sum(),
            outer_elapsed,
            reports.iter().map(|report| report.elapsed).collect(),
        );
        info!(
            outer_elapsed_ms = outer_elapsed.as_millis() as u64,
            throughput = result.throughput,
            "bench.run.completed"
        );
        Ok(RunOutcome::Complete(result))
    }
}

/// Wakes workers parked at the start line and reaps their threads.
fn abandon_spawned(barrier: &Barrier, spawned: Vec<Spawned>) {
    barrier.abandon();
    let reaped = spawned.len();
    for worker in spawned {
        let _ = worker.thread.join();
    }
    warn!(reaped, "bench.run.abandoned");
}

/// Gathers failures posted by workers, waiting up to [`FAILURE_GRACE`] in
/// total for outcomes still in flight.
fn collect_failures(spawned: &[Spawned]) -> Vec<WorkerFailure> {
    let deadline = Instant::now() + FAILURE_GRACE;
    let mut failures = Vec::new();
    for worker in spawned {
        let wait = deadline.saturating_duration_since(Instant::now());
        match worker.results.recv_timeout(wait) {
            Ok(Err(error)) => failures.push(WorkerFailure {
                client_index: worker.client_index,
                error,
            }),
            Err(RecvTimeoutError::Disconnected) => failures.push(WorkerFailure {
                client_index: worker.client_index,
                error: BenchError::WorkerPanicked {
                    client: worker.client_index,
                },
            }),
            Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => {}
        }
    }
    failures
}
