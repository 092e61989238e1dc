#![forbid(unsafe_code)]

//! Concurrent read-throughput driver.
//!
//! A run seeds randomized vertex properties, precomputes one read batch per
//! client, releases every client worker at once through a [`Barrier`], and
//! divides the total request count by the single outer wall-clock interval.

mod aggregate;
mod barrier;
mod runner;
mod seeder;
mod worker;
mod workload;

/// Aggregate throughput and report rendering.
pub use aggregate::{throughput, BenchmarkResult};

/// Start/finish rendezvous shared by the orchestrator and its workers.
pub use barrier::{Barrier, BarrierState};

/// Run orchestration.
///
/// Connects clients, seeds, generates workloads and measures the timed phase.
pub use runner::{Benchmark, RunOutcome, RunReport};

/// Transactional property seeding of the vertex domain prefix.
pub use seeder::{
    write_nodes, DataSeeder, SeedOutcome, SeedReport, COLOR_PROPERTY, COLOR_THRESHOLD,
    TYPE_PROPERTY, TYPE_THRESHOLD,
};

/// Per-client worker threads.
pub use worker::{ClientHandle, ClientWorker, WorkerFailure, WorkerOutcome, WorkerReport};

/// Uniform per-client read sequences.
pub use workload::{RequestBatch, WorkloadGenerator};
