//! Vertexload: a multi-client read-throughput harness for graph stores.
//!
//! The harness measures how many single-vertex property reads per second a
//! store sustains when many clients hit it at the same instant. See
//! [`harness::Benchmark`] for the entry point.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod store;

pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use harness::{Benchmark, BenchmarkResult, RunOutcome, RunReport};
