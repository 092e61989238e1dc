//! Error type shared by the harness, the store surface and the binary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::VertexId;

/// Result type alias used throughout the harness.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors surfaced by the benchmark harness.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A store operation failed (connection or remote error).
    #[error("store {op} failed: {message}")]
    Store {
        /// Name of the store operation that failed.
        op: &'static str,
        /// Error reported by the store.
        message: String,
    },
    /// A transactional write failed while seeding; the run is aborted.
    #[error("seeding failed at vertex {vertex}: {source}")]
    Seed {
        /// Vertex being written when the failure occurred.
        vertex: VertexId,
        /// Underlying store failure.
        #[source]
        source: Box<BenchError>,
    },
    /// A read failed inside a client worker during the timed phase.
    #[error("client {client} read #{request} failed: {source}")]
    Read {
        /// Index of the client whose read failed.
        client: usize,
        /// Zero-based position of the request within the client's batch.
        request: usize,
        /// Underlying store failure.
        #[source]
        source: Box<BenchError>,
    },
    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A configuration file could not be read or parsed.
    #[error("config file {path}: {message}")]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// Parse or read error message.
        message: String,
    },
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A worker thread panicked before reporting.
    #[error("client {client} worker panicked")]
    WorkerPanicked {
        /// Index of the client whose thread panicked.
        client: usize,
    },
    /// The run was torn down before the worker was released.
    #[error("client {client} abandoned before start")]
    Abandoned {
        /// Index of the client that never started.
        client: usize,
    },
    /// The tracing subscriber could not be installed.
    #[error("logging: {0}")]
    Logging(String),
}

impl BenchError {
    /// Builds a [`BenchError::Store`] for the named operation.
    pub fn store(op: &'static str, message: impl Into<String>) -> Self {
        BenchError::Store {
            op,
            message: message.into(),
        }
    }
}
