use std::fmt;
use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use super::barrier::Barrier;
use super::workload::RequestBatch;
use crate::error::{BenchError, Result};
use crate::store::{ReadNodePropsParams, StoreClient, StoreConnector};

/// A client slot and the connection it owns exclusively.
pub struct ClientHandle {
    /// Position of the client in the run, `0..num_clients`.
    pub client_index: usize,
    /// Partition the connection is routed to.
    pub partition_index: usize,
    /// Store connection; never shared across threads.
    pub connection: Box<dyn StoreClient>,
}

impl ClientHandle {
    /// Connects client `client_index` as `base_client_id + client_index`,
    /// routed round-robin over `num_vts` partitions.
    pub fn connect(
        connector: &dyn StoreConnector,
        base_client_id: u64,
        client_index: usize,
        num_vts: usize,
    ) -> Result<Self> {
        let partition_index = client_index % num_vts;
        let connection = connector.connect(base_client_id + client_index as u64, partition_index)?;
        Ok(Self {
            client_index,
            partition_index,
            connection,
        })
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("client_index", &self.client_index)
            .field("partition_index", &self.partition_index)
            .finish_non_exhaustive()
    }
}

/// Timing reported by a worker that completed its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Client that ran the batch.
    pub client_index: usize,
    /// Partition the client was routed to.
    pub partition_index: usize,
    /// Reads issued.
    pub requests: usize,
    /// Time from release to the last completed read.
    pub elapsed: Duration,
}

/// A worker that aborted before signalling completion.
#[derive(Debug)]
pub struct WorkerFailure {
    /// Client whose worker aborted.
    pub client_index: usize,
    /// Why it aborted.
    pub error: BenchError,
}

/// Message a worker leaves on its result channel when its thread exits.
pub type WorkerOutcome = Result<WorkerReport>;

/// Issues one client's read batch after the start line is released.
pub struct ClientWorker {
    handle: ClientHandle,
    batch: RequestBatch,
    barrier: Arc<Barrier>,
    progress_interval: usize,
}

impl ClientWorker {
    /// Pairs a client with its batch.
    pub fn new(
        handle: ClientHandle,
        batch: RequestBatch,
        barrier: Arc<Barrier>,
        progress_interval: usize,
    ) -> Self {
        Self {
            handle,
            batch,
            barrier,
            progress_interval: progress_interval.max(1),
        }
    }

    /// Waits for release, reads the batch sequentially, then signals completion.
    ///
    /// A failed read returns immediately without signalling completion, so a
    /// caller blocked in [`Barrier::wait_for_finish`] never wakes.
    pub fn run(mut self) -> Result<WorkerReport> {
        let client = self.handle.client_index;
        if !self.barrier.wait_for_start() {
            return Err(BenchError::Abandoned { client });
        }

        let start = Instant::now();
        let mut request = [(0, ReadNodePropsParams::default())];
        for (idx, vertex) in self.batch.vertices().iter().enumerate() {
            request[0].0 = *vertex;
            self.handle
                .connection
                .read_node_props(&request)
                .map_err(|source| BenchError::Read {
                    client,
                    request: idx,
                    source: Box::new(source),
                })?;
            let completed = idx + 1;
            if completed % self.progress_interval == 0 {
                info!(client, completed, "bench.worker.progress");
            }
        }
        let elapsed = start.elapsed();

        self.barrier.signal_finished();
        debug!(client, elapsed_us = elapsed.as_micros() as u64, "bench.worker.finished");
        Ok(WorkerReport {
            client_index: client,
            partition_index: self.handle.partition_index,
            requests: self.batch.len(),
            elapsed,
        })
    }

    /// Runs the worker on a dedicated thread named `client-<index>`.
    ///
    /// The outcome is sent on `results` before a failure is logged.
    pub fn spawn(self, results: Sender<WorkerOutcome>) -> io::Result<JoinHandle<()>> {
        let client = self.handle.client_index;
        thread::Builder::new()
            .name(format!("client-{client}"))
            .spawn(move || {
                let outcome = self.run();
                let failure = outcome.as_ref().err().map(ToString::to_string);
                let _ = results.send(outcome);
                if let Some(error) = failure {
                    error!(client, %error, "bench.worker.aborted");
                }
            })
    }
}
