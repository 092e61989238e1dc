//! In-process store used for dry runs and tests.
//!
//! Every connection shares one property map. Writes are staged per connection
//! and applied on commit. Reads can be slowed down or made to fail so the
//! harness's timing and failure paths can be exercised without a cluster.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use super::{
    NodeProps, PropertyAssignment, ReadNodePropsParams, StoreClient, StoreConnector, TxHandle,
    VertexId,
};
use crate::error::{BenchError, Result};

/// Failure injected into the loopback store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaultPlan {
    /// Every operation succeeds.
    #[default]
    None,
    /// Reads by `client_id` fail once it has completed `after` reads.
    FailReads {
        /// Client whose reads fail.
        client_id: u64,
        /// Successful reads before the first failure.
        after: u64,
    },
    /// The commit with zero-based sequence number `nth` fails.
    FailCommit {
        /// Sequence number of the failing commit.
        nth: u64,
    },
}

/// Behavior knobs for [`LoopbackStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackOptions {
    /// Simulated round-trip time of every read.
    pub read_latency: Duration,
    /// Injected failure.
    pub fault: FaultPlan,
}

/// Counters observed by the loopback store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Transactions committed.
    pub committed_tx: u64,
    /// Read round trips served.
    pub reads: u64,
    /// Highest number of simultaneously open transactions.
    pub max_open_tx: usize,
    /// Vertices carrying at least one property.
    pub vertices_with_props: usize,
}

#[derive(Default)]
struct Shared {
    props: RwLock<HashMap<VertexId, BTreeMap<String, String>>>,
    next_tx: AtomicU64,
    commits: AtomicU64,
    reads: AtomicU64,
    open_tx: AtomicUsize,
    max_open_tx: AtomicUsize,
}

/// Shared in-process store.
#[derive(Clone, Default)]
pub struct LoopbackStore {
    shared: Arc<Shared>,
    options: LoopbackOptions,
}

impl LoopbackStore {
    /// Creates an empty store.
    pub fn new(options: LoopbackOptions) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            options,
        }
    }

    /// Returns a snapshot of the store counters.
    pub fn stats(&self) -> LoopbackStats {
        LoopbackStats {
            committed_tx: self.shared.commits.load(Ordering::Acquire),
            reads: self.shared.reads.load(Ordering::Acquire),
            max_open_tx: self.shared.max_open_tx.load(Ordering::Acquire),
            vertices_with_props: self.shared.props.read().len(),
        }
    }

    /// Committed properties of `vertex`.
    pub fn properties(&self, vertex: VertexId) -> BTreeMap<String, String> {
        self.shared
            .props
            .read()
            .get(&vertex)
            .cloned()
            .unwrap_or_default()
    }

    /// Connector handing out connections to this store.
    pub fn connector(&self) -> LoopbackConnector {
        LoopbackConnector {
            store: self.clone(),
        }
    }
}

/// [`StoreConnector`] for a [`LoopbackStore`].
#[derive(Clone)]
pub struct LoopbackConnector {
    store: LoopbackStore,
}

impl StoreConnector for LoopbackConnector {
    fn connect(&self, client_id: u64, partition_index: usize) -> Result<Box<dyn StoreClient>> {
        debug!(client_id, partition_index, "store.loopback.connect");
        Ok(Box::new(LoopbackClient {
            client_id,
            store: self.store.clone(),
            open: None,
            reads: 0,
        }))
    }
}

struct LoopbackClient {
    client_id: u64,
    store: LoopbackStore,
    open: Option<(TxHandle, Vec<PropertyAssignment>)>,
    reads: u64,
}

impl LoopbackClient {
    fn staged(&mut self, tx: TxHandle, op: &'static str) -> Result<&mut Vec<PropertyAssignment>> {
        match self.open.as_mut() {
            Some((open, staged)) if *open == tx => Ok(staged),
            _ => Err(BenchError::store(op, format!("transaction {} is not open", tx.0))),
        }
    }
}

impl StoreClient for LoopbackClient {
    fn begin_tx(&mut self) -> Result<TxHandle> {
        if let Some((open, _)) = self.open {
            return Err(BenchError::store(
                "begin_tx",
                format!("transaction {} still open", open.0),
            ));
        }
        let shared = &self.store.shared;
        let tx = TxHandle(shared.next_tx.fetch_add(1, Ordering::AcqRel));
        let open = shared.open_tx.fetch_add(1, Ordering::AcqRel) + 1;
        shared.max_open_tx.fetch_max(open, Ordering::AcqRel);
        self.open = Some((tx, Vec::new()));
        Ok(tx)
    }

    fn set_node_property(
        &mut self,
        tx: TxHandle,
        vertex: VertexId,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.staged(tx, "set_node_property")?.push(PropertyAssignment {
            vertex,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn end_tx(&mut self, tx: TxHandle) -> Result<()> {
        let staged = std::mem::take(self.staged(tx, "end_tx")?);
        self.open = None;
        let shared = &self.store.shared;
        shared.open_tx.fetch_sub(1, Ordering::AcqRel);
        let seq = shared.commits.fetch_add(1, Ordering::AcqRel);
        if let FaultPlan::FailCommit { nth } = self.store.options.fault {
            if seq == nth {
                return Err(BenchError::store(
                    "end_tx",
                    format!("injected commit failure #{seq}"),
                ));
            }
        }
        let mut props = shared.props.write();
        for write in staged {
            props.entry(write.vertex).or_default().insert(write.key, write.value);
        }
        Ok(())
    }

    fn read_node_props(
        &mut self,
        requests: &[(VertexId, ReadNodePropsParams)],
    ) -> Result<Vec<NodeProps>> {
        if let FaultPlan::FailReads { client_id, after } = self.store.options.fault {
            if client_id == self.client_id && self.reads >= after {
                return Err(BenchError::store(
                    "read_node_props",
                    format!("injected read failure for client {client_id}"),
                ));
            }
        }
        if !self.store.options.read_latency.is_zero() {
            thread::sleep(self.store.options.read_latency);
        }
        self.reads += 1;
        self.store.shared.reads.fetch_add(1, Ordering::AcqRel);

        let props = self.store.shared.props.read();
        let response = requests
            .iter()
            .map(|(vertex, params)| {
                let properties = props
                    .get(vertex)
                    .map(|all| {
                        all.iter()
                            .filter(|(key, _)| {
                                params.keys.is_empty() || params.keys.contains(*key)
                            })
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                NodeProps {
                    vertex: *vertex,
                    properties,
                }
            })
            .collect();
        Ok(response)
    }
}
