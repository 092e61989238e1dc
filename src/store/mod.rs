//! Surface of the external graph store consumed by the harness.
//!
//! The harness trusts each operation's individual correctness and blocking
//! behavior. Transactions, routing and the wire protocol belong to the store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;

pub mod loopback;

pub use loopback::{FaultPlan, LoopbackConnector, LoopbackOptions, LoopbackStats, LoopbackStore};

/// Identifier of one vertex, dense in `[0, num_nodes)`.
pub type VertexId = u64;

/// Opaque handle of an open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(pub u64);

/// One property write staged inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAssignment {
    /// Target vertex.
    pub vertex: VertexId,
    /// Property key.
    pub key: String,
    /// Property value.
    pub value: String,
}

/// Parameters of a single-vertex property read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadNodePropsParams {
    /// Keys to return; empty returns every property.
    pub keys: Vec<String>,
}

/// Properties returned for one vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeProps {
    /// Vertex the properties belong to.
    pub vertex: VertexId,
    /// Property map.
    pub properties: BTreeMap<String, String>,
}

/// A connection to the store, owned by exactly one thread.
pub trait StoreClient: Send {
    /// Opens a transaction.
    fn begin_tx(&mut self) -> Result<TxHandle>;

    /// Stages `key = value` on `vertex` inside `tx`.
    fn set_node_property(
        &mut self,
        tx: TxHandle,
        vertex: VertexId,
        key: &str,
        value: &str,
    ) -> Result<()>;

    /// Commits `tx`.
    fn end_tx(&mut self, tx: TxHandle) -> Result<()>;

    /// Reads properties for each `(vertex, params)` pair in one blocking round trip.
    fn read_node_props(
        &mut self,
        requests: &[(VertexId, ReadNodePropsParams)],
    ) -> Result<Vec<NodeProps>>;
}

/// Opens store connections routed to a partition.
pub trait StoreConnector: Send + Sync {
    /// Connects as `client_id`, routed to `partition_index`.
    fn connect(&self, client_id: u64, partition_index: usize) -> Result<Box<dyn StoreClient>>;
}
