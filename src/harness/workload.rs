use rand::Rng;

use crate::error::{BenchError, Result};
use crate::store::VertexId;

/// Read sequence owned by one client, generated before timing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBatch {
    client_index: usize,
    vertices: Vec<VertexId>,
}

impl RequestBatch {
    /// Index of the owning client.
    pub fn client_index(&self) -> usize {
        self.client_index
    }

    /// Vertices to read, in issue order.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Number of requests in the batch.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the batch has no requests.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Samples per-client read sequences uniformly, with replacement, from
/// `[0, num_nodes)`.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadGenerator {
    num_nodes: u64,
    num_requests: usize,
}

impl WorkloadGenerator {
    /// Creates a generator. `num_nodes` must be non-zero.
    pub fn new(num_nodes: u64, num_requests: usize) -> Result<Self> {
        if num_nodes == 0 {
            return Err(BenchError::InvalidConfig("num_nodes must be > 0".into()));
        }
        Ok(Self {
            num_nodes,
            num_requests,
        })
    }

    /// Generates the batch for one client.
    pub fn batch<R: Rng>(&self, client_index: usize, rng: &mut R) -> RequestBatch {
        let vertices = (0..self.num_requests)
            .map(|_| rng.gen_range(0..self.num_nodes))
            .collect();
        RequestBatch {
            client_index,
            vertices,
        }
    }

    /// Generates one batch per client, indexed by client.
    pub fn generate<R: Rng>(&self, num_clients: usize, rng: &mut R) -> Vec<RequestBatch> {
        (0..num_clients).map(|idx| self.batch(idx, rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn batches_have_requested_shape() {
        let generator = WorkloadGenerator::new(100, 10).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let batches = generator.generate(4, &mut rng);
        assert_eq!(batches.len(), 4);
        for (idx, batch) in batches.iter().enumerate() {
            assert_eq!(batch.client_index(), idx);
            assert_eq!(batch.len(), 10);
            assert!(batch.vertices().iter().all(|v| *v < 100));
        }
    }

    #[test]
    fn single_vertex_domain_repeats() {
        let generator = WorkloadGenerator::new(1, 5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(generator.batch(0, &mut rng).vertices(), &[0; 5]);
    }

    #[test]
    fn same_seed_same_workload() {
        let generator = WorkloadGenerator::new(81306, 50).unwrap();
        let a = generator.generate(3, &mut ChaCha8Rng::seed_from_u64(11));
        let b = generator.generate(3, &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_requests_yields_empty_batches() {
        let generator = WorkloadGenerator::new(10, 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generator.generate(2, &mut rng).iter().all(RequestBatch::is_empty));
    }

    #[test]
    fn empty_vertex_domain_is_rejected() {
        let err = WorkloadGenerator::new(0, 5).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }
}
