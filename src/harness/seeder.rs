use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::store::{StoreClient, VertexId};

/// Key/value written on vertices whose draw exceeds [`COLOR_THRESHOLD`].
pub const COLOR_PROPERTY: (&str, &str) = ("color", "blue");
/// Key/value written on vertices whose draw exceeds [`TYPE_THRESHOLD`].
pub const TYPE_PROPERTY: (&str, &str) = ("type", "photo");
/// Draws above this value get `color`.
pub const COLOR_THRESHOLD: f64 = 0.50;
/// Draws above this value additionally get `type`.
pub const TYPE_THRESHOLD: f64 = 0.75;

/// Largest multiple of `tx_sz` not exceeding `num_nodes`.
pub fn write_nodes(num_nodes: u64, tx_sz: u64) -> u64 {
    (num_nodes / tx_sz) * tx_sz
}

/// Properties assigned to one seeded vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeedOutcome {
    /// No properties.
    Bare,
    /// `color` only.
    Color,
    /// `color` and `type`.
    ColorAndType,
}

impl SeedOutcome {
    /// Maps one uniform draw in `[0, 1)` to an outcome.
    ///
    /// Both thresholds are tested against the same draw, so `type` never
    /// appears without `color`.
    pub fn classify(draw: f64) -> Self {
        match (draw > COLOR_THRESHOLD, draw > TYPE_THRESHOLD) {
            (true, true) => SeedOutcome::ColorAndType,
            (true, false) => SeedOutcome::Color,
            _ => SeedOutcome::Bare,
        }
    }

    /// Property writes implied by this outcome.
    pub fn assignments(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SeedOutcome::Bare => &[],
            SeedOutcome::Color => &[COLOR_PROPERTY],
            SeedOutcome::ColorAndType => &[COLOR_PROPERTY, TYPE_PROPERTY],
        }
    }
}

/// Summary of a completed seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Vertices visited, always `write_nodes(num_nodes, tx_sz)`.
    pub write_nodes: u64,
    /// Transactions committed.
    pub transactions: u64,
    /// Vertices left without properties.
    pub bare: u64,
    /// Vertices with `color` only.
    pub color_only: u64,
    /// Vertices with `color` and `type`.
    pub color_and_type: u64,
}

impl SeedReport {
    fn record(&mut self, outcome: SeedOutcome) {
        match outcome {
            SeedOutcome::Bare => self.bare += 1,
            SeedOutcome::Color => self.color_only += 1,
            SeedOutcome::ColorAndType => self.color_and_type += 1,
        }
    }
}

/// Populates randomized properties on the prefix `[0, write_nodes)` of the
/// vertex domain, `tx_sz` vertices per transaction.
#[derive(Debug, Clone, Copy)]
pub struct DataSeeder {
    num_nodes: u64,
    tx_sz: u64,
}

impl DataSeeder {
    /// Creates a seeder. `tx_sz` must be non-zero.
    pub fn new(num_nodes: u64, tx_sz: u64) -> Result<Self> {
        if tx_sz == 0 {
            return Err(BenchError::InvalidConfig("tx_sz must be > 0".into()));
        }
        Ok(Self { num_nodes, tx_sz })
    }

    /// Vertices this seeder will visit.
    pub fn write_nodes(&self) -> u64 {
        write_nodes(self.num_nodes, self.tx_sz)
    }

    /// Lazily draws one outcome per vertex in `[0, write_nodes)`, in order.
    pub fn outcomes<'a, R: Rng>(
        &self,
        rng: &'a mut R,
    ) -> impl Iterator<Item = (VertexId, SeedOutcome)> + 'a {
        (0..self.write_nodes())
            .map(move |vertex| (vertex, SeedOutcome::classify(rng.gen::<f64>())))
    }

    /// Writes the seeded properties through `client`.
    ///
    /// Exactly one transaction is open at a time. Any store failure aborts
    /// seeding and is returned as [`BenchError::Seed`].
    pub fn seed<R: Rng>(&self, client: &mut dyn StoreClient, rng: &mut R) -> Result<SeedReport> {
        let tx_sz = self.tx_sz;
        let mut report = SeedReport {
            write_nodes: self.write_nodes(),
            ..SeedReport::default()
        };
        let mut outcomes = self.outcomes(rng);

        for group in 0..report.write_nodes / tx_sz {
            let first = group * tx_sz;
            let tx = client.begin_tx().map_err(|e| seed_error(first, e))?;
            for (vertex, outcome) in outcomes.by_ref().take(tx_sz as usize) {
                for (key, value) in outcome.assignments() {
                    client
                        .set_node_property(tx, vertex, key, value)
                        .map_err(|e| seed_error(vertex, e))?;
                }
                report.record(outcome);
            }
            let last = first + tx_sz - 1;
            client.end_tx(tx).map_err(|e| seed_error(last, e))?;
            report.transactions += 1;
            debug!(last_vertex = last, tx = tx.0, "bench.seed.commit");
        }

        info!(
            write_nodes = report.write_nodes,
            transactions = report.transactions,
            bare = report.bare,
            color_only = report.color_only,
            color_and_type = report.color_and_type,
            "bench.seed.completed"
        );
        Ok(report)
    }
}

fn seed_error(vertex: VertexId, source: BenchError) -> BenchError {
    BenchError::Seed {
        vertex,
        source: Box::new(source),
    }
}
