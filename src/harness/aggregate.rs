use std::fmt::Write as _;
use std::time::Duration;

use serde_json::{json, Value};

/// Outcome of a completed run.
///
/// Throughput is measured over the single outer interval, from release to the
/// last completion signal. Per-client times are diagnostics only.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    /// Elapsed time reported by each worker, indexed by client.
    pub per_client_elapsed: Vec<Duration>,
    /// Wall-clock time of the whole timed phase.
    pub outer_elapsed: Duration,
    /// Reads issued across all clients.
    pub total_requests: u64,
    /// Aggregate reads per second.
    pub throughput: f64,
}

impl BenchmarkResult {
    /// Computes the result of a run of `num_clients` x `num_requests` reads.
    pub fn new(
        num_requests: usize,
        num_clients: usize,
        outer_elapsed: Duration,
        per_client_elapsed: Vec<Duration>,
    ) -> Self {
        Self::from_total(
            num_requests as u64 * num_clients as u64,
            outer_elapsed,
            per_client_elapsed,
        )
    }

    /// Computes the result of a run that issued `total_requests` reads in all.
    pub fn from_total(
        total_requests: u64,
        outer_elapsed: Duration,
        per_client_elapsed: Vec<Duration>,
    ) -> Self {
        Self {
            throughput: throughput(total_requests, outer_elapsed),
            per_client_elapsed,
            outer_elapsed,
            total_requests,
        }
    }

    /// Longest per-client elapsed time.
    pub fn max_client_elapsed(&self) -> Duration {
        self.per_client_elapsed
            .iter()
            .copied()
            .max()
            .unwrap_or_default()
    }

    /// Sum of per-client elapsed times.
    pub fn sum_client_elapsed(&self) -> Duration {
        self.per_client_elapsed.iter().sum()
    }

    /// Human-readable report. The last two lines carry the total time and the
    /// throughput.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (client, elapsed) in self.per_client_elapsed.iter().enumerate() {
            let _ = writeln!(out, "client {client}: {}", format_duration(*elapsed));
        }
        let _ = writeln!(out, "Total time = {:.6}", self.outer_elapsed.as_secs_f64());
        if self.throughput > 0.0 {
            let _ = writeln!(out, "Throughput = {:.2}", self.throughput);
        } else {
            let _ = writeln!(out, "Throughput = n/a");
        }
        out
    }

    /// JSON report with durations in seconds.
    pub fn to_json(&self) -> Value {
        json!({
            "total_requests": self.total_requests,
            "outer_elapsed_secs": self.outer_elapsed.as_secs_f64(),
            "throughput": self.throughput,
            "per_client_elapsed_secs": self
                .per_client_elapsed
                .iter()
                .map(Duration::as_secs_f64)
                .collect::<Vec<_>>(),
        })
    }
}

/// `total_requests / elapsed` in requests per second, or 0.0 for an empty interval.
pub fn throughput(total_requests: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    total_requests as f64 / secs
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1_000 {
        format!("{} µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.2} ms", micros as f64 / 1_000.0)
    } else {
        format!("{:.2} s", micros as f64 / 1_000_000.0)
    }
}
