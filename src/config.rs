//! Run configuration: the five sizing options plus ambient knobs.
//!
//! A configuration is fixed at startup. It can be loaded from a TOML file and
//! then overridden field by field from the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Options recognized by a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Reads issued per client during the timed phase.
    pub num_requests: usize,
    /// Size of the vertex-id domain.
    pub num_nodes: u64,
    /// Number of storage partitions clients round-robin across.
    pub num_vts: usize,
    /// Concurrency level (one worker thread per client).
    pub num_clients: usize,
    /// Vertices committed per seeding transaction.
    pub tx_sz: u64,
    /// Client id of the first connection; client `i` uses `base_client_id + i`.
    pub base_client_id: u64,
    /// Fixed RNG seed for reproducible seeding and workloads.
    pub seed: Option<u64>,
    /// Completed requests between progress notifications.
    pub progress_interval: usize,
    /// Upper bound on the completion wait. Unset waits forever.
    pub finish_timeout_ms: Option<u64>,
    /// Default tracing filter directive.
    pub log_level: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::twitter()
    }
}

impl BenchConfig {
    /// Sizing of the reference run against the snap twitter-combined graph.
    pub fn twitter() -> Self {
        Self {
            num_requests: 5000,
            num_nodes: 81306,
            num_vts: 1,
            num_clients: 8,
            tx_sz: 1000,
            base_client_id: 0,
            seed: None,
            progress_interval: 1000,
            finish_timeout_ms: None,
            log_level: "info".to_string(),
        }
    }

    /// Small run suitable for smoke checks.
    pub fn smoke() -> Self {
        Self {
            num_requests: 100,
            num_nodes: 1000,
            num_clients: 2,
            tx_sz: 100,
            ..Self::twitter()
        }
    }

    /// Total reads issued across all clients.
    pub fn total_requests(&self) -> u64 {
        self.num_requests as u64 * self.num_clients as u64
    }

    /// Bounded completion wait, if configured.
    pub fn finish_timeout(&self) -> Option<Duration> {
        self.finish_timeout_ms.map(Duration::from_millis)
    }

    /// Rejects configurations the harness cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.num_clients == 0 {
            return Err(BenchError::InvalidConfig("num_clients must be > 0".into()));
        }
        if self.num_nodes == 0 {
            return Err(BenchError::InvalidConfig("num_nodes must be > 0".into()));
        }
        if self.num_vts == 0 {
            return Err(BenchError::InvalidConfig("num_vts must be > 0".into()));
        }
        if self.tx_sz == 0 {
            return Err(BenchError::InvalidConfig("tx_sz must be > 0".into()));
        }
        if self.progress_interval == 0 {
            return Err(BenchError::InvalidConfig(
                "progress_interval must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Loads a configuration from a TOML file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| BenchError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        toml::from_str(&raw).map_err(|err| BenchError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Loads `explicit` if given, else the default path if it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/vertexload/config.toml`, when a config dir is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vertexload").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_sizing() {
        let config = BenchConfig::default();
        assert_eq!(config.num_requests, 5000);
        assert_eq!(config.num_nodes, 81306);
        assert_eq!(config.num_vts, 1);
        assert_eq!(config.num_clients, 8);
        assert_eq!(config.tx_sz, 1000);
        assert_eq!(config.total_requests(), 40_000);
        assert!(config.finish_timeout().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut config = BenchConfig::smoke();
        config.tx_sz = 0;
        assert!(matches!(config.validate(), Err(BenchError::InvalidConfig(_))));

        let mut config = BenchConfig::smoke();
        config.num_clients = 0;
        assert!(config.validate().is_err());

        let mut config = BenchConfig::smoke();
        config.num_requests = 0;
        config.validate().unwrap();
    }

    #[test]
    fn load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_clients = 4\ntx_sz = 250\nseed = 7").unwrap();
        let config = BenchConfig::load(file.path()).unwrap();
        assert_eq!(config.num_clients, 4);
        assert_eq!(config.tx_sz, 250);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.num_nodes, 81306);
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_threads = 4").unwrap();
        let err = BenchConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, BenchError::Config { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(BenchConfig::resolve(Some(&missing)).is_err());
    }
}
