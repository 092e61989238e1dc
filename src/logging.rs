//! Tracing subscriber installation for the harness binary and tests.

use crate::error::{BenchError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `fmt` subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence over `level` when it is set.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| BenchError::Logging(format!("invalid log level: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| BenchError::Logging("logging already initialized".into()))
}
