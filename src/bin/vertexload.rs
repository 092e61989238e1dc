//! Binary entry point for the vertexload read-throughput harness.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};
use vertexload::{
    harness::{Benchmark, RunOutcome},
    logging::init_logging,
    store::{FaultPlan, LoopbackOptions, LoopbackStore},
    BenchConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "vertexload",
    version,
    about = "Concurrent single-vertex read throughput harness"
)]
struct Cli {
    #[arg(
        long,
        env = "VERTEXLOAD_CONFIG",
        value_name = "FILE",
        help = "TOML config file (defaults to <config dir>/vertexload/config.toml)"
    )]
    config: Option<PathBuf>,

    #[command(flatten)]
    sizing: SizingArgs,

    #[command(flatten)]
    loopback: LoopbackArgs,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for the final report"
    )]
    format: OutputFormat,

    #[arg(long, help = "Print the resolved configuration and exit")]
    print_config: bool,
}

#[derive(Args, Debug)]
struct SizingArgs {
    #[arg(long, help = "Reads issued per client during the timed phase")]
    num_requests: Option<usize>,

    #[arg(long, help = "Size of the vertex-id domain")]
    num_nodes: Option<u64>,

    #[arg(long, help = "Number of partitions clients round-robin across")]
    num_vts: Option<usize>,

    #[arg(long, help = "Number of concurrent clients")]
    num_clients: Option<usize>,

    #[arg(long, help = "Vertices committed per seeding transaction")]
    tx_sz: Option<u64>,

    #[arg(long, help = "Client id of the first connection")]
    base_client_id: Option<u64>,

    #[arg(long, help = "RNG seed for reproducible runs")]
    seed: Option<u64>,

    #[arg(long, help = "Completed requests between progress lines")]
    progress_interval: Option<usize>,

    #[arg(long, help = "Give up waiting for workers after this many milliseconds")]
    finish_timeout_ms: Option<u64>,

    #[arg(long, env = "VERTEXLOAD_LOG", help = "Tracing filter, e.g. info or debug")]
    log_level: Option<String>,
}

#[derive(Args, Debug)]
struct LoopbackArgs {
    #[arg(long, default_value_t = 0, help = "Simulated read latency (microseconds)")]
    read_latency_us: u64,

    #[arg(long, requires = "fail_after", help = "Client id whose reads fail")]
    fail_client: Option<u64>,

    #[arg(long, requires = "fail_client", help = "Reads that succeed before failures")]
    fail_after: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool, Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = BenchConfig::resolve(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.sizing);
    config.validate()?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(true);
    }

    init_logging(&config.log_level)?;

    let store = LoopbackStore::new(LoopbackOptions {
        read_latency: Duration::from_micros(cli.loopback.read_latency_us),
        fault: match (cli.loopback.fail_client, cli.loopback.fail_after) {
            (Some(client_id), Some(after)) => FaultPlan::FailReads { client_id, after },
            _ => FaultPlan::None,
        },
    });

    println!("starting requests");
    let report = Benchmark::new(config)?.run(&store.connector())?;
    match report.outcome {
        RunOutcome::Complete(result) => {
            match cli.format {
                OutputFormat::Text => print!("{}", result.render_text()),
                OutputFormat::Json => {
                    let mut json = result.to_json();
                    json["seeding"] = serde_json::to_value(report.seed)?;
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }
            Ok(true)
        }
        RunOutcome::Incomplete {
            finished,
            expected,
            failures,
        } => {
            eprintln!("run incomplete: {finished}/{expected} clients finished");
            for failure in failures {
                eprintln!("  client {}: {}", failure.client_index, failure.error);
            }
            Ok(false)
        }
    }
}

fn apply_overrides(config: &mut BenchConfig, args: &SizingArgs) {
    if let Some(v) = args.num_requests {
        config.num_requests = v;
    }
    if let Some(v) = args.num_nodes {
        config.num_nodes = v;
    }
    if let Some(v) = args.num_vts {
        config.num_vts = v;
    }
    if let Some(v) = args.num_clients {
        config.num_clients = v;
    }
    if let Some(v) = args.tx_sz {
        config.tx_sz = v;
    }
    if let Some(v) = args.base_client_id {
        config.base_client_id = v;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(v) = args.progress_interval {
        config.progress_interval = v;
    }
    if args.finish_timeout_ms.is_some() {
        config.finish_timeout_ms = args.finish_timeout_ms;
    }
    if let Some(v) = &args.log_level {
        config.log_level = v.clone();
    }
}
