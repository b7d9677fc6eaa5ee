//! ia-mine main entry point
//!
//! Command-line interface for concurrently retrieving archive.org item
//! metadata.

use anyhow::Context;
use clap::Parser;
use ia_mine::config::{load_config, validate, Config};
use ia_mine::miner::{mine, IdentifierSource};
use ia_mine::MineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit status after an interrupt
const INTERRUPTED_EXIT_CODE: u8 = 127;

/// Exit status for configuration, input and output errors
const FAILURE_EXIT_CODE: u8 = 1;

/// Concurrently download metadata for items on archive.org
///
/// Reads one identifier per line and prints each item's metadata as a JSON
/// line, or writes it to per-item files or a single combined file.
#[derive(Parser, Debug)]
#[command(name = "ia-mine")]
#[command(version)]
#[command(about = "Concurrently download metadata for items on archive.org", long_about = None)]
struct Cli {
    /// File with one identifier per line, or '-' to read from stdin
    #[arg(value_name = "ITEMLIST")]
    itemlist: String,

    /// Write item metadata to a file called <identifier>_meta.json
    #[arg(short, long, conflicts_with = "output")]
    cache: bool,

    /// Directory for --cache files
    #[arg(long, value_name = "DIR", requires = "cache")]
    cache_dir: Option<PathBuf>,

    /// Append all metadata to a single JSON-lines file
    #[arg(short, long, value_name = "FILE", conflicts_with = "cache")]
    output: Option<PathBuf>,

    /// The number of requests to run concurrently [default: 20]
    #[arg(short, long, value_name = "COUNT")]
    workers: Option<usize>,

    /// Number of identifiers buffered ahead of the workers [default: 1000]
    #[arg(long, value_name = "N")]
    queue_capacity: Option<usize>,

    /// Metadata API base URL [default: https://archive.org]
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Ctrl-C cancels the run
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let result = run(cli, cancel).await;
    let status = exit_status(&result);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) if status == INTERRUPTED_EXIT_CODE => {
            tracing::warn!("Interrupted, exiting without draining in-flight requests");
            // Blocking readers (stdin) would keep the runtime alive on shutdown.
            std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(status)
        }
    }
}

/// Maps the outcome of a run to the process exit status
///
/// * `0` - Every identifier was processed (individual failures included)
/// * `127` - The run was interrupted
/// * `1` - Any other run-level error
fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) if matches!(e.downcast_ref::<MineError>(), Some(MineError::Interrupted)) => {
            INTERRUPTED_EXIT_CODE
        }
        Err(_) => FAILURE_EXIT_CODE,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for metadata records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ia_mine=info,warn"),
            1 => EnvFilter::new("ia_mine=debug,info"),
            2 => EnvFilter::new("ia_mine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels `cancel` on Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::debug!("Received interrupt signal");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for interrupt signal: {}", e),
        }
    });
}

/// Resolves the configuration: TOML file (if any), then command-line flags
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    // Start from the configuration file, if any
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    // Command-line flags override the file
    if let Some(workers) = cli.workers {
        config.miner.worker_count = workers;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.miner.queue_capacity = capacity;
    }
    if let Some(base_url) = &cli.base_url {
        config.session.base_url = base_url.clone();
    }
    if cli.cache {
        config.output.cache_to_per_item_files = true;
        config.output.combined_output_path = None;
    }
    if let Some(dir) = &cli.cache_dir {
        config.output.cache_directory = dir.display().to_string();
    }
    if let Some(path) = &cli.output {
        config.output.combined_output_path = Some(path.display().to_string());
        config.output.cache_to_per_item_files = false;
    }

    // Validate the merged configuration
    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the mining operation
async fn run(cli: Cli, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let source = IdentifierSource::from_arg(&cli.itemlist);

    tracing::debug!(
        "Reading identifiers from {:?}, writing to {:?}",
        source,
        config.output.mode()
    );

    let summary = mine(&config, &source, cancel).await?;
    if summary.total_failures() > 0 {
        tracing::warn!(
            "{} identifiers could not be retrieved or written",
            summary.total_failures()
        );
    }

    Ok(())
}
