//! ecogw CLI entry point.
//!
//! `run` starts the collector daemon against a TOML config file;
//! `list-fields` prints the live-data field table; `example` prints a
//! starter configuration.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ecogw::collector::{init_with_retry, Collector};
use ecogw::config::{CollectorConfig, StaticSource, EXAMPLE_CONFIG};
use ecogw::publish::JsonLinesPublisher;
use ecogw::{FieldRegistry, GatewayClient, GatewayClientConfig};

/// Bounded attempt budget for startup initialization.
const INIT_MAX_ATTEMPTS: u32 = 5;
const INIT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Ecowitt Gateway Collector
#[derive(Parser, Debug)]
#[command(name = "ecogw", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the collector daemon
    Run {
        /// Configuration file path
        config: PathBuf,
    },

    /// List the live-data fields the decoder understands
    ListFields,

    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_collector(config).await,
        Commands::ListFields => {
            list_fields();
            ExitCode::SUCCESS
        }
        Commands::Example => {
            print!("{}", EXAMPLE_CONFIG);
            ExitCode::SUCCESS
        }
    }
}

async fn run_collector(config_path: PathBuf) -> ExitCode {
    let config = match init_with_retry(
        "configuration",
        INIT_MAX_ATTEMPTS,
        INIT_INITIAL_BACKOFF,
        || CollectorConfig::from_file(&config_path),
    )
    .await
    {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, attempts = INIT_MAX_ATTEMPTS, "giving up on configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        gateway = %config.gateway_address,
        device = %config.device_id,
        "configuration loaded"
    );

    let client_config = GatewayClientConfig::default()
        .with_connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .with_read_timeout(Duration::from_millis(config.read_timeout_ms));
    let client = GatewayClient::new(client_config);
    let publisher = JsonLinesPublisher::new();
    let interval = Duration::from_secs(config.poll_interval_secs);
    let source = StaticSource::new(config);

    let collector = Collector::new(client, publisher, source, interval);
    collector.run().await;

    // The loop only completes if the process is being torn down.
    ExitCode::SUCCESS
}

fn list_fields() {
    let registry = FieldRegistry::live_data();

    println!("Live-data fields ({}):", registry.len());
    println!();
    println!("  code  bytes  divisor  name");

    for spec in registry.iter() {
        println!(
            "  {:>4}  {:>5}  {:>7}  {}",
            spec.code, spec.length, spec.divisor, spec.name
        );
    }

    println!();
    println!("Divisor 10 yields one decimal place; divisor 1 keeps an integer.");
}
