//! weblog-star main entry point
//!
//! This is the command-line interface for the weblog-star log pipeline.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weblog_star::config::{load_config_with_hash, validate, Config, SchemaVariant};
use weblog_star::output::{print_statistics, RunStatistics};
use weblog_star::pipeline::{discover_logs, run_pipeline};

/// weblog-star: web access logs to star-schema tables
///
/// weblog-star reads W3C/IIS extended access logs, classifies every request
/// by browser, operating system and file type, flags crawler traffic,
/// geolocates client IPs and writes dimension and fact tables as CSV.
#[derive(Parser, Debug)]
#[command(name = "weblog-star")]
#[command(version)]
#[command(about = "Web access logs to star-schema tables", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Read logs from this directory instead of the configured one
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Write tables to this directory instead of the configured one
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Table layout to produce
    #[arg(long, value_enum)]
    schema: Option<SchemaArg>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the files that would be processed
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaArg {
    Combined,
    Staged,
}

impl From<SchemaArg> for SchemaVariant {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Combined => SchemaVariant::Combined,
            SchemaArg::Staged => SchemaVariant::Staged,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let mut stats = handle_run(config).await?;
    stats.config_hash = Some(config_hash);
    if !cli.quiet {
        print_statistics(&stats);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weblog_star=info,warn"),
            1 => EnvFilter::new("weblog_star=debug,info"),
            2 => EnvFilter::new("weblog_star=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.input_dir {
        config.input.log_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(schema) = cli.schema {
        config.output.schema = schema.into();
    }
}

/// Handles the --dry-run mode: shows the configuration and the input files
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== weblog-star Dry Run ===\n");

    println!("Input:");
    println!("  Log directory: {}", config.input.log_dir.display());
    println!("  Extension: .{}", config.input.extension);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir.display());
    println!("  Schema: {}", config.output.schema.as_str());

    let geo = &config.geolocation;
    println!("\nGeolocation:");
    println!("  Endpoint: {}", geo.endpoint);
    println!("  Timeout: {}s", geo.timeout_secs);
    println!(
        "  Attempts: {} ({:?} backoff from {}ms)",
        geo.max_attempts, geo.backoff, geo.retry_delay_ms
    );

    let files = discover_logs(&config.input.log_dir, &config.input.extension)?;
    println!("\nLog files ({}):", files.len());
    for file in &files {
        println!("  - {}", file.display());
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: Config) -> anyhow::Result<RunStatistics> {
    tracing::info!(
        "Input: {}, output: {}",
        config.input.log_dir.display(),
        config.output.output_dir.display()
    );

    match run_pipeline(config).await {
        Ok(stats) => {
            tracing::info!("Pipeline completed successfully");
            Ok(stats)
        }
        Err(e) => {
            tracing::error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
