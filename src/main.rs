use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jepwatch::config::Config;
use jepwatch::crawler::fetcher::decode_bytes;
use jepwatch::crawler::{TableFetcher, UpdatePipeline};
use jepwatch::notifications::{extract_facets, format_update, BlueskyChannel, Channel};
use jepwatch::parser::TableParser;
use jepwatch::scheduler::CycleScheduler;
use jepwatch::storage::create_sqlite_repository;

#[derive(Parser)]
#[command(
    name = "jepwatch",
    version,
    about = "Watch the OpenJDK JEP index and post state changes to Bluesky",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json), overrides the configured one
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single watch cycle
    Check {
        /// Print the updates instead of posting and saving them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Run watch cycles on the configured interval until Ctrl-C
    Watch,

    /// Parse a saved copy of the JEP index and print its entries as JSON lines
    Parse {
        /// HTML file to parse
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Render the post for one entry of a saved JEP index
    Preview {
        /// HTML file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// JEP number to render
        #[arg(short, long)]
        number: String,
    },

    /// Check the configuration and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Check { dry_run } => {
            tracing::info!(dry_run = %dry_run, "Starting check command");
            check(&config, dry_run).await?;
        }

        Commands::Watch => {
            tracing::info!(
                interval_secs = config.scheduler.interval_secs,
                "Starting watch command"
            );
            watch(&config).await?;
        }

        Commands::Parse { file } => {
            tracing::info!(file = %file.display(), "Starting parse command");
            parse(&file)?;
        }

        Commands::Preview { file, number } => {
            tracing::info!(file = %file.display(), number = %number, "Starting preview command");
            preview(&file, &number)?;
        }

        Commands::Validate => {
            validate(&config)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("jepwatch=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new(format!("jepwatch={level},warn"))
        }
    });

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

fn build_pipeline(config: &Config, dry_run: bool) -> Result<UpdatePipeline> {
    let fetcher = TableFetcher::new(&config.source).context("Failed to create fetcher")?;
    let repository = create_sqlite_repository(&config.database.sqlite_path)?;

    if dry_run {
        config.validate()?;
        return Ok(UpdatePipeline::dry_run(fetcher, repository));
    }

    config.validate_for_posting()?;
    let channel =
        BlueskyChannel::new(config.bluesky.clone()).context("Failed to create Bluesky channel")?;
    tracing::debug!(channel = %channel.config(), "Posting channel ready");
    Ok(UpdatePipeline::new(fetcher, repository, Arc::new(channel)))
}

async fn check(config: &Config, dry_run: bool) -> Result<()> {
    let pipeline = build_pipeline(config, dry_run)?;
    let report = pipeline.run_cycle().await;

    for notification in &report.previews {
        println!("{}", notification.text);
        println!(
            "facets: {}\n",
            serde_json::to_string(&notification.facets())?
        );
    }
    println!("{report}");
    for failure in &report.failures {
        println!("  {failure}");
    }

    if report.needs_attention() {
        anyhow::bail!("Cycle hit a failure that will not clear up by itself: {report}");
    }
    if !report.is_completed() {
        anyhow::bail!("Cycle did not complete: {report}");
    }
    Ok(())
}

async fn watch(config: &Config) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(config, false)?);
    let scheduler = CycleScheduler::new(pipeline, &config.scheduler);
    let cycles = scheduler.run().await;
    println!("Stopped after {cycles} cycles.");
    Ok(())
}

fn read_index(file: &Path) -> Result<String> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(decode_bytes(&bytes, ""))
}

fn parse(file: &Path) -> Result<()> {
    let entries = TableParser::new().parse_html(&read_index(file)?);
    for entry in &entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    tracing::info!(entries = entries.len(), "Parsed JEP index");
    Ok(())
}

fn preview(file: &Path, number: &str) -> Result<()> {
    let entries = TableParser::new().parse_html(&read_index(file)?);
    let entry = entries
        .iter()
        .find(|e| e.number.as_deref() == Some(number))
        .with_context(|| format!("JEP {number} not found in {}", file.display()))?;

    let text = format_update(entry);
    println!("{text}");
    println!(
        "facets: {}",
        serde_json::to_string_pretty(&extract_facets(&text))?
    );
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    config.validate()?;

    println!("Configuration is valid.");
    println!("  Source: {}", config.source.url);
    println!("  Database: {}", config.database.sqlite_path.display());
    println!("  Interval: {}s", config.scheduler.interval_secs);
    if config.bluesky.has_credentials() {
        println!("  Bluesky: {} via {}", config.bluesky.handle, config.bluesky.service_url);
    } else {
        println!("  Bluesky: no credentials, only `check --dry-run` is available");
    }
    Ok(())
}
