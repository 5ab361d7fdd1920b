//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl site crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{compute_config_hash, load_raw_config, CrawlConfig, RawCrawlConfig};
use ripple_crawl::crawler::Coordinator;
use ripple_crawl::output::export_json;
use ripple_crawl::storage::StorageError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a concurrent, resumable single-site crawler
///
/// Crawls one site from a seed URL, bounded by depth and host, and stores
/// page titles and metadata in SQLite. Pages visited by earlier runs
/// against the same database are skipped.
///
/// Numeric and duration flags are read leniently: an invalid value logs a
/// warning and falls back to its default.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A concurrent, resumable single-site crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(short, long)]
    url: Option<String>,

    /// Maximum link depth from the seed (default 2)
    #[arg(short, long)]
    depth: Option<String>,

    /// Number of concurrent workers (default 4)
    #[arg(short, long)]
    workers: Option<String>,

    /// Per-worker delay after each crawled page, e.g. 500ms or 1s (default 0)
    #[arg(long)]
    delay: Option<String>,

    /// Maximum number of queued URLs (default 1000)
    #[arg(long)]
    queue_capacity: Option<String>,

    /// Per-request timeout, e.g. 30s (default 30s)
    #[arg(long)]
    timeout: Option<String>,

    /// Path to the SQLite database (default crawler.db)
    #[arg(long)]
    db: Option<String>,

    /// Path to a TOML configuration file; flags override its values
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write all results to this JSON file after the crawl
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ignore URLs left queued by an interrupted crawl
    #[arg(long)]
    fresh: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn raw_config(&self) -> RawCrawlConfig {
        RawCrawlConfig {
            seed_url: self.url.clone(),
            depth: self.depth.clone(),
            workers: self.workers.clone(),
            delay: self.delay.clone(),
            queue_capacity: self.queue_capacity.clone(),
            timeout: self.timeout.clone(),
            database_path: self.db.clone(),
            ..RawCrawlConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_raw_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?
        }
        None => RawCrawlConfig::default(),
    };

    let config = CrawlConfig::from_raw(file_config.merge(cli.raw_config()))
        .context("invalid configuration")?;
    tracing::debug!("Configuration hash: {}", compute_config_hash(&config));

    if cli.fresh {
        tracing::info!("Starting fresh crawl (ignoring queued URLs from previous runs)");
    }

    let mut coordinator = Coordinator::new(config)
        .context("failed to open crawl database")?
        .fresh(cli.fresh);

    let summary = coordinator
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("crawl failed")?;

    if summary.interrupted {
        tracing::info!("Crawl run {} interrupted; rerun to resume", summary.run_id);
    } else {
        tracing::info!("Crawl run {} completed", summary.run_id);
    }

    if let Some(path) = &cli.output {
        let storage = coordinator.storage();
        let storage = storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        export_json(&*storage, path)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
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
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
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
