//! Reel-Tracks main entry point
//!
//! This is the command-line interface for the Reel-Tracks soundtrack crawler.

use anyhow::Context;
use clap::Parser;
use reel_tracks::config::{load_config_with_hash, Config};
use reel_tracks::output::{load_statistics, print_statistics, print_summary};
use reel_tracks::storage::open_storage;
use reel_tracks::url::listing_url;
use reel_tracks::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reel-Tracks: a polite soundtrack catalog crawler
///
/// Reel-Tracks walks a catalog one listing key at a time, follows every entry to its
/// detail page and stores the songs it finds there, both as rows in SQLite and as one
/// capture document per entry.
#[derive(Parser, Debug)]
#[command(name = "reel-tracks")]
#[command(version = "1.0.0")]
#[command(about = "A polite soundtrack catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the record store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Only crawl these keys (comma-separated, e.g. --keys A,B,Q)
    #[arg(long, value_delimiter = ',')]
    keys: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let keys = cli.keys.map(|keys| {
        keys.into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
    });

    if cli.dry_run {
        handle_dry_run(&config, keys.as_deref())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &config_hash, keys).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_tracks=info,warn"),
            1 => EnvFilter::new("reel_tracks=debug,info"),
            2 => EnvFilter::new("reel_tracks=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, only: Option<&[String]>) -> anyhow::Result<()> {
    println!("=== Reel-Tracks Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing path: {}", config.site.listing_path);
    println!("  Entry pattern: {}", config.site.entry_path_pattern);

    println!("\nSession:");
    println!("  Backend: {:?}", config.session.backend);
    if let Some(endpoint) = &config.session.endpoint {
        println!("  Endpoint: {}", endpoint);
    }
    println!(
        "  Attempts: {} ({:?} backoff from {}ms)",
        config.session.max_attempts, config.session.backoff, config.session.retry_delay_ms
    );

    println!("\nPacing:");
    println!("  Entry pace: {}ms", config.crawler.entry_pace_ms);
    println!("  Key pace: {}ms", config.crawler.key_pace_ms);
    println!(
        "  Min request interval: {}ms",
        config.crawler.min_request_interval_ms
    );
    println!("  Workers: {}", config.crawler.workers);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Database: {} (table {})",
        config.output.database_path, config.output.table
    );
    println!("  Blob root: {}", config.output.blob_root);
    if let Some(report) = &config.output.report_path {
        println!("  Report: {}", report);
    }

    let keys = config.keys.select(only)?;

    let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
    println!("\nTraversal keys ({}): {}", names.len(), names.join(", "));

    if let Some(first) = keys.first() {
        let base = url::Url::parse(&config.site.base_url)?;
        let url = listing_url(&base, &config.site.listing_path, first.as_str())?;
        println!("First listing URL: {}", url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: prints what the stores hold
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let (store, _blobs) = open_storage(&config.output)?;
    let store = store
        .lock()
        .map_err(|_| anyhow::anyhow!("record store lock poisoned"))?;

    let stats = load_statistics(&*store, &*store)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles a normal crawl, stopping cooperatively on Ctrl-C
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    keys: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::from_config(config, config_hash)?;
    if let Some(keys) = keys {
        coordinator = coordinator.with_key_filter(keys);
    }

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current entry");
            token.cancel();
        }
    });

    let summary = coordinator.run().await?;
    let status = if coordinator.cancellation_token().is_cancelled() {
        "interrupted"
    } else {
        "completed"
    };
    print_summary(&summary, status);

    Ok(())
}
