//! Crawler module for catalog traversal
//!
//! This module contains the core crawling logic, including:
//! - Listing extraction (entry stubs per traversal key)
//! - Detail extraction (songs per entry)
//! - Request gating and cancellable pacing
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod listing;
mod pacing;

pub use coordinator::Coordinator;
pub use detail::{parse_detail, DetailExtractor, DetailPage, DetailSelectors};
pub use listing::{parse_listing, ListingExtractor, ListingPage, ListingSelectors};
pub use pacing::{pause, RequestGate};

use crate::config::Config;
use crate::output::{print_summary, RunSummary};
use crate::{ConfigError, ReelError};
use scraper::Selector;
use thiserror::Error;

/// Why a single anchor or song was left out of an extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSkip {
    #[error("entry link {0} has no title")]
    MissingTitle(String),

    #[error("malformed href '{0}'")]
    MalformedHref(String),

    #[error("no entry id in {0}")]
    MissingEntryId(String),

    #[error("song title element is empty")]
    EmptyRecordTitle,

    #[error("no artist found for song '{title}'")]
    MissingArtist { title: String },
}

/// Compiles a configured CSS selector, naming the setting on failure
pub(crate) fn compile_selector(name: &str, css: &str) -> Result<Selector, ReelError> {
    Selector::parse(css)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, css, e)).into())
}

/// Runs a complete crawl
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the record store, the blob store and the run log
/// 2. Build the session backend
/// 3. Walk every traversal key, then every entry of each key
/// 4. Persist the songs of each entry
/// 5. Print the run summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
///
/// # Example
///
/// ```no_run
/// use reel_tracks::config::load_config_with_hash;
/// use reel_tracks::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("reel-tracks.toml"))?;
/// let summary = run_crawl(&config, &hash).await?;
/// println!("{} records", summary.records_persisted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, config_hash: &str) -> Result<RunSummary, ReelError> {
    let coordinator = Coordinator::from_config(config, config_hash)?;
    let summary = coordinator.run().await?;
    let status = if coordinator.cancellation_token().is_cancelled() {
        "interrupted"
    } else {
        "completed"
    };
    print_summary(&summary, status);
    Ok(summary)
}
