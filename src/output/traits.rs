//! Crawl observer traits and report types
//!
//! This module defines the trait interface the orchestrator reports crawl events to,
//! and the data structure for an end-of-run report.

use crate::catalog::{EntryStub, TraversalKey};
use crate::output::stats::RunSummary;
use crate::storage::{PersistResult, RunStatus};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How one entry ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Records were extracted and handed to the sink
    Persisted(PersistResult),

    /// The detail page yielded no records; nothing was written
    NoRecords,

    /// The entry pipeline failed; the message describes why
    Failed(String),
}

/// End-of-run report
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    // Run metadata
    pub run_id: Option<i64>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    pub summary: RunSummary,

    // Traversal keys visited, in order
    pub keys: Vec<String>,
}

impl RunReport {
    /// Creates a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the error rate over seen entries as a percentage
    pub fn error_rate(&self) -> f64 {
        if self.summary.entries_seen == 0 {
            return 0.0;
        }
        let failed = self.summary.detail_failures + self.summary.entry_failures;
        (failed as f64 / self.summary.entries_seen as f64) * 100.0
    }
}

/// Receives crawl events from the orchestrator
///
/// Implementations must be thread-safe; with several workers, entry events arrive
/// from concurrent tasks.
pub trait CrawlObserver: Send + Sync {
    /// A run started over `keys`
    fn run_started(&self, run_id: Option<i64>, keys: &[TraversalKey]);

    /// A listing page yielded `entries` stubs (and skipped `skipped` anchors)
    fn key_listed(&self, key: &TraversalKey, entries: usize, skipped: usize);

    /// One entry finished, successfully or not
    fn entry_finished(&self, key: &TraversalKey, entry: &EntryStub, outcome: &EntryOutcome);

    /// The run ended
    fn run_finished(&self, status: RunStatus, summary: &RunSummary);
}

/// Observer that logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn run_started(&self, run_id: Option<i64>, keys: &[TraversalKey]) {
        match run_id {
            Some(id) => tracing::info!("Run #{} started over {} key(s)", id, keys.len()),
            None => tracing::info!("Run started over {} key(s)", keys.len()),
        }
    }

    fn key_listed(&self, key: &TraversalKey, entries: usize, skipped: usize) {
        if skipped > 0 {
            tracing::info!(
                "Key {}: {} entries ({} anchors skipped)",
                key,
                entries,
                skipped
            );
        } else {
            tracing::info!("Key {}: {} entries", key, entries);
        }
    }

    fn entry_finished(&self, key: &TraversalKey, entry: &EntryStub, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Persisted(result) => tracing::info!(
                "[{}] {} ({}): {} record(s) written, {} error(s), capture {}",
                key,
                entry.title,
                entry.entry_id,
                result.records_written,
                result.record_errors,
                if result.blob_written {
                    "written"
                } else {
                    "failed"
                }
            ),
            EntryOutcome::NoRecords => tracing::info!(
                "[{}] {} ({}): no records",
                key,
                entry.title,
                entry.entry_id
            ),
            EntryOutcome::Failed(message) => tracing::warn!(
                "[{}] {} ({}) failed: {}",
                key,
                entry.title,
                entry.entry_id,
                message
            ),
        }
    }

    fn run_finished(&self, status: RunStatus, summary: &RunSummary) {
        tracing::info!(
            "Run {}: {} keys, {} entries, {} records, {} errors",
            status.to_db_string(),
            summary.keys_processed,
            summary.entries_seen,
            summary.records_persisted,
            summary.total_errors()
        );
    }
}
