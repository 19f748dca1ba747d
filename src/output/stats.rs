//! Run statistics
//!
//! `RunStats` holds the live counters of one run. The orchestrator is the only
//! writer; counters are atomic so concurrent entry tasks can update them without a
//! lock. `StoreStatistics` is the persisted view used by `--stats`.

use crate::storage::{RecordStore, RunLog, RunRecord, StorageResult};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one crawl run
#[derive(Debug, Default)]
pub struct RunStats {
    keys_processed: AtomicU64,
    entries_seen: AtomicU64,
    entries_persisted: AtomicU64,
    entries_with_zero_records: AtomicU64,
    records_persisted: AtomicU64,
    record_errors: AtomicU64,
    blobs_written: AtomicU64,
    blob_errors: AtomicU64,
    parse_skips: AtomicU64,
    listing_failures: AtomicU64,
    detail_failures: AtomicU64,
    entry_failures: AtomicU64,
}

fn bump(counter: &AtomicU64, n: u64) {
    counter.fetch_add(n, Ordering::Relaxed);
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_processed(&self) {
        bump(&self.keys_processed, 1);
    }

    pub fn entries_seen(&self, n: u64) {
        bump(&self.entries_seen, n);
    }

    pub fn entry_persisted(&self) {
        bump(&self.entries_persisted, 1);
    }

    pub fn entry_with_zero_records(&self) {
        bump(&self.entries_with_zero_records, 1);
    }

    pub fn records_persisted(&self, n: u64) {
        bump(&self.records_persisted, n);
    }

    pub fn record_errors(&self, n: u64) {
        bump(&self.record_errors, n);
    }

    pub fn blob_written(&self) {
        bump(&self.blobs_written, 1);
    }

    pub fn blob_error(&self) {
        bump(&self.blob_errors, 1);
    }

    pub fn parse_skips(&self, n: u64) {
        bump(&self.parse_skips, n);
    }

    pub fn listing_failure(&self) {
        bump(&self.listing_failures, 1);
    }

    pub fn detail_failure(&self) {
        bump(&self.detail_failures, 1);
    }

    pub fn entry_failure(&self) {
        bump(&self.entry_failures, 1);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> RunSummary {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);

        RunSummary {
            keys_processed: get(&self.keys_processed),
            entries_seen: get(&self.entries_seen),
            entries_persisted: get(&self.entries_persisted),
            entries_with_zero_records: get(&self.entries_with_zero_records),
            records_persisted: get(&self.records_persisted),
            record_errors: get(&self.record_errors),
            blobs_written: get(&self.blobs_written),
            blob_errors: get(&self.blob_errors),
            parse_skips: get(&self.parse_skips),
            listing_failures: get(&self.listing_failures),
            detail_failures: get(&self.detail_failures),
            entry_failures: get(&self.entry_failures),
        }
    }
}

/// Point-in-time copy of [`RunStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub keys_processed: u64,
    pub entries_seen: u64,
    pub entries_persisted: u64,
    pub entries_with_zero_records: u64,
    pub records_persisted: u64,
    pub record_errors: u64,
    pub blobs_written: u64,
    pub blob_errors: u64,
    pub parse_skips: u64,
    pub listing_failures: u64,
    pub detail_failures: u64,
    pub entry_failures: u64,
}

impl RunSummary {
    /// Failures of every category except parse skips
    pub fn total_errors(&self) -> u64 {
        self.record_errors
            + self.blob_errors
            + self.listing_failures
            + self.detail_failures
            + self.entry_failures
    }

    /// Share of seen entries that produced at least one stored record, as a percentage
    pub fn persist_rate(&self) -> f64 {
        if self.entries_seen == 0 {
            return 0.0;
        }
        (self.entries_persisted as f64 / self.entries_seen as f64) * 100.0
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary, status: &str) {
    println!("=== Crawl Summary ({}) ===\n", status);

    println!("Traversal:");
    println!("  Keys processed: {}", summary.keys_processed);
    println!("  Entries seen: {}", summary.entries_seen);
    println!(
        "  Entries persisted: {} ({:.1}%)",
        summary.entries_persisted,
        summary.persist_rate()
    );
    println!(
        "  Entries with zero records: {}",
        summary.entries_with_zero_records
    );
    println!();

    println!("Persistence:");
    println!("  Records persisted: {}", summary.records_persisted);
    println!("  Blobs written: {}", summary.blobs_written);
    println!();

    println!("Errors ({}):", summary.total_errors());
    println!("  Listing failures: {}", summary.listing_failures);
    println!("  Detail failures: {}", summary.detail_failures);
    println!("  Entry failures: {}", summary.entry_failures);
    println!("  Record write errors: {}", summary.record_errors);
    println!("  Blob write errors: {}", summary.blob_errors);
    println!("  Parse skips: {}", summary.parse_skips);
}

/// Statistics read back from the stores
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total rows in the record table
    pub total_records: u64,

    /// Entries with at least one row
    pub total_entries: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `records` - The record store to count
/// * `runs` - The run log to read the latest run from
pub fn load_statistics(
    records: &dyn RecordStore,
    runs: &dyn RunLog,
) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_records: records.count_records()?,
        total_entries: records.count_entries()?,
        latest_run: runs.get_latest_run()?,
    })
}

/// Prints stored statistics to stdout
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Stored Catalog ===\n");
    println!("  Records: {}", stats.total_records);
    println!("  Entries: {}", stats.total_entries);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run #{}:", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
            if let Some(stats) = &run.stats {
                println!("  Stats: {}", stats);
            }
        }
        None => println!("No runs recorded."),
    }
}
