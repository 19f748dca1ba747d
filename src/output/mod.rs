//! Output module for crawl statistics, events and reports
//!
//! This module handles:
//! - Live run counters (`RunStats`) and their serializable snapshot
//! - The observer interface the orchestrator reports events to
//! - Markdown run reports and stdout summaries

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use stats::{
    load_statistics, print_statistics, print_summary, RunStats, RunSummary, StoreStatistics,
};
pub use traits::{
    CrawlObserver, EntryOutcome, OutputError, OutputResult, RunReport, TracingObserver,
};

use crate::storage::RunRecord;
use chrono::{DateTime, Utc};

/// Builds a run report from a run log row and the run's counters
///
/// # Arguments
///
/// * `run` - The run log row, when a run log is in use
/// * `summary` - Final counters of the run
/// * `keys` - The traversal keys the run covered
pub fn build_run_report(run: Option<&RunRecord>, summary: RunSummary, keys: &[String]) -> RunReport {
    let mut report = RunReport {
        summary,
        keys: keys.to_vec(),
        ..RunReport::new()
    };

    if let Some(run) = run {
        report.run_id = Some(run.id);
        report.started_at = run.started_at.clone();
        report.finished_at = run.finished_at.clone();
        report.status = run.status.to_db_string().to_string();
        report.config_hash = run.config_hash.clone();

        report.duration_seconds = match (
            run.started_at.parse::<DateTime<Utc>>(),
            run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
        ) {
            (Ok(started), Some(Ok(finished))) => {
                Some((finished - started).num_seconds().max(0) as u64)
            }
            _ => None,
        };
    }

    report
}
