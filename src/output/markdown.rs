//! Markdown run report
//!
//! This module renders a human-readable markdown report of one crawl run.

use crate::output::traits::{OutputResult, RunReport};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report
///
/// # Arguments
///
/// * `report` - The run report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    md.push_str("# Reel-Tracks Crawl Report\n\n");

    md.push_str("## Run Information\n\n");
    if let Some(run_id) = report.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Started**: {}\n", report.started_at));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = report.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", report.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Keys Processed**: {}\n", summary.keys_processed));
    md.push_str(&format!("- **Entries Seen**: {}\n", summary.entries_seen));
    md.push_str(&format!(
        "- **Records Persisted**: {}\n",
        summary.records_persisted
    ));
    md.push_str(&format!("- **Blobs Written**: {}\n", summary.blobs_written));
    md.push_str(&format!(
        "- **Persist Rate**: {:.2}%\n",
        summary.persist_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", report.error_rate()));

    md.push_str("## Entry Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Persisted | {} |\n", summary.entries_persisted));
    md.push_str(&format!(
        "| Zero records | {} |\n",
        summary.entries_with_zero_records
    ));
    md.push_str(&format!("| Detail failure | {} |\n", summary.detail_failures));
    md.push_str(&format!("| Entry failure | {} |\n\n", summary.entry_failures));

    if summary.total_errors() > 0 || summary.parse_skips > 0 {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");

        let rows = [
            ("Listing failure", summary.listing_failures),
            ("Detail failure", summary.detail_failures),
            ("Entry failure", summary.entry_failures),
            ("Record write", summary.record_errors),
            ("Blob write", summary.blob_errors),
            ("Parse skip", summary.parse_skips),
        ];
        for (name, count) in rows.iter().filter(|(_, count)| *count > 0) {
            md.push_str(&format!("| {} | {} |\n", name, count));
        }
        md.push('\n');
    }

    if !report.keys.is_empty() {
        md.push_str("## Traversal Keys\n\n");
        md.push_str(&report.keys.join(", "));
        md.push_str("\n\n");
    }

    md
}
