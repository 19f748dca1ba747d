//! Storage module for persisting crawl output
//!
//! This module handles:
//! - The keyed record store (one SQLite row per entry and song)
//! - The blob store (one capture document per entry on the filesystem)
//! - The run log (one row per crawl run, with final stats)
//! - `PersistenceSink`, which writes an extracted entry to both stores

mod blob;
mod schema;
mod sink;
mod sqlite;
mod traits;

pub use blob::FsBlobStore;
pub use sink::{PersistResult, PersistenceSink, SharedRecordStore};
pub use sqlite::SqliteStore;
pub use traits::{BlobStore, RecordStore, RunLog, StorageError, StorageResult};

use crate::config::OutputConfig;
use crate::ReelError;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Opens the SQLite store and the blob store named in the configuration
///
/// # Returns
///
/// * `Ok((store, blobs))` - The SQLite store (records and run log) and the blob store
/// * `Err(ReelError)` - Failed to open either store
pub fn open_storage(
    config: &OutputConfig,
) -> Result<(Arc<Mutex<SqliteStore>>, Arc<FsBlobStore>), ReelError> {
    let store = SqliteStore::new(Path::new(&config.database_path), &config.table)?;
    let blobs = FsBlobStore::new(&config.blob_root)?;
    Ok((Arc::new(Mutex::new(store)), Arc::new(blobs)))
}

/// A row of the record table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub entry_id: String,
    pub record_id: String,
    pub entry_title: String,
    pub record_title: String,
    pub secondary_field: String,
    pub source_url: String,
    pub id_synthesized: bool,
    pub updated_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    /// Final stats as JSON, set when the run finishes
    pub stats: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Interrupted,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_open_storage_creates_both_stores() {
        let dir = tempdir().unwrap();
        let config = OutputConfig {
            database_path: dir.path().join("crawl.db").to_string_lossy().into_owned(),
            table: "soundtrack_items".to_string(),
            blob_root: dir.path().join("blobs").to_string_lossy().into_owned(),
            report_path: None,
        };

        let (store, blobs) = open_storage(&config).unwrap();

        assert_eq!(store.lock().unwrap().count_records().unwrap(), 0);
        assert!(blobs.root().is_dir());
    }
}
