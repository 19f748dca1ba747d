//! Storage traits and error types
//!
//! This module defines the trait interfaces for the keyed record store, the blob
//! store and the run log, and the associated error types.

use crate::catalog::{EntryStub, NestedRecord};
use crate::storage::{RunRecord, RunStatus, StoredRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Keyed store holding one row per (entry, record) pair
pub trait RecordStore: Send {
    /// Inserts or overwrites the row keyed by `(entry.entry_id, record.record_id)`
    fn upsert_record(
        &mut self,
        entry: &EntryStub,
        record: &NestedRecord,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Gets one row by key
    fn get_record(&self, entry_id: &str, record_id: &str) -> StorageResult<Option<StoredRecord>>;

    /// Gets all rows for an entry, ordered by record id
    fn records_for_entry(&self, entry_id: &str) -> StorageResult<Vec<StoredRecord>>;

    /// Gets total row count
    fn count_records(&self) -> StorageResult<u64>;

    /// Gets count of distinct entries with at least one row
    fn count_entries(&self) -> StorageResult<u64>;
}

/// Store of opaque documents addressed by slash-separated keys
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` under `key`, replacing any previous value
    ///
    /// Returns the hex-encoded SHA-256 digest of the written bytes.
    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String>;

    /// Reads the value under `key`
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Lists all keys, sorted
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Record of crawl runs
pub trait RunLog: Send {
    /// Creates a new run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status, finish timestamp and serialized stats of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, stats_json: &str)
        -> StorageResult<()>;

    /// Marks runs still flagged `running` as interrupted
    ///
    /// Such runs belong to a process that died without finishing. Returns how many
    /// runs were updated.
    fn recover_stale_runs(&mut self) -> StorageResult<usize>;
}
