//! SQLite storage implementation
//!
//! One connection serves both the record table and the run log.

use crate::catalog::{EntryStub, NestedRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, RunLog, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredRecord};
use crate::ReelError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
    table: String,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Name of the record table (a validated identifier)
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(ReelError)` - Failed to open database
    pub fn new(path: &Path, table: &str) -> Result<Self, ReelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn, table)?;

        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(table: &str) -> Result<Self, ReelError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn stored_record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        entry_id: row.get(0)?,
        record_id: row.get(1)?,
        entry_title: row.get(2)?,
        record_title: row.get(3)?,
        secondary_field: row.get(4)?,
        source_url: row.get(5)?,
        id_synthesized: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        stats: row.get(5)?,
    })
}

const RECORD_COLUMNS: &str = "entry_id, record_id, entry_title, record_title, secondary_field, \
                              source_url, id_synthesized, updated_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, stats";

impl RecordStore for SqliteStore {
    fn upsert_record(
        &mut self,
        entry: &EntryStub,
        record: &NestedRecord,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        // The detail heading is the canonical title; fall back to the listing text
        let entry_title = if record.parent_title.is_empty() {
            entry.title.as_str()
        } else {
            record.parent_title.as_str()
        };

        self.conn.execute(
            &format!(
                "INSERT INTO {table} ({columns}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(entry_id, record_id) DO UPDATE SET
                    entry_title = excluded.entry_title,
                    record_title = excluded.record_title,
                    secondary_field = excluded.secondary_field,
                    source_url = excluded.source_url,
                    id_synthesized = excluded.id_synthesized,
                    updated_at = excluded.updated_at",
                table = self.table,
                columns = RECORD_COLUMNS
            ),
            params![
                entry.entry_id,
                record.record_id,
                entry_title,
                record.title,
                record.secondary_field,
                entry.source_url,
                record.id_synthesized,
                updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_record(&self, entry_id: &str, record_id: &str) -> StorageResult<Option<StoredRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE entry_id = ?1 AND record_id = ?2",
                    RECORD_COLUMNS, self.table
                ),
                params![entry_id, record_id],
                stored_record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn records_for_entry(&self, entry_id: &str) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} WHERE entry_id = ?1 ORDER BY record_id",
            RECORD_COLUMNS, self.table
        ))?;

        let records = stmt
            .query_map(params![entry_id], stored_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_entries(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(DISTINCT entry_id) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl RunLog for SqliteStore {
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats_json: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, stats = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, stats_json, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn recover_stale_runs(&mut self) -> StorageResult<usize> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(updated)
    }
}
