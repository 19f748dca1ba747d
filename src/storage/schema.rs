//! Database schema definitions
//!
//! The record table name is configurable, so its DDL is generated; the run log has a
//! fixed name.

/// SQL schema for the run log
pub const RUNS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    stats TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status);
"#;

/// SQL schema for the record table
///
/// `table` must already be validated as a plain identifier.
pub fn records_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    entry_id TEXT NOT NULL,
    record_id TEXT NOT NULL,
    entry_title TEXT NOT NULL,
    record_title TEXT NOT NULL,
    secondary_field TEXT NOT NULL,
    source_url TEXT NOT NULL,
    id_synthesized INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (entry_id, record_id)
);

CREATE INDEX IF NOT EXISTS idx_{table}_updated ON {table}(updated_at);
"#,
        table = table
    )
}

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `table` - Name of the record table
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(RUNS_SQL)?;
    conn.execute_batch(&records_sql(table))?;
    Ok(())
}
