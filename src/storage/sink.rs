//! Writes extracted entries to the record store and the blob store
//!
//! The two stores are written independently. A failed record write never stops the
//! remaining records, and a failed blob write never fails the call.

use crate::catalog::{CapturedDocument, EntryStub, NestedRecord};
use crate::storage::traits::{BlobStore, RecordStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Outcome of persisting one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistResult {
    pub records_written: u64,
    pub record_errors: u64,
    pub blob_written: bool,
}

/// Shared handle to a record store
pub type SharedRecordStore = Arc<Mutex<dyn RecordStore>>;

/// Persists entries to both stores
#[derive(Clone)]
pub struct PersistenceSink {
    records: SharedRecordStore,
    blobs: Arc<dyn BlobStore>,
}

impl PersistenceSink {
    pub fn new(records: SharedRecordStore, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    /// Persists one entry and its records
    ///
    /// Each record is upserted by `(entry_id, record_id)`; the capture document is
    /// written to `entries/{entry_id}/data`. Calling this twice with the same input
    /// leaves the stores unchanged apart from timestamps.
    pub fn persist(&self, stub: &EntryStub, records: &[NestedRecord]) -> PersistResult {
        self.persist_at(stub, records, Utc::now())
    }

    /// Same as [`persist`](Self::persist) with an explicit capture time
    pub fn persist_at(
        &self,
        stub: &EntryStub,
        records: &[NestedRecord],
        now: DateTime<Utc>,
    ) -> PersistResult {
        let mut result = PersistResult::default();

        match self.records.lock() {
            Ok(mut store) => {
                for record in records {
                    match store.upsert_record(stub, record, now) {
                        Ok(()) => result.records_written += 1,
                        Err(e) => {
                            tracing::warn!(
                                "Failed to write record {}/{}: {}",
                                stub.entry_id,
                                record.record_id,
                                e
                            );
                            result.record_errors += 1;
                        }
                    }
                }
            }
            Err(_) => {
                tracing::error!(
                    "Record store unavailable ({}); {} record(s) of {} not written",
                    StorageError::LockPoisoned,
                    records.len(),
                    stub.entry_id
                );
                result.record_errors = records.len() as u64;
            }
        }

        let document = CapturedDocument::captured_at(stub.clone(), records.to_vec(), now);
        match self.write_capture(&document) {
            Ok(digest) => {
                tracing::debug!("Wrote {} (sha256 {})", document.key(), digest);
                result.blob_written = true;
            }
            Err(e) => {
                tracing::warn!("Failed to write capture {}: {}", document.key(), e);
            }
        }

        result
    }

    fn write_capture(&self, document: &CapturedDocument) -> StorageResult<String> {
        let bytes = serde_json::to_vec_pretty(document)?;
        self.blobs.put(&document.key(), &bytes)
    }
}
