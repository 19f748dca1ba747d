use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStub {
    /// Trailing path segment of `source_url`
    pub entry_id: String,

    /// Entry title as shown on the listing page
    pub title: String,

    /// Absolute URL of the entry's detail page
    pub source_url: String,

    /// Release year, when the listing shows one
    #[serde(
        rename = "optionalYear",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
}

/// A song extracted from an entry's detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedRecord {
    /// Page-provided id, or a random UUID when the page carries none
    pub record_id: String,

    /// Song title
    pub title: String,

    /// Performing artist
    pub secondary_field: String,

    /// Canonical entry title taken from the detail page heading
    pub parent_title: String,

    /// True when `record_id` was generated locally. Such records are not
    /// deduplicated across crawls.
    #[serde(default)]
    pub id_synthesized: bool,
}

impl NestedRecord {
    /// Creates a record, using `source_id` when present and non-blank
    pub fn new(
        source_id: Option<&str>,
        title: impl Into<String>,
        secondary_field: impl Into<String>,
        parent_title: impl Into<String>,
    ) -> Self {
        let source_id = source_id.map(str::trim).filter(|id| !id.is_empty());
        let (record_id, id_synthesized) = match source_id {
            Some(id) => (id.to_string(), false),
            None => (Uuid::new_v4().to_string(), true),
        };

        Self {
            record_id,
            title: title.into(),
            secondary_field: secondary_field.into(),
            parent_title: parent_title.into(),
            id_synthesized,
        }
    }
}

/// Raw capture of one entry, written to the blob store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedDocument {
    pub entry: EntryStub,
    pub records: Vec<NestedRecord>,
    pub captured_at: DateTime<Utc>,
}

impl CapturedDocument {
    /// Captures an entry and its records at the current time
    pub fn new(entry: EntryStub, records: Vec<NestedRecord>) -> Self {
        Self::captured_at(entry, records, Utc::now())
    }

    /// Captures an entry and its records at an explicit time
    pub fn captured_at(
        entry: EntryStub,
        records: Vec<NestedRecord>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry,
            records,
            captured_at,
        }
    }

    /// Blob key for this document
    pub fn key(&self) -> String {
        capture_key(&self.entry.entry_id)
    }
}

/// Blob key for an entry's capture: `entries/{entry_id}/data`
pub fn capture_key(entry_id: &str) -> String {
    format!("entries/{}/data", entry_id)
}
