//! Reel-Tracks: a polite soundtrack catalog crawler
//!
//! This crate walks a catalog site one listing shard at a time (a letter or a page
//! number), follows every entry to its detail page, extracts the songs listed there and
//! persists them twice: one normalized row per song in a keyed record store, and one raw
//! capture document per entry in a blob store.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod session;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Reel-Tracks operations
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No session available after {attempts} attempt(s): {last_error}")]
    SessionUnavailable { attempts: u32, last_error: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] session::FetchError),

    #[error("Traversal key space cannot be enumerated: {0}")]
    Traversal(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid path pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Reel-Tracks operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{CapturedDocument, EntryStub, KeySpace, NestedRecord, TraversalKey};
pub use config::Config;
pub use crawler::Coordinator;
pub use output::{RunStats, RunSummary};
pub use state::CrawlPhase;
