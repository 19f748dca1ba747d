//! Configuration module for Reel-Tracks
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reel_tracks::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reel-tracks.toml")).unwrap();
//! println!("Crawling {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Backoff, BackendKind, Config, CrawlerConfig, OutputConfig, SelectorConfig, SessionConfig,
    SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
