use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration from TOML text
///
/// # Arguments
///
/// * `content` - The TOML document
///
/// # Returns
///
/// * `Ok(Config)` - Successfully parsed and validated configuration
/// * `Err(ConfigError)` - Failed to parse or validate the configuration
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use reel_tracks::config::load_config;
///
/// let config = load_config(Path::new("reel-tracks.toml")).unwrap();
/// println!("Listing template: {}", config.site.listing_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with every run so runs made with different settings can be told
/// apart.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Loads a configuration and returns both the config and its hash
///
/// The file is read once, so the hash always describes the parsed content.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::KeySpace;
    use crate::config::{Backoff, BackendKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[site]
base-url = "https://www.example.com"
listing-path = "/browse/{key}"
entry-path-pattern = "/Movies/Soundtrack/*"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
blob-root = "./blobs"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.keys, KeySpace::default());
        assert_eq!(config.session.backend, BackendKind::Http);
        assert_eq!(config.session.max_attempts, 5);
        assert_eq!(config.session.retry_delay_ms, 10_000);
        assert_eq!(config.session.backoff, Backoff::Fixed);
        assert_eq!(config.session.element_wait_timeout_ms, 20_000);
        assert_eq!(config.crawler.entry_pace_ms, 1_000);
        assert_eq!(config.crawler.key_pace_ms, 2_000);
        assert_eq!(config.crawler.workers, 1);
        assert_eq!(config.selectors.title_suffix, " Soundtrack");
        assert_eq!(config.output.table, "soundtrack_items");
        assert!(config.output.report_path.is_none());
    }

    #[test]
    fn test_full_config() {
        let content = format!(
            r#"{}
[keys]
kind = "pages"
first = 1
last = 5

[session]
backend = "webdriver"
endpoint = "http://localhost:4444"
max-attempts = 3
backoff = "exponential"

[crawler]
workers = 4
min-request-interval-ms = 250
"#,
            MINIMAL
        );

        let config = parse_config(&content).unwrap();
        assert_eq!(config.keys, KeySpace::Pages { first: 1, last: 5 });
        assert_eq!(config.session.backend, BackendKind::Webdriver);
        assert_eq!(config.session.max_attempts, 3);
        assert_eq!(config.session.backoff, Backoff::Exponential);
        assert_eq!(config.crawler.workers, 4);
        assert_eq!(config.crawler.min_request_interval_ms, 250);
    }

    #[test]
    fn test_load_config_from_file() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.site.base_url, "https://www.example.com");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = MINIMAL.replace("/browse/{key}", "/browse/all");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_hash_matches_loaded_content() {
        let file = create_temp_config(MINIMAL);
        let (_, hash) = load_config_with_hash(file.path()).unwrap();
        let direct = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash, direct);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(hash_content("content 1"), hash_content("content 2"));
    }
}
