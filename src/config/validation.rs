use crate::config::types::{
    BackendKind, Config, CrawlerConfig, OutputConfig, SelectorConfig, SessionConfig, SiteConfig,
    UserAgentConfig,
};
use crate::url::LISTING_KEY_PLACEHOLDER;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    config
        .keys
        .enumerate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    validate_selector_config(&config.selectors)?;
    validate_session_config(&config.session)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if !config.listing_path.contains(LISTING_KEY_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "listing_path must contain the {} placeholder, got '{}'",
            LISTING_KEY_PLACEHOLDER, config.listing_path
        )));
    }

    validate_path_pattern(&config.entry_path_pattern)?;
    Ok(())
}

/// Validates an entry path pattern such as "/Movies/Soundtrack/*"
fn validate_path_pattern(pattern: &str) -> Result<(), ConfigError> {
    if !pattern.starts_with('/') {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' must start with '/'",
            pattern
        )));
    }

    let segments: Vec<&str> = pattern.trim_end_matches('/').split('/').skip(1).collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' must contain non-empty segments",
            pattern
        )));
    }

    Ok(())
}

/// Validates that every selector parses
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    validate_selector("entry_link", &config.entry_link)?;
    if let Some(selector) = &config.entry_title {
        validate_selector("entry_title", selector)?;
    }
    if let Some(selector) = &config.entry_year {
        validate_selector("entry_year", selector)?;
    }
    if let Some(selector) = &config.wait_for {
        validate_selector("wait_for", selector)?;
    }
    validate_selector("heading", &config.heading)?;
    validate_selector("record_title", &config.record_title)?;
    validate_selector("record_artist", &config.record_artist)?;

    if config.record_id_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "record_id_attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "{} cannot be empty",
            name
        )));
    }

    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e)))
}

/// Validates session acquisition settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 20, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.element_wait_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "element_wait_timeout_ms must be >= 100ms, got {}ms",
            config.element_wait_timeout_ms
        )));
    }

    if config.backend == BackendKind::Webdriver {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ConfigError::Validation("the webdriver backend requires an endpoint".to_string())
        })?;
        validate_http_url("endpoint", endpoint)?;

        if config.browser.trim().is_empty() {
            return Err(ConfigError::Validation(
                "browser cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates crawl pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 32, got {}",
            config.workers
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.blob_root.is_empty() {
        return Err(ConfigError::Validation(
            "blob_root cannot be empty".to_string(),
        ));
    }

    // The table name is spliced into SQL
    let mut chars = config.table.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "table must be a plain SQL identifier, got '{}'",
            config.table
        )));
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_pattern() {
        assert!(validate_path_pattern("/Movies/Soundtrack/*").is_ok());
        assert!(validate_path_pattern("/movie/*/songs").is_ok());
        assert!(validate_path_pattern("/entry/").is_ok());

        assert!(validate_path_pattern("").is_err());
        assert!(validate_path_pattern("/").is_err());
        assert!(validate_path_pattern("Movies/*").is_err());
        assert!(validate_path_pattern("/Movies//x").is_err());
    }

    #[test]
    fn test_validate_selector() {
        assert!(validate_selector("x", ".song-title").is_ok());
        assert!(validate_selector("x", "a[href*='/Movies/']").is_ok());

        assert!(validate_selector("x", "").is_err());
        assert!(validate_selector("x", "..bad[").is_err());
    }

    #[test]
    fn test_webdriver_requires_endpoint() {
        let mut session = SessionConfig {
            backend: BackendKind::Webdriver,
            ..SessionConfig::default()
        };
        assert!(validate_session_config(&session).is_err());

        session.endpoint = Some("http://localhost:4444".to_string());
        assert!(validate_session_config(&session).is_ok());
    }

    #[test]
    fn test_max_attempts_bounds() {
        let session = SessionConfig {
            max_attempts: 0,
            ..SessionConfig::default()
        };
        assert!(validate_session_config(&session).is_err());
    }

    #[test]
    fn test_workers_bounds() {
        let crawler = CrawlerConfig {
            workers: 0,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&crawler).is_err());
    }

    #[test]
    fn test_table_name_must_be_identifier() {
        let mut output = OutputConfig {
            database_path: "db.sqlite".to_string(),
            table: "soundtrack_items".to_string(),
            blob_root: "blobs".to_string(),
            report_path: None,
        };
        assert!(validate_output_config(&output).is_ok());

        output.table = "items; DROP TABLE runs".to_string();
        assert!(validate_output_config(&output).is_err());

        output.table = "1items".to_string();
        assert!(validate_output_config(&output).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }
}
