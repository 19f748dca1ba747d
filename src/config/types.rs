use crate::catalog::KeySpace;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Reel-Tracks
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub keys: KeySpace,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Where the catalog lives and how its URLs are shaped
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Scheme and host of the catalog, e.g. "https://www.what-song.com"
    pub base_url: String,

    /// Listing path template; `{key}` is replaced by the traversal key
    pub listing_path: String,

    /// Path pattern an anchor must match to count as an entry link
    pub entry_path_pattern: String,
}

/// CSS selectors used by the listing and detail extractors
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    /// Anchors considered as entry links on a listing page
    pub entry_link: String,

    /// Title element inside an entry anchor; the anchor text is used when unset
    pub entry_title: Option<String>,

    /// Year element inside an entry anchor or its parent
    pub entry_year: Option<String>,

    /// Element a render backend waits for on listing pages; defaults to `entry_link`
    pub wait_for: Option<String>,

    /// Heading carrying the canonical entry title on a detail page
    pub heading: String,

    /// Suffix stripped from the heading text
    pub title_suffix: String,

    /// Song title elements, in page order
    pub record_title: String,

    /// Artist element, resolved among the following siblings of a title
    pub record_artist: String,

    /// Attribute holding a stable song id, looked up on the title and its parent
    pub record_id_attribute: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entry_link: "a[href]".to_string(),
            entry_title: None,
            entry_year: None,
            wait_for: None,
            heading: "h1".to_string(),
            title_suffix: " Soundtrack".to_string(),
            record_title: ".song-title".to_string(),
            record_artist: ".song-artist".to_string(),
            record_id_attribute: "data-song-id".to_string(),
        }
    }
}

impl SelectorConfig {
    /// Selector a render backend waits for before reading a listing page
    pub fn listing_wait_selector(&self) -> &str {
        self.wait_for.as_deref().unwrap_or(&self.entry_link)
    }
}

/// Which fetch backend sessions are opened against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Plain HTTP fetch; pages are read as served
    #[default]
    Http,
    /// Remote browser driven over the W3C WebDriver protocol
    Webdriver,
}

/// Delay growth between session acquisition attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

/// Session acquisition and page-load settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    pub backend: BackendKind,

    /// WebDriver broker URL (required for the webdriver backend)
    pub endpoint: Option<String>,

    /// Run the remote browser headless
    pub headless: bool,

    /// Browser name requested from the broker
    pub browser: String,

    /// Maximum session acquisition attempts
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub retry_delay_ms: u64,

    pub backoff: Backoff,

    /// How long a render backend waits for page elements (milliseconds)
    pub element_wait_timeout_ms: u64,

    /// Timeout applied to every outbound request (milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Http,
            endpoint: None,
            headless: true,
            browser: "chrome".to_string(),
            max_attempts: 5,
            retry_delay_ms: 10_000,
            backoff: Backoff::Fixed,
            element_wait_timeout_ms: 20_000,
            request_timeout_ms: 20_000,
        }
    }
}

impl SessionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn element_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.element_wait_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Crawl pacing and concurrency
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Pause after each entry (milliseconds)
    pub entry_pace_ms: u64,

    /// Pause after each traversal key (milliseconds)
    pub key_pace_ms: u64,

    /// Minimum time between any two outbound page loads (milliseconds)
    pub min_request_interval_ms: u64,

    /// Entries processed concurrently within one key
    pub workers: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            entry_pace_ms: 1_000,
            key_pace_ms: 2_000,
            min_request_interval_ms: 0,
            workers: 1,
        }
    }
}

impl CrawlerConfig {
    pub fn entry_pace(&self) -> Duration {
        Duration::from_millis(self.entry_pace_ms)
    }

    pub fn key_pace(&self) -> Duration {
        Duration::from_millis(self.key_pace_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite record store
    pub database_path: String,

    /// Record table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Root directory of the blob store
    pub blob_root: String,

    /// Optional markdown run report
    #[serde(default)]
    pub report_path: Option<String>,
}

fn default_table() -> String {
    "soundtrack_items".to_string()
}
