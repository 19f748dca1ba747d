//! Listing page extraction
//!
//! A listing page holds the entries of one traversal key. Every anchor matched by
//! the entry link selector whose path fits the entry path pattern becomes an
//! [`EntryStub`]. Problems with single anchors skip that anchor only; problems with
//! the page itself degrade to an empty listing.

use crate::catalog::{EntryStub, TraversalKey};
use crate::config::{Config, SelectorConfig};
use crate::crawler::pacing::RequestGate;
use crate::crawler::{compile_selector, ParseSkip};
use crate::session::{element_text, Document, FetchError, PageSnapshot, Session, SessionFactory};
use crate::url::{entry_id_from_url, listing_url, matches_path_pattern, resolve_href};
use crate::ReelError;
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Compiled listing selectors
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub entry_link: Selector,
    pub entry_title: Option<Selector>,
    pub entry_year: Option<Selector>,
}

impl ListingSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ReelError> {
        Ok(Self {
            entry_link: compile_selector("entry_link", &config.entry_link)?,
            entry_title: config
                .entry_title
                .as_deref()
                .map(|s| compile_selector("entry_title", s))
                .transpose()?,
            entry_year: config
                .entry_year
                .as_deref()
                .map(|s| compile_selector("entry_year", s))
                .transpose()?,
        })
    }
}

/// Result of listing one traversal key
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Entries in page order; duplicates are kept
    pub stubs: Vec<EntryStub>,

    /// Matching anchors that could not be turned into stubs
    pub skipped: usize,

    /// Why the page could not be listed, if it could not
    pub failure: Option<String>,
}

impl ListingPage {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Parses entry stubs out of listing markup
///
/// # Arguments
///
/// * `html` - Listing page markup
/// * `page_url` - URL the page was loaded from, for resolving relative links
/// * `selectors` - Compiled listing selectors
/// * `entry_pattern` - Path pattern entry detail links must match
pub fn parse_listing(
    html: &str,
    page_url: &Url,
    selectors: &ListingSelectors,
    entry_pattern: &str,
) -> ListingPage {
    let document = Document::parse(html);
    let mut page = ListingPage::default();

    for anchor in document.query_all(&selectors.entry_link) {
        match parse_anchor(&anchor, page_url, selectors, entry_pattern) {
            Ok(Some(stub)) => page.stubs.push(stub),
            Ok(None) => {}
            Err(skip) => {
                tracing::warn!("Skipping listing anchor on {}: {}", page_url, skip);
                page.skipped += 1;
            }
        }
    }

    page
}

/// Turns one anchor into a stub
///
/// Returns `Ok(None)` for anchors that are not entry links at all.
fn parse_anchor(
    anchor: &ElementRef<'_>,
    page_url: &Url,
    selectors: &ListingSelectors,
    entry_pattern: &str,
) -> Result<Option<EntryStub>, ParseSkip> {
    let Some(href) = anchor.value().attr("href") else {
        return Ok(None);
    };

    let url = match resolve_href(href, page_url) {
        Some(url) => url,
        None if page_url.join(href.trim()).is_err() => {
            return Err(ParseSkip::MalformedHref(href.to_string()))
        }
        None => return Ok(None),
    };

    if !matches_path_pattern(entry_pattern, url.path()) {
        return Ok(None);
    }

    let entry_id =
        entry_id_from_url(&url).ok_or_else(|| ParseSkip::MissingEntryId(url.to_string()))?;

    let title = entry_title(anchor, selectors.entry_title.as_ref());
    if title.is_empty() {
        return Err(ParseSkip::MissingTitle(url.to_string()));
    }

    let year = selectors
        .entry_year
        .as_ref()
        .and_then(|selector| entry_year(anchor, selector));

    Ok(Some(EntryStub {
        entry_id,
        title,
        source_url: url.to_string(),
        year,
    }))
}

/// Title from the title sub-element, else the anchor text, else its title attribute
fn entry_title(anchor: &ElementRef<'_>, selector: Option<&Selector>) -> String {
    if let Some(selector) = selector {
        return anchor
            .select(selector)
            .next()
            .map(|element| element_text(&element))
            .unwrap_or_default();
    }

    let text = element_text(anchor);
    if !text.is_empty() {
        return text;
    }

    anchor
        .value()
        .attr("title")
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Year inside the anchor, or inside the anchor's parent element
fn entry_year(anchor: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let inside = anchor.select(selector).next();
    let beside = || {
        anchor
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.select(selector).next())
    };

    inside
        .or_else(beside)
        .map(|element| element_text(&element))
        .filter(|year| !year.is_empty())
}

/// Fetches and parses listing pages
pub struct ListingExtractor {
    sessions: SessionFactory,
    gate: Arc<RequestGate>,
    base_url: Url,
    listing_path: String,
    entry_pattern: String,
    selectors: ListingSelectors,
    wait_selector: String,
    wait_timeout: Duration,
}

impl ListingExtractor {
    pub fn new(
        config: &Config,
        sessions: SessionFactory,
        gate: Arc<RequestGate>,
    ) -> Result<Self, ReelError> {
        Ok(Self {
            sessions,
            gate,
            base_url: Url::parse(&config.site.base_url)?,
            listing_path: config.site.listing_path.clone(),
            entry_pattern: config.site.entry_path_pattern.clone(),
            selectors: ListingSelectors::compile(&config.selectors)?,
            wait_selector: config.selectors.listing_wait_selector().to_string(),
            wait_timeout: config.session.element_wait_timeout(),
        })
    }

    /// URL of the listing page for `key`
    pub fn listing_url(&self, key: &TraversalKey) -> Result<Url, ReelError> {
        Ok(listing_url(
            &self.base_url,
            &self.listing_path,
            key.as_str(),
        )?)
    }

    /// Lists the entries of one traversal key
    ///
    /// Never fails: an unreachable page or a missing session yields an empty listing
    /// with `failure` set. A page without entry links is an empty listing, not a failure.
    pub async fn fetch_entries(&self, key: &TraversalKey) -> ListingPage {
        let url = match self.listing_url(key) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build listing URL for key {}: {}", key, e);
                return ListingPage::failed(e.to_string());
            }
        };

        let mut session = match self.sessions.acquire().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("No session for listing {}: {}", key, e);
                return ListingPage::failed(e.to_string());
            }
        };

        let loaded = self.load(session.as_mut(), &url).await;
        self.sessions.release(session).await;

        match loaded {
            Ok(snapshot) => parse_listing(
                &snapshot.html,
                &snapshot.url,
                &self.selectors,
                &self.entry_pattern,
            ),
            Err(e) => {
                tracing::warn!("Listing {} for key {} failed: {}", url, key, e);
                ListingPage::failed(e.to_string())
            }
        }
    }

    /// Loads a listing page; a page whose entry links never appear counts as empty
    async fn load(&self, session: &mut dyn Session, url: &Url) -> Result<PageSnapshot, FetchError> {
        self.gate.wait_turn().await;
        let loaded = session.load(url).await?;
        match session.wait_for(&self.wait_selector, self.wait_timeout).await {
            Err(FetchError::ElementWait { .. }) => {
                tracing::debug!("No entry links appeared on {}", url);
                Ok(loaded)
            }
            other => other,
        }
    }
}
