//! Detail page extraction
//!
//! A detail page carries the canonical entry title in a heading and a flat run of
//! song markup below it: each song title element is followed, somewhere among its
//! next siblings, by the artist element belonging to it.

use crate::catalog::NestedRecord;
use crate::config::{Config, SelectorConfig};
use crate::crawler::pacing::RequestGate;
use crate::crawler::{compile_selector, ParseSkip};
use crate::session::{element_text, Document, FetchError, PageSnapshot, Session, SessionFactory};
use crate::ReelError;
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Compiled detail selectors
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub heading: Selector,
    pub record_title: Selector,
    pub record_artist: Selector,
    pub title_suffix: String,
    pub id_attribute: String,
}

impl DetailSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ReelError> {
        Ok(Self {
            heading: compile_selector("heading", &config.heading)?,
            record_title: compile_selector("record_title", &config.record_title)?,
            record_artist: compile_selector("record_artist", &config.record_artist)?,
            title_suffix: config.title_suffix.clone(),
            id_attribute: config.record_id_attribute.clone(),
        })
    }
}

/// Result of extracting one detail page
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    /// Heading text with the configured suffix removed
    pub parent_title: Option<String>,

    /// Songs in page order
    pub records: Vec<NestedRecord>,

    /// Song title elements that could not be turned into records
    pub skipped: usize,

    /// Why the page yielded nothing, if it could not be read
    pub failure: Option<String>,
}

impl DetailPage {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Extracts the canonical title and songs from detail markup
///
/// A page without a non-empty heading yields no records at all, since every record
/// carries the heading as its parent title.
pub fn parse_detail(html: &str, selectors: &DetailSelectors) -> DetailPage {
    let document = Document::parse(html);

    let heading = document
        .query_one(&selectors.heading)
        .map(|element| element_text(&element))
        .unwrap_or_default();
    if heading.is_empty() {
        return DetailPage::failed("detail page has no title heading");
    }
    let parent_title = strip_suffix(&heading, &selectors.title_suffix);

    let mut page = DetailPage {
        parent_title: Some(parent_title.clone()),
        ..DetailPage::default()
    };

    for title_element in document.query_all(&selectors.record_title) {
        match parse_record(&title_element, &parent_title, selectors) {
            Ok(record) => page.records.push(record),
            Err(skip) => {
                tracing::warn!("Skipping song on '{}': {}", parent_title, skip);
                page.skipped += 1;
            }
        }
    }

    page
}

/// Removes the configured suffix exactly as given, keeping the heading if nothing remains
fn strip_suffix(heading: &str, suffix: &str) -> String {
    let heading = heading.trim();
    if suffix.is_empty() {
        return heading.to_string();
    }
    match heading.strip_suffix(suffix).map(str::trim) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => heading.to_string(),
    }
}

fn parse_record(
    title_element: &ElementRef<'_>,
    parent_title: &str,
    selectors: &DetailSelectors,
) -> Result<NestedRecord, ParseSkip> {
    let title = element_text(title_element);
    if title.is_empty() {
        return Err(ParseSkip::EmptyRecordTitle);
    }

    let artist = find_artist(title_element, selectors)
        .map(|element| element_text(&element))
        .filter(|artist| !artist.is_empty())
        .ok_or_else(|| ParseSkip::MissingArtist {
            title: title.clone(),
        })?;

    let source_id = record_id(title_element, &selectors.id_attribute);

    Ok(NestedRecord::new(
        source_id,
        title,
        artist,
        parent_title,
    ))
}

/// First artist element among the following siblings of a title
///
/// The scan stops at the next song title so one song never borrows the artist of
/// the song after it.
fn find_artist<'a>(
    title_element: &ElementRef<'a>,
    selectors: &DetailSelectors,
) -> Option<ElementRef<'a>> {
    for sibling in title_element.next_siblings().filter_map(ElementRef::wrap) {
        if selectors.record_title.matches(&sibling)
            || sibling.select(&selectors.record_title).next().is_some()
        {
            return None;
        }
        if selectors.record_artist.matches(&sibling) {
            return Some(sibling);
        }
        if let Some(artist) = sibling.select(&selectors.record_artist).next() {
            return Some(artist);
        }
    }
    None
}

fn record_id<'a>(title_element: &ElementRef<'a>, attribute: &str) -> Option<&'a str> {
    title_element.value().attr(attribute).or_else(|| {
        title_element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr(attribute))
    })
}

/// Fetches and parses detail pages
pub struct DetailExtractor {
    sessions: SessionFactory,
    gate: Arc<RequestGate>,
    selectors: DetailSelectors,
    wait_selector: String,
    wait_timeout: Duration,
}

impl DetailExtractor {
    pub fn new(
        config: &Config,
        sessions: SessionFactory,
        gate: Arc<RequestGate>,
    ) -> Result<Self, ReelError> {
        Ok(Self {
            sessions,
            gate,
            selectors: DetailSelectors::compile(&config.selectors)?,
            wait_selector: config.selectors.heading.clone(),
            wait_timeout: config.session.element_wait_timeout(),
        })
    }

    /// Extracts the songs of one entry
    ///
    /// Never fails: load errors and missing headings yield an empty page with
    /// `failure` set.
    pub async fn fetch_records(&self, source_url: &str) -> DetailPage {
        let url = match Url::parse(source_url) {
            Ok(url) => url,
            Err(e) => return DetailPage::failed(format!("invalid detail URL: {}", e)),
        };

        let mut session = match self.sessions.acquire().await {
            Ok(session) => session,
            Err(e) => return DetailPage::failed(e.to_string()),
        };

        let loaded = self.load(session.as_mut(), &url).await;
        self.sessions.release(session).await;

        match loaded {
            Ok(snapshot) => parse_detail(&snapshot.html, &self.selectors),
            Err(e) => {
                tracing::warn!("Detail page {} failed: {}", url, e);
                DetailPage::failed(e.to_string())
            }
        }
    }

    async fn load(&self, session: &mut dyn Session, url: &Url) -> Result<PageSnapshot, FetchError> {
        self.gate.wait_turn().await;
        session.load(url).await?;
        session.wait_for(&self.wait_selector, self.wait_timeout).await
    }
}
