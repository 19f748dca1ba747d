//! Loaded pages and element queries over them

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// The markup of a loaded page, as served or as rendered
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// URL the page was loaded from (after redirects, when known)
    pub url: Url,

    /// Page markup
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Parses the markup for element queries
    ///
    /// The returned document is not `Send`; parse it inside synchronous code only.
    pub fn document(&self) -> Document {
        Document::parse(&self.html)
    }

    /// Returns true if at least one element matches `selector`
    pub fn contains(&self, selector: &Selector) -> bool {
        self.document().query_one(selector).is_some()
    }
}

/// Parsed page with element queries
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn query_all<'a>(&'a self, selector: &'a Selector) -> Vec<ElementRef<'a>> {
        self.html.select(selector).collect()
    }

    /// First element matching `selector`
    pub fn query_one<'a>(&'a self, selector: &'a Selector) -> Option<ElementRef<'a>> {
        self.html.select(selector).next()
    }
}

/// Text content of an element with whitespace runs collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
