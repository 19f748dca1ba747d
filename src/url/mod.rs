//! URL handling module for Reel-Tracks
//!
//! This module builds listing URLs from the configured template, resolves entry links
//! found on listing pages and derives entry ids from detail URLs.

mod matcher;

pub use matcher::matches_path_pattern;

use url::Url;

/// Placeholder replaced by the traversal key in the listing path template
pub const LISTING_KEY_PLACEHOLDER: &str = "{key}";

/// Builds the listing URL for one traversal key
///
/// # Arguments
///
/// * `base` - The catalog base URL
/// * `template` - Listing path template containing `{key}`
/// * `key` - The traversal key
///
/// # Examples
///
/// ```
/// use reel_tracks::url::listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com").unwrap();
/// let url = listing_url(&base, "/Movies/browse/{key}", "B").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/Movies/browse/B");
/// ```
pub fn listing_url(base: &Url, template: &str, key: &str) -> Result<Url, url::ParseError> {
    base.join(&template.replace(LISTING_KEY_PLACEHOLDER, &encode_key(key)))
}

/// Percent-encodes a traversal key so it stays one path segment or query value
///
/// Only ASCII alphanumerics and `*-._` are left as is; spaces become `%20`.
fn encode_key(key: &str) -> String {
    url::form_urlencoded::byte_serialize(key.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: and data: schemes
/// - fragment-only links
/// - hrefs that do not resolve against the page URL
pub fn resolve_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = page_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Derives an entry id from the last non-empty path segment of a detail URL
///
/// # Examples
///
/// ```
/// use reel_tracks::url::entry_id_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://www.example.com/Movies/Soundtrack/1234/").unwrap();
/// assert_eq!(entry_id_from_url(&url), Some("1234".to_string()));
/// ```
pub fn entry_id_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://www.example.com/Movies/browse/A").unwrap()
    }

    #[test]
    fn test_listing_url_replaces_key() {
        let base = Url::parse("https://www.example.com/").unwrap();
        let url = listing_url(&base, "/browse/date_desc/{key}", "3").unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/browse/date_desc/3");
    }

    #[test]
    fn test_listing_url_keeps_query_template() {
        let base = Url::parse("https://www.example.com/").unwrap();
        let url = listing_url(&base, "/browse?letter={key}", "Q").unwrap();
        assert_eq!(url.query(), Some("letter=Q"));
    }

    #[test]
    fn test_listing_url_encodes_reserved_keys() {
        let base = Url::parse("https://www.example.com").unwrap();

        let url = listing_url(&base, "/Movies/browse/{key}", "#").unwrap();
        assert_eq!(url.path(), "/Movies/browse/%23");
        assert_eq!(url.fragment(), None);

        let url = listing_url(&base, "/Movies/browse/{key}", "A?B").unwrap();
        assert_eq!(url.path(), "/Movies/browse/A%3FB");
        assert_eq!(url.query(), None);

        let url = listing_url(&base, "/Movies/browse/{key}", "0/9").unwrap();
        assert_eq!(url.path(), "/Movies/browse/0%2F9");

        let url = listing_url(&base, "/Movies/browse/{key}", "A B+").unwrap();
        assert_eq!(url.path(), "/Movies/browse/A%20B%2B");

        let url = listing_url(&base, "/Movies/browse/{key}", "0-9").unwrap();
        assert_eq!(url.path(), "/Movies/browse/0-9");
    }

    #[test]
    fn test_resolve_relative_href() {
        let url = resolve_href("/Movies/Soundtrack/12/Alpha", &page()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.example.com/Movies/Soundtrack/12/Alpha"
        );
    }

    #[test]
    fn test_resolve_absolute_href() {
        let url = resolve_href("https://other.com/x", &page()).unwrap();
        assert_eq!(url.host_str(), Some("other.com"));
    }

    #[test]
    fn test_skip_special_hrefs() {
        assert!(resolve_href("javascript:void(0)", &page()).is_none());
        assert!(resolve_href("mailto:a@example.com", &page()).is_none());
        assert!(resolve_href("tel:+1", &page()).is_none());
        assert!(resolve_href("data:text/html,x", &page()).is_none());
        assert!(resolve_href("#top", &page()).is_none());
        assert!(resolve_href("   ", &page()).is_none());
        assert!(resolve_href("ftp://example.com/file", &page()).is_none());
    }

    #[test]
    fn test_entry_id_from_url() {
        let url = Url::parse("https://www.example.com/Movies/Soundtrack/98/Alpha").unwrap();
        assert_eq!(entry_id_from_url(&url), Some("Alpha".to_string()));

        let url = Url::parse("https://www.example.com/Movies/Soundtrack/98?x=1").unwrap();
        assert_eq!(entry_id_from_url(&url), Some("98".to_string()));
    }

    #[test]
    fn test_entry_id_missing_for_root() {
        let url = Url::parse("https://www.example.com/").unwrap();
        assert_eq!(entry_id_from_url(&url), None);
    }
}
