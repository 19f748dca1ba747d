/// Checks if a URL path matches an entry path pattern
///
/// Patterns are split on `/` and compared segment by segment:
/// 1. A literal segment must match exactly
/// 2. `*` matches any single non-empty segment
/// 3. A trailing `*` matches one or more remaining segments
///
/// Empty segments (from doubled or trailing slashes) are ignored on the path side.
///
/// # Examples
///
/// ```
/// use reel_tracks::url::matches_path_pattern;
///
/// assert!(matches_path_pattern("/Movies/Soundtrack/*", "/Movies/Soundtrack/12/Alpha"));
/// assert!(matches_path_pattern("/movie/*/songs", "/movie/alpha/songs"));
/// assert!(!matches_path_pattern("/Movies/Soundtrack/*", "/Movies/Soundtrack/"));
/// assert!(!matches_path_pattern("/movie/*/songs", "/movie/alpha/cast"));
/// ```
pub fn matches_path_pattern(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (index, expected) in pattern_segments.iter().enumerate() {
        let is_last = index + 1 == pattern_segments.len();

        match path_segments.get(index) {
            None => return false,
            Some(_) if *expected == "*" && is_last => return true,
            Some(_) if *expected == "*" => continue,
            Some(actual) if actual == expected => continue,
            Some(_) => return false,
        }
    }

    path_segments.len() == pattern_segments.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_path_pattern("/entry", "/entry"));
        assert!(matches_path_pattern("/entry/", "/entry"));
        assert!(matches_path_pattern("/entry", "/entry/"));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!matches_path_pattern("/entry", "/entries"));
        assert!(!matches_path_pattern("/entry", "/entry/1"));
        assert!(!matches_path_pattern("/entry/1", "/entry"));
    }

    #[test]
    fn test_trailing_wildcard_needs_a_segment() {
        assert!(matches_path_pattern("/Movies/Soundtrack/*", "/Movies/Soundtrack/1"));
        assert!(!matches_path_pattern("/Movies/Soundtrack/*", "/Movies/Soundtrack"));
    }

    #[test]
    fn test_trailing_wildcard_matches_nested_segments() {
        assert!(matches_path_pattern(
            "/Movies/Soundtrack/*",
            "/Movies/Soundtrack/1/Alpha/extra"
        ));
    }

    #[test]
    fn test_inner_wildcard_matches_one_segment() {
        assert!(matches_path_pattern("/movie/*/songs", "/movie/x/songs"));
        assert!(!matches_path_pattern("/movie/*/songs", "/movie/x/y/songs"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches_path_pattern("/Movies/*", "/movies/1"));
    }

    #[test]
    fn test_other_sections_rejected() {
        assert!(!matches_path_pattern("/Movies/Soundtrack/*", "/TV/Soundtrack/1"));
        assert!(!matches_path_pattern("/Movies/Soundtrack/*", "/"));
    }
}
