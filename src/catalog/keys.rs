use crate::ReelError;
use serde::Deserialize;
use std::fmt;

/// One listing shard of the catalog (a letter, a page number, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraversalKey(String);

impl TraversalKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraversalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The finite, ordered set of traversal keys for a crawl
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum KeySpace {
    /// Letter-indexed listings, inclusive range
    Letters {
        #[serde(default = "default_first_letter")]
        from: char,
        #[serde(default = "default_last_letter")]
        to: char,
    },

    /// Page-numbered listings, inclusive range
    Pages { first: u32, last: u32 },

    /// Explicit tokens, used in the given order
    List { values: Vec<String> },
}

fn default_first_letter() -> char {
    'A'
}

fn default_last_letter() -> char {
    'Z'
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::Letters {
            from: default_first_letter(),
            to: default_last_letter(),
        }
    }
}

impl KeySpace {
    /// Enumerates every key up front
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TraversalKey>)` - The ordered keys
    /// * `Err(ReelError::Traversal)` - The key space is malformed; a crawl cannot start
    pub fn enumerate(&self) -> Result<Vec<TraversalKey>, ReelError> {
        match self {
            Self::Letters { from, to } => {
                if !from.is_ascii_alphabetic() || !to.is_ascii_alphabetic() {
                    return Err(ReelError::Traversal(format!(
                        "letter range must use ASCII letters, got {}..{}",
                        from, to
                    )));
                }
                if from.is_ascii_uppercase() != to.is_ascii_uppercase() {
                    return Err(ReelError::Traversal(format!(
                        "letter range must not mix cases, got {}..{}",
                        from, to
                    )));
                }
                if from > to {
                    return Err(ReelError::Traversal(format!(
                        "letter range is reversed: {}..{}",
                        from, to
                    )));
                }
                Ok((*from..=*to)
                    .map(|c| TraversalKey::new(c.to_string()))
                    .collect())
            }

            Self::Pages { first, last } => {
                if *first == 0 {
                    return Err(ReelError::Traversal(
                        "page numbers start at 1".to_string(),
                    ));
                }
                if first > last {
                    return Err(ReelError::Traversal(format!(
                        "page range is reversed: {}..{}",
                        first, last
                    )));
                }
                Ok((*first..=*last)
                    .map(|page| TraversalKey::new(page.to_string()))
                    .collect())
            }

            Self::List { values } => {
                if values.is_empty() {
                    return Err(ReelError::Traversal("key list is empty".to_string()));
                }
                values
                    .iter()
                    .map(|value| {
                        let trimmed = value.trim();
                        if trimmed.is_empty() {
                            Err(ReelError::Traversal(
                                "key list contains a blank value".to_string(),
                            ))
                        } else {
                            Ok(TraversalKey::new(trimmed))
                        }
                    })
                    .collect()
            }
        }
    }

    /// Enumerates the keys, narrowed to `only` when given
    ///
    /// Enumeration order is kept. Every requested key must exist in the space.
    pub fn select(&self, only: Option<&[String]>) -> Result<Vec<TraversalKey>, ReelError> {
        let keys = self.enumerate()?;
        let Some(only) = only else {
            return Ok(keys);
        };

        let unknown: Vec<&str> = only
            .iter()
            .map(String::as_str)
            .filter(|wanted| !keys.iter().any(|key| key.as_str() == *wanted))
            .collect();
        if !unknown.is_empty() {
            return Err(ReelError::Traversal(format!(
                "requested key(s) not in the key space: {}",
                unknown.join(", ")
            )));
        }

        Ok(keys
            .into_iter()
            .filter(|key| only.iter().any(|wanted| wanted == key.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(space: &KeySpace) -> Vec<String> {
        space
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_default_is_full_alphabet() {
        let all = keys(&KeySpace::default());
        assert_eq!(all.len(), 26);
        assert_eq!(all.first().map(String::as_str), Some("A"));
        assert_eq!(all.last().map(String::as_str), Some("Z"));
    }

    #[test]
    fn test_letter_subrange() {
        let space = KeySpace::Letters { from: 'C', to: 'E' };
        assert_eq!(keys(&space), vec!["C", "D", "E"]);
    }

    #[test]
    fn test_reversed_letters_fail() {
        let space = KeySpace::Letters { from: 'Z', to: 'A' };
        assert!(matches!(space.enumerate(), Err(ReelError::Traversal(_))));
    }

    #[test]
    fn test_mixed_case_letters_fail() {
        let space = KeySpace::Letters { from: 'a', to: 'Z' };
        assert!(space.enumerate().is_err());
    }

    #[test]
    fn test_pages() {
        let space = KeySpace::Pages { first: 1, last: 5 };
        assert_eq!(keys(&space), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_page_zero_fails() {
        let space = KeySpace::Pages { first: 0, last: 2 };
        assert!(space.enumerate().is_err());
    }

    #[test]
    fn test_list_preserves_order() {
        let space = KeySpace::List {
            values: vec!["0-9".to_string(), "Q".to_string(), " B ".to_string()],
        };
        assert_eq!(keys(&space), vec!["0-9", "Q", "B"]);
    }

    #[test]
    fn test_empty_list_fails() {
        let space = KeySpace::List { values: vec![] };
        assert!(space.enumerate().is_err());
    }

    #[test]
    fn test_select_keeps_enumeration_order() {
        let space = KeySpace::Letters { from: 'A', to: 'E' };
        let only = vec!["D".to_string(), "B".to_string()];

        let selected = space.select(Some(&only)).unwrap();

        assert_eq!(selected, vec![TraversalKey::new("B"), TraversalKey::new("D")]);
        assert_eq!(space.select(None).unwrap().len(), 5);
    }

    #[test]
    fn test_select_rejects_unknown_keys() {
        let space = KeySpace::Letters { from: 'A', to: 'E' };
        let only = vec!["B".to_string(), "Q".to_string(), "7".to_string()];

        let err = space.select(Some(&only)).unwrap_err();

        assert!(matches!(err, ReelError::Traversal(_)));
        let message = err.to_string();
        assert!(message.contains("Q, 7"));
        assert!(!message.contains("B,"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let space: KeySpace = toml::from_str("kind = \"letters\"\nfrom = \"X\"").unwrap();
        assert_eq!(space, KeySpace::Letters { from: 'X', to: 'Z' });

        let space: KeySpace = toml::from_str("kind = \"pages\"\nfirst = 1\nlast = 3").unwrap();
        assert_eq!(space, KeySpace::Pages { first: 1, last: 3 });
    }
}
