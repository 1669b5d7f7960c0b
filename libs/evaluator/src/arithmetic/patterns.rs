//! Compiled regex cache shared across evaluations.

use crate::error::{Error, Result};
use lru::LruCache;
use regex::{Regex, RegexBuilder};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Bounded LRU cache of compiled patterns, keyed by pattern text.
///
/// Patterns are compiled case-insensitive with dot-all and multi-line semantics and must
/// match the whole value.
pub struct PatternCache {
    cache: Mutex<LruCache<String, Arc<Regex>>>,
}

impl PatternCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, pattern: &str) -> Result<Arc<Regex>> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(regex) = cache.get(pattern) {
                return Ok(regex.clone());
            }
        }

        tracing::trace!(pattern, "Compiling regex pattern");
        let regex = RegexBuilder::new(&format!(r"\A(?:{})\z", pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .multi_line(true)
            .build()
            .map_err(|e| {
                tracing::warn!(pattern, error = %e, "Invalid regex pattern");
                Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                }
            })?;
        let regex = Arc::new(regex);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> PatternCache {
        PatternCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_whole_value_case_insensitive_dotall() {
        let patterns = cache(4);
        let regex = patterns.get("f.o").unwrap();
        assert!(regex.is_match("foo"));
        assert!(regex.is_match("fOo"));
        assert!(regex.is_match("f\no"));
        assert!(!regex.is_match("xfoo"));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let patterns = cache(2);
        patterns.get("a").unwrap();
        patterns.get("b").unwrap();
        patterns.get("a").unwrap();
        patterns.get("c").unwrap();
        assert_eq!(patterns.len(), 2);
        let inner = patterns.cache.lock().unwrap();
        assert!(inner.contains("a"));
        assert!(!inner.contains("b"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = cache(2).get("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
