//! Engine and per-evaluation options

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;

const DEFAULT_PATTERN_CACHE_CAPACITY: usize = 1000;
const DEFAULT_LAZY_FIELD_CACHE_CAPACITY: usize = 64;

/// Settings for a long-lived [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of compiled regex patterns kept.
    pub pattern_cache_capacity: usize,
    /// Maximum number of index-only lazy sets held per document evaluation.
    pub lazy_field_cache_capacity: usize,
    /// If `true`, identifiers the context cannot resolve raise instead of yielding null.
    pub strict: bool,
    /// If `true`, hit-recording comparisons record every matching value, not just the first.
    pub exhaustive_hits: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pattern_cache_capacity: DEFAULT_PATTERN_CACHE_CAPACITY,
            lazy_field_cache_capacity: DEFAULT_LAZY_FIELD_CACHE_CAPACITY,
            strict: false,
            exhaustive_hits: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pattern_capacity()?;
        self.lazy_field_capacity()?;
        Ok(())
    }

    pub fn pattern_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.pattern_cache_capacity)
            .ok_or_else(|| Error::Config("pattern_cache_capacity must be positive".to_string()))
    }

    pub fn lazy_field_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.lazy_field_cache_capacity)
            .ok_or_else(|| Error::Config("lazy_field_cache_capacity must be positive".to_string()))
    }
}

/// Options for a single evaluation.
#[derive(Clone, Debug, Default)]
pub struct EvalOptions {
    /// Overrides [`EngineConfig::strict`] when set.
    pub strict: Option<bool>,
    /// Fields the document may hold only partially. Only used by partial evaluation.
    pub incomplete_fields: HashSet<String>,
}

impl EvalOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn incomplete<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incomplete_fields.extend(fields.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json_str(r#"{"strict": true}"#).unwrap();
        assert!(config.strict);
        assert_eq!(config.pattern_cache_capacity, 1000);
        assert_eq!(config.lazy_field_cache_capacity, 64);
        assert!(!config.exhaustive_hits);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = EngineConfig::from_json_str(r#"{"pattern_cache_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
