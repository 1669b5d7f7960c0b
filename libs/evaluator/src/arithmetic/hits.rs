//! Hit recording
//!
//! A [`HitRecorder`] belongs to exactly one evaluation. It collects every tuple that took
//! part in a positive comparison so the caller can report why a document matched.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::value::ValueTuple;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct HitRecorder {
    hits: HashSet<ValueTuple>,
    exhaustive: bool,
}

impl HitRecorder {
    pub fn new(exhaustive: bool) -> Self {
        Self {
            hits: HashSet::new(),
            exhaustive,
        }
    }

    /// Empty recorder with the same settings.
    pub fn fresh(&self) -> Self {
        Self::new(self.exhaustive)
    }

    /// In exhaustive mode comparisons scan every element and record each match; otherwise
    /// the first match wins.
    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }

    pub fn record(&mut self, tuple: ValueTuple) {
        self.hits.insert(tuple);
    }

    pub fn extend<I: IntoIterator<Item = ValueTuple>>(&mut self, tuples: I) {
        self.hits.extend(tuples);
    }

    pub fn tuples(&self) -> &HashSet<ValueTuple> {
        &self.hits
    }

    /// Hits as sorted `field:value` terms.
    pub fn hit_set(&self) -> BTreeSet<String> {
        self.hits.iter().map(ValueTuple::hit_term).collect()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Visibility marking of the attribute a reported hit term came from.
///
/// `term` is `field:value`; the value is compared against the raw and then the normalized
/// form of each attribute of that field. Returns `Ok(None)` if no attribute matches.
pub fn column_visibility_for_hit(document: &Document, term: &str) -> Result<Option<Arc<str>>> {
    let (field, value) = term
        .split_once(':')
        .ok_or_else(|| Error::InvalidHitTerm(term.to_string()))?;
    if field.is_empty() {
        return Err(Error::InvalidHitTerm(term.to_string()));
    }

    let visibility = document
        .attributes_for(field)
        .find(|a| a.raw.to_string() == value)
        .or_else(|| {
            document
                .attributes_for(field)
                .find(|a| a.normalized.to_string() == value)
        })
        .map(|a| a.visibility.clone());
    Ok(visibility)
}
