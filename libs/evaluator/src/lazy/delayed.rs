//! Context that fetches delayed fields from the index on first access.

use crate::candidates::CandidateSet;
use crate::context::{merge_tuple, DocumentContext};
use crate::document::Attribute;
use crate::error::{Error, Result};
use crate::index::{FieldIndex, KeyRange};
use crate::value::{Value, ValueTuple};
use std::collections::HashSet;
use std::sync::Arc;

/// Wraps a base context. A delayed field is fetched from the index within the current
/// document's key range the first time it is read, merged into the base context, and never
/// fetched again for this document.
pub struct DelayedFieldContext<C> {
    base: C,
    index: Arc<dyn FieldIndex>,
    range: KeyRange,
    delayed: HashSet<String>,
    fetched: HashSet<String>,
    // Fetched tuples only hold weak references to these.
    attributes: Vec<Arc<Attribute>>,
}

impl<C: DocumentContext> DelayedFieldContext<C> {
    pub fn new<I, S>(base: C, index: Arc<dyn FieldIndex>, range: KeyRange, delayed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base,
            index,
            range,
            delayed: delayed.into_iter().map(Into::into).collect(),
            fetched: HashSet::new(),
            attributes: Vec::new(),
        }
    }

    pub fn base(&self) -> &C {
        &self.base
    }

    pub fn is_fetched(&self, field: &str) -> bool {
        self.fetched.contains(field)
    }

    /// Move on to another document: new key range, nothing fetched yet.
    pub fn reset(&mut self, range: KeyRange) {
        self.range = range;
        self.fetched.clear();
        self.attributes.clear();
    }

    fn fetch(&mut self, field: &str) -> Result<()> {
        let wrap = |e: Error| match e {
            Error::Fetch { .. } => e,
            other => Error::fetch(field, other.to_string()),
        };

        let mut cursor = self.index.open();
        cursor.seek(&self.range, field).map_err(wrap)?;

        let mut value = self.base.get(field)?;
        let mut entries = 0usize;
        while let Some(entry) = cursor.next_entry().map_err(wrap)? {
            let attribute = Arc::new(entry.to_attribute());
            value = merge_tuple(value, ValueTuple::from_attribute(&attribute));
            self.attributes.push(attribute);
            entries += 1;
        }
        if entries > 0 {
            self.base.set(field, value);
        }

        self.fetched.insert(field.to_string());
        tracing::debug!(field, entries, "Fetched delayed field");
        Ok(())
    }
}

impl<C: DocumentContext> DocumentContext for DelayedFieldContext<C> {
    fn get(&mut self, field: &str) -> Result<Value> {
        if self.delayed.contains(field) && !self.fetched.contains(field) {
            self.fetch(field)?;
        }
        self.base.get(field)
    }

    fn set(&mut self, field: &str, value: Value) {
        self.base.set(field, value);
    }

    fn has(&self, field: &str) -> bool {
        self.base.has(field) || self.delayed.contains(field)
    }

    fn clear(&mut self) {
        self.base.clear();
        self.fetched.clear();
        self.attributes.clear();
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn candidates(&self, key: &str) -> Option<Arc<CandidateSet>> {
        self.base.candidates(key)
    }
}
