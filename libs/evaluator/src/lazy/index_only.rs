//! Context that serves index-only fields as lazily fetched sets.

use crate::candidates::CandidateSet;
use crate::context::DocumentContext;
use crate::document::Attribute;
use crate::error::{Error, Result};
use crate::index::{FieldIndex, IndexCursor, KeyRange};
use crate::lazy::LazyFetchingSet;
use crate::value::{Value, ValueTuple};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Attributes backing one field's tuples, which only hold weak links to them.
type Retained = Arc<Mutex<Vec<Arc<Attribute>>>>;

struct CachedField {
    set: Arc<LazyFetchingSet<ValueTuple>>,
    retained: Retained,
}

/// Wraps a base context. Index-only fields resolve to a [`LazyFetchingSet`] over the
/// index, limited to the current document's key range.
///
/// Sets are cached per field in a bounded LRU cache scoped to one document; an evicted
/// field is fetched again on its next access. Fetched attributes live as long as their
/// field's cache entry.
pub struct IndexOnlyContext<C> {
    base: C,
    index: Arc<dyn FieldIndex>,
    range: KeyRange,
    index_only: HashSet<String>,
    sets: LruCache<String, CachedField>,
}

impl<C: DocumentContext> IndexOnlyContext<C> {
    pub fn new<I, S>(
        base: C,
        index: Arc<dyn FieldIndex>,
        range: KeyRange,
        index_only: I,
        capacity: NonZeroUsize,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base,
            index,
            range,
            index_only: index_only.into_iter().map(Into::into).collect(),
            sets: LruCache::new(capacity),
        }
    }

    /// Move on to another document, dropping every cached set.
    pub fn reset(&mut self, range: KeyRange) {
        self.range = range;
        self.sets.clear();
    }

    pub fn cached_fields(&self) -> usize {
        self.sets.len()
    }

    fn lazy_set(&mut self, field: &str) -> Arc<LazyFetchingSet<ValueTuple>> {
        if let Some(cached) = self.sets.get(field) {
            return cached.set.clone();
        }
        tracing::trace!(field, "Creating lazy set for index-only field");
        let retained = Retained::default();
        let source = CursorSource {
            cursor: self.index.open(),
            range: self.range.clone(),
            field: field.to_string(),
            sought: false,
            done: false,
            retained: retained.clone(),
        };
        let set = Arc::new(LazyFetchingSet::new(source));
        let cached = CachedField {
            set: set.clone(),
            retained,
        };
        if let Some((evicted, _)) = self.sets.push(field.to_string(), cached) {
            if evicted != field {
                tracing::trace!(field = %evicted, "Evicted index-only field");
            }
        }
        set
    }
}

impl<C: DocumentContext> DocumentContext for IndexOnlyContext<C> {
    fn get(&mut self, field: &str) -> Result<Value> {
        if self.index_only.contains(field) {
            return Ok(Value::Lazy(self.lazy_set(field)));
        }
        self.base.get(field)
    }

    fn set(&mut self, field: &str, value: Value) {
        self.sets.pop(field);
        self.base.set(field, value);
    }

    fn has(&self, field: &str) -> bool {
        self.index_only.contains(field) || self.base.has(field)
    }

    fn clear(&mut self) {
        self.base.clear();
        self.sets.clear();
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn candidates(&self, key: &str) -> Option<Arc<CandidateSet>> {
        self.base.candidates(key)
    }
}

/// Index cursor adapted to the lazy set's element source.
struct CursorSource {
    cursor: Box<dyn IndexCursor>,
    range: KeyRange,
    field: String,
    sought: bool,
    done: bool,
    retained: Retained,
}

impl CursorSource {
    fn advance(&mut self) -> Result<Option<ValueTuple>> {
        if !self.sought {
            self.cursor.seek(&self.range, &self.field)?;
            self.sought = true;
        }
        let Some(entry) = self.cursor.next_entry()? else {
            return Ok(None);
        };
        let attribute = Arc::new(entry.to_attribute());
        let tuple = ValueTuple::from_attribute(&attribute);
        self.retained
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(attribute);
        Ok(Some(tuple))
    }
}

impl Iterator for CursorSource {
    type Item = Result<ValueTuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(tuple)) => Some(Ok(tuple)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(match e {
                    Error::Fetch { .. } => e,
                    other => Error::fetch(&self.field, other.to_string()),
                }))
            }
        }
    }
}
