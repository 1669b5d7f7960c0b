//! Index access for on-demand field fetches
//!
//! The evaluator does not own storage. It reads index-only fields through [`FieldIndex`],
//! which hands out seekable cursors over entries sorted by (document, field, value).
//! [`MemoryIndex`] is a `BTreeMap`-backed implementation.

use crate::document::Attribute;
use crate::error::Result;
use crate::value::Scalar;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Sort key of an index entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey {
    pub document: String,
    pub field: String,
    pub value: String,
}

/// Key range a cursor is limited to. The start is inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
    pub end_inclusive: bool,
}

impl KeyRange {
    /// Range covering exactly one document.
    pub fn document(id: &str) -> Self {
        Self {
            start: id.to_string(),
            end: id.to_string(),
            end_inclusive: true,
        }
    }

    pub fn contains(&self, document: &str) -> bool {
        document >= self.start.as_str()
            && if self.end_inclusive {
                document <= self.end.as_str()
            } else {
                document < self.end.as_str()
            }
    }
}

/// One stored occurrence of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub document: String,
    pub field: String,
    pub normalized: Scalar,
    pub raw: Scalar,
    pub visibility: Arc<str>,
}

impl IndexEntry {
    pub fn to_attribute(&self) -> Attribute {
        Attribute::new(self.field.as_str(), self.normalized.clone(), self.raw.clone())
            .with_visibility(self.visibility.clone())
    }
}

/// Source of index cursors.
pub trait FieldIndex: Send + Sync {
    fn open(&self) -> Box<dyn IndexCursor>;
}

/// Incremental reader over a sorted index.
pub trait IndexCursor: Send {
    /// Position the cursor on the first entry of `field` within `range`.
    fn seek(&mut self, range: &KeyRange, field: &str) -> Result<()>;

    /// Next entry within the sought range and field, or `None` when exhausted.
    fn next_entry(&mut self) -> Result<Option<IndexEntry>>;
}

/// Sorted in-memory index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    entries: Arc<BTreeMap<IndexKey, IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: IndexEntry) {
        let key = IndexKey {
            document: entry.document.clone(),
            field: entry.field.clone(),
            value: entry.normalized.to_string(),
        };
        Arc::make_mut(&mut self.entries).insert(key, entry);
    }

    /// Add a field occurrence with empty visibility.
    pub fn with_entry(
        mut self,
        document: &str,
        field: &str,
        normalized: impl Into<Scalar>,
        raw: impl Into<Scalar>,
    ) -> Self {
        self.insert(IndexEntry {
            document: document.to_string(),
            field: field.to_string(),
            normalized: normalized.into(),
            raw: raw.into(),
            visibility: Arc::from(""),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FieldIndex for MemoryIndex {
    fn open(&self) -> Box<dyn IndexCursor> {
        Box::new(MemoryCursor {
            entries: self.entries.clone(),
            range: None,
            field: String::new(),
            last: None,
        })
    }
}

/// Cursor that resumes after the last key it returned.
struct MemoryCursor {
    entries: Arc<BTreeMap<IndexKey, IndexEntry>>,
    range: Option<KeyRange>,
    field: String,
    last: Option<IndexKey>,
}

impl IndexCursor for MemoryCursor {
    fn seek(&mut self, range: &KeyRange, field: &str) -> Result<()> {
        self.range = Some(range.clone());
        self.field = field.to_string();
        self.last = None;
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<IndexEntry>> {
        let Some(range) = &self.range else {
            return Ok(None);
        };

        let lower = match &self.last {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Included(IndexKey {
                document: range.start.clone(),
                field: String::new(),
                value: String::new(),
            }),
        };

        for (key, entry) in self.entries.range((lower, Bound::Unbounded)) {
            if !range.contains(&key.document) {
                if key.document.as_str() > range.end.as_str() {
                    break;
                }
                continue;
            }
            if key.field != self.field {
                continue;
            }
            self.last = Some(key.clone());
            return Ok(Some(entry.clone()));
        }

        self.range = None;
        Ok(None)
    }
}
