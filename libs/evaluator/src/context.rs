//! Document contexts
//!
//! A context maps field names to the values a document holds for them. Implementations
//! compose by delegation: the lazy contexts in [`crate::lazy`] wrap a base context and
//! materialize expensive fields on demand.

use crate::candidates::CandidateSet;
use crate::error::Result;
use crate::functional_set::FunctionalSet;
use crate::value::{Value, ValueTuple};
use std::collections::HashMap;
use std::sync::Arc;

/// Field lookup for one document evaluation.
pub trait DocumentContext {
    /// Value held for `field`, or [`Value::Null`] if the document has none.
    ///
    /// Takes `&mut self` because lazy implementations fetch on first access.
    fn get(&mut self, field: &str) -> Result<Value>;

    fn set(&mut self, field: &str, value: Value);

    fn has(&self, field: &str) -> bool;

    fn clear(&mut self);

    fn size(&self) -> usize;

    /// Candidate set registered under `key` for threshold-marker evaluation.
    fn candidates(&self, _key: &str) -> Option<Arc<CandidateSet>> {
        None
    }
}

/// Plain map-backed context.
#[derive(Debug, Default)]
pub struct MapContext {
    values: HashMap<String, Value>,
    candidates: HashMap<String, Arc<CandidateSet>>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    pub fn with_candidates(mut self, key: &str, candidates: CandidateSet) -> Self {
        self.candidates.insert(key.to_string(), Arc::new(candidates));
        self
    }

    pub fn insert_candidates(&mut self, key: &str, candidates: Arc<CandidateSet>) {
        self.candidates.insert(key.to_string(), candidates);
    }

    /// Add one occurrence of the tuple's field, promoting to a set on the second occurrence.
    pub fn add_tuple(&mut self, tuple: ValueTuple) {
        let field = tuple.field().to_string();
        let existing = self.values.remove(&field).unwrap_or(Value::Null);
        self.values.insert(field, merge_tuple(existing, tuple));
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl DocumentContext for MapContext {
    fn get(&mut self, field: &str) -> Result<Value> {
        Ok(self.values.get(field).cloned().unwrap_or(Value::Null))
    }

    fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    fn clear(&mut self) {
        self.values.clear();
        self.candidates.clear();
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn candidates(&self, key: &str) -> Option<Arc<CandidateSet>> {
        self.candidates.get(key).cloned()
    }
}

/// Merge one more occurrence into the value already held for a field.
pub fn merge_tuple(existing: Value, tuple: ValueTuple) -> Value {
    match existing {
        Value::Null | Value::Scalar(_) => Value::Tuple(tuple),
        Value::Tuple(first) if first == tuple => Value::Tuple(first),
        Value::Tuple(first) => {
            let mut set = FunctionalSet::singleton(first);
            set.insert(tuple);
            Value::Set(set)
        }
        Value::Set(mut set) => {
            set.insert(tuple);
            Value::Set(set)
        }
        Value::Lazy(lazy) => {
            lazy.insert(tuple);
            Value::Lazy(lazy)
        }
    }
}
