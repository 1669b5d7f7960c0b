//! Set-valued truth
//!
//! A [`FunctionalSet`] stands in for a boolean: empty means false, non-empty means true and
//! the members are the evidence that made the sub-expression true.

use crate::value::ValueTuple;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

/// Size past which membership checks go through a hash index instead of a scan.
const INDEX_THRESHOLD: usize = 16;

/// Deduplicated collection of [`ValueTuple`]s, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FunctionalSet {
    tuples: SmallVec<[ValueTuple; 4]>,
    index: Option<HashSet<ValueTuple>>,
}

impl FunctionalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(tuple: ValueTuple) -> Self {
        let mut set = Self::new();
        set.tuples.push(tuple);
        set
    }

    /// Insert a tuple; returns `false` if an identical tuple was already present.
    pub fn insert(&mut self, tuple: ValueTuple) -> bool {
        match &mut self.index {
            Some(index) => {
                if !index.insert(tuple.clone()) {
                    return false;
                }
            }
            None => {
                if self.tuples.contains(&tuple) {
                    return false;
                }
                if self.tuples.len() >= INDEX_THRESHOLD {
                    let mut index: HashSet<ValueTuple> = self.tuples.iter().cloned().collect();
                    index.insert(tuple.clone());
                    self.index = Some(index);
                }
            }
        }
        self.tuples.push(tuple);
        true
    }

    pub fn extend<I: IntoIterator<Item = ValueTuple>>(&mut self, tuples: I) {
        for tuple in tuples {
            self.insert(tuple);
        }
    }

    /// OR: every tuple of either side.
    pub fn union(&self, other: &FunctionalSet) -> FunctionalSet {
        let mut result = self.clone();
        result.extend(other.iter().cloned());
        result
    }

    /// AND: `None` (false) as soon as either side is empty, otherwise the evidence of both
    /// sides.
    pub fn intersect_guard(&self, other: &FunctionalSet) -> Option<FunctionalSet> {
        if self.is_empty() || other.is_empty() {
            None
        } else {
            Some(self.union(other))
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn contains(&self, tuple: &ValueTuple) -> bool {
        match &self.index {
            Some(index) => index.contains(tuple),
            None => self.tuples.contains(tuple),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueTuple> {
        self.tuples.iter()
    }
}

// Order is irrelevant for equality.
impl PartialEq for FunctionalSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|t| other.contains(t))
    }
}

impl Eq for FunctionalSet {}

impl FromIterator<ValueTuple> for FunctionalSet {
    fn from_iter<I: IntoIterator<Item = ValueTuple>>(iter: I) -> Self {
        let mut set = FunctionalSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for FunctionalSet {
    type Item = ValueTuple;
    type IntoIter = smallvec::IntoIter<[ValueTuple; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.into_iter()
    }
}

impl<'a> IntoIterator for &'a FunctionalSet {
    type Item = &'a ValueTuple;
    type IntoIter = std::slice::Iter<'a, ValueTuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.tuples.iter()
    }
}

impl fmt::Display for FunctionalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, tuple) in self.tuples.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", tuple)?;
        }
        f.write_str("]")
    }
}
