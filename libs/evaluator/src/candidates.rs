//! Candidate sets for threshold markers
//!
//! When upstream expansion of a term would have produced too many alternatives, the term is
//! replaced with a marker and the alternatives are materialized separately, in one of three
//! forms.

use crate::arithmetic::{ComparisonRules, DefaultRules};
use crate::error::{Error, Result};
use crate::value::Scalar;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Materialized alternatives for a threshold marker.
pub enum CandidateSet {
    /// Explicit normalized values.
    Values(HashSet<String>),
    /// Compiled FST of normalized values, typically from a regex expansion.
    Fst(fst::Set<Vec<u8>>),
    /// Sorted value ranges.
    Ranges(Vec<ValueRange>),
}

impl CandidateSet {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CandidateSet::Values(values.into_iter().map(Into::into).collect())
    }

    /// Build an FST candidate set. Keys need not be sorted or unique.
    pub fn fst<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        keys.sort();
        keys.dedup();
        let set = fst::Set::from_iter(keys)
            .map_err(|e| Error::Evaluation(format!("Failed to build candidate FST: {}", e)))?;
        Ok(CandidateSet::Fst(set))
    }

    /// Build a range candidate set; ranges are kept sorted by lower bound.
    pub fn ranges(mut ranges: Vec<ValueRange>) -> Self {
        ranges.sort_by(|a, b| {
            DefaultRules
                .compare(&a.lower, &b.lower)
                .unwrap_or(Ordering::Equal)
        });
        CandidateSet::Ranges(ranges)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CandidateSet::Values(_) => "values",
            CandidateSet::Fst(_) => "fst",
            CandidateSet::Ranges(_) => "ranges",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CandidateSet::Values(v) => v.len(),
            CandidateSet::Fst(f) => f.len(),
            CandidateSet::Ranges(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CandidateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CandidateSet::{}({})", self.kind(), self.len())
    }
}

/// One candidate interval, each bound with its own inclusivity.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub lower: Scalar,
    pub upper: Scalar,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
}

impl ValueRange {
    pub fn inclusive(lower: impl Into<Scalar>, upper: impl Into<Scalar>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
            lower_inclusive: true,
            upper_inclusive: true,
        }
    }

    pub fn exclusive(lower: impl Into<Scalar>, upper: impl Into<Scalar>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }
}
