//! Three-valued match result used by partial evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating against a document whose fields may be incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Match {
    True,
    False,
    /// The document lacked data needed to decide.
    Unknown,
}

impl Match {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Match::True
        } else {
            Match::False
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Match::True => Match::False,
            Match::False => Match::True,
            Match::Unknown => Match::Unknown,
        }
    }

    pub fn and(self, other: Match) -> Self {
        match (self, other) {
            (Match::True, Match::True) => Match::True,
            (Match::False, _) | (_, Match::False) => Match::False,
            _ => Match::Unknown,
        }
    }

    pub fn or(self, other: Match) -> Self {
        match (self, other) {
            (Match::True, _) | (_, Match::True) => Match::True,
            (Match::False, Match::False) => Match::False,
            _ => Match::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        self == Match::True
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Match::True => "TRUE",
            Match::False => "FALSE",
            Match::Unknown => "UNKNOWN",
        })
    }
}
