//! Boolean query evaluation over sparse documents
//!
//! This crate decides whether a document satisfies a query tree and, if so, which field
//! values caused the match.
//!
//! # Architecture Overview
//!
//! ```text
//! Query tree (ast::Node, produced elsewhere)
//!      |
//! Engine -> Interpreter (fresh per document)
//!      |            |
//!      |       Arithmetic = ComparisonRules + optional HitRecorder
//!      |
//! DocumentContext (map-backed, or lazy over a FieldIndex)
//!      |
//! bool / Match + hit terms
//! ```
//!
//! Values are multi-valued: a field may hold several indexed values, and every comparison
//! is existential over them. Boolean operators combine [`FunctionalSet`]s of evidence
//! rather than plain booleans so matches can be attributed to individual values.

pub mod arithmetic;
pub mod ast;
pub mod candidates;
pub mod config;
pub mod context;
pub mod document;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod functional_set;
pub mod functions;
pub mod index;
pub mod interpreter;
pub mod lazy;
pub mod matching;
pub mod number;
pub mod range;
pub mod value;

// Re-export main types
pub use arithmetic::{
    column_visibility_for_hit, Arithmetic, ArithmeticKind, ComparisonRules, DefaultRules,
    HitRecorder, NormalizedRules, PatternCache,
};
pub use ast::{ArithmeticOp, CompareOp, MarkerKind, Node};
pub use candidates::{CandidateSet, ValueRange};
pub use config::{EngineConfig, EvalOptions};
pub use context::{DocumentContext, MapContext};
pub use document::{Attribute, Document};
pub use engine::{Engine, InterpreterConfig};
pub use error::{Error, Result};
pub use functional_set::FunctionalSet;
pub use index::{FieldIndex, IndexCursor, IndexEntry, IndexKey, KeyRange, MemoryIndex};
pub use interpreter::{is_matched, Interpreter};
pub use lazy::{DelayedFieldContext, IndexOnlyContext, LazyFetchingSet};
pub use matching::Match;
pub use number::{Number, NumberKind};
pub use range::{LiteralRange, Range, RangeFinder};
pub use value::{Scalar, Value, ValueTuple};
