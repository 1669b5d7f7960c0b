//! Lazy field contexts
//!
//! Some fields are too expensive to load with every document. They are fetched from the
//! index only when an expression reads them:
//!
//! - [`DelayedFieldContext`] fetches a delayed field completely on first access and merges
//!   it into the base context.
//! - [`IndexOnlyContext`] resolves an index-only field to a [`LazyFetchingSet`] that pulls
//!   entries only as far as the comparison needs.

mod delayed;
mod index_only;
mod set;

pub use delayed::DelayedFieldContext;
pub use index_only::IndexOnlyContext;
pub use set::{Iter, LazyFetchingSet};
