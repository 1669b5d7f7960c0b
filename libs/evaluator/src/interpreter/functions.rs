//! Filter function implementations
//!
//! This module organizes the namespaced filter functions into logical groups. Argument
//! counts are validated against the registry before [`invoke`] is reached.

pub mod counting;
pub mod dates;
pub mod existence;
pub mod helpers;
pub mod regex;

use crate::arithmetic::Arithmetic;
use crate::error::Result;
use crate::functions::FunctionId;
use crate::value::Value;

/// Execute a filter function on already-evaluated arguments.
pub(crate) fn invoke(id: FunctionId, arithmetic: &Arithmetic, args: &[Value]) -> Result<Value> {
    match id {
        FunctionId::IncludeRegex => regex::include_regex(arithmetic, &args[0], &args[1]),
        FunctionId::ExcludeRegex => regex::exclude_regex(arithmetic, &args[0], &args[1]),
        FunctionId::GetAllMatches => regex::get_all_matches(arithmetic, &args[0], &args[1]),
        FunctionId::IsNull => existence::is_null(&args[0]),
        FunctionId::IsNotNull => existence::is_not_null(arithmetic, &args[0]),
        FunctionId::MatchesAtLeastCountOf => counting::matches_at_least_count_of(arithmetic, args),
        FunctionId::Occurrence => counting::occurrence(args),
        FunctionId::Between => counting::between(arithmetic, args),
        FunctionId::BetweenDates => dates::between_dates(arithmetic, args),
        FunctionId::AfterDate => dates::after_date(arithmetic, args),
        FunctionId::BeforeDate => dates::before_date(arithmetic, args),
    }
}
