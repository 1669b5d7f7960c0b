//! Function registry for namespaced filter functions
//!
//! Maps `namespace:name` calls to a [`FunctionId`] and describes their arity.
//!
//! Uses a compile-time perfect hash map (phf) for O(1) name lookups with zero runtime allocation.

use phf::phf_map;

/// Namespaces the filter functions are reachable under.
pub const NAMESPACES: &[&str] = &["filter", "f"];

/// Identifies a filter function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    IncludeRegex,
    ExcludeRegex,
    GetAllMatches,
    IsNull,
    IsNotNull,
    MatchesAtLeastCountOf,
    Occurrence,
    Between,
    BetweenDates,
    AfterDate,
    BeforeDate,
}

/// Function metadata
#[derive(Debug, Clone, Copy)]
pub struct FunctionMetadata {
    pub id: FunctionId,
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>, // None = unbounded
    /// Result is a collection of matching values rather than a boolean.
    pub returns_collection: bool,
}

static FUNCTIONS_BY_NAME: phf::Map<&'static str, FunctionMetadata> = phf_map! {
    // Regex functions
    "includeRegex" => FunctionMetadata { id: FunctionId::IncludeRegex, name: "includeRegex", min_args: 2, max_args: Some(2), returns_collection: true },
    "excludeRegex" => FunctionMetadata { id: FunctionId::ExcludeRegex, name: "excludeRegex", min_args: 2, max_args: Some(2), returns_collection: true },
    "getAllMatches" => FunctionMetadata { id: FunctionId::GetAllMatches, name: "getAllMatches", min_args: 2, max_args: Some(2), returns_collection: true },

    // Existence functions
    "isNull" => FunctionMetadata { id: FunctionId::IsNull, name: "isNull", min_args: 1, max_args: Some(1), returns_collection: false },
    "isNotNull" => FunctionMetadata { id: FunctionId::IsNotNull, name: "isNotNull", min_args: 1, max_args: Some(1), returns_collection: true },

    // Counting functions
    "matchesAtLeastCountOf" => FunctionMetadata { id: FunctionId::MatchesAtLeastCountOf, name: "matchesAtLeastCountOf", min_args: 3, max_args: None, returns_collection: true },
    "occurrence" => FunctionMetadata { id: FunctionId::Occurrence, name: "occurrence", min_args: 2, max_args: Some(3), returns_collection: false },

    // Range functions
    "between" => FunctionMetadata { id: FunctionId::Between, name: "between", min_args: 3, max_args: Some(5), returns_collection: true },

    // Date functions
    "betweenDates" => FunctionMetadata { id: FunctionId::BetweenDates, name: "betweenDates", min_args: 3, max_args: Some(4), returns_collection: true },
    "afterDate" => FunctionMetadata { id: FunctionId::AfterDate, name: "afterDate", min_args: 2, max_args: Some(3), returns_collection: true },
    "beforeDate" => FunctionMetadata { id: FunctionId::BeforeDate, name: "beforeDate", min_args: 2, max_args: Some(3), returns_collection: true },
};

/// Function registry
pub struct FunctionRegistry;

impl FunctionRegistry {
    /// Resolve a namespaced function name. Unknown namespaces resolve to nothing.
    pub fn resolve(namespace: &str, name: &str) -> Option<&'static FunctionMetadata> {
        if !NAMESPACES.contains(&namespace) {
            return None;
        }
        FUNCTIONS_BY_NAME.get(name)
    }

    /// Validate function call arguments
    pub fn validate_args(metadata: &FunctionMetadata, arg_count: usize) -> Result<(), String> {
        if arg_count < metadata.min_args {
            return Err(format!(
                "Function {} requires at least {} arguments, got {}",
                metadata.name, metadata.min_args, arg_count
            ));
        }

        if let Some(max) = metadata.max_args {
            if arg_count > max {
                return Err(format!(
                    "Function {} takes at most {} arguments, got {}",
                    metadata.name, max, arg_count
                ));
            }
        }

        Ok(())
    }

    /// Get all registered function names (for testing/debugging)
    pub fn all_function_names() -> Vec<&'static str> {
        FUNCTIONS_BY_NAME.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_functions_registered() {
        let functions = [
            "includeRegex",
            "excludeRegex",
            "getAllMatches",
            "isNull",
            "isNotNull",
            "matchesAtLeastCountOf",
            "occurrence",
            "between",
            "betweenDates",
            "afterDate",
            "beforeDate",
        ];
        for name in functions {
            assert!(
                FunctionRegistry::resolve("filter", name).is_some(),
                "Function {} not registered",
                name
            );
            assert!(FunctionRegistry::resolve("f", name).is_some());
        }
        assert_eq!(FunctionRegistry::all_function_names().len(), functions.len());
    }

    #[test]
    fn test_collection_results() {
        let collection = |name| FunctionRegistry::resolve("filter", name).unwrap().returns_collection;
        assert!(collection("includeRegex"));
        assert!(collection("between"));
        assert!(!collection("isNull"));
        assert!(!collection("occurrence"));
    }

    #[test]
    fn test_unknown_namespace() {
        assert!(FunctionRegistry::resolve("geo", "between").is_none());
        assert!(FunctionRegistry::resolve("filter", "nope").is_none());
    }

    #[test]
    fn test_function_argument_validation() {
        let between = FunctionRegistry::resolve("filter", "between").unwrap();
        assert!(FunctionRegistry::validate_args(between, 2).is_err());
        assert!(FunctionRegistry::validate_args(between, 3).is_ok());
        assert!(FunctionRegistry::validate_args(between, 5).is_ok());
        assert!(FunctionRegistry::validate_args(between, 6).is_err());

        let at_least = FunctionRegistry::resolve("f", "matchesAtLeastCountOf").unwrap();
        assert!(FunctionRegistry::validate_args(at_least, 10).is_ok());
    }
}
