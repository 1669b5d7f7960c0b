//! Evaluation engine
//!
//! The [`Engine`] is the long-lived service object: it owns the compiled regex cache and the
//! per-arithmetic configuration cache, and hands out fresh [`Interpreter`]s for each
//! document evaluation.

use crate::arithmetic::{Arithmetic, ArithmeticKind, ComparisonRules, HitRecorder, PatternCache};
use crate::ast::Node;
use crate::config::{EngineConfig, EvalOptions};
use crate::context::DocumentContext;
use crate::error::Result;
use crate::index::{FieldIndex, KeyRange};
use crate::interpreter::{self, Interpreter};
use crate::lazy::{DelayedFieldContext, IndexOnlyContext};
use crate::matching::Match;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Shareable part of an interpreter: everything except per-evaluation state.
#[derive(Debug)]
pub struct InterpreterConfig {
    pub kind: ArithmeticKind,
    pub rules: Arc<dyn ComparisonRules>,
    pub strict: bool,
    pub exhaustive_hits: bool,
}

impl InterpreterConfig {
    fn arithmetic(&self, patterns: Arc<PatternCache>) -> Arithmetic {
        let hits = match self.kind {
            ArithmeticKind::HitList => Some(HitRecorder::new(self.exhaustive_hits)),
            ArithmeticKind::Default | ArithmeticKind::Normalized => None,
        };
        Arithmetic::new(self.kind, self.rules.clone(), patterns, hits)
    }
}

/// Main evaluation engine
///
/// Safe to share between threads. Each evaluation gets its own interpreter, memo, and hit
/// recorder; only state-free configuration is cached.
pub struct Engine {
    config: EngineConfig,
    patterns: Arc<PatternCache>,
    configs: Mutex<HashMap<ArithmeticKind, Arc<InterpreterConfig>>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let capacity = config.pattern_capacity()?;
        config.lazy_field_capacity()?;
        Ok(Self {
            config,
            patterns: Arc::new(PatternCache::new(capacity)),
            configs: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn patterns(&self) -> &Arc<PatternCache> {
        &self.patterns
    }

    fn interpreter_config(&self, kind: ArithmeticKind) -> Arc<InterpreterConfig> {
        let mut configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        configs
            .entry(kind)
            .or_insert_with(|| {
                tracing::debug!(arithmetic = %kind, "Caching interpreter configuration");
                Arc::new(InterpreterConfig {
                    kind,
                    rules: kind.rules(),
                    strict: self.config.strict,
                    exhaustive_hits: self.config.exhaustive_hits,
                })
            })
            .clone()
    }

    /// Arithmetic kinds whose configuration has been cached.
    pub fn cached_kinds(&self) -> Vec<ArithmeticKind> {
        let configs = self.configs.lock().unwrap_or_else(PoisonError::into_inner);
        configs.keys().copied().collect()
    }

    /// Fresh interpreter for one document evaluation, with an empty hit recorder.
    pub fn interpreter(&self, kind: ArithmeticKind) -> Interpreter {
        let config = self.interpreter_config(kind);
        Interpreter::new(config.arithmetic(self.patterns.clone())).with_strict(config.strict)
    }

    /// Interpreter with caller-supplied comparison rules. Not cached.
    pub fn interpreter_with_rules(
        &self,
        kind: ArithmeticKind,
        rules: Arc<dyn ComparisonRules>,
    ) -> Interpreter {
        let config = InterpreterConfig {
            kind,
            rules,
            strict: self.config.strict,
            exhaustive_hits: self.config.exhaustive_hits,
        };
        Interpreter::new(config.arithmetic(self.patterns.clone())).with_strict(config.strict)
    }

    fn interpreter_for(&self, kind: ArithmeticKind, options: &EvalOptions) -> Interpreter {
        let interpreter = self.interpreter(kind);
        match options.strict {
            Some(strict) => interpreter.with_strict(strict),
            None => interpreter,
        }
    }

    // ============================================================================
    // Evaluation
    // ============================================================================

    /// Full-mode evaluation with a throwaway interpreter.
    pub fn evaluate(
        &self,
        tree: &Node,
        ctx: &mut dyn DocumentContext,
        kind: ArithmeticKind,
        options: &EvalOptions,
    ) -> Result<bool> {
        self.interpreter_for(kind, options).evaluate(tree, ctx)
    }

    /// Partial-mode evaluation against `options.incomplete_fields`.
    pub fn evaluate_partial(
        &self,
        tree: &Node,
        ctx: &mut dyn DocumentContext,
        kind: ArithmeticKind,
        options: &EvalOptions,
    ) -> Result<Match> {
        self.interpreter_for(kind, options)
            .evaluate_partial(tree, ctx, &options.incomplete_fields)
    }

    pub fn is_matched(&self, value: &Value) -> Result<bool> {
        interpreter::is_matched(value)
    }

    // ============================================================================
    // Lazy contexts
    // ============================================================================

    /// Wrap `base` so the listed fields are fetched from `index` on first access.
    pub fn delayed_context<C, I, S>(
        &self,
        base: C,
        index: Arc<dyn FieldIndex>,
        range: KeyRange,
        delayed: I,
    ) -> DelayedFieldContext<C>
    where
        C: DocumentContext,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DelayedFieldContext::new(base, index, range, delayed)
    }

    /// Wrap `base` so the listed fields are served as lazy sets over `index`, bounded by
    /// the configured lazy-field capacity.
    pub fn index_only_context<C, I, S>(
        &self,
        base: C,
        index: Arc<dyn FieldIndex>,
        range: KeyRange,
        fields: I,
    ) -> Result<IndexOnlyContext<C>>
    where
        C: DocumentContext,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capacity = self.config.lazy_field_capacity()?;
        Ok(IndexOnlyContext::new(base, index, range, fields, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_config_cached_once_per_kind() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let _ = engine.interpreter(ArithmeticKind::HitList);
        let _ = engine.interpreter(ArithmeticKind::HitList);
        let _ = engine.interpreter(ArithmeticKind::Default);
        let mut kinds = engine.cached_kinds();
        kinds.sort_by_key(|k| k.to_string());
        assert_eq!(kinds, vec![ArithmeticKind::Default, ArithmeticKind::HitList]);
    }

    #[test]
    fn test_interpreters_do_not_share_hits() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let tree = Node::eq("NAME", "bob");

        let mut first = engine.interpreter(ArithmeticKind::HitList);
        let mut ctx = Document::new("doc1").with_text("NAME", "Bob").context();
        assert!(first.evaluate(&tree, &mut ctx).unwrap());
        assert_eq!(first.hit_set().len(), 1);

        let second = engine.interpreter(ArithmeticKind::HitList);
        assert!(second.hit_tuples().is_empty());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = EngineConfig {
            lazy_field_cache_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }
}
