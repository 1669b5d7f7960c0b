//! Full-mode evaluation rules.

use super::functions::{self, helpers};
use super::Interpreter;
use crate::arithmetic::Arithmetic;
use crate::ast::{ArithmeticOp, CompareOp, MarkerKind, Node};
use crate::candidates::CandidateSet;
use crate::context::DocumentContext;
use crate::error::{Error, Result};
use crate::functional_set::FunctionalSet;
use crate::functions::FunctionRegistry;
use crate::range::{Range, RangeFinder};
use crate::value::Value;

impl Interpreter {
    /// Evaluate one node. `method_target` is set when a method call is chained onto the
    /// node, in which case collections are passed through uncoerced.
    pub(super) fn visit(
        &mut self,
        node: &Node,
        ctx: &mut dyn DocumentContext,
        method_target: bool,
    ) -> Result<Value> {
        match node {
            Node::Group { child } => self.visit(child, ctx, method_target),
            Node::And { children } => self.visit_and(node, children, ctx),
            Node::Or { children } => self.visit_or(children, ctx),
            Node::Not { child } => {
                let value = self.visit(child, ctx, false)?;
                Ok(Value::bool(!self.arithmetic.is_truthy(&value)?))
            }
            Node::Compare { op, left, right } => self.visit_compare(node, *op, left, right, ctx),
            Node::Function {
                namespace,
                name,
                args,
            } => self.visit_function(node, namespace, name, args, ctx, method_target),
            Node::Method { target, name, args } => self.visit_method(target, name, args, ctx),
            Node::Identifier { name } => {
                let value = ctx.get(name)?;
                if value.is_null() {
                    if self.strict && !ctx.has(name) {
                        return Err(Error::UnresolvedVariable(name.clone()));
                    }
                    if method_target {
                        return Ok(Value::Set(FunctionalSet::new()));
                    }
                }
                Ok(value)
            }
            Node::Literal { value } => Ok(value.clone().map(Value::Scalar).unwrap_or(Value::Null)),
            Node::Assignment { name, value } => {
                let value = self.visit(value, ctx, false)?;
                ctx.set(name, value.clone());
                // Memoized results may have read the old value.
                self.memo.clear();
                Ok(value)
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.visit(condition, ctx, false)?;
                if self.arithmetic.is_truthy(&condition)? {
                    self.visit(then, ctx, method_target)
                } else if let Some(otherwise) = otherwise {
                    self.visit(otherwise, ctx, method_target)
                } else {
                    Ok(Value::Null)
                }
            }
            Node::Arithmetic { op, left, right } => {
                let left = self.visit(left, ctx, false)?;
                let right = self.visit(right, ctx, false)?;
                match op {
                    ArithmeticOp::Add => self.arithmetic.add(&left, &right),
                    ArithmeticOp::Sub => self.arithmetic.subtract(&left, &right),
                }
            }
            Node::Marker { kind, source } => self.visit_marker(node, kind, source, ctx, method_target),
        }
    }

    // ========================================================================
    // Boolean operators
    // ========================================================================

    fn visit_and(
        &mut self,
        node: &Node,
        children: &[Node],
        ctx: &mut dyn DocumentContext,
    ) -> Result<Value> {
        if let Some(range) = RangeFinder::new().find(node)? {
            return self.evaluate_range(&range, ctx);
        }

        let mut result = FunctionalSet::new();
        let mut contributed = false;
        for child in children {
            let value = self.visit(child, ctx, false)?;
            if value.is_null() {
                continue;
            }
            let evidence = self.arithmetic.to_functional_set(&value)?;
            if evidence.is_empty() {
                return Ok(Value::bool(false));
            }
            result.extend(evidence);
            contributed = true;
        }

        if contributed {
            Ok(Value::Set(result))
        } else {
            Ok(Value::Null)
        }
    }

    fn visit_or(&mut self, children: &[Node], ctx: &mut dyn DocumentContext) -> Result<Value> {
        // Flattened without recursion so very wide disjunctions cannot overflow the stack.
        let mut leaves = Vec::with_capacity(children.len());
        let mut stack: Vec<&Node> = children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node.unwrap_group() {
                Node::Or { children } => stack.extend(children.iter().rev()),
                other => leaves.push(other),
            }
        }

        // Identifier-only disjunctions feed chained methods, which need every field's values.
        let visit_all = leaves.iter().all(|leaf| leaf.is_identifier());

        let mut result = FunctionalSet::new();
        let mut all_null = true;
        for leaf in leaves {
            let value = self.visit(leaf, ctx, false)?;
            if value.is_null() {
                continue;
            }
            all_null = false;
            result.extend(self.arithmetic.to_functional_set(&value)?);
            if !visit_all && !result.is_empty() {
                break;
            }
        }

        if all_null {
            Ok(Value::Null)
        } else if result.is_empty() {
            Ok(Value::bool(false))
        } else {
            Ok(Value::Set(result))
        }
    }

    // ========================================================================
    // Comparisons, functions and methods
    // ========================================================================

    fn visit_compare(
        &mut self,
        node: &Node,
        op: CompareOp,
        left: &Node,
        right: &Node,
        ctx: &mut dyn DocumentContext,
    ) -> Result<Value> {
        let key = node.to_string();
        if let Some(value) = self.memo.get(&key) {
            return Ok(value.clone());
        }

        let left = self.visit(left, ctx, false)?;
        let right = self.visit(right, ctx, false)?;
        let result = self
            .compare_values(op, &left, &right)
            .map_err(|e| into_query_error(node, e))?;

        let value = Value::bool(result);
        self.memo.insert(key, value.clone());
        Ok(value)
    }

    fn compare_values(&mut self, op: CompareOp, left: &Value, right: &Value) -> Result<bool> {
        let arithmetic = &mut self.arithmetic;
        match op {
            CompareOp::Eq => arithmetic.equals(left, right),
            CompareOp::Ne => arithmetic.not_equals(left, right),
            CompareOp::Lt => arithmetic.less_than(left, right),
            CompareOp::Le => arithmetic.less_than_or_equal(left, right),
            CompareOp::Gt => arithmetic.greater_than(left, right),
            CompareOp::Ge => arithmetic.greater_than_or_equal(left, right),
            CompareOp::Er => arithmetic.contains(left, right),
            CompareOp::Nr => arithmetic.not_contains(left, right),
        }
    }

    fn visit_function(
        &mut self,
        node: &Node,
        namespace: &str,
        name: &str,
        args: &[Node],
        ctx: &mut dyn DocumentContext,
        method_target: bool,
    ) -> Result<Value> {
        let metadata = FunctionRegistry::resolve(namespace, name).ok_or_else(|| {
            Error::Evaluation(format!("Unknown function: {}:{}", namespace, name))
        })?;
        let key = node.to_string();
        let raw = match self.memo.get(&key) {
            Some(value) => value.clone(),
            None => {
                FunctionRegistry::validate_args(metadata, args.len()).map_err(Error::Evaluation)?;

                let values = args
                    .iter()
                    .map(|arg| self.visit(arg, ctx, false))
                    .collect::<Result<Vec<_>>>()?;
                let value = functions::invoke(metadata.id, &self.arithmetic, &values)
                    .map_err(|e| into_query_error(format!("{}:{}", namespace, name), e))?;
                self.memo.insert(key, value.clone());
                value
            }
        };

        // Collections are coerced to a boolean unless a chained method consumes them.
        if method_target || !metadata.returns_collection || !raw.is_collection() {
            return Ok(raw);
        }
        let matched = self.arithmetic.to_functional_set(&raw)?;
        self.arithmetic.record_all(&matched);
        Ok(Value::bool(!matched.is_empty()))
    }

    fn visit_method(
        &mut self,
        target: &Node,
        name: &str,
        args: &[Node],
        ctx: &mut dyn DocumentContext,
    ) -> Result<Value> {
        let expected = if name == "contains" { 1 } else { 0 };
        if args.len() != expected {
            return Err(Error::Evaluation(format!(
                "{}() expects {} argument(s), got {}",
                name,
                expected,
                args.len()
            )));
        }

        let target = self.visit(target, ctx, true)?;
        match name {
            "size" => {
                let size = helpers::cardinality(&target)?;
                Ok(Value::number(i64::try_from(size).unwrap_or(i64::MAX)))
            }
            "isEmpty" => functions::existence::is_null(&target),
            "contains" => {
                let item = self.visit(&args[0], ctx, false)?;
                Ok(Value::bool(self.arithmetic.equals(&target, &item)?))
            }
            other => Err(Error::Evaluation(format!("Unknown method: {}()", other))),
        }
    }

    // ========================================================================
    // Ranges and markers
    // ========================================================================

    fn evaluate_range(&mut self, range: &Range, ctx: &mut dyn DocumentContext) -> Result<Value> {
        let between = range.to_between_node()?;
        tracing::debug!(field = range.field(), between = %between, "Collapsed range");
        self.visit(&between, ctx, false)
    }

    fn visit_marker(
        &mut self,
        node: &Node,
        kind: &MarkerKind,
        source: &Node,
        ctx: &mut dyn DocumentContext,
        method_target: bool,
    ) -> Result<Value> {
        match kind {
            MarkerKind::Bounded => {
                let range = RangeFinder::new().with_marker().find(node)?.ok_or_else(|| {
                    Error::MalformedTree(format!("bounded marker without a range: {}", node))
                })?;
                self.evaluate_range(&range, ctx)
            }
            MarkerKind::Delayed | MarkerKind::EvaluationOnly => {
                self.visit(source, ctx, method_target)
            }
            MarkerKind::ExceededValue { candidates } => {
                let field = source.field_names().into_iter().next().ok_or_else(|| {
                    Error::MalformedTree(format!("exceeded value marker without a field: {}", node))
                })?;
                self.evaluate_threshold(&field, candidates, ctx)
            }
            MarkerKind::ExceededOr { field, candidates } => {
                self.evaluate_threshold(field, candidates, ctx)
            }
        }
    }

    /// Membership of the field's values in an externally supplied candidate set.
    fn evaluate_threshold(
        &mut self,
        field: &str,
        key: &str,
        ctx: &mut dyn DocumentContext,
    ) -> Result<Value> {
        let candidates = ctx.candidates(key).ok_or_else(|| {
            Error::Evaluation(format!("No candidate set registered under '{}'", key))
        })?;
        let values = ctx.get(field)?;

        let matched = matching_candidates(&self.arithmetic, &values, &candidates)?;
        tracing::debug!(
            field,
            candidates = candidates.kind(),
            matches = matched.len(),
            "Evaluated threshold marker"
        );

        if matched.is_empty() {
            return Ok(Value::bool(false));
        }
        self.arithmetic.record_all(&matched);
        Ok(Value::Set(matched))
    }
}

/// Wrap a failure as a query-evaluation error unless it already is one.
fn into_query_error(context: impl std::fmt::Display, e: Error) -> Error {
    if e.is_query_error() {
        e
    } else {
        Error::Evaluation(format!("{} failed: {}", context, e))
    }
}

fn matching_candidates(
    arithmetic: &Arithmetic,
    values: &Value,
    candidates: &CandidateSet,
) -> Result<FunctionalSet> {
    match candidates {
        CandidateSet::Values(set) => {
            arithmetic.select(values, |t| Ok(set.contains(&t.value().to_string())))
        }
        CandidateSet::Fst(set) => {
            arithmetic.select(values, |t| Ok(set.contains(t.value().to_string())))
        }
        CandidateSet::Ranges(ranges) => arithmetic.select(values, |t| {
            Ok(ranges.iter().any(|r| {
                arithmetic.in_range(
                    t.value(),
                    &r.lower,
                    &r.upper,
                    r.lower_inclusive,
                    r.upper_inclusive,
                )
            }))
        }),
    }
}
