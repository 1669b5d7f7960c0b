//! Partial-mode evaluation rules.
//!
//! Boolean structure is evaluated with three-valued logic. Every other node is a leaf that
//! goes through full-mode evaluation and is then classified by [`Interpreter::get_matched`].

use super::{is_matched, Interpreter};
use crate::ast::Node;
use crate::context::DocumentContext;
use crate::error::Result;
use crate::functional_set::FunctionalSet;
use crate::matching::Match;
use crate::range::RangeFinder;
use crate::value::Value;
use std::collections::HashSet;

/// Result of a partial-mode visit: a plain match, or evidence for a true match.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Partial {
    Match(Match),
    Set(FunctionalSet),
}

impl Partial {
    pub(super) fn to_match(&self) -> Match {
        match self {
            Partial::Match(m) => *m,
            Partial::Set(set) => Match::from_bool(!set.is_empty()),
        }
    }
}

/// Running combination of AND/OR children.
struct Aggregate {
    state: Match,
    evidence: FunctionalSet,
    saw_set: bool,
}

impl Aggregate {
    fn new(state: Match) -> Self {
        Self {
            state,
            evidence: FunctionalSet::new(),
            saw_set: false,
        }
    }

    fn absorb(&mut self, child: Partial, combine: fn(Match, Match) -> Match) {
        let m = child.to_match();
        if let Partial::Set(set) = child {
            self.saw_set = true;
            self.evidence.extend(set);
        }
        self.state = combine(self.state, m);
    }

    fn finish(self) -> Partial {
        if self.state == Match::True && self.saw_set && !self.evidence.is_empty() {
            Partial::Set(self.evidence)
        } else {
            Partial::Match(self.state)
        }
    }
}

impl Interpreter {
    pub(super) fn visit_partial(
        &mut self,
        node: &Node,
        ctx: &mut dyn DocumentContext,
        incomplete: &HashSet<String>,
        negated: bool,
    ) -> Result<Partial> {
        match node {
            Node::Group { child } => self.visit_partial(child, ctx, incomplete, negated),
            Node::Not { child } => {
                let inner = self.visit_partial(child, ctx, incomplete, !negated)?;
                Ok(Partial::Match(inner.to_match().negate()))
            }
            Node::And { children } => {
                if let Some(range) = RangeFinder::new().find(node)? {
                    let between = range.to_between_node()?;
                    let value = self.visit(&between, ctx, false)?;
                    return self.get_matched(node, &value, incomplete, negated);
                }
                let mut aggregate = Aggregate::new(Match::True);
                for child in children {
                    let child = self.visit_partial(child, ctx, incomplete, negated)?;
                    aggregate.absorb(child, Match::and);
                    if aggregate.state == Match::False {
                        break;
                    }
                }
                Ok(aggregate.finish())
            }
            Node::Or { children } => {
                let mut leaves = Vec::with_capacity(children.len());
                let mut stack: Vec<&Node> = children.iter().rev().collect();
                while let Some(node) = stack.pop() {
                    match node.unwrap_group() {
                        Node::Or { children } => stack.extend(children.iter().rev()),
                        other => leaves.push(other),
                    }
                }
                let visit_all = leaves.iter().all(|leaf| leaf.is_identifier());

                let mut aggregate = Aggregate::new(Match::False);
                for leaf in leaves {
                    let child = self.visit_partial(leaf, ctx, incomplete, negated)?;
                    aggregate.absorb(child, Match::or);
                    if aggregate.state == Match::True && !visit_all {
                        break;
                    }
                }
                Ok(aggregate.finish())
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => match self.visit_partial(condition, ctx, incomplete, negated)?.to_match() {
                Match::Unknown => Ok(Partial::Match(Match::Unknown)),
                Match::True => self.visit_partial(then, ctx, incomplete, negated),
                Match::False => match otherwise {
                    Some(otherwise) => self.visit_partial(otherwise, ctx, incomplete, negated),
                    None => Ok(Partial::Match(Match::False)),
                },
            },
            Node::Assignment { .. } => {
                self.visit(node, ctx, false)?;
                Ok(Partial::Match(Match::True))
            }
            Node::Marker { kind, source } if kind.is_transparent() => {
                self.visit_partial(source, ctx, incomplete, negated)
            }
            Node::Marker { .. }
            | Node::Compare { .. }
            | Node::Function { .. }
            | Node::Method { .. }
            | Node::Identifier { .. }
            | Node::Literal { .. }
            | Node::Arithmetic { .. } => {
                let value = self.visit(node, ctx, false)?;
                self.get_matched(node, &value, incomplete, negated)
            }
        }
    }

    /// Classify a leaf result. A result that would fail the enclosing query (false, or true
    /// under negation) is demoted to unknown when the leaf reads an incomplete field.
    fn get_matched(
        &self,
        node: &Node,
        value: &Value,
        incomplete: &HashSet<String>,
        negated: bool,
    ) -> Result<Partial> {
        let naive = Match::from_bool(is_matched(value)?);
        let failing = Match::from_bool(negated);
        if naive == failing
            && !incomplete.is_empty()
            && node.field_names().iter().any(|f| incomplete.contains(f))
        {
            tracing::trace!(node = %node, "Demoted result over incomplete field");
            return Ok(Partial::Match(Match::Unknown));
        }

        if naive == Match::True && value.is_collection() {
            let set = self.arithmetic.to_functional_set(value)?;
            if !set.is_empty() {
                return Ok(Partial::Set(set));
            }
        }
        Ok(Partial::Match(naive))
    }
}
