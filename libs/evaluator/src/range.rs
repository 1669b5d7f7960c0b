//! Range detection
//!
//! A range is an `AND` of exactly two comparisons over the same field, one lower bound
//! (`>`/`>=`) and one upper bound (`<`/`<=`). Upstream rewriting marks ranges it has
//! validated with a `Bounded` marker; ranges may also be spotted opportunistically in
//! unmarked trees.
//!
//! A failure to build a range from a marked node means the tree was mis-transformed and is
//! reported as [`Error::MalformedTree`]. The same failure on an unmarked node only means
//! "no range here".

use crate::ast::{CompareOp, MarkerKind, Node};
use crate::error::{Error, Result};
use crate::number::{Number, NumberKind};
use crate::value::Scalar;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Debug;

/// A literal type a range can be typed by.
pub trait RangeLiteral: Clone + Debug + PartialOrd + Sized {
    fn from_scalar(value: &Scalar) -> Option<Self>;
    fn to_scalar(&self) -> Scalar;
}

impl RangeLiteral for String {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::from(self.as_str())
    }
}

impl RangeLiteral for i32 {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_i64().and_then(|v| i32::try_from(v).ok())
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::Integer(*self))
    }
}

impl RangeLiteral for i64 {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_i64()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::Long(*self))
    }
}

impl RangeLiteral for BigInt {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_bigint()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::BigInteger(self.clone()))
    }
}

impl RangeLiteral for f32 {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_f64().and_then(|v| v.to_f32())
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::Float(*self))
    }
}

impl RangeLiteral for f64 {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_f64()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::Double(*self))
    }
}

impl RangeLiteral for Decimal {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        value.as_number()?.to_decimal()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Number(Number::BigDecimal(*self))
    }
}

/// One end of a range, with the comparison node it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound<T> {
    pub value: T,
    pub inclusive: bool,
    pub node: Node,
}

/// A typed bound pair over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralRange<T> {
    field: String,
    lower: Option<RangeBound<T>>,
    upper: Option<RangeBound<T>>,
}

impl<T: RangeLiteral> LiteralRange<T> {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            lower: None,
            upper: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn lower(&self) -> Option<&RangeBound<T>> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&RangeBound<T>> {
        self.upper.as_ref()
    }

    pub fn set_lower(&mut self, value: T, inclusive: bool, node: Node) {
        self.lower = Some(RangeBound {
            value,
            inclusive,
            node,
        });
    }

    pub fn set_upper(&mut self, value: T, inclusive: bool, node: Node) {
        self.upper = Some(RangeBound {
            value,
            inclusive,
            node,
        });
    }

    /// Both ends set and comparable with each other.
    pub fn is_bounded(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(l), Some(u)) => l.value.partial_cmp(&u.value).is_some(),
            _ => false,
        }
    }
}

/// A detected range, typed by the common class of its two literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    String(LiteralRange<String>),
    Integer(LiteralRange<i32>),
    Long(LiteralRange<i64>),
    BigInteger(LiteralRange<BigInt>),
    Float(LiteralRange<f32>),
    Double(LiteralRange<f64>),
    BigDecimal(LiteralRange<Decimal>),
}

macro_rules! with_range {
    ($range:expr, $r:ident => $body:expr) => {
        match $range {
            Range::String($r) => $body,
            Range::Integer($r) => $body,
            Range::Long($r) => $body,
            Range::BigInteger($r) => $body,
            Range::Float($r) => $body,
            Range::Double($r) => $body,
            Range::BigDecimal($r) => $body,
        }
    };
}

/// Untyped view of one end of a range.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: Scalar,
    pub inclusive: bool,
}

impl Range {
    pub fn field(&self) -> &str {
        with_range!(self, r => r.field())
    }

    pub fn is_bounded(&self) -> bool {
        with_range!(self, r => r.is_bounded())
    }

    pub fn lower(&self) -> Option<Bound> {
        with_range!(self, r => r.lower().map(|b| Bound {
            value: b.value.to_scalar(),
            inclusive: b.inclusive,
        }))
    }

    pub fn upper(&self) -> Option<Bound> {
        with_range!(self, r => r.upper().map(|b| Bound {
            value: b.value.to_scalar(),
            inclusive: b.inclusive,
        }))
    }

    /// Equivalent `filter:between(field, lower, upper, lowerInclusive, upperInclusive)` call.
    pub fn to_between_node(&self) -> Result<Node> {
        let (Some(lower), Some(upper)) = (self.lower(), self.upper()) else {
            return Err(Error::MalformedTree(format!(
                "range over {} is not bounded",
                self.field()
            )));
        };
        Ok(Node::function(
            "filter",
            "between",
            vec![
                Node::ident(self.field()),
                Node::Literal {
                    value: Some(lower.value),
                },
                Node::Literal {
                    value: Some(upper.value),
                },
                Node::lit(lower.inclusive),
                Node::lit(upper.inclusive),
            ],
        ))
    }
}

/// A comparison of a field against a literal, normalized to `field <op> literal`.
struct Bounding<'a> {
    field: &'a str,
    op: CompareOp,
    literal: &'a Scalar,
    node: &'a Node,
}

/// Locates ranges in a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeFinder {
    recursive: bool,
    not_delayed: bool,
    require_marker: bool,
}

impl RangeFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search all descendants, not just the given node.
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Do not look through `Delayed`/`EvaluationOnly` markers.
    pub fn not_delayed(mut self) -> Self {
        self.not_delayed = true;
        self
    }

    /// Treat a range without a `Bounded` marker as an error.
    pub fn with_marker(mut self) -> Self {
        self.require_marker = true;
        self
    }

    fn deref<'a>(&self, node: &'a Node) -> &'a Node {
        let mut node = node.unwrap_group();
        while let Node::Marker { kind, source } = node {
            if self.not_delayed || !kind.is_transparent() {
                break;
            }
            node = source.unwrap_group();
        }
        node
    }

    /// The range at `node`, if any. In recursive mode the first range found in a
    /// depth-first walk.
    pub fn find(&self, node: &Node) -> Result<Option<Range>> {
        if let Some(range) = self.find_here(node)? {
            return Ok(Some(range));
        }
        if self.recursive {
            for child in children(node) {
                if let Some(range) = self.find(child)? {
                    return Ok(Some(range));
                }
            }
        }
        Ok(None)
    }

    /// Every range in the tree. Nodes found to be ranges are not searched further.
    pub fn find_all(&self, node: &Node) -> Result<Vec<Range>> {
        let mut ranges = Vec::new();
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match self.find_here(node)? {
                Some(range) => ranges.push(range),
                None => stack.extend(children(node).rev()),
            }
        }
        Ok(ranges)
    }

    fn find_here(&self, node: &Node) -> Result<Option<Range>> {
        let node = self.deref(node);
        let (marked, candidate) = match node {
            Node::Marker {
                kind: MarkerKind::Bounded,
                source,
            } => (true, self.deref(source)),
            other => (false, other),
        };

        if !marked && !matches!(candidate, Node::And { .. }) {
            return Ok(None);
        }

        match self.build(candidate) {
            Ok(range) => {
                if self.require_marker && !marked {
                    return Err(Error::MalformedTree(format!(
                        "range over {} is missing its bounded marker",
                        range.field()
                    )));
                }
                tracing::trace!(field = range.field(), marked, "Detected range");
                Ok(Some(range))
            }
            Err(reason) if marked => {
                tracing::error!(node = %node, reason = %reason, "Malformed bounded range");
                Err(Error::MalformedTree(format!("{}: {}", reason, node)))
            }
            Err(_) => Ok(None),
        }
    }

    fn bounding<'a>(&self, node: &'a Node) -> std::result::Result<Bounding<'a>, String> {
        let node = self.deref(node);
        let Node::Compare { op, left, right } = node else {
            return Err("range child is not a comparison".to_string());
        };
        if !(op.is_lower_bound() || op.is_upper_bound()) {
            return Err(format!("operator {} does not bound a range", op.as_str()));
        }
        let (left, right) = (left.unwrap_group(), right.unwrap_group());
        match (left, right) {
            (Node::Identifier { name }, Node::Literal { value: Some(literal) }) => Ok(Bounding {
                field: name,
                op: *op,
                literal,
                node,
            }),
            (Node::Literal { value: Some(literal) }, Node::Identifier { name }) => Ok(Bounding {
                field: name,
                op: op.flip(),
                literal,
                node,
            }),
            _ => Err("range bound needs a field and a non-null literal".to_string()),
        }
    }

    fn build(&self, node: &Node) -> std::result::Result<Range, String> {
        let Node::And { children } = node else {
            return Err("bounded range source is not a conjunction".to_string());
        };
        let [first, second] = children.as_slice() else {
            return Err(format!("range needs 2 terms, found {}", children.len()));
        };

        let first = self.bounding(first)?;
        let second = self.bounding(second)?;
        if first.field != second.field {
            return Err(format!(
                "range terms reference different fields {} and {}",
                first.field, second.field
            ));
        }
        let (lower, upper) = match (first.op.is_lower_bound(), second.op.is_lower_bound()) {
            (true, false) => (&first, &second),
            (false, true) => (&second, &first),
            _ => return Err("range needs one lower and one upper bound".to_string()),
        };

        // Typed by the promoted class of both literals so child order does not matter.
        let range = match (lower.literal, upper.literal) {
            (Scalar::String(_), Scalar::String(_)) => Range::String(typed(lower, upper)?),
            (Scalar::Number(l), Scalar::Number(u)) => match l.kind().promote(u.kind()) {
                NumberKind::Byte | NumberKind::Short | NumberKind::Integer => {
                    Range::Integer(typed(lower, upper)?)
                }
                NumberKind::Long => Range::Long(typed(lower, upper)?),
                NumberKind::BigInteger => Range::BigInteger(typed(lower, upper)?),
                NumberKind::Float => Range::Float(typed(lower, upper)?),
                NumberKind::Double => Range::Double(typed(lower, upper)?),
                NumberKind::BigDecimal => Range::BigDecimal(typed(lower, upper)?),
            },
            (Scalar::Bool(_), _) | (_, Scalar::Bool(_)) => {
                return Err("boolean literals cannot bound a range".to_string())
            }
            (l, u) => return Err(format!("range bounds {} and {} are not comparable", l, u)),
        };
        if !range.is_bounded() {
            return Err("range bounds are not comparable".to_string());
        }
        Ok(range)
    }
}

fn typed<T: RangeLiteral>(
    lower: &Bounding<'_>,
    upper: &Bounding<'_>,
) -> std::result::Result<LiteralRange<T>, String> {
    let convert = |b: &Bounding<'_>| {
        T::from_scalar(b.literal)
            .ok_or_else(|| format!("literal {} does not match the range type", b.literal))
    };
    let mut range = LiteralRange::new(lower.field);
    range.set_lower(
        convert(lower)?,
        lower.op == CompareOp::Ge,
        lower.node.clone(),
    );
    range.set_upper(
        convert(upper)?,
        upper.op == CompareOp::Le,
        upper.node.clone(),
    );
    Ok(range)
}

fn children(node: &Node) -> Box<dyn DoubleEndedIterator<Item = &Node> + '_> {
    match node {
        Node::And { children } | Node::Or { children } => Box::new(children.iter()),
        Node::Not { child } | Node::Group { child } => Box::new(std::iter::once(child.as_ref())),
        Node::Marker { source, .. } => Box::new(std::iter::once(source.as_ref())),
        Node::If {
            condition,
            then,
            otherwise,
        } => Box::new(
            [Some(condition.as_ref()), Some(then.as_ref()), otherwise.as_deref()]
                .into_iter()
                .flatten(),
        ),
        _ => Box::new(std::iter::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_range(lower: CompareOp, upper: CompareOp) -> Node {
        Node::and(vec![Node::term("AGE", lower, 18), Node::term("AGE", upper, 65)])
    }

    #[test]
    fn test_inclusive_and_exclusive() {
        let finder = RangeFinder::new();
        let range = finder
            .find(&age_range(CompareOp::Ge, CompareOp::Le))
            .unwrap()
            .unwrap();
        assert_eq!(range.field(), "AGE");
        assert!(range.lower().unwrap().inclusive && range.upper().unwrap().inclusive);

        let range = finder
            .find(&age_range(CompareOp::Gt, CompareOp::Lt))
            .unwrap()
            .unwrap();
        assert!(!range.lower().unwrap().inclusive && !range.upper().unwrap().inclusive);
        assert!(matches!(range, Range::Integer(_)));
    }

    #[test]
    fn test_child_order_and_flipped_literal() {
        let node = Node::and(vec![
            Node::term("AGE", CompareOp::Le, 65),
            Node::compare(CompareOp::Le, Node::lit(18), Node::ident("AGE")),
        ]);
        let range = RangeFinder::new().find(&node).unwrap().unwrap();
        assert_eq!(range.lower().unwrap().value, Scalar::from(18));
        assert_eq!(range.upper().unwrap().value, Scalar::from(65));
    }

    #[test]
    fn test_unmarked_failures_are_not_ranges() {
        let finder = RangeFinder::new();
        let mixed = Node::and(vec![
            Node::term("AGE", CompareOp::Ge, 18),
            Node::term("SIZE", CompareOp::Le, 65),
        ]);
        assert_eq!(finder.find(&mixed).unwrap(), None);
        let both_lower = age_range(CompareOp::Ge, CompareOp::Gt);
        assert_eq!(finder.find(&both_lower).unwrap(), None);
        assert_eq!(finder.find(&Node::eq("AGE", 18)).unwrap(), None);
    }

    #[test]
    fn test_marked_failures_are_fatal() {
        let finder = RangeFinder::new();
        let broken = Node::marker(
            MarkerKind::Bounded,
            Node::and(vec![
                Node::term("AGE", CompareOp::Ge, 18),
                Node::term("SIZE", CompareOp::Le, 65),
            ]),
        );
        let err = finder.find(&broken).unwrap_err();
        assert!(err.is_fatal());

        let three = Node::marker(
            MarkerKind::Bounded,
            Node::and(vec![
                Node::term("AGE", CompareOp::Ge, 18),
                Node::term("AGE", CompareOp::Le, 65),
                Node::term("AGE", CompareOp::Le, 70),
            ]),
        );
        assert!(finder.find(&three).unwrap_err().is_fatal());

        let incomparable = Node::marker(
            MarkerKind::Bounded,
            Node::and(vec![
                Node::term("AGE", CompareOp::Ge, 18),
                Node::term("AGE", CompareOp::Le, "old"),
            ]),
        );
        assert!(finder.find(&incomparable).unwrap_err().is_fatal());
    }

    #[test]
    fn test_required_marker() {
        let finder = RangeFinder::new().with_marker();
        assert!(finder
            .find(&age_range(CompareOp::Ge, CompareOp::Le))
            .unwrap_err()
            .is_fatal());
        let marked = Node::marker(MarkerKind::Bounded, age_range(CompareOp::Ge, CompareOp::Le));
        assert!(finder.find(&marked).unwrap().is_some());
    }

    #[test]
    fn test_delayed_wrappers() {
        let delayed = Node::and(vec![
            Node::marker(MarkerKind::Delayed, Node::term("AGE", CompareOp::Ge, 18)),
            Node::term("AGE", CompareOp::Le, 65),
        ]);
        assert!(RangeFinder::new().find(&delayed).unwrap().is_some());
        assert!(RangeFinder::new().not_delayed().find(&delayed).unwrap().is_none());
    }

    #[test]
    fn test_recursive_search() {
        let tree = Node::or(vec![
            Node::eq("NAME", "bob"),
            Node::group(age_range(CompareOp::Ge, CompareOp::Le)),
        ]);
        assert!(RangeFinder::new().find(&tree).unwrap().is_none());
        assert!(RangeFinder::new().recursive().find(&tree).unwrap().is_some());

        let two = Node::or(vec![
            age_range(CompareOp::Ge, CompareOp::Le),
            Node::and(vec![
                Node::term("NAME", CompareOp::Ge, "a"),
                Node::term("NAME", CompareOp::Lt, "m"),
            ]),
        ]);
        let ranges = RangeFinder::new().recursive().find_all(&two).unwrap();
        assert_eq!(ranges.len(), 2);
        assert!(matches!(ranges[1], Range::String(_)));
    }

    #[test]
    fn test_mixed_numeric_literals_in_either_order() {
        let forward = Node::and(vec![
            Node::term("AGE", CompareOp::Ge, 18),
            Node::term("AGE", CompareOp::Le, 65.5),
        ]);
        let reversed = Node::and(vec![
            Node::term("AGE", CompareOp::Le, 65.5),
            Node::term("AGE", CompareOp::Ge, 18),
        ]);
        for node in [forward, reversed] {
            let range = RangeFinder::new().find(&node).unwrap().unwrap();
            assert!(matches!(range, Range::Double(_)), "got {:?}", range);
            assert_eq!(range.upper().unwrap().value, Scalar::from(65.5));

            let marked = Node::marker(MarkerKind::Bounded, node);
            let range = RangeFinder::new().find(&marked).unwrap().unwrap();
            assert!(matches!(range, Range::Double(_)));
        }

        let long = Node::and(vec![
            Node::term("AGE", CompareOp::Ge, 18),
            Node::term("AGE", CompareOp::Le, 5_000_000_000_i64),
        ]);
        assert!(matches!(
            RangeFinder::new().find(&long).unwrap().unwrap(),
            Range::Long(_)
        ));
    }

    #[test]
    fn test_between_node() {
        let range = RangeFinder::new()
            .find(&age_range(CompareOp::Gt, CompareOp::Le))
            .unwrap()
            .unwrap();
        assert_eq!(
            range.to_between_node().unwrap().to_string(),
            "filter:between(AGE, 18, 65, false, true)"
        );
    }
}
