//! Expression tree
//!
//! Trees are produced elsewhere (a query parser and its rewriting passes) and handed over
//! ready-made, usually as JSON. The evaluator only reads them, apart from small fragments
//! it synthesizes when collapsing ranges.
//!
//! `Display` renders a canonical, JEXL-like text. Two structurally identical subtrees render
//! identically, which is what the interpreter memoizes on.

use crate::value::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    And {
        children: Vec<Node>,
    },
    Or {
        children: Vec<Node>,
    },
    Not {
        child: Box<Node>,
    },
    Compare {
        op: CompareOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Namespaced function call, e.g. `filter:includeRegex(NAME, 'bo.*')`.
    Function {
        namespace: String,
        name: String,
        #[serde(default)]
        args: Vec<Node>,
    },
    /// Method chained onto another node, e.g. `filter:getAllMatches(...).size()`.
    Method {
        target: Box<Node>,
        name: String,
        #[serde(default)]
        args: Vec<Node>,
    },
    Identifier {
        name: String,
    },
    /// `None` is the null literal.
    Literal {
        #[serde(default)]
        value: Option<Scalar>,
    },
    Assignment {
        name: String,
        value: Box<Node>,
    },
    If {
        condition: Box<Node>,
        then: Box<Node>,
        #[serde(default)]
        otherwise: Option<Box<Node>>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Parenthesized wrapper.
    Group {
        child: Box<Node>,
    },
    /// Query-property marker wrapping the subtree it describes.
    Marker {
        kind: MarkerKind,
        source: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Regex match, `=~`.
    Er,
    /// Regex non-match, `!~`.
    Nr,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Er => "=~",
            CompareOp::Nr => "!~",
        }
    }

    /// Operator with its operands swapped: `a < b` is `b > a`.
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            other => other,
        }
    }

    pub fn is_lower_bound(self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Ge)
    }

    pub fn is_upper_bound(self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Le)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArithmeticOp {
    Add,
    Sub,
}

/// Kinds of query-property markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerKind {
    /// The source is a two-sided range over one field.
    Bounded,
    /// The source references index-only fields fetched on demand.
    Delayed,
    /// The source is only evaluated against documents, never used to plan index scans.
    EvaluationOnly,
    /// Expansion of a single term exceeded its threshold; its alternatives are the
    /// candidate set registered under `candidates`.
    ExceededValue { candidates: String },
    /// An OR over too many values of `field` was replaced by the candidate set `candidates`.
    ExceededOr { field: String, candidates: String },
}

impl MarkerKind {
    fn label(&self) -> &'static str {
        match self {
            MarkerKind::Bounded => "_Bounded_",
            MarkerKind::Delayed => "_Delayed_",
            MarkerKind::EvaluationOnly => "_Eval_",
            MarkerKind::ExceededValue { .. } => "_Value_",
            MarkerKind::ExceededOr { .. } => "_List_",
        }
    }

    /// Markers that only wrap their source without changing its meaning.
    pub fn is_transparent(&self) -> bool {
        matches!(self, MarkerKind::Delayed | MarkerKind::EvaluationOnly)
    }
}

// ============================================================================
// Builders
// ============================================================================

impl Node {
    pub fn and(children: Vec<Node>) -> Node {
        Node::And { children }
    }

    pub fn or(children: Vec<Node>) -> Node {
        Node::Or { children }
    }

    pub fn not(child: Node) -> Node {
        Node::Not {
            child: Box::new(child),
        }
    }

    pub fn group(child: Node) -> Node {
        Node::Group {
            child: Box::new(child),
        }
    }

    pub fn ident(name: &str) -> Node {
        Node::Identifier {
            name: name.to_string(),
        }
    }

    pub fn lit(value: impl Into<Scalar>) -> Node {
        Node::Literal {
            value: Some(value.into()),
        }
    }

    pub fn null() -> Node {
        Node::Literal { value: None }
    }

    pub fn compare(op: CompareOp, left: Node, right: Node) -> Node {
        Node::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `field <op> literal`
    pub fn term(field: &str, op: CompareOp, value: impl Into<Scalar>) -> Node {
        Node::compare(op, Node::ident(field), Node::lit(value))
    }

    pub fn eq(field: &str, value: impl Into<Scalar>) -> Node {
        Node::term(field, CompareOp::Eq, value)
    }

    pub fn function(namespace: &str, name: &str, args: Vec<Node>) -> Node {
        Node::Function {
            namespace: namespace.to_string(),
            name: name.to_string(),
            args,
        }
    }

    pub fn method(target: Node, name: &str, args: Vec<Node>) -> Node {
        Node::Method {
            target: Box::new(target),
            name: name.to_string(),
            args,
        }
    }

    pub fn marker(kind: MarkerKind, source: Node) -> Node {
        Node::Marker {
            kind,
            source: Box::new(source),
        }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Node, right: Node) -> Node {
        Node::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Strip any number of parenthesized wrappers.
    pub fn unwrap_group(&self) -> &Node {
        let mut node = self;
        while let Node::Group { child } = node {
            node = child;
        }
        node
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.unwrap_group(), Node::Identifier { .. })
    }

    /// Names of all identifiers in this subtree.
    pub fn field_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_fields(&mut names);
        names
    }

    fn collect_fields(&self, names: &mut BTreeSet<String>) {
        match self {
            Node::Identifier { name } => {
                names.insert(name.clone());
            }
            Node::And { children } | Node::Or { children } => {
                children.iter().for_each(|c| c.collect_fields(names));
            }
            Node::Not { child } | Node::Group { child } => child.collect_fields(names),
            Node::Compare { left, right, .. } | Node::Arithmetic { left, right, .. } => {
                left.collect_fields(names);
                right.collect_fields(names);
            }
            Node::Function { args, .. } => args.iter().for_each(|a| a.collect_fields(names)),
            Node::Method { target, args, .. } => {
                target.collect_fields(names);
                args.iter().for_each(|a| a.collect_fields(names));
            }
            Node::Assignment { value, .. } => value.collect_fields(names),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_fields(names);
                then.collect_fields(names);
                if let Some(o) = otherwise {
                    o.collect_fields(names);
                }
            }
            Node::Marker { kind, source } => {
                if let MarkerKind::ExceededOr { field, .. } = kind {
                    names.insert(field.clone());
                }
                source.collect_fields(names);
            }
            Node::Literal { .. } => {}
        }
    }
}

// ============================================================================
// Canonical rendering
// ============================================================================

fn write_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node], sep: &str) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", node)?;
    }
    Ok(())
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Option<Scalar>) -> fmt::Result {
    match value {
        None => f.write_str("null"),
        Some(Scalar::String(s)) => {
            f.write_str("'")?;
            for c in s.chars() {
                if c == '\'' || c == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{}", c)?;
            }
            f.write_str("'")
        }
        Some(other) => write!(f, "{}", other),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::And { children } => {
                f.write_str("(")?;
                write_joined(f, children, " && ")?;
                f.write_str(")")
            }
            Node::Or { children } => {
                f.write_str("(")?;
                write_joined(f, children, " || ")?;
                f.write_str(")")
            }
            Node::Not { child } => write!(f, "!{}", child),
            Node::Compare { op, left, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Node::Function {
                namespace,
                name,
                args,
            } => {
                write!(f, "{}:{}(", namespace, name)?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            Node::Method { target, name, args } => {
                write!(f, "{}.{}(", target, name)?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            Node::Identifier { name } => f.write_str(name),
            Node::Literal { value } => write_literal(f, value),
            Node::Assignment { name, value } => write!(f, "{} = {}", name, value),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                write!(f, "if ({}) {{ {} }}", condition, then)?;
                if let Some(o) = otherwise {
                    write!(f, " else {{ {} }}", o)?;
                }
                Ok(())
            }
            Node::Arithmetic { op, left, right } => {
                let symbol = match op {
                    ArithmeticOp::Add => "+",
                    ArithmeticOp::Sub => "-",
                };
                write!(f, "{} {} {}", left, symbol, right)
            }
            Node::Group { child } => write!(f, "({})", child),
            Node::Marker { kind, source } => match kind {
                MarkerKind::ExceededValue { candidates } => {
                    write!(f, "(({} = '{}') && ({}))", kind.label(), candidates, source)
                }
                MarkerKind::ExceededOr { field, candidates } => write!(
                    f,
                    "(({} = '{}:{}') && ({}))",
                    kind.label(),
                    field,
                    candidates,
                    source
                ),
                _ => write!(f, "(({} = true) && ({}))", kind.label(), source),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rendering() {
        let node = Node::and(vec![
            Node::term("AGE", CompareOp::Ge, 18),
            Node::eq("NAME", "o'neil"),
        ]);
        assert_eq!(node.to_string(), r"(AGE >= 18 && NAME == 'o\'neil')");

        let marked = Node::marker(MarkerKind::Bounded, node);
        assert!(marked.to_string().starts_with("((_Bounded_ = true) && ("));
    }

    #[test]
    fn test_field_names() {
        let node = Node::or(vec![
            Node::eq("A", "x"),
            Node::not(Node::eq("B", "y")),
            Node::function("filter", "isNull", vec![Node::ident("C")]),
        ]);
        let names: Vec<String> = node.field_names().into_iter().collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_json_tree() {
        let json = r#"{
            "node": "compare",
            "op": "EQ",
            "left": {"node": "identifier", "name": "NAME"},
            "right": {"node": "literal", "value": "bob"}
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node, Node::eq("NAME", "bob"));

        let marker = r#"{
            "node": "marker",
            "kind": {"type": "exceeded_or", "field": "NAME", "candidates": "names"},
            "source": {"node": "literal"}
        }"#;
        let node: Node = serde_json::from_str(marker).unwrap();
        assert!(matches!(
            node,
            Node::Marker { kind: MarkerKind::ExceededOr { .. }, .. }
        ));
    }
}
