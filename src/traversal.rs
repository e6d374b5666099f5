//! Pre-order traversal with callbacks, used for diagnostics.
//!
//! Internal nodes are reported through [`TraversalHandler::start_node`] and
//! [`TraversalHandler::end_node`]. Scalars, enum references and parameter
//! placeholders are leaf objects of their parent; a path is a node whose
//! single leaf is its path string.

use crate::ast::{EnumRef, Expr, Path};
use crate::value::Value;

/// A leaf object met during traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Value(&'a Value),
    Enum(&'a EnumRef),
    Param(&'a str),
    Path(&'a Path),
}

impl<'a> Leaf<'a> {
    fn of(expr: &'a Expr) -> Option<Leaf<'a>> {
        match expr {
            Expr::Scalar(v) => Some(Leaf::Value(v)),
            Expr::Enum(e) => Some(Leaf::Enum(e)),
            Expr::Param(name) => Some(Leaf::Param(name)),
            _ => None,
        }
    }
}

/// Callbacks invoked by [`Expr::traverse`]. Every method defaults to doing
/// nothing.
pub trait TraversalHandler {
    fn start_node(&mut self, _node: &Expr, _parent: Option<&Expr>) {}

    /// Called after child `index` of `node` has been fully visited.
    fn finished_child(&mut self, _node: &Expr, _index: usize, _has_more: bool) {}

    fn end_node(&mut self, _node: &Expr, _parent: Option<&Expr>) {}

    fn object_node(&mut self, _leaf: Leaf<'_>, _parent: Option<&Expr>) {}
}

impl Expr {
    /// Walk the tree in pre-order, reporting to `handler`.
    pub fn traverse(&self, handler: &mut impl TraversalHandler) {
        self.traverse_from(None, handler);
    }

    fn traverse_from(&self, parent: Option<&Expr>, handler: &mut impl TraversalHandler) {
        if let Some(leaf) = Leaf::of(self) {
            handler.object_node(leaf, parent);
            return;
        }

        handler.start_node(self, parent);
        if let Expr::Path(path) = self {
            handler.object_node(Leaf::Path(path), Some(self));
            handler.finished_child(self, 0, false);
        } else {
            let children = self.operands();
            let count = children.len();
            for (i, child) in children.into_iter().enumerate() {
                child.traverse_from(Some(self), handler);
                handler.finished_child(self, i, i + 1 < count);
            }
        }
        handler.end_node(self, parent);
    }
}

/// Counts nodes and leaves and records structural problems.
///
/// ```
/// use qualex::parse;
/// use qualex::traversal::NodeCounter;
///
/// let expr = parse("estimatedPrice between 3000 and 15000").unwrap();
/// let counter = NodeCounter::count(&expr);
/// assert_eq!(counter.nodes(), 2);
/// assert_eq!(counter.leaves(), 3);
/// assert!(counter.violations().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NodeCounter {
    nodes: usize,
    leaves: usize,
    violations: Vec<String>,
}

impl NodeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(expr: &Expr) -> Self {
        let mut counter = NodeCounter::new();
        expr.traverse(&mut counter);
        counter
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    fn check(&mut self, node: &Expr) {
        match node {
            Expr::And(children) | Expr::Or(children) if children.is_empty() => {
                self.violations
                    .push(format!("{} node without children", node.kind()));
            }
            Expr::Path(path) if path.segments().iter().any(|s| s.name.is_empty()) => {
                self.violations.push(format!("empty segment in path '{}'", path));
            }
            Expr::Like {
                escape: Some('?'), ..
            } => {
                self.violations
                    .push("'?' cannot be used as an escape character".to_string());
            }
            Expr::BinaryOp { op, right, .. }
                if matches!(right.as_ref(), Expr::List(items) if items.is_empty()) =>
            {
                self.violations
                    .push(format!("empty value list on the right of '{}'", op.symbol()));
            }
            Expr::Function { name, args } => {
                if let Some(expected) = function_arity(name)
                    && expected != args.len()
                {
                    self.violations.push(format!(
                        "{}() expects {} argument(s), has {}",
                        name,
                        expected,
                        args.len()
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Fixed argument count of a built-in function; `None` for variadic or
/// unknown functions.
fn function_arity(name: &str) -> Option<usize> {
    match name {
        "currentDate" | "currentTime" | "currentTimestamp" => Some(0),
        "upper" | "lower" | "trim" | "length" | "abs" | "sqrt" => Some(1),
        "countDistinct" | "min" | "max" | "sum" | "avg" => Some(1),
        "year" | "month" | "week" | "dayOfYear" | "dayOfMonth" | "dayOfWeek" | "hour"
        | "minute" | "second" => Some(1),
        "locate" | "mod" => Some(2),
        "substring" => Some(3),
        _ => None,
    }
}

impl TraversalHandler for NodeCounter {
    fn start_node(&mut self, node: &Expr, _parent: Option<&Expr>) {
        self.nodes += 1;
        self.check(node);
    }

    fn object_node(&mut self, _leaf: Leaf<'_>, _parent: Option<&Expr>) {
        self.leaves += 1;
    }
}
