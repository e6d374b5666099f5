//! Parameter binding.
//!
//! Binding returns a new tree in which `$name` placeholders are replaced by
//! scalar or list nodes. The source tree is left untouched so a parsed
//! template can be bound any number of times.
//!
//! # Pruning
//!
//! With `prune_missing`, a placeholder that has no value removes the smallest
//! enclosing condition instead of failing:
//!
//! ```text
//! artistName = $name and dateOfBirth > $born     {name: "Picasso"}
//!   => artistName = "Picasso"
//! ```
//!
//! A list element that is missing is dropped from the list; an AND/OR loses
//! the child and collapses to its single survivor; any other node containing
//! the placeholder is removed as a whole.

use std::collections::HashMap;

use crate::{
    ast::{BinOp, Expr},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("no value for parameter ${0}")]
    Missing(String),

    #[error("too few parameter values: {expected} parameter(s), {got} value(s)")]
    TooFewValues { expected: usize, got: usize },

    #[error("too many parameter values: {expected} parameter(s), {got} value(s)")]
    TooManyValues { expected: usize, got: usize },
}

impl Expr {
    /// Bind named parameters from `values`.
    ///
    /// Returns `Ok(None)` only when pruning removed the whole expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use qualex::{parse, Value};
    ///
    /// let template = parse("artistName = $name and dateOfBirth > $born").unwrap();
    ///
    /// let mut values = HashMap::new();
    /// values.insert("name".to_string(), Value::from("Picasso"));
    ///
    /// let bound = template.params(&values, true).unwrap().unwrap();
    /// assert_eq!(bound.to_string(), r#"artistName = "Picasso""#);
    ///
    /// assert!(template.params(&values, false).is_err());
    /// ```
    pub fn params(
        &self,
        values: &HashMap<String, Value>,
        prune_missing: bool,
    ) -> Result<Option<Expr>, BindError> {
        let bound = Binder {
            values,
            prune_missing,
        }
        .bind(self)?;
        if bound.is_none() {
            log::debug!("parameter binding pruned the whole expression");
        }
        Ok(bound)
    }

    /// Bind parameters by position, in the order their names first appear.
    ///
    /// A name used more than once consumes a single value.
    pub fn params_positional(&self, values: &[Value]) -> Result<Expr, BindError> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.param_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        if values.len() < names.len() {
            return Err(BindError::TooFewValues {
                expected: names.len(),
                got: values.len(),
            });
        }
        if values.len() > names.len() {
            return Err(BindError::TooManyValues {
                expected: names.len(),
                got: values.len(),
            });
        }

        let map: HashMap<String, Value> = names
            .into_iter()
            .map(str::to_string)
            .zip(values.iter().cloned())
            .collect();

        // Every name is bound, so nothing can be pruned
        match self.params(&map, false)? {
            Some(bound) => Ok(bound),
            None => Ok(self.clone()),
        }
    }
}

/// Expression node standing for a bound value.
fn value_node(value: &Value) -> Expr {
    match value {
        Value::List(items) => Expr::List(items.iter().map(value_node).collect()),
        other => Expr::Scalar(other.clone()),
    }
}

struct Binder<'a> {
    values: &'a HashMap<String, Value>,
    prune_missing: bool,
}

impl Binder<'_> {
    fn bind(&self, expr: &Expr) -> Result<Option<Expr>, BindError> {
        Ok(match expr {
            Expr::Param(name) => match self.values.get(name) {
                Some(value) => Some(value_node(value)),
                None if self.prune_missing => {
                    log::trace!("pruning unbound parameter ${}", name);
                    None
                }
                None => return Err(BindError::Missing(name.clone())),
            },

            Expr::Path(_) | Expr::Scalar(_) | Expr::Enum(_) | Expr::True | Expr::False => {
                Some(expr.clone())
            }

            Expr::UnaryOp { op, operand } => self.bind(operand)?.map(|operand| Expr::unary(*op, operand)),

            Expr::BinaryOp { op, left, right } => {
                let (Some(left), Some(right)) = (self.bind(left)?, self.bind(right)?) else {
                    return Ok(None);
                };
                Some(match (op, &right) {
                    // A bound empty list folds the same way the parser folds `in ()`
                    (BinOp::In, Expr::List(items)) if items.is_empty() => Expr::False,
                    (BinOp::NotIn, Expr::List(items)) if items.is_empty() => Expr::True,
                    _ => Expr::binary(*op, left, right),
                })
            }

            Expr::Like {
                op,
                operand,
                pattern,
                escape,
            } => match (self.bind(operand)?, self.bind(pattern)?) {
                (Some(operand), Some(pattern)) => Some(Expr::Like {
                    op: *op,
                    operand: Box::new(operand),
                    pattern: Box::new(pattern),
                    escape: *escape,
                }),
                _ => None,
            },

            Expr::Between {
                negated,
                operand,
                lower,
                upper,
            } => match (self.bind(operand)?, self.bind(lower)?, self.bind(upper)?) {
                (Some(operand), Some(lower), Some(upper)) => Some(Expr::Between {
                    negated: *negated,
                    operand: Box::new(operand),
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                }),
                _ => None,
            },

            Expr::And(children) => self.bind_join(children)?.map(Expr::And).map(collapse),
            Expr::Or(children) => self.bind_join(children)?.map(Expr::Or).map(collapse),

            Expr::Function { name, args } => {
                let mut bound = Vec::with_capacity(args.len());
                for arg in args {
                    match self.bind(arg)? {
                        Some(arg) => bound.push(arg),
                        None => return Ok(None),
                    }
                }
                Some(Expr::Function {
                    name: name.clone(),
                    args: bound,
                })
            }

            Expr::List(items) => {
                let mut bound = Vec::with_capacity(items.len());
                for item in items {
                    // Missing elements are dropped, the list survives
                    if let Some(item) = self.bind(item)? {
                        bound.push(item);
                    }
                }
                Some(Expr::List(bound))
            }
        })
    }

    /// Bound children of a join, or `None` if every child was pruned.
    fn bind_join(&self, children: &[Expr]) -> Result<Option<Vec<Expr>>, BindError> {
        let mut bound = Vec::with_capacity(children.len());
        for child in children {
            if let Some(child) = self.bind(child)? {
                bound.push(child);
            }
        }
        Ok((!bound.is_empty()).then_some(bound))
    }
}

/// Replace a join left with a single child by that child.
fn collapse(join: Expr) -> Expr {
    match join {
        Expr::And(mut children) | Expr::Or(mut children) if children.len() == 1 => {
            children.remove(0)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn binds_named_parameters() {
        let e = parse("a = $x or b = $y").unwrap();
        let bound = e
            .params(&values(&[("x", Value::from(1)), ("y", Value::from("q"))]), false)
            .unwrap()
            .unwrap();
        assert_eq!(bound, parse(r#"a = 1 or b = "q""#).unwrap());
    }

    #[test]
    fn missing_without_pruning_is_an_error() {
        let e = parse("a = $x").unwrap();
        assert_eq!(
            e.params(&HashMap::new(), false),
            Err(BindError::Missing("x".to_string()))
        );
    }

    #[test]
    fn pruning_collapses_joins() {
        let e = parse("a = $x and (b = $y or c = $z)").unwrap();
        let bound = e
            .params(&values(&[("x", Value::from(1)), ("z", Value::from(3))]), true)
            .unwrap()
            .unwrap();
        assert_eq!(bound, parse("a = 1 and c = 3").unwrap());
    }

    #[test]
    fn pruning_everything_yields_none() {
        let e = parse("a = $x and b = $y").unwrap();
        assert_eq!(e.params(&HashMap::new(), true), Ok(None));
    }

    #[test]
    fn pruning_drops_list_elements() {
        let e = parse("a in ($x, $y, 3)").unwrap();
        let bound = e
            .params(&values(&[("y", Value::from(2))]), true)
            .unwrap()
            .unwrap();
        assert_eq!(bound, parse("a in (2, 3)").unwrap());
    }

    #[test]
    fn list_value_becomes_list_node() {
        let e = parse("a in $xs").unwrap();
        let bound = e
            .params(
                &values(&[("xs", Value::List(vec![Value::from(1), Value::from(2)]))]),
                false,
            )
            .unwrap()
            .unwrap();
        assert_eq!(bound, parse("a in (1, 2)").unwrap());
    }

    #[test]
    fn empty_list_value_folds() {
        let e = parse("a in $xs").unwrap();
        let bound = e
            .params(&values(&[("xs", Value::List(vec![]))]), false)
            .unwrap();
        assert_eq!(bound, Some(Expr::False));
    }

    #[test]
    fn positional_reuses_repeated_names() {
        let e = parse("a = $x or b = $x or c = $y").unwrap();
        let bound = e
            .params_positional(&[Value::from(1), Value::from(2)])
            .unwrap();
        assert_eq!(bound, parse("a = 1 or b = 1 or c = 2").unwrap());
    }

    #[test]
    fn positional_counts_must_match() {
        let e = parse("a = $x and b = $y").unwrap();
        assert_eq!(
            e.params_positional(&[Value::from(1)]),
            Err(BindError::TooFewValues {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            e.params_positional(&[Value::from(1), Value::from(2), Value::from(3)]),
            Err(BindError::TooManyValues {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn null_value_binds_null_scalar() {
        let e = parse("a = $x").unwrap();
        let bound = e.params_positional(&[Value::Null]).unwrap();
        assert_eq!(bound, parse("a = null").unwrap());
    }
}
