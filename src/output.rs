//! Canonical text rendering of expressions.
//!
//! The canonical form is deterministic and parses back to a structurally
//! equal tree, so it doubles as a cache key and as the `Display` form of
//! [`Expr`].
//!
//! # Features
//!
//! - **Minimal parentheses** - only where precedence or grouping requires them
//! - **Normalized quoting** - strings always use double quotes
//! - **Typed numbers** - floats carry a `d` suffix, decimals keep their scale
//!
//! # Examples
//!
//! ```
//! use qualex::parse;
//!
//! let expr = parse("p = 'a' AND (x + 1) * 2 > 3").unwrap();
//! assert_eq!(expr.to_string(), r#"p = "a" and (x + 1) * 2 > 3"#);
//! ```
//!
//! Values with no textual form (object references, non-finite floats) are
//! printed for diagnostics only and do not parse back.

use std::fmt;

use crate::{
    ast::{BinOp, Expr, UnOp},
    value::Value,
};

/// Binding strength, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,
    Or,
    And,
    Not,
    Relational,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Primary,
}

fn binop_prec(op: BinOp) -> Prec {
    match op {
        BinOp::Multiply | BinOp::Divide => Prec::Multiplicative,
        BinOp::Add | BinOp::Subtract => Prec::Additive,
        BinOp::ShiftLeft | BinOp::ShiftRight => Prec::Shift,
        BinOp::BitAnd => Prec::BitAnd,
        BinOp::BitXor => Prec::BitXor,
        BinOp::BitOr => Prec::BitOr,
        BinOp::Equal
        | BinOp::NotEqual
        | BinOp::LessThan
        | BinOp::GreaterThan
        | BinOp::LessEqual
        | BinOp::GreaterEqual
        | BinOp::In
        | BinOp::NotIn => Prec::Relational,
    }
}

fn prec_of(expr: &Expr) -> Prec {
    match expr {
        Expr::Or(_) => Prec::Or,
        Expr::And(_) => Prec::And,
        Expr::UnaryOp { op: UnOp::Not, .. } => Prec::Not,
        // The parser reads bare `true`/`false` as constants only in
        // condition position
        Expr::True | Expr::False => Prec::Not,
        Expr::Like { .. } | Expr::Between { .. } => Prec::Relational,
        Expr::BinaryOp { op, .. } => binop_prec(*op),
        Expr::UnaryOp { .. } => Prec::Unary,
        Expr::Path(_)
        | Expr::Scalar(_)
        | Expr::Enum(_)
        | Expr::Param(_)
        | Expr::Function { .. }
        | Expr::List(_) => Prec::Primary,
    }
}

/// Writes expressions in canonical form.
pub struct CanonicalPrinter<'w, 'f> {
    out: &'w mut fmt::Formatter<'f>,
}

impl<'w, 'f> CanonicalPrinter<'w, 'f> {
    pub fn new(out: &'w mut fmt::Formatter<'f>) -> Self {
        CanonicalPrinter { out }
    }

    pub fn print(&mut self, expr: &Expr) -> fmt::Result {
        self.print_at(expr, Prec::Lowest)
    }

    /// Print `expr` in a position that binds at least as tightly as `min`.
    fn print_at(&mut self, expr: &Expr, min: Prec) -> fmt::Result {
        if min != Prec::Lowest && prec_of(expr) <= min {
            self.out.write_str("(")?;
            self.print_bare(expr)?;
            self.out.write_str(")")
        } else {
            self.print_bare(expr)
        }
    }

    fn print_bare(&mut self, expr: &Expr) -> fmt::Result {
        match expr {
            Expr::Path(path) => write!(self.out, "{}", path),
            Expr::Scalar(value) => self.print_value(value),
            Expr::Enum(e) => write!(self.out, "enum:{}", e.qualified()),
            Expr::Param(name) => write!(self.out, "${}", name),
            Expr::True => self.out.write_str("true"),
            Expr::False => self.out.write_str("false"),

            Expr::UnaryOp { op: UnOp::Not, operand } => {
                self.out.write_str("not ")?;
                self.print_at(operand, Prec::And)
            }
            Expr::UnaryOp { op, operand } => {
                self.out
                    .write_str(if *op == UnOp::Negate { "-" } else { "~" })?;
                // `-3` would read back as a negative literal
                let literal = matches!(operand.as_ref(), Expr::Scalar(v) if v.is_number());
                if *op == UnOp::Negate && (literal || starts_with_sign(operand)) {
                    self.out.write_str("(")?;
                    self.print(operand)?;
                    self.out.write_str(")")
                } else {
                    self.print_at(operand, Prec::Multiplicative)
                }
            }

            Expr::BinaryOp { op, left, right } => {
                let prec = binop_prec(*op);
                if prec == Prec::Relational {
                    self.print_at(left, Prec::Relational)?;
                    write!(self.out, " {} ", op.symbol())?;
                    self.print_at(right, Prec::Relational)
                } else {
                    // Left-associative: equal precedence needs grouping on the right only
                    self.print_at(left, prec_below(prec))?;
                    write!(self.out, " {} ", op.symbol())?;
                    self.print_at(right, prec)
                }
            }

            Expr::Like {
                op,
                operand,
                pattern,
                escape,
            } => {
                self.print_at(operand, Prec::Relational)?;
                write!(self.out, " {} ", op.keyword())?;
                self.print_at(pattern, Prec::Relational)?;
                if let Some(c) = escape {
                    self.out.write_str(" escape ")?;
                    self.print_string(&c.to_string())?;
                }
                Ok(())
            }

            Expr::Between {
                negated,
                operand,
                lower,
                upper,
            } => {
                self.print_at(operand, Prec::Relational)?;
                self.out
                    .write_str(if *negated { " not between " } else { " between " })?;
                self.print_at(lower, Prec::Relational)?;
                self.out.write_str(" and ")?;
                self.print_at(upper, Prec::Relational)
            }

            Expr::And(children) => self.print_join(children, " and ", Prec::And),
            Expr::Or(children) => self.print_join(children, " or ", Prec::Or),

            Expr::Function { name, args } => {
                write!(self.out, "{}", name)?;
                self.print_list(args)
            }
            Expr::List(items) => self.print_list(items),
        }
    }

    fn print_join(&mut self, children: &[Expr], separator: &str, prec: Prec) -> fmt::Result {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.out.write_str(separator)?;
            }
            self.print_at(child, prec)?;
        }
        Ok(())
    }

    fn print_list(&mut self, items: &[Expr]) -> fmt::Result {
        self.out.write_str("(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.print(item)?;
        }
        self.out.write_str(")")
    }

    fn print_value(&mut self, value: &Value) -> fmt::Result {
        match value {
            Value::Null => self.out.write_str("null"),
            Value::Boolean(b) => write!(self.out, "{}", b),
            Value::Integer(n) => write!(self.out, "{}", n),
            Value::Decimal(d) if d.scale() == 0 => write!(self.out, "{}.0", d),
            Value::Decimal(d) => write!(self.out, "{}", d),
            Value::Float(n) => write!(self.out, "{:?}d", n),
            Value::String(s) => self.print_string(s),
            Value::Bytes(bytes) => {
                self.out.write_str("x'")?;
                for b in bytes {
                    write!(self.out, "{:02x}", b)?;
                }
                self.out.write_str("'")
            }
            Value::Object(o) => write!(self.out, "<{:?}>", o),
            Value::List(items) => {
                self.out.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(", ")?;
                    }
                    self.print_value(item)?;
                }
                self.out.write_str(")")
            }
        }
    }

    fn print_string(&mut self, s: &str) -> fmt::Result {
        write!(self.out, "\"{}\"", escape_string(s))
    }
}

/// The precedence immediately looser than `prec`.
fn prec_below(prec: Prec) -> Prec {
    match prec {
        Prec::Multiplicative => Prec::Additive,
        Prec::Additive => Prec::Shift,
        Prec::Shift => Prec::BitAnd,
        Prec::BitAnd => Prec::BitXor,
        Prec::BitXor => Prec::BitOr,
        Prec::BitOr => Prec::Relational,
        other => other,
    }
}

fn starts_with_sign(expr: &Expr) -> bool {
    match expr {
        Expr::UnaryOp {
            op: UnOp::Negate | UnOp::BitNot,
            ..
        } => true,
        Expr::Scalar(Value::Integer(n)) => *n < 0,
        Expr::Scalar(Value::Decimal(d)) => d.is_sign_negative(),
        Expr::Scalar(Value::Float(n)) => n.is_sign_negative(),
        Expr::BinaryOp { left, .. } => starts_with_sign(left),
        _ => false,
    }
}

/// Escape a string body for double-quoted output.
pub fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        CanonicalPrinter::new(f).print(self)
    }
}

/// Canonical text of `expr`.
pub fn to_canonical(expr: &Expr) -> String {
    expr.to_string()
}
