//! Parameterized rendering.
//!
//! Produces query text in which every literal is replaced by a positional
//! marker, together with the ordered list of values those markers stand for.
//! Object references are bound by their identity scalar, obtained from the
//! host's [`PropertyAccessor`].
//!
//! ```
//! use qualex::parse;
//! use qualex::translate::{ParameterizedRenderer, RenderOptions};
//! use qualex::Value;
//!
//! let expr = parse("artistName in ('a', 'b') and dateOfBirth = null").unwrap();
//! let rendered = ParameterizedRenderer::new(RenderOptions::default())
//!     .render(&expr)
//!     .unwrap();
//!
//! assert_eq!(rendered.text, "artistName in (?1, ?2) and dateOfBirth is null");
//! assert_eq!(rendered.bindings, vec![Value::from("a"), Value::from("b")]);
//! ```

use crate::{
    accessor::{AccessError, EnumResolver, PropertyAccessor},
    ast::{BinOp, Expr, LikeOp, Path, PathKind, UnOp},
    value::Value,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The node has no form in the target syntax
    #[error("cannot render {0} as a parameterized query")]
    Unsupported(String),

    #[error("cannot resolve enum:{0}")]
    UnresolvedEnum(String),

    #[error(transparent)]
    Identity(#[from] AccessError),
}

/// How positional markers are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerStyle {
    /// `?1`, `?2`, ...
    #[default]
    Numbered,
    /// `?`
    Plain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Identification variable prepended to every object path (`a.artistName`)
    pub root_alias: Option<String>,
    pub markers: MarkerStyle,
}

impl RenderOptions {
    pub fn with_root_alias(mut self, alias: impl Into<String>) -> Self {
        self.root_alias = Some(alias.into());
        self
    }

    pub fn with_markers(mut self, markers: MarkerStyle) -> Self {
        self.markers = markers;
        self
    }
}

/// Query text plus the values of its positional markers, in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub bindings: Vec<Value>,
}

pub struct ParameterizedRenderer<'a> {
    options: RenderOptions,
    accessor: Option<&'a dyn PropertyAccessor>,
    enums: Option<&'a dyn EnumResolver>,
}

impl<'a> ParameterizedRenderer<'a> {
    pub fn new(options: RenderOptions) -> Self {
        ParameterizedRenderer {
            options,
            accessor: None,
            enums: None,
        }
    }

    /// Accessor used to turn object references into identity scalars.
    pub fn with_accessor(mut self, accessor: &'a dyn PropertyAccessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_enums(mut self, enums: &'a dyn EnumResolver) -> Self {
        self.enums = Some(enums);
        self
    }

    pub fn render(&self, expr: &Expr) -> Result<Rendered, RenderError> {
        let mut out = Output {
            renderer: self,
            text: String::new(),
            bindings: Vec::new(),
        };
        out.node(expr)?;
        log::debug!(
            "rendered parameterized query with {} binding(s)",
            out.bindings.len()
        );
        Ok(Rendered {
            text: out.text,
            bindings: out.bindings,
        })
    }
}

struct Output<'r, 'a> {
    renderer: &'r ParameterizedRenderer<'a>,
    text: String,
    bindings: Vec<Value>,
}

impl Output<'_, '_> {
    fn node(&mut self, expr: &Expr) -> Result<(), RenderError> {
        match expr {
            Expr::Path(path) => self.path(path),
            Expr::Scalar(Value::Null) => {
                self.text.push_str("null");
                Ok(())
            }
            Expr::Scalar(value) => self.bind(value),
            Expr::Enum(e) => {
                let value = self
                    .renderer
                    .enums
                    .and_then(|enums| enums.resolve_enum_member(&e.type_name, &e.member))
                    .ok_or_else(|| RenderError::UnresolvedEnum(e.qualified()))?;
                self.bind(&value)
            }
            Expr::Param(name) => {
                self.text.push(':');
                self.text.push_str(name);
                Ok(())
            }
            Expr::True => {
                self.text.push_str("1 = 1");
                Ok(())
            }
            Expr::False => {
                self.text.push_str("1 = 0");
                Ok(())
            }

            Expr::UnaryOp { op, operand } => {
                self.text.push_str(match op {
                    UnOp::Negate => "-",
                    UnOp::BitNot => "~",
                    UnOp::Not => "not ",
                });
                self.grouped(operand)
            }

            // `= null` has no meaning in the target syntax
            Expr::BinaryOp {
                op: op @ (BinOp::Equal | BinOp::NotEqual),
                left,
                right,
            } if is_null(right) || is_null(left) => {
                let operand = if is_null(right) { left } else { right };
                self.grouped(operand)?;
                self.text.push_str(if *op == BinOp::Equal {
                    " is null"
                } else {
                    " is not null"
                });
                Ok(())
            }
            Expr::BinaryOp { op, left, right } => {
                self.grouped(left)?;
                self.text.push(' ');
                self.text.push_str(match op {
                    BinOp::NotEqual => "<>",
                    op => op.symbol(),
                });
                self.text.push(' ');
                match (op, right.as_ref()) {
                    (
                        BinOp::In | BinOp::NotIn,
                        Expr::Param(_) | Expr::List(_) | Expr::Scalar(Value::List(_)),
                    ) => self.node(right),
                    (BinOp::In | BinOp::NotIn, single) => {
                        self.text.push('(');
                        self.node(single)?;
                        self.text.push(')');
                        Ok(())
                    }
                    _ => self.grouped(right),
                }
            }

            Expr::Like {
                op,
                operand,
                pattern,
                escape,
            } => {
                let fold = op.ignores_case();
                self.folded(operand, fold)?;
                self.text.push_str(match op {
                    LikeOp::Like | LikeOp::LikeIgnoreCase => " like ",
                    LikeOp::NotLike | LikeOp::NotLikeIgnoreCase => " not like ",
                });
                self.folded(pattern, fold)?;
                if let Some(c) = escape {
                    self.text.push_str(" escape '");
                    if *c == '\'' {
                        self.text.push('\'');
                    }
                    self.text.push(*c);
                    self.text.push('\'');
                }
                Ok(())
            }

            Expr::Between {
                negated,
                operand,
                lower,
                upper,
            } => {
                self.grouped(operand)?;
                self.text
                    .push_str(if *negated { " not between " } else { " between " });
                self.grouped(lower)?;
                self.text.push_str(" and ");
                self.grouped(upper)
            }

            Expr::And(children) => self.join(children, " and "),
            Expr::Or(children) => self.join(children, " or "),

            Expr::Function { name, args } => self.call(name, args),
            Expr::List(items) => self.list(items),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<(), RenderError> {
        if let (Some(part), [arg]) = (date_part(name), args) {
            self.text.push_str("extract(");
            self.text.push_str(part);
            self.text.push_str(" from ");
            self.node(arg)?;
            self.text.push(')');
            return Ok(());
        }
        match (name, args) {
            ("count", []) => self.text.push_str("count(*)"),
            ("countDistinct", [arg]) => {
                self.text.push_str("count(distinct ");
                self.node(arg)?;
                self.text.push(')');
            }
            ("currentDate", []) => self.text.push_str("current_date"),
            ("currentTime", []) => self.text.push_str("current_time"),
            ("currentTimestamp", []) => self.text.push_str("current_timestamp"),
            _ => {
                self.text.push_str(name);
                self.list(args)?;
            }
        }
        Ok(())
    }

    /// Render `expr`, parenthesized unless it is a leaf or a call.
    fn grouped(&mut self, expr: &Expr) -> Result<(), RenderError> {
        if expr.is_leaf() || matches!(expr, Expr::Function { .. } | Expr::List(_)) {
            self.node(expr)
        } else {
            self.text.push('(');
            self.node(expr)?;
            self.text.push(')');
            Ok(())
        }
    }

    fn folded(&mut self, expr: &Expr, fold: bool) -> Result<(), RenderError> {
        if !fold {
            return self.grouped(expr);
        }
        self.text.push_str("upper(");
        self.node(expr)?;
        self.text.push(')');
        Ok(())
    }

    fn join(&mut self, children: &[Expr], separator: &str) -> Result<(), RenderError> {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.text.push_str(separator);
            }
            if matches!(child, Expr::And(_) | Expr::Or(_)) {
                self.text.push('(');
                self.node(child)?;
                self.text.push(')');
            } else {
                self.node(child)?;
            }
        }
        Ok(())
    }

    fn list(&mut self, items: &[Expr]) -> Result<(), RenderError> {
        self.text.push('(');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            self.node(item)?;
        }
        self.text.push(')');
        Ok(())
    }

    fn path(&mut self, path: &Path) -> Result<(), RenderError> {
        if path.kind() != PathKind::Object {
            return Err(RenderError::Unsupported(format!("path '{}'", path)));
        }
        if let Some(root) = &self.renderer.options.root_alias {
            self.text.push_str(root);
            self.text.push('.');
        }
        let body = path
            .segments()
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(".");
        self.text.push_str(&body);
        Ok(())
    }

    /// Emit a marker for `value` and record the binding.
    fn bind(&mut self, value: &Value) -> Result<(), RenderError> {
        match value {
            Value::List(items) => {
                self.text.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.text.push_str(", ");
                    }
                    self.bind(item)?;
                }
                self.text.push(')');
                return Ok(());
            }
            Value::Object(object) => {
                let accessor = self.renderer.accessor.ok_or_else(|| {
                    RenderError::Unsupported("an object reference without an accessor".to_string())
                })?;
                let identity = accessor.extract_identity(object)?;
                self.bindings.push(identity);
            }
            other => self.bindings.push(other.clone()),
        }

        match self.renderer.options.markers {
            MarkerStyle::Numbered => {
                self.text.push('?');
                self.text.push_str(&self.bindings.len().to_string());
            }
            MarkerStyle::Plain => self.text.push('?'),
        }
        Ok(())
    }
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Scalar(Value::Null))
}

/// Field name used by `extract(... from x)` for a date part function.
fn date_part(name: &str) -> Option<&'static str> {
    Some(match name {
        "year" => "year",
        "month" => "month",
        "week" => "week",
        "dayOfYear" => "doy",
        "dayOfMonth" => "day",
        "dayOfWeek" => "dow",
        "hour" => "hour",
        "minute" => "minute",
        "second" => "second",
        _ => return None,
    })
}
