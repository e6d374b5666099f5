use std::fmt;

use crate::{
    ast::{BinOp, LikeOp, Path, PathKind, UnOp},
    value::Value,
};

/// Reference to an enum member, resolved only when evaluated.
///
/// # Example
/// ```text
/// enum:org.example.Color.RED
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRef {
    /// Fully qualified type name (`org.example.Color`)
    pub type_name: String,
    /// Member name (`RED`)
    pub member: String,
}

impl EnumRef {
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        EnumRef {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Split `Type.MEMBER` at the last dot. `None` unless both halves are
    /// present and no dotted component is empty.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (type_name, member) = qualified.rsplit_once('.')?;
        if member.is_empty() || type_name.split('.').any(str::is_empty) {
            return None;
        }
        Some(EnumRef::new(type_name, member))
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.type_name, self.member)
    }
}

/// Abstract Syntax Tree node of a qualifier expression.
///
/// Every node exclusively owns its children. Trees are built by the parser or
/// by the [`factory`](crate::factory) functions and are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Leaves
    /// Property path
    ///
    /// # Examples
    /// ```text
    /// artistName
    /// paintingArray#p.toGallery+.galleryName
    /// db:ARTIST_NAME
    /// ```
    Path(Path),

    /// Literal scalar
    ///
    /// # Examples
    /// ```text
    /// "Picasso"
    /// 42
    /// 3.50
    /// null
    /// ```
    Scalar(Value),

    /// Enum member reference (`enum:Type.MEMBER`)
    Enum(EnumRef),

    /// Named parameter placeholder (`$name`)
    Param(String),

    /// Constant true condition
    True,

    /// Constant false condition
    False,

    // Operations
    /// Negation, bitwise complement or logical NOT
    UnaryOp { op: UnOp, operand: Box<Expr> },

    /// Arithmetic, bitwise, comparison or membership
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Pattern match with optional escape character
    ///
    /// # Example
    /// ```text
    /// paintingTitle like "50!%%" escape "!"
    /// ```
    Like {
        op: LikeOp,
        operand: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<char>,
    },

    /// Inclusive range check
    Between {
        negated: bool,
        operand: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },

    /// Logical AND over one or more conditions
    And(Vec<Expr>),

    /// Logical OR over one or more conditions
    Or(Vec<Expr>),

    /// Function call
    ///
    /// # Example
    /// ```text
    /// upper(artistName) = "PICASSO"
    /// ```
    Function { name: String, args: Vec<Expr> },

    /// Value list, the right-hand side of `in`
    List(Vec<Expr>),
}

/// Node type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    And,
    Or,
    Not,
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanEqualTo,
    GreaterThanEqualTo,
    Between,
    NotBetween,
    In,
    NotIn,
    Like,
    LikeIgnoreCase,
    NotLike,
    NotLikeIgnoreCase,
    Add,
    Subtract,
    Multiply,
    Divide,
    Negative,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    BitwiseLeftShift,
    BitwiseRightShift,
    ObjPath,
    DbPath,
    DbIdPath,
    List,
    True,
    False,
    Scalar,
    Enum,
    Parameter,
    FunctionCall,
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        use ExprKind::*;
        match self {
            And => "AND",
            Or => "OR",
            Not => "NOT",
            EqualTo => "EQUAL_TO",
            NotEqualTo => "NOT_EQUAL_TO",
            LessThan => "LESS_THAN",
            GreaterThan => "GREATER_THAN",
            LessThanEqualTo => "LESS_THAN_EQUAL_TO",
            GreaterThanEqualTo => "GREATER_THAN_EQUAL_TO",
            Between => "BETWEEN",
            NotBetween => "NOT_BETWEEN",
            In => "IN",
            NotIn => "NOT_IN",
            Like => "LIKE",
            LikeIgnoreCase => "LIKE_IGNORE_CASE",
            NotLike => "NOT_LIKE",
            NotLikeIgnoreCase => "NOT_LIKE_IGNORE_CASE",
            Add => "ADD",
            Subtract => "SUBTRACT",
            Multiply => "MULTIPLY",
            Divide => "DIVIDE",
            Negative => "NEGATIVE",
            BitwiseAnd => "BITWISE_AND",
            BitwiseOr => "BITWISE_OR",
            BitwiseXor => "BITWISE_XOR",
            BitwiseNot => "BITWISE_NOT",
            BitwiseLeftShift => "BITWISE_LEFT_SHIFT",
            BitwiseRightShift => "BITWISE_RIGHT_SHIFT",
            ObjPath => "OBJ_PATH",
            DbPath => "DB_PATH",
            DbIdPath => "DBID_PATH",
            List => "LIST",
            True => "TRUE",
            False => "FALSE",
            Scalar => "SCALAR",
            Enum => "ENUM",
            Parameter => "PARAMETER",
            FunctionCall => "FUNCTION_CALL",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Expr {
    pub fn path(path: Path) -> Expr {
        Expr::Path(path)
    }

    pub fn scalar(value: impl Into<Value>) -> Expr {
        Expr::Scalar(value.into())
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Path(p) => match p.kind() {
                PathKind::Object => ExprKind::ObjPath,
                PathKind::Db => ExprKind::DbPath,
                PathKind::DbId => ExprKind::DbIdPath,
            },
            Expr::Scalar(_) => ExprKind::Scalar,
            Expr::Enum(_) => ExprKind::Enum,
            Expr::Param(_) => ExprKind::Parameter,
            Expr::True => ExprKind::True,
            Expr::False => ExprKind::False,
            Expr::UnaryOp { op, .. } => match op {
                UnOp::Negate => ExprKind::Negative,
                UnOp::BitNot => ExprKind::BitwiseNot,
                UnOp::Not => ExprKind::Not,
            },
            Expr::BinaryOp { op, .. } => match op {
                BinOp::Add => ExprKind::Add,
                BinOp::Subtract => ExprKind::Subtract,
                BinOp::Multiply => ExprKind::Multiply,
                BinOp::Divide => ExprKind::Divide,
                BinOp::BitAnd => ExprKind::BitwiseAnd,
                BinOp::BitOr => ExprKind::BitwiseOr,
                BinOp::BitXor => ExprKind::BitwiseXor,
                BinOp::ShiftLeft => ExprKind::BitwiseLeftShift,
                BinOp::ShiftRight => ExprKind::BitwiseRightShift,
                BinOp::Equal => ExprKind::EqualTo,
                BinOp::NotEqual => ExprKind::NotEqualTo,
                BinOp::LessThan => ExprKind::LessThan,
                BinOp::GreaterThan => ExprKind::GreaterThan,
                BinOp::LessEqual => ExprKind::LessThanEqualTo,
                BinOp::GreaterEqual => ExprKind::GreaterThanEqualTo,
                BinOp::In => ExprKind::In,
                BinOp::NotIn => ExprKind::NotIn,
            },
            Expr::Like { op, .. } => match op {
                LikeOp::Like => ExprKind::Like,
                LikeOp::LikeIgnoreCase => ExprKind::LikeIgnoreCase,
                LikeOp::NotLike => ExprKind::NotLike,
                LikeOp::NotLikeIgnoreCase => ExprKind::NotLikeIgnoreCase,
            },
            Expr::Between { negated: false, .. } => ExprKind::Between,
            Expr::Between { negated: true, .. } => ExprKind::NotBetween,
            Expr::And(_) => ExprKind::And,
            Expr::Or(_) => ExprKind::Or,
            Expr::Function { .. } => ExprKind::FunctionCall,
            Expr::List(_) => ExprKind::List,
        }
    }

    /// Child expressions in order. Leaves have none.
    pub fn operands(&self) -> Vec<&Expr> {
        match self {
            Expr::Path(_)
            | Expr::Scalar(_)
            | Expr::Enum(_)
            | Expr::Param(_)
            | Expr::True
            | Expr::False => vec![],
            Expr::UnaryOp { operand, .. } => vec![operand.as_ref()],
            Expr::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Like {
                operand, pattern, ..
            } => vec![operand.as_ref(), pattern.as_ref()],
            Expr::Between {
                operand,
                lower,
                upper,
                ..
            } => vec![operand.as_ref(), lower.as_ref(), upper.as_ref()],
            Expr::And(children) | Expr::Or(children) | Expr::List(children) => {
                children.iter().collect()
            }
            Expr::Function { args, .. } => args.iter().collect(),
        }
    }

    pub fn operand_count(&self) -> usize {
        self.operands().len()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::Path(_)
                | Expr::Scalar(_)
                | Expr::Enum(_)
                | Expr::Param(_)
                | Expr::True
                | Expr::False
        )
    }

    /// Join with `other` under AND, flattening nested ANDs.
    pub fn and_exp(self, other: Expr) -> Expr {
        self.and_all([other])
    }

    pub fn and_all(self, others: impl IntoIterator<Item = Expr>) -> Expr {
        let mut children = Vec::new();
        for e in std::iter::once(self).chain(others) {
            match e {
                Expr::And(inner) => children.extend(inner),
                e => children.push(e),
            }
        }
        Expr::And(children)
    }

    /// Join with `other` under OR, flattening nested ORs.
    pub fn or_exp(self, other: Expr) -> Expr {
        self.or_all([other])
    }

    pub fn or_all(self, others: impl IntoIterator<Item = Expr>) -> Expr {
        let mut children = Vec::new();
        for e in std::iter::once(self).chain(others) {
            match e {
                Expr::Or(inner) => children.extend(inner),
                e => children.push(e),
            }
        }
        Expr::Or(children)
    }

    pub fn not_exp(self) -> Expr {
        Expr::unary(UnOp::Not, self)
    }

    /// Visit every path in the tree, left to right.
    pub fn try_for_each_path<E>(
        &self,
        f: &mut impl FnMut(&Path) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Expr::Path(path) = self {
            return f(path);
        }
        for child in self.operands() {
            child.try_for_each_path(f)?;
        }
        Ok(())
    }

    pub fn try_for_each_path_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Path) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Expr::Path(path) => f(path),
            Expr::Scalar(_) | Expr::Enum(_) | Expr::Param(_) | Expr::True | Expr::False => Ok(()),
            Expr::UnaryOp { operand, .. } => operand.try_for_each_path_mut(f),
            Expr::BinaryOp { left, right, .. } => {
                left.try_for_each_path_mut(f)?;
                right.try_for_each_path_mut(f)
            }
            Expr::Like {
                operand, pattern, ..
            } => {
                operand.try_for_each_path_mut(f)?;
                pattern.try_for_each_path_mut(f)
            }
            Expr::Between {
                operand,
                lower,
                upper,
                ..
            } => {
                operand.try_for_each_path_mut(f)?;
                lower.try_for_each_path_mut(f)?;
                upper.try_for_each_path_mut(f)
            }
            Expr::And(children)
            | Expr::Or(children)
            | Expr::List(children)
            | Expr::Function { args: children, .. } => {
                for child in children {
                    child.try_for_each_path_mut(f)?;
                }
                Ok(())
            }
        }
    }

    /// Named parameters in traversal order, repeats included.
    pub fn param_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params<'a>(&'a self, names: &mut Vec<&'a str>) {
        if let Expr::Param(name) = self {
            names.push(name);
        }
        for child in self.operands() {
            child.collect_params(names);
        }
    }
}
