/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,

    // Bitwise
    /// Bitwise AND (`&`)
    BitAnd,
    /// Bitwise OR (`|`)
    BitOr,
    /// Bitwise XOR (`^`)
    BitXor,
    /// Left shift (`<<`)
    ShiftLeft,
    /// Arithmetic right shift (`>>`)
    ShiftRight,

    // Comparison
    /// Equal (`=`)
    Equal,
    /// Not equal (`!=`, `<>`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Membership
    /// `in (...)`
    In,
    /// `not in (...)`
    NotIn,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::ShiftLeft => "<<",
            BinOp::ShiftRight => ">>",
            BinOp::Equal => "=",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::In => "in",
            BinOp::NotIn => "not in",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Arithmetic negation (`-x`)
    Negate,
    /// Bitwise complement (`~x`)
    BitNot,
    /// Logical negation (`not x`)
    Not,
}

/// Pattern-match operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeOp {
    Like,
    LikeIgnoreCase,
    NotLike,
    NotLikeIgnoreCase,
}

impl LikeOp {
    pub fn keyword(&self) -> &'static str {
        match self {
            LikeOp::Like => "like",
            LikeOp::LikeIgnoreCase => "likeIgnoreCase",
            LikeOp::NotLike => "not like",
            LikeOp::NotLikeIgnoreCase => "not likeIgnoreCase",
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, LikeOp::NotLike | LikeOp::NotLikeIgnoreCase)
    }

    pub fn ignores_case(&self) -> bool {
        matches!(self, LikeOp::LikeIgnoreCase | LikeOp::NotLikeIgnoreCase)
    }

    pub fn negate(&self) -> LikeOp {
        match self {
            LikeOp::Like => LikeOp::NotLike,
            LikeOp::LikeIgnoreCase => LikeOp::NotLikeIgnoreCase,
            LikeOp::NotLike => LikeOp::Like,
            LikeOp::NotLikeIgnoreCase => LikeOp::LikeIgnoreCase,
        }
    }
}
