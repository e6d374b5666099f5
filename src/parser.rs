use std::mem;

use crate::{
    alias::{AliasConflictError, AliasResolver},
    ast::{BinOp, EnumRef, Expr, LikeOp, Path, PathKind, Token, UnOp},
    lexer::{LexError, Lexer, Position},
    value::Value,
};

/// Errors raised while turning text into an expression tree.
///
/// Syntax errors carry the unparsed remainder of the input starting at the
/// offending token. No partially built tree is ever returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{message} at {position}, near '{remainder}'")]
    Syntax {
        message: String,
        position: Position,
        remainder: String,
    },

    #[error("{source}, near '{remainder}'")]
    Lex { source: LexError, remainder: String },

    #[error(transparent)]
    Alias(#[from] AliasConflictError),

    #[error("expression nesting exceeds {max_depth} levels at {position}")]
    RecursionLimit { max_depth: usize, position: Position },
}

impl ParseError {
    /// The unparsed input starting at the failure, when known.
    pub fn remainder(&self) -> Option<&str> {
        match self {
            ParseError::Syntax { remainder, .. } | ParseError::Lex { remainder, .. } => {
                Some(remainder)
            }
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Syntax { position, .. } | ParseError::RecursionLimit { position, .. } => {
                Some(*position)
            }
            ParseError::Lex { source, .. } => Some(source.position()),
            ParseError::Alias(_) => None,
        }
    }
}

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of parentheses, unary operators and `not`. The
    /// default stays within a 2 MiB thread stack.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { max_depth: 64 }
    }
}

/// Recursive-descent parser, one function per precedence level.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_start: Position,
    depth: usize,
    options: ParseOptions,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Parser::with_options(lexer, ParseOptions::default())
    }

    pub fn with_options(lexer: Lexer, options: ParseOptions) -> Result<Self, ParseError> {
        let mut parser = Parser {
            lexer,
            current_token: Token::Eof,
            current_start: Position::default(),
            depth: 0,
            options,
        };
        parser.advance()?;
        Ok(parser)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        match self.lexer.next_token() {
            Ok(token) => {
                self.current_token = token;
                self.current_start = self.lexer.token_position();
                Ok(())
            }
            Err(source) => {
                let remainder = self.lexer.remainder_from(source.position().offset);
                Err(ParseError::Lex { source, remainder })
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            message: message.into(),
            position: self.current_start,
            remainder: self.lexer.remainder_from(self.current_start.offset),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.error(format!(
                "expected '{}', found '{}'",
                expected, self.current_token
            )));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::RecursionLimit {
                max_depth: self.options.max_depth,
                position: self.current_start,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Parse primary expressions: literals, paths, parameters, function calls
    /// and parenthesized expressions
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Integer(n)))
            }
            Token::Decimal(d) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Decimal(d)))
            }
            Token::Float(n) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Float(n)))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::String(s)))
            }
            Token::Bytes(b) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Bytes(b)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Scalar(Value::Null))
            }

            // References
            Token::Enum(qualified) => {
                let reference = EnumRef::parse(&qualified)
                    .ok_or_else(|| self.error("malformed enum reference"))?;
                self.advance()?;
                Ok(Expr::Enum(reference))
            }
            Token::Param(name) => {
                self.advance()?;
                Ok(Expr::Param(name))
            }
            Token::Path(raw) => {
                self.advance()?;
                let plain = !raw.contains(['.', '#', '+']);
                if plain && self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    return Ok(Expr::Function { name: raw, args });
                }
                Ok(Expr::Path(Path::with_kind(PathKind::Object, &raw)?))
            }
            Token::DbPath(raw) => {
                self.advance()?;
                Ok(Expr::Path(Path::with_kind(PathKind::Db, &raw)?))
            }
            Token::DbIdPath(raw) => {
                self.advance()?;
                Ok(Expr::Path(Path::with_kind(PathKind::DbId, &raw)?))
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.nested(|p| p.parse_expression())?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            token => {
                let message = format!("unexpected '{}'", token);
                self.current_token = token;
                Err(self.error(message))
            }
        }
    }

    /// Comma-separated expressions up to and including `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];
        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.nested(|p| p.parse_expression())?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance()?;
            if self.check(&Token::RParen) {
                return Err(self.error("expected an expression after ','"));
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Minus => {
                self.advance()?;
                // Fold the sign into a numeric literal
                let folded = match &self.current_token {
                    Token::Integer(n) => n.checked_neg().map(Value::Integer),
                    Token::Decimal(d) => Some(Value::Decimal(-*d)),
                    Token::Float(n) => Some(Value::Float(-*n)),
                    _ => None,
                };
                if let Some(value) = folded {
                    self.advance()?;
                    return Ok(Expr::Scalar(value));
                }
                let operand = self.nested(|p| p.parse_unary())?;
                Ok(Expr::unary(UnOp::Negate, operand))
            }
            Token::Tilde => {
                self.advance()?;
                let operand = self.nested(|p| p.parse_unary())?;
                Ok(Expr::unary(UnOp::BitNot, operand))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::ShiftLeft => BinOp::ShiftLeft,
                Token::ShiftRight => BinOp::ShiftRight,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift()?;

        while self.check(&Token::Ampersand) {
            self.advance()?;
            let right = self.parse_shift()?;
            left = Expr::binary(BinOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_and()?;

        while self.check(&Token::Caret) {
            self.advance()?;
            let right = self.parse_bit_and()?;
            left = Expr::binary(BinOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bit_xor()?;

        while self.check(&Token::Pipe) {
            self.advance()?;
            let right = self.parse_bit_xor()?;
            left = Expr::binary(BinOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_bit_or()?;

        if let Some(op) = match &self.current_token {
            Token::Eq => Some(BinOp::Equal),
            Token::NotEq => Some(BinOp::NotEqual),
            Token::Lt => Some(BinOp::LessThan),
            Token::Gt => Some(BinOp::GreaterThan),
            Token::LtEq => Some(BinOp::LessEqual),
            Token::GtEq => Some(BinOp::GreaterEqual),
            _ => None,
        } {
            self.advance()?;
            let right = self.parse_bit_or()?;
            return Ok(Expr::binary(op, left, right));
        }

        let negated = if self.check(&Token::Not) {
            self.advance()?;
            if !matches!(
                self.current_token,
                Token::In | Token::Like | Token::LikeIgnoreCase | Token::Between
            ) {
                return Err(self.error(format!(
                    "expected 'in', 'like', 'likeIgnoreCase' or 'between' after 'not', found '{}'",
                    self.current_token
                )));
            }
            true
        } else {
            false
        };

        match self.current_token {
            Token::In => {
                self.advance()?;
                self.parse_in(left, negated)
            }
            Token::Like | Token::LikeIgnoreCase => {
                let op = if self.check(&Token::Like) {
                    LikeOp::Like
                } else {
                    LikeOp::LikeIgnoreCase
                };
                let op = if negated { op.negate() } else { op };
                self.advance()?;
                let pattern = self.parse_bit_or()?;
                let escape = self.parse_escape()?;
                Ok(Expr::Like {
                    op,
                    operand: Box::new(left),
                    pattern: Box::new(pattern),
                    escape,
                })
            }
            Token::Between => {
                self.advance()?;
                let lower = self.parse_bit_or()?;
                self.expect(Token::And)?;
                let upper = self.parse_bit_or()?;
                Ok(Expr::Between {
                    negated,
                    operand: Box::new(left),
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                })
            }
            _ => Ok(left),
        }
    }

    fn parse_in(&mut self, left: Expr, negated: bool) -> Result<Expr, ParseError> {
        let op = if negated { BinOp::NotIn } else { BinOp::In };

        let right = match &self.current_token {
            Token::Param(_) => self.parse_primary()?,
            Token::LParen => {
                self.advance()?;
                let items = self.parse_arguments()?;
                if items.is_empty() {
                    return Ok(if negated { Expr::True } else { Expr::False });
                }
                Expr::List(items)
            }
            _ => {
                return Err(self.error(format!(
                    "expected '(' or a parameter after 'in', found '{}'",
                    self.current_token
                )));
            }
        };
        Ok(Expr::binary(op, left, right))
    }

    fn parse_escape(&mut self) -> Result<Option<char>, ParseError> {
        if !self.check(&Token::Escape) {
            return Ok(None);
        }
        self.advance()?;

        let escape = match &self.current_token {
            Token::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(self.error("escape must be a single character")),
                }
            }
            _ => {
                return Err(self.error(format!(
                    "expected a quoted escape character, found '{}'",
                    self.current_token
                )));
            }
        };
        self.advance()?;
        Ok(Some(escape))
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Not) {
            self.advance()?;
            let operand = self.nested(|p| p.parse_not())?;
            return Ok(Expr::unary(UnOp::Not, operand));
        }
        Ok(as_condition(self.parse_relational()?))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not()?;
        if !self.check(&Token::And) {
            return Ok(first);
        }

        let mut children = vec![first];
        while self.check(&Token::And) {
            self.advance()?;
            children.push(self.parse_not()?);
        }
        Ok(Expr::And(children))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and()?;
        if !self.check(&Token::Or) {
            return Ok(first);
        }

        let mut children = vec![first];
        while self.check(&Token::Or) {
            self.advance()?;
            children.push(self.parse_and()?);
        }
        Ok(Expr::Or(children))
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    /// Parse a complete expression and resolve its path aliases.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        AliasResolver::resolve(&mut expr)?;
        Ok(expr)
    }
}

/// A bare boolean literal in condition position is the matching constant.
fn as_condition(expr: Expr) -> Expr {
    match expr {
        Expr::Scalar(Value::Boolean(true)) => Expr::True,
        Expr::Scalar(Value::Boolean(false)) => Expr::False,
        e => e,
    }
}

/// Parse `text` with default options.
///
/// ```
/// use qualex::{parse, ExprKind};
///
/// let expr = parse("artistName = 'Picasso' and paintingArray.estimatedPrice > 3000").unwrap();
/// assert_eq!(expr.kind(), ExprKind::And);
/// ```
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    parse_with(text, ParseOptions::default())
}

pub fn parse_with(text: &str, options: ParseOptions) -> Result<Expr, ParseError> {
    log::debug!("parsing expression: {}", text);
    let mut parser = Parser::with_options(Lexer::new(text), options)?;
    let expr = parser.parse()?;
    log::trace!("parsed into {} node", expr.kind());
    Ok(expr)
}
