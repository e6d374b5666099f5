use std::fmt;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer, with optional long suffix
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 216201000180L
    /// ```
    Integer(i64),

    /// Exact decimal number
    ///
    /// # Examples
    /// ```text
    /// 3.50
    /// 0.1
    /// ```
    Decimal(Decimal),

    /// Floating point number, written with an exponent or a float suffix
    ///
    /// # Examples
    /// ```text
    /// 3.5d
    /// 1e3
    /// ```
    Float(f64),

    /// String literal in single or double quotes
    String(String),

    /// Byte sequence (`x'0aff'`)
    Bytes(Vec<u8>),

    Boolean(bool),

    Null,

    // References
    /// Object path, raw text including aliases and outer markers
    ///
    /// # Examples
    /// ```text
    /// artistName
    /// paintingArray#p.toGallery+
    /// ```
    Path(String),

    /// Database path (`db:ARTIST_NAME`), prefix stripped
    DbPath(String),

    /// Primary-key path (`dbid:ARTIST_ID`), prefix stripped
    DbIdPath(String),

    /// Enum reference (`enum:Type.MEMBER`), prefix stripped
    Enum(String),

    /// Named parameter (`$name`), sigil stripped
    Param(String),

    // Operators
    /// `=` or `==`
    Eq,
    /// `!=` or `<>`
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    // Delimiters
    LParen,
    RParen,
    Comma,

    // Keywords
    /// `and` or `&&`
    And,
    /// `or` or `||`
    Or,
    /// `not` or `!`
    Not,
    In,
    Like,
    LikeIgnoreCase,
    Between,
    Escape,

    Eof,
}

impl Token {
    /// Match a bare word against the keyword table. Keywords are accepted in
    /// lowercase or uppercase.
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "and" | "AND" => Token::And,
            "or" | "OR" => Token::Or,
            "not" | "NOT" => Token::Not,
            "in" | "IN" => Token::In,
            "like" | "LIKE" => Token::Like,
            "likeIgnoreCase" | "LIKEIGNORECASE" => Token::LikeIgnoreCase,
            "between" | "BETWEEN" => Token::Between,
            "escape" | "ESCAPE" => Token::Escape,
            "true" | "TRUE" => Token::Boolean(true),
            "false" | "FALSE" => Token::Boolean(false),
            "null" | "NULL" => Token::Null,
            _ => return None,
        };
        Some(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Decimal(d) => write!(f, "{}", d),
            Token::Float(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Bytes(_) => write!(f, "byte literal"),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "null"),
            Token::Path(p) => write!(f, "{}", p),
            Token::DbPath(p) => write!(f, "db:{}", p),
            Token::DbIdPath(p) => write!(f, "dbid:{}", p),
            Token::Enum(e) => write!(f, "enum:{}", e),
            Token::Param(p) => write!(f, "${}", p),
            Token::Eq => write!(f, "="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Tilde => write!(f, "~"),
            Token::ShiftLeft => write!(f, "<<"),
            Token::ShiftRight => write!(f, ">>"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::In => write!(f, "in"),
            Token::Like => write!(f, "like"),
            Token::LikeIgnoreCase => write!(f, "likeIgnoreCase"),
            Token::Between => write!(f, "between"),
            Token::Escape => write!(f, "escape"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
