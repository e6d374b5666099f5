use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

use crate::ast::{EnumRef, Token};

/// Location of a character in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Character offset from the start of the input
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{ch}' at {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },

    #[error("invalid byte literal at {position}")]
    InvalidBytes { position: Position },

    #[error("incomplete {what} at {position}")]
    Incomplete { what: &'static str, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidNumber { position, .. }
            | LexError::InvalidBytes { position }
            | LexError::Incomplete { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    token_start: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let start = Position {
            offset: 0,
            line: 1,
            column: 1,
        };
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: start.line,
            column: start.column,
            token_start: start,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    /// Position where the most recently returned token starts.
    pub fn token_position(&self) -> Position {
        self.token_start
    }

    /// Input text from `offset` to the end.
    pub fn remainder_from(&self, offset: usize) -> String {
        self.input.iter().skip(offset).collect()
    }

    fn here(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// A `+` directly after a segment is an outer-join marker when nothing
    /// but a separator follows it.
    fn at_outer_marker(&self) -> bool {
        self.current_char() == Some('+')
            && match self.peek_char(1) {
                None => true,
                Some(c) => c == '.' || c == ')' || c == ',' || c.is_whitespace(),
            }
    }

    /// Read `segment(#alias)?(+)?('.' segment ...)*` starting at an
    /// identifier.
    fn read_path(&mut self, first: String) -> Result<String, LexError> {
        let mut raw = first;
        loop {
            if self.current_char() == Some('#') {
                self.advance();
                if !self.current_char().is_some_and(Self::is_ident_start) {
                    return Err(LexError::Incomplete {
                        what: "alias",
                        position: self.here(),
                    });
                }
                raw.push('#');
                raw.push_str(&self.read_identifier());
            }
            if self.at_outer_marker() {
                self.advance();
                raw.push('+');
            }
            if self.current_char() == Some('.')
                && self.peek_char(1).is_some_and(Self::is_ident_start)
            {
                self.advance();
                raw.push('.');
                raw.push_str(&self.read_identifier());
            } else {
                return Ok(raw);
            }
        }
    }

    fn read_qualified_name(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.here();
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some(c @ ('"' | '\'' | '\\' | '/')) => result.push(c),
                        Some(c) => {
                            return Err(LexError::InvalidEscape {
                                ch: c,
                                position: escape_at,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, LexError> {
        let start = self.here();
        self.advance(); // x
        let hex = self.read_string('\'')?;
        if hex.len() % 2 != 0 {
            return Err(LexError::InvalidBytes { position: start });
        }
        let digits: Vec<char> = hex.chars().collect();
        digits
            .chunks(2)
            .map(|pair| {
                let text: String = pair.iter().collect();
                u8::from_str_radix(&text, 16).map_err(|_| LexError::InvalidBytes { position: start })
            })
            .collect()
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.here();
        let mut number = String::new();
        let mut is_fraction = false;
        let mut has_exponent = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_fraction
                && !has_exponent
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_fraction = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !has_exponent {
                let sign = self.peek_char(1).filter(|c| *c == '+' || *c == '-');
                let digit_at = if sign.is_some() { 2 } else { 1 };
                if !self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                has_exponent = true;
                number.push('e');
                self.advance();
                if let Some(s) = sign {
                    number.push(s);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = |text: &str| LexError::InvalidNumber {
            text: text.to_string(),
            position: start,
        };

        match self.current_char() {
            Some('L' | 'l') if !is_fraction && !has_exponent => {
                self.advance();
                number
                    .parse::<i64>()
                    .map(Token::Integer)
                    .map_err(|_| invalid(&number))
            }
            Some('d' | 'D' | 'f' | 'F') => {
                self.advance();
                number
                    .parse::<f64>()
                    .map(Token::Float)
                    .map_err(|_| invalid(&number))
            }
            _ if has_exponent => number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| invalid(&number)),
            _ if is_fraction => Decimal::from_str(&number)
                .map(Token::Decimal)
                .map_err(|_| invalid(&number)),
            // Integers too large for i64 keep their exact value as decimals
            _ => match number.parse::<i64>() {
                Ok(n) => Ok(Token::Integer(n)),
                Err(_) => Decimal::from_str(&number)
                    .map(Token::Decimal)
                    .map_err(|_| invalid(&number)),
            },
        }
    }

    fn read_word(&mut self) -> Result<Token, LexError> {
        if self.current_char() == Some('x') && self.peek_char(1) == Some('\'') {
            return self.read_bytes().map(Token::Bytes);
        }

        let word = self.read_identifier();

        if self.current_char() == Some(':') {
            let prefixed = |lexer: &mut Lexer, what: &'static str| {
                lexer.advance(); // Consume ':'
                if !lexer.current_char().is_some_and(Self::is_ident_start) {
                    return Err(LexError::Incomplete {
                        what,
                        position: lexer.here(),
                    });
                }
                Ok(())
            };
            match word.as_str() {
                "db" => {
                    prefixed(self, "db: path")?;
                    let first = self.read_identifier();
                    return self.read_path(first).map(Token::DbPath);
                }
                "dbid" => {
                    prefixed(self, "dbid: path")?;
                    let first = self.read_identifier();
                    return self.read_path(first).map(Token::DbIdPath);
                }
                "enum" => {
                    prefixed(self, "enum reference")?;
                    let start = self.here();
                    let qualified = self.read_qualified_name();
                    if EnumRef::parse(&qualified).is_none() {
                        return Err(LexError::Incomplete {
                            what: "enum reference",
                            position: start,
                        });
                    }
                    return Ok(Token::Enum(qualified));
                }
                _ => {}
            }
        }

        if let Some(keyword) = Token::keyword(&word) {
            return Ok(keyword);
        }

        self.read_path(word).map(Token::Path)
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    fn double(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        self.advance();
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.here();

        match self.current_char() {
            None => Ok(Token::Eof),
            Some('$') => {
                if self.peek_char(1).is_some_and(Self::is_ident_start) {
                    self.advance();
                    let name = self.read_identifier();
                    Ok(Token::Param(name))
                } else {
                    Err(LexError::Incomplete {
                        what: "parameter name",
                        position: self.here(),
                    })
                }
            }
            Some('&') if self.peek_char(1) == Some('&') => self.double(Token::And),
            Some('&') => self.single(Token::Ampersand),
            Some('|') if self.peek_char(1) == Some('|') => self.double(Token::Or),
            Some('|') => self.single(Token::Pipe),
            Some('^') => self.single(Token::Caret),
            Some('~') => self.single(Token::Tilde),
            Some(',') => self.single(Token::Comma),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('=') if self.peek_char(1) == Some('=') => self.double(Token::Eq),
            Some('=') => self.single(Token::Eq),
            Some('!') if self.peek_char(1) == Some('=') => self.double(Token::NotEq),
            Some('!') => self.single(Token::Not),
            Some('<') => match self.peek_char(1) {
                Some('=') => self.double(Token::LtEq),
                Some('>') => self.double(Token::NotEq),
                Some('<') => self.double(Token::ShiftLeft),
                _ => self.single(Token::Lt),
            },
            Some('>') => match self.peek_char(1) {
                Some('=') => self.double(Token::GtEq),
                Some('>') => self.double(Token::ShiftRight),
                _ => self.single(Token::Gt),
            },
            Some(q @ ('"' | '\'')) => self.read_string(q).map(Token::String),
            Some(ch) if Self::is_ident_start(ch) => self.read_word(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(LexError::UnexpectedChar {
                ch,
                position: self.here(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("and OR not true FALSE null"),
            vec![
                Token::And,
                Token::Or,
                Token::Not,
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_outer_marker_versus_plus() {
        assert_eq!(tokens("a+.b"), vec![Token::Path("a+.b".into())]);
        assert_eq!(
            tokens("a+1"),
            vec![Token::Path("a".into()), Token::Plus, Token::Integer(1)]
        );
    }

    #[test]
    fn test_token_position() {
        let mut lexer = Lexer::new("a =\n  'x");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.position().line, 2);
        assert_eq!(err.position().column, 3);
    }
}
