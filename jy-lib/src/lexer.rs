//! The scanner. `next` advances to the following token; the lexer always
//! exposes the current token and the line it started on.
//!
//! The source is treated as if it were null-terminated: reads past the end
//! yield a zero byte, which lexes as end-of-input. An embedded NUL therefore
//! ends the program early, exactly like the C string it once was.

use std::fmt;

use thiserror::Error;

use crate::core::SymbolTable;

/// Operator runs longer than this can never match; scanning stops here.
const MAX_OPERATOR_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operator {
    #[strum(serialize = "=")]
    Assignment,
    #[strum(serialize = ":=")]
    Reassignment,
    #[strum(serialize = "+")]
    Addition,
    #[strum(serialize = "-")]
    Subtraction,
    #[strum(serialize = "*")]
    Multiplication,
    #[strum(serialize = "/")]
    Division,
    #[strum(serialize = "(")]
    OpenParenthesis,
    #[strum(serialize = ")")]
    CloseParenthesis,
    #[strum(serialize = "{")]
    OpenBrace,
    #[strum(serialize = "}")]
    CloseBrace,
    #[strum(serialize = ";")]
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Print,
    Send,
    If,
    Else,
    While,
}

/// The registration tables. The symbol tables built from these store indices
/// into them, which keeps the table values plain integers.
const OPERATORS: &[(&str, Operator)] = &[
    ("=", Operator::Assignment),
    (":=", Operator::Reassignment),
    ("+", Operator::Addition),
    ("-", Operator::Subtraction),
    ("*", Operator::Multiplication),
    ("/", Operator::Division),
    ("(", Operator::OpenParenthesis),
    (")", Operator::CloseParenthesis),
    ("{", Operator::OpenBrace),
    ("}", Operator::CloseBrace),
    (";", Operator::Semicolon),
];

const KEYWORDS: &[(&str, Keyword)] = &[
    ("print", Keyword::Print),
    ("send", Keyword::Send),
    ("if", Keyword::If),
    ("else", Keyword::Else),
    ("while", Keyword::While),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(u64),
    Operator(Operator),
    Identifier(String),
    Keyword(Keyword),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(value) => write!(f, "{value}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Keyword(keyword) => write!(f, "{keyword}"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Line {line}: Invalid character `{ch}`")]
    InvalidCharacter { line: u64, ch: char },

    #[error("Line {line}: Overflowing integer literal `{partial}...`")]
    IntegerOverflow { line: u64, partial: u64 },

    #[error("Line {line}: Undefined operator `{text}`")]
    UndefinedOperator { line: u64, text: String },
}

impl LexError {
    pub fn line(&self) -> u64 {
        match self {
            LexError::InvalidCharacter { line, .. }
            | LexError::IntegerOverflow { line, .. }
            | LexError::UndefinedOperator { line, .. } => *line,
        }
    }
}

pub struct Lexer<'src> {
    src: &'src [u8],
    index: usize,
    line: u64,
    token_line: u64,
    token: Token,
    operators: SymbolTable,
    keywords: SymbolTable,
}

fn is_operator(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-' | b'*' | b'/' | b'=' | b':' | b'{' | b'}' | b'(' | b')' | b';'
    )
}

impl<'src> Lexer<'src> {
    /// Builds the operator/keyword tables and scans the first token.
    pub fn new(src: &'src str) -> Result<Self, LexError> {
        let mut operators = SymbolTable::new();
        for (i, (text, _)) in OPERATORS.iter().enumerate() {
            operators.put(text, i as u64);
        }
        let mut keywords = SymbolTable::new();
        for (i, (text, _)) in KEYWORDS.iter().enumerate() {
            keywords.put(text, i as u64);
        }

        let mut lexer = Lexer {
            src: src.as_bytes(),
            index: 0,
            line: 1,
            token_line: 1,
            token: Token::Eof,
            operators,
            keywords,
        };
        lexer.next()?;
        Ok(lexer)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Line on which the current token started.
    pub fn line(&self) -> u64 {
        self.token_line
    }

    fn peek(&self) -> u8 {
        self.src.get(self.index).copied().unwrap_or(0)
    }

    fn bump(&mut self) -> u8 {
        let c = self.peek();
        self.index += 1;
        c
    }

    /// Advances to the next token.
    pub fn next(&mut self) -> Result<(), LexError> {
        while self.peek().is_ascii_whitespace() {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }
        self.token_line = self.line;

        let c = self.peek();
        self.token = if c == 0 {
            Token::Eof
        } else if c.is_ascii_digit() {
            self.integer()?
        } else if is_operator(c) {
            self.operator()?
        } else if c.is_ascii_alphabetic() || c == b'_' {
            self.ident_or_keyword()
        } else {
            return Err(LexError::InvalidCharacter {
                line: self.line,
                ch: c as char,
            });
        };
        Ok(())
    }

    fn integer(&mut self) -> Result<Token, LexError> {
        let mut value: u64 = 0;
        while self.peek().is_ascii_digit() {
            let digit = u64::from(self.bump() - b'0');
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or(LexError::IntegerOverflow {
                    line: self.line,
                    partial: value,
                })?;
        }
        Ok(Token::Integer(value))
    }

    /// Longest match: extend the run greedily, remembering the longest prefix
    /// that is itself a registered operator, then rewind to just past it.
    fn operator(&mut self) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut found = None;
        while is_operator(self.peek()) && text.len() < MAX_OPERATOR_LEN {
            text.push(self.bump() as char);
            if let Some(i) = self.operators.get(&text) {
                found = Some((OPERATORS[i as usize].1, self.index));
            }
        }
        match found {
            Some((op, end)) => {
                self.index = end;
                Ok(Token::Operator(op))
            }
            None => Err(LexError::UndefinedOperator {
                line: self.line,
                text,
            }),
        }
    }

    fn ident_or_keyword(&mut self) -> Token {
        let mut text = String::new();
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            text.push(self.bump() as char);
        }
        match self.keywords.get(&text) {
            Some(i) => Token::Keyword(KEYWORDS[i as usize].1),
            None => Token::Identifier(text),
        }
    }
}
