//! Recursive-descent, precedence-climbing parser. Produces one top-level
//! statement: the program's implicit block.

use thiserror::Error;

use crate::core::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::lexer::{Keyword, LexError, Lexer, Operator, Token};

const MAX_PRECEDENCE: u8 = 3;

/// Binary-operator precedence. 0 means "not a binary operator". The levels in
/// use must stay contiguous; `binop` climbs them one by one.
fn precedence(op: Operator) -> u8 {
    use Operator::*;
    match op {
        Assignment | Reassignment => 3, // NOTE: MAX_PRECEDENCE depends on this
        Addition | Subtraction => 2,
        Multiplication | Division => 1,
        _ => 0,
    }
}

#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Line {line}: Unexpected token `{found}`")]
    UnexpectedToken { line: u64, found: String },

    #[error("Line {line}: Expected `{expected}`, not `{found}`")]
    ExpectedToken {
        line: u64,
        expected: &'static str,
        found: String,
    },

    #[error("Line {line}: Empty condition")]
    EmptyCondition { line: u64 },

    #[error("Line {line}: Invalid assignment target")]
    InvalidAssignmentTarget { line: u64 },

    #[error("Line {line}: Undefined unary operation `{found}`")]
    UndefinedUnaryOperator { line: u64, found: String },
}

impl SyntaxError {
    pub fn line(&self) -> u64 {
        match self {
            SyntaxError::Lex(err) => err.line(),
            SyntaxError::UnexpectedToken { line, .. }
            | SyntaxError::ExpectedToken { line, .. }
            | SyntaxError::EmptyCondition { line }
            | SyntaxError::InvalidAssignmentTarget { line }
            | SyntaxError::UndefinedUnaryOperator { line, .. } => *line,
        }
    }
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses a whole program into its implicit top-level block.
pub fn parse(src: &str) -> ParseResult<Expr> {
    let mut parser = Parser::new(src)?;
    let mut stmts = vec![];
    loop {
        parser.skip_semicolons()?;
        if parser.lexer.token() == &Token::Eof {
            break;
        }
        stmts.push(parser.statement()?);
    }
    Ok(Expr {
        line: 1,
        kind: ExprKind::Block(stmts),
    })
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> ParseResult<Self> {
        Ok(Parser {
            lexer: Lexer::new(src)?,
        })
    }

    /// Statement separators are optional; any run of `;` is skipped.
    fn skip_semicolons(&mut self) -> ParseResult<()> {
        while self.lexer.token() == &Token::Operator(Operator::Semicolon) {
            self.lexer.next()?;
        }
        Ok(())
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let line = self.lexer.line();
        let kind = match self.lexer.token() {
            Token::Keyword(Keyword::Print) => {
                self.lexer.next()?;
                StmtKind::Print(self.expression()?)
            }
            Token::Keyword(Keyword::Send) => {
                self.lexer.next()?;
                StmtKind::Send(self.expression()?)
            }
            _ => StmtKind::Expression(self.expression()?),
        };
        Ok(Stmt { line, kind })
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.binop(MAX_PRECEDENCE)
    }

    /// Parses level `level - 1` first, then folds left-to-right while the next
    /// operator's precedence is exactly `level`. The exact-match tie-break is
    /// what makes each level left-associative.
    fn binop(&mut self, level: u8) -> ParseResult<Expr> {
        if level == 0 {
            return self.term();
        }

        let mut expr = self.binop(level - 1)?;
        while let Token::Operator(op) = *self.lexer.token() {
            if precedence(op) != level {
                break;
            }
            let line = self.lexer.line();
            if matches!(op, Operator::Assignment | Operator::Reassignment)
                && !matches!(expr.kind, ExprKind::Identifier(_))
            {
                return Err(SyntaxError::InvalidAssignmentTarget { line });
            }
            self.lexer.next()?;
            let rhs = self.binop(level - 1)?;
            expr = Expr {
                line,
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(expr),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let line = self.lexer.line();
        match self.lexer.token().clone() {
            Token::Eof => Err(SyntaxError::UnexpectedToken {
                line,
                found: "EOF".into(),
            }),
            Token::Integer(value) => {
                self.lexer.next()?;
                Ok(Expr {
                    line,
                    kind: ExprKind::Integer(value),
                })
            }
            Token::Identifier(name) => {
                self.lexer.next()?;
                Ok(Expr {
                    line,
                    kind: ExprKind::Identifier(name),
                })
            }
            Token::Keyword(Keyword::If) => self.if_expr(),
            Token::Keyword(Keyword::While) => self.while_expr(),
            Token::Operator(Operator::Subtraction) => {
                self.lexer.next()?;
                // unary minus binds a whole expression, not a single term
                let operand = self.expression()?;
                Ok(Expr {
                    line,
                    kind: ExprKind::Unary {
                        op: Operator::Subtraction,
                        operand: Box::new(operand),
                    },
                })
            }
            Token::Operator(Operator::OpenParenthesis) => {
                self.lexer.next()?;
                let expr = self.expression()?;
                self.expect_operator(Operator::CloseParenthesis, ")")?;
                Ok(expr)
            }
            Token::Operator(Operator::OpenBrace) => self.block(),
            Token::Operator(op) => Err(SyntaxError::UndefinedUnaryOperator {
                line,
                found: op.to_string(),
            }),
            token => Err(SyntaxError::UnexpectedToken {
                line,
                found: token.to_string(),
            }),
        }
    }

    fn if_expr(&mut self) -> ParseResult<Expr> {
        let line = self.lexer.line();
        self.lexer.next()?;
        let cond = self.condition()?;
        let then = self.expression()?;
        let otherwise = if self.lexer.token() == &Token::Keyword(Keyword::Else) {
            self.lexer.next()?;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(Expr {
            line,
            kind: ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise,
            },
        })
    }

    fn while_expr(&mut self) -> ParseResult<Expr> {
        let line = self.lexer.line();
        self.lexer.next()?;
        let cond = self.condition()?;
        let body = self.expression()?;
        Ok(Expr {
            line,
            kind: ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        })
    }

    fn condition(&mut self) -> ParseResult<Expr> {
        let line = self.lexer.line();
        self.expect_operator(Operator::OpenParenthesis, "(")?;
        if self.lexer.token() == &Token::Operator(Operator::CloseParenthesis) {
            return Err(SyntaxError::EmptyCondition { line });
        }
        let cond = self.expression()?;
        self.expect_operator(Operator::CloseParenthesis, ")")?;
        Ok(cond)
    }

    fn block(&mut self) -> ParseResult<Expr> {
        let line = self.lexer.line();
        self.lexer.next()?;
        let mut stmts = vec![];
        loop {
            self.skip_semicolons()?;
            match self.lexer.token() {
                Token::Operator(Operator::CloseBrace) => {
                    self.lexer.next()?;
                    break;
                }
                Token::Eof => {
                    return Err(SyntaxError::ExpectedToken {
                        line: self.lexer.line(),
                        expected: "}",
                        found: "EOF".into(),
                    })
                }
                _ => stmts.push(self.statement()?),
            }
        }
        Ok(Expr {
            line,
            kind: ExprKind::Block(stmts),
        })
    }

    fn expect_operator(&mut self, op: Operator, expected: &'static str) -> ParseResult<()> {
        if self.lexer.token() == &Token::Operator(op) {
            self.lexer.next()?;
            Ok(())
        } else {
            Err(SyntaxError::ExpectedToken {
                line: self.lexer.line(),
                expected,
                found: self.lexer.token().to_string(),
            })
        }
    }
}
