//! AST node types. Every node records the source line it started on, which
//! compile-time diagnostics report later, after the token stream is gone.

use crate::lexer::Operator;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub line: u64,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Integer(u64),
    Identifier(String),
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    /// A `{ ... }` block. Evaluates to none unless a `send` fires inside it.
    Block(Vec<Stmt>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    /// Leaves no value on the stack; usable as a statement only.
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: u64,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Bare expression; its value is discarded.
    Expression(Expr),
    Print(Expr),
    /// Sets the enclosing block's value and skips the block's remaining
    /// statements.
    Send(Expr),
}
