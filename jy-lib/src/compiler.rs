//! Walks the AST and emits atoms into the assembler. The compiler never emits
//! a final address: jump targets become label references and a block's slot
//! count becomes a placeholder that is only defined once the block's scope is
//! complete.

use thiserror::Error;

use crate::assembler::Assembler;
use crate::core::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::core::{Atom, Op, Scope};
use crate::lexer::Operator;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Line {line}: Undefined variable `{name}`")]
    UndefinedVariable { line: u64, name: String },

    #[error("Line {line}: Invalid unary operator `{op}`")]
    InvalidUnaryOperator { line: u64, op: Operator },

    #[error("A compiler bug was detected: {msg}")]
    CompilerBug { msg: String },
}

impl CompileError {
    pub fn line(&self) -> Option<u64> {
        match self {
            CompileError::UndefinedVariable { line, .. }
            | CompileError::InvalidUnaryOperator { line, .. } => Some(*line),
            CompileError::CompilerBug { .. } => None,
        }
    }
}

type CompileResult = Result<(), CompileError>;

/// Compiles the program's top-level block into an assembler full of atoms.
/// The block's value is left on the stack when the emitted halt executes.
pub fn compile(program: &Expr) -> Result<Assembler, CompileError> {
    let mut compiler = Compiler {
        asm: Assembler::new(),
        scope: Scope::new(),
    };
    compiler.expr(program)?;
    compiler.asm.emit_op(Op::Halt);
    Ok(compiler.asm)
}

struct Compiler {
    asm: Assembler,
    scope: Scope,
}

impl Compiler {
    fn expr(&mut self, expr: &Expr) -> CompileResult {
        match &expr.kind {
            ExprKind::Integer(value) => {
                self.asm.emit_op(Op::PushInt);
                self.asm.emit(Atom::Number(*value));
            }
            ExprKind::Identifier(name) => {
                let (slot, depth) =
                    self.scope
                        .lookup(name)
                        .ok_or_else(|| CompileError::UndefinedVariable {
                            line: expr.line,
                            name: name.clone(),
                        })?;
                self.asm.emit_op(Op::Push);
                self.asm.emit(Atom::Number(slot));
                self.asm.emit(Atom::Number(depth));
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(expr.line, *op, lhs, rhs)?,
            ExprKind::Unary { op, operand } => {
                self.expr_value(operand)?;
                match op {
                    Operator::Subtraction => self.asm.emit_op(Op::Neg),
                    other => {
                        return Err(CompileError::InvalidUnaryOperator {
                            line: expr.line,
                            op: *other,
                        })
                    }
                }
            }
            ExprKind::Block(stmts) => self.block(stmts)?,
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => self.if_else(cond, then, otherwise.as_deref())?,
            ExprKind::While { cond, body } => self.while_loop(cond, body)?,
        }
        Ok(())
    }

    /// Compiles `expr` and guarantees a value on the stack. A while leaves
    /// nothing behind, so one is pushed for it here.
    fn expr_value(&mut self, expr: &Expr) -> CompileResult {
        self.expr(expr)?;
        if matches!(expr.kind, ExprKind::While { .. }) {
            self.asm.emit_op(Op::PushNone);
        }
        Ok(())
    }

    /// Compiles `expr` for its effects only, discarding its value if any.
    fn expr_discard(&mut self, expr: &Expr) -> CompileResult {
        self.expr(expr)?;
        if !matches!(expr.kind, ExprKind::While { .. }) {
            self.asm.emit_op(Op::Pop);
        }
        Ok(())
    }

    fn binary(&mut self, line: u64, op: Operator, lhs: &Expr, rhs: &Expr) -> CompileResult {
        use Operator::*;
        if matches!(op, Assignment | Reassignment) {
            return self.assignment(line, op, lhs, rhs);
        }
        self.expr_value(lhs)?;
        self.expr_value(rhs)?;
        let opcode = match op {
            Addition => Op::Add,
            Subtraction => Op::Sub,
            Multiplication => Op::Mul,
            Division => Op::Div,
            other => {
                return Err(CompileError::CompilerBug {
                    msg: format!("binary operator `{other}` reached the compiler"),
                })
            }
        };
        self.asm.emit_op(opcode);
        Ok(())
    }

    /// Assignments emit no operator opcode. The rhs value is copied into its
    /// slot and stays on the stack, so the assignment's own value is the
    /// assigned value. `=` binds in the current scope; `:=` requires the name
    /// to exist somewhere in the chain.
    fn assignment(&mut self, line: u64, op: Operator, lhs: &Expr, rhs: &Expr) -> CompileResult {
        let ExprKind::Identifier(name) = &lhs.kind else {
            return Err(CompileError::CompilerBug {
                msg: "assignment to a non-identifier survived parsing".into(),
            });
        };
        self.expr_value(rhs)?;
        let (slot, depth) = if op == Operator::Assignment {
            (self.scope.assign(name), 0)
        } else {
            self.scope
                .lookup(name)
                .ok_or_else(|| CompileError::UndefinedVariable {
                    line,
                    name: name.clone(),
                })?
        };
        self.asm.emit_op(Op::Pull);
        self.asm.emit(Atom::Number(slot));
        self.asm.emit(Atom::Number(depth));
        Ok(())
    }

    /// Emits: cond, branch(true), else-code (or push-none), jump(end),
    /// true-label, then-code, end-label. Exactly one branch value remains.
    fn if_else(&mut self, cond: &Expr, then: &Expr, otherwise: Option<&Expr>) -> CompileResult {
        let true_label = self.asm.fresh_id();
        let end_label = self.asm.fresh_id();

        self.expr_value(cond)?;
        self.asm.emit_op(Op::Branch);
        self.asm.emit(Atom::LabelRef(true_label));
        match otherwise {
            Some(other) => self.expr_value(other)?,
            None => self.asm.emit_op(Op::PushNone),
        }
        self.asm.emit_op(Op::Jump);
        self.asm.emit(Atom::LabelRef(end_label));
        self.asm.emit(Atom::LabelDef(true_label));
        self.expr_value(then)?;
        self.asm.emit(Atom::LabelDef(end_label));
        Ok(())
    }

    /// Emits: loop-label, cond, branch-if-false(end), body (discarded),
    /// jump(loop), end-label. Leaves no value; `expr_value` compensates
    /// wherever one is required.
    fn while_loop(&mut self, cond: &Expr, body: &Expr) -> CompileResult {
        let loop_label = self.asm.fresh_id();
        let end_label = self.asm.fresh_id();

        self.asm.emit(Atom::LabelDef(loop_label));
        self.expr_value(cond)?;
        self.asm.emit_op(Op::BranchIfFalse);
        self.asm.emit(Atom::LabelRef(end_label));
        self.expr_discard(body)?;
        self.asm.emit_op(Op::Jump);
        self.asm.emit(Atom::LabelRef(loop_label));
        self.asm.emit(Atom::LabelDef(end_label));
        Ok(())
    }

    fn block(&mut self, stmts: &[Stmt]) -> CompileResult {
        let exit_label = self.asm.fresh_id();
        let slot_count = self.asm.fresh_id();

        self.enter_scope();
        self.asm.emit_op(Op::ScopeEnter);
        self.asm.emit(Atom::SlotRef(slot_count));
        for stmt in stmts {
            self.stmt(stmt, exit_label)?;
        }
        // a send jumps past this push, keeping its own value instead
        self.asm.emit_op(Op::PushNone);
        self.asm.emit(Atom::LabelDef(exit_label));
        self.asm.emit_op(Op::ScopeExit);
        let slots = self.leave_scope()?;
        self.asm.emit(Atom::SlotDef(slot_count, slots));
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, exit_label: u64) -> CompileResult {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.expr_discard(expr)?,
            StmtKind::Print(expr) => {
                self.expr_value(expr)?;
                self.asm.emit_op(Op::Print);
            }
            StmtKind::Send(expr) => {
                self.expr_value(expr)?;
                self.asm.emit_op(Op::Jump);
                self.asm.emit(Atom::LabelRef(exit_label));
            }
        }
        Ok(())
    }

    fn enter_scope(&mut self) {
        let parent = std::mem::take(&mut self.scope);
        self.scope.parent = Some(Box::new(parent));
    }

    fn leave_scope(&mut self) -> Result<u64, CompileError> {
        let slots = self.scope.slot_count();
        let parent = self
            .scope
            .parent
            .take()
            .ok_or_else(|| CompileError::CompilerBug {
                msg: "left a scope that had no parent".into(),
            })?;
        self.scope = *parent;
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr { line: 1, kind }
    }

    #[test]
    fn rejects_unknown_unary_operators() {
        let ast = expr(ExprKind::Unary {
            op: Operator::Addition,
            operand: Box::new(expr(ExprKind::Integer(1))),
        });
        let err = compile(&ast).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidUnaryOperator {
                op: Operator::Addition,
                ..
            }
        ));
    }

    #[test]
    fn undefined_variable_reports_its_line() {
        let ast = Expr {
            line: 4,
            kind: ExprKind::Identifier("ghost".into()),
        };
        let err = compile(&ast).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UndefinedVariable { line: 4, ref name } if name == "ghost"
        ));
    }
}
