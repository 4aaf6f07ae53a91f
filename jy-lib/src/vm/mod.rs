//! The virtual machine. Executes flat bytecode against an operand stack and a
//! chain of garbage-collected scopes.

pub mod gc;

pub use gc::{Gc, VmScope};

use std::io::{self, Write};

use thiserror::Error;

use crate::core::{Object, Op, ScopeId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Runtime Error: {0}")]
    Runtime(String),

    #[error("Type Error: cannot apply `{op}` to `{lhs}` and `{rhs}`")]
    TypeError {
        op: Op,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Type Error: cannot apply `{op}` to `{operand}`")]
    UnaryTypeError { op: Op, operand: &'static str },

    #[error("Stack underflow")]
    StackUnderflow,

    #[error("No scope at depth {depth}")]
    DepthError { depth: u64 },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid instruction: 0x{opcode:02x}")]
    InvalidInstruction { opcode: u8 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! rt_err {
    ($($arg:tt)*) => {
        Error::Runtime(format!($($arg)*))
    };
}

pub struct Vm<'out> {
    program: Vec<u8>,
    pc: usize,
    halted: bool,
    stack: Vec<Object>,
    scope: Option<ScopeId>,
    gc: Gc,
    out: &'out mut dyn Write,
}

impl<'out> Vm<'out> {
    pub fn new(program: Vec<u8>, out: &'out mut dyn Write) -> Self {
        Vm {
            program,
            pc: 0,
            halted: false,
            stack: vec![],
            scope: None,
            gc: Gc::new(),
            out,
        }
    }

    /// Runs until halt and returns the value left on top of the stack, or
    /// `None` if the stack is empty.
    pub fn run(&mut self) -> Result<Object> {
        while !self.halted {
            self.step()?;
        }
        Ok(self.stack.pop().unwrap_or_default())
    }

    pub fn gc(&self) -> &Gc {
        &self.gc
    }

    fn step(&mut self) -> Result<()> {
        let opcode = self.fetch_byte()?;
        let op = Op::from_byte(opcode).ok_or(Error::InvalidInstruction { opcode })?;
        match op {
            Op::PushInt => {
                let value = self.fetch_word()? as i64;
                self.stack.push(Object::Integer(value));
            }
            Op::Add | Op::Sub | Op::Mul | Op::Div => self.arithmetic(op)?,
            Op::Neg => {
                let value = self.pop()?;
                match value {
                    Object::Integer(n) => self.stack.push(Object::Integer(n.wrapping_neg())),
                    other => {
                        return Err(Error::UnaryTypeError {
                            op,
                            operand: other.kind(),
                        })
                    }
                }
            }
            Op::Pop => {
                self.pop()?;
            }
            Op::Halt => self.halted = true,
            Op::PushNone => self.stack.push(Object::None),
            Op::Push => {
                let slot = self.fetch_word()?;
                let depth = self.fetch_word()?;
                let id = self.scope_at_depth(depth)?;
                let value = *self.slot(id, slot)?;
                self.stack.push(value);
            }
            Op::Pull => {
                let slot = self.fetch_word()?;
                let depth = self.fetch_word()?;
                // peek, not pop: the assignment's value stays on the stack
                let value = *self.stack.last().ok_or(Error::StackUnderflow)?;
                let id = self.scope_at_depth(depth)?;
                *self.slot_mut(id, slot)? = value;
            }
            Op::ScopeEnter => {
                let slot_count = self.fetch_word()?;
                let id = self.gc.alloc(slot_count, self.scope);
                self.scope = Some(id);
            }
            Op::ScopeExit => {
                let id = self
                    .scope
                    .ok_or_else(|| rt_err!("scope exit without an active scope"))?;
                self.scope = self
                    .gc
                    .get(id)
                    .ok_or_else(|| rt_err!("active scope {id} is not live"))?
                    .parent;
                self.gc.collect(self.scope);
            }
            Op::Print => {
                let value = self.pop()?;
                writeln!(self.out, "{value}")?;
            }
            Op::Jump => {
                let target = self.fetch_word()?;
                self.pc = target as usize;
            }
            Op::Branch => {
                let target = self.fetch_word()?;
                let cond = self.pop()?;
                if self.truthy(cond, op)? {
                    self.pc = target as usize;
                }
            }
            Op::BranchIfFalse => {
                let target = self.fetch_word()?;
                let cond = self.pop()?;
                if !self.truthy(cond, op)? {
                    self.pc = target as usize;
                }
            }
        }
        Ok(())
    }

    /// Integer arithmetic wraps on overflow; division by zero is an error.
    fn arithmetic(&mut self, op: Op) -> Result<()> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        let (Object::Integer(l), Object::Integer(r)) = (lhs, rhs) else {
            return Err(Error::TypeError {
                op,
                lhs: lhs.kind(),
                rhs: rhs.kind(),
            });
        };
        let value = match op {
            Op::Add => l.wrapping_add(r),
            Op::Sub => l.wrapping_sub(r),
            Op::Mul => l.wrapping_mul(r),
            Op::Div => {
                if r == 0 {
                    return Err(Error::DivisionByZero);
                }
                l.wrapping_div(r)
            }
            _ => return Err(rt_err!("`{op}` is not an arithmetic instruction")),
        };
        self.stack.push(Object::Integer(value));
        Ok(())
    }

    fn truthy(&self, value: Object, op: Op) -> Result<bool> {
        match value {
            Object::Integer(n) => Ok(n != 0),
            Object::None => Ok(false),
            Object::Scope(_) => Err(Error::UnaryTypeError {
                op,
                operand: value.kind(),
            }),
        }
    }

    fn fetch_byte(&mut self) -> Result<u8> {
        let byte = *self
            .program
            .get(self.pc)
            .ok_or_else(|| rt_err!("program counter {} ran off the program", self.pc))?;
        self.pc += 1;
        Ok(byte)
    }

    fn fetch_word(&mut self) -> Result<u64> {
        let end = self.pc + 8;
        let bytes = self
            .program
            .get(self.pc..end)
            .ok_or_else(|| rt_err!("truncated operand at {}", self.pc))?;
        let mut word = [0u8; 8];
        word.copy_from_slice(bytes);
        self.pc = end;
        Ok(u64::from_le_bytes(word))
    }

    fn pop(&mut self) -> Result<Object> {
        self.stack.pop().ok_or(Error::StackUnderflow)
    }

    /// Walks `depth` parent links up from the current scope.
    fn scope_at_depth(&self, depth: u64) -> Result<ScopeId> {
        let mut id = self.scope.ok_or(Error::DepthError { depth })?;
        for _ in 0..depth {
            id = self
                .gc
                .get(id)
                .and_then(|scope| scope.parent)
                .ok_or(Error::DepthError { depth })?;
        }
        Ok(id)
    }

    fn slot(&self, id: ScopeId, slot: u64) -> Result<&Object> {
        self.gc
            .get(id)
            .and_then(|scope| scope.slots.get(slot as usize))
            .ok_or_else(|| rt_err!("slot {slot} out of range in scope {id}"))
    }

    fn slot_mut(&mut self, id: ScopeId, slot: u64) -> Result<&mut Object> {
        self.gc
            .get_mut(id)
            .and_then(|scope| scope.slots.get_mut(slot as usize))
            .ok_or_else(|| rt_err!("slot {slot} out of range in scope {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::core::Atom;

    fn run(program: Vec<u8>) -> Result<Object> {
        let mut out = vec![];
        Vm::new(program, &mut out).run()
    }

    #[test]
    fn empty_program_yields_none() {
        let mut asm = Assembler::new();
        asm.emit_op(Op::Halt);
        assert_eq!(run(asm.assemble()).unwrap(), Object::None);
    }

    #[test]
    fn push_int_reinterprets_the_word_as_signed() {
        let mut asm = Assembler::new();
        asm.emit_op(Op::PushInt);
        asm.emit(Atom::Number((-5i64) as u64));
        asm.emit_op(Op::Halt);
        assert_eq!(run(asm.assemble()).unwrap(), Object::Integer(-5));
    }

    #[test]
    fn addition_wraps_on_overflow() {
        let mut asm = Assembler::new();
        asm.emit_op(Op::PushInt);
        asm.emit(Atom::Number(i64::MAX as u64));
        asm.emit_op(Op::PushInt);
        asm.emit(Atom::Number(1));
        asm.emit_op(Op::Add);
        asm.emit_op(Op::Halt);
        assert_eq!(run(asm.assemble()).unwrap(), Object::Integer(i64::MIN));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let err = run(vec![0xff]).unwrap_err();
        assert!(matches!(err, Error::InvalidInstruction { opcode: 0xff }));
    }

    #[test]
    fn pop_on_empty_stack_underflows() {
        let mut asm = Assembler::new();
        asm.emit_op(Op::Pop);
        asm.emit_op(Op::Halt);
        let err = run(asm.assemble()).unwrap_err();
        assert!(matches!(err, Error::StackUnderflow));
    }

    #[test]
    fn reading_past_the_current_scope_chain_fails() {
        let mut asm = Assembler::new();
        asm.emit_op(Op::ScopeEnter);
        asm.emit(Atom::Number(1));
        asm.emit_op(Op::Push);
        asm.emit(Atom::Number(0));
        asm.emit(Atom::Number(3));
        asm.emit_op(Op::Halt);
        let err = run(asm.assemble()).unwrap_err();
        assert!(matches!(err, Error::DepthError { depth: 3 }));
    }
}
