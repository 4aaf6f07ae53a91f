//! Currently, what you need to do to execute a script is the following:
//! 1. load a source file into a string.
//! 1. parse it into an AST using [`parser::parse`]
//! 1. compile the AST into an atom stream using [`compiler::compile`]
//! 1. resolve labels and slot counts into flat bytecode with
//!    [`assembler::Assembler::assemble`]
//! 1. hand the bytecode to a [`vm::Vm`] and call `run`
//!
//! Or use the [`run`] shortcut, which does all of the above:
//!
//! ```
//! let mut out = vec![];
//! jy_lib::run("print 1 + 2", &mut out)?;
//! assert_eq!(out, b"3\n");
//! # Ok::<(), jy_lib::Error>(())
//! ```

use std::io::Write;

use thiserror::Error;

pub mod assembler;
pub mod compiler;
pub mod core;
pub mod lexer;
pub mod parser;
pub mod vm;

use crate::core::Object;

/// Any error the pipeline can produce, from scanning to execution.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] parser::SyntaxError),

    #[error(transparent)]
    Compile(#[from] compiler::CompileError),

    #[error(transparent)]
    Runtime(#[from] vm::Error),
}

impl Error {
    /// The source line the error points at, where one is known.
    pub fn line(&self) -> Option<u64> {
        match self {
            Error::Syntax(err) => Some(err.line()),
            Error::Compile(err) => err.line(),
            Error::Runtime(_) => None,
        }
    }
}

/// Compiles a source string down to executable bytecode.
pub fn compile(src: &str) -> Result<Vec<u8>, Error> {
    let ast = parser::parse(src)?;
    let asm = compiler::compile(&ast)?;
    Ok(asm.assemble())
}

/// Compiles and runs a source string, writing `print` output to `out`.
/// Returns the program's value.
pub fn run(src: &str, out: &mut dyn Write) -> Result<Object, Error> {
    let program = compile(src)?;
    let value = vm::Vm::new(program, out).run()?;
    Ok(value)
}
