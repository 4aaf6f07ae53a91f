//! contains the data structures shared between pipeline stages

pub mod ast;
pub use ast::*;

pub mod atom;
pub use atom::*;

pub mod object;
pub use object::*;

pub mod opcode;
pub use opcode::*;

pub mod scopes;
pub use scopes::*;

pub mod symbols;
pub use symbols::*;
