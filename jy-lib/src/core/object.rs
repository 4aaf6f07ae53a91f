//! Run-time value representation.

use std::fmt;

/// Index of a runtime scope in the GC arena.
pub type ScopeId = usize;

/// A tagged runtime value. Fixed width regardless of tag; copied by value
/// between the operand stack and scope slots.
///
/// Integer literals are lexed unsigned and reinterpreted as signed two's
/// complement here, so `18446744073709551615` prints as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Object {
    Integer(i64),
    #[default]
    None,
    Scope(ScopeId),
}

impl Object {
    /// Tag name as it appears in type errors.
    pub fn kind(self) -> &'static str {
        match self {
            Object::Integer(_) => "integer",
            Object::None => "none",
            Object::Scope(_) => "scope",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{value}"),
            Object::None => write!(f, "none"),
            Object::Scope(id) => write!(f, "scope@{id}"),
        }
    }
}
