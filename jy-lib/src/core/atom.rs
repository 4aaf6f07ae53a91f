//! Symbolic bytecode units. The compiler emits these instead of final bytes
//! because two things are unknown until a block or jump target has been fully
//! compiled: how many slots a scope needs, and the byte offset of a forward
//! label. The assembler resolves both in a second pass.

/// One symbolic unit. Label ids and slot-count ids come from the assembler's
/// shared monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    /// A verbatim opcode byte.
    Byte(u8),
    /// A verbatim 8-byte immediate.
    Number(u64),
    /// Pins `id` to the current byte offset. Emits nothing.
    LabelDef(u64),
    /// Replaced by the pinned byte offset during assembly.
    LabelRef(u64),
    /// Pins `id` to a literal value. Emits nothing.
    SlotDef(u64, u64),
    /// Replaced by the pinned literal during assembly.
    SlotRef(u64),
}
