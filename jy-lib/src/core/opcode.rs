//! The instruction set. One byte per opcode; where an instruction takes
//! operands they follow it as 8-byte little-endian words.

use std::fmt::Write;

/// Opcode bytes. `0x00` is deliberately unassigned so an all-zero buffer is
/// not a valid program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Op {
    /// push the following 8-byte literal as an integer
    PushInt = 0x01,
    Add = 0x02,
    Sub = 0x03,
    Mul = 0x04,
    Div = 0x05,
    Neg = 0x06,
    Pop = 0x07,
    Halt = 0x08,
    PushNone = 0x09,
    /// operands: slot, scope depth; copies the slot onto the stack
    Push = 0x0A,
    /// operands: slot, scope depth; copies the stack top into the slot
    Pull = 0x0B,
    /// operand: slot count of the scope to allocate
    ScopeEnter = 0x0C,
    ScopeExit = 0x0D,
    Print = 0x0E,
    /// operand: absolute byte offset
    Jump = 0x0F,
    /// operand: absolute byte offset; jumps when the popped condition is true
    Branch = 0x10,
    /// operand: absolute byte offset; jumps when the popped condition is false
    BranchIfFalse = 0x11,
}

impl Op {
    pub fn from_byte(byte: u8) -> Option<Op> {
        use Op::*;
        Some(match byte {
            0x01 => PushInt,
            0x02 => Add,
            0x03 => Sub,
            0x04 => Mul,
            0x05 => Div,
            0x06 => Neg,
            0x07 => Pop,
            0x08 => Halt,
            0x09 => PushNone,
            0x0A => Push,
            0x0B => Pull,
            0x0C => ScopeEnter,
            0x0D => ScopeExit,
            0x0E => Print,
            0x0F => Jump,
            0x10 => Branch,
            0x11 => BranchIfFalse,
            _ => return None,
        })
    }

    /// Number of 8-byte operand words following the opcode byte.
    pub fn operand_words(self) -> usize {
        use Op::*;
        match self {
            PushInt | ScopeEnter | Jump | Branch | BranchIfFalse => 1,
            Push | Pull => 2,
            Add | Sub | Mul | Div | Neg | Pop | Halt | PushNone | ScopeExit | Print => 0,
        }
    }
}

/// Renders bytecode one instruction per line, offsets included. Backs the
/// CLI's `--show-bytecode` dump.
pub fn disassemble(code: &[u8]) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < code.len() {
        let byte = code[pc];
        let Some(op) = Op::from_byte(byte) else {
            let _ = writeln!(out, "{pc:06} ??? ({byte:#04x})");
            pc += 1;
            continue;
        };
        let _ = write!(out, "{pc:06} {op}");
        pc += 1;
        for _ in 0..op.operand_words() {
            match code.get(pc..pc + 8) {
                Some(bytes) => {
                    let mut word = [0u8; 8];
                    word.copy_from_slice(bytes);
                    let _ = write!(out, " {}", u64::from_le_bytes(word));
                    pc += 8;
                }
                None => {
                    let _ = write!(out, " <truncated>");
                    pc = code.len();
                    break;
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        for byte in 0x01..=0x11u8 {
            let op = Op::from_byte(byte).unwrap();
            assert_eq!(op as u8, byte);
        }
        assert_eq!(Op::from_byte(0x00), None);
        assert_eq!(Op::from_byte(0x12), None);
    }

    #[test]
    fn disassembles_operands() {
        let mut code = vec![Op::PushInt as u8];
        code.extend_from_slice(&42u64.to_le_bytes());
        code.push(Op::Halt as u8);
        let listing = disassemble(&code);
        assert_eq!(listing, "000000 push_int 42\n000009 halt\n");
    }
}
