//! Two-pass assembly of the symbolic atom stream into flat bytecode.

use crate::core::{Atom, Op};

/// Collects atoms during compilation and resolves them afterwards. Also owns
/// the monotonic id counter shared by labels and slot-count placeholders, so
/// the resolution table can be sized exactly.
#[derive(Debug, Default)]
pub struct Assembler {
    atoms: Vec<Atom>,
    next_id: u64,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn emit_op(&mut self, op: Op) {
        self.emit(Atom::Byte(op as u8));
    }

    /// Pass 1 walks the atoms with a byte cursor, recording label offsets and
    /// slot-count literals in a dense table indexed by id. Pass 2 emits the
    /// final bytes, substituting every reference with its resolved word.
    ///
    /// A reference whose id was never defined is a compiler bug, not a user
    /// error; it fails fast here.
    pub fn assemble(self) -> Vec<u8> {
        let mut lookup: Vec<Option<u64>> = vec![None; self.next_id as usize];
        let mut pc: u64 = 0;
        for atom in &self.atoms {
            match *atom {
                Atom::Byte(_) => pc += 1,
                Atom::Number(_) | Atom::LabelRef(_) | Atom::SlotRef(_) => pc += 8,
                Atom::LabelDef(id) => lookup[id as usize] = Some(pc),
                Atom::SlotDef(id, value) => lookup[id as usize] = Some(value),
            }
        }

        let mut code = Vec::with_capacity(pc as usize);
        for atom in &self.atoms {
            match *atom {
                Atom::Byte(byte) => code.push(byte),
                Atom::Number(value) => code.extend_from_slice(&value.to_le_bytes()),
                Atom::LabelRef(id) | Atom::SlotRef(id) => {
                    let value = lookup[id as usize]
                        .unwrap_or_else(|| panic!("atom id {id} referenced but never defined"));
                    code.extend_from_slice(&value.to_le_bytes());
                }
                Atom::LabelDef(_) | Atom::SlotDef(_, _) => {}
            }
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_at(code: &[u8], offset: usize) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&code[offset..offset + 8]);
        u64::from_le_bytes(word)
    }

    #[test]
    fn forward_label_resolves_to_its_final_offset() {
        let mut asm = Assembler::new();
        let label = asm.fresh_id();
        asm.emit_op(Op::Jump);
        asm.emit(Atom::LabelRef(label));
        asm.emit_op(Op::Pop);
        asm.emit(Atom::LabelDef(label));
        asm.emit_op(Op::Halt);
        let code = asm.assemble();

        assert_eq!(code.len(), 1 + 8 + 1 + 1);
        assert_eq!(code[0], Op::Jump as u8);
        // the label sits after jump (9 bytes) and pop (1 byte)
        assert_eq!(word_at(&code, 1), 10);
        assert_eq!(code[10], Op::Halt as u8);
    }

    #[test]
    fn backward_label_resolves() {
        let mut asm = Assembler::new();
        let label = asm.fresh_id();
        asm.emit(Atom::LabelDef(label));
        asm.emit_op(Op::Pop);
        asm.emit_op(Op::Jump);
        asm.emit(Atom::LabelRef(label));
        let code = asm.assemble();

        assert_eq!(word_at(&code, 2), 0);
    }

    #[test]
    fn slot_definition_substitutes_its_literal() {
        let mut asm = Assembler::new();
        let slots = asm.fresh_id();
        asm.emit_op(Op::ScopeEnter);
        asm.emit(Atom::SlotRef(slots));
        asm.emit_op(Op::Halt);
        // defined after the reference, as the compiler does for blocks
        asm.emit(Atom::SlotDef(slots, 3));
        let code = asm.assemble();

        assert_eq!(code[0], Op::ScopeEnter as u8);
        assert_eq!(word_at(&code, 1), 3);
    }

    #[test]
    #[should_panic(expected = "referenced but never defined")]
    fn undefined_id_fails_fast() {
        let mut asm = Assembler::new();
        let label = asm.fresh_id();
        asm.emit(Atom::LabelRef(label));
        asm.assemble();
    }
}
