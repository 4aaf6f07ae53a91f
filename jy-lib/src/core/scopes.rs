//! Compile-time scopes: a symbol table, a monotonic slot counter, and a link
//! to the enclosing scope. Slot indices are handed out once per identifier per
//! scope and never reused, so they double as indices into the runtime scope's
//! slot array.

use crate::core::SymbolTable;

#[derive(Debug, Default)]
pub struct Scope {
    table: SymbolTable,
    next_slot: u64,
    pub parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `ident` in this scope, allocating the next free one if the
    /// name is new here.
    pub fn assign(&mut self, ident: &str) -> u64 {
        let (slot, inserted) = self.table.get_or_put(ident, self.next_slot);
        if inserted {
            self.next_slot += 1;
        }
        slot
    }

    /// Searches this scope, then its ancestors. Depth is the number of parent
    /// hops to the scope owning the slot.
    pub fn lookup(&self, ident: &str) -> Option<(u64, u64)> {
        let mut scope = Some(self);
        let mut depth = 0;
        while let Some(s) = scope {
            if let Some(slot) = s.table.get(ident) {
                return Some((slot, depth));
            }
            scope = s.parent.as_deref();
            depth += 1;
        }
        None
    }

    /// Number of slots this scope needs at runtime. Only final once the whole
    /// block has been compiled.
    pub fn slot_count(&self) -> u64 {
        self.next_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_is_stable_per_name() {
        let mut scope = Scope::new();
        assert_eq!(scope.assign("a"), 0);
        assert_eq!(scope.assign("b"), 1);
        assert_eq!(scope.assign("a"), 0);
        assert_eq!(scope.slot_count(), 2);
    }

    #[test]
    fn lookup_walks_the_chain() {
        let mut outer = Scope::new();
        outer.assign("a");
        outer.assign("b");
        let mut inner = Scope::new();
        inner.parent = Some(Box::new(outer));
        inner.assign("b");

        assert_eq!(inner.lookup("b"), Some((0, 0)));
        assert_eq!(inner.lookup("a"), Some((0, 1)));
        assert_eq!(inner.lookup("c"), None);
    }
}
