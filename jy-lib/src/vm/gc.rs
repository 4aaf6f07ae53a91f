//! Mark-sweep collector over the runtime scopes.
//!
//! The arena owns every scope it allocates. Storage is a vec of options plus
//! a free-index list, so freed ids are reused on the next allocation and live
//! ids stay stable. Each object carries a mark flag stamped with the arena's
//! current epoch; collection flips the epoch, re-marks everything reachable,
//! and sweeps the rest.

use crate::core::{Object, ScopeId};

/// A runtime scope: a slot array plus a non-owning link to its parent.
#[derive(Debug)]
pub struct VmScope {
    pub slots: Vec<Object>,
    pub parent: Option<ScopeId>,
    mark: bool,
}

#[derive(Debug, Default)]
pub struct Gc {
    objects: Vec<Option<VmScope>>,
    free_indices: Vec<usize>,
    mark: bool,
}

impl Gc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a scope stamped with the current mark epoch.
    pub fn alloc(&mut self, slot_count: u64, parent: Option<ScopeId>) -> ScopeId {
        let scope = VmScope {
            slots: vec![Object::None; slot_count as usize],
            parent,
            mark: self.mark,
        };
        if let Some(id) = self.free_indices.pop() {
            self.objects[id] = Some(scope);
            id
        } else {
            self.objects.push(Some(scope));
            self.objects.len() - 1
        }
    }

    pub fn get(&self, id: ScopeId) -> Option<&VmScope> {
        self.objects.get(id)?.as_ref()
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut VmScope> {
        self.objects.get_mut(id)?.as_mut()
    }

    /// Flips the mark epoch, marks everything reachable from `root` through
    /// parent links, then frees every object left unmarked.
    ///
    /// Slot contents are not traced. Nothing the VM currently stores in a
    /// slot owns arena memory; if that ever changes, live slot arrays must
    /// become roots here too.
    pub fn collect(&mut self, root: Option<ScopeId>) {
        self.mark = !self.mark;
        if let Some(id) = root {
            self.mark_chain(id);
        }
        let mark = self.mark;
        for (id, entry) in self.objects.iter_mut().enumerate() {
            if let Some(scope) = entry {
                if scope.mark != mark {
                    *entry = None;
                    self.free_indices.push(id);
                }
            }
        }
    }

    fn mark_chain(&mut self, root: ScopeId) {
        let mark = self.mark;
        let mut next = Some(root);
        while let Some(id) = next {
            let Some(scope) = self.get_mut(id) else { break };
            if scope.mark == mark {
                break;
            }
            scope.mark = mark;
            next = scope.parent;
        }
    }

    /// Number of live objects in the arena.
    pub fn live_objects(&self) -> usize {
        self.objects.iter().filter(|entry| entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_with_no_root_empties_the_arena() {
        let mut gc = Gc::new();
        let a = gc.alloc(1, None);
        let b = gc.alloc(1, Some(a));
        gc.alloc(1, Some(b));
        assert_eq!(gc.live_objects(), 3);

        gc.collect(None);
        assert_eq!(gc.live_objects(), 0);
    }

    #[test]
    fn parent_chain_survives_collection() {
        let mut gc = Gc::new();
        let a = gc.alloc(1, None);
        let b = gc.alloc(1, Some(a));
        let c = gc.alloc(1, Some(b));
        gc.alloc(1, None); // unreachable

        gc.collect(Some(c));
        assert_eq!(gc.live_objects(), 3);
        assert!(gc.get(a).is_some());
        assert!(gc.get(b).is_some());
        assert!(gc.get(c).is_some());
    }

    #[test]
    fn rooting_a_leafward_scope_frees_its_children() {
        let mut gc = Gc::new();
        let a = gc.alloc(1, None);
        let b = gc.alloc(1, Some(a));
        gc.alloc(1, Some(b));

        gc.collect(Some(a));
        assert_eq!(gc.live_objects(), 1);
        assert!(gc.get(b).is_none());
    }

    #[test]
    fn freed_ids_are_reused() {
        let mut gc = Gc::new();
        let a = gc.alloc(1, None);
        gc.collect(None);
        let b = gc.alloc(1, None);
        assert_eq!(a, b);
    }

    #[test]
    fn surviving_objects_stay_valid_across_epochs() {
        let mut gc = Gc::new();
        let a = gc.alloc(2, None);
        gc.get_mut(a).unwrap().slots[1] = Object::Integer(7);

        gc.collect(Some(a));
        gc.collect(Some(a));
        assert_eq!(gc.get(a).unwrap().slots[1], Object::Integer(7));
    }
}
