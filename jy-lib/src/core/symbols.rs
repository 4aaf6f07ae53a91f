//! The string-to-integer store that underlies compile-time scopes and the
//! lexer's operator and keyword tables.
//!
//! Open addressing with linear probing. The table starts tiny and grows with a
//! full rehash whenever a probe sequence wraps around without finding a free
//! slot, so the growth path is exercised even by small programs.

const INITIAL_LEN: usize = 2;

// 64-bit FNV-1a
const OFFSET_BASIS: u64 = 14695981039346656037;
const PRIME: u64 = 1099511628211;

fn hash(key: &str) -> u64 {
    let mut hash = OFFSET_BASIS;
    for byte in key.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Clone, Default)]
enum Entry {
    #[default]
    Empty,
    Occupied { key: String, value: u64 },
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    map: Vec<Entry>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            map: vec![Entry::Empty; INITIAL_LEN],
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        let len = self.map.len();
        let mut slot = hash(key) as usize % len;
        let init = slot;
        loop {
            match &self.map[slot] {
                Entry::Occupied { key: k, value } if k == key => return Some(*value),
                Entry::Occupied { .. } => {}
                Entry::Empty => return None,
            }
            slot = (slot + 1) % len;
            if slot == init {
                return None;
            }
        }
    }

    /// Inserts or overwrites in place.
    pub fn put(&mut self, key: &str, value: u64) {
        let len = self.map.len();
        let mut slot = hash(key) as usize % len;
        let init = slot;
        loop {
            match &mut self.map[slot] {
                Entry::Occupied { key: k, value: v } if k == key => {
                    *v = value;
                    return;
                }
                Entry::Occupied { .. } => {}
                entry => {
                    *entry = Entry::Occupied {
                        key: key.to_owned(),
                        value,
                    };
                    return;
                }
            }
            slot = (slot + 1) % len;
            if slot == init {
                break;
            }
        }
        self.rehash();
        self.put(key, value);
    }

    /// Returns the stored value for `key`, inserting `default` first if the
    /// key is new. The flag reports whether an insert happened.
    pub fn get_or_put(&mut self, key: &str, default: u64) -> (u64, bool) {
        match self.get(key) {
            Some(value) => (value, false),
            None => {
                self.put(key, default);
                (default, true)
            }
        }
    }

    fn rehash(&mut self) {
        let grown = vec![Entry::Empty; self.map.len() * 2 + 1];
        let old = std::mem::replace(&mut self.map, grown);
        for entry in old {
            if let Entry::Occupied { key, value } = entry {
                self.put(&key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let table = SymbolTable::new();
        assert_eq!(table.get("x"), None);
    }

    #[test]
    fn put_overwrites_in_place() {
        let mut table = SymbolTable::new();
        table.put("x", 1);
        table.put("x", 2);
        assert_eq!(table.get("x"), Some(2));
    }

    #[test]
    fn survives_growth() {
        let mut table = SymbolTable::new();
        for i in 0..100u64 {
            table.put(&format!("key_{i}"), i);
        }
        for i in 0..100u64 {
            assert_eq!(table.get(&format!("key_{i}")), Some(i));
        }
        assert_eq!(table.get("key_100"), None);
    }

    #[test]
    fn get_or_put_reports_inserts() {
        let mut table = SymbolTable::new();
        assert_eq!(table.get_or_put("a", 7), (7, true));
        assert_eq!(table.get_or_put("a", 9), (7, false));
    }
}
