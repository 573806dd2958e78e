//! Arena-style registries keyed by composite identity
//!
//! Composite keys (seller, listing, account) are interned once into a dense
//! `u32` slot; values live in a flat `Vec` indexed by that slot. Lookups are a
//! single hash lookup plus an index, and entries are never removed, which
//! matches the permanence of every registry in this protocol.

use std::collections::HashMap;
use std::hash::Hash;

/// Dense index assigned to an interned key
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u32);

impl Slot {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Maps keys to stable dense slots
#[derive(Debug, Clone)]
pub struct Interner<K> {
    slots: HashMap<K, Slot>,
    keys: Vec<K>,
}

impl<K> Default for Interner<K> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            keys: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> Interner<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `key` if it was interned before
    pub fn lookup(&self, key: &K) -> Option<Slot> {
        self.slots.get(key).copied()
    }

    /// Slot for `key`, interning it on first sight
    ///
    /// Returns the slot and whether it was newly created.
    pub fn intern(&mut self, key: K) -> (Slot, bool) {
        if let Some(slot) = self.slots.get(&key) {
            return (*slot, false);
        }
        // Registries never approach u32::MAX entries; saturate rather than wrap.
        let slot = Slot(u32::try_from(self.keys.len()).unwrap_or(u32::MAX));
        self.slots.insert(key, slot);
        self.keys.push(key);
        (slot, true)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn key(&self, slot: Slot) -> Option<&K> {
        self.keys.get(slot.index())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in interning order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }
}

/// Registry table: interned keys with one value per slot
#[derive(Debug, Clone)]
pub struct Table<K, V> {
    index: Interner<K>,
    values: Vec<V>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            index: Interner::default(),
            values: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash, V> Table<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index
            .lookup(key)
            .and_then(|slot| self.values.get(slot.index()))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.index.lookup(key)?;
        self.values.get_mut(slot.index())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// Insert or replace the value for `key`, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (slot, fresh) = self.index.intern(key);
        if fresh {
            self.values.push(value);
            None
        } else {
            self.values
                .get_mut(slot.index())
                .map(|existing| std::mem::replace(existing, value))
        }
    }

    /// Mutable access to the value for `key`, creating it with `init` if absent
    pub fn get_or_insert_with(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let (slot, fresh) = self.index.intern(key);
        if fresh {
            self.values.push(init());
        }
        // Interner and values grow in lockstep, so every slot is in bounds.
        &mut self.values[slot.index()]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.index.keys().zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable_and_dense() {
        let mut interner = Interner::new();
        let (a, fresh_a) = interner.intern((1_u64, 2_u64));
        let (b, fresh_b) = interner.intern((1_u64, 3_u64));
        let (a_again, fresh_again) = interner.intern((1_u64, 2_u64));

        assert!(fresh_a && fresh_b);
        assert!(!fresh_again, "Re-interning must not allocate a new slot");
        assert_eq!(a, a_again);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(interner.key(b), Some(&(1, 3)));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_table_insert_replaces_in_place() {
        let mut table = Table::new();
        assert_eq!(table.insert("listing", 10_u64), None);
        assert_eq!(table.insert("listing", 20_u64), Some(10));
        assert_eq!(table.get(&"listing"), Some(&20));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_absent_key_is_none() {
        let table: Table<u64, u64> = Table::new();
        assert!(table.get(&42).is_none());
        assert!(!table.contains(&42));
        assert!(table.is_empty());
    }

    #[test]
    fn test_get_or_insert_with_creates_once() {
        let mut table: Table<u8, u64> = Table::new();
        *table.get_or_insert_with(7, || 0) += 5;
        *table.get_or_insert_with(7, || 1_000) += 5;
        *table.get_or_insert_with(9, || 1) += 1;

        assert_eq!(table.get(&7), Some(&10));
        assert_eq!(table.get(&9), Some(&2));
        let keys: Vec<u8> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![7, 9]);
    }
}
