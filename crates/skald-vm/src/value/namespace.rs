// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Namespace storage: an open-addressed, linear-probe hash table from atom
//! id to value id.
//!
//! Keys hash to themselves (they are small interned integers). The empty
//! sentinel is key 0, deleted slots hold [`TOMBSTONE`]. The table doubles
//! when half full, so probe chains always terminate. Assigning value id 0
//! (`none`) deletes the binding.
//!
//! Parent chains (lexical scoping) are walked by the VM, which owns the
//! value table; this module only implements a single level.

use super::Word;

/// Key marking a deleted slot.
pub const TOMBSTONE: Word = !0;

/// Initial table capacity. Must be a power of two.
const INITIAL_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    key: Word,
    val: Word,
}

/// A single namespace level: optional parent plus a lazily allocated table.
#[derive(Debug, Clone)]
pub struct NamespaceData {
    /// Id of the parent namespace value, or 0 for none.
    pub parent: Word,
    table: Option<Box<NamespaceTable>>,
}

impl NamespaceData {
    /// Create an empty namespace. The table is allocated on first insert.
    #[must_use]
    pub fn new(parent: Word) -> Self {
        Self {
            parent,
            table: None,
        }
    }

    /// Set `key` to `val` in this level. `val == 0` deletes the binding.
    pub fn set(&mut self, key: Word, val: Word) {
        if val == 0 {
            if let Some(table) = self.table.as_mut() {
                table.delete(key);
            }
            return;
        }

        self.table
            .get_or_insert_with(|| Box::new(NamespaceTable::new(INITIAL_SIZE)))
            .set(key, val);
    }

    /// Look up `key` in this level only. Returns 0 when absent.
    #[must_use]
    pub fn get_local(&self, key: Word) -> Word {
        match &self.table {
            Some(table) => table.get(key),
            None => 0,
        }
    }

    /// Number of occupied slots (live keys plus tombstones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.len)
    }

    /// Whether nothing was ever inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table capacity, 0 before the first insert.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.slots.len())
    }

    /// Iterate over the live `(key, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (Word, Word)> + '_ {
        self.table
            .iter()
            .flat_map(|t| t.slots.iter())
            .filter(|slot| slot.key != 0 && slot.key != TOMBSTONE)
            .map(|slot| (slot.key, slot.val))
    }
}

/// The open-addressed table itself.
#[derive(Debug, Clone)]
pub struct NamespaceTable {
    len: usize,
    mask: Word,
    slots: Box<[Slot]>,
}

impl NamespaceTable {
    fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            len: 0,
            mask: (size - 1) as Word,
            slots: vec![Slot::default(); size].into_boxed_slice(),
        }
    }

    fn set(&mut self, key: Word, val: Word) {
        if self.len >= self.slots.len() / 2 {
            self.grow();
        }

        // First pass: replace the key if it is already present, remembering
        // the first tombstone on the probe path.
        let mut first_tombstone = None;
        for i in 0.. {
            let idx = (key.wrapping_add(i) & self.mask) as usize;
            match self.slots[idx].key {
                k if k == key => {
                    self.slots[idx].val = val;
                    return;
                }
                TOMBSTONE => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                0 => {
                    // Absent: claim the earliest tombstone, or this slot.
                    if let Some(t) = first_tombstone {
                        self.slots[t] = Slot { key, val };
                    } else {
                        self.slots[idx] = Slot { key, val };
                        self.len += 1;
                    }
                    return;
                }
                _ => {}
            }
        }
    }

    fn get(&self, key: Word) -> Word {
        for i in 0.. {
            let idx = (key.wrapping_add(i) & self.mask) as usize;
            match self.slots[idx].key {
                0 => return 0,
                k if k == key => return self.slots[idx].val,
                // Keep probing past tombstones and other keys.
                _ => {}
            }
        }
        unreachable!("the table is never full");
    }

    fn delete(&mut self, key: Word) {
        for i in 0.. {
            let idx = (key.wrapping_add(i) & self.mask) as usize;
            match self.slots[idx].key {
                0 => return,
                k if k == key => {
                    self.slots[idx].key = TOMBSTONE;
                    return;
                }
                _ => {}
            }
        }
    }

    fn grow(&mut self) {
        let mut bigger = Self::new(self.slots.len() * 2);
        for slot in &self.slots {
            if slot.key != 0 && slot.key != TOMBSTONE {
                bigger.set(slot.key, slot.val);
            }
        }
        *self = bigger;
    }
}
