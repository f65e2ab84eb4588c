// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `KeySet`: the stable-slot hash set shared by `Set` and `Map` storage
//! (spec §4.1). Slot indices are stable for the lifetime of the entry - an
//! erased slot is retained on a free list and may be reused, but only after
//! the key it held is dropped (spec property P5).
//!
//! Grounded on the arena+index pattern spec §9 recommends over hash maps
//! that invalidate iterators on rehash, and on the slot-table designs in
//! `other_examples/38e2930d_salsa-rs-salsa__src-interned.rs` and
//! `other_examples/348b656b_aptos-labs-aptos-core__...versioned_data.rs`.

use std::collections::HashMap;

use crate::value::Value;

enum Slot {
    Occupied(Value),
    Free(Option<usize>),
}

/// A set of [`Value`]s with stable, reusable slot indices.
#[derive(Default)]
pub struct KeySet {
    slots: Vec<Slot>,
    index: HashMap<Value, usize>,
    free_head: Option<usize>,
    len: usize,
}

impl Clone for KeySet {
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .iter()
            .map(|s| match s {
                Slot::Occupied(v) => Slot::Occupied(v.clone()),
                Slot::Free(next) => Slot::Free(*next),
            })
            .collect();
        KeySet {
            slots,
            index: self.index.clone(),
            free_head: self.free_head,
            len: self.len,
        }
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-tombstone) slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The capacity of the slot array (live + tombstoned).
    pub fn slot_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index.contains_key(value)
    }

    pub fn slot_of(&self, value: &Value) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn value_at(&self, slot: usize) -> Option<&Value> {
        match self.slots.get(slot)? {
            Slot::Occupied(v) => Some(v),
            Slot::Free(_) => None,
        }
    }

    /// Insert `value`, returning its slot. If an equal value is already
    /// present its existing slot is returned unchanged (spec §4.1 `add`).
    pub fn add(&mut self, value: Value) -> usize {
        if let Some(&slot) = self.index.get(&value) {
            return slot;
        }
        let slot = if let Some(free) = self.free_head {
            self.free_head = match &self.slots[free] {
                Slot::Free(next) => *next,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            };
            self.slots[free] = Slot::Occupied(value.clone());
            free
        } else {
            self.slots.push(Slot::Occupied(value.clone()));
            self.slots.len() - 1
        };
        self.index.insert(value, slot);
        self.len += 1;
        slot
    }

    /// Remove `value` if present, returning its former slot. The slot is
    /// retained on the free list - live slot indices of other entries never
    /// change (spec property P5).
    pub fn remove(&mut self, value: &Value) -> Option<usize> {
        let slot = self.index.remove(value)?;
        self.slots[slot] = Slot::Free(self.free_head);
        self.free_head = Some(slot);
        self.len -= 1;
        Some(slot)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.free_head = None;
        self.len = 0;
    }

    /// Iterate live slots in slot order (spec §4.2: "must skip tombstones
    /// and never expose a freed slot").
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied(v) => Some(v),
            Slot::Free(_) => None,
        })
    }

    /// Iterate live `(slot, value)` pairs in slot order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Slot::Occupied(v) => Some((i, v)),
            Slot::Free(_) => None,
        })
    }
}

impl PartialEq for KeySet {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn p5_slot_stability_across_unrelated_removal() {
        let mut ks = KeySet::new();
        let a = ks.add(Value::from_i64(1));
        let b = ks.add(Value::from_i64(2));
        ks.remove(&Value::from_i64(1));
        assert!(ks.contains(&Value::from_i64(2)));
        assert_eq!(ks.slot_of(&Value::from_i64(2)), Some(b));
        assert_ne!(a, b);
    }

    #[test]
    fn add_idempotent_returns_same_slot() {
        let mut ks = KeySet::new();
        let a = ks.add(Value::from_i64(7));
        let b = ks.add(Value::from_i64(7));
        assert_eq!(a, b);
        assert_eq!(ks.len(), 1);
    }

    #[test]
    fn removed_slot_is_reused() {
        let mut ks = KeySet::new();
        let a = ks.add(Value::from_i64(1));
        ks.remove(&Value::from_i64(1));
        let b = ks.add(Value::from_i64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn iteration_skips_tombstones() {
        let mut ks = KeySet::new();
        ks.add(Value::from_i64(1));
        ks.add(Value::from_i64(2));
        ks.remove(&Value::from_i64(1));
        let remaining: Vec<_> = ks.iter().cloned().collect();
        assert_eq!(remaining, vec![Value::from_i64(2)]);
    }
}
