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

//! The per-value overlay: parallel structure tracking "what changed, at
//! what engine time" alongside a [`Value`](crate::value::Value) (spec §4.3).
//!
//! Every container-shaped overlay node carries its own `last_modified`
//! stamp plus shape-specific delta bookkeeping (added/removed keys,
//! modified field indices, pushed/popped/evicted events). Delta buffers are
//! lazily cleared: a write at a new tick first drops whatever the previous
//! tick recorded rather than eagerly flushing every overlay on every tick
//! boundary (spec invariant 5) - see [`TickSet`].

use std::collections::HashMap;

use crate::time::EngineTime;
use crate::value::Value;

/// A set of slot indices touched at exactly one engine time, cleared
/// lazily the next time a write lands at a different time.
#[derive(Debug, Clone, Default)]
pub struct TickSet {
    time: EngineTime,
    touched: bool,
    slots: Vec<usize>,
}

impl TickSet {
    pub(crate) fn record(&mut self, time: EngineTime, slot: usize) {
        if !self.touched || self.time != time {
            self.slots.clear();
            self.time = time;
            self.touched = true;
        }
        if !self.slots.contains(&slot) {
            self.slots.push(slot);
        }
    }

    /// The slots touched at `time`; empty if the last recorded time differs
    /// (spec property P4: "delta queries at a tick other than the write
    /// tick see nothing").
    pub fn at(&self, time: EngineTime) -> &[usize] {
        if self.touched && self.time == time {
            &self.slots
        } else {
            &[]
        }
    }
}

/// Like [`TickSet`], but holds the actual removed/added [`Value`] rather
/// than a slot index (spec §4.3: TSD's `added_keys`/`removed_keys` and
/// TSS's `added_values`/`removed_values` "persist because TSD/TSS slots are
/// unstable to callers who stored references" - a `KeySet` slot freed by a
/// removal may be reissued to an unrelated key before the delta is read, so
/// the index alone is not enough to recover what was added or removed).
#[derive(Debug, Clone, Default)]
pub struct ValueTickSet {
    time: EngineTime,
    touched: bool,
    values: Vec<Value>,
}

impl ValueTickSet {
    pub(crate) fn record(&mut self, time: EngineTime, value: Value) {
        if !self.touched || self.time != time {
            self.values.clear();
            self.time = time;
            self.touched = true;
        }
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    /// The values touched at `time`; empty if the last recorded time differs.
    pub fn at(&self, time: EngineTime) -> &[Value] {
        if self.touched && self.time == time {
            &self.values
        } else {
            &[]
        }
    }
}

/// Like [`ValueTickSet`], but does not deduplicate: a TSW (window) can
/// legitimately evict the same value twice in one tick (e.g. two equal
/// samples pushed back to back with capacity 1), unlike a set/map key which
/// is unique by definition.
#[derive(Debug, Clone, Default)]
pub struct ValueLog {
    time: EngineTime,
    touched: bool,
    values: Vec<Value>,
}

impl ValueLog {
    pub(crate) fn record(&mut self, time: EngineTime, value: Value) {
        if !self.touched || self.time != time {
            self.values.clear();
            self.time = time;
            self.touched = true;
        }
        self.values.push(value);
    }

    pub fn at(&self, time: EngineTime) -> &[Value] {
        if self.touched && self.time == time {
            &self.values
        } else {
            &[]
        }
    }
}

/// Shape-specific delta/modification bookkeeping, mirroring `Value`'s
/// container variants one-for-one (spec §4.3's per-TS-kind table).
#[derive(Debug, Clone)]
pub enum OverlayKind {
    /// Scalar, or any container type treated as an opaque leaf for change
    /// tracking purposes (a SIGNAL sample).
    Leaf,
    Bundle {
        fields: Vec<Overlay>,
        modified: TickSet,
    },
    Tuple {
        elements: Vec<Overlay>,
        modified: TickSet,
    },
    List {
        elements: Vec<Overlay>,
        modified: TickSet,
        added: TickSet,
        removed: TickSet,
    },
    Set {
        /// Keyed by the same `KeySet` slot index as the backing `SetValue`.
        elements: HashMap<usize, Overlay>,
        added: ValueTickSet,
        removed: ValueTickSet,
    },
    Map {
        elements: HashMap<usize, Overlay>,
        added: ValueTickSet,
        removed: ValueTickSet,
        modified: TickSet,
    },
    /// A cyclic buffer (TSW window): tracks pushes (new samples) and
    /// evictions (samples that fell off the back) separately, since a
    /// window consumer typically needs to know both. `times` mirrors the
    /// backing `CyclicBufferValue`'s occupied slots in write order, giving
    /// `first_modified_time()` the timestamp of the oldest sample still in
    /// the window without needing the overlay to carry a per-slot `Overlay`
    /// (a window element is a leaf; only the window as a whole is
    /// navigated).
    CyclicBuffer {
        times: std::collections::VecDeque<EngineTime>,
        pushed: TickSet,
        evicted: ValueLog,
    },
    Queue {
        pushed: TickSet,
        popped: TickSet,
    },
    /// A REF tracks only rebind/unbind events; the target's own overlay is
    /// reached by dereferencing, not stored here (spec §4.5: overlay
    /// tracking does not cross a ref boundary).
    Ref {
        rebound: TickSet,
    },
}

/// The overlay node for one `Value` node (spec §4.3 `Overlay`).
#[derive(Debug, Clone)]
pub struct Overlay {
    pub(crate) last_modified: EngineTime,
    pub(crate) kind: OverlayKind,
}

impl Overlay {
    /// Build a fresh, nothing-ever-written overlay shaped to match `value`
    /// (spec §3.2 invariant 2: "set" iff `last_modified != MIN_TIME" - a
    /// just-constructed cell has written nothing, so every leaf in the tree,
    /// including the root, is stamped `MIN_TIME` rather than the
    /// construction tick). Used at cell construction, where `new_for` below
    /// would otherwise falsely mark every leaf "set" as of tick zero.
    pub fn new_unset(value: &Value) -> Overlay {
        Overlay::new_for(value, crate::time::MIN_TIME)
    }

    /// Build an overlay shaped to match `value`, stamped at `time` as if
    /// every leaf in it had just been written - the genuine post-write
    /// rebuild path (e.g. [`TSViewMut::set_value`](crate::ts::view_mut::TSViewMut::set_value),
    /// which legitimately just wrote `value` wholesale and must mark it, and
    /// everything under it, modified at `time`).
    pub fn new_for(value: &Value, time: EngineTime) -> Overlay {
        fn child(slot: Option<&Value>, time: EngineTime) -> Overlay {
            match slot {
                Some(v) => Overlay::new_for(v, time),
                None => Overlay {
                    last_modified: time,
                    kind: OverlayKind::Leaf,
                },
            }
        }

        let kind = match value {
            Value::Scalar(_) => OverlayKind::Leaf,
            Value::Bundle(b) => OverlayKind::Bundle {
                fields: (0..b.len()).map(|i| child(b.at(i).ok().flatten(), time)).collect(),
                modified: TickSet::default(),
            },
            Value::Tuple(t) => OverlayKind::Tuple {
                elements: (0..t.len()).map(|i| child(t.at(i).ok().flatten(), time)).collect(),
                modified: TickSet::default(),
            },
            Value::List(l) => OverlayKind::List {
                elements: (0..l.size()).map(|i| child(l.at(i).ok().flatten(), time)).collect(),
                modified: TickSet::default(),
                added: TickSet::default(),
                removed: TickSet::default(),
            },
            Value::Set(_) => OverlayKind::Set {
                elements: HashMap::new(),
                added: ValueTickSet::default(),
                removed: ValueTickSet::default(),
            },
            Value::Map(m) => OverlayKind::Map {
                elements: m
                    .iter_slots()
                    .map(|(slot, _, v)| (slot, child(v, time)))
                    .collect(),
                added: ValueTickSet::default(),
                removed: ValueTickSet::default(),
                modified: TickSet::default(),
            },
            Value::CyclicBuffer(cb) => OverlayKind::CyclicBuffer {
                times: std::iter::repeat(time).take(cb.length()).collect(),
                pushed: TickSet::default(),
                evicted: ValueLog::default(),
            },
            Value::Queue(_) => OverlayKind::Queue {
                pushed: TickSet::default(),
                popped: TickSet::default(),
            },
            Value::Ref(_) => OverlayKind::Ref {
                rebound: TickSet::default(),
            },
        };
        Overlay {
            last_modified: time,
            kind,
        }
    }

    pub fn last_modified(&self) -> EngineTime {
        self.last_modified
    }

    /// Stamp this node as modified at `time` (spec §4.3 "modification
    /// bubbling": called on every ancestor on the way back up from a leaf
    /// write, as well as on the leaf itself).
    pub fn stamp(&mut self, time: EngineTime) {
        self.last_modified = time;
    }

    /// Reset this leaf back to "never written" (spec §3.2 invariant 2).
    /// Unlike `stamp`, this does not bubble a modification at the current
    /// tick - it is a reset, not a write.
    pub fn invalidate(&mut self) {
        self.last_modified = crate::time::MIN_TIME;
    }

    pub fn kind(&self) -> &OverlayKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut OverlayKind {
        &mut self.kind
    }
}

impl OverlayKind {
    pub fn as_bundle(&self) -> Option<(&[Overlay], &TickSet)> {
        match self {
            OverlayKind::Bundle { fields, modified } => Some((fields, modified)),
            _ => None,
        }
    }
    pub fn as_bundle_mut(&mut self) -> Option<(&mut Vec<Overlay>, &mut TickSet)> {
        match self {
            OverlayKind::Bundle { fields, modified } => Some((fields, modified)),
            _ => None,
        }
    }
    pub fn as_list_mut(&mut self) -> Option<(&mut Vec<Overlay>, &mut TickSet, &mut TickSet, &mut TickSet)> {
        match self {
            OverlayKind::List {
                elements,
                modified,
                added,
                removed,
            } => Some((elements, modified, added, removed)),
            _ => None,
        }
    }
    pub fn as_map_mut(
        &mut self,
    ) -> Option<(&mut HashMap<usize, Overlay>, &mut ValueTickSet, &mut ValueTickSet, &mut TickSet)> {
        match self {
            OverlayKind::Map {
                elements,
                added,
                removed,
                modified,
            } => Some((elements, added, removed, modified)),
            _ => None,
        }
    }
    pub fn as_set_mut(&mut self) -> Option<(&mut HashMap<usize, Overlay>, &mut ValueTickSet, &mut ValueTickSet)> {
        match self {
            OverlayKind::Set { elements, added, removed } => Some((elements, added, removed)),
            _ => None,
        }
    }
    pub fn as_cyclic_buffer(&self) -> Option<(&std::collections::VecDeque<EngineTime>, &TickSet, &ValueLog)> {
        match self {
            OverlayKind::CyclicBuffer { times, pushed, evicted } => Some((times, pushed, evicted)),
            _ => None,
        }
    }
    pub fn as_cyclic_buffer_mut(
        &mut self,
    ) -> Option<(&mut std::collections::VecDeque<EngineTime>, &mut TickSet, &mut ValueLog)> {
        match self {
            OverlayKind::CyclicBuffer { times, pushed, evicted } => Some((times, pushed, evicted)),
            _ => None,
        }
    }
    pub fn as_queue_mut(&mut self) -> Option<(&mut TickSet, &mut TickSet)> {
        match self {
            OverlayKind::Queue { pushed, popped } => Some((pushed, popped)),
            _ => None,
        }
    }
    pub fn as_ref_mut(&mut self) -> Option<&mut TickSet> {
        match self {
            OverlayKind::Ref { rebound } => Some(rebound),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemeta::{builtin, register_bundle};

    #[test]
    fn fresh_overlay_matches_bundle_shape() {
        let schema = register_bundle("OverlayT1", vec![("a", builtin::i64_type()), ("b", builtin::i64_type())]);
        let value = Value::new(&schema);
        let overlay = Overlay::new_for(&value, 0);
        let (fields, _) = overlay.kind().as_bundle().unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn new_unset_stamps_every_leaf_min_time() {
        let schema = register_bundle("OverlayT5", vec![("a", builtin::i64_type()), ("b", builtin::i64_type())]);
        let value = Value::new(&schema);
        let overlay = Overlay::new_unset(&value);
        assert_eq!(overlay.last_modified(), crate::time::MIN_TIME);
        let (fields, _) = overlay.kind().as_bundle().unwrap();
        assert!(fields.iter().all(|f| f.last_modified() == crate::time::MIN_TIME));
    }

    #[test]
    fn invalidate_resets_last_modified_without_bubbling() {
        let mut overlay = Overlay {
            last_modified: 5,
            kind: OverlayKind::Leaf,
        };
        overlay.invalidate();
        assert_eq!(overlay.last_modified(), crate::time::MIN_TIME);
    }

    #[test]
    fn tickset_clears_lazily_on_new_time() {
        let mut ts = TickSet::default();
        ts.record(5, 0);
        ts.record(5, 1);
        assert_eq!(ts.at(5), &[0, 1]);
        ts.record(6, 2);
        assert_eq!(ts.at(6), &[2]);
        assert_eq!(ts.at(5), &[] as &[usize]);
    }

    #[test]
    fn value_log_keeps_duplicate_evictions_in_one_tick() {
        let mut log = ValueLog::default();
        log.record(7, Value::from_i64(1));
        log.record(7, Value::from_i64(1));
        assert_eq!(log.at(7).len(), 2);
        assert_eq!(log.at(8), &[] as &[Value]);
    }

    #[test]
    fn value_tick_set_deduplicates_within_one_tick() {
        let mut vts = ValueTickSet::default();
        vts.record(7, Value::from_string("a"));
        vts.record(7, Value::from_string("a"));
        assert_eq!(vts.at(7).len(), 1);
    }
}
