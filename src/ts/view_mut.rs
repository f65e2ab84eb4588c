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

//! The mutating cursor (spec §4.3's "modification bubbling": every write
//! stamps its own node and then every ancestor on the way back up).
//!
//! `TSViewMut` borrows its `Value`/`Overlay` pair mutably for as long as
//! the cursor lives. Nested mutation (`with_field_mut` and friends) takes a
//! closure rather than returning a long-lived child cursor: the child
//! borrow is scoped to the closure call, so once it returns we can inspect
//! whether the child stamped itself at the current tick and, if so, record
//! that on the parent: a recursive root-to-leaf walk that bubbles the stamp
//! back up through an ordinary call stack instead of a persistent tree of
//! simultaneous mutable borrows.

use crate::error::{Error, Result};
use crate::host::HostValue;
use crate::time::EngineTime;
use crate::ts::cell::TsCellInner;
use crate::ts::overlay::{Overlay, OverlayKind};
use crate::typemeta::TypeMetaRef;
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

pub struct TSViewMut<'a> {
    value: &'a mut Value,
    overlay: &'a mut Overlay,
    current_time: EngineTime,
}

impl<'a> TSViewMut<'a> {
    pub fn new(value: &'a mut Value, overlay: &'a mut Overlay, current_time: EngineTime) -> Self {
        TSViewMut {
            value,
            overlay,
            current_time,
        }
    }

    pub fn schema(&self) -> &TypeMetaRef {
        self.value.schema()
    }

    pub fn value(&self) -> &Value {
        self.value
    }

    pub fn last_modified(&self) -> EngineTime {
        self.overlay.last_modified()
    }

    /// Replace this node's whole value in one shot, rebuilding its overlay
    /// subtree fresh and stamping it at the cursor's current tick. This is
    /// the base case every other mutator eventually bottoms out in.
    pub fn set_value(&mut self, new: Value) -> Result<()> {
        if new.schema() != self.value.schema() {
            return Err(Error::SchemaMismatch {
                expected: self.value.schema().clone(),
                found: new.schema().clone(),
            });
        }
        let time = self.current_time;
        *self.overlay = Overlay::new_for(&new, time);
        *self.value = new;
        Ok(())
    }

    pub fn set_from_host(&mut self, src: &HostValue) -> Result<()> {
        let new = Value::from_host_object(self.value.schema(), src)?;
        self.set_value(new)
    }

    /// The scalar/window analogue of a composite's `delta_view(t)` (spec
    /// §4.4 "TS/Signal/Window (scalar): ... `has_delta()`"): whether this
    /// leaf carries a delta at the cursor's current tick.
    pub fn has_delta(&self) -> bool {
        self.overlay.last_modified() == self.current_time
    }

    /// Reset this leaf back to "never written" (spec §3.2 invariant 2; spec
    /// §4.4 "TS/Signal/Window (scalar): ... `invalidate()`"). Unlike every
    /// other mutator this does not bubble a modification up to the current
    /// tick - it is a reset, not a write - so a caller relying on a
    /// downstream node observing the invalidation this tick must pair it
    /// with its own `set_value`/`apply_delta`.
    pub fn invalidate(&mut self) {
        self.overlay.invalidate();
    }

    // ---- bundle / tuple ----

    pub fn set_field(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        let slot = self
            .value
            .as_bundle()
            .ok_or(Error::InvalidView)?
            .field_index(name)
            .ok_or_else(|| Error::OutOfRange(format!("no such field: {name}")))?;
        self.set_field_at(slot, value)
    }

    pub fn set_field_at(&mut self, slot: usize, value: Option<Value>) -> Result<()> {
        let time = self.current_time;
        let bundle = self.value.as_bundle_mut().ok_or(Error::InvalidView)?;
        bundle.set_at(slot, value)?;
        let child_value = bundle.at(slot)?;
        let fresh_overlay = match child_value {
            Some(v) => Overlay::new_for(v, time),
            None => Overlay {
                last_modified: time,
                kind: OverlayKind::Leaf,
            },
        };
        let (fields, modified) = self.overlay.kind_mut().as_bundle_mut().ok_or(Error::InvalidView)?;
        if let Some(slot_overlay) = fields.get_mut(slot) {
            *slot_overlay = fresh_overlay;
        }
        modified.record(time, slot);
        self.overlay.stamp(time);
        Ok(())
    }

    /// Mutate a bundle/tuple field in place through a nested cursor,
    /// bubbling the field's modification stamp up to this node if the
    /// closure actually wrote at `time` (spec §4.3 modification bubbling).
    pub fn with_field_mut<R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut TSViewMut) -> Result<R>,
    ) -> Result<R> {
        let slot = self
            .value
            .as_bundle()
            .ok_or(Error::InvalidView)?
            .field_index(name)
            .ok_or_else(|| Error::OutOfRange(format!("no such field: {name}")))?;
        self.with_bundle_slot_mut(slot, f)
    }

    fn with_bundle_slot_mut<R>(
        &mut self,
        slot: usize,
        f: impl FnOnce(&mut TSViewMut) -> Result<R>,
    ) -> Result<R> {
        let time = self.current_time;
        let child_value = self
            .value
            .as_bundle_mut()
            .ok_or(Error::InvalidView)?
            .fields
            .get_mut(slot)
            .ok_or_else(|| Error::OutOfRange(format!("field slot {slot}")))?
            .as_mut()
            .ok_or_else(|| Error::NotFound(format!("field slot {slot} is null")))?;
        let child_overlay = self
            .overlay
            .kind_mut()
            .as_bundle_mut()
            .ok_or(Error::InvalidView)?
            .0
            .get_mut(slot)
            .ok_or_else(|| Error::OutOfRange(format!("field slot {slot}")))?;

        let mut child_cursor = TSViewMut::new(child_value, child_overlay, time);
        let result = f(&mut child_cursor)?;
        let child_modified = child_cursor.overlay.last_modified() == time;
        drop(child_cursor);

        if child_modified {
            if let Some((_, modified)) = self.overlay.kind_mut().as_bundle_mut() {
                modified.record(time, slot);
            }
            self.overlay.stamp(time);
        }
        Ok(result)
    }

    // ---- list ----

    pub fn push(&mut self, value: Option<Value>) -> Result<usize> {
        let time = self.current_time;
        let list = self.value.as_list_mut().ok_or(Error::InvalidView)?;
        list.push(value)?;
        let slot = list.size() - 1;
        let fresh_overlay = match list.at(slot)? {
            Some(v) => Overlay::new_for(v, time),
            None => Overlay {
                last_modified: time,
                kind: OverlayKind::Leaf,
            },
        };
        let (elements, _, added, _) = self.overlay.kind_mut().as_list_mut().ok_or(Error::InvalidView)?;
        elements.push(fresh_overlay);
        added.record(time, slot);
        self.overlay.stamp(time);
        Ok(slot)
    }

    pub fn set_at(&mut self, index: usize, value: Option<Value>) -> Result<()> {
        let time = self.current_time;
        let list = self.value.as_list_mut().ok_or(Error::InvalidView)?;
        list.set_at(index, value)?;
        let fresh_overlay = match list.at(index)? {
            Some(v) => Overlay::new_for(v, time),
            None => Overlay {
                last_modified: time,
                kind: OverlayKind::Leaf,
            },
        };
        let (elements, modified, _, _) = self.overlay.kind_mut().as_list_mut().ok_or(Error::InvalidView)?;
        if let Some(slot_overlay) = elements.get_mut(index) {
            *slot_overlay = fresh_overlay;
        }
        modified.record(time, index);
        self.overlay.stamp(time);
        Ok(())
    }

    pub fn with_element_mut<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut TSViewMut) -> Result<R>,
    ) -> Result<R> {
        let time = self.current_time;
        let child_value = self
            .value
            .as_list_mut()
            .ok_or(Error::InvalidView)?
            .elements
            .get_mut(index)
            .ok_or_else(|| Error::OutOfRange(format!("list index {index}")))?
            .as_mut()
            .ok_or_else(|| Error::NotFound(format!("list index {index} is null")))?;
        let child_overlay = self
            .overlay
            .kind_mut()
            .as_list_mut()
            .ok_or(Error::InvalidView)?
            .0
            .get_mut(index)
            .ok_or_else(|| Error::OutOfRange(format!("list index {index}")))?;

        let mut child_cursor = TSViewMut::new(child_value, child_overlay, time);
        let result = f(&mut child_cursor)?;
        let child_modified = child_cursor.overlay.last_modified() == time;
        drop(child_cursor);

        if child_modified {
            if let Some((_, modified, _, _)) = self.overlay.kind_mut().as_list_mut() {
                modified.record(time, index);
            }
            self.overlay.stamp(time);
        }
        Ok(result)
    }

    /// Empty a dynamic list (spec §4.1 list `clear`). Every previously-live
    /// index is recorded as removed at the cursor's tick.
    pub fn list_clear(&mut self) -> Result<()> {
        let time = self.current_time;
        let removed_indices: Vec<usize> = {
            let list = self.value.as_list().ok_or(Error::InvalidView)?;
            (0..list.size()).filter(|&i| list.is_valid(i)).collect()
        };
        self.value.as_list_mut().ok_or(Error::InvalidView)?.clear()?;
        let (elements, _, _, removed) = self.overlay.kind_mut().as_list_mut().ok_or(Error::InvalidView)?;
        elements.clear();
        for i in removed_indices {
            removed.record(time, i);
        }
        self.overlay.stamp(time);
        Ok(())
    }

    // ---- set ----

    pub fn set_add(&mut self, v: Value) -> Result<usize> {
        let time = self.current_time;
        let set = self.value.as_set_mut().ok_or(Error::InvalidView)?;
        let was_new = !set.contains(&v);
        let delta_value = v.clone();
        let slot = set.add(v)?;
        if was_new {
            let (elements, added, _) = self.overlay.kind_mut().as_set_mut().ok_or(Error::InvalidView)?;
            elements.insert(slot, Overlay { last_modified: time, kind: OverlayKind::Leaf });
            added.record(time, delta_value);
            self.overlay.stamp(time);
        }
        Ok(slot)
    }

    pub fn set_remove(&mut self, v: &Value) -> Result<bool> {
        let time = self.current_time;
        let set = self.value.as_set_mut().ok_or(Error::InvalidView)?;
        match set.remove(v) {
            Some(slot) => {
                let (elements, _, removed) = self.overlay.kind_mut().as_set_mut().ok_or(Error::InvalidView)?;
                elements.remove(&slot);
                removed.record(time, v.clone());
                self.overlay.stamp(time);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Empty a set (spec §4.1 set `clear`). Every previously-live value is
    /// recorded as removed at the cursor's tick.
    pub fn set_clear(&mut self) -> Result<()> {
        let time = self.current_time;
        let removed_values: Vec<Value> = self.value.as_set().ok_or(Error::InvalidView)?.iter().cloned().collect();
        self.value.as_set_mut().ok_or(Error::InvalidView)?.clear();
        let (elements, _, removed) = self.overlay.kind_mut().as_set_mut().ok_or(Error::InvalidView)?;
        elements.clear();
        for v in removed_values {
            removed.record(time, v);
        }
        self.overlay.stamp(time);
        Ok(())
    }

    // ---- map ----

    pub fn map_set_item(&mut self, key: Value, value: Option<Value>) -> Result<usize> {
        let time = self.current_time;
        let map = self.value.as_map_mut().ok_or(Error::InvalidView)?;
        let was_new = !map.contains(&key);
        let delta_key = key.clone();
        let slot = map.set_item(key, value)?;
        let fresh_overlay = match map.values[slot].as_ref() {
            Some(v) => Overlay::new_for(v, time),
            None => Overlay {
                last_modified: time,
                kind: OverlayKind::Leaf,
            },
        };
        let (elements, added, _, modified) = self.overlay.kind_mut().as_map_mut().ok_or(Error::InvalidView)?;
        elements.insert(slot, fresh_overlay);
        if was_new {
            added.record(time, delta_key);
        } else {
            modified.record(time, slot);
        }
        self.overlay.stamp(time);
        Ok(slot)
    }

    pub fn map_remove(&mut self, key: &Value) -> Result<Option<Value>> {
        let time = self.current_time;
        let map = self.value.as_map_mut().ok_or(Error::InvalidView)?;
        let removed_slot = map.keys.slot_of(key);
        let old = map.remove(key);
        if let Some(slot) = removed_slot {
            let (elements, _, removed, _) = self.overlay.kind_mut().as_map_mut().ok_or(Error::InvalidView)?;
            elements.remove(&slot);
            removed.record(time, key.clone());
            self.overlay.stamp(time);
        }
        Ok(old)
    }

    /// Empty a map (spec §4.1 map `clear`). Every previously-live key is
    /// recorded as removed at the cursor's tick.
    pub fn map_clear(&mut self) -> Result<()> {
        let time = self.current_time;
        let removed_keys: Vec<Value> = self.value.as_map().ok_or(Error::InvalidView)?.keys().cloned().collect();
        self.value.as_map_mut().ok_or(Error::InvalidView)?.clear();
        let (elements, _, removed, _) = self.overlay.kind_mut().as_map_mut().ok_or(Error::InvalidView)?;
        elements.clear();
        for k in removed_keys {
            removed.record(time, k);
        }
        self.overlay.stamp(time);
        Ok(())
    }

    // ---- cyclic buffer (window) / queue ----

    pub fn window_push(&mut self, value: Value) -> Result<()> {
        let time = self.current_time;
        let cb = match &mut self.value {
            Value::CyclicBuffer(c) => c,
            _ => return Err(Error::InvalidView),
        };
        let next_slot = cb.length();
        let evicted = cb.push(value)?;
        let (times, pushed, evicted_log) = self.overlay.kind_mut().as_cyclic_buffer_mut().ok_or(Error::InvalidView)?;
        if let Some(evicted_value) = evicted {
            times.pop_front();
            evicted_log.record(time, evicted_value);
        }
        times.push_back(time);
        pushed.record(time, next_slot);
        self.overlay.stamp(time);
        Ok(())
    }

    /// Empty a window (spec §4.1 cyclic_buffer `clear`). Every sample still
    /// retained is logged as evicted at the cursor's tick, same as a normal
    /// push-driven eviction.
    pub fn window_clear(&mut self) -> Result<()> {
        let time = self.current_time;
        let cb = match &mut self.value {
            Value::CyclicBuffer(c) => c,
            _ => return Err(Error::InvalidView),
        };
        let drained: Vec<Value> = cb.iter().cloned().collect();
        cb.clear();
        let (times, _, evicted_log) = self.overlay.kind_mut().as_cyclic_buffer_mut().ok_or(Error::InvalidView)?;
        times.clear();
        for v in drained {
            evicted_log.record(time, v);
        }
        self.overlay.stamp(time);
        Ok(())
    }

    pub fn queue_push(&mut self, value: Value) -> Result<()> {
        let time = self.current_time;
        let queue = match &mut self.value {
            Value::Queue(q) => q,
            _ => return Err(Error::InvalidView),
        };
        let slot = queue.length();
        queue.push(value)?;
        let (pushed, _) = self.overlay.kind_mut().as_queue_mut().ok_or(Error::InvalidView)?;
        pushed.record(time, slot);
        self.overlay.stamp(time);
        Ok(())
    }

    pub fn queue_pop(&mut self) -> Result<Option<Value>> {
        let time = self.current_time;
        let queue = match &mut self.value {
            Value::Queue(q) => q,
            _ => return Err(Error::InvalidView),
        };
        let popped_value = queue.pop();
        if popped_value.is_some() {
            let (_, popped) = self.overlay.kind_mut().as_queue_mut().ok_or(Error::InvalidView)?;
            popped.record(time, 0);
            self.overlay.stamp(time);
        }
        Ok(popped_value)
    }

    /// Empty a queue (spec §4.1 queue `clear`). Recorded as a pop of every
    /// remaining entry at the cursor's tick, since a queue has no separate
    /// "removed" delta distinct from "popped".
    pub fn queue_clear(&mut self) -> Result<()> {
        let time = self.current_time;
        let queue = match &mut self.value {
            Value::Queue(q) => q,
            _ => return Err(Error::InvalidView),
        };
        let drained = queue.length();
        queue.clear();
        if drained > 0 {
            let (_, popped) = self.overlay.kind_mut().as_queue_mut().ok_or(Error::InvalidView)?;
            for i in 0..drained {
                popped.record(time, i);
            }
            self.overlay.stamp(time);
        }
        Ok(())
    }

    // ---- ref ----

    pub fn bind(&mut self, target: &Arc<RwLock<TsCellInner>>, path: crate::ts::path::StoredPath) -> Result<()> {
        let time = self.current_time;
        let storage = self.value.as_ref_storage_mut().ok_or(Error::InvalidView)?;
        storage.bind(target, path)?;
        if let Some(rebound) = self.overlay.kind_mut().as_ref_mut() {
            rebound.record(time, 0);
        }
        self.overlay.stamp(time);
        Ok(())
    }

    pub fn unbind(&mut self) -> Result<()> {
        let time = self.current_time;
        let storage = self.value.as_ref_storage_mut().ok_or(Error::InvalidView)?;
        storage.unbind();
        if let Some(rebound) = self.overlay.kind_mut().as_ref_mut() {
            rebound.record(time, 0);
        }
        self.overlay.stamp(time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::cell::{new_cell, TsCellHandle};
    use crate::ts::view::TSView;
    use crate::typemeta::{builtin, register_bundle, register_list};

    #[test]
    fn bundle_modification_bubbles_to_parent() {
        let inner_schema = register_bundle("VMInner", vec![("x", builtin::i64_type())]);
        let outer_schema = register_bundle("VMOuter", vec![("inner", inner_schema.clone())]);
        let cell = new_cell(&outer_schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor
                .set_field("inner", Some(Value::new(&inner_schema)))
                .unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            let mut cursor = guard.cursor();
            cursor
                .with_field_mut("inner", |inner| inner.set_field("x", Some(Value::from_i64(5))))
                .unwrap();
        }
        let guard = cell.read_at(2);
        let view: TSView = guard.cursor();
        assert!(view.modified());
        let inner_view = view.field("inner").unwrap();
        assert!(inner_view.modified());
        assert_eq!(inner_view.field("x").unwrap().as_i64(), Some(5));
    }

    #[test]
    fn list_push_records_added_delta_at_current_tick() {
        let schema = register_list(builtin::i64_type(), 0);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.push(Some(Value::from_i64(10))).unwrap();
            cursor.push(Some(Value::from_i64(20))).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.list_len(), 2);
        assert_eq!(view.element(1).unwrap().as_i64(), Some(20));
    }

    #[test]
    fn window_push_tracks_first_modified_time_and_evicted_value() {
        use crate::typemeta::register_cyclic_buffer;

        let schema = register_cyclic_buffer(builtin::i64_type(), 3);
        let cell = new_cell(&schema, 0);
        for (tick, sample) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
            let mut guard = cell.write_at(tick).unwrap();
            let mut cursor = guard.cursor();
            cursor.window_push(Value::from_i64(sample)).unwrap();
        }
        let guard = cell.read_at(4);
        let view = guard.cursor();
        assert_eq!(view.window_value().and_then(|v| v.as_i64()), Some(40));
        assert_eq!(view.window_first_modified_time(), Some(2));
        assert!(view.has_removed_value());
        assert_eq!(view.removed_value().and_then(|v| v.as_i64()), Some(10));
    }

    #[test]
    fn list_clear_records_removed_indices_and_empties_list() {
        let schema = register_list(builtin::i64_type(), 0);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.push(Some(Value::from_i64(1))).unwrap();
            cursor.push(Some(Value::from_i64(2))).unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            guard.cursor().list_clear().unwrap();
        }
        let guard = cell.read_at(2);
        let view = guard.cursor();
        assert_eq!(view.list_len(), 0);
        assert!(view.modified());
        assert_eq!(view.list_removed().len(), 2);
    }

    #[test]
    fn set_clear_records_all_removed_values() {
        use crate::typemeta::register_set;

        let schema = register_set(builtin::i64_type());
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_add(Value::from_i64(7)).unwrap();
            cursor.set_add(Value::from_i64(8)).unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            guard.cursor().set_clear().unwrap();
        }
        let guard = cell.read_at(2);
        let view = guard.cursor();
        assert_eq!(view.set_size(), 0);
        assert!(view.modified());
        let removed = view.set_removed();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().any(|v| v.as_i64() == Some(7)));
        assert!(removed.iter().any(|v| v.as_i64() == Some(8)));
    }

    #[test]
    fn map_clear_records_all_removed_keys() {
        use crate::typemeta::register_map;

        let schema = register_map(builtin::i64_type(), builtin::i64_type());
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.map_set_item(Value::from_i64(1), Some(Value::from_i64(100))).unwrap();
            cursor.map_set_item(Value::from_i64(2), Some(Value::from_i64(200))).unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            guard.cursor().map_clear().unwrap();
        }
        let guard = cell.read_at(2);
        let view = guard.cursor();
        assert_eq!(view.map_size(), 0);
        assert!(view.modified());
        let removed = view.map_removed();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().any(|k| k.as_i64() == Some(1)));
        assert!(removed.iter().any(|k| k.as_i64() == Some(2)));
    }

    #[test]
    fn window_clear_logs_every_retained_sample_as_evicted() {
        use crate::typemeta::register_cyclic_buffer;

        let schema = register_cyclic_buffer(builtin::i64_type(), 3);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.window_push(Value::from_i64(10)).unwrap();
            cursor.window_push(Value::from_i64(20)).unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            guard.cursor().window_clear().unwrap();
        }
        let guard = cell.read_at(2);
        let view = guard.cursor();
        assert!(view.modified());
        assert!(view.window_value().is_none());
        assert_eq!(view.removed_value_count(), 2);
    }

    #[test]
    fn queue_clear_pops_everything_remaining() {
        use crate::typemeta::register_queue;

        let schema = register_queue(builtin::i64_type(), 0);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.queue_push(Value::from_i64(1)).unwrap();
            cursor.queue_push(Value::from_i64(2)).unwrap();
        }
        {
            let mut guard = cell.write_at(2).unwrap();
            guard.cursor().queue_clear().unwrap();
        }
        let guard = cell.read_at(2);
        let view = guard.cursor();
        assert!(view.modified());
        assert!(view.queue_popped_this_tick());
    }

    #[test]
    fn queue_clear_on_empty_queue_is_a_no_op() {
        use crate::typemeta::register_queue;

        let schema = register_queue(builtin::i64_type(), 0);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            guard.cursor().queue_clear().unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert!(!view.modified());
    }
}
