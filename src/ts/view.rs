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

//! The read-only navigation cursor (spec §4.4 `TSView`). Built from a
//! shared borrow of a cell's `Value`/`Overlay` pair plus the tick the
//! caller is observing from, so every query answers "as of `current_time`"
//! without the caller having to thread a time parameter through by hand.

use crate::error::{Error, Result};
use crate::time::EngineTime;
use crate::ts::cell::{TsCellHandle, TsCellInner, TsCellReadGuard, TsValue};
use crate::ts::overlay::Overlay;
use crate::typemeta::TypeMetaRef;
use crate::value::Value;
use parking_lot::RwLock;
use std::sync::Arc;

/// A read-only cursor over one node of a `Value`/`Overlay` tree.
#[derive(Clone, Copy)]
pub struct TSView<'a> {
    value: &'a Value,
    overlay: &'a Overlay,
    current_time: EngineTime,
    forced_modified: bool,
}

impl<'a> TSView<'a> {
    pub fn new(value: &'a Value, overlay: &'a Overlay, current_time: EngineTime) -> Self {
        TSView {
            value,
            overlay,
            current_time,
            forced_modified: false,
        }
    }

    /// Mark this view unconditionally modified this tick - composes a REF's
    /// own rebind stamp with a view sampled through it (spec §4.5
    /// "Sampling"). Not part of the public navigation surface: callers reach
    /// this only via [`sample_ref`](TSView::sample_ref).
    pub(crate) fn force_modified(mut self) -> Self {
        self.forced_modified = true;
        self
    }

    pub fn schema(&self) -> &TypeMetaRef {
        self.value.schema()
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn current_time(&self) -> EngineTime {
        self.current_time
    }

    pub fn last_modified(&self) -> EngineTime {
        self.overlay.last_modified()
    }

    /// Whether this node itself (not necessarily a descendant) was written
    /// at the cursor's current tick, or this view was reached by
    /// dereferencing a REF that rebound this tick (spec §3.2 invariant 7:
    /// "observing through a retargeted ref samples modified=true for this
    /// tick" regardless of the target's own timestamp).
    pub fn modified(&self) -> bool {
        self.forced_modified || self.overlay.last_modified() == self.current_time
    }

    /// The scalar/window analogue of a composite's `delta_view(t)` (spec
    /// §4.4 "TS/Signal/Window (scalar): ... `has_delta()`"): whether this
    /// leaf carries a delta at the cursor's current tick.
    pub fn has_delta(&self) -> bool {
        self.modified()
    }

    /// For SIGNAL-kind cells: spec §4.6 "valid only at the tick it was
    /// produced" is exactly `modified()` under another name at the call
    /// site - kept separate so node bodies reading a signal don't have to
    /// know that detail.
    pub fn signal_present(&self) -> bool {
        self.modified()
    }

    // ---- scalar ----

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    // ---- bundle ----

    pub fn field(&self, name: &str) -> Result<TSView<'a>> {
        let bundle = self.value.as_bundle().ok_or(Error::InvalidView)?;
        let slot = bundle
            .field_index(name)
            .ok_or_else(|| Error::OutOfRange(format!("no such field: {name}")))?;
        self.field_at(slot)
    }

    pub fn field_at(&self, slot: usize) -> Result<TSView<'a>> {
        let bundle = self.value.as_bundle().ok_or(Error::InvalidView)?;
        let child_value = bundle
            .at(slot)?
            .ok_or_else(|| Error::NotFound(format!("field slot {slot} is null")))?;
        let (fields, _) = self.overlay.kind().as_bundle().ok_or(Error::InvalidView)?;
        let child_overlay = fields.get(slot).ok_or_else(|| Error::OutOfRange(format!("field slot {slot}")))?;
        Ok(TSView::new(child_value, child_overlay, self.current_time))
    }

    /// The AND of `ts_valid()` over all children, for any composite shape
    /// (spec §4.2: "`all_valid()` on a composite is the AND of `ts_valid()`
    /// over all children").
    pub fn all_valid(&self) -> bool {
        if let Some(b) = self.value.as_bundle() {
            return b.all_valid();
        }
        if let Some(t) = self.value.as_tuple() {
            return (0..t.len()).all(|i| t.at(i).map(|v| v.is_some()).unwrap_or(false));
        }
        if let Some(l) = self.value.as_list() {
            return (0..l.size()).all(|i| l.is_valid(i));
        }
        if let Some(m) = self.value.as_map() {
            return m.iter_slots().all(|(_, _, v)| v.is_some());
        }
        true
    }

    /// The number of fields in a TSB (spec §4.4's explicit `field_count`).
    pub fn field_count(&self) -> usize {
        self.value.as_bundle().map(|b| b.len()).unwrap_or(0)
    }

    /// The bundle field slots written at the current tick (spec §4.3
    /// "per-field modified set").
    pub fn modified_fields(&self) -> &'a [usize] {
        match self.overlay.kind().as_bundle() {
            Some((_, modified)) => modified.at(self.current_time),
            None => &[],
        }
    }

    /// A TSB's field names, in declaration order (spec §4.4 `keys()`).
    pub fn field_names(&self) -> impl Iterator<Item = &'a str> {
        self.value
            .as_bundle()
            .and_then(|b| b.schema().as_bundle())
            .into_iter()
            .flatten()
            .map(|f| &*f.name)
    }

    /// `(name, child view)` for every field, regardless of validity (spec
    /// §4.4 `items()`).
    pub fn field_items(&self) -> impl Iterator<Item = (&'a str, TSView<'a>)> + '_ {
        (0..self.field_count()).filter_map(move |i| {
            let name = self.value.as_bundle()?.schema().as_bundle()?.get(i)?.name.as_ref();
            Some((name, self.field_at(i).ok()?))
        })
    }

    /// The field slots currently holding a value (spec §4.4 `valid_keys` for
    /// a TSB, restricted to the indices `all_valid`'s per-slot check passes).
    pub fn valid_field_indices(&self) -> Vec<usize> {
        match self.value.as_bundle() {
            Some(b) => (0..b.len()).filter(|&i| b.is_valid(i)).collect(),
            None => Vec::new(),
        }
    }

    /// The names of the fields currently holding a value (spec §4.4 TSB
    /// `valid_keys`).
    pub fn valid_field_names(&self) -> Vec<&'a str> {
        self.valid_field_indices()
            .into_iter()
            .filter_map(|i| self.field_names().nth(i))
            .collect()
    }

    /// A child view for every field, regardless of validity (spec §4.4 TSB
    /// `values()`, the sibling of `keys()`/`items()`).
    pub fn field_views(&self) -> Vec<TSView<'a>> {
        (0..self.field_count()).filter_map(|i| self.field_at(i).ok()).collect()
    }

    /// A child view for every field currently holding a value (spec §4.4 TSB
    /// `valid_values`).
    pub fn valid_field_views(&self) -> Vec<TSView<'a>> {
        self.valid_field_indices()
            .into_iter()
            .filter_map(|i| self.field_at(i).ok())
            .collect()
    }

    // ---- list ----

    pub fn list_len(&self) -> usize {
        self.value.as_list().map(|l| l.size()).unwrap_or(0)
    }

    /// The list indices currently holding a value (spec §4.4 TSL
    /// `valid_indices`).
    pub fn valid_indices(&self) -> Vec<usize> {
        match self.value.as_list() {
            Some(l) => (0..l.size()).filter(|&i| l.is_valid(i)).collect(),
            None => Vec::new(),
        }
    }

    /// `(index, child view)` for every currently-valid element (spec §4.4
    /// TSL `valid_items`).
    pub fn valid_items(&self) -> Vec<(usize, TSView<'a>)> {
        self.valid_indices()
            .into_iter()
            .filter_map(|i| self.element(i).ok().map(|v| (i, v)))
            .collect()
    }

    /// A child view for every currently-valid element, without its index
    /// (spec §4.4 TSL `valid_values`).
    pub fn valid_values(&self) -> Vec<TSView<'a>> {
        self.valid_items().into_iter().map(|(_, v)| v).collect()
    }

    pub fn element(&self, index: usize) -> Result<TSView<'a>> {
        let list = self.value.as_list().ok_or(Error::InvalidView)?;
        let child_value = list
            .at(index)?
            .ok_or_else(|| Error::NotFound(format!("list index {index} is null")))?;
        let (elements, _, _, _) = match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::List {
                elements,
                modified,
                added,
                removed,
            } => (elements, modified, added, removed),
            _ => return Err(Error::InvalidView),
        };
        let child_overlay = elements
            .get(index)
            .ok_or_else(|| Error::OutOfRange(format!("list index {index}")))?;
        Ok(TSView::new(child_value, child_overlay, self.current_time))
    }

    // ---- set / map ----

    pub fn set_contains(&self, key: &Value) -> bool {
        self.value.as_set().map(|s| s.contains(key)).unwrap_or(false)
    }

    /// A TSS's live element count (spec §4.4 TSS `size`).
    pub fn set_size(&self) -> usize {
        self.value.as_set().map(|s| s.size()).unwrap_or(0)
    }

    /// A TSS's current elements, in slot order (spec §4.4 doesn't name this
    /// explicitly but `was_added`/`was_removed` presuppose an iterable
    /// current membership - mirrors `KeySet::iter`).
    pub fn set_values(&self) -> impl Iterator<Item = &'a Value> {
        self.value.as_set().into_iter().flat_map(|s| s.iter())
    }

    /// A TSD's live key count (spec §4.4 TSD `size`).
    pub fn map_size(&self) -> usize {
        self.value.as_map().map(|m| m.size()).unwrap_or(0)
    }

    pub fn map_contains(&self, key: &Value) -> bool {
        self.value.as_map().map(|m| m.contains(key)).unwrap_or(false)
    }

    /// A TSD's current keys, in slot order (spec §4.4 TSD `keys()`).
    pub fn map_keys(&self) -> impl Iterator<Item = &'a Value> {
        self.value.as_map().into_iter().flat_map(|m| m.keys())
    }

    /// `(key, value-or-None)` for every entry, regardless of whether the
    /// value side has been set yet (spec §4.1 map "deferred-value
    /// semantics"; spec §4.4 TSD `items()`).
    pub fn map_items(&self) -> impl Iterator<Item = (&'a Value, Option<&'a Value>)> {
        self.value
            .as_map()
            .into_iter()
            .flat_map(|m| m.iter_slots().map(|(_, k, v)| (k, v)))
    }

    /// `(key, child view)` restricted to entries that currently hold a value
    /// (spec §4.4 TSD `valid_items`).
    pub fn map_valid_items(&self) -> Vec<(&'a Value, TSView<'a>)> {
        self.map_keys().filter_map(|k| self.map_get(k).map(|v| (k, v))).collect()
    }

    /// The keys whose value side currently holds something (spec §4.4 TSD
    /// `valid_keys`).
    pub fn map_valid_keys(&self) -> Vec<&'a Value> {
        self.map_valid_items().into_iter().map(|(k, _)| k).collect()
    }

    /// A child view for every key currently holding a value (spec §4.4 TSD
    /// `valid_values`).
    pub fn map_valid_values(&self) -> Vec<TSView<'a>> {
        self.map_valid_items().into_iter().map(|(_, v)| v).collect()
    }

    pub fn map_get(&self, key: &Value) -> Option<TSView<'a>> {
        let map = self.value.as_map()?;
        let (slot, _, child_value) = map.iter_slots().find(|(_, k, _)| *k == key)?;
        let child_value = child_value?;
        let elements = match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Map { elements, .. } => elements,
            _ => return None,
        };
        let child_overlay = elements.get(&slot)?;
        Some(TSView::new(child_value, child_overlay, self.current_time))
    }

    // ---- ref ----

    /// Resolve a `Ref`-kind cell's bound target. The caller is handed the
    /// target's owning handle back, not a `TSView` into it, since the
    /// target lives behind its own lock independent of this cursor's
    /// borrow (spec §4.5 "transparent dereferencing").
    pub fn deref_ref(&self) -> Result<Arc<RwLock<TsCellInner>>> {
        let storage = self.value.as_ref_storage().ok_or(Error::InvalidView)?;
        storage.as_bound().ok_or(Error::RefUnresolved)?.upgrade()
    }

    pub fn ref_is_bound(&self) -> bool {
        self.value.as_ref_storage().map(|s| s.is_bound()).unwrap_or(false)
    }

    /// Build a read cursor into `target` - the cell [`deref_ref`](Self::deref_ref)
    /// resolved to - at this cursor's current tick, composing this REF's own
    /// rebind stamp with the target's overlay: if the ref rebound this tick,
    /// the returned view reports `modified() == true` even though `target`'s
    /// own contents may have last changed earlier (spec §3.2 invariant 7,
    /// §4.5 "Sampling", property P7).
    pub fn sample_ref<'t>(&self, target: &'t TsValue) -> TsCellReadGuard<'t> {
        target.read_at_forced(self.current_time, self.ref_rebound_this_tick())
    }

    // ---- delta views (spec §4.3: "what changed, at what time") ----

    pub fn list_added(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::List { added, .. } => added.at(self.current_time),
            _ => &[],
        }
    }

    pub fn list_modified(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::List { modified, .. } => modified.at(self.current_time),
            _ => &[],
        }
    }

    /// Indices dropped from a dynamic list at the cursor's current tick,
    /// either via `resize` shrinking it or `clear`.
    pub fn list_removed(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::List { removed, .. } => removed.at(self.current_time),
            _ => &[],
        }
    }

    pub fn set_added(&self) -> &'a [Value] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Set { added, .. } => added.at(self.current_time),
            _ => &[],
        }
    }

    pub fn set_removed(&self) -> &'a [Value] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Set { removed, .. } => removed.at(self.current_time),
            _ => &[],
        }
    }

    pub fn map_added(&self) -> &'a [Value] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Map { added, .. } => added.at(self.current_time),
            _ => &[],
        }
    }

    pub fn map_removed(&self) -> &'a [Value] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Map { removed, .. } => removed.at(self.current_time),
            _ => &[],
        }
    }

    pub fn map_modified(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Map { modified, .. } => modified.at(self.current_time),
            _ => &[],
        }
    }

    /// Whether `key` was added to this TSD at the cursor's current tick
    /// (spec §4.4 TSD `was_added(key, t)`).
    pub fn map_was_added(&self, key: &Value) -> bool {
        self.map_added().iter().any(|v| v == key)
    }

    /// Whether `key` was removed from this TSD at the cursor's current tick
    /// (spec §4.4 TSD `was_removed(key, t)`).
    pub fn map_was_removed(&self, key: &Value) -> bool {
        self.map_removed().iter().any(|v| v == key)
    }

    /// Whether `value` was added to this TSS at the cursor's current tick
    /// (spec §4.4 TSS `was_added/was_removed`).
    pub fn set_was_added(&self, value: &Value) -> bool {
        self.set_added().iter().any(|v| v == value)
    }

    pub fn set_was_removed(&self, value: &Value) -> bool {
        self.set_removed().iter().any(|v| v == value)
    }

    /// A SetView-shaped handle over this TSD's current keys (spec §4.4 TSD
    /// `key_set_view()`). Since a map's key set doesn't carry its own
    /// overlay node, the returned cursor aliases this one: its scalar/set
    /// queries read through to the same underlying `Value`/`Overlay` pair.
    pub fn key_set_view(&self) -> TSView<'a> {
        *self
    }

    pub fn window_pushed(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::CyclicBuffer { pushed, .. } => pushed.at(self.current_time),
            _ => &[],
        }
    }

    pub fn window_evicted_this_tick(&self) -> bool {
        self.has_removed_value()
    }

    // ---- window (TSW) ----

    /// The time of the oldest sample still retained in the window (spec
    /// §4.6 `first_modified_time()`).
    pub fn window_first_modified_time(&self) -> Option<EngineTime> {
        self.overlay.kind().as_cyclic_buffer()?.0.front().copied()
    }

    /// The current newest sample in the window, if any.
    pub fn window_value(&self) -> Option<&'a Value> {
        self.value.as_cyclic_buffer()?.newest()
    }

    pub fn has_removed_value(&self) -> bool {
        !self.removed_values().is_empty()
    }

    /// The samples evicted from this window at the cursor's current tick,
    /// oldest first (spec §4.6 "removed-value buffer for this tick").
    pub fn removed_values(&self) -> &'a [Value] {
        match self.overlay.kind().as_cyclic_buffer() {
            Some((_, _, evicted)) => evicted.at(self.current_time),
            None => &[],
        }
    }

    /// The single sample evicted at the current tick, if exactly one
    /// eviction happened (spec scenario 6: capacity-1-per-push windows).
    pub fn removed_value(&self) -> Option<&'a Value> {
        self.removed_values().first()
    }

    pub fn removed_value_count(&self) -> usize {
        self.removed_values().len()
    }

    pub fn queue_pushed(&self) -> &'a [usize] {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Queue { pushed, .. } => pushed.at(self.current_time),
            _ => &[],
        }
    }

    pub fn queue_popped_this_tick(&self) -> bool {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Queue { popped, .. } => !popped.at(self.current_time).is_empty(),
            _ => false,
        }
    }

    pub fn ref_rebound_this_tick(&self) -> bool {
        match self.overlay.kind() {
            crate::ts::overlay::OverlayKind::Ref { rebound } => !rebound.at(self.current_time).is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::cell::{new_cell, TsCellHandle};
    use crate::ts::overlay::Overlay;
    use crate::typemeta::{builtin, register_bundle};
    use crate::value::Value;

    #[test]
    fn field_navigation_reports_modified_at_current_tick() {
        let schema = register_bundle("ViewT1", vec![("a", builtin::i64_type())]);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(3).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_field("a", Some(Value::from_i64(9))).unwrap();
        }
        let guard = cell.read_at(3);
        let view = guard.cursor();
        let field = view.field("a").unwrap();
        assert_eq!(field.as_i64(), Some(9));
        assert!(field.modified());
        assert!(view.modified());
    }

    #[test]
    fn field_read_at_different_tick_not_modified() {
        let schema = register_bundle("ViewT2", vec![("a", builtin::i64_type())]);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(3).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_field("a", Some(Value::from_i64(9))).unwrap();
        }
        let guard = cell.read_at(4);
        let view = guard.cursor();
        assert!(!view.modified());
        assert!(!view.field("a").unwrap().modified());
    }

    #[test]
    fn all_valid_is_false_until_every_field_is_set() {
        let schema = register_bundle("ViewT3", vec![("a", builtin::i64_type()), ("b", builtin::i64_type())]);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_field("a", Some(Value::from_i64(1))).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.field_count(), 2);
        assert!(!view.all_valid());
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_field("b", Some(Value::from_i64(2))).unwrap();
        }
        let guard = cell.read_at(1);
        assert!(guard.cursor().all_valid());
    }

    #[test]
    fn bundle_key_and_item_accessors_match_declared_fields() {
        let schema = register_bundle("ViewT4", vec![("a", builtin::i64_type()), ("b", builtin::i64_type())]);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_field("a", Some(Value::from_i64(1))).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(view.valid_field_indices(), vec![0]);
        let items: Vec<_> = view.field_items().map(|(name, v)| (name, v.as_i64())).collect();
        assert_eq!(items, vec![("a", Some(1)), ("b", None)]);
    }

    #[test]
    fn list_valid_indices_and_items_reflect_sparse_slots() {
        use crate::typemeta::register_list;

        let schema = register_list(builtin::i64_type(), 0);
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.push(Some(Value::from_i64(10))).unwrap();
            cursor.push(None).unwrap();
            cursor.push(Some(Value::from_i64(30))).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.valid_indices(), vec![0, 2]);
        let items: Vec<_> = view.valid_items().into_iter().map(|(i, v)| (i, v.as_i64())).collect();
        assert_eq!(items, vec![(0, Some(10)), (2, Some(30))]);
    }

    #[test]
    fn set_size_and_values_reflect_current_membership() {
        use crate::typemeta::register_set;

        let schema = register_set(builtin::i64_type());
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.set_add(Value::from_i64(1)).unwrap();
            cursor.set_add(Value::from_i64(2)).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.set_size(), 2);
        let values: Vec<_> = view.set_values().filter_map(|v| v.as_i64()).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn map_accessors_cover_keys_items_and_contains() {
        use crate::typemeta::register_map;

        let schema = register_map(builtin::i64_type(), builtin::i64_type());
        let cell = new_cell(&schema, 0);
        {
            let mut guard = cell.write_at(1).unwrap();
            let mut cursor = guard.cursor();
            cursor.map_set_item(Value::from_i64(1), Some(Value::from_i64(100))).unwrap();
            cursor.map_set_item(Value::from_i64(2), None).unwrap();
        }
        let guard = cell.read_at(1);
        let view = guard.cursor();
        assert_eq!(view.map_size(), 2);
        assert!(view.map_contains(&Value::from_i64(1)));
        assert!(!view.map_contains(&Value::from_i64(99)));
        let keys: Vec<_> = view.map_keys().filter_map(|k| k.as_i64()).collect();
        assert_eq!(keys, vec![1, 2]);
        let items: Vec<_> = view
            .map_items()
            .map(|(k, v)| (k.as_i64(), v.and_then(|v| v.as_i64())))
            .collect();
        assert_eq!(items, vec![(Some(1), Some(100)), (Some(2), None)]);
        let valid: Vec<_> = view
            .map_valid_items()
            .into_iter()
            .map(|(k, v)| (k.as_i64(), v.as_i64()))
            .collect();
        assert_eq!(valid, vec![(Some(1), Some(100))]);
    }
}
