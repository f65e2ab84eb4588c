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

//! The owning time-series cell: a `Value` paired with its `Overlay`, shared
//! across graph nodes via `Arc<RwLock<_>>` so a REF can hold a non-owning
//! [`Weak`](std::sync::Weak) handle to it (spec §4.5, §5).

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::time::{EngineTime, MIN_TIME};
use crate::ts::meta::TsKind;
use crate::ts::overlay::Overlay;
use crate::ts::view::TSView;
use crate::ts::view_mut::TSViewMut;
use crate::typemeta::TypeMetaRef;
use crate::value::Value;

/// The guarded state behind one time-series cell.
pub struct TsCellInner {
    value: Value,
    overlay: Overlay,
    ts_kind: TsKind,
    /// The latest tick any write cursor was constructed for. Spec's Open
    /// Question on write-time discipline (SPEC_FULL.md §9) is resolved as a
    /// strict assert here: constructing a write cursor for a time earlier
    /// than one already observed is rejected outright, rather than silently
    /// accepted and left for individual field writes to catch.
    last_write_time: EngineTime,
}

impl TsCellInner {
    pub fn new(value: Value, overlay: Overlay) -> Self {
        let ts_kind = TsKind::for_schema(value.schema());
        Self::with_kind(value, overlay, ts_kind)
    }

    /// Build a cell tagged with an explicit [`TsKind`] rather than the one
    /// `TsKind::for_schema` would infer - the hook a node builder uses to
    /// mark a scalar-shaped cell as a one-shot SIGNAL instead of a plain TS
    /// (spec §3.1 `TSMeta.kind`: the TS shape is a property of how a node
    /// declares the cell, not something `TypeKind` alone determines).
    pub fn with_kind(value: Value, overlay: Overlay, ts_kind: TsKind) -> Self {
        TsCellInner {
            value,
            overlay,
            ts_kind,
            last_write_time: MIN_TIME,
        }
    }

    pub fn schema(&self) -> &TypeMetaRef {
        self.value.schema()
    }

    pub fn kind(&self) -> TsKind {
        self.ts_kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn last_modified(&self) -> EngineTime {
        self.overlay.last_modified()
    }
}

/// A shared, owning handle to a time-series cell (spec §4.6 `TsValue`).
pub type TsValue = Arc<RwLock<TsCellInner>>;

/// Construct a cell for `schema`, nothing yet written to it. `time` is the
/// construction tick, logged for diagnostics; it does not stamp the
/// overlay - per spec §3.2 invariant 2, a never-written leaf's
/// `last_modified` is `MIN_TIME` regardless of when the cell came into
/// being (see [`Overlay::new_unset`]).
pub fn new_cell(schema: &TypeMetaRef, time: EngineTime) -> TsValue {
    tracing::debug!(schema = schema.name(), time, "constructing cell");
    let value = Value::new(schema);
    let overlay = Overlay::new_unset(&value);
    Arc::new(RwLock::new(TsCellInner::new(value, overlay)))
}

/// Build a cell explicitly tagged as a SIGNAL (spec §4.3: "a one-shot
/// signal: valid only at the tick it was produced"). Must be backed by a
/// scalar schema - a signal is a TS whose node body treats every read as
/// stale unless `modified()` is also true this tick, not a distinct storage
/// shape.
pub fn new_signal_cell(schema: &TypeMetaRef, time: EngineTime) -> Result<TsValue> {
    if schema.as_scalar().is_none() {
        return Err(Error::InvalidView);
    }
    tracing::debug!(schema = schema.name(), time, "constructing signal cell");
    let value = Value::new(schema);
    let overlay = Overlay::new_unset(&value);
    Ok(Arc::new(RwLock::new(TsCellInner::with_kind(
        value,
        overlay,
        TsKind::Signal,
    ))))
}

/// A read-only cursor handle, borrowed for as long as the guard lives.
pub struct TsCellReadGuard<'a> {
    inner: parking_lot::RwLockReadGuard<'a, TsCellInner>,
    current_time: EngineTime,
    /// Set when this guard was obtained by dereferencing a REF that
    /// rebound at `current_time` (spec §4.5 "Sampling" / invariant 7): the
    /// resulting cursor must report `modified() == true` regardless of this
    /// cell's own overlay.
    forced_modified: bool,
}

impl<'a> TsCellReadGuard<'a> {
    pub fn cursor(&self) -> TSView<'_> {
        let view = TSView::new(&self.inner.value, &self.inner.overlay, self.current_time);
        if self.forced_modified {
            view.force_modified()
        } else {
            view
        }
    }
}

/// A write cursor handle. Dropping it leaves whatever the cursor's methods
/// already wrote in place - there is no separate "commit" step (spec §4.3:
/// mutation bubbling happens synchronously as each method runs).
pub struct TsCellWriteGuard<'a> {
    inner: parking_lot::RwLockWriteGuard<'a, TsCellInner>,
    current_time: EngineTime,
}

impl<'a> TsCellWriteGuard<'a> {
    pub fn cursor(&mut self) -> TSViewMut<'_> {
        TSViewMut::new(&mut self.inner.value, &mut self.inner.overlay, self.current_time)
    }
}

/// Cursor-construction entry points for a shared cell handle.
pub trait TsCellHandle {
    fn read_at(&self, time: EngineTime) -> TsCellReadGuard<'_>;

    /// Like `read_at`, but the resulting cursor's `modified()` is forced to
    /// `true` when `forced_modified` is set - the entry point a REF
    /// dereference samples its target through, composing the ref's own
    /// rebind stamp with the target's overlay (spec §4.5 "Sampling",
    /// invariant 7, property P7).
    fn read_at_forced(&self, time: EngineTime, forced_modified: bool) -> TsCellReadGuard<'_>;

    fn write_at(&self, time: EngineTime) -> Result<TsCellWriteGuard<'_>>;
}

impl TsCellHandle for TsValue {
    fn read_at(&self, time: EngineTime) -> TsCellReadGuard<'_> {
        self.read_at_forced(time, false)
    }

    fn read_at_forced(&self, time: EngineTime, forced_modified: bool) -> TsCellReadGuard<'_> {
        TsCellReadGuard {
            inner: self.read(),
            current_time: time,
            forced_modified,
        }
    }

    fn write_at(&self, time: EngineTime) -> Result<TsCellWriteGuard<'_>> {
        let mut inner = self.write();
        if time < inner.last_write_time {
            return Err(Error::NonMonotonicWrite {
                cursor_time: inner.last_write_time,
                attempted: time,
            });
        }
        inner.last_write_time = time;
        Ok(TsCellWriteGuard {
            inner,
            current_time: time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemeta::builtin;

    #[test]
    fn write_cursor_rejects_time_travel() {
        let cell = new_cell(&builtin::i64_type(), 0);
        {
            let _guard = cell.write_at(5).unwrap();
        }
        assert!(matches!(cell.write_at(3), Err(Error::NonMonotonicWrite { .. })));
        assert!(cell.write_at(5).is_ok());
    }

    #[test]
    fn fresh_cell_is_unset_regardless_of_construction_tick() {
        let cell = new_cell(&builtin::i64_type(), 7);
        let guard = cell.read_at(7);
        assert_eq!(guard.cursor().last_modified(), MIN_TIME);
        assert!(!guard.cursor().modified());
    }

    #[test]
    fn signal_cell_is_tagged_and_only_valid_on_its_own_tick() {
        let cell = new_signal_cell(&builtin::i64_type(), 0).unwrap();
        assert_eq!(cell.read().kind(), TsKind::Signal);
        {
            let mut guard = cell.write_at(3).unwrap();
            guard.cursor().set_value(Value::from_i64(9)).unwrap();
        }
        assert!(cell.read_at(3).cursor().signal_present());
        assert!(!cell.read_at(4).cursor().signal_present());
    }

    #[test]
    fn signal_cell_rejects_non_scalar_schema() {
        use crate::typemeta::register_list;
        let schema = register_list(builtin::i64_type(), 0);
        assert!(matches!(new_signal_cell(&schema, 0), Err(Error::InvalidView)));
    }
}
