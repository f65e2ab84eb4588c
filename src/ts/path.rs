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

//! The two path flavors spec §4.4/§9 distinguishes: [`LightweightPath`] for
//! live navigation during a single cursor's lifetime, and [`StoredPath`] for
//! anything that must survive being written down (a delta record, a ref
//! binding, a serialized cursor) past the container mutation that produced
//! it.
//!
//! A `LightweightPath` step is a resolved slot index - cheap to follow, but
//! meaningless once the container reshapes (a bundle field removed, a set
//! entry evicted and its slot reused). A `StoredPath` step is a field name
//! or a key value - self-describing, and safe to re-resolve against
//! whatever the container looks like later, at the cost of a lookup per
//! step.

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::host::HostValue;
use crate::value::Value;

/// One navigation step, already resolved to a slot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Bundle field or tuple element, by slot index.
    Field(usize),
    /// List/cyclic-buffer/queue element, by slot index.
    Index(usize),
    /// Set/map entry, by `KeySet` slot index.
    Slot(usize),
}

/// A cheap, cursor-lifetime-scoped path (spec §4.4 "lightweight path").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightweightPath(SmallVec<[PathStep; 4]>);

impl LightweightPath {
    pub fn root() -> Self {
        LightweightPath(SmallVec::new())
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn child(&self, step: PathStep) -> Self {
        let mut next = self.clone();
        next.0.push(step);
        next
    }

    pub fn child_field(&self, slot: usize) -> Self {
        self.child(PathStep::Field(slot))
    }

    pub fn child_index(&self, slot: usize) -> Self {
        self.child(PathStep::Index(slot))
    }

    pub fn child_slot(&self, slot: usize) -> Self {
        self.child(PathStep::Slot(slot))
    }
}

/// One navigation step in a form stable across container reshaping (spec
/// §4.4 "stored path"). Field names and key values round-trip through the
/// optional `serde` feature so a path can be persisted alongside a delta
/// record or a ref binding. A set/map key is carried as its host-object
/// projection rather than a schema-bound `Value` (which has no `Serialize`
/// impl of its own); re-resolving against a live container reconstructs the
/// typed key from the container's own key/element schema.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoredStep {
    Field(Box<str>),
    Index(usize),
    Key(HostValue),
}

/// A serializable path, independent of any live container's current slot
/// layout (spec §4.4 property P8: "a `StoredPath` round-trips through
/// serialization and re-resolves to the same logical location").
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredPath(Vec<StoredStep>);

impl StoredPath {
    pub fn root() -> Self {
        StoredPath(Vec::new())
    }

    pub fn steps(&self) -> &[StoredStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_field(&mut self, name: impl Into<Box<str>>) {
        self.0.push(StoredStep::Field(name.into()));
    }

    pub fn push_index(&mut self, i: usize) {
        self.0.push(StoredStep::Index(i));
    }

    pub fn push_key(&mut self, key: HostValue) {
        self.0.push(StoredStep::Key(key));
    }
}

/// Convert a resolved `LightweightPath` into a re-resolvable `StoredPath` by
/// walking `root` and recording the self-describing form of each step
/// (spec §4.4: "lightweight paths convert to stored paths by consulting the
/// schema/keys they were resolved against").
pub fn to_stored(path: &LightweightPath, root: &Value) -> Result<StoredPath> {
    let mut stored = StoredPath::root();
    let mut cursor = root;
    for step in path.steps() {
        match (step, cursor) {
            (PathStep::Field(slot), Value::Bundle(b)) => {
                let name = b
                    .schema()
                    .as_bundle()
                    .and_then(|fields| fields.get(*slot))
                    .map(|f| f.name.clone())
                    .ok_or_else(|| Error::OutOfRange(format!("bundle slot {slot}")))?;
                stored.push_field(name);
                cursor = b.at(*slot)?.ok_or(Error::NullNotAllowed("bundle field".into()))?;
            }
            (PathStep::Field(slot), Value::Tuple(t)) => {
                stored.push_index(*slot);
                cursor = t.at(*slot)?.ok_or(Error::NullNotAllowed("tuple element".into()))?;
            }
            (PathStep::Index(slot), Value::List(l)) => {
                stored.push_index(*slot);
                cursor = l.at(*slot)?.ok_or(Error::NullNotAllowed("list element".into()))?;
            }
            (PathStep::Index(slot), Value::CyclicBuffer(c)) => {
                stored.push_index(*slot);
                cursor = c.iter().nth(*slot).ok_or_else(|| Error::OutOfRange(format!("buffer index {slot}")))?;
            }
            (PathStep::Index(slot), Value::Queue(q)) => {
                stored.push_index(*slot);
                cursor = q.buf.get(*slot).ok_or_else(|| Error::OutOfRange(format!("queue index {slot}")))?;
            }
            (PathStep::Slot(slot), Value::Set(s)) => {
                let key = s.set.value_at(*slot).ok_or_else(|| Error::OutOfRange(format!("set slot {slot}")))?;
                stored.push_key(key.to_host_object());
                cursor = key;
            }
            (PathStep::Slot(slot), Value::Map(m)) => {
                let key = m.keys.value_at(*slot).ok_or_else(|| Error::OutOfRange(format!("map slot {slot}")))?;
                stored.push_key(key.to_host_object());
                cursor = m.values[*slot].as_ref().ok_or(Error::NullNotAllowed("map value".into()))?;
            }
            _ => return Err(Error::InvalidView),
        }
    }
    Ok(stored)
}

/// Re-resolve a `StoredPath` against the current shape of `root`, producing
/// the `LightweightPath` to use for this cursor's lifetime. Fails with
/// `NotFound` if a step no longer resolves (spec §4.4: "re-resolution is
/// the only operation allowed to fail on a path that previously existed").
pub fn from_stored(stored: &StoredPath, root: &Value) -> Result<LightweightPath> {
    let mut path = LightweightPath::root();
    let mut cursor = root;
    for step in stored.steps() {
        match (step, cursor) {
            (StoredStep::Field(name), Value::Bundle(b)) => {
                let slot = b
                    .field_index(name)
                    .ok_or_else(|| Error::NotFound(format!("field {name}")))?;
                path = path.child_field(slot);
                cursor = b.at(slot)?.ok_or_else(|| Error::NotFound(format!("field {name} is null")))?;
            }
            (StoredStep::Index(i), Value::Tuple(t)) => {
                path = path.child_field(*i);
                cursor = t.at(*i)?.ok_or_else(|| Error::NotFound(format!("tuple index {i}")))?;
            }
            (StoredStep::Index(i), Value::List(l)) => {
                path = path.child_index(*i);
                cursor = l.at(*i)?.ok_or_else(|| Error::NotFound(format!("list index {i}")))?;
            }
            (StoredStep::Index(i), Value::CyclicBuffer(c)) => {
                path = path.child_index(*i);
                cursor = c.iter().nth(*i).ok_or_else(|| Error::NotFound(format!("buffer index {i}")))?;
            }
            (StoredStep::Index(i), Value::Queue(q)) => {
                path = path.child_index(*i);
                cursor = q.buf.get(*i).ok_or_else(|| Error::NotFound(format!("queue index {i}")))?;
            }
            (StoredStep::Key(key), Value::Set(s)) => {
                let element_ty = match s.schema.kind() {
                    crate::typemeta::TypeKind::Set { element } => element,
                    _ => return Err(Error::InvalidView),
                };
                let probe = Value::from_host_object(element_ty, key)?;
                let slot = s.set.slot_of(&probe).ok_or_else(|| Error::NotFound("set key".into()))?;
                path = path.child_slot(slot);
                cursor = s.set.value_at(slot).ok_or_else(|| Error::NotFound("set key".into()))?;
            }
            (StoredStep::Key(key), Value::Map(m)) => {
                let key_ty = match m.schema.kind() {
                    crate::typemeta::TypeKind::Map { key, .. } => key,
                    _ => return Err(Error::InvalidView),
                };
                let probe = Value::from_host_object(key_ty, key)?;
                let slot = m.keys.slot_of(&probe).ok_or_else(|| Error::NotFound("map key".into()))?;
                path = path.child_slot(slot);
                cursor = m.values[slot].as_ref().ok_or_else(|| Error::NotFound("map value".into()))?;
            }
            _ => return Err(Error::NotFound("path step does not match current container shape".into())),
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemeta::{builtin, register_bundle, register_set};

    #[test]
    fn p9_stored_path_round_trips_through_bundle() {
        let schema = register_bundle("PathT1", vec![("a", builtin::i64_type()), ("b", builtin::f64_type())]);
        let mut root = Value::new(&schema);
        root.as_bundle_mut()
            .unwrap()
            .set_field("b", Some(Value::from_f64(2.0)))
            .unwrap();

        let lw = LightweightPath::root().child_field(1);
        let stored = to_stored(&lw, &root).unwrap();
        assert_eq!(stored.steps(), &[StoredStep::Field("b".into())]);

        let back = from_stored(&stored, &root).unwrap();
        assert_eq!(back, lw);
    }

    #[test]
    fn set_key_round_trips_through_host_projection() {
        let schema = register_set(builtin::i64_type());
        let mut root = Value::new(&schema);
        let slot = root.as_set_mut().unwrap().add(Value::from_i64(42)).unwrap();

        let lw = LightweightPath::root().child_slot(slot);
        let stored = to_stored(&lw, &root).unwrap();
        assert_eq!(stored.steps(), &[StoredStep::Key(HostValue::Int(42))]);

        let back = from_stored(&stored, &root).unwrap();
        assert_eq!(back, lw);
    }

    #[test]
    fn stale_field_name_fails_with_not_found() {
        let schema = register_bundle("PathT2", vec![("only", builtin::i64_type())]);
        let mut root = Value::new(&schema);
        root.as_bundle_mut().unwrap().set_field("only", Some(Value::from_i64(1))).unwrap();
        let mut stored = StoredPath::root();
        stored.push_field("missing");
        assert!(matches!(from_stored(&stored, &root), Err(Error::NotFound(_))));
    }
}
