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

//! `REF` indirection storage (spec §4.5).
//!
//! Spec §4.5 describes a REF as holding a raw, non-owning pointer to
//! another node's cell, with the owning node responsible for not outliving
//! its target. That contract is UB-shaped in Rust; `ValueRef` renders it as
//! a [`std::sync::Weak`] handle instead; a dangling target turns into a
//! catchable [`Error::RefUnresolved`] at dereference time rather than a
//! crash (see SPEC_FULL.md §3).

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::ts::cell::TsCellInner;
use crate::ts::path::StoredPath;

/// A single bound reference: a weak handle to the target cell plus the
/// path within it the ref was bound to (spec §4.5 "ref + path pair").
#[derive(Clone)]
pub struct ValueRef {
    target: Weak<RwLock<TsCellInner>>,
    path: StoredPath,
}

impl ValueRef {
    pub fn new(target: &Arc<RwLock<TsCellInner>>, path: StoredPath) -> Self {
        ValueRef {
            target: Arc::downgrade(target),
            path,
        }
    }

    pub fn path(&self) -> &StoredPath {
        &self.path
    }

    /// Upgrade to a strong handle, or `RefUnresolved` if the target has
    /// been dropped (spec §4.5 "dereferencing a stale ref is an error").
    pub fn upgrade(&self) -> Result<Arc<RwLock<TsCellInner>>> {
        self.target.upgrade().ok_or(Error::RefUnresolved)
    }

    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl std::fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueRef")
            .field("path", &self.path)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Pointer-identity equality (spec §4.5: "two refs compare equal iff they
/// target the same cell through the same path"). Two refs whose target has
/// both expired compare equal only if their paths also match - neither
/// resolves to anything, so path is all that is left to compare.
impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.target, &other.target) && self.path == other.path
    }
}
impl Eq for ValueRef {}

/// Hashes only the target pointer. `StoredPath` carries a `HostValue`
/// payload (via set/map keys) that has no `Hash` impl of its own - fine for
/// `Hash`, since `Eq` only needs equal values to hash equal, not every
/// field compared by `Eq` to be folded in.
impl std::hash::Hash for ValueRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.target.as_ptr().hash(state);
    }
}

/// The storage shape behind a `Ref`-kind `Value` (spec §4.5). A composite
/// ref (over a bundle/tuple/list of targets) is represented as one
/// `RefStorage` per element so each slot can be bound/unbound
/// independently, mirroring how `Bundle`/`List` track per-slot validity.
#[derive(Debug, Clone, PartialEq)]
pub enum RefStorage {
    Empty,
    Bound(ValueRef),
    Unbound(Vec<RefStorage>),
}

impl Eq for RefStorage {}

impl std::hash::Hash for RefStorage {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            RefStorage::Empty => 0u8.hash(state),
            RefStorage::Bound(r) => {
                1u8.hash(state);
                r.hash(state);
            }
            RefStorage::Unbound(items) => {
                2u8.hash(state);
                for i in items {
                    i.hash(state);
                }
            }
        }
    }
}

impl RefStorage {
    pub fn is_bound(&self) -> bool {
        matches!(self, RefStorage::Bound(_))
    }

    /// Bind an atomic (non-composite) ref to `target` at `path`.
    pub fn bind(&mut self, target: &Arc<RwLock<TsCellInner>>, path: StoredPath) -> Result<()> {
        match self {
            RefStorage::Unbound(items) if items.is_empty() => {
                *self = RefStorage::Bound(ValueRef::new(target, path));
                Ok(())
            }
            RefStorage::Empty | RefStorage::Bound(_) => {
                *self = RefStorage::Bound(ValueRef::new(target, path));
                Ok(())
            }
            RefStorage::Unbound(_) => Err(Error::InvalidView),
        }
    }

    pub fn bind_element(&mut self, index: usize, target: &Arc<RwLock<TsCellInner>>, path: StoredPath) -> Result<()> {
        match self {
            RefStorage::Unbound(items) => {
                let slot = items
                    .get_mut(index)
                    .ok_or_else(|| Error::OutOfRange(format!("ref element {index}")))?;
                *slot = RefStorage::Bound(ValueRef::new(target, path));
                Ok(())
            }
            _ => Err(Error::InvalidView),
        }
    }

    pub fn unbind(&mut self) {
        match self {
            RefStorage::Bound(_) => *self = RefStorage::Empty,
            RefStorage::Unbound(items) => {
                for i in items.iter_mut() {
                    *i = RefStorage::Empty;
                }
            }
            RefStorage::Empty => {}
        }
    }

    pub fn as_bound(&self) -> Option<&ValueRef> {
        match self {
            RefStorage::Bound(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::cell::TsCellInner;
    use crate::ts::overlay::Overlay;
    use crate::typemeta::builtin;
    use crate::value::Value;

    fn make_cell() -> Arc<RwLock<TsCellInner>> {
        let schema = builtin::i64_type();
        let value = Value::new(&schema);
        let overlay = Overlay::new_unset(&value);
        Arc::new(RwLock::new(TsCellInner::new(value, overlay)))
    }

    #[test]
    fn unresolved_ref_is_an_error_not_ub() {
        let cell = make_cell();
        let r = ValueRef::new(&cell, StoredPath::root());
        drop(cell);
        assert!(matches!(r.upgrade(), Err(Error::RefUnresolved)));
    }

    #[test]
    fn bind_then_unbind_round_trips() {
        let cell = make_cell();
        let mut storage = RefStorage::Empty;
        storage.bind(&cell, StoredPath::root()).unwrap();
        assert!(storage.is_bound());
        storage.unbind();
        assert_eq!(storage, RefStorage::Empty);
    }

    #[test]
    fn refs_to_same_cell_and_path_are_equal() {
        let cell = make_cell();
        let a = ValueRef::new(&cell, StoredPath::root());
        let b = ValueRef::new(&cell, StoredPath::root());
        assert_eq!(a, b);
    }
}
