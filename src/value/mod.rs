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

//! L2: type-erased value storage (spec §4.2).
//!
//! `Value` is an owning, schema-described container. Spec §3.1 describes
//! composite storage as "contiguous bundle/tuple, inline-or-heap list,
//! KeySet-backed set, KeySet+ValueArray map, cyclic ring buffer, FIFO
//! queue, reference cell" with an explicit per-slot validity bitmap; this
//! crate represents the validity bit natively as `Option<Value>` absence
//! (see SPEC_FULL.md §3) rather than a separate bitmap alongside raw bytes.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::host::HostValue;
use crate::keyset::KeySet;
use crate::refs::RefStorage;
use crate::typemeta::{builtin, ScalarOps, TypeKind, TypeMetaRef};

/// A boxed, type-erased scalar payload plus the vtable that knows how to
/// operate on it (spec §4.1 `type_ops`).
pub struct ScalarBox {
    pub(crate) schema: TypeMetaRef,
    ops: Arc<dyn ScalarOps>,
    data: Box<dyn Any + Send + Sync>,
}

impl ScalarBox {
    pub fn schema(&self) -> &TypeMetaRef {
        &self.schema
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn to_host_object(&self) -> HostValue {
        self.ops.to_host_object(self.data.as_ref())
    }

    pub fn to_f64(&self) -> Option<f64> {
        self.ops.to_f64(self.data.as_ref())
    }

    pub fn set_from_host(&mut self, src: &HostValue) -> Result<()> {
        self.data = self.ops.from_host_object(src)?;
        Ok(())
    }
}

impl Clone for ScalarBox {
    fn clone(&self) -> Self {
        ScalarBox {
            schema: self.schema.clone(),
            ops: self.ops.clone(),
            data: self.ops.clone_value(self.data.as_ref()),
        }
    }
}

impl fmt::Debug for ScalarBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ops.to_string_value(self.data.as_ref()))
    }
}

impl PartialEq for ScalarBox {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.ops.equals(self.data.as_ref(), other.data.as_ref())
    }
}
impl Eq for ScalarBox {}

impl Hash for ScalarBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ops.hash_value(self.data.as_ref(), state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) fields: Vec<Option<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) elements: Vec<Option<Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) elements: Vec<Option<Value>>,
}

#[derive(Debug, Clone)]
pub struct SetValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) set: KeySet,
}
impl PartialEq for SetValue {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.set == other.set
    }
}
impl Eq for SetValue {}

#[derive(Debug, Clone)]
pub struct MapValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) keys: KeySet,
    pub(crate) values: Vec<Option<Value>>,
}
impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        if self.schema != other.schema || self.keys.len() != other.keys.len() {
            return false;
        }
        self.keys.iter_slots().all(|(slot, k)| {
            let v = &self.values[slot];
            match other.keys.slot_of(k) {
                Some(os) => &other.values[os] == v,
                None => false,
            }
        })
    }
}
impl Eq for MapValue {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicBufferValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) buf: VecDeque<Value>,
    pub(crate) capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) buf: VecDeque<Value>,
    pub(crate) max_capacity: usize,
}

/// The owning, type-erased value (spec §3.1 `Value`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarBox),
    Bundle(BundleValue),
    Tuple(TupleValue),
    List(ListValue),
    Set(SetValue),
    Map(MapValue),
    CyclicBuffer(CyclicBufferValue),
    Queue(QueueValue),
    Ref(RefKindValue),
}

/// A `Ref`-kind value: schema plus the indirection storage itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RefKindValue {
    pub(crate) schema: TypeMetaRef,
    pub(crate) storage: RefStorage,
}

impl Eq for Value {}

// Manual Hash: composites XOR-fold child hashes with a per-slot rotation;
// a null slot contributes a fixed nullity constant perturbed by index
// (spec §4.1 "hash" contract).
const NULLITY_CONSTANT: u64 = 0x9E37_79B9_7F4A_7C15;

fn hash_one(v: &Value) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

fn fold_ordered<'a>(slots: impl Iterator<Item = Option<&'a Value>>) -> u64 {
    let mut acc = 0u64;
    for (i, slot) in slots.enumerate() {
        let h = match slot {
            Some(v) => hash_one(v),
            None => NULLITY_CONSTANT ^ (i as u64),
        };
        acc ^= h.rotate_left((i as u32) % 64);
    }
    acc
}

fn fold_unordered<'a>(items: impl Iterator<Item = &'a Value>) -> u64 {
    items.fold(0u64, |acc, v| acc ^ hash_one(v))
}

fn fold_sequence<'a>(items: impl Iterator<Item = &'a Value>) -> u64 {
    let mut acc = 0u64;
    for (i, v) in items.enumerate() {
        acc ^= hash_one(v).rotate_left((i as u32) % 64);
    }
    acc
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Scalar(s) => s.hash(state),
            Value::Bundle(b) => fold_ordered(b.fields.iter().map(|f| f.as_ref())).hash(state),
            Value::Tuple(t) => fold_ordered(t.elements.iter().map(|f| f.as_ref())).hash(state),
            Value::List(l) => fold_ordered(l.elements.iter().map(|f| f.as_ref())).hash(state),
            Value::Set(s) => fold_unordered(s.set.iter()).hash(state),
            Value::Map(m) => {
                let h = m
                    .keys
                    .iter_slots()
                    .fold(0u64, |acc, (slot, k)| {
                        let vh = m.values[slot].as_ref().map(hash_one).unwrap_or(NULLITY_CONSTANT);
                        acc ^ (hash_one(k) ^ vh.rotate_left(1))
                    });
                h.hash(state);
            }
            Value::CyclicBuffer(c) => fold_sequence(c.buf.iter()).hash(state),
            Value::Queue(q) => fold_sequence(q.buf.iter()).hash(state),
            Value::Ref(r) => r.storage.hash(state),
        }
    }
}

impl Value {
    /// Construct the default ("nothing set yet") value for `schema`.
    pub fn new(schema: &TypeMetaRef) -> Value {
        match schema.kind() {
            TypeKind::Scalar(ops) => Value::Scalar(ScalarBox {
                schema: schema.clone(),
                ops: ops.clone(),
                data: ops.default_value(),
            }),
            TypeKind::Bundle(fields) => Value::Bundle(BundleValue {
                schema: schema.clone(),
                fields: vec![None; fields.len()],
            }),
            TypeKind::Tuple(elems) => Value::Tuple(TupleValue {
                schema: schema.clone(),
                elements: vec![None; elems.len()],
            }),
            TypeKind::List { fixed_size, .. } => Value::List(ListValue {
                schema: schema.clone(),
                elements: vec![None; *fixed_size],
            }),
            TypeKind::Set { .. } => Value::Set(SetValue {
                schema: schema.clone(),
                set: KeySet::new(),
            }),
            TypeKind::Map { .. } => Value::Map(MapValue {
                schema: schema.clone(),
                keys: KeySet::new(),
                values: Vec::new(),
            }),
            TypeKind::CyclicBuffer { capacity, .. } => Value::CyclicBuffer(CyclicBufferValue {
                schema: schema.clone(),
                buf: VecDeque::with_capacity(*capacity),
                capacity: *capacity,
            }),
            TypeKind::Queue { max_capacity, .. } => Value::Queue(QueueValue {
                schema: schema.clone(),
                buf: VecDeque::new(),
                max_capacity: *max_capacity,
            }),
            TypeKind::Ref { item_count, .. } => Value::Ref(RefKindValue {
                schema: schema.clone(),
                storage: if *item_count == 0 {
                    RefStorage::Empty
                } else {
                    RefStorage::Unbound(vec![RefStorage::Empty; *item_count])
                },
            }),
        }
    }

    pub fn schema(&self) -> &TypeMetaRef {
        match self {
            Value::Scalar(s) => &s.schema,
            Value::Bundle(b) => &b.schema,
            Value::Tuple(t) => &t.schema,
            Value::List(l) => &l.schema,
            Value::Set(s) => &s.schema,
            Value::Map(m) => &m.schema,
            Value::CyclicBuffer(c) => &c.schema,
            Value::Queue(q) => &q.schema,
            Value::Ref(r) => &r.schema,
        }
    }

    fn require_schema(&self, expected: &TypeMetaRef) -> Result<()> {
        if self.schema() != expected {
            return Err(Error::SchemaMismatch {
                expected: expected.clone(),
                found: self.schema().clone(),
            });
        }
        Ok(())
    }

    // ---- scalar convenience constructors (used heavily in tests) ----

    pub fn from_i64(v: i64) -> Value {
        let schema = builtin::i64_type();
        Value::Scalar(ScalarBox {
            ops: schema.as_scalar().unwrap().clone(),
            data: Box::new(v),
            schema,
        })
    }

    pub fn from_f64(v: f64) -> Value {
        let schema = builtin::f64_type();
        Value::Scalar(ScalarBox {
            ops: schema.as_scalar().unwrap().clone(),
            data: Box::new(v),
            schema,
        })
    }

    pub fn from_bool(v: bool) -> Value {
        let schema = builtin::bool_type();
        Value::Scalar(ScalarBox {
            ops: schema.as_scalar().unwrap().clone(),
            data: Box::new(v),
            schema,
        })
    }

    pub fn from_string(v: impl Into<String>) -> Value {
        let schema = builtin::string_type();
        Value::Scalar(ScalarBox {
            ops: schema.as_scalar().unwrap().clone(),
            data: Box::new(v.into()),
            schema,
        })
    }

    pub fn as_scalar(&self) -> Option<&ScalarBox> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar()?.downcast_ref::<i64>().copied()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar()?.to_f64()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar()?.downcast_ref::<String>().map(|s| s.as_str())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar()?.downcast_ref::<bool>().copied()
    }

    // ---- typed views ----

    pub fn as_bundle(&self) -> Option<&BundleValue> {
        match self {
            Value::Bundle(b) => Some(b),
            _ => None,
        }
    }
    pub fn as_bundle_mut(&mut self) -> Option<&mut BundleValue> {
        match self {
            Value::Bundle(b) => Some(b),
            _ => None,
        }
    }
    pub fn as_tuple(&self) -> Option<&TupleValue> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }
    pub fn as_tuple_mut(&mut self) -> Option<&mut TupleValue> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
    pub fn as_list_mut(&mut self) -> Option<&mut ListValue> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
    pub fn as_set(&self) -> Option<&SetValue> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_set_mut(&mut self) -> Option<&mut SetValue> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_map_mut(&mut self) -> Option<&mut MapValue> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_cyclic_buffer(&self) -> Option<&CyclicBufferValue> {
        match self {
            Value::CyclicBuffer(c) => Some(c),
            _ => None,
        }
    }
    pub fn as_queue(&self) -> Option<&QueueValue> {
        match self {
            Value::Queue(q) => Some(q),
            _ => None,
        }
    }
    pub fn as_ref_storage(&self) -> Option<&RefStorage> {
        match self {
            Value::Ref(r) => Some(&r.storage),
            _ => None,
        }
    }
    pub fn as_ref_storage_mut(&mut self) -> Option<&mut RefStorage> {
        match self {
            Value::Ref(r) => Some(&mut r.storage),
            _ => None,
        }
    }

    // ---- host conversion (spec §6 item 4) ----

    pub fn to_host_object(&self) -> HostValue {
        match self {
            Value::Scalar(s) => s.to_host_object(),
            Value::Bundle(b) => {
                let mut map = std::collections::BTreeMap::new();
                if let Some(fields) = b.schema.as_bundle() {
                    for (f, slot) in fields.iter().zip(b.fields.iter()) {
                        map.insert(
                            f.name.to_string(),
                            slot.as_ref().map(Value::to_host_object).unwrap_or(HostValue::Null),
                        );
                    }
                }
                HostValue::Attrs(map)
            }
            Value::Tuple(t) => HostValue::Seq(
                t.elements
                    .iter()
                    .map(|e| e.as_ref().map(Value::to_host_object).unwrap_or(HostValue::Null))
                    .collect(),
            ),
            Value::List(l) => HostValue::Seq(
                l.elements
                    .iter()
                    .map(|e| e.as_ref().map(Value::to_host_object).unwrap_or(HostValue::Null))
                    .collect(),
            ),
            Value::Set(s) => HostValue::Seq(s.set.iter().map(Value::to_host_object).collect()),
            Value::Map(m) => HostValue::Map(
                m.keys
                    .iter_slots()
                    .map(|(slot, k)| {
                        let v = m.values[slot]
                            .as_ref()
                            .map(Value::to_host_object)
                            .unwrap_or(HostValue::Null);
                        (k.to_host_object(), v)
                    })
                    .collect(),
            ),
            Value::CyclicBuffer(c) => HostValue::Seq(c.buf.iter().map(Value::to_host_object).collect()),
            Value::Queue(q) => HostValue::Seq(q.buf.iter().map(Value::to_host_object).collect()),
            Value::Ref(_) => HostValue::Null,
        }
    }

    /// Build a value of `schema` from a host object (spec §4.1
    /// `from_host_object`): null deactivates the slot rather than erroring.
    pub fn from_host_object(schema: &TypeMetaRef, src: &HostValue) -> Result<Value> {
        match schema.kind() {
            TypeKind::Scalar(ops) => {
                if src.is_null() {
                    return Err(Error::NullNotAllowed(schema.name().to_string()));
                }
                Ok(Value::Scalar(ScalarBox {
                    schema: schema.clone(),
                    ops: ops.clone(),
                    data: ops.from_host_object(src)?,
                }))
            }
            TypeKind::Bundle(field_metas) => {
                let mut fields: Vec<Option<Value>> = vec![None; field_metas.len()];
                match src {
                    HostValue::Attrs(map) => {
                        for (i, f) in field_metas.iter().enumerate() {
                            if let Some(v) = map.get(f.name.as_ref()) {
                                fields[i] = set_slot_from_host(&f.ty, v)?;
                            }
                        }
                    }
                    HostValue::Seq(seq) => {
                        for (i, (f, v)) in field_metas.iter().zip(seq.iter()).enumerate() {
                            fields[i] = set_slot_from_host(&f.ty, v)?;
                        }
                    }
                    HostValue::Map(entries) => {
                        for (k, v) in entries {
                            if let HostValue::String(name) = k {
                                if let Some(i) = field_metas.iter().position(|f| &*f.name == name.as_str())
                                {
                                    fields[i] = set_slot_from_host(&field_metas[i].ty, v)?;
                                }
                            }
                        }
                    }
                    other => {
                        return Err(Error::HostShapeMismatch {
                            expected: "bundle (attrs, seq, or keyed map)".into(),
                            found: format!("{:?}", other),
                        })
                    }
                }
                Ok(Value::Bundle(BundleValue {
                    schema: schema.clone(),
                    fields,
                }))
            }
            TypeKind::Tuple(elem_types) => match src {
                HostValue::Seq(seq) => {
                    let mut elements = vec![None; elem_types.len()];
                    for (i, (ty, v)) in elem_types.iter().zip(seq.iter()).enumerate() {
                        elements[i] = set_slot_from_host(ty, v)?;
                    }
                    Ok(Value::Tuple(TupleValue {
                        schema: schema.clone(),
                        elements,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "tuple (seq)".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::List { element, fixed_size } => match src {
                HostValue::Seq(seq) => {
                    if *fixed_size != 0 && seq.len() != *fixed_size {
                        return Err(Error::FixedSizeViolation(format!(
                            "expected {} elements, got {}",
                            fixed_size,
                            seq.len()
                        )));
                    }
                    let mut elements = Vec::with_capacity(seq.len());
                    for v in seq {
                        elements.push(set_slot_from_host(element, v)?);
                    }
                    Ok(Value::List(ListValue {
                        schema: schema.clone(),
                        elements,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "list (seq)".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::Set { element } => match src {
                HostValue::Seq(seq) => {
                    let mut set = KeySet::new();
                    for v in seq {
                        if v.is_null() {
                            return Err(Error::NullNotAllowed("set element".into()));
                        }
                        set.add(Value::from_host_object(element, v)?);
                    }
                    Ok(Value::Set(SetValue {
                        schema: schema.clone(),
                        set,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "set (seq)".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::Map { key, value } => match src {
                HostValue::Map(entries) => {
                    let mut keys = KeySet::new();
                    let mut values = Vec::new();
                    for (k, v) in entries {
                        if k.is_null() {
                            return Err(Error::NullNotAllowed("map key".into()));
                        }
                        let key_value = Value::from_host_object(key, k)?;
                        let slot = keys.add(key_value);
                        if slot == values.len() {
                            values.push(set_slot_from_host(value, v)?);
                        } else {
                            values[slot] = set_slot_from_host(value, v)?;
                        }
                    }
                    Ok(Value::Map(MapValue {
                        schema: schema.clone(),
                        keys,
                        values,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "map".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::CyclicBuffer { element, capacity } => match src {
                HostValue::Seq(seq) => {
                    let mut buf = VecDeque::with_capacity(*capacity);
                    for v in seq.iter().rev().take(*capacity).rev() {
                        buf.push_back(Value::from_host_object(element, v)?);
                    }
                    Ok(Value::CyclicBuffer(CyclicBufferValue {
                        schema: schema.clone(),
                        buf,
                        capacity: *capacity,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "cyclic buffer (seq)".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::Queue { element, max_capacity } => match src {
                HostValue::Seq(seq) => {
                    let mut buf = VecDeque::new();
                    for v in seq {
                        buf.push_back(Value::from_host_object(element, v)?);
                    }
                    Ok(Value::Queue(QueueValue {
                        schema: schema.clone(),
                        buf,
                        max_capacity: *max_capacity,
                    }))
                }
                other => Err(Error::HostShapeMismatch {
                    expected: "queue (seq)".into(),
                    found: format!("{:?}", other),
                }),
            },
            TypeKind::Ref { item_count, .. } => {
                if !src.is_null() {
                    return Err(Error::HostShapeMismatch {
                        expected: "ref (null - refs are bound via bind(), not from_host_object)".into(),
                        found: format!("{:?}", src),
                    });
                }
                let storage = if *item_count == 0 {
                    RefStorage::Empty
                } else {
                    RefStorage::Unbound(vec![RefStorage::Empty; *item_count])
                };
                Ok(Value::Ref(RefKindValue {
                    schema: schema.clone(),
                    storage,
                }))
            }
        }
    }
}

fn set_slot_from_host(ty: &TypeMetaRef, src: &HostValue) -> Result<Option<Value>> {
    if src.is_null() {
        Ok(None)
    } else {
        Ok(Some(Value::from_host_object(ty, src)?))
    }
}

impl BundleValue {
    pub fn schema(&self) -> &TypeMetaRef {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_valid(&self, i: usize) -> bool {
        self.fields.get(i).map(|f| f.is_some()).unwrap_or(false)
    }

    pub fn at(&self, i: usize) -> Result<Option<&Value>> {
        self.fields
            .get(i)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::OutOfRange(format!("bundle field index {i}")))
    }

    pub fn field(&self, name: &str) -> Result<Option<&Value>> {
        let i = self
            .schema
            .field_index(name)
            .ok_or_else(|| Error::OutOfRange(format!("no such field: {name}")))?;
        self.at(i)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.schema.field_index(name)
    }

    pub fn set_at(&mut self, i: usize, value: Option<Value>) -> Result<()> {
        let expected = &self.schema.as_bundle().unwrap()[i].ty;
        if let Some(v) = &value {
            v.require_schema(expected)?;
        }
        *self
            .fields
            .get_mut(i)
            .ok_or_else(|| Error::OutOfRange(format!("bundle field index {i}")))? = value;
        Ok(())
    }

    pub fn set_field(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        let i = self
            .schema
            .field_index(name)
            .ok_or_else(|| Error::OutOfRange(format!("no such field: {name}")))?;
        self.set_at(i, value)
    }

    pub fn all_valid(&self) -> bool {
        self.fields.iter().all(|f| f.is_some())
    }
}

impl TupleValue {
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
    pub fn at(&self, i: usize) -> Result<Option<&Value>> {
        self.elements
            .get(i)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::OutOfRange(format!("tuple index {i}")))
    }
    pub fn set_at(&mut self, i: usize, value: Option<Value>) -> Result<()> {
        let expected = &self.schema.as_tuple().unwrap()[i];
        if let Some(v) = &value {
            v.require_schema(expected)?;
        }
        *self
            .elements
            .get_mut(i)
            .ok_or_else(|| Error::OutOfRange(format!("tuple index {i}")))? = value;
        Ok(())
    }
}

fn list_element_type(schema: &TypeMetaRef) -> &TypeMetaRef {
    match schema.kind() {
        TypeKind::List { element, .. } => element,
        _ => unreachable!("ListValue schema must be TypeKind::List"),
    }
}

fn list_fixed_size(schema: &TypeMetaRef) -> usize {
    match schema.kind() {
        TypeKind::List { fixed_size, .. } => *fixed_size,
        _ => unreachable!("ListValue schema must be TypeKind::List"),
    }
}

impl ListValue {
    pub fn size(&self) -> usize {
        self.elements.len()
    }
    pub fn is_fixed(&self) -> bool {
        list_fixed_size(&self.schema) != 0
    }
    pub fn is_valid(&self, i: usize) -> bool {
        self.elements.get(i).map(|e| e.is_some()).unwrap_or(false)
    }
    pub fn at(&self, i: usize) -> Result<Option<&Value>> {
        self.elements
            .get(i)
            .map(|e| e.as_ref())
            .ok_or_else(|| Error::OutOfRange(format!("list index {i}")))
    }

    pub fn set_at(&mut self, i: usize, value: Option<Value>) -> Result<()> {
        let expected = list_element_type(&self.schema);
        if let Some(v) = &value {
            v.require_schema(expected)?;
        }
        *self
            .elements
            .get_mut(i)
            .ok_or_else(|| Error::OutOfRange(format!("list index {i}")))? = value;
        Ok(())
    }

    /// Push an element, growing the backing store (spec §4.1 "Dynamic list
    /// storage" growth policy - doubling is the `Vec` default amortised
    /// growth strategy, so no manual capacity dance is needed here).
    pub fn push(&mut self, value: Option<Value>) -> Result<()> {
        if self.is_fixed() {
            return Err(Error::FixedSizeViolation("push on a fixed-size list".into()));
        }
        if let Some(v) = &value {
            v.require_schema(list_element_type(&self.schema))?;
        }
        self.elements.push(value);
        Ok(())
    }

    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        if self.is_fixed() {
            return Err(Error::FixedSizeViolation("resize on a fixed-size list".into()));
        }
        self.elements.resize(new_size, None);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.is_fixed() {
            return Err(Error::FixedSizeViolation("clear on a fixed-size list".into()));
        }
        self.elements.clear();
        Ok(())
    }
}

impl SetValue {
    pub fn size(&self) -> usize {
        self.set.len()
    }
    pub fn contains(&self, v: &Value) -> bool {
        self.set.contains(v)
    }
    pub fn add(&mut self, v: Value) -> Result<usize> {
        let element = match self.schema.kind() {
            TypeKind::Set { element } => element,
            _ => unreachable!(),
        };
        v.require_schema(element)?;
        Ok(self.set.add(v))
    }
    pub fn remove(&mut self, v: &Value) -> Option<usize> {
        self.set.remove(v)
    }
    pub fn clear(&mut self) {
        self.set.clear()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.set.iter()
    }
}

impl MapValue {
    pub fn size(&self) -> usize {
        self.keys.len()
    }
    pub fn contains(&self, key: &Value) -> bool {
        self.keys.contains(key)
    }
    pub fn at(&self, key: &Value) -> Option<&Value> {
        let slot = self.keys.slot_of(key)?;
        self.values[slot].as_ref()
    }

    /// `value = None` supports spec §4.1's "deferred-value semantics": the
    /// key is present (and will show up in `keys()`/iteration) but has no
    /// value yet.
    pub fn set_item(&mut self, key: Value, value: Option<Value>) -> Result<usize> {
        let (key_ty, value_ty) = match self.schema.kind() {
            TypeKind::Map { key, value } => (key, value),
            _ => unreachable!(),
        };
        key.require_schema(key_ty)?;
        if let Some(v) = &value {
            v.require_schema(value_ty)?;
        }
        let slot = self.keys.add(key);
        if slot == self.values.len() {
            self.values.push(value);
        } else {
            self.values[slot] = value;
        }
        Ok(slot)
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let slot = self.keys.remove(key)?;
        self.values[slot].take()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.keys.iter()
    }

    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, &Value, Option<&Value>)> {
        self.keys
            .iter_slots()
            .map(move |(slot, k)| (slot, k, self.values[slot].as_ref()))
    }
}

impl CyclicBufferValue {
    pub fn length(&self) -> usize {
        self.buf.len()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Push a value, evicting the oldest entry if at capacity. Returns the
    /// evicted value, if any (spec §4.6 TSW is built on exactly this).
    pub fn push(&mut self, value: Value) -> Result<Option<Value>> {
        let element = match self.schema.kind() {
            TypeKind::CyclicBuffer { element, .. } => element,
            _ => unreachable!(),
        };
        value.require_schema(element)?;
        let evicted = if self.capacity > 0 && self.buf.len() >= self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        Ok(evicted)
    }
    pub fn clear(&mut self) {
        self.buf.clear();
    }
    pub fn newest(&self) -> Option<&Value> {
        self.buf.back()
    }
    pub fn oldest(&self) -> Option<&Value> {
        self.buf.front()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.buf.iter()
    }
}

impl QueueValue {
    pub fn length(&self) -> usize {
        self.buf.len()
    }
    pub fn push(&mut self, value: Value) -> Result<()> {
        let element = match self.schema.kind() {
            TypeKind::Queue { element, .. } => element,
            _ => unreachable!(),
        };
        value.require_schema(element)?;
        if self.max_capacity > 0 && self.buf.len() >= self.max_capacity {
            return Err(Error::FixedSizeViolation("queue at max capacity".into()));
        }
        self.buf.push_back(value);
        Ok(())
    }
    pub fn pop(&mut self) -> Option<Value> {
        self.buf.pop_front()
    }
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemeta::{builtin, register_bundle, register_list, register_map, register_set};

    #[test]
    fn scalar_equality_and_hash_match() {
        let a = Value::from_i64(42);
        let b = Value::from_i64(42);
        let c = Value::from_i64(43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn bundle_null_vs_null_slot_is_equal() {
        let schema = register_bundle("T1", vec![("x", builtin::i64_type())]);
        let a = Value::new(&schema);
        let b = Value::new(&schema);
        assert_eq!(a, b);
    }

    #[test]
    fn bundle_set_and_get_field() {
        let schema = register_bundle(
            "Quote3",
            vec![("price", builtin::f64_type()), ("qty", builtin::i64_type())],
        );
        let mut v = Value::new(&schema);
        let bundle = v.as_bundle_mut().unwrap();
        bundle.set_field("price", Some(Value::from_f64(1.25))).unwrap();
        assert_eq!(bundle.field("price").unwrap().and_then(Value::as_f64), Some(1.25));
        assert!(!bundle.is_valid(1));
        assert!(!bundle.all_valid());
    }

    #[test]
    fn list_push_grows_dynamic_list() {
        let schema = register_list(builtin::i64_type(), 0);
        let mut v = Value::new(&schema);
        let list = v.as_list_mut().unwrap();
        for i in 0..4 {
            list.push(Some(Value::from_i64(i))).unwrap();
        }
        assert_eq!(list.size(), 4);
        for i in 0..4 {
            assert_eq!(list.at(i as usize).unwrap().and_then(Value::as_i64), Some(i));
        }
    }

    #[test]
    fn fixed_list_rejects_push_and_resize() {
        let schema = register_list(builtin::i64_type(), 3);
        let mut v = Value::new(&schema);
        let list = v.as_list_mut().unwrap();
        assert_eq!(list.size(), 3);
        assert!(matches!(
            list.push(Some(Value::from_i64(1))),
            Err(Error::FixedSizeViolation(_))
        ));
        assert!(matches!(list.resize(5), Err(Error::FixedSizeViolation(_))));
    }

    #[test]
    fn set_add_is_idempotent() {
        let schema = register_set(builtin::i64_type());
        let mut v = Value::new(&schema);
        let set = v.as_set_mut().unwrap();
        set.add(Value::from_i64(7)).unwrap();
        set.add(Value::from_i64(7)).unwrap();
        assert_eq!(set.size(), 1);
        assert!(set.contains(&Value::from_i64(7)));
    }

    #[test]
    fn map_set_remove_and_contains() {
        let schema = register_map(builtin::string_type(), builtin::f64_type());
        let mut v = Value::new(&schema);
        let map = v.as_map_mut().unwrap();
        map.set_item(Value::from_string("a"), Some(Value::from_f64(1.0))).unwrap();
        map.set_item(Value::from_string("b"), Some(Value::from_f64(2.0))).unwrap();
        map.remove(&Value::from_string("a"));
        assert_eq!(map.size(), 1);
        assert!(!map.contains(&Value::from_string("a")));
        assert!(map.contains(&Value::from_string("b")));
    }

    #[test]
    fn schema_mismatch_rejected_on_list_set() {
        let schema = register_list(builtin::i64_type(), 0);
        let mut v = Value::new(&schema);
        let list = v.as_list_mut().unwrap();
        list.push(None).unwrap();
        let err = list.set_at(0, Some(Value::from_f64(1.0))).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn host_round_trip_bundle() {
        let schema = register_bundle(
            "Quote4",
            vec![("price", builtin::f64_type()), ("qty", builtin::i64_type())],
        );
        let mut map = std::collections::BTreeMap::new();
        map.insert("price".to_string(), HostValue::Float(2.5));
        let host = HostValue::Attrs(map);
        let v = Value::from_host_object(&schema, &host).unwrap();
        let back = v.to_host_object();
        assert_eq!(
            back.as_attrs().unwrap().get("price"),
            Some(&HostValue::Float(2.5))
        );
        assert_eq!(back.as_attrs().unwrap().get("qty"), Some(&HostValue::Null));
    }

    #[test]
    fn cyclic_buffer_evicts_oldest() {
        let schema = crate::typemeta::register_cyclic_buffer(builtin::i64_type(), 3);
        let mut v = Value::new(&schema);
        let cb = match &mut v {
            Value::CyclicBuffer(c) => c,
            _ => unreachable!(),
        };
        assert!(cb.push(Value::from_i64(10)).unwrap().is_none());
        assert!(cb.push(Value::from_i64(20)).unwrap().is_none());
        assert!(cb.push(Value::from_i64(30)).unwrap().is_none());
        let evicted = cb.push(Value::from_i64(40)).unwrap();
        assert_eq!(evicted.and_then(|v| v.as_i64()), Some(10));
        assert_eq!(cb.newest().and_then(Value::as_i64), Some(40));
    }
}
