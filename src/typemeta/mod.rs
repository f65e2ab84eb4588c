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

//! L1: the `TypeMeta` registry (spec §4.1).
//!
//! Types are interned and compared by pointer identity (spec §3.2 invariant
//! 1). Registration is idempotent: two calls with structurally equal
//! arguments return the same interned [`TypeMetaRef`] (spec property P1).

pub mod scalar;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

pub use scalar::{FromHostScalar, ScalarKind, ScalarOps, ScalarOpsImpl, ToHostScalar, ToNumeric};

/// One field of a bundle, or one positional slot of a tuple.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    pub name: Box<str>,
    pub ty: TypeMetaRef,
}

/// The shape a registered type takes (spec §3.1).
pub enum TypeKind {
    Scalar(Arc<dyn ScalarOps>),
    Bundle(Vec<FieldMeta>),
    Tuple(Vec<TypeMetaRef>),
    List {
        element: TypeMetaRef,
        /// 0 means dynamically sized.
        fixed_size: usize,
    },
    Set {
        element: TypeMetaRef,
    },
    Map {
        key: TypeMetaRef,
        value: TypeMetaRef,
    },
    CyclicBuffer {
        element: TypeMetaRef,
        capacity: usize,
    },
    Queue {
        element: TypeMetaRef,
        /// 0 means unbounded.
        max_capacity: usize,
    },
    Ref {
        value_type: TypeMetaRef,
        /// 0 = atomic ref; >0 = possibly-unbound composite ref over this
        /// many elements/fields.
        item_count: usize,
    },
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Scalar(ops) => write!(f, "Scalar({})", ops.type_name()),
            TypeKind::Bundle(fields) => f.debug_tuple("Bundle").field(fields).finish(),
            TypeKind::Tuple(elems) => f.debug_tuple("Tuple").field(elems).finish(),
            TypeKind::List { element, fixed_size } => f
                .debug_struct("List")
                .field("element", element)
                .field("fixed_size", fixed_size)
                .finish(),
            TypeKind::Set { element } => f.debug_struct("Set").field("element", element).finish(),
            TypeKind::Map { key, value } => {
                f.debug_struct("Map").field("key", key).field("value", value).finish()
            }
            TypeKind::CyclicBuffer { element, capacity } => f
                .debug_struct("CyclicBuffer")
                .field("element", element)
                .field("capacity", capacity)
                .finish(),
            TypeKind::Queue {
                element,
                max_capacity,
            } => f
                .debug_struct("Queue")
                .field("element", element)
                .field("max_capacity", max_capacity)
                .finish(),
            TypeKind::Ref {
                value_type,
                item_count,
            } => f
                .debug_struct("Ref")
                .field("value_type", value_type)
                .field("item_count", item_count)
                .finish(),
        }
    }
}

/// A registered, interned type description.
pub struct TypeMeta {
    name: Box<str>,
    kind: TypeKind,
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl TypeMeta {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn as_scalar(&self) -> Option<&Arc<dyn ScalarOps>> {
        match &self.kind {
            TypeKind::Scalar(ops) => Some(ops),
            _ => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&[FieldMeta]> {
        match &self.kind {
            TypeKind::Bundle(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[TypeMetaRef]> {
        match &self.kind {
            TypeKind::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.as_bundle()?.iter().position(|f| &*f.name == name)
    }
}

/// An interned, pointer-comparable handle to a [`TypeMeta`] (spec §3.2
/// invariant 1: "two values compare type-equal iff their schema pointers
/// are equal; schemas are interned and immutable after registration").
#[derive(Clone)]
pub struct TypeMetaRef(pub(crate) Arc<TypeMeta>);

impl TypeMetaRef {
    fn ptr(&self) -> *const TypeMeta {
        Arc::as_ptr(&self.0)
    }
}

impl std::ops::Deref for TypeMetaRef {
    type Target = TypeMeta;
    fn deref(&self) -> &TypeMeta {
        &self.0
    }
}

impl PartialEq for TypeMetaRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ptr(), other.ptr())
    }
}
impl Eq for TypeMetaRef {}

impl Hash for TypeMetaRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr().hash(state)
    }
}

impl fmt::Debug for TypeMetaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TypeMetaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// The structural arguments used to decide whether two registration calls
/// describe "the same" type (spec property P1). Kept separate from
/// `TypeMeta` itself so interning can hash/compare it without touching the
/// (non-`Eq`) `ScalarOps` trait object.
#[derive(Clone, PartialEq, Eq, Hash)]
enum StructuralKey {
    Scalar(TypeId),
    Bundle(Vec<(Box<str>, TypeMetaRef)>),
    Tuple(Vec<TypeMetaRef>),
    List(TypeMetaRef, usize),
    Set(TypeMetaRef),
    Map(TypeMetaRef, TypeMetaRef),
    CyclicBuffer(TypeMetaRef, usize),
    Queue(TypeMetaRef, usize),
    Ref(TypeMetaRef, usize),
}

struct Registry {
    by_key: HashMap<StructuralKey, TypeMetaRef>,
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(Registry {
            by_key: HashMap::new(),
        })
    })
}

fn intern(key: StructuralKey, build: impl FnOnce() -> TypeMeta) -> TypeMetaRef {
    // Read-mostly fast path: most calls after warm-up hit an already
    // interned type and never take the write lock (spec §5).
    if let Some(existing) = registry().read().by_key.get(&key) {
        return existing.clone();
    }
    let mut guard = registry().write();
    if let Some(existing) = guard.by_key.get(&key) {
        return existing.clone();
    }
    let meta = TypeMetaRef(Arc::new(build()));
    tracing::debug!(name = meta.name(), "interned new TypeMeta");
    guard.by_key.insert(key, meta.clone());
    meta
}

/// Register a scalar type (idempotent per concrete Rust type `T`).
pub fn register_scalar<T>(name: &'static str) -> TypeMetaRef
where
    T: ScalarKind + ToHostScalar + FromHostScalar + ToNumeric,
{
    let key = StructuralKey::Scalar(TypeId::of::<T>());
    intern(key, || TypeMeta {
        name: name.into(),
        kind: TypeKind::Scalar(ScalarOpsImpl::<T>::new(name)),
    })
}

/// Register an already-built [`ScalarOps`] under a given name (for host
/// languages registering their own scalar kinds without a native Rust type).
pub fn register_scalar_ops(name: &'static str, ops: Arc<dyn ScalarOps>, type_id: TypeId) -> TypeMetaRef {
    let key = StructuralKey::Scalar(type_id);
    intern(key, || TypeMeta {
        name: name.into(),
        kind: TypeKind::Scalar(ops),
    })
}

pub fn register_bundle<S: Into<Box<str>>>(name: &str, fields: Vec<(S, TypeMetaRef)>) -> TypeMetaRef {
    let fields: Vec<FieldMeta> = fields
        .into_iter()
        .map(|(n, ty)| FieldMeta { name: n.into(), ty })
        .collect();
    let key = StructuralKey::Bundle(fields.iter().map(|f| (f.name.clone(), f.ty.clone())).collect());
    let owned_name = name.to_string();
    intern(key, move || TypeMeta {
        name: owned_name.into_boxed_str(),
        kind: TypeKind::Bundle(fields),
    })
}

pub fn register_tuple(name: &str, elements: Vec<TypeMetaRef>) -> TypeMetaRef {
    let key = StructuralKey::Tuple(elements.clone());
    let owned_name = name.to_string();
    intern(key, move || TypeMeta {
        name: owned_name.into_boxed_str(),
        kind: TypeKind::Tuple(elements),
    })
}

pub fn register_list(element: TypeMetaRef, fixed_size: usize) -> TypeMetaRef {
    let key = StructuralKey::List(element.clone(), fixed_size);
    intern(key, move || TypeMeta {
        name: if fixed_size == 0 {
            format!("List<{}>", element.name()).into_boxed_str()
        } else {
            format!("List<{}; {}>", element.name(), fixed_size).into_boxed_str()
        },
        kind: TypeKind::List { element, fixed_size },
    })
}

pub fn register_set(element: TypeMetaRef) -> TypeMetaRef {
    let key = StructuralKey::Set(element.clone());
    intern(key, move || TypeMeta {
        name: format!("Set<{}>", element.name()).into_boxed_str(),
        kind: TypeKind::Set { element },
    })
}

pub fn register_map(key_ty: TypeMetaRef, value: TypeMetaRef) -> TypeMetaRef {
    let key = StructuralKey::Map(key_ty.clone(), value.clone());
    intern(key, move || TypeMeta {
        name: format!("Map<{}, {}>", key_ty.name(), value.name()).into_boxed_str(),
        kind: TypeKind::Map { key: key_ty, value },
    })
}

pub fn register_cyclic_buffer(element: TypeMetaRef, capacity: usize) -> TypeMetaRef {
    let key = StructuralKey::CyclicBuffer(element.clone(), capacity);
    intern(key, move || TypeMeta {
        name: format!("CyclicBuffer<{}; {}>", element.name(), capacity).into_boxed_str(),
        kind: TypeKind::CyclicBuffer { element, capacity },
    })
}

pub fn register_queue(element: TypeMetaRef, max_capacity: usize) -> TypeMetaRef {
    let key = StructuralKey::Queue(element.clone(), max_capacity);
    intern(key, move || TypeMeta {
        name: format!("Queue<{}>", element.name()).into_boxed_str(),
        kind: TypeKind::Queue {
            element,
            max_capacity,
        },
    })
}

pub fn register_ref(value_type: TypeMetaRef, item_count: usize) -> TypeMetaRef {
    let key = StructuralKey::Ref(value_type.clone(), item_count);
    intern(key, move || TypeMeta {
        name: format!("Ref<{}>", value_type.name()).into_boxed_str(),
        kind: TypeKind::Ref {
            value_type,
            item_count,
        },
    })
}

/// Commonly used builtin scalar schemas, registered lazily and cached.
pub mod builtin {
    use super::*;
    use std::sync::OnceLock;

    macro_rules! builtin_scalar {
        ($fn_name:ident, $t:ty, $name:literal) => {
            pub fn $fn_name() -> TypeMetaRef {
                static CACHE: OnceLock<TypeMetaRef> = OnceLock::new();
                CACHE.get_or_init(|| register_scalar::<$t>($name)).clone()
            }
        };
    }

    builtin_scalar!(i64_type, i64, "i64");
    builtin_scalar!(i32_type, i32, "i32");
    builtin_scalar!(u64_type, u64, "u64");
    builtin_scalar!(f64_type, f64, "f64");
    builtin_scalar!(bool_type, bool, "bool");
    builtin_scalar!(string_type, String, "string");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p1_same_scalar_type_interns_once() {
        let a = register_scalar::<i64>("i64");
        let b = register_scalar::<i64>("i64");
        assert_eq!(a, b);
        assert!(std::ptr::eq(Arc::as_ptr(&a.0), Arc::as_ptr(&b.0)));
    }

    #[test]
    fn p1_structurally_equal_bundles_intern_to_same_pointer() {
        let f64_t = builtin::f64_type();
        let i64_t = builtin::i64_type();
        let a = register_bundle(
            "Quote",
            vec![("price", f64_t.clone()), ("qty", i64_t.clone())],
        );
        let b = register_bundle("Quote", vec![("price", f64_t), ("qty", i64_t)]);
        assert_eq!(a, b);
    }

    #[test]
    fn differently_named_fields_are_different_types() {
        let f64_t = builtin::f64_type();
        let a = register_bundle("A", vec![("x", f64_t.clone())]);
        let b = register_bundle("B", vec![("y", f64_t)]);
        assert_ne!(a, b);
    }

    #[test]
    fn list_registration_is_idempotent() {
        let elem = builtin::i64_type();
        let a = register_list(elem.clone(), 0);
        let b = register_list(elem, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn field_index_linear_scan() {
        let f64_t = builtin::f64_type();
        let i64_t = builtin::i64_type();
        let bundle = register_bundle("Quote2", vec![("price", f64_t), ("qty", i64_t)]);
        assert_eq!(bundle.field_index("price"), Some(0));
        assert_eq!(bundle.field_index("qty"), Some(1));
        assert_eq!(bundle.field_index("missing"), None);
    }
}
