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

//! The scalar half of the `type_ops` vtable (spec §4.1).
//!
//! A scalar leaf type is erased behind the [`ScalarOps`] trait object so
//! `TypeMeta` can describe arbitrary host-registered scalar kinds (not just
//! the handful built in here) without the registry needing a generic
//! parameter.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::error::{Error, Result};
use crate::host::HostValue;

/// Object-safe erased operations for one scalar type, registered once per
/// type and shared (by `Arc`) across every [`TypeMeta`](super::TypeMeta) and
/// [`ScalarBox`] of that type.
pub trait ScalarOps: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &'static str;
    fn default_value(&self) -> Box<dyn Any + Send + Sync>;
    fn clone_value(&self, v: &dyn Any) -> Box<dyn Any + Send + Sync>;
    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool;
    fn hash_value(&self, v: &dyn Any, state: &mut dyn Hasher);
    fn to_string_value(&self, v: &dyn Any) -> String;
    fn to_host_object(&self, v: &dyn Any) -> HostValue;
    fn from_host_object(&self, src: &HostValue) -> Result<Box<dyn Any + Send + Sync>>;
    /// The "single scalar conversion contract" spec §1 carves out of the
    /// numeric-library-interop non-goal: a best-effort projection to `f64`
    /// for scalar kinds that are numeric, `None` otherwise.
    fn to_f64(&self, v: &dyn Any) -> Option<f64>;
}

/// Marker bound for a type that can back a registered scalar `TypeMeta`.
pub trait ScalarKind:
    Clone + PartialEq + fmt::Debug + Hash + Default + Send + Sync + 'static
{
}

impl<T> ScalarKind for T where T: Clone + PartialEq + fmt::Debug + Hash + Default + Send + Sync + 'static
{}

/// Blanket [`ScalarOps`] implementation for any [`ScalarKind`] that also
/// knows how to cross the host-object boundary.
pub struct ScalarOpsImpl<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarOpsImpl<T> {
    pub fn new(name: &'static str) -> Arc<dyn ScalarOps>
    where
        T: ScalarKind + ToHostScalar + FromHostScalar + ToNumeric,
    {
        Arc::new(Self {
            name,
            _marker: PhantomData,
        })
    }
}

impl<T> fmt::Debug for ScalarOpsImpl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarOpsImpl").field("name", &self.name).finish()
    }
}

/// Per-type host-object conversion, implemented for the builtin scalar kinds
/// below and by anything an embedder registers alongside its own scalar type.
pub trait ToHostScalar {
    fn to_host(&self) -> HostValue;
}

pub trait FromHostScalar: Sized {
    fn from_host(src: &HostValue) -> Result<Self>;
}

pub trait ToNumeric {
    fn to_numeric(&self) -> Option<f64>;
}

fn downcast<T: 'static>(v: &dyn Any) -> &T {
    v.downcast_ref::<T>()
        .expect("ScalarOps dispatched against a value of a different concrete type")
}

impl<T> ScalarOps for ScalarOpsImpl<T>
where
    T: ScalarKind + ToHostScalar + FromHostScalar + ToNumeric,
{
    fn type_name(&self) -> &'static str {
        self.name
    }

    fn default_value(&self) -> Box<dyn Any + Send + Sync> {
        Box::new(T::default())
    }

    fn clone_value(&self, v: &dyn Any) -> Box<dyn Any + Send + Sync> {
        Box::new(downcast::<T>(v).clone())
    }

    fn equals(&self, a: &dyn Any, b: &dyn Any) -> bool {
        downcast::<T>(a) == downcast::<T>(b)
    }

    fn hash_value(&self, v: &dyn Any, mut state: &mut dyn Hasher) {
        downcast::<T>(v).hash(&mut state);
    }

    fn to_string_value(&self, v: &dyn Any) -> String {
        format!("{:?}", downcast::<T>(v))
    }

    fn to_host_object(&self, v: &dyn Any) -> HostValue {
        downcast::<T>(v).to_host()
    }

    fn from_host_object(&self, src: &HostValue) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(T::from_host(src)?))
    }

    fn to_f64(&self, v: &dyn Any) -> Option<f64> {
        downcast::<T>(v).to_numeric()
    }
}

macro_rules! impl_int_scalar {
    ($t:ty) => {
        impl ToHostScalar for $t {
            fn to_host(&self) -> HostValue {
                HostValue::Int(*self as i64)
            }
        }
        impl FromHostScalar for $t {
            fn from_host(src: &HostValue) -> Result<Self> {
                match src {
                    HostValue::Int(n) => Ok(*n as $t),
                    HostValue::Null => Err(Error::NullNotAllowed(stringify!($t).into())),
                    other => Err(Error::HostShapeMismatch {
                        expected: stringify!($t).into(),
                        found: format!("{:?}", other),
                    }),
                }
            }
        }
        impl ToNumeric for $t {
            fn to_numeric(&self) -> Option<f64> {
                self.to_f64()
            }
        }
    };
}

impl_int_scalar!(i64);
impl_int_scalar!(i32);
impl_int_scalar!(u64);

impl ToHostScalar for f64 {
    fn to_host(&self) -> HostValue {
        HostValue::Float(*self)
    }
}
impl FromHostScalar for f64 {
    fn from_host(src: &HostValue) -> Result<Self> {
        match src {
            HostValue::Float(f) => Ok(*f),
            HostValue::Int(n) => Ok(*n as f64),
            HostValue::Null => Err(Error::NullNotAllowed("f64".into())),
            other => Err(Error::HostShapeMismatch {
                expected: "f64".into(),
                found: format!("{:?}", other),
            }),
        }
    }
}
impl ToNumeric for f64 {
    fn to_numeric(&self) -> Option<f64> {
        Some(*self)
    }
}

impl ToHostScalar for bool {
    fn to_host(&self) -> HostValue {
        HostValue::Bool(*self)
    }
}
impl FromHostScalar for bool {
    fn from_host(src: &HostValue) -> Result<Self> {
        match src {
            HostValue::Bool(b) => Ok(*b),
            HostValue::Null => Err(Error::NullNotAllowed("bool".into())),
            other => Err(Error::HostShapeMismatch {
                expected: "bool".into(),
                found: format!("{:?}", other),
            }),
        }
    }
}
impl ToNumeric for bool {
    fn to_numeric(&self) -> Option<f64> {
        None
    }
}

impl ToHostScalar for String {
    fn to_host(&self) -> HostValue {
        HostValue::String(self.clone())
    }
}
impl FromHostScalar for String {
    fn from_host(src: &HostValue) -> Result<Self> {
        match src {
            HostValue::String(s) => Ok(s.clone()),
            HostValue::Null => Err(Error::NullNotAllowed("String".into())),
            other => Err(Error::HostShapeMismatch {
                expected: "String".into(),
                found: format!("{:?}", other),
            }),
        }
    }
}
impl ToNumeric for String {
    fn to_numeric(&self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_roundtrips_through_host() {
        let ops = ScalarOpsImpl::<i64>::new("i64");
        let v: Box<dyn Any + Send + Sync> = Box::new(42i64);
        let host = ops.to_host_object(v.as_ref());
        assert_eq!(host, HostValue::Int(42));
        let back = ops.from_host_object(&host).unwrap();
        assert!(ops.equals(v.as_ref(), back.as_ref()));
    }

    #[test]
    fn null_rejected_for_non_nullable_scalar() {
        let ops = ScalarOpsImpl::<f64>::new("f64");
        let err = ops.from_host_object(&HostValue::Null).unwrap_err();
        assert!(matches!(err, Error::NullNotAllowed(_)));
    }
}
