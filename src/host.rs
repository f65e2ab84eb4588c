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

//! The dynamic value shape this crate hands across the host-language
//! binding boundary (spec §6, item 4: "Host conversion"). The binding layer
//! itself - the thing that turns a `HostValue` into a Python/Lua/whatever
//! object - is an out-of-scope collaborator (spec §1); this module only
//! fixes the shape of the handoff.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A minimal dynamically-typed value standing in for "some host language's
/// object model", analogous to the role `serde_json::Value` plays for JSON.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Seq(Vec<HostValue>),
    Map(Vec<(HostValue, HostValue)>),
    Attrs(BTreeMap<String, HostValue>),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn as_attrs(&self) -> Option<&BTreeMap<String, HostValue>> {
        match self {
            HostValue::Attrs(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Seq(s) => Some(s),
            _ => None,
        }
    }
}

// Spec §4.1's `to_host_object`/`from_host_object` contract is implemented as
// inherent methods directly on `Value` (`value::Value::to_host_object` /
// `Value::from_host_object`) rather than as traits here: `from_host_object`
// is schema-driven (it needs the target `TypeMetaRef` to know how to
// interpret a bundle's keyed-vs-sequence host shape), so a `Self`-returning
// trait method can't express it without threading the schema through an
// associated type per impl, which buys nothing over a plain function.
