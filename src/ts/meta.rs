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

//! The reactive-graph-facing "kind" a time-series cell presents itself as
//! (spec §2 GLOSSARY / §4.6). This is orthogonal to `TypeKind` - `TypeKind`
//! describes storage shape, `TsKind` describes how a graph node is expected
//! to read and interpret that shape over time.

use crate::typemeta::TypeMetaRef;

/// How a node is meant to read this cell across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsKind {
    /// Plain scalar time series: holds the latest value, and nothing else.
    Ts,
    /// Bundle time series: per-field modification tracking.
    Tsb,
    /// List time series: per-element plus add/remove tracking.
    Tsl,
    /// Map/dictionary time series.
    Tsd,
    /// Set time series.
    Tss,
    /// Window time series: a bounded cyclic buffer of recent samples.
    Tsw,
    /// A one-shot signal: valid only at the tick it was produced.
    Signal,
    /// A reference cell.
    Ref,
}

impl TsKind {
    /// Infer the natural `TsKind` for a schema's storage shape (used when a
    /// cell is constructed without an explicit kind annotation).
    pub fn for_schema(schema: &TypeMetaRef) -> TsKind {
        use crate::typemeta::TypeKind::*;
        match schema.kind() {
            Scalar(_) => TsKind::Ts,
            Bundle(_) | Tuple(_) => TsKind::Tsb,
            List { .. } => TsKind::Tsl,
            Set { .. } => TsKind::Tss,
            Map { .. } => TsKind::Tsd,
            CyclicBuffer { .. } => TsKind::Tsw,
            Queue { .. } => TsKind::Tsl,
            Ref { .. } => TsKind::Ref,
        }
    }
}
