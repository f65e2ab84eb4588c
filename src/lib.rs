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

//! Core value, schema, and time-series overlay model for a reactive
//! streaming graph.
//!
//! Three layers, bottom to top:
//!
//! - [`typemeta`]: the interned, pointer-comparable `TypeMeta` registry
//!   describing every scalar and composite shape a [`value::Value`] can
//!   take.
//! - [`value`]: the owning, type-erased value store itself: bundles,
//!   tuples, lists, sets, maps, cyclic buffers, queues, and ref cells, all
//!   addressable through the same `Value` enum.
//! - [`ts`]: the parallel overlay that tracks when each part of a value
//!   last changed, the cursor types (`TSView`/`TSViewMut`) a reactive graph
//!   node uses to read and write through that overlay, and the two path
//!   flavors used to address into it.
//!
//! [`refs`] sits alongside `value` and provides the non-owning
//! cross-cell indirection a `Ref`-kind value points through. [`host`] fixes
//! the shape values take when crossing the boundary into whatever host
//! language embeds this engine; [`error`] is the unified error type every
//! fallible operation in the crate returns.

pub mod error;
pub mod host;
pub mod keyset;
pub mod refs;
pub mod time;
pub mod ts;
pub mod typemeta;
pub mod value;

pub use error::{Error, Result};
pub use time::EngineTime;
pub use value::Value;
