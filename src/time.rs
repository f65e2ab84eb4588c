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

//! The engine time (tick) type.
//!
//! Spec §5: strictly monotone between ticks; a cursor's `current_time` is
//! captured at construction and immutable for that cursor's lifetime.

/// A scheduler-assigned tick. Strictly monotone across ticks for a given graph.
pub type EngineTime = i64;

/// The sentinel "never modified" timestamp (spec §3.2 invariant 2).
pub const MIN_TIME: EngineTime = EngineTime::MIN;
