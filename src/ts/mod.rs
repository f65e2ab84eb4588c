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

//! L3: the time-series overlay layer (spec §4.3-§4.6) - cells, cursors,
//! paths, and the modification-bubbling algorithm built on top of the
//! type-erased value layer in [`crate::value`].

pub mod cell;
pub mod meta;
pub mod overlay;
pub mod path;
pub mod view;
pub mod view_mut;

pub use cell::{new_cell, new_signal_cell, TsCellHandle, TsCellInner, TsValue};
pub use meta::TsKind;
pub use overlay::Overlay;
pub use path::{LightweightPath, PathStep, StoredPath, StoredStep};
pub use view::TSView;
pub use view_mut::TSViewMut;
