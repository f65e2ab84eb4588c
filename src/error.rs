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

//! Error kinds surfaced by the value/time-series core.
//!
//! Spec §7 splits errors into two propagation tiers: "programming errors"
//! that a node body has no sensible recovery from, and "data errors" a node
//! body is expected to catch and turn into an invalid-for-this-tick output.
//! Both tiers are ordinary [`Result`] values here - see [`Error::is_recoverable`].

use thiserror::Error as ThisError;

use crate::typemeta::TypeMetaRef;

/// The unified error type for every fallible operation in this crate.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// An operation received a value whose schema differs from the one expected.
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        expected: TypeMetaRef,
        found: TypeMetaRef,
    },

    /// Index or key not present.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Mutation attempted through a read-only view.
    #[error("not mutable")]
    NotMutable,

    /// Resize/clear attempted on a fixed-capacity container.
    #[error("fixed size violation: {0}")]
    FixedSizeViolation(String),

    /// Host-null passed to a conversion that rejects it.
    #[error("null not allowed: {0}")]
    NullNotAllowed(String),

    /// A host object had a shape `from_host_object` does not accept for this type.
    #[error("unexpected host shape for {expected}: {found}")]
    HostShapeMismatch { expected: String, found: String },

    /// Operation on a default-constructed or reset view.
    #[error("invalid view")]
    InvalidView,

    /// Dereference of an `Empty` ref, or a ref whose target has been dropped.
    #[error("ref unresolved")]
    RefUnresolved,

    /// A `StoredPath` step could not be re-resolved against current container state.
    #[error("not found: {0}")]
    NotFound(String),

    /// A mutating call supplied a tick time other than the cursor's `current_time`.
    #[error("non-monotonic write: cursor time {cursor_time}, attempted {attempted}")]
    NonMonotonicWrite { cursor_time: i64, attempted: i64 },
}

impl Error {
    /// True for "data errors" (spec §7) a node body is expected to catch and
    /// translate into an invalid-for-this-tick output. False for
    /// "programming errors" that should propagate uncaught.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::OutOfRange(_)
                | Error::NotFound(_)
                | Error::NullNotAllowed(_)
                | Error::RefUnresolved
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
