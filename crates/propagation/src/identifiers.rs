//! Newtype domain identifiers.
//!
//! Every remote entity kind is addressed by a distinct newtype wrapping the
//! integer id assigned by ShotGrid. This prevents accidentally interchanging,
//! for example, a [`TaskId`] with a [`ShotId`] even though both are `u64`
//! under the hood.
//!
//! String-valued vocabulary (status codes, pipeline step names) gets the same
//! treatment so a step name is never passed where a status is expected.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new value, returning `None` if the string is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (ShotGrid-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: ShotGrid-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a ShotGrid Version (a reviewable media submission).
    VersionId
}

u64_id! {
    /// Identifies a ShotGrid Task.
    TaskId
}

u64_id! {
    /// Identifies a ShotGrid Shot.
    ShotId
}

// ---------------------------------------------------------------------------
// Vocabulary: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// A status code as stored in an entity's `sg_status_list` field
    /// (e.g. `"ip"`, `"rev"`, `"apr"`).
    Status
}

string_id! {
    /// The name of the pipeline Step a Task belongs to (e.g. `"Composite"`).
    StepName
}
