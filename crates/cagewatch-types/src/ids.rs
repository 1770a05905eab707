//! Type-safe identifier wrappers around the integer ids issued by the
//! simulation engine.
//!
//! Mice and players share the same wire representation (a bare integer),
//! so each gets its own newtype to prevent mixing them at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a transparent newtype wrapper around an integer with standard
/// derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a mouse in the cage. Assigned by the engine and
    /// never reused within a run.
    MouseId(u64)
}

define_id! {
    /// Identifier for a player whose code governs one or more mouse
    /// behaviors.
    PlayerId(u32)
}
