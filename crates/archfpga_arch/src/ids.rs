//! Opaque, copyable ID types for the entities of the architecture model.
//!
//! Every ID is a `u32` index into the owning registry. IDs are only meaningful
//! together with the [`Architecture`](crate::Architecture) that produced them.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates a newtype ID wrapper around `u32`.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub const fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize`.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// A logic model (built-in primitive or user `<model>`).
    ModelId
);

define_id!(
    /// A node of a pb_type hierarchy.
    PbTypeId
);

define_id!(
    /// One operating mode of a pb_type.
    ModeId
);

define_id!(
    /// A logical block type (a placeable, pb_type-rooted block).
    LogicalBlockId
);

define_id!(
    /// A physical tile type of the device grid.
    PhysicalTileId
);

define_id!(
    /// A pin index of a logical block type.
    LogicalPin
);

define_id!(
    /// A pin index of a physical sub-tile instance.
    PhysicalPin
);
