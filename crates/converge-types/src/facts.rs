//! External object identifiers and the broadcast [`Fact`] type.

use serde::{Deserialize, Serialize};

use crate::enums::{FactClass, TileState, TrackedCategory};
use crate::location::GridLocation;

/// Arena-assigned identifier of a tracked mobile object.
///
/// Identifiers are opaque and unbounded from the protocol's point of view,
/// but the arena never issues one at or above [`ObjectId::MAX_RAW`]; the
/// codec relies on that bound when packing identity bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u16);

impl ObjectId {
    /// Exclusive upper bound on raw identifier values.
    pub const MAX_RAW: u16 = 3600;

    /// Return the raw identifier value.
    pub const fn into_inner(self) -> u16 {
        self.0
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One typed, bounded-size piece of information eligible for a channel slot.
///
/// Facts are the only thing agents exchange. Each variant packs into a
/// single `u16` via the codec in `converge-comms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fact {
    /// A newly discovered tile. First write wins; terrain never changes.
    Tile {
        /// The discovered terrain state (never `Unknown`).
        state: TileState,
        /// The tile's position.
        location: GridLocation,
    },
    /// A transient opponent sighting, merged by proximity and expired by
    /// staleness on the receiving side.
    Sighting {
        /// Where the opponent was seen.
        location: GridLocation,
    },
    /// Current position of a tracked object. Latest broadcast wins.
    TrackedPosition {
        /// Which side the object belongs to.
        category: TrackedCategory,
        /// Compact per-category slot index assigned by an identity binding.
        index: u8,
        /// The object's position.
        location: GridLocation,
    },
    /// Claim that an external identifier maps to a compact slot index.
    /// Must be merged before any position fact referencing the index.
    IdentityBinding {
        /// Which side the object belongs to.
        category: TrackedCategory,
        /// The arena-assigned identifier.
        id: ObjectId,
        /// The compact per-category index it is bound to.
        index: u8,
    },
}

impl Fact {
    /// Bandwidth class of this fact.
    pub const fn class(self) -> FactClass {
        match self {
            Self::Tile { .. } | Self::Sighting { .. } => FactClass::Bulk,
            Self::TrackedPosition { .. } | Self::IdentityBinding { .. } => FactClass::Priority,
        }
    }

    /// Tracked-object category, for facts that carry one.
    pub const fn category(self) -> Option<TrackedCategory> {
        match self {
            Self::TrackedPosition { category, .. } | Self::IdentityBinding { category, .. } => {
                Some(category)
            }
            Self::Tile { .. } | Self::Sighting { .. } => None,
        }
    }
}
