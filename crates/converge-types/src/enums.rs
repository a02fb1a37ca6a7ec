//! Enumeration types shared across the protocol.

use serde::{Deserialize, Serialize};

/// Discovered state of a single map tile.
///
/// Terrain is immutable once discovered: a tile that has left
/// [`TileState::Unknown`] is never rewritten with a different state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    /// Not yet observed by any agent whose broadcast reached us.
    #[default]
    Unknown,
    /// Impassable wall.
    Wall,
    /// Passable but hazardous terrain.
    Hazard,
    /// Open, freely passable ground.
    Open,
}

impl TileState {
    /// Wire payload for this state.
    ///
    /// `Unknown` maps to 0 and is never broadcast; the non-zero codes keep
    /// every encoded tile fact distinct from the channel's empty sentinel.
    pub const fn payload(self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::Wall => 1,
            Self::Hazard => 2,
            Self::Open => 3,
        }
    }

    /// Inverse of [`TileState::payload`]. Returns `None` for codes outside
    /// the broadcastable range `1..=3`.
    pub const fn from_payload(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Wall),
            2 => Some(Self::Hazard),
            3 => Some(Self::Open),
            _ => None,
        }
    }

    /// Whether an agent can stand on this tile, as far as we know.
    ///
    /// Unknown tiles are optimistically passable so pathing toward
    /// unexplored territory is not blocked.
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// Which side a tracked mobile object belongs to.
///
/// The category is never carried inside an encoded fact; it is recovered
/// from the channel region the fact was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedCategory {
    /// Objects our own side must defend.
    Own,
    /// Objects belonging to the opposing side.
    Foreign,
}

/// Bandwidth class of a fact, deciding which channel region it may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactClass {
    /// Low-volume, latency-sensitive: identity bindings and tracked
    /// positions. Written into the reserved channel prefix.
    Priority,
    /// High-volume, latency-tolerant: tile discoveries and sightings.
    Bulk,
}
