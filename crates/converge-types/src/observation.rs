//! Per-round sensed-world payload delivered by the external round driver.
//!
//! The protocol core never senses the world itself; each round the driver
//! hands every agent an [`Observations`] snapshot of what that agent can
//! currently see. The derive phase compares it against the local world
//! model and stages facts for anything genuinely new.

use serde::{Deserialize, Serialize};

use crate::enums::{TileState, TrackedCategory};
use crate::facts::ObjectId;
use crate::location::GridLocation;

/// A tile within the agent's sensor range, with its true terrain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensedTile {
    /// The tile's position.
    pub location: GridLocation,
    /// The sensed terrain state.
    pub state: TileState,
}

/// A tracked mobile object within sensor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensedTracked {
    /// Which side the object belongs to.
    pub category: TrackedCategory,
    /// The arena-assigned identifier.
    pub id: ObjectId,
    /// Where the object currently is.
    pub location: GridLocation,
}

/// Everything one agent senses in one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observations {
    /// The sensing agent's own position.
    pub observer: GridLocation,
    /// Current round number.
    pub round: u32,
    /// Tiles in sensor range with their terrain states.
    pub tiles: Vec<SensedTile>,
    /// Positions of opponents in sensor range.
    pub opponents: Vec<GridLocation>,
    /// Tracked objects in sensor range.
    pub tracked: Vec<SensedTracked>,
}

impl Observations {
    /// An empty observation set for the given observer and round.
    pub const fn empty(observer: GridLocation, round: u32) -> Self {
        Self {
            observer,
            round,
            tiles: Vec::new(),
            opponents: Vec::new(),
            tracked: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_readings() {
        let obs = Observations::empty(GridLocation::new(5, 5), 12);
        assert_eq!(obs.round, 12);
        assert!(obs.tiles.is_empty());
        assert!(obs.opponents.is_empty());
        assert!(obs.tracked.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let obs = Observations {
            observer: GridLocation::new(2, 3),
            round: 7,
            tiles: vec![SensedTile {
                location: GridLocation::new(2, 4),
                state: TileState::Open,
            }],
            opponents: vec![GridLocation::new(9, 9)],
            tracked: vec![SensedTracked {
                category: TrackedCategory::Own,
                id: ObjectId(41),
                location: GridLocation::new(2, 2),
            }],
        };
        let json = serde_json::to_string(&obs).ok();
        assert!(json.is_some());
        let back: Result<Observations, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(obs));
    }
}
