//! Grid coordinates and squared-distance math.
//!
//! All spatial reasoning in the protocol uses squared Euclidean distance,
//! which keeps every computation in small integers. Coordinates are `u8`
//! because no supported map exceeds [`MAX_MAP_DIMENSION`] in either axis.

use serde::{Deserialize, Serialize};

/// Maximum supported map width and height, in tiles.
///
/// The codec's radix arithmetic is sized against this bound; maps larger
/// than this cannot be encoded into the shared channel.
pub const MAX_MAP_DIMENSION: u8 = 60;

/// A coordinate pair on the match grid.
///
/// `(0, 0)` is a corner of the map; both axes grow toward
/// [`MAX_MAP_DIMENSION`] exclusive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GridLocation {
    /// Horizontal coordinate.
    pub x: u8,
    /// Vertical coordinate.
    pub y: u8,
}

impl GridLocation {
    /// Create a location from its coordinates.
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another location.
    pub fn distance_squared(self, other: Self) -> u32 {
        let dx = i32::from(self.x).saturating_sub(i32::from(other.x));
        let dy = i32::from(self.y).saturating_sub(i32::from(other.y));
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .unsigned_abs()
    }

    /// Whether another location lies within the given squared distance.
    pub fn is_within_distance_squared(self, other: Self, radius_squared: u32) -> bool {
        self.distance_squared(other) <= radius_squared
    }

    /// Whether another location is adjacent (including diagonals) or equal.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.is_within_distance_squared(other, 2)
    }

    /// Whether the location lies inside a map of the given size.
    pub const fn in_bounds(self, width: u8, height: u8) -> bool {
        self.x < width && self.y < height
    }
}

impl core::fmt::Display for GridLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_is_symmetric() {
        let a = GridLocation::new(3, 4);
        let b = GridLocation::new(7, 1);
        assert_eq!(a.distance_squared(b), b.distance_squared(a));
        assert_eq!(a.distance_squared(b), 25);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = GridLocation::new(10, 10);
        assert_eq!(a.distance_squared(a), 0);
    }

    #[test]
    fn within_distance_boundary_inclusive() {
        let a = GridLocation::new(0, 0);
        let b = GridLocation::new(3, 4);
        assert!(a.is_within_distance_squared(b, 25));
        assert!(!a.is_within_distance_squared(b, 24));
    }

    #[test]
    fn adjacency_covers_diagonals() {
        let a = GridLocation::new(5, 5);
        assert!(a.is_adjacent(GridLocation::new(6, 6)));
        assert!(a.is_adjacent(GridLocation::new(5, 4)));
        assert!(a.is_adjacent(a));
        assert!(!a.is_adjacent(GridLocation::new(7, 5)));
    }

    #[test]
    fn bounds_check() {
        let loc = GridLocation::new(39, 20);
        assert!(loc.in_bounds(40, 40));
        assert!(!loc.in_bounds(39, 40));
        assert!(!loc.in_bounds(40, 20));
    }

    #[test]
    fn serde_roundtrip() {
        let loc = GridLocation::new(12, 34);
        let json = serde_json::to_string(&loc).ok();
        assert!(json.is_some());
        let back: Result<GridLocation, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(loc));
    }
}
