//! Decaying "last known position" records for transient, unidentified
//! observations -- opponent sightings.
//!
//! Sightings have no identity, so they cannot be tracked by index like
//! flags. Instead the tracker keeps a bounded list of location records
//! merged by proximity: a new observation near a fresh record nudges that
//! record toward it, a stale record's slot is reused outright, and only
//! genuinely novel observations occupy new slots. Staleness doubles as the
//! eviction policy, so no separate bookkeeping is needed to keep the list
//! bounded.

use tracing::warn;

use converge_types::GridLocation;

use crate::config::ProtocolConfig;

/// One remembered opponent location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SightingRecord {
    /// Smoothed last known position.
    pub location: GridLocation,
    /// Round of the most recent observation merged into this record.
    pub last_seen: u32,
}

impl SightingRecord {
    /// Whether this record has gone `stale_after` rounds without an update.
    pub const fn stale(&self, round: u32, stale_after: u32) -> bool {
        self.last_seen.saturating_add(stale_after) <= round
    }
}

/// How [`SightingTracker::observe`] disposed of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SightingOutcome {
    /// Blended into a nearby fresh record. Peers already know about this
    /// area, so the observation is not worth re-broadcasting.
    Blended,
    /// Overwrote a stale record's slot.
    Reused,
    /// Occupied a previously unused slot.
    Appended,
    /// List saturated with fresh records; the observation was lost.
    Dropped,
}

impl SightingOutcome {
    /// Whether the observation told us (and therefore our peers) something
    /// new enough to stage for broadcast.
    pub const fn broadcast_worthy(self) -> bool {
        matches!(self, Self::Reused | Self::Appended)
    }
}

/// Bounded list of decaying sighting records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SightingTracker {
    records: Vec<SightingRecord>,
    capacity: usize,
    nearby_radius_squared: u32,
    stale_after: u32,
}

impl SightingTracker {
    /// Create an empty tracker with the configured merge policy.
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            records: Vec::with_capacity(config.sighting_capacity),
            capacity: config.sighting_capacity,
            nearby_radius_squared: config.nearby_radius_squared,
            stale_after: config.stale_after,
        }
    }

    /// Fold an observation into the record list.
    ///
    /// In order: blend into a record that is near and fresh; otherwise
    /// reuse the slot of any stale record; otherwise append; otherwise
    /// drop the observation (explicit, logged loss -- never an error).
    pub fn observe(&mut self, location: GridLocation, round: u32) -> SightingOutcome {
        let stale_after = self.stale_after;
        let radius = self.nearby_radius_squared;

        if let Some(record) = self.records.iter_mut().find(|r| {
            !r.stale(round, stale_after) && r.location.is_within_distance_squared(location, radius)
        }) {
            record.location = blend(record.location, location);
            record.last_seen = round;
            return SightingOutcome::Blended;
        }

        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.stale(round, stale_after))
        {
            record.location = location;
            record.last_seen = round;
            return SightingOutcome::Reused;
        }

        if self.records.len() < self.capacity {
            self.records.push(SightingRecord {
                location,
                last_seen: round,
            });
            return SightingOutcome::Appended;
        }

        warn!(%location, round, "sighting list saturated, observation dropped");
        SightingOutcome::Dropped
    }

    /// Nearest non-stale sighting to a location, if any.
    pub fn nearest(&self, location: GridLocation, round: u32) -> Option<GridLocation> {
        self.iter_fresh(round)
            .min_by_key(|record| record.location.distance_squared(location))
            .map(|record| record.location)
    }

    /// Iterate over records that are still fresh at the given round.
    pub fn iter_fresh(&self, round: u32) -> impl Iterator<Item = &SightingRecord> {
        let stale_after = self.stale_after;
        self.records
            .iter()
            .filter(move |record| !record.stale(round, stale_after))
    }

    /// Total records held, stale ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no sighting has ever been recorded (or all slots reused).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Weighted blend biased toward history to smooth observation noise.
fn blend(old: GridLocation, new: GridLocation) -> GridLocation {
    let mix = |a: u8, b: u8| {
        let weighted = u16::from(a)
            .saturating_mul(2)
            .saturating_add(u16::from(b));
        // Coordinates are < 60, so the quotient always fits u8.
        u8::try_from(weighted.checked_div(3).unwrap_or(0)).unwrap_or(u8::MAX)
    };
    GridLocation::new(mix(old.x, new.x), mix(old.y, new.y))
}
