//! The per-agent reconciled world model.
//!
//! Each agent owns one [`LocalWorldModel`], created at activation and
//! mutated in place every round: the read phase merges facts decoded from
//! the channel, the derive phase folds in the agent's own sensor readings
//! and stages anything genuinely new for broadcast. Decision logic
//! consumes the model through the query methods; it never touches the
//! channel directly.
//!
//! Merge is idempotent by construction: tiles are first-write-wins
//! (terrain never changes once discovered), tracked positions are
//! latest-write-wins (objects move), sightings fold through the proximity
//! merge, and identity bindings adopt first-seen-wins.

use tracing::debug;

use converge_types::{
    Fact, GridLocation, Observations, TileState, TrackedCategory,
};

use crate::codec::TRACKED_PER_CATEGORY;
use crate::config::ProtocolConfig;
use crate::error::CommsError;
use crate::identity::{BindOutcome, IdentityMapper};
use crate::outbound::OutboundQueue;
use crate::sightings::SightingTracker;

/// Score assigned to "no known object" in distance queries, far beyond any
/// real squared distance on a 60x60 grid.
const FAR: u32 = 1_000_000;

/// Last known position of one tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRecord {
    /// Most recently reported position.
    pub location: GridLocation,
    /// Round the position was last refreshed, locally or by broadcast.
    pub last_seen: u32,
}

/// One agent's cache of everything the swarm collectively knows.
#[derive(Debug, Clone)]
pub struct LocalWorldModel {
    width: u8,
    height: u8,
    /// Tile grid indexed `[x][y]`, initialized all-`Unknown`.
    tiles: Vec<Vec<TileState>>,
    /// Positions of every hazard tile discovered so far.
    hazards: Vec<GridLocation>,
    identities: IdentityMapper,
    own: [Option<TrackedRecord>; TRACKED_PER_CATEGORY as usize],
    foreign: [Option<TrackedRecord>; TRACKED_PER_CATEGORY as usize],
    sightings: SightingTracker,
    own_lifetime: u32,
    foreign_lifetime: u32,
    binding_warmup: u32,
}

impl LocalWorldModel {
    /// Create a fresh model: all tiles unknown, nothing tracked.
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            width: config.map_width,
            height: config.map_height,
            tiles: vec![
                vec![TileState::Unknown; usize::from(config.map_height)];
                usize::from(config.map_width)
            ],
            hazards: Vec::new(),
            identities: IdentityMapper::new(),
            own: [None; TRACKED_PER_CATEGORY as usize],
            foreign: [None; TRACKED_PER_CATEGORY as usize],
            sightings: SightingTracker::new(config),
            own_lifetime: config.own_tracked_lifetime,
            foreign_lifetime: config.foreign_tracked_lifetime,
            binding_warmup: config.binding_warmup,
        }
    }

    // -------------------------------------------------------------------
    // Merge: facts arriving from the channel
    // -------------------------------------------------------------------

    /// Apply one fact received from a peer. Idempotent; duplicates and
    /// unresolvable facts are absorbed silently.
    pub fn merge(&mut self, fact: &Fact, round: u32) {
        match *fact {
            Fact::Tile { state, location } => {
                self.set_tile(location, state);
            }
            Fact::Sighting { location } => {
                let _ = self.sightings.observe(location, round);
            }
            Fact::TrackedPosition {
                category,
                index,
                location,
            } => {
                if self.identities.is_bound(category, index) {
                    self.set_tracked(category, index, location, round);
                } else {
                    // The binding may still be in flight; drop the update
                    // rather than track an object we cannot name.
                    debug!(?category, index, %location, "discarding position for unbound index");
                }
            }
            Fact::IdentityBinding {
                category,
                id,
                index,
            } => {
                self.identities.adopt(category, id, index);
            }
        }
    }

    /// Forget tracked records that have outlived their category lifetime
    /// without a refresh.
    pub fn expire_tracked(&mut self, round: u32) {
        let own_lifetime = self.own_lifetime;
        for slot in &mut self.own {
            if slot.is_some_and(|r| r.last_seen.saturating_add(own_lifetime) < round) {
                *slot = None;
            }
        }
        let foreign_lifetime = self.foreign_lifetime;
        for slot in &mut self.foreign {
            if slot.is_some_and(|r| r.last_seen.saturating_add(foreign_lifetime) < round) {
                *slot = None;
            }
        }
    }

    // -------------------------------------------------------------------
    // Derive: the agent's own sensor readings
    // -------------------------------------------------------------------

    /// Fold fresh observations into the model and stage facts for
    /// everything genuinely new.
    ///
    /// A tracked object's position is staged when the local record is
    /// absent (first sight after warmup, or expired) or disagrees with the
    /// sensed location, so stationary objects are re-broadcast once per
    /// record lifetime rather than once ever.
    ///
    /// Deduplication is best-effort: a tile already non-`Unknown` locally
    /// (from our own earlier sensing or a peer's broadcast) is never
    /// re-queued, but two agents discovering the same tile in the same
    /// round may both stage it before either has read the other's write.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::TrackedCapacityExceeded`] if the observations
    /// contain more simultaneous tracked identities than the protocol
    /// supports -- a violated domain invariant.
    pub fn derive(
        &mut self,
        observations: &Observations,
        queue: &mut OutboundQueue,
    ) -> Result<(), CommsError> {
        let round = observations.round;

        for sensed in &observations.tiles {
            if sensed.state == TileState::Unknown {
                continue;
            }
            if self.tile_state(sensed.location) == TileState::Unknown
                && self.set_tile(sensed.location, sensed.state)
            {
                queue.push(Fact::Tile {
                    state: sensed.state,
                    location: sensed.location,
                });
            }
        }

        self.clear_lost_tracked(observations);

        for &location in &observations.opponents {
            if self.sightings.observe(location, round).broadcast_worthy() {
                queue.push(Fact::Sighting { location });
            }
        }

        for sensed in &observations.tracked {
            let outcome = self.identities.bind(sensed.category, sensed.id)?;
            let index = outcome.index();

            if matches!(outcome, BindOutcome::Fresh(_)) {
                // Broadcast the binding alone this round; the position
                // follows once peers can resolve the index.
                queue.push(Fact::IdentityBinding {
                    category: sensed.category,
                    id: sensed.id,
                    index,
                });
                continue;
            }

            // The record holds the last broadcast position, not the last
            // sensed one: it is refreshed here when a fact is staged and by
            // merge when the broadcast is read back, never by sensing
            // alone. Expiry of the observer's own record re-stages a
            // stationary object's position as a periodic heartbeat.
            let needs_broadcast = self
                .tracked_position(sensed.category, index)
                .is_none_or(|known| known != sensed.location);
            if needs_broadcast && round >= self.binding_warmup {
                self.set_tracked(sensed.category, index, sensed.location, round);
                queue.push(Fact::TrackedPosition {
                    category: sensed.category,
                    index,
                    location: sensed.location,
                });
            }
        }

        Ok(())
    }

    /// Drop tracked records the observer is standing next to but cannot
    /// see: the object is gone (carried off or captured). Local only; the
    /// per-category lifetime handles peers.
    fn clear_lost_tracked(&mut self, observations: &Observations) {
        let observer = observations.observer;
        for category in [TrackedCategory::Own, TrackedCategory::Foreign] {
            for index in 0..TRACKED_PER_CATEGORY {
                let Some(record) = self.tracked_record(category, index) else {
                    continue;
                };
                if !record.location.is_adjacent(observer) {
                    continue;
                }
                let still_visible = observations.tracked.iter().any(|sensed| {
                    sensed.category == category
                        && self.identities.resolve(category, sensed.id) == Some(index)
                });
                if !still_visible {
                    debug!(?category, index, "tracked object missing from expected position");
                    self.clear_tracked(category, index);
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // Queries: consumed by external decision logic
    // -------------------------------------------------------------------

    /// Discovered state of a tile. Out-of-bounds locations read `Unknown`.
    pub fn tile_state(&self, location: GridLocation) -> TileState {
        self.tiles
            .get(usize::from(location.x))
            .and_then(|column| column.get(usize::from(location.y)))
            .copied()
            .unwrap_or(TileState::Unknown)
    }

    /// Last known position of a tracked object, if one is on record.
    pub fn tracked_position(&self, category: TrackedCategory, index: u8) -> Option<GridLocation> {
        self.tracked_record(category, index).map(|r| r.location)
    }

    /// Nearest non-stale opponent sighting.
    pub fn nearest_sighting(&self, location: GridLocation, round: u32) -> Option<GridLocation> {
        self.sightings.nearest(location, round)
    }

    /// The sighting most worth responding to from a location: distance to
    /// the sighting plus ten times its distance to the nearest own tracked
    /// object, so threats near something we defend outrank closer ones in
    /// open ground.
    pub fn priority_sighting(&self, location: GridLocation, round: u32) -> Option<GridLocation> {
        let mut best_score = FAR;
        let mut best = None;
        for record in self.sightings.iter_fresh(round) {
            let score = location
                .distance_squared(record.location)
                .saturating_add(
                    self.nearest_own_tracked_distance(record.location)
                        .saturating_mul(10),
                );
            if score < best_score {
                best_score = score;
                best = Some(record.location);
            }
        }
        best
    }

    /// Squared distance from a location to the nearest own tracked object,
    /// or [`FAR`] when none is on record.
    pub fn nearest_own_tracked_distance(&self, location: GridLocation) -> u32 {
        self.own
            .iter()
            .flatten()
            .map(|record| location.distance_squared(record.location))
            .min()
            .unwrap_or(FAR)
    }

    /// Squared distance from a location to the nearest known hazard tile.
    ///
    /// When no hazard is known yet, falls back to a far-corner estimate so
    /// callers comparing distances still prefer explored directions.
    pub fn nearest_hazard_distance(&self, location: GridLocation) -> u32 {
        let fallback = {
            let dx = i32::from(location.x).saturating_sub(i32::from(self.width));
            let dy = i32::from(location.y).saturating_sub(i32::from(self.height));
            dx.saturating_mul(dx)
                .saturating_add(dy.saturating_mul(dy))
                .unsigned_abs()
                .saturating_mul(10)
        };
        self.hazards
            .iter()
            .map(|&hazard| location.distance_squared(hazard))
            .fold(fallback, u32::min)
    }

    /// The identity table, for callers that need to translate external
    /// identifiers themselves.
    pub const fn identities(&self) -> &IdentityMapper {
        &self.identities
    }

    /// Number of sighting records currently held.
    pub fn sighting_count(&self) -> usize {
        self.sightings.len()
    }

    // -------------------------------------------------------------------
    // Internal state transitions
    // -------------------------------------------------------------------

    /// First-write-wins tile update. Returns whether the tile changed.
    fn set_tile(&mut self, location: GridLocation, state: TileState) -> bool {
        let Some(cell) = self
            .tiles
            .get_mut(usize::from(location.x))
            .and_then(|column| column.get_mut(usize::from(location.y)))
        else {
            debug!(%location, "ignoring tile beyond the configured map");
            return false;
        };
        if *cell != TileState::Unknown || state == TileState::Unknown {
            return false;
        }
        *cell = state;
        if state == TileState::Hazard {
            self.hazards.push(location);
        }
        true
    }

    fn tracked_record(&self, category: TrackedCategory, index: u8) -> Option<TrackedRecord> {
        let table = match category {
            TrackedCategory::Own => &self.own,
            TrackedCategory::Foreign => &self.foreign,
        };
        table.get(usize::from(index)).copied().flatten()
    }

    fn set_tracked(
        &mut self,
        category: TrackedCategory,
        index: u8,
        location: GridLocation,
        round: u32,
    ) {
        let table = match category {
            TrackedCategory::Own => &mut self.own,
            TrackedCategory::Foreign => &mut self.foreign,
        };
        if let Some(slot) = table.get_mut(usize::from(index)) {
            *slot = Some(TrackedRecord {
                location,
                last_seen: round,
            });
        }
    }

    fn clear_tracked(&mut self, category: TrackedCategory, index: u8) {
        let table = match category {
            TrackedCategory::Own => &mut self.own,
            TrackedCategory::Foreign => &mut self.foreign,
        };
        if let Some(slot) = table.get_mut(usize::from(index)) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use converge_types::{ObjectId, SensedTile, SensedTracked};

    use super::*;

    fn model() -> LocalWorldModel {
        LocalWorldModel::new(&ProtocolConfig::default())
    }

    fn queue() -> OutboundQueue {
        OutboundQueue::new(ProtocolConfig::default().queue_capacity)
    }

    fn obs(observer: GridLocation, round: u32) -> Observations {
        Observations::empty(observer, round)
    }

    #[test]
    fn tile_merge_is_first_write_wins() {
        let mut model = model();
        let location = GridLocation::new(3, 4);

        model.merge(
            &Fact::Tile {
                state: TileState::Wall,
                location,
            },
            1,
        );
        assert_eq!(model.tile_state(location), TileState::Wall);

        // A conflicting later write is absorbed without effect.
        model.merge(
            &Fact::Tile {
                state: TileState::Open,
                location,
            },
            2,
        );
        assert_eq!(model.tile_state(location), TileState::Wall);
    }

    #[test]
    fn merging_same_tile_twice_changes_nothing() {
        let mut model = model();
        let fact = Fact::Tile {
            state: TileState::Hazard,
            location: GridLocation::new(7, 7),
        };
        model.merge(&fact, 1);
        model.merge(&fact, 5);
        assert_eq!(model.tile_state(GridLocation::new(7, 7)), TileState::Hazard);
        assert_eq!(
            model.nearest_hazard_distance(GridLocation::new(7, 8)),
            1,
            "the hazard list must not hold duplicates"
        );
    }

    #[test]
    fn derived_known_tile_is_not_requeued() {
        let mut model = model();
        let mut queue = queue();
        let location = GridLocation::new(3, 4);

        // A peer's broadcast already taught us this tile.
        model.merge(
            &Fact::Tile {
                state: TileState::Wall,
                location,
            },
            1,
        );

        let mut observations = obs(GridLocation::new(3, 5), 2);
        observations.tiles.push(SensedTile {
            location,
            state: TileState::Wall,
        });
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert!(queue.is_empty(), "known tiles must not be re-broadcast");
    }

    #[test]
    fn derived_new_tile_is_set_and_queued() {
        let mut model = model();
        let mut queue = queue();
        let location = GridLocation::new(3, 4);

        let mut observations = obs(GridLocation::new(3, 5), 1);
        observations.tiles.push(SensedTile {
            location,
            state: TileState::Wall,
        });
        assert!(model.derive(&observations, &mut queue).is_ok());

        assert_eq!(model.tile_state(location), TileState::Wall);
        assert_eq!(
            queue.pop_bulk(),
            Some(Fact::Tile {
                state: TileState::Wall,
                location,
            })
        );
    }

    #[test]
    fn position_for_unbound_index_is_discarded() {
        let mut model = model();
        model.merge(
            &Fact::TrackedPosition {
                category: TrackedCategory::Foreign,
                index: 1,
                location: GridLocation::new(9, 9),
            },
            1,
        );
        assert_eq!(model.tracked_position(TrackedCategory::Foreign, 1), None);
    }

    #[test]
    fn binding_then_position_resolves() {
        let mut model = model();
        model.merge(
            &Fact::IdentityBinding {
                category: TrackedCategory::Foreign,
                id: ObjectId(77),
                index: 1,
            },
            1,
        );
        model.merge(
            &Fact::TrackedPosition {
                category: TrackedCategory::Foreign,
                index: 1,
                location: GridLocation::new(9, 9),
            },
            1,
        );
        assert_eq!(
            model.tracked_position(TrackedCategory::Foreign, 1),
            Some(GridLocation::new(9, 9))
        );
    }

    #[test]
    fn tracked_position_latest_wins() {
        let mut model = model();
        model.merge(
            &Fact::IdentityBinding {
                category: TrackedCategory::Own,
                id: ObjectId(5),
                index: 0,
            },
            1,
        );
        model.merge(
            &Fact::TrackedPosition {
                category: TrackedCategory::Own,
                index: 0,
                location: GridLocation::new(1, 1),
            },
            1,
        );
        model.merge(
            &Fact::TrackedPosition {
                category: TrackedCategory::Own,
                index: 0,
                location: GridLocation::new(2, 2),
            },
            2,
        );
        assert_eq!(
            model.tracked_position(TrackedCategory::Own, 0),
            Some(GridLocation::new(2, 2))
        );
    }

    #[test]
    fn tracked_records_expire_per_category() {
        let mut model = model();
        for (category, id) in [
            (TrackedCategory::Own, ObjectId(1)),
            (TrackedCategory::Foreign, ObjectId(2)),
        ] {
            model.merge(
                &Fact::IdentityBinding {
                    category,
                    id,
                    index: 0,
                },
                1,
            );
            model.merge(
                &Fact::TrackedPosition {
                    category,
                    index: 0,
                    location: GridLocation::new(4, 4),
                },
                1,
            );
        }

        // Own lifetime 3: survives round 4 (1 + 3 = 4, not < 4), gone at 5.
        model.expire_tracked(4);
        assert!(model.tracked_position(TrackedCategory::Own, 0).is_some());
        model.expire_tracked(5);
        assert!(model.tracked_position(TrackedCategory::Own, 0).is_none());

        // Foreign lifetime 8: still alive at round 9, gone at 10.
        model.expire_tracked(9);
        assert!(model.tracked_position(TrackedCategory::Foreign, 0).is_some());
        model.expire_tracked(10);
        assert!(model.tracked_position(TrackedCategory::Foreign, 0).is_none());
    }

    #[test]
    fn derive_binds_fresh_identity_and_defers_position() {
        let mut model = model();
        let mut queue = queue();

        let mut observations = obs(GridLocation::new(0, 0), 5);
        observations.tracked.push(SensedTracked {
            category: TrackedCategory::Own,
            id: ObjectId(300),
            location: GridLocation::new(12, 12),
        });
        assert!(model.derive(&observations, &mut queue).is_ok());

        // Only the binding goes out the round an identity is first seen.
        assert_eq!(
            queue.pop_priority_for(TrackedCategory::Own),
            Some(Fact::IdentityBinding {
                category: TrackedCategory::Own,
                id: ObjectId(300),
                index: 0,
            })
        );
        assert!(queue.is_empty());

        // No position is on record until one has actually been staged.
        assert_eq!(model.tracked_position(TrackedCategory::Own, 0), None);

        // Next round the position is staged and recorded.
        let mut observations = obs(GridLocation::new(0, 0), 6);
        observations.tracked.push(SensedTracked {
            category: TrackedCategory::Own,
            id: ObjectId(300),
            location: GridLocation::new(13, 12),
        });
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert_eq!(
            queue.pop_priority_for(TrackedCategory::Own),
            Some(Fact::TrackedPosition {
                category: TrackedCategory::Own,
                index: 0,
                location: GridLocation::new(13, 12),
            })
        );
    }

    #[test]
    fn unmoved_tracked_object_is_not_rebroadcast() {
        let mut model = model();
        let mut queue = queue();
        let sensed = SensedTracked {
            category: TrackedCategory::Foreign,
            id: ObjectId(8),
            location: GridLocation::new(20, 20),
        };

        let mut observations = obs(GridLocation::new(0, 0), 5);
        observations.tracked.push(sensed);
        assert!(model.derive(&observations, &mut queue).is_ok());
        let _ = queue.pop_priority_for(TrackedCategory::Foreign); // binding

        // Round 6: the first position goes out.
        let mut observations = obs(GridLocation::new(0, 0), 6);
        observations.tracked.push(sensed);
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert_eq!(
            queue.pop_priority_for(TrackedCategory::Foreign),
            Some(Fact::TrackedPosition {
                category: TrackedCategory::Foreign,
                index: 0,
                location: GridLocation::new(20, 20),
            })
        );

        // Round 7: the record is fresh and unchanged, so nothing is staged.
        let mut observations = obs(GridLocation::new(0, 0), 7);
        observations.tracked.push(sensed);
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert!(
            queue.is_empty(),
            "a stationary object must not be re-broadcast while its record is fresh"
        );
    }

    #[test]
    fn stationary_position_restaged_after_expiry() {
        let mut model = model();
        let mut queue = queue();
        let sensed = SensedTracked {
            category: TrackedCategory::Own,
            id: ObjectId(12),
            location: GridLocation::new(12, 12),
        };

        // Round 3 (past warmup): binding; round 4: the first position.
        for round in 3..=4 {
            let mut observations = obs(GridLocation::new(0, 0), round);
            observations.tracked.push(sensed);
            assert!(model.derive(&observations, &mut queue).is_ok());
        }
        let _ = queue.pop_priority_for(TrackedCategory::Own); // binding
        let _ = queue.pop_priority_for(TrackedCategory::Own); // position
        assert!(queue.is_empty());

        // Rounds 5-7: record still fresh, nothing staged.
        for round in 5..=7 {
            let mut observations = obs(GridLocation::new(0, 0), round);
            observations.tracked.push(sensed);
            assert!(model.derive(&observations, &mut queue).is_ok());
        }
        assert!(queue.is_empty());

        // Round 8: the record (last_seen 4, lifetime 3) expires, and the
        // still-sensed position is staged again for peers whose own records
        // expired too.
        model.expire_tracked(8);
        let mut observations = obs(GridLocation::new(0, 0), 8);
        observations.tracked.push(sensed);
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert_eq!(
            queue.pop_priority_for(TrackedCategory::Own),
            Some(Fact::TrackedPosition {
                category: TrackedCategory::Own,
                index: 0,
                location: GridLocation::new(12, 12),
            })
        );
    }

    #[test]
    fn positions_withheld_during_binding_warmup() {
        let mut model = model();
        let mut queue = queue();
        let sensed = SensedTracked {
            category: TrackedCategory::Own,
            id: ObjectId(44),
            location: GridLocation::new(6, 6),
        };

        // Round 1: fresh binding queued, no position.
        let mut observations = obs(GridLocation::new(0, 0), 1);
        observations.tracked.push(sensed);
        assert!(model.derive(&observations, &mut queue).is_ok());
        let _ = queue.pop_priority_for(TrackedCategory::Own);

        // Round 2 (< warmup 3): the object moved, but positions wait.
        let mut observations = obs(GridLocation::new(0, 0), 2);
        observations.tracked.push(SensedTracked {
            location: GridLocation::new(7, 6),
            ..sensed
        });
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert!(queue.is_empty());
    }

    #[test]
    fn capacity_violation_surfaces_from_derive() {
        let mut model = model();
        let mut queue = queue();

        let mut observations = obs(GridLocation::new(0, 0), 1);
        for raw in 0..4u16 {
            observations.tracked.push(SensedTracked {
                category: TrackedCategory::Own,
                id: ObjectId(raw),
                location: GridLocation::new(10, 10),
            });
        }
        assert!(matches!(
            model.derive(&observations, &mut queue),
            Err(CommsError::TrackedCapacityExceeded { .. })
        ));
    }

    #[test]
    fn adjacent_missing_object_is_cleared_locally() {
        let mut model = model();
        let mut queue = queue();

        for round in 4..=5 {
            let mut observations = obs(GridLocation::new(0, 0), round);
            observations.tracked.push(SensedTracked {
                category: TrackedCategory::Own,
                id: ObjectId(9),
                location: GridLocation::new(30, 30),
            });
            assert!(model.derive(&observations, &mut queue).is_ok());
        }
        assert!(model.tracked_position(TrackedCategory::Own, 0).is_some());

        // Next round we stand where the object should be and see nothing.
        let observations = obs(GridLocation::new(30, 31), 6);
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert_eq!(model.tracked_position(TrackedCategory::Own, 0), None);
    }

    #[test]
    fn distant_record_survives_not_seeing_it() {
        let mut model = model();
        let mut queue = queue();

        for round in 4..=5 {
            let mut observations = obs(GridLocation::new(0, 0), round);
            observations.tracked.push(SensedTracked {
                category: TrackedCategory::Foreign,
                id: ObjectId(9),
                location: GridLocation::new(30, 30),
            });
            assert!(model.derive(&observations, &mut queue).is_ok());
        }

        // We are far away; not seeing the object means nothing.
        let observations = obs(GridLocation::new(5, 5), 6);
        assert!(model.derive(&observations, &mut queue).is_ok());
        assert!(model.tracked_position(TrackedCategory::Foreign, 0).is_some());
    }

    #[test]
    fn priority_sighting_prefers_threats_near_own_objects() {
        let mut model = model();

        // Own tracked object at (10, 10).
        model.merge(
            &Fact::IdentityBinding {
                category: TrackedCategory::Own,
                id: ObjectId(1),
                index: 0,
            },
            1,
        );
        model.merge(
            &Fact::TrackedPosition {
                category: TrackedCategory::Own,
                index: 0,
                location: GridLocation::new(10, 10),
            },
            1,
        );

        // A close sighting in open ground and a farther one next to the
        // tracked object.
        model.merge(
            &Fact::Sighting {
                location: GridLocation::new(22, 20),
            },
            1,
        );
        model.merge(
            &Fact::Sighting {
                location: GridLocation::new(11, 10),
            },
            1,
        );

        let from = GridLocation::new(20, 20);
        assert_eq!(
            model.nearest_sighting(from, 1),
            Some(GridLocation::new(22, 20))
        );
        assert_eq!(
            model.priority_sighting(from, 1),
            Some(GridLocation::new(11, 10)),
            "defense weighting must outrank raw distance"
        );
    }

    #[test]
    fn priority_sighting_ignores_stale_records() {
        let mut model = model();
        model.merge(
            &Fact::Sighting {
                location: GridLocation::new(5, 5),
            },
            1,
        );
        assert!(model.priority_sighting(GridLocation::new(0, 0), 1).is_some());
        assert_eq!(model.priority_sighting(GridLocation::new(0, 0), 20), None);
    }

    #[test]
    fn hazard_distance_falls_back_when_none_known() {
        let model = model();
        let no_hazards = model.nearest_hazard_distance(GridLocation::new(59, 59));
        assert!(no_hazards >= 10, "fallback must not read as adjacent");
    }

    #[test]
    fn out_of_bounds_tile_reads_unknown() {
        let config = ProtocolConfig {
            map_width: 30,
            map_height: 30,
            ..ProtocolConfig::default()
        };
        let mut model = LocalWorldModel::new(&config);
        let outside = GridLocation::new(45, 45);
        model.merge(
            &Fact::Tile {
                state: TileState::Wall,
                location: outside,
            },
            1,
        );
        assert_eq!(model.tile_state(outside), TileState::Unknown);
    }
}
