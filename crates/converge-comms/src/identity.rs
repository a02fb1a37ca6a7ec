//! Identity binding: large external identifiers to small per-category
//! slot indices.
//!
//! Tracked-object position facts carry only a compact index, because a raw
//! arena identifier next to a coordinate pair would not fit a 16-bit slot.
//! The mapper assigns indices in order of first sight and broadcasts the
//! assignment as an [`Fact::IdentityBinding`] so peers adopt it.
//!
//! Bindings are permanent for the match: once an id owns an index, no
//! other id may claim it. Readers that receive a position for an index
//! they have no binding for must discard it, not resolve it blindly.
//!
//! Two agents that independently bind the same id to different indices
//! before reading each other's broadcast can diverge; the protocol does
//! not resolve that race (see DESIGN.md), it only keeps each agent
//! internally consistent via first-seen-wins.
//!
//! [`Fact::IdentityBinding`]: converge_types::Fact::IdentityBinding

use tracing::warn;

use converge_types::{ObjectId, TrackedCategory};

use crate::codec::TRACKED_PER_CATEGORY;
use crate::error::CommsError;

/// Result of a [`IdentityMapper::bind`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The identifier was already bound to this index.
    Existing(u8),
    /// A new binding was created; it must be broadcast before any position
    /// fact referencing the index.
    Fresh(u8),
}

impl BindOutcome {
    /// The bound index, regardless of freshness.
    pub const fn index(self) -> u8 {
        match self {
            Self::Existing(index) | Self::Fresh(index) => index,
        }
    }
}

/// Per-agent table of identity-to-index assignments, one row per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMapper {
    own: [Option<ObjectId>; TRACKED_PER_CATEGORY as usize],
    foreign: [Option<ObjectId>; TRACKED_PER_CATEGORY as usize],
}

impl IdentityMapper {
    /// Create a mapper with no bindings.
    pub const fn new() -> Self {
        Self {
            own: [None; TRACKED_PER_CATEGORY as usize],
            foreign: [None; TRACKED_PER_CATEGORY as usize],
        }
    }

    /// Bind an external identifier, returning its index.
    ///
    /// Idempotent: an already-bound id returns [`BindOutcome::Existing`].
    /// Otherwise the lowest free index is assigned and reported as
    /// [`BindOutcome::Fresh`] so the caller can broadcast it.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::TrackedCapacityExceeded`] when every index of
    /// the category already holds a live binding -- a violated domain
    /// invariant, reported rather than silently overwriting.
    pub fn bind(
        &mut self,
        category: TrackedCategory,
        id: ObjectId,
    ) -> Result<BindOutcome, CommsError> {
        let table = self.table_mut(category);
        let mut free = None;
        for (index, entry) in table.iter().enumerate() {
            match entry {
                Some(bound) if *bound == id => {
                    return Ok(BindOutcome::Existing(narrow_index(index)));
                }
                None if free.is_none() => free = Some(index),
                _ => {}
            }
        }
        match free {
            Some(index) => {
                if let Some(entry) = table.get_mut(index) {
                    *entry = Some(id);
                }
                Ok(BindOutcome::Fresh(narrow_index(index)))
            }
            None => Err(CommsError::TrackedCapacityExceeded { category, id }),
        }
    }

    /// Adopt a binding broadcast by a peer. First-seen-wins: if either the
    /// id or the index is already taken, the claim is ignored.
    pub fn adopt(&mut self, category: TrackedCategory, id: ObjectId, index: u8) {
        if self.resolve(category, id).is_some() {
            return;
        }
        let table = self.table_mut(category);
        match table.get_mut(usize::from(index)) {
            Some(entry @ None) => *entry = Some(id),
            Some(Some(holder)) => {
                // Conflicting simultaneous claims; keep ours. Peers that
                // adopted the other claim diverge here -- a known gap.
                warn!(
                    ?category,
                    index,
                    claimed = %id,
                    held = %holder,
                    "ignoring conflicting identity binding"
                );
            }
            None => {
                warn!(?category, index, "ignoring binding for out-of-range index");
            }
        }
    }

    /// Look up the index bound to an identifier.
    pub fn resolve(&self, category: TrackedCategory, id: ObjectId) -> Option<u8> {
        self.table(category)
            .iter()
            .position(|entry| *entry == Some(id))
            .map(narrow_index)
    }

    /// The identifier bound to an index, if any.
    pub fn bound_id(&self, category: TrackedCategory, index: u8) -> Option<ObjectId> {
        self.table(category).get(usize::from(index)).copied().flatten()
    }

    /// Whether an index has a binding.
    pub fn is_bound(&self, category: TrackedCategory, index: u8) -> bool {
        self.bound_id(category, index).is_some()
    }

    /// Number of live bindings in a category.
    pub fn live_count(&self, category: TrackedCategory) -> usize {
        self.table(category).iter().flatten().count()
    }

    const fn table(&self, category: TrackedCategory) -> &[Option<ObjectId>] {
        match category {
            TrackedCategory::Own => &self.own,
            TrackedCategory::Foreign => &self.foreign,
        }
    }

    const fn table_mut(&mut self, category: TrackedCategory) -> &mut [Option<ObjectId>] {
        match category {
            TrackedCategory::Own => &mut self.own,
            TrackedCategory::Foreign => &mut self.foreign,
        }
    }
}

/// Table positions are bounded by [`TRACKED_PER_CATEGORY`], so this cannot
/// actually truncate.
fn narrow_index(index: usize) -> u8 {
    u8::try_from(index).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_is_idempotent_and_stable() {
        let mut mapper = IdentityMapper::new();
        let id = ObjectId(1234);

        let first = mapper.bind(TrackedCategory::Own, id).ok();
        assert_eq!(first, Some(BindOutcome::Fresh(0)));

        // Every later bind of the same id returns the same index.
        for _ in 0..5 {
            let again = mapper.bind(TrackedCategory::Own, id).ok();
            assert_eq!(again, Some(BindOutcome::Existing(0)));
        }
    }

    #[test]
    fn indices_assigned_in_discovery_order() {
        let mut mapper = IdentityMapper::new();
        let a = mapper.bind(TrackedCategory::Foreign, ObjectId(9)).ok();
        let b = mapper.bind(TrackedCategory::Foreign, ObjectId(7)).ok();
        let c = mapper.bind(TrackedCategory::Foreign, ObjectId(8)).ok();
        assert_eq!(a.map(BindOutcome::index), Some(0));
        assert_eq!(b.map(BindOutcome::index), Some(1));
        assert_eq!(c.map(BindOutcome::index), Some(2));
        assert_eq!(mapper.live_count(TrackedCategory::Foreign), 3);
    }

    #[test]
    fn categories_do_not_share_index_space() {
        let mut mapper = IdentityMapper::new();
        let own = mapper.bind(TrackedCategory::Own, ObjectId(5)).ok();
        let foreign = mapper.bind(TrackedCategory::Foreign, ObjectId(5)).ok();
        assert_eq!(own, Some(BindOutcome::Fresh(0)));
        assert_eq!(foreign, Some(BindOutcome::Fresh(0)));
    }

    #[test]
    fn capacity_exceeded_is_a_reported_error() {
        let mut mapper = IdentityMapper::new();
        for raw in 0..u16::from(TRACKED_PER_CATEGORY) {
            assert!(mapper.bind(TrackedCategory::Own, ObjectId(raw)).is_ok());
        }

        // A fourth live identity violates the domain invariant.
        let result = mapper.bind(TrackedCategory::Own, ObjectId(99));
        assert!(matches!(
            result,
            Err(CommsError::TrackedCapacityExceeded { .. })
        ));
        // The live bindings are untouched.
        assert_eq!(mapper.resolve(TrackedCategory::Own, ObjectId(0)), Some(0));
        assert_eq!(mapper.live_count(TrackedCategory::Own), 3);
    }

    #[test]
    fn adopt_first_seen_wins() {
        let mut mapper = IdentityMapper::new();
        mapper.adopt(TrackedCategory::Own, ObjectId(10), 1);
        assert_eq!(mapper.bound_id(TrackedCategory::Own, 1), Some(ObjectId(10)));

        // A conflicting claim for the same index is ignored.
        mapper.adopt(TrackedCategory::Own, ObjectId(11), 1);
        assert_eq!(mapper.bound_id(TrackedCategory::Own, 1), Some(ObjectId(10)));

        // Re-adopting an already-bound id elsewhere is ignored too.
        mapper.adopt(TrackedCategory::Own, ObjectId(10), 2);
        assert!(!mapper.is_bound(TrackedCategory::Own, 2));
    }

    #[test]
    fn adopted_binding_is_found_by_bind() {
        let mut mapper = IdentityMapper::new();
        mapper.adopt(TrackedCategory::Foreign, ObjectId(42), 2);
        let outcome = mapper.bind(TrackedCategory::Foreign, ObjectId(42)).ok();
        assert_eq!(outcome, Some(BindOutcome::Existing(2)));
    }

    #[test]
    fn out_of_range_adoption_ignored() {
        let mut mapper = IdentityMapper::new();
        mapper.adopt(TrackedCategory::Own, ObjectId(3), TRACKED_PER_CATEGORY);
        assert_eq!(mapper.live_count(TrackedCategory::Own), 0);
    }
}
