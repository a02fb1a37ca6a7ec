//! The shared channel: a fixed array of `u16` slots, the sole medium of
//! exchange between agents.
//!
//! The channel is an explicit object injected into every endpoint rather
//! than a process-wide global, which makes the single-writer-per-turn
//! contract a visible parameter and lets tests construct several endpoints
//! against one channel in a controlled order.
//!
//! # Layout
//!
//! The index space is statically partitioned so that a slot's position
//! disambiguates information the 16-bit value has no room for:
//!
//! ```text
//! [0..3)   own-tracked priority region
//! [3..9)   foreign-tracked priority region
//! [9..64)  bulk region (tiles, sightings)
//! ```
//!
//! A tracked-position or binding fact read from the own region is about an
//! own object; the same value in the foreign region is about a foreign one.

use std::ops::Range;

use converge_types::TrackedCategory;

use crate::error::CommsError;

/// Number of slots in the shared channel.
pub const CHANNEL_SLOTS: usize = 64;

/// Sentinel value of an unoccupied slot. Never a valid fact encoding.
pub const EMPTY: u16 = 0;

/// First slot past the own-tracked priority region.
const OWN_REGION_END: usize = 3;

/// First slot past the foreign-tracked priority region (= start of bulk).
const FOREIGN_REGION_END: usize = 9;

/// Which statically partitioned part of the channel a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRegion {
    /// Priority slots reserved for own-tracked bindings and positions.
    OwnTracked,
    /// Priority slots reserved for foreign-tracked bindings and positions.
    ForeignTracked,
    /// Everything else: tile discoveries and sightings.
    Bulk,
}

impl ChannelRegion {
    /// The slot range this region occupies.
    pub const fn range(self) -> Range<usize> {
        match self {
            Self::OwnTracked => 0..OWN_REGION_END,
            Self::ForeignTracked => OWN_REGION_END..FOREIGN_REGION_END,
            Self::Bulk => FOREIGN_REGION_END..CHANNEL_SLOTS,
        }
    }

    /// The priority region reserved for a tracked-object category.
    pub const fn for_category(category: TrackedCategory) -> Self {
        match category {
            TrackedCategory::Own => Self::OwnTracked,
            TrackedCategory::Foreign => Self::ForeignTracked,
        }
    }

    /// The tracked-object category this region implies, if any.
    pub const fn category(self) -> Option<TrackedCategory> {
        match self {
            Self::OwnTracked => Some(TrackedCategory::Own),
            Self::ForeignTracked => Some(TrackedCategory::Foreign),
            Self::Bulk => None,
        }
    }

    /// Short name used in error contexts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::OwnTracked => "own-tracked",
            Self::ForeignTracked => "foreign-tracked",
            Self::Bulk => "bulk",
        }
    }
}

/// Classify a slot index into its region.
///
/// Indices at or beyond [`CHANNEL_SLOTS`] are still classified as bulk;
/// the channel accessors reject them before this matters.
pub const fn region_of(slot: usize) -> ChannelRegion {
    if slot < OWN_REGION_END {
        ChannelRegion::OwnTracked
    } else if slot < FOREIGN_REGION_END {
        ChannelRegion::ForeignTracked
    } else {
        ChannelRegion::Bulk
    }
}

/// The fixed-capacity shared blackboard.
///
/// Lifetime is one match; every slot starts [`EMPTY`]. Any agent may read
/// any slot in any round; writes are serialized by the external round
/// driver, so the channel needs no interior locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedChannel {
    slots: [u16; CHANNEL_SLOTS],
}

impl SharedChannel {
    /// Create a channel with every slot empty.
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY; CHANNEL_SLOTS],
        }
    }

    /// Read the value stored in a slot.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::SlotOutOfRange`] for indices beyond the
    /// channel width.
    pub fn read(&self, slot: usize) -> Result<u16, CommsError> {
        self.slots
            .get(slot)
            .copied()
            .ok_or(CommsError::SlotOutOfRange {
                slot,
                width: CHANNEL_SLOTS,
            })
    }

    /// Store a value in a slot, overwriting whatever was there.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::SlotOutOfRange`] for indices beyond the
    /// channel width.
    pub fn write(&mut self, slot: usize, value: u16) -> Result<(), CommsError> {
        match self.slots.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(CommsError::SlotOutOfRange {
                slot,
                width: CHANNEL_SLOTS,
            }),
        }
    }

    /// Reset a slot to [`EMPTY`].
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::SlotOutOfRange`] for indices beyond the
    /// channel width.
    pub fn clear(&mut self, slot: usize) -> Result<(), CommsError> {
        self.write(slot, EMPTY)
    }

    /// Whether a slot currently holds no fact. Out-of-range slots count as
    /// occupied so write scans skip them.
    pub fn is_empty_slot(&self, slot: usize) -> bool {
        self.slots.get(slot).copied() == Some(EMPTY)
    }

    /// Number of slots currently holding a fact.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|&&v| v != EMPTY).count()
    }
}

impl Default for SharedChannel {
    fn default() -> Self {
        Self::new()
    }
}
