//! Error types for the `converge-comms` crate.
//!
//! The taxonomy separates fatal logic errors (conditions the domain
//! invariants say should never occur, surfaced so the round driver can log
//! them and abort the agent's round) from recoverable conditions, which are
//! handled locally and never reach a caller: bandwidth exhaustion requeues
//! facts, duplicate broadcasts are absorbed by the idempotent merge, and a
//! saturated sighting list drops the observation.

use converge_types::{ObjectId, TrackedCategory};

/// Errors surfaced by the protocol core.
///
/// Every variant is a fatal logic error: it indicates a violated domain
/// invariant or a corrupted channel value, not an expected runtime
/// condition. The driver catches these at the round boundary; they abort
/// one agent's round, never the match.
#[derive(Debug, thiserror::Error)]
pub enum CommsError {
    /// Every compact index of a category is occupied by a live identity,
    /// yet a new identifier asked to be bound. The "at most K simultaneous
    /// tracked objects per category" invariant has been violated upstream.
    #[error("no free {category:?} index for identity {id}: all slots hold live bindings")]
    TrackedCapacityExceeded {
        /// The saturated category.
        category: TrackedCategory,
        /// The identifier that could not be bound.
        id: ObjectId,
    },

    /// A channel slot held a value whose fact tag or payload lies outside
    /// every valid encoding range. Writers only store `encode` output, so
    /// this means the channel was corrupted.
    #[error("slot value {value} is not a valid encoding in the {context} region")]
    MalformedEncoding {
        /// The offending raw slot value.
        value: u16,
        /// Which channel region the value was read from.
        context: &'static str,
    },

    /// A fact was asked to encode with a payload outside its declared
    /// bounds (e.g. a coordinate beyond the maximum map dimension).
    #[error("fact cannot be encoded: {context}")]
    EncodingOutOfRange {
        /// What exceeded its bound.
        context: &'static str,
    },

    /// A channel access referenced a slot index at or beyond the channel
    /// width.
    #[error("slot index {slot} is outside the {width}-slot channel")]
    SlotOutOfRange {
        /// The offending slot index.
        slot: usize,
        /// The channel width.
        width: usize,
    },
}
