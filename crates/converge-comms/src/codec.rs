//! Bijective mapping between a [`Fact`] and a bounded `u16` channel value.
//!
//! Encoding is fixed-radix: the payload and both coordinates are mixed as
//! `v = (payload * RADIX + x) * RADIX + y`, then the fact tag is appended
//! with `v * FACT_TAGS + tag`. Identity bindings, which carry no
//! coordinates, pack `(id * TRACKED_PER_CATEGORY + index)` in place of the
//! positional mix.
//!
//! The tracked-object category is deliberately not part of the value: the
//! channel region a fact occupies supplies it on decode. Without that trick
//! a binding for a large external id would not fit 16 bits.
//!
//! All pack/unpack arithmetic lives in this one module; `const` assertions
//! below prove that every valid encoding fits `u16` and that no valid
//! encoding collides with the channel's empty sentinel.

use converge_types::location::MAX_MAP_DIMENSION;
use converge_types::{Fact, GridLocation, ObjectId, TileState};

use crate::channel::{ChannelRegion, EMPTY};
use crate::error::CommsError;

/// Coordinate/payload radix: one past the largest encodable coordinate.
const RADIX: u32 = 60;

/// Number of fact tags appended in the lowest radix position.
const FACT_TAGS: u32 = 4;

/// Compact tracked-object indices per category. Also the radix separating
/// the external id from the index inside a binding encoding.
pub const TRACKED_PER_CATEGORY: u8 = 3;

// Fact tags, lowest radix position of every encoding.
const TAG_TILE: u32 = 0;
const TAG_SIGHTING: u32 = 1;
const TAG_POSITION: u32 = 2;
const TAG_BINDING: u32 = 3;

// Bounds proof. The largest value of each fact kind must fit u16, and the
// smallest must stay above the empty sentinel.
const MAX_COORD: u32 = RADIX - 1;
const MAX_RAW_ID: u32 = ObjectId::MAX_RAW as u32;
const INDEX_RADIX: u32 = TRACKED_PER_CATEGORY as u32;
const MAX_TILE_ENCODED: u32 = (((3 * RADIX + MAX_COORD) * RADIX + MAX_COORD) * FACT_TAGS) + TAG_TILE;
const MAX_SIGHTING_ENCODED: u32 = (((MAX_COORD) * RADIX + MAX_COORD) * FACT_TAGS) + TAG_SIGHTING;
const MAX_POSITION_ENCODED: u32 =
    (((2 * RADIX + MAX_COORD) * RADIX + MAX_COORD) * FACT_TAGS) + TAG_POSITION;
const MAX_BINDING_ENCODED: u32 =
    ((((MAX_RAW_ID - 1) * INDEX_RADIX) + (INDEX_RADIX - 1)) * FACT_TAGS) + TAG_BINDING;

const MIN_TILE_ENCODED: u32 = RADIX * RADIX * FACT_TAGS; // Wall at (0, 0)

const _: () = assert!(MAX_MAP_DIMENSION == 60, "codec radix out of sync with map bound");
const _: () = assert!(MAX_TILE_ENCODED <= u16::MAX as u32);
const _: () = assert!(MAX_SIGHTING_ENCODED <= u16::MAX as u32);
const _: () = assert!(MAX_POSITION_ENCODED <= u16::MAX as u32);
const _: () = assert!(MAX_BINDING_ENCODED <= u16::MAX as u32);
const _: () = assert!(MIN_TILE_ENCODED > EMPTY as u32);
const _: () = assert!(TAG_SIGHTING > EMPTY as u32); // sighting at (0, 0)
const _: () = assert!(TAG_POSITION > EMPTY as u32); // index 0 at (0, 0)
const _: () = assert!(TAG_BINDING > EMPTY as u32); // id 0, index 0

/// Pack a fact into its channel value.
///
/// # Errors
///
/// Returns [`CommsError::EncodingOutOfRange`] if a coordinate, payload,
/// index, or external id exceeds its declared bound.
pub fn encode(fact: &Fact) -> Result<u16, CommsError> {
    match *fact {
        Fact::Tile { state, location } => {
            let payload = state.payload();
            if payload == 0 {
                return Err(CommsError::EncodingOutOfRange {
                    context: "unknown tiles are never broadcast",
                });
            }
            pack_positional(u32::from(payload), location, TAG_TILE)
        }
        Fact::Sighting { location } => pack_positional(0, location, TAG_SIGHTING),
        Fact::TrackedPosition {
            index, location, ..
        } => {
            if index >= TRACKED_PER_CATEGORY {
                return Err(CommsError::EncodingOutOfRange {
                    context: "tracked index exceeds slot count",
                });
            }
            pack_positional(u32::from(index), location, TAG_POSITION)
        }
        Fact::IdentityBinding { id, index, .. } => {
            if index >= TRACKED_PER_CATEGORY {
                return Err(CommsError::EncodingOutOfRange {
                    context: "tracked index exceeds slot count",
                });
            }
            if id.into_inner() >= ObjectId::MAX_RAW {
                return Err(CommsError::EncodingOutOfRange {
                    context: "external id exceeds the arena ceiling",
                });
            }
            let mixed = u32::from(id.into_inner())
                .checked_mul(u32::from(TRACKED_PER_CATEGORY))
                .and_then(|v| v.checked_add(u32::from(index)))
                .ok_or(CommsError::EncodingOutOfRange {
                    context: "binding payload overflow",
                })?;
            finish(mixed, TAG_BINDING)
        }
    }
}

/// Unpack a channel value read from the given region.
///
/// The region supplies the tracked-object category for position and
/// binding facts, and doubles as a consistency check: a priority-class
/// tag in the bulk region (or vice versa) is a corrupted channel.
///
/// # Errors
///
/// Returns [`CommsError::MalformedEncoding`] for any value no writer could
/// have produced in that region.
pub fn decode(value: u16, region: ChannelRegion) -> Result<Fact, CommsError> {
    let malformed = || CommsError::MalformedEncoding {
        value,
        context: region.name(),
    };

    let wide = u32::from(value);
    let tag = wide.checked_rem(FACT_TAGS).unwrap_or(0);
    let rest = wide.checked_div(FACT_TAGS).unwrap_or(0);

    match tag {
        TAG_TILE => {
            let (payload, location) = unpack_positional(rest);
            if region != ChannelRegion::Bulk {
                return Err(malformed());
            }
            let code = u16::try_from(payload).map_err(|_err| malformed())?;
            let state = TileState::from_payload(code).ok_or_else(malformed)?;
            Ok(Fact::Tile { state, location })
        }
        TAG_SIGHTING => {
            let (payload, location) = unpack_positional(rest);
            if region != ChannelRegion::Bulk || payload != 0 {
                return Err(malformed());
            }
            Ok(Fact::Sighting { location })
        }
        TAG_POSITION => {
            let (payload, location) = unpack_positional(rest);
            let category = region.category().ok_or_else(malformed)?;
            let index = u8::try_from(payload).map_err(|_err| malformed())?;
            if index >= TRACKED_PER_CATEGORY {
                return Err(malformed());
            }
            Ok(Fact::TrackedPosition {
                category,
                index,
                location,
            })
        }
        TAG_BINDING => {
            let category = region.category().ok_or_else(malformed)?;
            let index_wide = rest
                .checked_rem(u32::from(TRACKED_PER_CATEGORY))
                .unwrap_or(0);
            let id_wide = rest
                .checked_div(u32::from(TRACKED_PER_CATEGORY))
                .unwrap_or(0);
            let index = u8::try_from(index_wide).map_err(|_err| malformed())?;
            let raw_id = u16::try_from(id_wide).map_err(|_err| malformed())?;
            if raw_id >= ObjectId::MAX_RAW {
                return Err(malformed());
            }
            Ok(Fact::IdentityBinding {
                category,
                id: ObjectId(raw_id),
                index,
            })
        }
        _ => Err(malformed()),
    }
}

/// Mix a payload and a location, then append the tag.
fn pack_positional(payload: u32, location: GridLocation, tag: u32) -> Result<u16, CommsError> {
    if u32::from(location.x) >= RADIX || u32::from(location.y) >= RADIX {
        return Err(CommsError::EncodingOutOfRange {
            context: "coordinate exceeds the maximum map dimension",
        });
    }
    let mixed = payload
        .checked_mul(RADIX)
        .and_then(|v| v.checked_add(u32::from(location.x)))
        .and_then(|v| v.checked_mul(RADIX))
        .and_then(|v| v.checked_add(u32::from(location.y)))
        .ok_or(CommsError::EncodingOutOfRange {
            context: "positional payload overflow",
        })?;
    finish(mixed, tag)
}

/// Append the tag radix position and narrow to the channel's `u16`.
fn finish(mixed: u32, tag: u32) -> Result<u16, CommsError> {
    let value = mixed
        .checked_mul(FACT_TAGS)
        .and_then(|v| v.checked_add(tag))
        .ok_or(CommsError::EncodingOutOfRange {
            context: "encoded value overflow",
        })?;
    u16::try_from(value).map_err(|_err| CommsError::EncodingOutOfRange {
        context: "encoded value exceeds the 16-bit slot width",
    })
}

/// Inverse of [`pack_positional`] minus the tag, which the caller has
/// already stripped.
fn unpack_positional(rest: u32) -> (u32, GridLocation) {
    let y = rest.checked_rem(RADIX).unwrap_or(0);
    let without_y = rest.checked_div(RADIX).unwrap_or(0);
    let x = without_y.checked_rem(RADIX).unwrap_or(0);
    let payload = without_y.checked_div(RADIX).unwrap_or(0);
    // Both remainders are < RADIX = 60, so the narrowing cannot fail.
    let location = GridLocation::new(
        u8::try_from(x).unwrap_or(0),
        u8::try_from(y).unwrap_or(0),
    );
    (payload, location)
}
