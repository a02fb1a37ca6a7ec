//! Shared type definitions for the Converge swarm protocol.
//!
//! This crate is the single source of truth for the types exchanged between
//! the protocol core (`converge-comms`) and its external collaborators: the
//! round driver that supplies sensed observations, and the decision logic
//! that consumes the reconciled world model.
//!
//! # Modules
//!
//! - [`location`] -- Grid coordinates and squared-distance math
//! - [`enums`] -- Tile states, tracked-object categories, fact classes
//! - [`facts`] -- External object identifiers and the broadcast [`Fact`] type
//! - [`observation`] -- Per-round sensed-world payload from the driver
//!
//! [`Fact`]: facts::Fact

pub mod enums;
pub mod facts;
pub mod location;
pub mod observation;

// Re-export all public types at crate root for convenience.
pub use enums::{FactClass, TileState, TrackedCategory};
pub use facts::{Fact, ObjectId};
pub use location::GridLocation;
pub use observation::{Observations, SensedTile, SensedTracked};
