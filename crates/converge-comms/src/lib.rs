//! Bounded shared-channel broadcast and reconciliation for swarm agents.
//!
//! A swarm of agents shares one 64-slot array of `u16` values. Each agent
//! takes turns in rounds; on its turn it reads the whole channel, merges
//! what peers have published into its own world model, folds in its own
//! sensor readings, and writes whatever is genuinely new into free slots.
//! Every agent converges on a shared picture of the arena without any
//! central coordinator or point-to-point messaging.
//!
//! # Round anatomy
//!
//! 1. [`CommsEndpoint::read_phase`] -- decode and merge every occupied
//!    slot, then expire tracked records past their lifetime.
//! 2. [`CommsEndpoint::derive_phase`] -- reconcile the agent's own
//!    [`Observations`] against the model; stage new facts for broadcast.
//! 3. [`CommsEndpoint::write_phase`] -- release last round's slots, then
//!    place staged facts, priority regions first.
//!
//! # Module map
//!
//! - [`channel`] -- the slot array, its region layout, and the empty sentinel
//! - [`codec`] -- fixed-radix packing of facts into `u16` values
//! - [`identity`] -- binding external identifiers to compact slot indices
//! - [`sightings`] -- decaying proximity-merged opponent sightings
//! - [`model`] -- the per-agent reconciled world model and its queries
//! - [`outbound`] -- the two-class bounded staging queue
//! - [`endpoint`] -- phase sequencing and channel slot stewardship
//! - [`config`] -- behavioral tuning knobs, loadable from YAML
//! - [`error`] -- the crate-wide error type
//!
//! [`Observations`]: converge_types::Observations

pub mod channel;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod model;
pub mod outbound;
pub mod sightings;

pub use channel::{ChannelRegion, SharedChannel, CHANNEL_SLOTS, EMPTY};
pub use config::ProtocolConfig;
pub use endpoint::CommsEndpoint;
pub use error::CommsError;
pub use model::LocalWorldModel;
