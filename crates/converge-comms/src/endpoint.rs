//! One agent's connection to the shared channel.
//!
//! A [`CommsEndpoint`] owns the agent's world model and staging queue and
//! drives the three phases of its turn in fixed order: read, derive,
//! write. The external round driver calls the phases; the endpoint never
//! touches the channel outside them.
//!
//! # Slot stewardship
//!
//! Every slot an endpoint writes is remembered and released (reset to
//! empty) at the start of its next write phase, before new facts are
//! placed. Facts therefore live on the channel for exactly one full cycle
//! of the writer, long enough for every peer to take one read phase, and
//! the channel never accumulates garbage that only a channel-wide sweep
//! could reclaim.

use tracing::debug;

use converge_types::{Observations, TrackedCategory};

use crate::channel::{ChannelRegion, SharedChannel, CHANNEL_SLOTS, EMPTY, region_of};
use crate::codec;
use crate::config::ProtocolConfig;
use crate::error::CommsError;
use crate::model::LocalWorldModel;
use crate::outbound::OutboundQueue;

/// Per-agent protocol endpoint: world model, staging queue, and the slots
/// currently owned on the channel.
#[derive(Debug, Clone)]
pub struct CommsEndpoint {
    model: LocalWorldModel,
    outbound: OutboundQueue,
    /// Slots written during the previous write phase, to release next time.
    written: Vec<usize>,
}

impl CommsEndpoint {
    /// Create an endpoint with an empty model and queue.
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            model: LocalWorldModel::new(config),
            outbound: OutboundQueue::new(config.queue_capacity),
            written: Vec::new(),
        }
    }

    /// Read phase: decode every occupied slot and merge it into the world
    /// model, then expire tracked records that outlived their lifetime.
    ///
    /// Facts this agent wrote itself are re-read and re-merged; merge
    /// idempotence makes that harmless.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::MalformedEncoding`] if a slot holds a value no
    /// conforming writer could have produced. Every writer shares this
    /// codec, so a malformed slot is a logic error, not line noise.
    pub fn read_phase(&mut self, channel: &SharedChannel, round: u32) -> Result<(), CommsError> {
        for slot in 0..CHANNEL_SLOTS {
            let value = channel.read(slot)?;
            if value == EMPTY {
                continue;
            }
            let fact = codec::decode(value, region_of(slot))?;
            self.model.merge(&fact, round);
        }
        self.model.expire_tracked(round);
        Ok(())
    }

    /// Derive phase: fold the agent's own sensor readings into the model
    /// and stage anything genuinely new for broadcast.
    ///
    /// # Errors
    ///
    /// Propagates [`CommsError::TrackedCapacityExceeded`] from the model.
    pub fn derive_phase(&mut self, observations: &Observations) -> Result<(), CommsError> {
        self.model.derive(observations, &mut self.outbound)
    }

    /// Write phase: release the slots written last time, then fill empty
    /// slots from the staging queue, priority regions first.
    ///
    /// Each priority region takes only facts of its own category; the bulk
    /// region drains the bulk class. Within each region the scan takes the
    /// lowest empty slot, skipping slots held by other writers. Staged
    /// facts that find no room simply wait for a later round.
    ///
    /// Returns the number of facts placed.
    ///
    /// # Errors
    ///
    /// Returns [`CommsError::EncodingOutOfRange`] if a staged fact cannot
    /// be encoded. The queue only ever holds facts the model accepted, so
    /// this is a logic error.
    pub fn write_phase(&mut self, channel: &mut SharedChannel) -> Result<usize, CommsError> {
        for slot in self.written.drain(..) {
            channel.clear(slot)?;
        }

        let mut placed = 0_usize;
        for category in [TrackedCategory::Own, TrackedCategory::Foreign] {
            let region = ChannelRegion::for_category(category);
            for slot in region.range() {
                if !channel.is_empty_slot(slot) {
                    continue;
                }
                let Some(fact) = self.outbound.pop_priority_for(category) else {
                    break;
                };
                channel.write(slot, codec::encode(&fact)?)?;
                self.written.push(slot);
                placed = placed.saturating_add(1);
            }
        }

        for slot in ChannelRegion::Bulk.range() {
            if !channel.is_empty_slot(slot) {
                continue;
            }
            let Some(fact) = self.outbound.pop_bulk() else {
                break;
            };
            channel.write(slot, codec::encode(&fact)?)?;
            self.written.push(slot);
            placed = placed.saturating_add(1);
        }

        if !self.outbound.is_empty() {
            debug!(
                priority = self.outbound.priority_len(),
                bulk = self.outbound.bulk_len(),
                "channel full, staged facts carried to next round"
            );
        }
        Ok(placed)
    }

    /// The reconciled world model, for decision logic.
    pub const fn model(&self) -> &LocalWorldModel {
        &self.model
    }

    /// Number of facts staged but not yet placed on the channel.
    pub fn pending(&self) -> usize {
        self.outbound
            .priority_len()
            .saturating_add(self.outbound.bulk_len())
    }
}
