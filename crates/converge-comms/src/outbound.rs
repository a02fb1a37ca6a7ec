//! Per-agent staging area for facts not yet observed by others.
//!
//! Far more facts can be new in a round than the channel has free slots,
//! so staged facts wait here across rounds until the write phase finds
//! room. Two classes exist: priority (identity bindings and tracked
//! positions -- low volume, latency-sensitive) and bulk (tile discoveries
//! and sightings -- high volume, latency-tolerant). Each class pops most
//! recent first: fresh intelligence beats a backlog of old map tiles.
//!
//! Both classes are bounded; overflow evicts the oldest staged fact with a
//! warning. That is graceful degradation, never an error.

use std::collections::VecDeque;

use tracing::warn;

use converge_types::{Fact, FactClass, TrackedCategory};

/// Two-class bounded staging queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundQueue {
    priority: VecDeque<Fact>,
    bulk: VecDeque<Fact>,
    capacity: usize,
}

impl OutboundQueue {
    /// Create an empty queue; each class holds at most `capacity` facts.
    pub const fn new(capacity: usize) -> Self {
        Self {
            priority: VecDeque::new(),
            bulk: VecDeque::new(),
            capacity,
        }
    }

    /// Stage a fact in its class, evicting the oldest entry on overflow.
    pub fn push(&mut self, fact: Fact) {
        let capacity = self.capacity;
        let queue = match fact.class() {
            FactClass::Priority => &mut self.priority,
            FactClass::Bulk => &mut self.bulk,
        };
        if queue.len() >= capacity {
            if let Some(evicted) = queue.pop_front() {
                warn!(?evicted, "outbound queue full, oldest staged fact evicted");
            }
        }
        queue.push_back(fact);
    }

    /// Pop the most recently staged bulk fact.
    pub fn pop_bulk(&mut self) -> Option<Fact> {
        self.bulk.pop_back()
    }

    /// Pop the most recently staged priority fact for a category.
    ///
    /// The channel's priority regions are per-category, so the write scan
    /// asks for facts it can actually place in the region being filled.
    pub fn pop_priority_for(&mut self, category: TrackedCategory) -> Option<Fact> {
        let position = self
            .priority
            .iter()
            .rposition(|fact| fact.category() == Some(category))?;
        self.priority.remove(position)
    }

    /// Number of staged priority facts.
    pub fn priority_len(&self) -> usize {
        self.priority.len()
    }

    /// Number of staged bulk facts.
    pub fn bulk_len(&self) -> usize {
        self.bulk.len()
    }

    /// Whether nothing is staged in either class.
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.bulk.is_empty()
    }
}
