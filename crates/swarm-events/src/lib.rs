//! Shared data types for the trust-aware swarm simulation.
//!
//! This crate contains pure data structures with no simulation logic: agent
//! identifiers, vectors, timestamps, recorded interactions, the trust-history
//! export format and the analytics records that external consumers read.

pub mod analytics;
pub mod history;
pub mod interaction;
pub mod timestamp;
pub mod vector;

pub use analytics::{MessageKind, MessageLogEntry, ReputationSnapshot, TrustSample};
pub use history::{AgentTrustHistory, TrustHistoryExport};
pub use interaction::{ContextSnapshot, Interaction, ObservedValue};
pub use timestamp::SimTimestamp;
pub use vector::Vec2;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an agent in the swarm arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{}", self.0)
    }
}
