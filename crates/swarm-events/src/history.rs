//! Trust History Export
//!
//! Per-agent trust history written at the end of a run. A later run can be
//! seeded with it so agents start from the trust state they ended with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{AgentId, Interaction, SimTimestamp};

/// Interactions one agent recorded, keyed by peer label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentTrustHistory {
    pub agent_id: AgentId,
    #[serde(default)]
    pub peers: BTreeMap<String, Vec<Interaction>>,
}

impl AgentTrustHistory {
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            peers: BTreeMap::new(),
        }
    }

    /// Total number of interactions across all peers.
    pub fn interaction_count(&self) -> usize {
        self.peers.values().map(Vec::len).sum()
    }
}

/// Complete export for one run, keyed by agent label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustHistoryExport {
    pub run_id: Uuid,
    pub seed: u64,
    pub exported_at: SimTimestamp,
    pub agents: BTreeMap<String, AgentTrustHistory>,
}

impl TrustHistoryExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn agent(&self, label: &str) -> Option<&AgentTrustHistory> {
        self.agents.get(label)
    }
}
