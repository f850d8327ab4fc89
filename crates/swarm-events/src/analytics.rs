//! Analytics Records
//!
//! Read-only records the engine accumulates for external consumers: the
//! message accept/reject log, per-tick reputation snapshots and per-peer trust
//! series samples.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{AgentId, SimTimestamp};

/// Kind of a message exchanged between agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    MoveToLocation,
    ChangeBehavior,
    Localization,
    ReportStatus,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::MoveToLocation => write!(f, "MOVE_TO_LOCATION"),
            MessageKind::ChangeBehavior => write!(f, "CHANGE_BEHAVIOR"),
            MessageKind::Localization => write!(f, "LOCALIZATION"),
            MessageKind::ReportStatus => write!(f, "REPORT_STATUS"),
        }
    }
}

/// One received message and whether the receiver acted on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub from: AgentId,
    pub to: AgentId,
    pub kind: MessageKind,
    pub is_from_malicious: bool,
    pub was_accepted: bool,
    pub timestamp: SimTimestamp,
}

/// Authority reputations of every agent at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub timestamp: SimTimestamp,
    pub reputations: BTreeMap<AgentId, f64>,
}

/// A point in a trust-score time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustSample {
    pub timestamp: SimTimestamp,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_wire_names() {
        let json = serde_json::to_string(&MessageKind::MoveToLocation).unwrap();
        assert_eq!(json, "\"MOVE_TO_LOCATION\"");
        assert_eq!(MessageKind::ReportStatus.to_string(), "REPORT_STATUS");
    }
}
