//! Interaction Types
//!
//! An interaction is one piece of first-hand evidence an agent gathered about a
//! peer. Interactions are appended to the observer's trust record and never
//! modified afterwards.

use serde::{Deserialize, Serialize};

use crate::{AgentId, SimTimestamp, Vec2};

/// Value an agent expected or received during an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObservedValue {
    Scalar(f64),
    Vector(Vec2),
}

impl ObservedValue {
    /// Per-axis components, used for axis-wise error comparison.
    pub fn components(&self) -> Vec<f64> {
        match self {
            ObservedValue::Scalar(v) => vec![*v],
            ObservedValue::Vector(v) => vec![v.x, v.y],
        }
    }
}

impl From<Vec2> for ObservedValue {
    fn from(v: Vec2) -> Self {
        ObservedValue::Vector(v)
    }
}

impl From<f64> for ObservedValue {
    fn from(v: f64) -> Self {
        ObservedValue::Scalar(v)
    }
}

/// The situational factors an agent saw when it formed an opinion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub malicious_detected: u32,
    pub needed_robots: u32,
    pub explored_area_fraction: f64,
    pub object_found: bool,
    pub available_members: u32,
    pub total_members: u32,
    pub sensitivity_level: f64,
}

/// A single recorded interaction between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub from: AgentId,
    pub to: AgentId,
    /// `None` when the interaction carried no explicit verdict (e.g. a probe)
    pub outcome: Option<bool>,
    pub timestamp: SimTimestamp,
    pub context: ContextSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<ObservedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<ObservedValue>,
    /// One entry per observed behaviour; `false` marks a suspicious one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_behaviors: Option<Vec<bool>>,
    /// Trust score computed when the interaction was processed
    pub trust_score: f64,
}

impl Interaction {
    pub fn new(
        from: AgentId,
        to: AgentId,
        outcome: Option<bool>,
        timestamp: SimTimestamp,
        context: ContextSnapshot,
    ) -> Self {
        Self {
            from,
            to,
            outcome,
            timestamp,
            context,
            expected: None,
            received: None,
            observed_behaviors: None,
            trust_score: 0.0,
        }
    }

    /// Attaches the value the observer expected and the value it received.
    pub fn with_values(
        mut self,
        expected: impl Into<ObservedValue>,
        received: Option<ObservedValue>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.received = received;
        self
    }

    pub fn with_behaviors(mut self, behaviors: Vec<bool>) -> Self {
        self.observed_behaviors = Some(behaviors);
        self
    }

    /// True when the interaction holds any first-hand evidence.
    pub fn carries_evidence(&self) -> bool {
        self.outcome.is_some()
            || self.expected.is_some()
            || self
                .observed_behaviors
                .as_ref()
                .is_some_and(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_carries_no_evidence() {
        let probe = Interaction::new(
            AgentId(0),
            AgentId(1),
            None,
            SimTimestamp::default(),
            ContextSnapshot::default(),
        );
        assert!(!probe.carries_evidence());

        let observed = probe.clone().with_behaviors(vec![true]);
        assert!(observed.carries_evidence());

        let empty = probe.with_behaviors(Vec::new());
        assert!(!empty.carries_evidence());
    }

    #[test]
    fn test_optional_fields_skipped_in_json() {
        let interaction = Interaction::new(
            AgentId(2),
            AgentId(3),
            Some(true),
            SimTimestamp::new(4, 0.4),
            ContextSnapshot::default(),
        );
        let json = serde_json::to_string(&interaction).unwrap();
        assert!(!json.contains("expected"));
        assert!(!json.contains("observed_behaviors"));

        let parsed: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, interaction);
    }

    #[test]
    fn test_value_components() {
        assert_eq!(ObservedValue::Scalar(2.0).components(), vec![2.0]);
        assert_eq!(
            ObservedValue::Vector(Vec2::new(1.0, -1.0)).components(),
            vec![1.0, -1.0]
        );
    }
}
