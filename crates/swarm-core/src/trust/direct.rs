//! Direct trust: what an agent concludes from its own experience.

use swarm_events::{Interaction, ObservedValue};

use super::{TrustComponent, TrustConstants, TrustRecord};

/// Mean per-axis relative error between what was expected and received.
///
/// Each axis contributes `|e - r| / (|e| + |r| + epsilon)`. Nothing received,
/// or a value of a different shape, counts as a total error of 1.
pub fn relative_error(
    expected: &ObservedValue,
    received: Option<&ObservedValue>,
    epsilon: f64,
) -> f64 {
    let Some(received) = received else {
        return 1.0;
    };
    let e = expected.components();
    let r = received.components();
    if e.len() != r.len() || e.is_empty() {
        return 1.0;
    }
    let total: f64 = e
        .iter()
        .zip(r.iter())
        .map(|(e, r)| (e - r).abs() / (e.abs() + r.abs() + epsilon))
        .sum();
    total / e.len() as f64
}

pub struct DirectTrust;

impl DirectTrust {
    /// Trust in the interaction's peer from `record` plus the new interaction.
    ///
    /// Present experience averages the communication and observation terms
    /// that have data; past experience is the record's score eroded to the
    /// interaction time. The component is not applied when neither the
    /// interaction nor the record holds any evidence.
    pub fn calculate(
        record: &TrustRecord,
        interaction: &Interaction,
        constants: &TrustConstants,
    ) -> TrustComponent {
        let past = record.eroded_score(
            interaction.timestamp,
            constants.init_trust_value,
            constants.erosion_rate,
        );

        let mut present_sum = 0.0;
        let mut present_weight = 0.0;
        if let Some(accuracy) = communication_term(interaction, constants.relative_error_epsilon) {
            present_sum += constants.communication_weight * accuracy;
            present_weight += constants.communication_weight;
        }
        if let Some(observation) = observation_term(interaction) {
            present_sum += constants.observation_weight * observation;
            present_weight += constants.observation_weight;
        }

        if present_weight <= 0.0 {
            return if record.has_evidence() {
                TrustComponent::applied(past)
            } else {
                TrustComponent::skipped(past)
            };
        }

        let present = present_sum / present_weight;
        let value = (constants.present_experience_weight * present
            + constants.past_experience_weight * past)
            / (constants.present_experience_weight + constants.past_experience_weight);
        TrustComponent::applied(value)
    }
}

/// Accuracy of what the peer communicated, if there is anything to judge.
fn communication_term(interaction: &Interaction, epsilon: f64) -> Option<f64> {
    if interaction.outcome == Some(false) {
        return Some(0.0);
    }
    if let Some(expected) = &interaction.expected {
        return Some(1.0 - relative_error(expected, interaction.received.as_ref(), epsilon));
    }
    interaction.outcome.map(|_| 1.0)
}

/// 1 when every observed behaviour was as expected, 0 otherwise.
fn observation_term(interaction: &Interaction) -> Option<f64> {
    let behaviors = interaction.observed_behaviors.as_ref()?;
    if behaviors.is_empty() {
        return None;
    }
    Some(if behaviors.iter().all(|ok| *ok) { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_events::{AgentId, ContextSnapshot, SimTimestamp, Vec2};

    fn interaction(outcome: Option<bool>) -> Interaction {
        Interaction::new(
            AgentId(0),
            AgentId(1),
            outcome,
            SimTimestamp::default(),
            ContextSnapshot::default(),
        )
    }

    fn fresh() -> TrustRecord {
        TrustRecord::new(0.5, SimTimestamp::default())
    }

    #[test]
    fn test_relative_error() {
        let e = ObservedValue::Vector(Vec2::new(100.0, 200.0));
        let same = ObservedValue::Vector(Vec2::new(100.0, 200.0));
        let far = ObservedValue::Vector(Vec2::new(1.0, 2.0));
        assert_eq!(relative_error(&e, Some(&same), 1e-9), 0.0);
        let err = relative_error(&e, Some(&far), 1e-9);
        assert!(err > 0.97 && err < 1.0);
        assert_eq!(relative_error(&e, None, 1e-9), 1.0);
        assert_eq!(relative_error(&e, Some(&ObservedValue::Scalar(1.0)), 1e-9), 1.0);

        let zero = ObservedValue::Scalar(0.0);
        assert_eq!(relative_error(&zero, Some(&zero), 1e-9), 0.0);
    }

    #[test]
    fn test_accurate_report_raises_direct_trust() {
        let c = TrustConstants::default();
        let i = interaction(Some(true)).with_values(
            Vec2::new(10.0, 10.0),
            Some(Vec2::new(10.0, 10.0).into()),
        );
        let direct = DirectTrust::calculate(&fresh(), &i, &c);
        assert!(direct.applied);
        assert!((direct.value - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_failed_outcome_zeroes_communication() {
        let c = TrustConstants::default();
        let i = interaction(Some(false)).with_values(
            Vec2::new(10.0, 10.0),
            Some(Vec2::new(10.0, 10.0).into()),
        );
        let direct = DirectTrust::calculate(&fresh(), &i, &c);
        assert!((direct.value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_suspicious_behaviour_zeroes_observation() {
        let c = TrustConstants::default();
        let good = interaction(None).with_behaviors(vec![true, true]);
        let bad = interaction(None).with_behaviors(vec![true, false]);
        let good = DirectTrust::calculate(&fresh(), &good, &c);
        let bad = DirectTrust::calculate(&fresh(), &bad, &c);
        assert!(good.value > 0.5);
        assert!(bad.value < 0.5);
    }

    #[test]
    fn test_probe_without_history_is_not_applied() {
        let c = TrustConstants::default();
        let direct = DirectTrust::calculate(&fresh(), &interaction(None), &c);
        assert!(!direct.applied);
        assert_eq!(direct.value, 0.5);
    }

    #[test]
    fn test_probe_with_history_uses_past_experience() {
        let c = TrustConstants::default();
        let mut record = fresh();
        let mut earlier = interaction(Some(true));
        earlier.trust_score = 0.9;
        record.push(earlier);

        let direct = DirectTrust::calculate(&record, &interaction(None), &c);
        assert!(direct.applied);
        assert!((direct.value - 0.9).abs() < 1e-12);
    }
}
