//! Per-kind behaviour.
//!
//! Regular agents and the leader always act truthfully. Malicious agents roll
//! a fresh [`TaskMode`] for every task they execute and may lie about where
//! things are, which side they hold and what they saw.

use serde::{Deserialize, Serialize};
use swarm_events::Vec2;

use crate::environment::Rect;
use crate::rng::SimRng;
use crate::sides::ObjectSide;

/// How a malicious agent carries out one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    Correct,
    /// Random position reports, ignored move commands
    Falsified,
    /// Accurate only towards other malicious agents
    Colluding,
}

/// Behaviour that differs between agent kinds.
pub trait AgentBehavior {
    /// Whether received messages skip the trust gate.
    fn bypasses_trust_gate(&self) -> bool {
        false
    }

    fn task_mode(&self, _rng: &mut SimRng) -> TaskMode {
        TaskMode::Correct
    }

    /// Side the agent claims to hold when asked.
    fn reported_side(&self, actual: Option<ObjectSide>, _rng: &mut SimRng) -> Option<ObjectSide> {
        actual
    }

    /// Position the agent reports to a peer.
    fn report_position(
        &self,
        actual: Vec2,
        _recipient_malicious: bool,
        _bounds: &Rect,
        _rng: &mut SimRng,
    ) -> Vec2 {
        actual
    }

    /// Whether a move command is carried out.
    fn follows_move_command(&self, _rng: &mut SimRng) -> bool {
        true
    }

    /// Behaviour verdicts the agent records after watching a peer.
    fn observe(&self, verdicts: Vec<bool>, _subject_malicious: bool, _rng: &mut SimRng) -> Vec<bool> {
        verdicts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Regular;

impl AgentBehavior for Regular {}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Leader;

impl AgentBehavior for Leader {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Malicious {
    /// Chance that a task is carried out dishonestly
    pub behaviour_probability: f64,
    /// Given dishonesty, chance of colluding rather than falsifying
    pub collusion_probability: f64,
}

impl Default for Malicious {
    fn default() -> Self {
        Self {
            behaviour_probability: 0.5,
            collusion_probability: 0.5,
        }
    }
}

impl AgentBehavior for Malicious {
    fn bypasses_trust_gate(&self) -> bool {
        true
    }

    fn task_mode(&self, rng: &mut SimRng) -> TaskMode {
        if !rng.chance(self.behaviour_probability) {
            return TaskMode::Correct;
        }
        if rng.chance(self.collusion_probability) {
            TaskMode::Colluding
        } else {
            TaskMode::Falsified
        }
    }

    fn reported_side(&self, actual: Option<ObjectSide>, rng: &mut SimRng) -> Option<ObjectSide> {
        if rng.chance(self.behaviour_probability) {
            actual.map(ObjectSide::opposite)
        } else {
            actual
        }
    }

    fn report_position(
        &self,
        actual: Vec2,
        recipient_malicious: bool,
        bounds: &Rect,
        rng: &mut SimRng,
    ) -> Vec2 {
        match self.task_mode(rng) {
            TaskMode::Correct => actual,
            TaskMode::Colluding if recipient_malicious => actual,
            TaskMode::Colluding | TaskMode::Falsified => rng.point_in(bounds),
        }
    }

    fn follows_move_command(&self, rng: &mut SimRng) -> bool {
        self.task_mode(rng) == TaskMode::Correct
    }

    fn observe(&self, verdicts: Vec<bool>, subject_malicious: bool, rng: &mut SimRng) -> Vec<bool> {
        match self.task_mode(rng) {
            TaskMode::Correct => verdicts,
            TaskMode::Falsified => verdicts.into_iter().map(|v| !v).collect(),
            // Cover for accomplices, frame everyone else
            TaskMode::Colluding => vec![subject_malicious; verdicts.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_lying_agent_reports_opposite_side() {
        let liar = Malicious {
            behaviour_probability: 1.0,
            collusion_probability: 0.0,
        };
        let mut rng = SimRng::seeded(7);
        for side in ObjectSide::ALL {
            for _ in 0..50 {
                assert_eq!(liar.reported_side(Some(side), &mut rng), Some(side.opposite()));
            }
        }
        assert_eq!(liar.reported_side(None, &mut rng), None);
    }

    #[test]
    fn test_honest_kinds_never_lie() {
        let mut rng = SimRng::seeded(1);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let p = Vec2::new(3.0, 4.0);
        for behavior in [&Regular as &dyn AgentBehavior, &Leader] {
            assert!(!behavior.bypasses_trust_gate());
            assert_eq!(behavior.report_position(p, false, &bounds, &mut rng), p);
            assert_eq!(behavior.reported_side(Some(ObjectSide::Left), &mut rng), Some(ObjectSide::Left));
            assert!(behavior.follows_move_command(&mut rng));
            assert_eq!(behavior.observe(vec![true, false], false, &mut rng), vec![true, false]);
        }
    }

    #[test]
    fn test_colluder_is_honest_with_accomplices() {
        let colluder = Malicious {
            behaviour_probability: 1.0,
            collusion_probability: 1.0,
        };
        let mut rng = SimRng::seeded(3);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let p = Vec2::new(10.0, 20.0);
        assert_eq!(colluder.report_position(p, true, &bounds, &mut rng), p);
        let lie = colluder.report_position(p, false, &bounds, &mut rng);
        assert!(bounds.contains(lie));
        assert_eq!(colluder.observe(vec![true, true], false, &mut rng), vec![false, false]);
        assert_eq!(colluder.observe(vec![false], true, &mut rng), vec![true]);
        assert!(!colluder.follows_move_command(&mut rng));
    }

    #[test]
    fn test_harmless_malicious_agent_acts_correctly() {
        let dormant = Malicious {
            behaviour_probability: 0.0,
            collusion_probability: 1.0,
        };
        let mut rng = SimRng::seeded(5);
        assert_eq!(dormant.task_mode(&mut rng), TaskMode::Correct);
        assert_eq!(dormant.reported_side(Some(ObjectSide::Top), &mut rng), Some(ObjectSide::Top));
    }
}
