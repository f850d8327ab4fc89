//! Agent behaviour table.
//!
//! ```text
//! SEARCHING ──obstacle──▶ OBSTACLE_AVOIDANCE ──clear──▶ SEARCHING
//! SEARCHING ──object──▶ OBJECT_FOUND ──at side──▶ IDLE ──4 sides──▶ PLANNING
//! PLANNING ──▶ TRANSPORTING ──leg done──▶ PLANNING
//! TRANSPORTING ──side vacated──▶ IDLE
//! TRANSPORTING ──object at base──▶ RETURNING_HOME ──at base──▶ SEARCHING
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GuardDomain, StateTable, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    Searching,
    ObstacleAvoidance,
    ObjectFound,
    Idle,
    Planning,
    Transporting,
    ReturningHome,
}

impl AgentState {
    pub const ALL: [AgentState; 7] = [
        AgentState::Searching,
        AgentState::ObstacleAvoidance,
        AgentState::ObjectFound,
        AgentState::Idle,
        AgentState::Planning,
        AgentState::Transporting,
        AgentState::ReturningHome,
    ];
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentState::Searching => "SEARCHING",
            AgentState::ObstacleAvoidance => "OBSTACLE_AVOIDANCE",
            AgentState::ObjectFound => "OBJECT_FOUND",
            AgentState::Idle => "IDLE",
            AgentState::Planning => "PLANNING",
            AgentState::Transporting => "TRANSPORTING",
            AgentState::ReturningHome => "RETURNING_HOME",
        };
        f.write_str(name)
    }
}

/// Snapshot of everything the guards look at, sensed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardInputs {
    pub return_home_requested: bool,
    pub obstacle_nearby: bool,
    pub object_detected: bool,
    pub has_assigned_side: bool,
    pub at_assigned_side: bool,
    pub all_sides_occupied: bool,
    pub trajectory_complete: bool,
    pub object_at_base: bool,
    pub at_base: bool,
}

impl GuardInputs {
    const FLAGS: u32 = 9;

    fn from_bits(bits: u32) -> Self {
        let bit = |n: u32| bits & (1 << n) != 0;
        Self {
            return_home_requested: bit(0),
            obstacle_nearby: bit(1),
            object_detected: bit(2),
            has_assigned_side: bit(3),
            at_assigned_side: bit(4),
            all_sides_occupied: bit(5),
            trajectory_complete: bit(6),
            object_at_base: bit(7),
            at_base: bit(8),
        }
    }
}

impl GuardDomain for GuardInputs {
    fn enumerate() -> Vec<Self> {
        (0..1u32 << Self::FLAGS).map(Self::from_bits).collect()
    }
}

fn return_home(i: &GuardInputs) -> bool {
    i.return_home_requested
}

fn obstacle(i: &GuardInputs) -> bool {
    !i.return_home_requested && i.obstacle_nearby
}

fn object_found(i: &GuardInputs) -> bool {
    !i.return_home_requested
        && !i.obstacle_nearby
        && i.object_detected
        && !i.all_sides_occupied
        && !i.object_at_base
}

fn path_clear(i: &GuardInputs) -> bool {
    !i.obstacle_nearby
}

fn parked(i: &GuardInputs) -> bool {
    i.has_assigned_side && i.at_assigned_side
}

fn no_side_left(i: &GuardInputs) -> bool {
    !i.has_assigned_side && (i.all_sides_occupied || i.object_at_base)
}

fn team_ready(i: &GuardInputs) -> bool {
    i.has_assigned_side && i.all_sides_occupied && !i.object_at_base
}

fn side_lost(i: &GuardInputs) -> bool {
    !i.has_assigned_side
}

fn always(_: &GuardInputs) -> bool {
    true
}

fn delivered(i: &GuardInputs) -> bool {
    i.object_at_base
}

fn side_vacated(i: &GuardInputs) -> bool {
    !i.object_at_base && !i.all_sides_occupied
}

fn leg_done(i: &GuardInputs) -> bool {
    !i.object_at_base && i.all_sides_occupied && i.trajectory_complete
}

fn home(i: &GuardInputs) -> bool {
    i.at_base && !i.object_at_base && !i.return_home_requested
}

/// The transport mission as a state table.
pub fn agent_state_table() -> StateTable<AgentState, GuardInputs> {
    use AgentState::*;

    StateTable::<AgentState, GuardInputs>::builder()
        .ordered(
            Searching,
            vec![
                Transition::new(ReturningHome, return_home, "return_home_requested"),
                Transition::new(ObstacleAvoidance, obstacle, "obstacle_nearby"),
                Transition::new(ObjectFound, object_found, "object_detected"),
            ],
        )
        .single(
            ObstacleAvoidance,
            Transition::new(Searching, path_clear, "path_clear"),
        )
        .ordered(
            ObjectFound,
            vec![
                Transition::new(Idle, parked, "at_assigned_side"),
                Transition::new(Searching, no_side_left, "no_side_left"),
            ],
        )
        .ordered(
            Idle,
            vec![
                Transition::new(Planning, team_ready, "all_sides_occupied"),
                Transition::new(Searching, side_lost, "side_released"),
            ],
        )
        .single(Planning, Transition::new(Transporting, always, "planned"))
        .ordered(
            Transporting,
            vec![
                Transition::new(ReturningHome, delivered, "object_at_base"),
                Transition::new(Idle, side_vacated, "side_vacated"),
                Transition::new(Planning, leg_done, "leg_complete"),
            ],
        )
        .single(ReturningHome, Transition::new(Searching, home, "at_base"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::StateMachine;
    use std::sync::Arc;

    #[test]
    fn test_table_builds_and_covers_every_state() {
        let table = agent_state_table();
        let states: Vec<_> = table.states().collect();
        assert_eq!(states, AgentState::ALL.to_vec());
    }

    #[test]
    fn test_domain_is_exhaustive() {
        let all = GuardInputs::enumerate();
        assert_eq!(all.len(), 512);
        assert_eq!(all[0], GuardInputs::default());
    }

    #[test]
    fn test_searching_priorities() {
        let table = agent_state_table();
        let mut inputs = GuardInputs {
            object_detected: true,
            ..Default::default()
        };
        assert_eq!(
            table.evaluate(AgentState::Searching, &inputs),
            Some(AgentState::ObjectFound)
        );

        inputs.obstacle_nearby = true;
        assert_eq!(
            table.evaluate(AgentState::Searching, &inputs),
            Some(AgentState::ObstacleAvoidance)
        );

        inputs.return_home_requested = true;
        assert_eq!(
            table.evaluate(AgentState::Searching, &inputs),
            Some(AgentState::ReturningHome)
        );

        let crowded = GuardInputs {
            object_detected: true,
            all_sides_occupied: true,
            ..Default::default()
        };
        assert_eq!(table.evaluate(AgentState::Searching, &crowded), None);
    }

    #[test]
    fn test_transport_cycle() {
        let table = agent_state_table();
        let ready = GuardInputs {
            has_assigned_side: true,
            at_assigned_side: true,
            all_sides_occupied: true,
            ..Default::default()
        };
        assert_eq!(table.evaluate(AgentState::Idle, &ready), Some(AgentState::Planning));
        assert_eq!(
            table.evaluate(AgentState::Planning, &ready),
            Some(AgentState::Transporting)
        );
        assert_eq!(table.evaluate(AgentState::Transporting, &ready), None);

        let leg_done = GuardInputs {
            trajectory_complete: true,
            ..ready
        };
        assert_eq!(
            table.evaluate(AgentState::Transporting, &leg_done),
            Some(AgentState::Planning)
        );

        let vacated = GuardInputs {
            all_sides_occupied: false,
            ..ready
        };
        assert_eq!(
            table.evaluate(AgentState::Transporting, &vacated),
            Some(AgentState::Idle)
        );

        let delivered = GuardInputs {
            object_at_base: true,
            ..ready
        };
        assert_eq!(
            table.evaluate(AgentState::Transporting, &delivered),
            Some(AgentState::ReturningHome)
        );
    }

    #[test]
    fn test_transition_pure_for_every_state_and_input() {
        let table = Arc::new(agent_state_table());
        for state in AgentState::ALL {
            let machine = StateMachine::new(Arc::clone(&table), state);
            for inputs in GuardInputs::enumerate() {
                assert_eq!(machine.transition(&inputs), machine.transition(&inputs));
            }
            assert_eq!(machine.current(), state);
        }
    }

    #[test]
    fn test_display_matches_serde() {
        for state in AgentState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
