//! Turn-based object pushing.
//!
//! Each trajectory step names the side that pushes. Only the agent holding
//! that side moves the object; the rest keep station on theirs and watch.

use swarm_events::AgentId;
use tracing::{debug, info};

use crate::communication::{BehaviorRequest, MessageContent, OBSERVATION_SENSITIVITY};
use crate::sides::ObjectSide;

use super::Swarm;

impl Swarm {
    /// Takes `agent`'s turn in the push. Returns true when its push completed
    /// the current trajectory step.
    pub fn execute_turn_based_object_push(&mut self, agent: AgentId) -> bool {
        let Some(side) = self.sides.side_of(agent) else {
            return false;
        };
        let sim = &self.config.simulation;
        let (radius, speed, tolerance) = (sim.robot_radius, sim.robot_speed, sim.arrival_tolerance);
        let idx = agent.index();
        let station = side.offset_point(self.env.object(), radius);

        if self.planner.required_side() != Some(side) {
            let position = self.agents[idx].position;
            self.agents[idx].position = position.step_towards(station, speed);
            return false;
        }
        if self.agents[idx].position.distance(station) > tolerance {
            let position = self.agents[idx].position;
            self.agents[idx].position = position.step_towards(station, speed);
            return false;
        }

        let completed = self.planner.push_object(self.env.object_mut());
        let object = self.env.object().position;
        self.agents[idx].position = side.offset_point(self.env.object(), radius);
        self.env.mark_explored(object);
        if !completed {
            return false;
        }

        debug!(%agent, %side, step = self.planner.step_index(), "Push step completed");
        self.observe_push(agent, side);
        if self.env.object_at_base() {
            info!(%agent, ?object, "Object reached base");
            self.broadcast(
                agent,
                MessageContent::ChangeBehavior {
                    request: BehaviorRequest::ReturnHome,
                },
            );
        }
        true
    }

    /// Teammates in sensing range judge whether `pusher` pushed from the side
    /// it claims and record what they saw.
    fn observe_push(&mut self, pusher: AgentId, side: ObjectSide) {
        let reported = self.reported_assigned_side(pusher);
        let verdicts = vec![true, reported == Some(side)];
        let subject = self.agent_ref(pusher);
        let (origin, subject_malicious) = (subject.position, subject.is_malicious());
        let range = self.config.simulation.sensing_radius;

        let observers: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| {
                a.active
                    && a.id != pusher
                    && self.sides.side_of(a.id).is_some()
                    && a.position.distance(origin) <= range
            })
            .map(|a| a.id)
            .collect();

        for observer in observers {
            let seen = self.agents[observer.index()].behavior().observe(
                verdicts.clone(),
                subject_malicious,
                &mut self.rng,
            );
            let interaction = self
                .new_interaction(observer, pusher, None, OBSERVATION_SENSITIVITY)
                .with_behaviors(seen);
            self.record_interaction(interaction);
        }
    }
}
