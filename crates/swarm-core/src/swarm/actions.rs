//! Per-state behaviour.
//!
//! [`AgentDriver`] is the state hook set for one agent during one tick. It
//! borrows the whole swarm so a hook can move the agent, talk to peers and
//! touch the shared services.

use swarm_events::{AgentId, Vec2};
use tracing::{debug, trace};

use crate::agent::{Agent, TaskMode};
use crate::communication::{MessageContent, MessageResponse, Recipients};
use crate::fsm::{AgentState, StateHooks};

use super::Swarm;

/// Chance per tick that a wandering agent picks a new heading.
const WANDER_TURN_PROBABILITY: f64 = 0.05;

pub(super) struct AgentDriver<'a> {
    swarm: &'a mut Swarm,
    idx: usize,
}

impl<'a> AgentDriver<'a> {
    pub(super) fn new(swarm: &'a mut Swarm, idx: usize) -> Self {
        Self { swarm, idx }
    }

    fn agent(&self) -> &Agent {
        &self.swarm.agents[self.idx]
    }

    fn agent_mut(&mut self) -> &mut Agent {
        &mut self.swarm.agents[self.idx]
    }

    fn id(&self) -> AgentId {
        self.agent().id
    }

    fn blocked(&self, p: Vec2) -> bool {
        let radius = self.swarm.config.simulation.robot_radius;
        !self.swarm.env.bounds().contains(p)
            || self
                .swarm
                .env
                .obstacles()
                .iter()
                .any(|o| o.inflate(radius).contains(p))
    }

    fn place(&mut self, p: Vec2) {
        self.agent_mut().position = p;
        self.swarm.env.mark_explored(p);
    }

    /// One step toward `target`, sliding along an axis when the direct step
    /// would end inside an obstacle.
    fn move_towards(&mut self, target: Vec2) {
        let speed = self.swarm.config.simulation.robot_speed;
        let from = self.agent().position;
        let next = self.swarm.env.bounds().clamp(from.step_towards(target, speed));
        for candidate in [next, Vec2::new(next.x, from.y), Vec2::new(from.x, next.y)] {
            if !self.blocked(candidate) {
                self.place(candidate);
                return;
            }
        }
    }

    fn new_heading(&mut self) {
        let angle = self.swarm.rng.range(0.0, std::f64::consts::TAU);
        self.agent_mut().heading = Vec2::new(angle.cos(), angle.sin());
    }

    /// Random walk, turning away from walls and obstacles.
    fn wander(&mut self) {
        if self.swarm.rng.chance(WANDER_TURN_PROBABILITY) {
            self.new_heading();
        }
        let speed = self.swarm.config.simulation.robot_speed;
        let agent = self.agent();
        let next = agent.position + agent.heading * speed;
        if self.blocked(next) {
            self.new_heading();
            return;
        }
        self.place(next);
    }

    fn search_step(&mut self) {
        let inputs = self.agent().last_inputs;
        if inputs.object_detected && self.agent().pending_claim.is_some() {
            self.verify_claim(true);
        }

        let Some(target) = self.agent().navigation_target else {
            self.wander();
            return;
        };
        self.move_towards(target);
        let tolerance = self.swarm.config.simulation.arrival_tolerance;
        if self.agent().position.distance(target) <= tolerance {
            self.agent_mut().navigation_target = None;
            if !inputs.object_detected {
                self.verify_claim(false);
            }
        }
    }

    /// Moves away from the nearest obstacle while sliding around it towards
    /// wherever the agent was heading.
    fn avoid_step(&mut self) {
        let position = self.agent().position;
        let Some(nearest) = self
            .swarm
            .env
            .nearest_obstacle(position)
            .map(|(o, _)| o.nearest_point(position))
        else {
            return;
        };
        let away = (position - nearest).normalized();
        let desired = match self.agent().navigation_target {
            Some(target) => (target - position).normalized(),
            None => self.agent().heading,
        };
        let mut tangent = Vec2::new(-away.y, away.x);
        if tangent.x * desired.x + tangent.y * desired.y < 0.0 {
            tangent = tangent * -1.0;
        }
        let direction = (away + tangent).normalized();
        if direction == Vec2::ZERO {
            self.new_heading();
            return;
        }
        self.agent_mut().heading = tangent;
        let speed = self.swarm.config.simulation.robot_speed;
        let next = self.swarm.env.bounds().clamp(position + direction * speed);
        if !self.blocked(next) {
            self.place(next);
        }
    }

    /// Checks a pending location claim against what the agent now sees and
    /// records the result as evidence about the claimant.
    fn verify_claim(&mut self, found: bool) {
        let Some(claim) = self.agent_mut().pending_claim.take() else {
            return;
        };
        self.agent_mut().navigation_target = None;

        let id = self.id();
        let sensitivity = MessageContent::Localization {
            object_position: claim.claimed,
        }
        .sensitivity();
        let interaction = if found {
            let actual = self.swarm.env.object().position;
            self.swarm
                .new_interaction(id, claim.from, None, sensitivity)
                .with_values(claim.claimed, Some(actual.into()))
        } else {
            self.swarm
                .new_interaction(id, claim.from, Some(false), sensitivity)
                .with_values(claim.claimed, None)
        };
        if let Some(trust) = self.swarm.record_interaction(interaction) {
            debug!(agent = %id, claimant = %claim.from, found, trust, "Location claim verified");
        }
    }

    /// Tells the swarm where the object is, or lies about it.
    fn announce_object(&mut self) {
        let id = self.id();
        let actual = self.swarm.env.object().position;
        let mode = self.swarm.agents[self.idx]
            .behavior()
            .task_mode(&mut self.swarm.rng);
        match mode {
            TaskMode::Correct => {
                self.swarm.broadcast(
                    id,
                    MessageContent::Localization {
                        object_position: actual,
                    },
                );
            }
            TaskMode::Falsified => {
                let bounds = *self.swarm.env.bounds();
                let fake = self.swarm.rng.point_in(&bounds);
                debug!(agent = %id, ?fake, "Broadcasting falsified location");
                self.swarm.broadcast(
                    id,
                    MessageContent::Localization {
                        object_position: fake,
                    },
                );
            }
            TaskMode::Colluding => {
                let accomplices = self
                    .swarm
                    .agents
                    .iter()
                    .filter(|a| a.active && a.id != id && a.is_malicious())
                    .map(|a| a.id)
                    .collect();
                self.swarm.send(
                    id,
                    &Recipients::Explicit(accomplices),
                    MessageContent::Localization {
                        object_position: actual,
                    },
                );
            }
        }
    }

    fn approach_side(&mut self) {
        let id = self.id();
        let side = match self.swarm.sides.side_of(id) {
            Some(side) => side,
            None => match self.swarm.assign_side(id) {
                Some(side) => side,
                None => return,
            },
        };
        let radius = self.swarm.config.simulation.robot_radius;
        let target = side.offset_point(self.swarm.env.object(), radius);
        self.move_towards(target);
    }

    /// Asks every side-holding peer in sensing range for its status and checks
    /// the answer against what the agent sees.
    fn poll_status(&mut self) {
        let id = self.id();
        let position = self.agent().position;
        let range = self.swarm.config.simulation.sensing_radius;
        let peers: Vec<AgentId> = self
            .swarm
            .agents
            .iter()
            .filter(|a| {
                a.active
                    && a.id != id
                    && self.swarm.sides.side_of(a.id).is_some()
                    && a.position.distance(position) <= range
            })
            .map(|a| a.id)
            .collect();

        for peer in peers {
            let MessageResponse::Status(report) =
                self.swarm
                    .send_message(id, peer, MessageContent::ReportStatus)
            else {
                continue;
            };
            let subject = self.swarm.agent_ref(peer);
            let seen_position = subject.position;
            let subject_malicious = subject.is_malicious();
            let actual_side = self.swarm.sides.side_of(peer);
            let verdicts = self.swarm.agents[self.idx].behavior().observe(
                vec![report.assigned_side == actual_side],
                subject_malicious,
                &mut self.swarm.rng,
            );
            let interaction = self
                .swarm
                .new_interaction(id, peer, None, MessageContent::ReportStatus.sensitivity())
                .with_values(seen_position, Some(report.position.into()))
                .with_behaviors(verdicts);
            self.swarm.record_interaction(interaction);
        }
    }

    fn plan(&mut self, force_new: bool) {
        let swarm = &mut *self.swarm;
        if !swarm
            .planner
            .collaboratively_plan_trajectory(&swarm.grid, swarm.env.object(), force_new)
        {
            swarm.plan_failures += 1;
        }
    }
}

impl StateHooks<AgentState> for AgentDriver<'_> {
    fn on_exit(&mut self, state: AgentState) {
        trace!(agent = %self.id(), %state, "Leaving state");
        match state {
            AgentState::ObjectFound
            | AgentState::Idle
            | AgentState::Transporting
            | AgentState::ReturningHome => self.agent_mut().navigation_target = None,
            _ => {}
        }
    }

    fn on_enter(&mut self, state: AgentState) {
        match state {
            AgentState::Searching => self.search_step(),
            AgentState::ObstacleAvoidance => self.avoid_step(),
            AgentState::ObjectFound => {
                self.swarm.object_found = true;
                self.agent_mut().navigation_target = None;
                self.verify_claim(true);
                let id = self.id();
                if let Some(side) = self.swarm.assign_side(id) {
                    debug!(agent = %id, %side, "Heading to side");
                }
                self.announce_object();
            }
            AgentState::Idle => {}
            AgentState::Planning => self.plan(false),
            AgentState::Transporting => {
                let id = self.id();
                self.swarm.execute_turn_based_object_push(id);
            }
            AgentState::ReturningHome => {
                let id = self.id();
                self.swarm.sides.release_agent(id);
                let agent = self.agent_mut();
                agent.navigation_target = None;
                agent.pending_claim = None;
            }
        }
    }

    fn on_same_state(&mut self, state: AgentState) {
        match state {
            AgentState::Searching => self.search_step(),
            AgentState::ObstacleAvoidance => self.avoid_step(),
            AgentState::ObjectFound => self.approach_side(),
            AgentState::Idle => {
                self.approach_side();
                let interval = self.swarm.config.simulation.status_poll_interval;
                if self.swarm.clock.tick() % interval == 0 {
                    self.poll_status();
                }
            }
            AgentState::Planning => {}
            AgentState::Transporting => {
                if self.swarm.planner.path_blocked(&self.swarm.grid) {
                    debug!(agent = %self.id(), "Path ahead blocked, replanning");
                    self.plan(true);
                }
                let id = self.id();
                self.swarm.execute_turn_based_object_push(id);
            }
            AgentState::ReturningHome => {
                let home = self.swarm.env.base().center();
                self.move_towards(home);
                let position = self.agent().position;
                if self.swarm.env.base().contains(position) {
                    self.agent_mut().return_home_requested = false;
                }
            }
        }
    }
}
