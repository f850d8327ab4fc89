//! Swarm Arena
//!
//! [`Swarm`] owns every agent (addressed by index), the shared services and
//! the world. One tick senses each active agent in arena order, runs its
//! state machine and lets the state hooks act through the swarm. The seeded
//! RNG and the authority ledger are the only state shared between agents, and
//! both are advanced in that fixed order so seeded runs replay exactly.

mod actions;
pub mod export;
mod transport;

pub use export::{apply_trust_history, read_trust_history, ExportError};

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use swarm_events::{
    AgentId, Interaction, MessageLogEntry, ReputationSnapshot, TrustSample, Vec2,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentKind};
use crate::clock::SimClock;
use crate::communication::CommunicationController;
use crate::config::{ConfigError, RobotConfig, SwarmConfig};
use crate::environment::{Environment, Rect};
use crate::fsm::{agent_state_table, AgentState, GuardInputs, StateTable, Step};
use crate::planning::{OccupancyGrid, PlanningController};
use crate::rng::SimRng;
use crate::sides::{ObjectSide, OccupiedSidesHandler, NEEDED_ROBOTS};
use crate::trust::{Authority, ContextInformation, PeerOpinions, TrustService};

use actions::AgentDriver;

/// Where the team stands on getting the object moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoordinationStatus {
    /// Nobody has seen the object yet
    Searching,
    Assembling { occupied: usize },
    /// All four sides are held
    Ready,
    /// Not enough free honest agents remain to fill the open sides
    InsufficientRobots { available: usize, needed: usize },
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub agent: AgentId,
    pub from: AgentState,
    pub to: AgentState,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub transitions: Vec<StateChange>,
    pub status: CoordinationStatus,
    pub object_position: Vec2,
    pub delivered: bool,
}

/// End-of-run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub seed: u64,
    pub ticks: u64,
    pub delivered: bool,
    pub status: CoordinationStatus,
    pub object_position: Vec2,
    pub messages: usize,
    pub rejected: usize,
    pub rejected_from_malicious: usize,
    pub plan_failures: u64,
    /// Final authority reputation by agent label
    pub reputations: BTreeMap<String, f64>,
    pub suspected: Vec<String>,
}

pub struct Swarm {
    pub(crate) agents: Vec<Agent>,
    pub(crate) rng: SimRng,
    pub(crate) authority: Authority,
    pub(crate) clock: SimClock,
    pub(crate) comms: CommunicationController,
    pub(crate) sides: OccupiedSidesHandler,
    pub(crate) planner: PlanningController,
    pub(crate) env: Environment,
    pub(crate) grid: OccupancyGrid,
    grid_revision: u64,
    pub(crate) config: SwarmConfig,
    table: Arc<StateTable<AgentState, GuardInputs>>,
    snapshots: Vec<ReputationSnapshot>,
    /// Set once any agent has seen the object
    pub(crate) object_found: bool,
    pub(crate) plan_failures: u64,
    leader: Option<AgentId>,
    last_status: CoordinationStatus,
    run_id: Uuid,
}

impl Swarm {
    /// Builds a fresh run from `config`.
    ///
    /// The configuration is validated first; nothing is constructed from a
    /// rejected one.
    pub fn new(config: SwarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = SimRng::seeded(config.simulation.seed);
        let run_id = rng.uuid();
        let env = Environment::new(&config.environment);
        let grid = OccupancyGrid::from_environment(&env, config.simulation.robot_radius);
        let mut planner = PlanningController::new(config.planning.clone());
        planner.set_goal(env.base().center());

        let mut swarm = Self {
            agents: Vec::with_capacity(config.robots.len()),
            rng,
            authority: Authority::new(config.authority.clone(), config.trust.init_trust_value),
            clock: SimClock::new(config.simulation.seconds_per_tick),
            comms: CommunicationController::new(
                config.simulation.trust_enabled,
                config.simulation.trust_based_broadcasting,
            ),
            sides: OccupiedSidesHandler::new(),
            planner,
            grid_revision: env.revision(),
            env,
            grid,
            table: Arc::new(agent_state_table()),
            snapshots: Vec::new(),
            object_found: false,
            plan_failures: 0,
            leader: None,
            last_status: CoordinationStatus::Searching,
            run_id,
            config,
        };

        let robots = swarm.config.robots.clone();
        for robot in &robots {
            swarm.spawn(robot);
        }
        for robot in &robots {
            swarm.seed_history(robot);
        }

        info!(
            run_id = %swarm.run_id,
            seed = swarm.config.simulation.seed,
            agents = swarm.agents.len(),
            trust = swarm.comms.trust_enabled(),
            "Swarm initialised"
        );
        Ok(swarm)
    }

    fn spawn(&mut self, robot: &RobotConfig) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        let kind = if robot.leader {
            AgentKind::Leader
        } else if robot.malicious {
            AgentKind::Malicious(self.config.malicious)
        } else {
            AgentKind::Regular
        };

        let mut agent = Agent::new(id, robot.label.clone(), kind, robot.position, Arc::clone(&self.table));
        let angle = self.rng.range(0.0, std::f64::consts::TAU);
        agent.heading = Vec2::new(angle.cos(), angle.sin());
        if self.comms.trust_enabled() {
            agent.attach_trust(TrustService::new(id, self.config.trust.clone()));
        }
        self.authority.register(id, self.clock.now());
        if robot.leader {
            self.leader = Some(id);
        }
        self.env.mark_explored(robot.position);
        self.agents.push(agent);
        id
    }

    fn seed_history(&mut self, robot: &RobotConfig) {
        let Some(history) = &robot.trust_history else {
            return;
        };
        let Some(owner) = self.agent_by_label(&robot.label).map(|a| a.id) else {
            return;
        };
        for (peer_label, interactions) in &history.peers {
            let Some(peer) = self.agent_by_label(peer_label).map(|a| a.id) else {
                warn!(agent = %robot.label, peer = %peer_label, "Trust history for unknown peer skipped");
                continue;
            };
            let agent = &mut self.agents[owner.index()];
            if agent.has_trust() {
                agent.trust_mut().seed_history(peer, interactions.clone());
            }
        }
        debug!(agent = %robot.label, interactions = history.interaction_count(), "Trust history seeded");
    }

    /// Adds a robot to a running swarm.
    pub fn add_agent(&mut self, robot: RobotConfig) -> Result<AgentId, ConfigError> {
        if self.agent_by_label(&robot.label).is_some() {
            return Err(ConfigError::Invalid(format!("duplicate robot label {}", robot.label)));
        }
        if robot.leader && self.leader.is_some() {
            return Err(ConfigError::Invalid("at most one robot may be the leader".to_string()));
        }
        if robot.leader && robot.malicious {
            return Err(ConfigError::Invalid(format!(
                "{} cannot be both leader and malicious",
                robot.label
            )));
        }
        if !self.env.bounds().contains(robot.position) {
            return Err(ConfigError::Invalid(format!("{} starts outside the world", robot.label)));
        }

        let id = self.spawn(&robot);
        self.seed_history(&robot);
        info!(agent = %robot.label, %id, "Agent joined");
        self.config.robots.push(robot);
        Ok(id)
    }

    /// Takes an agent out of the run. Its side is released and its slot stays
    /// in the arena, inactive.
    pub fn remove_agent(&mut self, id: AgentId) {
        let Some(agent) = self.agents.get_mut(id.index()) else {
            return;
        };
        if !agent.active {
            return;
        }
        agent.active = false;
        agent.navigation_target = None;
        agent.pending_claim = None;
        let label = agent.label.clone();
        self.sides.release_agent(id);
        if self.leader == Some(id) {
            self.leader = None;
        }
        info!(agent = %label, "Agent removed");
    }

    /// Runs one tick over every active agent.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.advance();
        self.refresh_grid();

        let mut transitions = Vec::new();
        for idx in 0..self.agents.len() {
            if !self.agents[idx].active {
                continue;
            }
            let inputs = self.sense(idx);
            self.agents[idx].last_inputs = inputs;

            let mut machine = self.agents[idx].machine.clone();
            let step = machine.tick(&inputs, &mut AgentDriver::new(self, idx));
            self.agents[idx].machine = machine;

            if let Step::Transitioned { from, to } = step {
                let agent = &self.agents[idx];
                info!(agent = %agent.label, %from, %to, tick = now.tick, "State transition");
                transitions.push(StateChange {
                    agent: agent.id,
                    from,
                    to,
                });
            }
        }

        self.snapshots.push(self.authority.snapshot(now));

        let status = self.coordination_status();
        if status != self.last_status {
            match status {
                CoordinationStatus::InsufficientRobots { available, needed } => {
                    warn!(available, needed, tick = now.tick, "Insufficient robots to fill the object's sides");
                }
                _ => debug!(?status, tick = now.tick, "Coordination status changed"),
            }
            self.last_status = status;
        }

        TickReport {
            tick: now.tick,
            transitions,
            status,
            object_position: self.env.object().position,
            delivered: self.env.object_at_base(),
        }
    }

    /// Ticks until the object is delivered or `max_ticks` have run.
    pub fn run(&mut self, max_ticks: u64) -> RunSummary {
        for _ in 0..max_ticks {
            if self.tick().delivered {
                info!(tick = self.clock.tick(), "Object delivered to base");
                break;
            }
        }
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        let log = self.comms.log();
        let label = |id: &AgentId| self.label_of(*id);
        RunSummary {
            run_id: self.run_id,
            seed: self.config.simulation.seed,
            ticks: self.clock.tick(),
            delivered: self.env.object_at_base(),
            status: self.coordination_status(),
            object_position: self.env.object().position,
            messages: log.len(),
            rejected: log.iter().filter(|e| !e.was_accepted).count(),
            rejected_from_malicious: log
                .iter()
                .filter(|e| !e.was_accepted && e.is_from_malicious)
                .count(),
            plan_failures: self.plan_failures,
            reputations: self
                .authority
                .snapshot(self.clock.now())
                .reputations
                .iter()
                .map(|(id, value)| (label(id), *value))
                .collect(),
            suspected: self.authority.suspected().iter().map(label).collect(),
        }
    }

    fn refresh_grid(&mut self) {
        if self.env.revision() == self.grid_revision {
            return;
        }
        self.grid = OccupancyGrid::from_environment(&self.env, self.config.simulation.robot_radius);
        self.grid_revision = self.env.revision();
        debug!(revision = self.grid_revision, "Occupancy grid rebuilt");
    }

    /// Guard inputs for the agent at `idx`, read from live state.
    fn sense(&self, idx: usize) -> GuardInputs {
        let sim = &self.config.simulation;
        let agent = &self.agents[idx];
        let object = self.env.object();
        let side = self.sides.side_of(agent.id);

        GuardInputs {
            return_home_requested: agent.return_home_requested,
            obstacle_nearby: self
                .env
                .nearest_obstacle(agent.position)
                .is_some_and(|(_, d)| d < sim.avoidance_radius),
            object_detected: agent.position.distance(object.position) <= sim.detection_radius,
            has_assigned_side: side.is_some(),
            at_assigned_side: side.is_some_and(|s| {
                agent.position.distance(s.offset_point(object, sim.robot_radius))
                    <= sim.arrival_tolerance
            }),
            all_sides_occupied: self.sides.are_all_sides_occupied(NEEDED_ROBOTS),
            trajectory_complete: self.planner.is_trajectory_complete(),
            object_at_base: self.env.object_at_base(),
            at_base: self.env.base().contains(agent.position),
        }
    }

    /// Live view of the side-filling effort.
    pub fn coordination_status(&self) -> CoordinationStatus {
        if self.env.object_at_base() {
            return CoordinationStatus::Delivered;
        }
        if !self.object_found {
            return CoordinationStatus::Searching;
        }
        let occupied = self.sides.occupied_count();
        if occupied >= NEEDED_ROBOTS {
            return CoordinationStatus::Ready;
        }
        let needed = NEEDED_ROBOTS - occupied;
        let available = self
            .agents
            .iter()
            .filter(|a| a.active && !a.is_malicious() && self.sides.side_of(a.id).is_none())
            .count();
        if available < needed {
            CoordinationStatus::InsufficientRobots { available, needed }
        } else {
            CoordinationStatus::Assembling { occupied }
        }
    }

    // Trust plumbing

    /// `asker`'s current trust in `peer`, neutral when it has no record.
    pub fn peer_trust(&self, asker: AgentId, peer: AgentId) -> f64 {
        self.agent(asker)
            .and_then(Agent::trust_service)
            .map(|s| s.trust_or_init(peer))
            .unwrap_or(self.config.trust.init_trust_value)
    }

    /// Context `asker` is in when acting on data of the given sensitivity.
    pub fn context_for(&self, asker: AgentId, sensitivity: f64) -> ContextInformation {
        let suspected = self
            .authority
            .suspected()
            .into_iter()
            .filter(|id| self.agent(*id).is_some_and(|a| a.active))
            .count();
        let total = self.agents.iter().filter(|a| a.active).count();
        let available = self
            .agents
            .iter()
            .filter(|a| {
                a.active
                    && a.id != asker
                    && !self.authority.is_suspected(a.id)
                    && self.sides.side_of(a.id).is_none()
            })
            .count();

        let mut context = ContextInformation::new(self.config.context.clone());
        context.number_of_malicious_detected = suspected as u32;
        context.number_of_needed_robots =
            NEEDED_ROBOTS.saturating_sub(self.sides.occupied_count()) as u32;
        context.explored_area_fraction = self.env.explored_fraction();
        context.was_object_found = self.object_found;
        context.available_members = available as u32;
        context.total_members = total as u32;
        context.with_sensitivity(sensitivity)
    }

    /// What the rest of the swarm thinks of `peer`, from `asker`'s viewpoint.
    pub fn collect_opinions(&self, asker: AgentId, peer: AgentId) -> PeerOpinions {
        let threshold = self.config.trust.trusted_peer_threshold;
        let mut opinions = PeerOpinions::default();
        for other in &self.agents {
            if !other.active || other.id == asker || other.id == peer {
                continue;
            }
            let Some(score) = other.trust_service().and_then(|s| s.trust_score(peer)) else {
                continue;
            };
            if other.is_leader() {
                opinions.leader = Some(score);
            } else if self.peer_trust(asker, other.id) >= threshold {
                opinions.trusted.push(score);
            } else {
                opinions.others.push(score);
            }
        }
        opinions
    }

    /// Whether `asker` trusts `peer` enough to act on data of the given
    /// sensitivity. With `update` the probe is recorded and reported.
    ///
    /// # Panics
    ///
    /// Panics if `asker` has no trust service attached.
    pub fn trust_decision(
        &mut self,
        asker: AgentId,
        peer: AgentId,
        sensitivity: f64,
        update: bool,
    ) -> bool {
        let context = self.context_for(asker, sensitivity);
        let opinions = self.collect_opinions(asker, peer);
        let now = self.clock.now();
        self.agents[asker.index()].trust_mut().make_trust_decision(
            peer,
            &context,
            update,
            &opinions,
            &mut self.authority,
            now,
        )
    }

    /// Interaction from `observer` about `peer` stamped with the current
    /// context.
    pub fn new_interaction(
        &self,
        observer: AgentId,
        peer: AgentId,
        outcome: Option<bool>,
        sensitivity: f64,
    ) -> Interaction {
        Interaction::new(
            observer,
            peer,
            outcome,
            self.clock.now(),
            self.context_for(observer, sensitivity).snapshot(),
        )
    }

    /// Records first-hand evidence and returns the observer's new trust.
    /// Does nothing when trust is disabled for the run.
    pub fn record_interaction(&mut self, interaction: Interaction) -> Option<f64> {
        if !self.comms.trust_enabled() || interaction.from == interaction.to {
            return None;
        }
        let opinions = self.collect_opinions(interaction.from, interaction.to);
        let observer = interaction.from.index();
        Some(self.agents[observer].trust_mut().add_interaction(
            interaction,
            &opinions,
            &mut self.authority,
            true,
        ))
    }

    // Sides

    /// Side `agent` really holds.
    pub fn actual_assigned_side(&self, agent: AgentId) -> Option<ObjectSide> {
        self.sides.side_of(agent)
    }

    /// Side `agent` claims to hold; malicious agents may lie.
    pub fn reported_assigned_side(&mut self, agent: AgentId) -> Option<ObjectSide> {
        let actual = self.sides.side_of(agent);
        self.agents[agent.index()]
            .behavior()
            .reported_side(actual, &mut self.rng)
    }

    /// Gives `agent` the free side nearest to it.
    pub fn assign_side(&mut self, agent: AgentId) -> Option<ObjectSide> {
        let position = self.agents[agent.index()].position;
        self.sides.assign_side(
            self.env.object(),
            agent,
            position,
            self.config.simulation.robot_radius,
        )
    }

    // World

    /// Drops a new obstacle into the world; the grid follows on the next tick.
    pub fn add_obstacle(&mut self, obstacle: Rect) {
        info!(?obstacle, "Obstacle added");
        self.env.add_obstacle(obstacle);
    }

    // Accessors

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub(crate) fn agent_ref(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }

    pub fn agent_by_label(&self, label: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.label == label)
    }

    pub fn label_of(&self, id: AgentId) -> String {
        self.agent(id)
            .map(|a| a.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn leader(&self) -> Option<AgentId> {
        self.leader
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn sides(&self) -> &OccupiedSidesHandler {
        &self.sides
    }

    pub fn planner(&self) -> &PlanningController {
        &self.planner
    }

    pub fn plan_failures(&self) -> u64 {
        self.plan_failures
    }

    /// Accept/reject record of every delivered message.
    pub fn message_log(&self) -> &[MessageLogEntry] {
        self.comms.log()
    }

    /// Authority reputations, one snapshot per tick.
    pub fn reputation_snapshots(&self) -> &[ReputationSnapshot] {
        &self.snapshots
    }

    /// `observer`'s trust in `peer` over time.
    pub fn trust_series(&self, observer: AgentId, peer: AgentId) -> Option<&[TrustSample]> {
        self.agent(observer)?
            .trust_service()?
            .record(peer)
            .map(|r| r.trust_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{MessageContent, MessageResponse};

    fn config() -> SwarmConfig {
        let mut config = SwarmConfig::default();
        config.environment.obstacles.clear();
        config
    }

    #[test]
    fn test_new_builds_roster() {
        let swarm = Swarm::new(config()).unwrap();
        assert_eq!(swarm.agents().len(), 6);
        assert_eq!(swarm.leader(), Some(AgentId(0)));
        assert!(swarm.agents()[5].is_malicious());
        assert!(swarm.agents().iter().all(|a| a.has_trust()));
        assert!(swarm.agents().iter().all(|a| a.state() == AgentState::Searching));
        assert_eq!(swarm.authority().snapshot(swarm.clock().now()).reputations.len(), 6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.robots.clear();
        assert!(matches!(Swarm::new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_trust_disabled_agents_have_no_service() {
        let mut config = config();
        config.simulation.trust_enabled = false;
        let swarm = Swarm::new(config).unwrap();
        assert!(swarm.agents().iter().all(|a| !a.has_trust()));
    }

    #[test]
    fn test_status_report_reaches_untrusted_sender() {
        let mut swarm = Swarm::new(config()).unwrap();
        let response = swarm.send_message(AgentId(5), AgentId(1), MessageContent::ReportStatus);
        assert!(matches!(response, MessageResponse::Status(_)));
        assert_eq!(swarm.message_log().len(), 1);
        assert!(swarm.message_log()[0].is_from_malicious);
    }

    #[test]
    fn test_add_and_remove_agent() {
        let mut swarm = Swarm::new(config()).unwrap();
        let id = swarm
            .add_agent(RobotConfig::new("robot_7", Vec2::new(100.0, 100.0)))
            .unwrap();
        assert_eq!(id, AgentId(6));
        assert!(swarm.add_agent(RobotConfig::new("robot_7", Vec2::new(1.0, 1.0))).is_err());
        assert!(swarm
            .add_agent(RobotConfig::new("robot_8", Vec2::new(1.0, 1.0)).leader())
            .is_err());

        swarm.remove_agent(id);
        assert!(!swarm.agent(id).unwrap().active);
        swarm.tick();
        assert_eq!(swarm.agent(id).unwrap().state(), AgentState::Searching);
    }

    #[test]
    fn test_status_is_searching_before_detection() {
        let mut swarm = Swarm::new(config()).unwrap();
        let report = swarm.tick();
        assert_eq!(report.tick, 1);
        assert_eq!(report.status, CoordinationStatus::Searching);
        assert_eq!(swarm.reputation_snapshots().len(), 1);
    }
}
