//! Trust-aware swarm transport engine.
//!
//! A swarm of agents searches for a heavy object, claims the four sides around
//! it and pushes it to a base while some agents lie. Every agent gates the
//! messages it acts on with a context-sensitive trust model that blends its own
//! experience with the reputation held by a shared authority.
//!
//! # Modules
//!
//! - [`trust`]: context threshold, trust records, direct/indirect trust,
//!   authority ledger and the per-agent [`TrustService`]
//! - [`fsm`]: generic guarded state machine and the agent behaviour table
//! - [`agent`]: agent data and per-kind behaviour dispatch
//! - [`communication`]: message types and trust-gated delivery
//! - [`sides`]: mutual-exclusion allocator for the object's four sides
//! - [`planning`]: occupancy grid, A* planner and turn-based trajectories
//! - [`swarm`]: the arena that owns every agent and service and runs ticks

pub mod agent;
pub mod clock;
pub mod communication;
pub mod config;
pub mod environment;
pub mod fsm;
pub mod planning;
pub mod rng;
pub mod sides;
pub mod swarm;
pub mod trust;

pub use agent::{Agent, AgentBehavior, AgentKind, TaskMode};
pub use clock::SimClock;
pub use communication::{
    BehaviorRequest, CommunicationController, Message, MessageContent, MessageResponse,
    Recipients, StatusReport,
};
pub use config::{ConfigError, RobotConfig, SimulationConfig, SwarmConfig};
pub use environment::{Environment, EnvironmentConfig, Rect, TransportObject};
pub use fsm::{AgentState, GuardInputs, StateHooks, StateMachine, StateTable, Step, Transition};
pub use planning::{Cell, OccupancyGrid, PlanningConfig, PlanningController, TrajectoryStep};
pub use rng::SimRng;
pub use sides::{ObjectSide, OccupiedSidesHandler, NEEDED_ROBOTS};
pub use swarm::{CoordinationStatus, ExportError, RunSummary, StateChange, Swarm, TickReport};
pub use trust::{
    erosion, Authority, AuthorityConfig, ContextInformation, ContextWeights, DirectTrust,
    IndirectTrust, PeerOpinions, TrustComponent, TrustConstants, TrustRecord, TrustService,
};

pub use swarm_events as events;
