//! Agents
//!
//! One [`Agent`] struct for every robot. What differs between regular agents,
//! the leader and malicious agents lives behind [`AgentBehavior`], selected by
//! the [`AgentKind`] tag.

pub mod behavior;

pub use behavior::{AgentBehavior, Leader, Malicious, Regular, TaskMode};

use std::sync::Arc;
use swarm_events::{AgentId, Vec2};

use crate::fsm::{AgentState, GuardInputs, StateMachine, StateTable};
use crate::trust::TrustService;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentKind {
    Regular,
    Leader,
    Malicious(Malicious),
}

impl AgentKind {
    pub fn behavior(&self) -> &dyn AgentBehavior {
        match self {
            AgentKind::Regular => &Regular,
            AgentKind::Leader => &Leader,
            AgentKind::Malicious(profile) => profile,
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, AgentKind::Leader)
    }

    pub fn is_malicious(&self) -> bool {
        matches!(self, AgentKind::Malicious(_))
    }
}

/// A location claim received from a peer, awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingClaim {
    pub from: AgentId,
    pub claimed: Vec2,
}

/// A robot in the swarm arena.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub label: String,
    pub kind: AgentKind,
    pub position: Vec2,
    /// Unit wander direction
    pub heading: Vec2,
    pub(crate) machine: StateMachine<AgentState, GuardInputs>,
    trust: Option<TrustService>,
    pub navigation_target: Option<Vec2>,
    pub pending_claim: Option<PendingClaim>,
    pub return_home_requested: bool,
    /// Removed agents keep their slot but stop ticking
    pub active: bool,
    pub last_inputs: GuardInputs,
}

impl Agent {
    pub fn new(
        id: AgentId,
        label: impl Into<String>,
        kind: AgentKind,
        position: Vec2,
        table: Arc<StateTable<AgentState, GuardInputs>>,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            position,
            heading: Vec2::new(1.0, 0.0),
            machine: StateMachine::new(table, AgentState::Searching),
            trust: None,
            navigation_target: None,
            pending_claim: None,
            return_home_requested: false,
            active: true,
            last_inputs: GuardInputs::default(),
        }
    }

    pub fn state(&self) -> AgentState {
        self.machine.current()
    }

    pub fn behavior(&self) -> &dyn AgentBehavior {
        self.kind.behavior()
    }

    pub fn is_leader(&self) -> bool {
        self.kind.is_leader()
    }

    pub fn is_malicious(&self) -> bool {
        self.kind.is_malicious()
    }

    pub fn attach_trust(&mut self, service: TrustService) {
        self.trust = Some(service);
    }

    pub fn has_trust(&self) -> bool {
        self.trust.is_some()
    }

    /// # Panics
    ///
    /// Panics if no trust service was attached.
    pub fn trust(&self) -> &TrustService {
        match &self.trust {
            Some(service) => service,
            None => panic!("trust service not attached to {}", self.label),
        }
    }

    /// # Panics
    ///
    /// Panics if no trust service was attached.
    pub fn trust_mut(&mut self) -> &mut TrustService {
        match &mut self.trust {
            Some(service) => service,
            None => panic!("trust service not attached to {}", self.label),
        }
    }

    pub fn trust_service(&self) -> Option<&TrustService> {
        self.trust.as_ref()
    }
}
