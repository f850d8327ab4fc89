//! Messaging
//!
//! Messages are delivered synchronously: sending is a direct call into the
//! receiver that returns its response before the tick continues. A
//! trust-aware receiver only acts on a message when the sender is itself,
//! passes its trust decision, is asking for status, or is the leader. Every
//! receipt, accepted or not, lands in the message log.

use swarm_events::{AgentId, MessageKind, MessageLogEntry, SimTimestamp, Vec2};
use tracing::{debug, info};

use crate::agent::PendingClaim;
use crate::fsm::AgentState;
use crate::sides::ObjectSide;
use crate::swarm::Swarm;

/// Sensitivity of first-hand behaviour observations.
pub const OBSERVATION_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorRequest {
    ReturnHome,
    ResumeSearch,
}

/// What an agent says about itself when asked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub state: AgentState,
    pub position: Vec2,
    pub assigned_side: Option<ObjectSide>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageContent {
    MoveToLocation { target: Vec2 },
    ChangeBehavior { request: BehaviorRequest },
    Localization { object_position: Vec2 },
    ReportStatus,
}

impl MessageContent {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageContent::MoveToLocation { .. } => MessageKind::MoveToLocation,
            MessageContent::ChangeBehavior { .. } => MessageKind::ChangeBehavior,
            MessageContent::Localization { .. } => MessageKind::Localization,
            MessageContent::ReportStatus => MessageKind::ReportStatus,
        }
    }

    /// How costly it is to act on this content if the sender lies.
    pub fn sensitivity(&self) -> f64 {
        match self {
            MessageContent::ReportStatus => 0.2,
            MessageContent::Localization { .. } => 0.5,
            MessageContent::MoveToLocation { .. } => 0.6,
            MessageContent::ChangeBehavior { .. } => 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message {
    pub from: AgentId,
    pub content: MessageContent,
    pub timestamp: SimTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageResponse {
    Accepted,
    Rejected,
    Status(StatusReport),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    Explicit(Vec<AgentId>),
    /// Every active agent except the sender
    AllPeers,
}

/// Delivery settings plus the accept/reject log.
#[derive(Debug, Clone, Default)]
pub struct CommunicationController {
    trust_enabled: bool,
    trust_based_broadcasting: bool,
    log: Vec<MessageLogEntry>,
}

impl CommunicationController {
    pub fn new(trust_enabled: bool, trust_based_broadcasting: bool) -> Self {
        Self {
            trust_enabled,
            trust_based_broadcasting,
            log: Vec::new(),
        }
    }

    pub fn trust_enabled(&self) -> bool {
        self.trust_enabled
    }

    /// Broadcasts skip recipients the sender does not trust.
    pub fn filters_broadcasts(&self) -> bool {
        self.trust_enabled && self.trust_based_broadcasting
    }

    pub fn log(&self) -> &[MessageLogEntry] {
        &self.log
    }

    fn record(&mut self, entry: MessageLogEntry) {
        self.log.push(entry);
    }
}

impl Swarm {
    /// Ids a message to `recipients` from `from` would go to.
    pub fn resolve_recipients(&self, from: AgentId, recipients: &Recipients) -> Vec<AgentId> {
        match recipients {
            Recipients::Explicit(ids) => ids
                .iter()
                .copied()
                .filter(|id| self.agent(*id).is_some_and(|a| a.active))
                .collect(),
            Recipients::AllPeers => self
                .agents()
                .iter()
                .filter(|a| a.active && a.id != from)
                .map(|a| a.id)
                .collect(),
        }
    }

    pub fn send_message(
        &mut self,
        from: AgentId,
        to: AgentId,
        content: MessageContent,
    ) -> MessageResponse {
        let message = Message {
            from,
            content,
            timestamp: self.clock.now(),
        };
        self.receive_message(to, message)
    }

    /// Sends `content` to every resolved recipient in id order.
    pub fn send(
        &mut self,
        from: AgentId,
        recipients: &Recipients,
        content: MessageContent,
    ) -> Vec<(AgentId, MessageResponse)> {
        self.resolve_recipients(from, recipients)
            .into_iter()
            .map(|to| (to, self.send_message(from, to, content)))
            .collect()
    }

    /// Sends `content` to all peers, minus those the sender distrusts when
    /// trust-based broadcasting is on. The pre-filter never changes trust state.
    pub fn broadcast(
        &mut self,
        from: AgentId,
        content: MessageContent,
    ) -> Vec<(AgentId, MessageResponse)> {
        let mut targets = self.resolve_recipients(from, &Recipients::AllPeers);
        if self.comms.filters_broadcasts() {
            let sensitivity = content.sensitivity();
            targets.retain(|to| self.trust_decision(from, *to, sensitivity, false));
        }
        targets
            .into_iter()
            .map(|to| (to, self.send_message(from, to, content)))
            .collect()
    }

    /// Delivers `message` to `receiver`, applying the trust gate.
    pub fn receive_message(&mut self, receiver: AgentId, message: Message) -> MessageResponse {
        let accepted = self.passes_gate(receiver, &message);
        let is_from_malicious = self
            .agent(message.from)
            .is_some_and(|a| a.is_malicious());
        self.comms.record(MessageLogEntry {
            from: message.from,
            to: receiver,
            kind: message.content.kind(),
            is_from_malicious,
            was_accepted: accepted,
            timestamp: message.timestamp,
        });

        if !accepted {
            debug!(
                from = %message.from,
                to = %receiver,
                kind = %message.content.kind(),
                "Message rejected"
            );
            return MessageResponse::Rejected;
        }
        self.handle_message(receiver, message)
    }

    fn passes_gate(&mut self, receiver: AgentId, message: &Message) -> bool {
        if !self.comms.trust_enabled() {
            return true;
        }
        if self.agent_ref(receiver).behavior().bypasses_trust_gate() {
            return true;
        }
        message.from == receiver
            || self.trust_decision(receiver, message.from, message.content.sensitivity(), true)
            || matches!(message.content, MessageContent::ReportStatus)
            || self.leader() == Some(message.from)
    }

    fn handle_message(&mut self, receiver: AgentId, message: Message) -> MessageResponse {
        match message.content {
            MessageContent::MoveToLocation { target } => {
                let agent = &self.agents[receiver.index()];
                if !agent.behavior().follows_move_command(&mut self.rng) {
                    debug!(agent = %receiver, "Move command ignored");
                    return MessageResponse::Accepted;
                }
                self.adopt_claim(receiver, message.from, target);
                MessageResponse::Accepted
            }
            MessageContent::Localization { object_position } => {
                self.adopt_claim(receiver, message.from, object_position);
                if self.leader() == Some(receiver) && message.from != receiver {
                    self.redirect_peer(receiver, message.from, object_position);
                }
                MessageResponse::Accepted
            }
            MessageContent::ChangeBehavior { request } => {
                let agent = &mut self.agents[receiver.index()];
                match request {
                    BehaviorRequest::ReturnHome => {
                        agent.return_home_requested = true;
                        agent.navigation_target = None;
                        agent.pending_claim = None;
                    }
                    BehaviorRequest::ResumeSearch => agent.return_home_requested = false,
                }
                MessageResponse::Accepted
            }
            MessageContent::ReportStatus => {
                let recipient_malicious = self.agent_ref(message.from).is_malicious();
                MessageResponse::Status(self.status_report(receiver, recipient_malicious))
            }
        }
    }

    /// Points a searching, unassigned agent at a location a peer vouched for.
    fn adopt_claim(&mut self, receiver: AgentId, from: AgentId, location: Vec2) {
        if from == receiver || self.sides.side_of(receiver).is_some() {
            return;
        }
        let agent = &mut self.agents[receiver.index()];
        if agent.state() != AgentState::Searching || agent.return_home_requested {
            return;
        }
        agent.navigation_target = Some(location);
        agent.pending_claim = Some(PendingClaim {
            from,
            claimed: location,
        });
    }

    /// The leader sends its most trusted idle searcher towards `location`.
    fn redirect_peer(&mut self, leader: AgentId, informant: AgentId, location: Vec2) {
        let candidate = self
            .agents
            .iter()
            .filter(|a| {
                a.active
                    && a.id != leader
                    && a.id != informant
                    && a.state() == AgentState::Searching
                    && a.navigation_target.is_none()
                    && self.sides.side_of(a.id).is_none()
            })
            .map(|a| (a.id, self.peer_trust(leader, a.id)))
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.0.cmp(&a.0))
            })
            .map(|(id, _)| id);

        if let Some(peer) = candidate {
            info!(%leader, %peer, "Leader redirecting peer to reported object");
            self.send_message(leader, peer, MessageContent::MoveToLocation { target: location });
        }
    }

    /// What `agent` answers when asked for its status.
    pub fn status_report(&mut self, agent: AgentId, recipient_malicious: bool) -> StatusReport {
        let assigned_side = self.reported_assigned_side(agent);
        let bounds = *self.env.bounds();
        let a = &self.agents[agent.index()];
        let position =
            a.behavior()
                .report_position(a.position, recipient_malicious, &bounds, &mut self.rng);
        StatusReport {
            state: a.state(),
            position,
            assigned_side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitivity_ordering() {
        let status = MessageContent::ReportStatus.sensitivity();
        let change = MessageContent::ChangeBehavior {
            request: BehaviorRequest::ReturnHome,
        }
        .sensitivity();
        let localization = MessageContent::Localization {
            object_position: Vec2::ZERO,
        }
        .sensitivity();
        assert!(status < localization);
        assert!(localization < change);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            MessageContent::MoveToLocation { target: Vec2::ZERO }.kind(),
            MessageKind::MoveToLocation
        );
        assert_eq!(MessageContent::ReportStatus.kind(), MessageKind::ReportStatus);
    }

    #[test]
    fn test_broadcast_filtering_needs_trust() {
        assert!(!CommunicationController::new(false, true).filters_broadcasts());
        assert!(!CommunicationController::new(true, false).filters_broadcasts());
        assert!(CommunicationController::new(true, true).filters_broadcasts());
    }
}
