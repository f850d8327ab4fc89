//! Indirect trust: what everyone else thinks of a peer.

use swarm_events::AgentId;

use super::{Authority, TrustComponent, TrustConstants};

/// Second-hand opinions about one peer, gathered from the rest of the swarm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerOpinions {
    /// The leader's trust in the peer, when there is a leader with an opinion
    pub leader: Option<f64>,
    /// Opinions of peers the asking agent itself trusts
    pub trusted: Vec<f64>,
    pub others: Vec<f64>,
}

impl PeerOpinions {
    pub fn is_empty(&self) -> bool {
        self.leader.is_none() && self.trusted.is_empty() && self.others.is_empty()
    }
}

pub struct IndirectTrust;

impl IndirectTrust {
    /// Reputation-based trust in `peer`.
    ///
    /// The authority reputation is always part of the result; leader, trusted
    /// and other opinions are mixed in only when present, and the weights are
    /// renormalised over whatever took part.
    pub fn calculate(
        peer: AgentId,
        opinions: &PeerOpinions,
        authority: &Authority,
        constants: &TrustConstants,
    ) -> TrustComponent {
        let mut weighted = constants.authority_weight * authority.reputation_or_init(peer);
        let mut total = constants.authority_weight;

        if let Some(leader) = opinions.leader {
            weighted += constants.leader_weight * leader;
            total += constants.leader_weight;
        }
        if let Some(mean) = mean(&opinions.trusted) {
            weighted += constants.trusted_peers_weight * mean;
            total += constants.trusted_peers_weight;
        }
        if let Some(mean) = mean(&opinions.others) {
            weighted += constants.other_peers_weight * mean;
            total += constants.other_peers_weight;
        }

        if total <= 0.0 {
            return TrustComponent::applied(constants.init_trust_value);
        }
        TrustComponent::applied(weighted / total)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
