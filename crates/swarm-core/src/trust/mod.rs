//! Trust Model
//!
//! Every agent owns a [`TrustService`] holding one [`TrustRecord`] per peer.
//! Trust in a peer blends direct experience (what the agent itself observed,
//! eroded toward a neutral baseline over time) with indirect reputation (the
//! shared [`Authority`], the leader, and other peers). Decisions compare that
//! trust with a threshold derived from [`ContextInformation`].

pub mod authority;
pub mod context;
pub mod direct;
pub mod indirect;
pub mod record;
pub mod service;

pub use authority::{Authority, AuthorityConfig, Reputation};
pub use context::{ContextInformation, ContextWeights, BASELINE_THRESHOLD};
pub use direct::{relative_error, DirectTrust};
pub use indirect::{IndirectTrust, PeerOpinions};
pub use record::{erosion, TrustRecord};
pub use service::{TrustAssessment, TrustService};

use serde::{Deserialize, Serialize};

/// Output of a trust calculator: a value plus whether it should count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustComponent {
    pub value: f64,
    pub applied: bool,
}

impl TrustComponent {
    pub fn applied(value: f64) -> Self {
        Self {
            value,
            applied: true,
        }
    }

    pub fn skipped(value: f64) -> Self {
        Self {
            value,
            applied: false,
        }
    }
}

/// Weights and constants of the trust model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConstants {
    /// Neutral trust given to unknown peers and the erosion target
    pub init_trust_value: f64,
    pub direct_trust_weight: f64,
    pub indirect_trust_weight: f64,
    pub present_experience_weight: f64,
    pub past_experience_weight: f64,
    pub communication_weight: f64,
    pub observation_weight: f64,
    /// Erosion rate per simulated second
    pub erosion_rate: f64,
    pub authority_weight: f64,
    pub leader_weight: f64,
    pub trusted_peers_weight: f64,
    pub other_peers_weight: f64,
    /// Peers rated at or above this count as trusted opinion sources
    pub trusted_peer_threshold: f64,
    /// Keeps the relative error finite when both values are zero
    pub relative_error_epsilon: f64,
}

impl Default for TrustConstants {
    fn default() -> Self {
        Self {
            init_trust_value: 0.5,
            direct_trust_weight: 0.7,
            indirect_trust_weight: 0.3,
            present_experience_weight: 0.6,
            past_experience_weight: 0.4,
            communication_weight: 0.5,
            observation_weight: 0.5,
            erosion_rate: 0.05,
            authority_weight: 0.4,
            leader_weight: 0.3,
            trusted_peers_weight: 0.2,
            other_peers_weight: 0.1,
            trusted_peer_threshold: 0.6,
            relative_error_epsilon: 1e-9,
        }
    }
}

/// Blends direct and indirect trust, using only the parts that applied.
pub fn calculate_trust(
    direct: TrustComponent,
    indirect: TrustComponent,
    constants: &TrustConstants,
) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    if direct.applied {
        weighted += constants.direct_trust_weight * direct.value;
        total += constants.direct_trust_weight;
    }
    if indirect.applied {
        weighted += constants.indirect_trust_weight * indirect.value;
        total += constants.indirect_trust_weight;
    }
    if total <= 0.0 {
        return constants.init_trust_value;
    }
    weighted / total
}
