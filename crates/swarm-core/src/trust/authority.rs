//! Shared reputation ledger.
//!
//! Every agent reports the trust it computed for a peer; the authority folds
//! each report into that peer's reputation with a fixed blend weight. The
//! ledger is the only trust state shared across agents, and because ticks run
//! on one thread each report lands before the next agent acts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_events::{AgentId, ReputationSnapshot, SimTimestamp, TrustSample};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Weight of a new report against the current reputation
    pub update_weight: f64,
    /// Reputations below this mark an agent as suspected
    pub suspicion_threshold: f64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            update_weight: 0.3,
            suspicion_threshold: 0.35,
        }
    }
}

/// Authority-side record for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Reputation {
    pub value: f64,
    pub history: Vec<TrustSample>,
    /// Number of reports folded in so far
    pub reports: u64,
}

impl Reputation {
    fn new(value: f64, now: SimTimestamp) -> Self {
        Self {
            value,
            history: vec![TrustSample {
                timestamp: now,
                score: value,
            }],
            reports: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Authority {
    config: AuthorityConfig,
    init: f64,
    reputations: BTreeMap<AgentId, Reputation>,
}

impl Authority {
    pub fn new(config: AuthorityConfig, init: f64) -> Self {
        Self {
            config,
            init,
            reputations: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Ensures `agent` has a reputation, starting from the neutral value.
    pub fn register(&mut self, agent: AgentId, now: SimTimestamp) {
        let init = self.init;
        self.reputations
            .entry(agent)
            .or_insert_with(|| Reputation::new(init, now));
    }

    /// Folds `from`'s opinion of `to` into `to`'s reputation.
    ///
    /// Self-reports are ignored.
    pub fn receive_trust_update(
        &mut self,
        from: AgentId,
        to: AgentId,
        trust: f64,
        now: SimTimestamp,
    ) {
        if from == to {
            return;
        }
        let alpha = self.config.update_weight;
        let init = self.init;
        let reputation = self
            .reputations
            .entry(to)
            .or_insert_with(|| Reputation::new(init, now));
        let previous = reputation.value;
        reputation.value = (1.0 - alpha) * previous + alpha * trust;
        reputation.reports += 1;
        reputation.history.push(TrustSample {
            timestamp: now,
            score: reputation.value,
        });
        debug!(
            from = %from,
            to = %to,
            report = trust,
            previous,
            reputation = reputation.value,
            "Authority reputation updated"
        );
    }

    pub fn reputation(&self, agent: AgentId) -> Option<f64> {
        self.reputations.get(&agent).map(|r| r.value)
    }

    pub fn reputation_or_init(&self, agent: AgentId) -> f64 {
        self.reputation(agent).unwrap_or(self.init)
    }

    pub fn record(&self, agent: AgentId) -> Option<&Reputation> {
        self.reputations.get(&agent)
    }

    pub fn is_suspected(&self, agent: AgentId) -> bool {
        self.reputation(agent)
            .is_some_and(|value| value < self.config.suspicion_threshold)
    }

    /// Agents currently below the suspicion threshold, in id order.
    pub fn suspected(&self) -> Vec<AgentId> {
        self.reputations
            .iter()
            .filter(|(_, r)| r.value < self.config.suspicion_threshold)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn snapshot(&self, now: SimTimestamp) -> ReputationSnapshot {
        ReputationSnapshot {
            timestamp: now,
            reputations: self
                .reputations
                .iter()
                .map(|(id, r)| (*id, r.value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_blends_never_overwrites() {
        let mut authority = Authority::new(AuthorityConfig::default(), 0.5);
        authority.register(AgentId(2), SimTimestamp::default());
        authority.receive_trust_update(AgentId(1), AgentId(2), 0.0, SimTimestamp::new(1, 0.1));
        let value = authority.reputation(AgentId(2)).unwrap();
        assert!((value - 0.35).abs() < 1e-12);

        authority.receive_trust_update(AgentId(3), AgentId(2), 0.0, SimTimestamp::new(2, 0.2));
        let value = authority.reputation(AgentId(2)).unwrap();
        assert!((value - 0.245).abs() < 1e-12);
        assert_eq!(authority.record(AgentId(2)).unwrap().reports, 2);
        assert_eq!(authority.record(AgentId(2)).unwrap().history.len(), 3);
    }

    #[test]
    fn test_self_reports_ignored() {
        let mut authority = Authority::new(AuthorityConfig::default(), 0.5);
        authority.register(AgentId(1), SimTimestamp::default());
        authority.receive_trust_update(AgentId(1), AgentId(1), 1.0, SimTimestamp::default());
        assert_eq!(authority.reputation(AgentId(1)), Some(0.5));
    }

    #[test]
    fn test_suspicion() {
        let mut authority = Authority::new(AuthorityConfig::default(), 0.5);
        for id in 0..3 {
            authority.register(AgentId(id), SimTimestamp::default());
        }
        assert!(authority.suspected().is_empty());
        for _ in 0..3 {
            authority.receive_trust_update(AgentId(0), AgentId(2), 0.0, SimTimestamp::default());
        }
        assert!(authority.is_suspected(AgentId(2)));
        assert!(!authority.is_suspected(AgentId(1)));
        assert!(!authority.is_suspected(AgentId(7)));
        assert_eq!(authority.suspected(), vec![AgentId(2)]);

        let snapshot = authority.snapshot(SimTimestamp::new(5, 0.5));
        assert_eq!(snapshot.reputations.len(), 3);
    }
}
