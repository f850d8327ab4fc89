//! Per-agent trust façade.

use std::collections::BTreeMap;
use swarm_events::{AgentId, AgentTrustHistory, Interaction, SimTimestamp};
use tracing::debug;

use super::{
    calculate_trust, Authority, ContextInformation, DirectTrust, IndirectTrust, PeerOpinions,
    TrustConstants, TrustRecord,
};

/// Outcome of weighing a peer against the current context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustAssessment {
    pub trust: f64,
    pub threshold: f64,
    pub accepted: bool,
}

/// Holds one agent's trust records and turns interactions into decisions.
#[derive(Debug, Clone)]
pub struct TrustService {
    owner: AgentId,
    constants: TrustConstants,
    records: BTreeMap<AgentId, TrustRecord>,
}

impl TrustService {
    pub fn new(owner: AgentId, constants: TrustConstants) -> Self {
        Self {
            owner,
            constants,
            records: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    pub fn constants(&self) -> &TrustConstants {
        &self.constants
    }

    pub fn record(&self, peer: AgentId) -> Option<&TrustRecord> {
        self.records.get(&peer)
    }

    pub fn records(&self) -> &BTreeMap<AgentId, TrustRecord> {
        &self.records
    }

    /// Last computed score for `peer`, if this agent has ever dealt with it.
    pub fn trust_score(&self, peer: AgentId) -> Option<f64> {
        self.records.get(&peer).map(TrustRecord::trust_score)
    }

    pub fn trust_or_init(&self, peer: AgentId) -> f64 {
        self.trust_score(peer)
            .unwrap_or(self.constants.init_trust_value)
    }

    /// Trust in the interaction's peer if `interaction` were recorded now.
    pub fn evaluate(
        &self,
        interaction: &Interaction,
        opinions: &PeerOpinions,
        authority: &Authority,
    ) -> f64 {
        let fresh;
        let record = match self.records.get(&interaction.to) {
            Some(record) => record,
            None => {
                fresh = TrustRecord::new(self.constants.init_trust_value, interaction.timestamp);
                &fresh
            }
        };
        let direct = DirectTrust::calculate(record, interaction, &self.constants);
        let indirect =
            IndirectTrust::calculate(interaction.to, opinions, authority, &self.constants);
        calculate_trust(direct, indirect, &self.constants)
    }

    /// Runs the update pipeline for `interaction` and returns the new trust.
    ///
    /// With `persist` the interaction is appended to the peer's record
    /// (created on first contact) and the result is reported to the
    /// authority. Without it nothing changes.
    pub fn add_interaction(
        &mut self,
        mut interaction: Interaction,
        opinions: &PeerOpinions,
        authority: &mut Authority,
        persist: bool,
    ) -> f64 {
        let trust = self.evaluate(&interaction, opinions, authority);
        if !persist {
            return trust;
        }

        interaction.trust_score = trust;
        let peer = interaction.to;
        let timestamp = interaction.timestamp;
        let init = self.constants.init_trust_value;
        self.records
            .entry(peer)
            .or_insert_with(|| TrustRecord::new(init, timestamp))
            .push(interaction);
        authority.receive_trust_update(self.owner, peer, trust, timestamp);
        trust
    }

    /// Compares trust in `peer` with the context threshold without side effects.
    pub fn assess(
        &self,
        peer: AgentId,
        context: &ContextInformation,
        opinions: &PeerOpinions,
        authority: &Authority,
        now: SimTimestamp,
    ) -> TrustAssessment {
        let probe = self.probe(peer, context, now);
        let trust = self.evaluate(&probe, opinions, authority);
        let threshold = context.threshold();
        TrustAssessment {
            trust,
            threshold,
            accepted: trust >= threshold,
        }
    }

    /// Decides whether `peer` is trustworthy enough in `context`.
    ///
    /// A probe interaction with no outcome runs through the usual pipeline;
    /// with `update` it is recorded and reported like any other interaction,
    /// otherwise the call is a pure look-ahead.
    pub fn make_trust_decision(
        &mut self,
        peer: AgentId,
        context: &ContextInformation,
        update: bool,
        opinions: &PeerOpinions,
        authority: &mut Authority,
        now: SimTimestamp,
    ) -> bool {
        let probe = self.probe(peer, context, now);
        let trust = self.add_interaction(probe, opinions, authority, update);
        let threshold = context.threshold();
        let accepted = trust >= threshold;
        debug!(
            owner = %self.owner,
            peer = %peer,
            trust,
            threshold,
            accepted,
            update,
            "Trust decision"
        );
        accepted
    }

    /// Replaces the record for `peer` with previously exported interactions.
    pub fn seed_history(&mut self, peer: AgentId, interactions: Vec<Interaction>) {
        let record = TrustRecord::from_history(self.constants.init_trust_value, interactions);
        self.records.insert(peer, record);
    }

    /// Interaction lists keyed by the label `label_of` gives each peer.
    pub fn export(&self, label_of: impl Fn(AgentId) -> String) -> AgentTrustHistory {
        let mut history = AgentTrustHistory::new(self.owner);
        for (peer, record) in &self.records {
            history
                .peers
                .insert(label_of(*peer), record.interactions().to_vec());
        }
        history
    }

    fn probe(&self, peer: AgentId, context: &ContextInformation, now: SimTimestamp) -> Interaction {
        Interaction::new(self.owner, peer, None, now, context.snapshot())
    }
}
