//! Per-peer trust record and time-based erosion.

use swarm_events::{Interaction, SimTimestamp, TrustSample};

/// Relaxes `score` toward `init` the longer it has gone without an update.
///
/// `INIT + (score - INIT) / (1 + rate * elapsed)`: zero elapsed time leaves the
/// score untouched, and both very high and very low scores drift back toward
/// the neutral value.
pub fn erosion(score: f64, elapsed_seconds: f64, init: f64, rate: f64) -> f64 {
    let elapsed = elapsed_seconds.max(0.0);
    init + (score - init) / (1.0 + rate * elapsed)
}

/// What one agent knows about one peer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustRecord {
    trust_score: f64,
    last_update: SimTimestamp,
    interactions: Vec<Interaction>,
    series: Vec<TrustSample>,
}

impl TrustRecord {
    pub fn new(init: f64, created: SimTimestamp) -> Self {
        Self {
            trust_score: init,
            last_update: created,
            interactions: Vec::new(),
            series: Vec::new(),
        }
    }

    /// Rebuilds a record from previously exported interactions.
    ///
    /// The score and last update come from the final interaction; an empty
    /// history yields a neutral record.
    pub fn from_history(init: f64, interactions: Vec<Interaction>) -> Self {
        let series: Vec<TrustSample> = interactions
            .iter()
            .map(|i| TrustSample {
                timestamp: i.timestamp,
                score: i.trust_score,
            })
            .collect();
        let (trust_score, last_update) = interactions
            .last()
            .map(|i| (i.trust_score, i.timestamp))
            .unwrap_or((init, SimTimestamp::default()));
        Self {
            trust_score,
            last_update,
            interactions,
            series,
        }
    }

    pub fn trust_score(&self) -> f64 {
        self.trust_score
    }

    pub fn last_update(&self) -> SimTimestamp {
        self.last_update
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn trust_series(&self) -> &[TrustSample] {
        &self.series
    }

    /// Current score eroded up to `now`.
    pub fn eroded_score(&self, now: SimTimestamp, init: f64, rate: f64) -> f64 {
        erosion(self.trust_score, now.seconds_since(self.last_update), init, rate)
    }

    /// True once any recorded interaction carried first-hand evidence.
    pub fn has_evidence(&self) -> bool {
        self.interactions.iter().any(Interaction::carries_evidence)
    }

    /// Appends a processed interaction and adopts its score.
    pub(crate) fn push(&mut self, interaction: Interaction) {
        self.trust_score = interaction.trust_score;
        self.last_update = interaction.timestamp;
        self.series.push(TrustSample {
            timestamp: interaction.timestamp,
            score: interaction.trust_score,
        });
        self.interactions.push(interaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_events::{AgentId, ContextSnapshot};

    #[test]
    fn test_erosion_zero_elapsed_is_identity() {
        for score in [0.0, 0.2, 0.5, 0.77, 1.0] {
            assert_eq!(erosion(score, 0.0, 0.5, 0.05), score);
        }
    }

    #[test]
    fn test_erosion_strengthens_with_time() {
        let after_7 = erosion(1.0, 7.0, 0.5, 0.05);
        let after_100 = erosion(1.0, 100.0, 0.5, 0.05);
        assert!(after_7 < 1.0);
        assert!(after_100 < after_7);
        assert!(after_100 > 0.5);

        // Low scores relax upward
        let low = erosion(0.0, 50.0, 0.5, 0.05);
        assert!(low > 0.0 && low < 0.5);
    }

    #[test]
    fn test_push_updates_score_and_series() {
        let mut record = TrustRecord::new(0.5, SimTimestamp::default());
        assert!(!record.has_evidence());

        let mut interaction = Interaction::new(
            AgentId(0),
            AgentId(1),
            Some(true),
            SimTimestamp::new(10, 1.0),
            ContextSnapshot::default(),
        );
        interaction.trust_score = 0.8;
        record.push(interaction);

        assert_eq!(record.trust_score(), 0.8);
        assert_eq!(record.last_update(), SimTimestamp::new(10, 1.0));
        assert_eq!(record.trust_series().len(), 1);
        assert!(record.has_evidence());

        let eroded = record.eroded_score(SimTimestamp::new(30, 3.0), 0.5, 0.05);
        assert!(eroded < 0.8 && eroded > 0.5);
    }

    #[test]
    fn test_from_history_restores_last_score() {
        let mut a = Interaction::new(
            AgentId(0),
            AgentId(1),
            Some(false),
            SimTimestamp::new(1, 0.1),
            ContextSnapshot::default(),
        );
        a.trust_score = 0.3;
        let mut b = a.clone();
        b.timestamp = SimTimestamp::new(2, 0.2);
        b.trust_score = 0.25;

        let record = TrustRecord::from_history(0.5, vec![a, b.clone()]);
        assert_eq!(record.trust_score(), 0.25);
        assert_eq!(record.last_update(), b.timestamp);
        assert_eq!(record.interactions().len(), 2);

        let empty = TrustRecord::from_history(0.5, Vec::new());
        assert_eq!(empty.trust_score(), 0.5);
    }
}
