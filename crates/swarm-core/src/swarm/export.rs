//! Trust-history export and reload.
//!
//! Each agent's records are written keyed by agent label and peer label, so
//! a later run with the same roster can be seeded from them.

use std::collections::BTreeMap;
use std::path::Path;
use swarm_events::TrustHistoryExport;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SwarmConfig;

use super::Swarm;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Swarm {
    /// Every agent's interaction lists, keyed by label.
    pub fn export_trust_history(&self) -> TrustHistoryExport {
        let agents = self
            .agents
            .iter()
            .filter_map(|agent| {
                let service = agent.trust_service()?;
                let history = service.export(|peer| self.label_of(peer));
                Some((agent.label.clone(), history))
            })
            .collect::<BTreeMap<_, _>>();

        TrustHistoryExport {
            run_id: self.run_id,
            seed: self.config.simulation.seed,
            exported_at: self.clock.now(),
            agents,
        }
    }

    pub fn write_trust_history(&self, path: &Path) -> Result<(), ExportError> {
        let export = self.export_trust_history();
        std::fs::write(path, export.to_json()?)?;
        info!(path = %path.display(), agents = export.agents.len(), "Trust history written");
        Ok(())
    }
}

pub fn read_trust_history(path: &Path) -> Result<TrustHistoryExport, ExportError> {
    let content = std::fs::read_to_string(path)?;
    Ok(TrustHistoryExport::from_json(&content)?)
}

/// Attaches exported histories to the matching robots of `config`. Returns how
/// many robots were seeded.
pub fn apply_trust_history(config: &mut SwarmConfig, export: &TrustHistoryExport) -> usize {
    let mut seeded = 0;
    for robot in &mut config.robots {
        if let Some(history) = export.agent(&robot.label) {
            robot.trust_history = Some(history.clone());
            seeded += 1;
        }
    }
    for label in export.agents.keys() {
        if !config.robots.iter().any(|r| &r.label == label) {
            warn!(agent = %label, "Exported history has no matching robot");
        }
    }
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_events::{AgentId, Interaction, SimTimestamp};

    fn seeded_swarm() -> Swarm {
        let mut swarm = Swarm::new(SwarmConfig::default()).unwrap();
        let interaction = Interaction::new(
            AgentId(1),
            AgentId(5),
            Some(false),
            SimTimestamp::new(3, 0.3),
            Default::default(),
        );
        swarm.record_interaction(interaction);
        swarm
    }

    #[test]
    fn test_export_keys_by_label() {
        let swarm = seeded_swarm();
        let export = swarm.export_trust_history();
        assert_eq!(export.agents.len(), 6);
        assert_eq!(export.seed, 42);
        let robot_2 = export.agent("robot_2").unwrap();
        assert_eq!(robot_2.peers["robot_6"].len(), 1);
        assert_eq!(robot_2.interaction_count(), 1);
    }

    #[test]
    fn test_apply_reaches_matching_robots_only() {
        let export = seeded_swarm().export_trust_history();
        let mut config = SwarmConfig::default();
        config.robots.truncate(3);
        assert_eq!(apply_trust_history(&mut config, &export), 3);
        assert!(config.robots.iter().all(|r| r.trust_history.is_some()));
    }

    #[test]
    fn test_disabled_trust_exports_nothing() {
        let mut config = SwarmConfig::default();
        config.simulation.trust_enabled = false;
        let swarm = Swarm::new(config).unwrap();
        assert!(swarm.export_trust_history().agents.is_empty());
    }
}
