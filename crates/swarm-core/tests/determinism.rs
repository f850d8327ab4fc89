//! Determinism verification tests
//!
//! The same configuration and seed must replay the same run exactly.

use swarm_core::events::Vec2;
use swarm_core::{Swarm, SwarmConfig};

fn config(seed: u64) -> SwarmConfig {
    let mut config = SwarmConfig::default();
    config.simulation.seed = seed;
    // Close enough to the start that messages and trust updates happen early
    config.environment.object.position = Vec2::new(260.0, 220.0);
    config
}

fn positions(swarm: &Swarm) -> Vec<Vec2> {
    swarm.agents().iter().map(|a| a.position).collect()
}

#[test]
fn test_same_seed_replays_identically() {
    let mut first = Swarm::new(config(7)).unwrap();
    let mut second = Swarm::new(config(7)).unwrap();

    for _ in 0..400 {
        let a = first.tick();
        let b = second.tick();
        assert_eq!(a.transitions, b.transitions);
        assert_eq!(a.object_position, b.object_position);
    }

    assert_eq!(first.run_id(), second.run_id());
    assert_eq!(positions(&first), positions(&second));
    assert_eq!(first.message_log(), second.message_log());
    assert_eq!(first.reputation_snapshots(), second.reputation_snapshots());
    assert_eq!(
        first.export_trust_history().agents,
        second.export_trust_history().agents
    );
}

#[test]
fn test_different_seeds_diverge() {
    let mut first = Swarm::new(config(7)).unwrap();
    let mut second = Swarm::new(config(8)).unwrap();
    for _ in 0..50 {
        first.tick();
        second.tick();
    }

    assert_ne!(first.run_id(), second.run_id());
    assert_ne!(positions(&first), positions(&second));
}

#[test]
fn test_snapshot_per_tick() {
    let mut swarm = Swarm::new(config(3)).unwrap();
    for _ in 0..25 {
        swarm.tick();
    }
    let snapshots = swarm.reputation_snapshots();
    assert_eq!(snapshots.len(), 25);
    assert_eq!(snapshots.last().map(|s| s.timestamp.tick), Some(25));
    assert!(snapshots
        .iter()
        .all(|s| s.reputations.values().all(|r| (0.0..=1.0).contains(r))));
}
