use proptest::prelude::*;
use swarm_core::events::{AgentId, ContextSnapshot, Interaction, SimTimestamp, Vec2};
use swarm_core::fsm::agent_state_table;
use swarm_core::{
    erosion, AgentState, Authority, AuthorityConfig, GuardInputs, PeerOpinions, StateMachine,
    TrustConstants, TrustService,
};
use std::sync::Arc;

fn arb_interaction() -> impl Strategy<Value = (Option<bool>, Option<(f64, f64, f64, f64)>, Vec<bool>, u64)> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of((-500.0..500.0f64, -500.0..500.0f64, -500.0..500.0f64, -500.0..500.0f64)),
        prop::collection::vec(any::<bool>(), 0..4),
        0u64..50,
    )
}

fn arb_inputs() -> impl Strategy<Value = GuardInputs> {
    prop::array::uniform9(any::<bool>()).prop_map(|b| GuardInputs {
        return_home_requested: b[0],
        obstacle_nearby: b[1],
        object_detected: b[2],
        has_assigned_side: b[3],
        at_assigned_side: b[4],
        all_sides_occupied: b[5],
        trajectory_complete: b[6],
        object_at_base: b[7],
        at_base: b[8],
    })
}

proptest! {
    #[test]
    fn trust_stays_in_unit_range(steps in prop::collection::vec(arb_interaction(), 1..30)) {
        let constants = TrustConstants::default();
        let mut authority = Authority::new(AuthorityConfig::default(), constants.init_trust_value);
        let mut service = TrustService::new(AgentId(0), constants);
        let mut tick = 0;

        for (outcome, values, behaviors, gap) in steps {
            tick += gap;
            let mut interaction = Interaction::new(
                AgentId(0),
                AgentId(1),
                outcome,
                SimTimestamp::from_tick(tick, 0.1),
                ContextSnapshot::default(),
            );
            if let Some((ex, ey, rx, ry)) = values {
                interaction = interaction.with_values(Vec2::new(ex, ey), Some(Vec2::new(rx, ry).into()));
            }
            if !behaviors.is_empty() {
                interaction = interaction.with_behaviors(behaviors);
            }
            let trust = service.add_interaction(interaction, &PeerOpinions::default(), &mut authority, true);
            prop_assert!((0.0..=1.0).contains(&trust), "trust {} out of range", trust);
            prop_assert!((0.0..=1.0).contains(&authority.reputation_or_init(AgentId(1))));
        }
    }

    #[test]
    fn erosion_identity_and_convergence(score in 0.0..=1.0f64, t in 0.0..1000.0f64, dt in 0.001..1000.0f64) {
        let c = TrustConstants::default();
        let init = c.init_trust_value;
        prop_assert!((erosion(score, 0.0, init, c.erosion_rate) - score).abs() < 1e-12);

        let earlier = erosion(score, t, init, c.erosion_rate);
        let later = erosion(score, t + dt, init, c.erosion_rate);
        prop_assert!((later - init).abs() <= (earlier - init).abs() + 1e-12);
    }

    #[test]
    fn decision_is_deterministic(reputation_reports in prop::collection::vec(0.0..=1.0f64, 0..10), sensitivity in 0.0..=1.0f64) {
        let constants = TrustConstants::default();
        let mut authority = Authority::new(AuthorityConfig::default(), constants.init_trust_value);
        for (i, trust) in reputation_reports.iter().enumerate() {
            authority.receive_trust_update(AgentId(2 + i as u32), AgentId(1), *trust, SimTimestamp::default());
        }
        let mut context = swarm_core::ContextInformation::new(Default::default()).with_sensitivity(sensitivity);
        context.total_members = 6;

        let mut first = TrustService::new(AgentId(0), constants.clone());
        let mut second = TrustService::new(AgentId(0), constants);
        let mut authority_a = authority.clone();
        let mut authority_b = authority;
        let now = SimTimestamp::from_tick(5, 0.1);
        let a = first.make_trust_decision(AgentId(1), &context, true, &PeerOpinions::default(), &mut authority_a, now);
        let b = second.make_trust_decision(AgentId(1), &context, true, &PeerOpinions::default(), &mut authority_b, now);
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.trust_score(AgentId(1)), second.trust_score(AgentId(1)));
    }

    #[test]
    fn transition_is_pure(inputs in arb_inputs(), start in 0usize..7) {
        let table = Arc::new(agent_state_table());
        let machine = StateMachine::new(table, AgentState::ALL[start]);
        let next = machine.transition(&inputs);
        prop_assert_eq!(machine.transition(&inputs), next);
        prop_assert_eq!(machine.current(), AgentState::ALL[start]);
    }
}
