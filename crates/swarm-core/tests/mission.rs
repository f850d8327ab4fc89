//! Mission flow tests: assembly, transport, delivery and roster changes.

use swarm_core::events::Vec2;
use swarm_core::{
    AgentState, CoordinationStatus, Rect, RobotConfig, Swarm, SwarmConfig, NEEDED_ROBOTS,
};

const OBJECT: Vec2 = Vec2::new(560.0, 400.0);

const AROUND_OBJECT: [Vec2; 5] = [
    Vec2::new(500.0, 400.0),
    Vec2::new(620.0, 400.0),
    Vec2::new(560.0, 340.0),
    Vec2::new(560.0, 460.0),
    Vec2::new(520.0, 450.0),
];

/// `count` honest robots within detection range of the object, the first
/// one leading.
fn team_at_object(count: usize) -> SwarmConfig {
    let mut config = SwarmConfig::default();
    config.environment.obstacles.clear();
    config.environment.object.position = OBJECT;
    config.robots = AROUND_OBJECT
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, position)| {
            let robot = RobotConfig::new(format!("robot_{}", i + 1), *position);
            if i == 0 {
                robot.leader()
            } else {
                robot
            }
        })
        .collect();
    config
}

#[test]
fn test_team_delivers_object() {
    let mut swarm = Swarm::new(team_at_object(4)).unwrap();
    let summary = swarm.run(3000);

    assert!(summary.delivered, "object stuck at {:?}", summary.object_position);
    assert_eq!(summary.status, CoordinationStatus::Delivered);
    assert!(summary.ticks < 3000);
    assert!(swarm.environment().base().contains(swarm.environment().object().position));
    assert_eq!(summary.plan_failures, 0);
}

#[test]
fn test_team_routes_around_obstacle() {
    let mut config = team_at_object(4);
    config.environment.obstacles = vec![Rect::new(320.0, 200.0, 60.0, 160.0)];
    let mut swarm = Swarm::new(config).unwrap();
    let summary = swarm.run(3000);

    assert!(summary.delivered);
    let obstacle = swarm.environment().obstacles()[0];
    let grid = swarm.grid();
    assert!(swarm
        .planner()
        .path()
        .iter()
        .all(|cell| !obstacle.contains(grid.center_of(*cell))));
}

#[test]
fn test_everyone_claims_a_side_before_planning() {
    let mut swarm = Swarm::new(team_at_object(4)).unwrap();
    let first = swarm.tick();

    assert_eq!(first.status, CoordinationStatus::Ready);
    assert_eq!(swarm.sides().occupied_count(), NEEDED_ROBOTS);
    assert!(swarm
        .agents()
        .iter()
        .all(|a| a.state() == AgentState::ObjectFound));
    assert!(!swarm.message_log().is_empty());
}

#[test]
fn test_too_few_robots_is_reported_until_one_joins() {
    let mut swarm = Swarm::new(team_at_object(3)).unwrap();
    for _ in 0..50 {
        swarm.tick();
    }
    let report = swarm.tick();
    assert_eq!(
        report.status,
        CoordinationStatus::InsufficientRobots {
            available: 0,
            needed: 1
        }
    );
    assert_eq!(swarm.environment().object().position, OBJECT);
    assert!(swarm
        .agents()
        .iter()
        .all(|a| a.state() == AgentState::Idle));

    swarm
        .add_agent(RobotConfig::new("robot_4", AROUND_OBJECT[3]))
        .unwrap();
    let summary = swarm.run(3000);
    assert!(summary.delivered);
}

#[test]
fn test_removed_robot_releases_its_side() {
    let mut swarm = Swarm::new(team_at_object(5)).unwrap();
    swarm.tick();
    let holder = swarm
        .agents()
        .iter()
        .find(|a| swarm.sides().side_of(a.id).is_some() && !a.is_leader())
        .map(|a| a.id)
        .unwrap();

    swarm.remove_agent(holder);

    assert_eq!(swarm.sides().side_of(holder), None);
    assert_eq!(swarm.sides().occupied_count(), NEEDED_ROBOTS - 1);
    assert!(!swarm.agent(holder).unwrap().active);
    assert!(matches!(
        swarm.coordination_status(),
        CoordinationStatus::Assembling { occupied: 3 }
    ));
}

#[test]
fn test_trust_disabled_accepts_every_message() {
    let mut config = SwarmConfig::default();
    config.simulation.trust_enabled = false;
    config.environment.object.position = Vec2::new(150.0, 200.0);
    let mut swarm = Swarm::new(config).unwrap();
    swarm.run(200);

    assert!(!swarm.message_log().is_empty());
    assert!(swarm.message_log().iter().all(|e| e.was_accepted));
    assert!(swarm.agents().iter().all(|a| a.trust_service().is_none()));
}
