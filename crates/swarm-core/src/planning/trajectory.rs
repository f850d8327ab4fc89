//! Coarse path to turn-based pushing steps.

use serde::{Deserialize, Serialize};
use swarm_events::Vec2;

use super::grid::{Cell, OccupancyGrid};
use crate::sides::ObjectSide;

/// One waypoint for the object and the side that must push it there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub target: Vec2,
    pub side: ObjectSide,
}

const EPSILON: f64 = 1e-9;

/// Splits the move from `from` through the centres of `cells` into
/// axis-aligned sub-steps, X first, each tagged with its pushing side.
pub fn build_trajectory(grid: &OccupancyGrid, from: Vec2, cells: &[Cell]) -> Vec<TrajectoryStep> {
    let mut steps = Vec::new();
    let mut at = from;
    for cell in cells {
        let center = grid.center_of(*cell);
        let dx = center.x - at.x;
        if dx.abs() > EPSILON {
            if let Some(side) = ObjectSide::for_push(dx.signum() as i32, 0) {
                at = Vec2::new(center.x, at.y);
                steps.push(TrajectoryStep { target: at, side });
            }
        }
        let dy = center.y - at.y;
        if dy.abs() > EPSILON {
            if let Some(side) = ObjectSide::for_push(0, dy.signum() as i32) {
                at = Vec2::new(at.x, center.y);
                steps.push(TrajectoryStep { target: at, side });
            }
        }
    }
    steps
}
