//! Trajectory Planning
//!
//! The planner runs A* from the object's cell to the base's cell, then hands
//! out the path one leg at a time as turn-based pushing steps. A leg is a few
//! coarse cells; when it is used up the agents come back through PLANNING and
//! the next leg is cut from the same path, unless the path got blocked.

pub mod astar;
pub mod grid;
pub mod trajectory;

pub use astar::find_path;
pub use grid::{Cell, OccupancyGrid};
pub use trajectory::{build_trajectory, TrajectoryStep};

use serde::{Deserialize, Serialize};
use swarm_events::Vec2;
use tracing::{info, warn};

use crate::environment::TransportObject;
use crate::sides::ObjectSide;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// A* attempts before planning is reported as failed
    pub max_attempts: usize,
    /// Furthest the start may be moved back along the known path on retry
    pub backtrack_steps: usize,
    /// Coarse cells per leg
    pub leg_length: usize,
    /// Distance the object moves per push
    pub push_speed: f64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backtrack_steps: 3,
            leg_length: 3,
            push_speed: 5.0,
        }
    }
}

/// Shared planner for the transport team.
#[derive(Debug, Clone)]
pub struct PlanningController {
    config: PlanningConfig,
    goal: Option<Vec2>,
    path: Vec<Cell>,
    /// Path index where the current leg starts
    path_index: usize,
    /// Path index where the current leg ends
    leg_end: usize,
    trajectory: Vec<TrajectoryStep>,
    step_index: usize,
    last_attempts: usize,
}

impl PlanningController {
    pub fn new(config: PlanningConfig) -> Self {
        Self {
            config,
            goal: None,
            path: Vec::new(),
            path_index: 0,
            leg_end: 0,
            trajectory: Vec::new(),
            step_index: 0,
            last_attempts: 0,
        }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn set_goal(&mut self, goal: Vec2) {
        self.goal = Some(goal);
    }

    pub fn goal(&self) -> Option<Vec2> {
        self.goal
    }

    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn trajectory(&self) -> &[TrajectoryStep] {
        &self.trajectory
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// A* attempts used by the most recent search.
    pub fn last_attempt_count(&self) -> usize {
        self.last_attempts
    }

    /// Makes sure a leg is ready for the team to push.
    ///
    /// An unfinished leg is kept unless `force_new`. A finished leg is followed
    /// by the next one from the known path when that path is still clear;
    /// otherwise A* searches again, backing the start up along the known path
    /// on each retry. Returns false once every attempt failed.
    ///
    /// # Panics
    ///
    /// Panics if no goal was set.
    pub fn collaboratively_plan_trajectory(
        &mut self,
        grid: &OccupancyGrid,
        object: &TransportObject,
        force_new: bool,
    ) -> bool {
        let goal = match self.goal {
            Some(goal) => goal,
            None => panic!("planning requested before a goal was set"),
        };

        if !force_new && !self.is_trajectory_complete() {
            return true;
        }

        let here = grid.cell_of(object.position);
        if !force_new
            && self.path.get(self.leg_end) == Some(&here)
            && !self.path_blocked(grid)
            && self.leg_end + 1 < self.path.len()
        {
            self.start_leg(grid, object.position, self.leg_end);
            return true;
        }

        let goal_cell = grid.cell_of(goal);
        let travelled = self.path.iter().position(|c| *c == here);
        let attempts = self.config.max_attempts.max(1);

        for attempt in 0..attempts {
            let back = if attempts > 1 {
                attempt * self.config.backtrack_steps / (attempts - 1)
            } else {
                0
            };
            let Some(route) = self.route_with_backtrack(grid, here, goal_cell, travelled, back)
            else {
                continue;
            };
            self.last_attempts = attempt + 1;
            info!(
                attempts = self.last_attempts,
                cells = route.len(),
                backtrack = back,
                "Transport path planned"
            );
            self.path = route;
            self.start_leg(grid, object.position, 0);
            return true;
        }

        self.last_attempts = attempts;
        self.trajectory.clear();
        self.step_index = 0;
        warn!(
            attempts,
            from = %here,
            to = %goal_cell,
            "No transport path found; holding position"
        );
        false
    }

    /// A* from `back` cells behind the object's position on the known path,
    /// prefixed with the retreat to that cell.
    fn route_with_backtrack(
        &self,
        grid: &OccupancyGrid,
        here: Cell,
        goal: Cell,
        travelled: Option<usize>,
        back: usize,
    ) -> Option<Vec<Cell>> {
        let current = travelled.unwrap_or(0);
        let back = if travelled.is_some() { back.min(current) } else { 0 };
        let start_index = current - back;

        let mut route = vec![here];
        if back > 0 {
            let retreat = self.path[start_index..current].iter().rev();
            for cell in retreat {
                if !grid.is_free(*cell) {
                    return None;
                }
                route.push(*cell);
            }
        }
        let start = *route.last().unwrap_or(&here);
        let tail = find_path(grid, start, goal)?;
        route.extend(tail.into_iter().skip(1));
        Some(route)
    }

    fn start_leg(&mut self, grid: &OccupancyGrid, from: Vec2, start: usize) {
        let last = self.path.len().saturating_sub(1);
        let end = (start + self.config.leg_length).min(last);
        self.path_index = start;
        self.leg_end = end;
        self.trajectory = build_trajectory(grid, from, &self.path[start..=end]);
        self.step_index = 0;
    }

    pub fn is_trajectory_complete(&self) -> bool {
        self.step_index >= self.trajectory.len()
    }

    pub fn current_step(&self) -> Option<&TrajectoryStep> {
        self.trajectory.get(self.step_index)
    }

    pub fn required_side(&self) -> Option<ObjectSide> {
        self.current_step().map(|s| s.side)
    }

    /// Whether any cell ahead of the object on the known path is now blocked.
    pub fn path_blocked(&self, grid: &OccupancyGrid) -> bool {
        self.path
            .iter()
            .skip(self.path_index + 1)
            .any(|cell| !grid.is_free(*cell))
    }

    /// Moves the object along the current step. Returns true when the step
    /// was completed and the shared counter advanced.
    pub fn push_object(&mut self, object: &mut TransportObject) -> bool {
        let Some(step) = self.current_step().copied() else {
            return false;
        };
        object.position = object.position.step_towards(step.target, self.config.push_speed);
        if object.position == step.target {
            self.step_index += 1;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Rect;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 200.0, 200.0);

    fn planner(goal: Vec2) -> PlanningController {
        let mut planner = PlanningController::new(PlanningConfig::default());
        planner.set_goal(goal);
        planner
    }

    fn object_at(p: Vec2) -> TransportObject {
        TransportObject::new(p, 10.0)
    }

    #[test]
    #[should_panic(expected = "goal")]
    fn test_planning_without_goal_panics() {
        let grid = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let mut planner = PlanningController::new(PlanningConfig::default());
        planner.collaboratively_plan_trajectory(&grid, &object_at(Vec2::new(50.0, 50.0)), false);
    }

    #[test]
    fn test_plans_first_leg() {
        let grid = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let mut planner = planner(Vec2::new(170.0, 30.0));
        let object = object_at(Vec2::new(30.0, 30.0));

        assert!(planner.collaboratively_plan_trajectory(&grid, &object, false));
        assert_eq!(planner.last_attempt_count(), 1);
        assert_eq!(planner.path().len(), 8);
        // Leg of 3 cells along a straight row
        assert_eq!(planner.trajectory().len(), 3);
        assert!(planner.trajectory().iter().all(|s| s.side == ObjectSide::Left));
        assert!(!planner.is_trajectory_complete());
    }

    #[test]
    fn test_unfinished_leg_is_kept() {
        let grid = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let mut planner = planner(Vec2::new(170.0, 30.0));
        let object = object_at(Vec2::new(30.0, 30.0));
        planner.collaboratively_plan_trajectory(&grid, &object, false);
        let before = planner.trajectory().to_vec();
        assert!(planner.collaboratively_plan_trajectory(&grid, &object, false));
        assert_eq!(planner.trajectory(), &before[..]);
    }

    #[test]
    fn test_push_until_delivered() {
        let grid = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let goal = Vec2::new(170.0, 30.0);
        let mut planner = planner(goal);
        let mut object = object_at(Vec2::new(30.0, 30.0));

        let mut legs = 0;
        while object.position != goal {
            assert!(planner.collaboratively_plan_trajectory(&grid, &object, false));
            legs += 1;
            while !planner.is_trajectory_complete() {
                planner.push_object(&mut object);
            }
            assert!(legs < 10);
        }
        assert_eq!(object.position, goal);
        assert_eq!(legs, 3);
    }

    #[test]
    fn test_unsolvable_grid_fails_after_three_attempts() {
        let wall = Rect::new(90.0, 0.0, 20.0, 200.0);
        let grid = OccupancyGrid::new(&BOUNDS, 20.0, &[wall], 10.0, 0.0);
        let mut planner = planner(Vec2::new(170.0, 30.0));
        let object = object_at(Vec2::new(30.0, 30.0));

        assert!(!planner.collaboratively_plan_trajectory(&grid, &object, false));
        assert_eq!(planner.last_attempt_count(), 3);
        assert!(planner.is_trajectory_complete());
        assert!(planner.current_step().is_none());
    }

    #[test]
    fn test_new_obstacle_triggers_replan() {
        let open = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let mut planner = planner(Vec2::new(170.0, 30.0));
        let object = object_at(Vec2::new(30.0, 30.0));
        planner.collaboratively_plan_trajectory(&open, &object, false);
        assert!(!planner.path_blocked(&open));

        let blocker = Rect::new(80.0, 20.0, 20.0, 20.0);
        let blocked = OccupancyGrid::new(&BOUNDS, 20.0, &[blocker], 10.0, 0.0);
        assert!(planner.path_blocked(&blocked));

        assert!(planner.collaboratively_plan_trajectory(&blocked, &object, true));
        assert!(!planner.path_blocked(&blocked));
        assert!(planner.path().iter().all(|c| blocked.is_free(*c)));
    }

    #[test]
    fn test_backtracks_along_known_path() {
        // Push one leg so there is a travelled path to back up along
        let open = OccupancyGrid::new(&BOUNDS, 20.0, &[], 10.0, 0.0);
        let mut planner = planner(Vec2::new(170.0, 30.0));
        let mut object = object_at(Vec2::new(30.0, 30.0));
        planner.collaboratively_plan_trajectory(&open, &object, false);
        while !planner.is_trajectory_complete() {
            planner.push_object(&mut object);
        }

        // Seal off the goal: no backed-up start can reach it either
        let sealed = OccupancyGrid::new(&BOUNDS, 20.0, &[Rect::new(150.0, 0.0, 50.0, 200.0)], 10.0, 0.0);
        assert!(!planner.collaboratively_plan_trajectory(&sealed, &object, true));
        assert_eq!(planner.last_attempt_count(), 3);
    }
}
