//! Side Allocation
//!
//! The object can only be pushed by four agents standing on four distinct
//! sides. The allocator hands out sides nearest-first and treats any attempt to
//! occupy a taken slot as a wiring defect.

use serde::{Deserialize, Serialize};
use std::fmt;
use swarm_events::{AgentId, Vec2};
use tracing::info;

use crate::environment::TransportObject;

/// Number of agents that must hold a side before transport begins.
pub const NEEDED_ROBOTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl ObjectSide {
    pub const ALL: [ObjectSide; 4] = [
        ObjectSide::Top,
        ObjectSide::Bottom,
        ObjectSide::Left,
        ObjectSide::Right,
    ];

    fn slot(self) -> usize {
        match self {
            ObjectSide::Top => 0,
            ObjectSide::Bottom => 1,
            ObjectSide::Left => 2,
            ObjectSide::Right => 3,
        }
    }

    pub fn opposite(self) -> ObjectSide {
        match self {
            ObjectSide::Top => ObjectSide::Bottom,
            ObjectSide::Bottom => ObjectSide::Top,
            ObjectSide::Left => ObjectSide::Right,
            ObjectSide::Right => ObjectSide::Left,
        }
    }

    /// Direction the object moves when pushed from this side.
    pub fn push_direction(self) -> Vec2 {
        match self {
            ObjectSide::Top => Vec2::new(0.0, 1.0),
            ObjectSide::Bottom => Vec2::new(0.0, -1.0),
            ObjectSide::Left => Vec2::new(1.0, 0.0),
            ObjectSide::Right => Vec2::new(-1.0, 0.0),
        }
    }

    /// Side that pushes along the given unit grid direction, if axis-aligned.
    pub fn for_push(dx: i32, dy: i32) -> Option<ObjectSide> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(ObjectSide::Top),
            (0, -1) => Some(ObjectSide::Bottom),
            (1, 0) => Some(ObjectSide::Left),
            (-1, 0) => Some(ObjectSide::Right),
            _ => None,
        }
    }

    /// Point where an agent of radius `robot_radius` stands to push.
    pub fn offset_point(self, object: &TransportObject, robot_radius: f64) -> Vec2 {
        object.position - self.push_direction() * (object.half_size() + robot_radius)
    }
}

impl fmt::Display for ObjectSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectSide::Top => write!(f, "top"),
            ObjectSide::Bottom => write!(f, "bottom"),
            ObjectSide::Left => write!(f, "left"),
            ObjectSide::Right => write!(f, "right"),
        }
    }
}

/// Four mutually exclusive slots around the object.
#[derive(Debug, Clone, Default)]
pub struct OccupiedSidesHandler {
    slots: [Option<AgentId>; 4],
}

impl OccupiedSidesHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `agent` the free side nearest to `position`.
    ///
    /// An agent that already holds a side keeps it. Returns `None` when every
    /// side is taken.
    pub fn assign_side(
        &mut self,
        object: &TransportObject,
        agent: AgentId,
        position: Vec2,
        robot_radius: f64,
    ) -> Option<ObjectSide> {
        if let Some(side) = self.side_of(agent) {
            return Some(side);
        }

        let mut candidates: Vec<(ObjectSide, f64)> = ObjectSide::ALL
            .iter()
            .map(|&side| (side, side.offset_point(object, robot_radius).distance(position)))
            .collect();
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let side = candidates
            .into_iter()
            .map(|(side, _)| side)
            .find(|side| self.occupant(*side).is_none())?;
        self.occupy(side, agent);
        Some(side)
    }

    /// Puts `agent` on `side`.
    ///
    /// # Panics
    ///
    /// Panics if the side is already occupied or the agent already holds a
    /// side; both mean the caller skipped the allocator's bookkeeping.
    pub fn occupy(&mut self, side: ObjectSide, agent: AgentId) {
        if let Some(holder) = self.slots[side.slot()] {
            panic!("side {side} is already occupied by {holder}; refusing to assign {agent}");
        }
        if let Some(held) = self.side_of(agent) {
            panic!("{agent} already occupies side {held}; refusing to assign {side}");
        }
        self.slots[side.slot()] = Some(agent);
        info!(%agent, %side, "side assigned");
    }

    /// Frees `side`, returning the agent that held it.
    pub fn release_side(&mut self, side: ObjectSide) -> Option<AgentId> {
        let released = self.slots[side.slot()].take();
        if let Some(agent) = released {
            info!(%agent, %side, "side released");
        }
        released
    }

    /// Frees whichever side `agent` holds.
    pub fn release_agent(&mut self, agent: AgentId) -> Option<ObjectSide> {
        let side = self.side_of(agent)?;
        self.release_side(side);
        Some(side)
    }

    pub fn occupant(&self, side: ObjectSide) -> Option<AgentId> {
        self.slots[side.slot()]
    }

    pub fn side_of(&self, agent: AgentId) -> Option<ObjectSide> {
        ObjectSide::ALL
            .iter()
            .copied()
            .find(|side| self.slots[side.slot()] == Some(agent))
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn free_sides(&self) -> Vec<ObjectSide> {
        ObjectSide::ALL
            .iter()
            .copied()
            .filter(|side| self.occupant(*side).is_none())
            .collect()
    }

    /// Read straight from the slots on every call.
    pub fn are_all_sides_occupied(&self, required: usize) -> bool {
        self.occupied_count() >= required
    }
}
