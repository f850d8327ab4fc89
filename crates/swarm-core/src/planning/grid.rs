//! Occupancy grid over the world, sized for the transported object.

use serde::{Deserialize, Serialize};
use std::fmt;
use swarm_events::Vec2;

use crate::environment::{Environment, Rect};

/// Grid coordinate, column first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A cell is blocked when the object, centred on it, would leave the world or
/// come within `clearance` of an obstacle.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cols: i32,
    rows: i32,
    cell_size: f64,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    pub fn new(bounds: &Rect, cell_size: f64, obstacles: &[Rect], object_size: f64, clearance: f64) -> Self {
        let cols = (bounds.width / cell_size).ceil().max(1.0) as i32;
        let rows = (bounds.height / cell_size).ceil().max(1.0) as i32;
        let mut grid = Self {
            cols,
            rows,
            cell_size,
            blocked: vec![false; (cols * rows) as usize],
        };
        for row in 0..rows {
            for col in 0..cols {
                let cell = Cell::new(col, row);
                let footprint = Rect::centered(grid.center_of(cell), object_size);
                let blocked = !bounds.contains_rect(&footprint)
                    || obstacles
                        .iter()
                        .any(|o| o.inflate(clearance).intersects(&footprint));
                grid.blocked[(row * cols + col) as usize] = blocked;
            }
        }
        grid
    }

    /// Grid for the environment's current obstacles, leaving room for the
    /// pushing agents around the object.
    pub fn from_environment(env: &Environment, robot_radius: f64) -> Self {
        Self::new(
            env.bounds(),
            env.cell_size(),
            env.obstacles(),
            env.object().size,
            2.0 * robot_radius,
        )
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols && cell.row < self.rows
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.blocked[(cell.row * self.cols + cell.col) as usize]
    }

    /// Marks `cell` blocked.
    pub fn block(&mut self, cell: Cell) {
        if self.in_bounds(cell) {
            self.blocked[(cell.row * self.cols + cell.col) as usize] = true;
        }
    }

    pub fn cell_of(&self, p: Vec2) -> Cell {
        let col = (p.x / self.cell_size).floor() as i32;
        let row = (p.y / self.cell_size).floor() as i32;
        Cell::new(col.clamp(0, self.cols - 1), row.clamp(0, self.rows - 1))
    }

    pub fn center_of(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            (cell.col as f64 + 0.5) * self.cell_size,
            (cell.row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Free 8-connected neighbours with their step cost. Diagonals are only
    /// allowed when both orthogonal cells beside them are free.
    pub fn neighbors8(&self, cell: Cell) -> Vec<(Cell, f64)> {
        let mut out = Vec::with_capacity(8);
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let next = Cell::new(cell.col + dc, cell.row + dr);
                if !self.is_free(next) {
                    continue;
                }
                if dr != 0 && dc != 0 {
                    let beside_x = Cell::new(cell.col + dc, cell.row);
                    let beside_y = Cell::new(cell.col, cell.row + dr);
                    if !self.is_free(beside_x) || !self.is_free(beside_y) {
                        continue;
                    }
                    out.push((next, std::f64::consts::SQRT_2));
                } else {
                    out.push((next, 1.0));
                }
            }
        }
        out
    }
}
