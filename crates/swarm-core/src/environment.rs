//! Environment Model
//!
//! World bounds, the base, the transported object, obstacles and the
//! exploration coverage map.

use serde::{Deserialize, Serialize};
use swarm_events::Vec2;

/// Axis-aligned rectangle anchored at its top-left corner (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `size` centred on `center`.
    pub fn centered(center: Vec2, size: f64) -> Self {
        Self::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Point of the rectangle closest to `p`.
    pub fn nearest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }

    pub fn distance_to(&self, p: Vec2) -> f64 {
        self.nearest_point(p).distance(p)
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        self.nearest_point(p)
    }
}

/// The square object the swarm must deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportObject {
    /// Centre of the object
    pub position: Vec2,
    pub size: f64,
}

impl TransportObject {
    pub fn new(position: Vec2, size: f64) -> Self {
        Self { position, size }
    }

    pub fn half_size(&self) -> f64 {
        self.size / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect::centered(self.position, self.size)
    }
}

/// Environment geometry section of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub width: f64,
    pub height: f64,
    pub base: Rect,
    pub object: TransportObject,
    pub obstacles: Vec<Rect>,
    /// Side length of a planning and coverage grid cell
    pub cell_size: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            base: Rect::new(20.0, 20.0, 140.0, 140.0),
            object: TransportObject::new(Vec2::new(560.0, 400.0), 40.0),
            obstacles: vec![Rect::new(320.0, 200.0, 60.0, 160.0)],
            cell_size: 25.0,
        }
    }
}

/// Exploration coverage on a coarse grid.
#[derive(Debug, Clone)]
struct CoverageMap {
    cols: usize,
    rows: usize,
    cell_size: f64,
    visited: Vec<bool>,
    visited_count: usize,
}

impl CoverageMap {
    fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;
        Self {
            cols,
            rows,
            cell_size,
            visited: vec![false; cols * rows],
            visited_count: 0,
        }
    }

    fn mark(&mut self, p: Vec2) {
        if p.x < 0.0 || p.y < 0.0 {
            return;
        }
        let col = (p.x / self.cell_size) as usize;
        let row = (p.y / self.cell_size) as usize;
        if col >= self.cols || row >= self.rows {
            return;
        }
        let idx = row * self.cols + col;
        if !self.visited[idx] {
            self.visited[idx] = true;
            self.visited_count += 1;
        }
    }

    fn fraction(&self) -> f64 {
        self.visited_count as f64 / self.visited.len() as f64
    }
}

/// Live world state shared by every agent.
#[derive(Debug, Clone)]
pub struct Environment {
    bounds: Rect,
    base: Rect,
    object: TransportObject,
    obstacles: Vec<Rect>,
    cell_size: f64,
    coverage: CoverageMap,
    /// Bumped whenever the obstacle set changes
    revision: u64,
}

impl Environment {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, config.width, config.height),
            base: config.base,
            object: config.object.clone(),
            obstacles: config.obstacles.clone(),
            cell_size: config.cell_size,
            coverage: CoverageMap::new(config.width, config.height, config.cell_size),
            revision: 0,
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn base(&self) -> &Rect {
        &self.base
    }

    pub fn object(&self) -> &TransportObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut TransportObject {
        &mut self.object
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_obstacle(&mut self, obstacle: Rect) {
        self.obstacles.push(obstacle);
        self.revision += 1;
    }

    /// The object counts as delivered once its centre lies inside the base.
    pub fn object_at_base(&self) -> bool {
        self.base.contains(self.object.position)
    }

    /// Obstacle closest to `p` and its distance.
    pub fn nearest_obstacle(&self, p: Vec2) -> Option<(&Rect, f64)> {
        self.obstacles
            .iter()
            .map(|o| (o, o.distance_to(p)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn mark_explored(&mut self, p: Vec2) {
        self.coverage.mark(p);
    }

    pub fn explored_fraction(&self) -> f64 {
        self.coverage.fraction()
    }
}
