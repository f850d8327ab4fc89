//! A* over the occupancy grid.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use super::grid::{Cell, OccupancyGrid};

/// Shortest 8-connected path from `start` to `goal`, both ends included.
///
/// The heuristic is the Manhattan distance. The start cell is always
/// enterable so an object that ended up on a newly blocked cell can still
/// leave it; the goal must be free.
pub fn find_path(grid: &OccupancyGrid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    if !grid.in_bounds(start) || !grid.is_free(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut best: BTreeMap<Cell, f64> = BTreeMap::new();
    let mut prev: BTreeMap<Cell, Cell> = BTreeMap::new();
    let mut open = BinaryHeap::new();
    let mut order = 0u64;

    best.insert(start, 0.0);
    open.push(Node {
        estimate: start.manhattan(goal) as f64,
        cost: 0.0,
        order,
        cell: start,
    });

    while let Some(Node { cost, cell, .. }) = open.pop() {
        if cell == goal {
            let mut path = vec![goal];
            let mut current = goal;
            while let Some(&p) = prev.get(&current) {
                path.push(p);
                current = p;
            }
            path.reverse();
            return Some(path);
        }

        if best.get(&cell).is_some_and(|&b| cost > b) {
            continue;
        }

        for (next, step) in grid.neighbors8(cell) {
            let next_cost = cost + step;
            let is_better = best.get(&next).map(|&b| next_cost < b).unwrap_or(true);
            if is_better {
                best.insert(next, next_cost);
                prev.insert(next, cell);
                order += 1;
                open.push(Node {
                    estimate: next_cost + next.manhattan(goal) as f64,
                    cost: next_cost,
                    order,
                    cell: next,
                });
            }
        }
    }

    None
}

/// Open-set entry; the heap pops the lowest estimate, oldest first on ties.
struct Node {
    estimate: f64,
    cost: f64,
    order: u64,
    cell: Cell,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap
        other
            .estimate
            .partial_cmp(&self.estimate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.order.cmp(&self.order))
    }
}
