//! Simulation Timestamp Types
//!
//! Simulation time is a tick counter paired with the simulated seconds that
//! have elapsed at that tick. Trust erosion works on seconds; analytics group
//! by tick.
//!
//! # Example
//!
//! ```
//! use swarm_events::SimTimestamp;
//!
//! let ts = SimTimestamp::from_tick(20, 0.1);
//! assert_eq!(ts.tick, 20);
//! assert!((ts.seconds - 2.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimTimestamp {
    pub tick: u64,
    pub seconds: f64,
}

impl SimTimestamp {
    pub fn new(tick: u64, seconds: f64) -> Self {
        Self { tick, seconds }
    }

    /// Timestamp of `tick` for a clock advancing `seconds_per_tick` per tick.
    pub fn from_tick(tick: u64, seconds_per_tick: f64) -> Self {
        Self {
            tick,
            seconds: tick as f64 * seconds_per_tick,
        }
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn seconds_since(&self, earlier: SimTimestamp) -> f64 {
        (self.seconds - earlier.seconds).max(0.0)
    }
}

impl fmt::Display for SimTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick_{}@{:.2}s", self.tick, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_since_is_clamped() {
        let early = SimTimestamp::new(5, 0.5);
        let late = SimTimestamp::new(10, 1.0);
        assert!((late.seconds_since(early) - 0.5).abs() < 1e-9);
        assert_eq!(early.seconds_since(late), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTimestamp::new(3, 0.3).to_string(), "tick_3@0.30s");
    }
}
