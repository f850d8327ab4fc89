//! Deterministic random source shared by every consumer in a run.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use swarm_events::Vec2;
use uuid::Uuid;

use crate::environment::Rect;

/// Seeded random number generator owned by the swarm and passed explicitly.
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Uniform sample in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Returns true with probability `p`. Always advances the generator.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform sample in `[low, high)`; returns `low` for an empty range.
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.0.gen_range(low..high)
    }

    /// Uniform point inside `rect`.
    pub fn point_in(&mut self, rect: &Rect) -> Vec2 {
        let x = self.range(rect.x, rect.right());
        let y = self.range(rect.y, rect.bottom());
        Vec2::new(x, y)
    }

    /// Run identifier drawn from the seeded stream.
    pub fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.0.gen()).into_uuid()
    }
}
