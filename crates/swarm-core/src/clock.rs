//! Discrete simulation clock.

use swarm_events::SimTimestamp;

#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    seconds_per_tick: f64,
}

impl SimClock {
    pub fn new(seconds_per_tick: f64) -> Self {
        Self {
            tick: 0,
            seconds_per_tick,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now(&self) -> SimTimestamp {
        SimTimestamp::from_tick(self.tick, self.seconds_per_tick)
    }

    pub fn advance(&mut self) -> SimTimestamp {
        self.tick += 1;
        self.now()
    }
}
