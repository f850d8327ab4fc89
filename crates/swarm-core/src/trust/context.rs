//! Context-dependent acceptance threshold.

use serde::{Deserialize, Serialize};
use swarm_events::ContextSnapshot;

/// Neutral threshold the other factors are blended with.
pub const BASELINE_THRESHOLD: f64 = 0.5;

/// Weights k1..k6 of the threshold factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWeights {
    /// k1: state of the trustor (detected-malicious fraction)
    pub trustor_state: f64,
    /// k2: explored area fraction
    pub explored_area: f64,
    /// k3: object already found
    pub object_found: f64,
    /// k4: helper availability relative to the robots still needed
    pub robot_availability: f64,
    /// k5: sensitivity of the data being acted on
    pub data_sensitivity: f64,
    /// k6: weight of the baseline threshold
    pub baseline: f64,
    /// Steepness of the trustor-state sigmoid
    pub sigmoid_steepness: f64,
    /// Malicious fraction at which the sigmoid crosses one half
    pub malicious_fraction_midpoint: f64,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self {
            trustor_state: 1.0,
            explored_area: 0.25,
            object_found: 0.25,
            robot_availability: 0.5,
            data_sensitivity: 0.5,
            baseline: 2.0,
            sigmoid_steepness: 20.0,
            malicious_fraction_midpoint: 0.2,
        }
    }
}

impl ContextWeights {
    pub fn sum(&self) -> f64 {
        self.trustor_state
            + self.explored_area
            + self.object_found
            + self.robot_availability
            + self.data_sensitivity
            + self.baseline
    }
}

/// Situation an agent is in when it decides whether to trust a peer.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextInformation {
    pub weights: ContextWeights,
    pub number_of_malicious_detected: u32,
    pub number_of_needed_robots: u32,
    pub explored_area_fraction: f64,
    pub was_object_found: bool,
    pub available_members: u32,
    pub total_members: u32,
    pub sensitivity_level: f64,
}

impl ContextInformation {
    pub fn new(weights: ContextWeights) -> Self {
        Self {
            weights,
            number_of_malicious_detected: 0,
            number_of_needed_robots: 0,
            explored_area_fraction: 0.0,
            was_object_found: false,
            available_members: 0,
            total_members: 0,
            sensitivity_level: 0.0,
        }
    }

    pub fn with_sensitivity(mut self, level: f64) -> Self {
        self.sensitivity_level = level;
        self
    }

    /// Rises sharply once the detected-malicious fraction passes the midpoint.
    pub fn state_of_trustor(&self) -> f64 {
        let fraction = if self.total_members == 0 {
            0.0
        } else {
            self.number_of_malicious_detected as f64 / self.total_members as f64
        };
        let w = &self.weights;
        1.0 / (1.0 + (-w.sigmoid_steepness * (fraction - w.malicious_fraction_midpoint)).exp())
    }

    /// Share of the still-needed robots that are available, capped at 1.
    pub fn robot_availability(&self) -> f64 {
        if self.number_of_needed_robots == 0 {
            return 1.0;
        }
        (self.available_members as f64 / self.number_of_needed_robots as f64).min(1.0)
    }

    /// Weighted mean of the context factors.
    ///
    /// The result is not clamped: with negative weights it can leave [0, 1],
    /// in which case every decision either passes or fails.
    pub fn threshold(&self) -> f64 {
        let w = &self.weights;
        let found = if self.was_object_found { 1.0 } else { 0.0 };
        let numerator = w.trustor_state * self.state_of_trustor()
            + w.explored_area * self.explored_area_fraction
            + w.object_found * found
            + w.robot_availability * self.robot_availability()
            + w.data_sensitivity * self.sensitivity_level
            + w.baseline * BASELINE_THRESHOLD;
        numerator / w.sum()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            malicious_detected: self.number_of_malicious_detected,
            needed_robots: self.number_of_needed_robots,
            explored_area_fraction: self.explored_area_fraction,
            object_found: self.was_object_found,
            available_members: self.available_members,
            total_members: self.total_members,
            sensitivity_level: self.sensitivity_level,
        }
    }
}
