//! Configuration loading for the swarm engine.
//!
//! Every setting comes from a TOML file; missing sections and fields fall back
//! to their defaults. A configuration is validated as a whole before the
//! engine is built from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use swarm_events::{AgentTrustHistory, Vec2};
use thiserror::Error;

use crate::agent::Malicious;
use crate::environment::{EnvironmentConfig, Rect};
use crate::planning::PlanningConfig;
use crate::trust::{AuthorityConfig, ContextWeights, TrustConstants};

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Run length, timing and motion settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// World geometry
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Trust model constants
    #[serde(default)]
    pub trust: TrustConstants,
    /// Context threshold weights
    #[serde(default)]
    pub context: ContextWeights,
    /// Reputation ledger settings
    #[serde(default)]
    pub authority: AuthorityConfig,
    /// How often malicious agents misbehave
    #[serde(default)]
    pub malicious: Malicious,
    /// Planner settings
    #[serde(default)]
    pub planning: PlanningConfig,
    /// Robot roster, in arena order
    #[serde(default = "default_robots")]
    pub robots: Vec<RobotConfig>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            environment: EnvironmentConfig::default(),
            trust: TrustConstants::default(),
            context: ContextWeights::default(),
            authority: AuthorityConfig::default(),
            malicious: Malicious::default(),
            planning: PlanningConfig::default(),
            robots: default_robots(),
        }
    }
}

/// Simulation-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub max_ticks: u64,
    pub seconds_per_tick: f64,
    /// Gate messages through the trust model
    pub trust_enabled: bool,
    /// Skip distrusted recipients when broadcasting
    pub trust_based_broadcasting: bool,
    /// Ticks between status polls from parked agents
    pub status_poll_interval: u64,
    /// Distance at which an agent sees the object
    pub detection_radius: f64,
    /// Distance at which an agent sees peers
    pub sensing_radius: f64,
    /// Distance at which an obstacle triggers avoidance
    pub avoidance_radius: f64,
    pub robot_speed: f64,
    pub robot_radius: f64,
    pub arrival_tolerance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_ticks: 5000,
            seconds_per_tick: 0.1,
            trust_enabled: true,
            trust_based_broadcasting: true,
            status_poll_interval: 20,
            detection_radius: 120.0,
            sensing_radius: 150.0,
            avoidance_radius: 30.0,
            robot_speed: 6.0,
            robot_radius: 10.0,
            arrival_tolerance: 3.0,
        }
    }
}

/// One robot of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub label: String,
    pub position: Vec2,
    #[serde(default)]
    pub leader: bool,
    #[serde(default)]
    pub malicious: bool,
    /// Trust history exported by an earlier run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_history: Option<AgentTrustHistory>,
}

impl RobotConfig {
    pub fn new(label: impl Into<String>, position: Vec2) -> Self {
        Self {
            label: label.into(),
            position,
            leader: false,
            malicious: false,
            trust_history: None,
        }
    }

    pub fn leader(mut self) -> Self {
        self.leader = true;
        self
    }

    pub fn malicious(mut self) -> Self {
        self.malicious = true;
        self
    }
}

fn default_robots() -> Vec<RobotConfig> {
    vec![
        RobotConfig::new("robot_1", Vec2::new(50.0, 50.0)).leader(),
        RobotConfig::new("robot_2", Vec2::new(90.0, 50.0)),
        RobotConfig::new("robot_3", Vec2::new(130.0, 50.0)),
        RobotConfig::new("robot_4", Vec2::new(50.0, 110.0)),
        RobotConfig::new("robot_5", Vec2::new(90.0, 110.0)),
        RobotConfig::new("robot_6", Vec2::new(130.0, 110.0)).malicious(),
    ]
}

/// Errors that can occur while loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in [0, 1], got {value}")))
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must not be negative, got {value}")))
    }
}

impl SwarmConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SwarmConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects configurations the engine cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        positive("simulation.seconds_per_tick", sim.seconds_per_tick)?;
        positive("simulation.robot_speed", sim.robot_speed)?;
        non_negative("simulation.robot_radius", sim.robot_radius)?;
        non_negative("simulation.detection_radius", sim.detection_radius)?;
        non_negative("simulation.sensing_radius", sim.sensing_radius)?;
        non_negative("simulation.avoidance_radius", sim.avoidance_radius)?;
        non_negative("simulation.arrival_tolerance", sim.arrival_tolerance)?;
        if sim.status_poll_interval == 0 {
            return Err(invalid("simulation.status_poll_interval must be at least 1"));
        }

        let env = &self.environment;
        positive("environment.width", env.width)?;
        positive("environment.height", env.height)?;
        positive("environment.cell_size", env.cell_size)?;
        positive("environment.object.size", env.object.size)?;
        let bounds = Rect::new(0.0, 0.0, env.width, env.height);
        if !bounds.contains_rect(&env.base) {
            return Err(invalid("environment.base must lie inside the world"));
        }
        if env.base.width < env.cell_size || env.base.height < env.cell_size {
            return Err(invalid("environment.base must be at least one cell wide and high"));
        }
        if !bounds.contains(env.object.position) {
            return Err(invalid("environment.object must lie inside the world"));
        }

        let trust = &self.trust;
        probability("trust.init_trust_value", trust.init_trust_value)?;
        probability("trust.trusted_peer_threshold", trust.trusted_peer_threshold)?;
        for (name, weight) in [
            ("trust.direct_trust_weight", trust.direct_trust_weight),
            ("trust.indirect_trust_weight", trust.indirect_trust_weight),
            ("trust.present_experience_weight", trust.present_experience_weight),
            ("trust.past_experience_weight", trust.past_experience_weight),
            ("trust.communication_weight", trust.communication_weight),
            ("trust.observation_weight", trust.observation_weight),
            ("trust.erosion_rate", trust.erosion_rate),
            ("trust.authority_weight", trust.authority_weight),
            ("trust.leader_weight", trust.leader_weight),
            ("trust.trusted_peers_weight", trust.trusted_peers_weight),
            ("trust.other_peers_weight", trust.other_peers_weight),
        ] {
            non_negative(name, weight)?;
        }
        positive("trust.authority_weight", trust.authority_weight)?;
        positive(
            "trust.present_experience_weight + trust.past_experience_weight",
            trust.present_experience_weight + trust.past_experience_weight,
        )?;
        positive("trust.relative_error_epsilon", trust.relative_error_epsilon)?;

        let weight_sum = self.context.sum();
        if !weight_sum.is_finite() || weight_sum == 0.0 {
            return Err(invalid("context weights must not sum to zero"));
        }

        probability("authority.update_weight", self.authority.update_weight)?;
        probability("authority.suspicion_threshold", self.authority.suspicion_threshold)?;
        probability("malicious.behaviour_probability", self.malicious.behaviour_probability)?;
        probability("malicious.collusion_probability", self.malicious.collusion_probability)?;

        if self.planning.max_attempts == 0 {
            return Err(invalid("planning.max_attempts must be at least 1"));
        }
        if self.planning.leg_length == 0 {
            return Err(invalid("planning.leg_length must be at least 1"));
        }
        positive("planning.push_speed", self.planning.push_speed)?;

        self.validate_robots(&bounds)
    }

    fn validate_robots(&self, bounds: &Rect) -> Result<(), ConfigError> {
        if self.robots.is_empty() {
            return Err(invalid("at least one robot is required"));
        }
        let mut labels = BTreeSet::new();
        let mut leaders = 0;
        for robot in &self.robots {
            if robot.label.is_empty() {
                return Err(invalid("robot labels must not be empty"));
            }
            if !labels.insert(robot.label.as_str()) {
                return Err(invalid(format!("duplicate robot label {}", robot.label)));
            }
            if robot.leader && robot.malicious {
                return Err(invalid(format!("{} cannot be both leader and malicious", robot.label)));
            }
            if robot.leader {
                leaders += 1;
            }
            if !bounds.contains(robot.position) {
                return Err(invalid(format!("{} starts outside the world", robot.label)));
            }
        }
        if leaders > 1 {
            return Err(invalid("at most one robot may be the leader"));
        }
        Ok(())
    }
}
