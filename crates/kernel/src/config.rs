//! Run configuration: how a run is driven, not what problem it solves.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::KernelError;

/// Travel model between positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelModel {
    /// Straight-line motion in the plane.
    #[default]
    Euclidean,
    /// Reserved for network-based travel; rejected by validation.
    Graph,
}

/// Knobs consumed when a run is constructed.
///
/// The engine itself reads only the speed overrides, the travel model,
/// the arrival epsilon and the diagnostics toggle. The replanning knobs
/// are carried for a planning component that sits outside the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Multiplier applied to wall-clock frame time by the caller.
    pub time_scale: f32,
    /// Upcoming plan entries a planner must treat as committed.
    pub locked_prefix_count: usize,
    pub min_seconds_between_replans: f32,
    /// Periodic replan interval in simulated seconds; `None` disables it.
    pub periodic_replan_interval: Option<f32>,
    pub planner_time_budget_ms: u32,
    pub override_truck_speed: Option<f32>,
    pub override_depot_speed: Option<f32>,
    pub travel_model: TravelModel,
    /// Distance at which a moving truck or depot counts as arrived.
    pub arrive_epsilon: f32,
    /// Run the invariant pass after every step. `None` follows the build:
    /// on with debug assertions, off otherwise.
    pub diagnostics: Option<bool>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            time_scale: 1.0,
            locked_prefix_count: 1,
            min_seconds_between_replans: 1.0,
            periodic_replan_interval: Some(5.0),
            planner_time_budget_ms: 50,
            override_truck_speed: None,
            override_depot_speed: None,
            travel_model: TravelModel::Euclidean,
            arrive_epsilon: 0.1,
            diagnostics: None,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, KernelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "time_scale must be positive, got {}",
                self.time_scale
            )));
        }
        if !(self.arrive_epsilon.is_finite() && self.arrive_epsilon >= 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "arrive_epsilon must be non-negative, got {}",
                self.arrive_epsilon
            )));
        }
        for (name, value) in [
            ("override_truck_speed", self.override_truck_speed),
            ("override_depot_speed", self.override_depot_speed),
        ] {
            let Some(v) = value else { continue };
            if !(v.is_finite() && v >= 0.0) {
                return Err(KernelError::InvalidConfig(format!(
                    "{name} must be non-negative, got {v}"
                )));
            }
        }
        if self.travel_model != TravelModel::Euclidean {
            return Err(KernelError::UnsupportedTravelModel(self.travel_model));
        }
        Ok(())
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            arrive_epsilon: self.arrive_epsilon,
            diagnostics: self.diagnostics.unwrap_or(cfg!(debug_assertions)),
        }
    }
}

/// Per-engine constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    pub arrive_epsilon: f32,
    /// Check world invariants after every step and panic on violation.
    pub diagnostics: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            arrive_epsilon: 0.1,
            diagnostics: cfg!(debug_assertions),
        }
    }
}

impl EngineOptions {
    pub fn with_arrive_epsilon(mut self, epsilon: f32) -> Self {
        self.arrive_epsilon = epsilon;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }
}
