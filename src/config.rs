//! Planner configuration, loadable from TOML.
//!
//! Only operational knobs live here. The numeric constants that shape the search and the
//! smoother (see the crate root) are fixed and deliberately not configurable.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PlannerError, Result};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Wall-clock budget of a single search in milliseconds (default: 1000)
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Reject goals outside the start's connected region before searching (default: true)
    #[serde(default = "default_reachability_check")]
    pub reachability_check: bool,

    /// Run the moving-average pass over the smoothed path (default: true)
    #[serde(default = "default_moving_average")]
    pub moving_average: bool,
}

fn default_deadline_ms() -> u64 {
    1000
}
fn default_reachability_check() -> bool {
    true
}
fn default_moving_average() -> bool {
    true
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            reachability_check: default_reachability_check(),
            moving_average: default_moving_average(),
        }
    }
}

impl PlannerConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.deadline_ms == 0 {
            return Err(PlannerError::Config(
                "deadline_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
