//! Service configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```
//! use shift_solver::config::Settings;
//!
//! let settings = Settings::from_toml_str(r#"
//!     [solver]
//!     time_limit_secs = 10.0
//!
//!     [weights]
//!     fragmentation = 30
//! "#).unwrap();
//!
//! assert_eq!(settings.solver.time_limit_secs, 10.0);
//! assert_eq!(settings.weights.fragmentation, 30);
//! assert_eq!(settings.weights.deviation, 10);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::objective::Weights;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SHIFT_SOLVER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    pub model: ModelConfig,
    pub weights: Weights,
}

impl Settings {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads the file named by `SHIFT_SOLVER_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.slot_minutes == 0 {
            return Err(ConfigError::Invalid("model.slot_minutes must be positive".into()));
        }
        if self.model.min_shift_slots == 0 {
            return Err(ConfigError::Invalid("model.min_shift_slots must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.model.weekly_floor_ratio) {
            return Err(ConfigError::Invalid(format!(
                "model.weekly_floor_ratio must be within [0, 1], got {}",
                self.model.weekly_floor_ratio
            )));
        }
        if !(self.solver.time_limit_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "solver.time_limit_secs must be positive, got {}",
                self.solver.time_limit_secs
            )));
        }
        if self.solver.threads == Some(0) {
            return Err(ConfigError::Invalid("solver.threads must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Engine settings; these never change the meaning of the model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget for one solve.
    pub time_limit_secs: f64,
    /// Search threads; `None` leaves the choice to the engine.
    pub threads: Option<u32>,
    pub random_seed: Option<i32>,
    pub log_to_console: bool,
}

impl SolverConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_secs)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 60.0,
            threads: Some(4),
            random_seed: None,
            log_to_console: false,
        }
    }
}

/// Tunables of the constraint model itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub slot_minutes: u32,
    /// Tolerance applied on both sides of the daily bounds.
    pub daily_slack_minutes: u32,
    pub min_shift_slots: usize,
    /// Fraction of the weekly target that must be assigned.
    pub weekly_floor_ratio: f64,
    /// Reject unknown day names instead of ignoring them.
    pub strict_day_names: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 15,
            daily_slack_minutes: 60,
            min_shift_slots: 4,
            weekly_floor_ratio: 0.7,
            strict_day_names: false,
        }
    }
}
