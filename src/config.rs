//! Dialogue engine YAML configuration
//!
//! ```yaml
//! language: en
//! solver:
//!   use_levels: true
//!   use_level_predicates: true
//!   use_base_measure_predicates: false
//!   use_aggregate_measure_predicates: false
//!   exhaustive_limit: 50000
//!   max_steps: 2000
//!   restarts: 8
//!   seed: 42
//!   time_limit_ms: 1500
//! resolver:
//!   min_confidence: 0.5
//!   value_min_confidence: 0.45
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a YAML file to load instead of the defaults
pub const CONFIG_ENV_VAR: &str = "CUBE_DIALOGUE_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Language used for labels and similarity lookups
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub solver: SolverSettings,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            solver: SolverSettings::default(),
            resolver: ResolverSettings::default(),
        }
    }
}

/// Which similarity types feed the solver, and how hard it searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub use_levels: bool,
    pub use_level_predicates: bool,
    pub use_base_measure_predicates: bool,
    pub use_aggregate_measure_predicates: bool,
    /// Joint search spaces up to this size are searched exhaustively
    pub exhaustive_limit: u64,
    /// Move budget per local-search restart
    pub max_steps: usize,
    pub restarts: usize,
    pub seed: u64,
    /// Wall-clock cap for local search; exhaustive search is never capped
    pub time_limit_ms: Option<u64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            use_levels: true,
            use_level_predicates: true,
            use_base_measure_predicates: false,
            use_aggregate_measure_predicates: false,
            exhaustive_limit: 50_000,
            max_steps: 2_000,
            restarts: 8,
            seed: 42,
            time_limit_ms: Some(1_500),
        }
    }
}

/// Thresholds for operation and value resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Operation matches below this confidence are dropped
    pub min_confidence: f64,
    /// Value matches below this confidence are dropped
    pub value_min_confidence: f64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            value_min_confidence: 0.45,
        }
    }
}

impl DialogueConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: DialogueConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `CUBE_DIALOGUE_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!(path = %path, "Loading dialogue configuration");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(invalid("language", "must not be blank"));
        }
        for (field, value) in [
            ("resolver.min_confidence", self.resolver.min_confidence),
            (
                "resolver.value_min_confidence",
                self.resolver.value_min_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be between 0 and 1"));
            }
        }
        if self.solver.restarts == 0 {
            return Err(invalid("solver.restarts", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}
