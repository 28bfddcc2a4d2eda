//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration:
//!
//! ```toml
//! max_delta_time = 0.1
//!
//! [entities]
//! max_component_kinds = 32
//! initial_capacity = 1024
//!
//! [physics]
//! cell_size = 1000
//! units_per_pixel = 100
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::ManagerConfig;
use skirmish_physics::WorldConfig;
use tracing::{debug, warn};

use crate::error::{SimulationError, SimulationResult};

/// Top-level simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound for a single tick, in seconds. Longer frames (after a
    /// pause or a hitch) are clamped to it.
    pub max_delta_time: f32,
    /// Entity manager settings.
    pub entities: ManagerConfig,
    /// Collision world settings.
    pub physics: WorldConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_delta_time: 0.1,
            entities: ManagerConfig::default(),
            physics: WorldConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for malformed TOML and the
    /// [`validate`](Self::validate) error for out-of-range values.
    pub fn from_toml_str(text: &str) -> SimulationResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Io`] if the file cannot be read, otherwise
    /// the [`from_toml_str`](Self::from_toml_str) errors.
    pub fn load(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading simulation configuration");
        Self::from_toml_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> SimulationResult<()> {
        if !self.max_delta_time.is_finite() || self.max_delta_time <= 0.0 {
            warn!(max_delta_time = self.max_delta_time, "rejected simulation configuration");
            return Err(SimulationError::InvalidDeltaTime(self.max_delta_time));
        }
        self.entities.validate()?;
        self.physics.validate()?;
        Ok(())
    }
}
