//! # Simulation Error Types

use std::path::PathBuf;

use skirmish_core::CoreError;
use skirmish_physics::PhysicsError;
use thiserror::Error;

/// Errors that can occur while configuring or driving a simulation.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Entity runtime error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Collision world error.
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// The configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A tick was asked to advance by a negative or non-finite time.
    #[error("invalid delta time {0}")]
    InvalidDeltaTime(f32),
}

/// Result type for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;
