//! # Physics Error Types

use skirmish_core::CoreError;
use thiserror::Error;

use crate::body::BodyId;
use crate::math::Vec2i;

/// Errors that can occur while configuring the collision world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// A body was described with a zero or negative half extent.
    #[error("body bounds {half} have no area")]
    ZeroAreaBody {
        /// The rejected half extents.
        half: Vec2i,
    },

    /// Grid cells must be at least one world unit wide.
    #[error("invalid grid cell size {0}")]
    InvalidCellSize(i32),

    /// The pixel scale must be positive.
    #[error("invalid units per pixel {0}")]
    InvalidUnitsPerPixel(i32),

    /// The handle refers to a reclaimed body.
    #[error("{0} does not exist")]
    StaleBody(BodyId),

    /// Entity runtime error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
