//! Error types for gridfluid.

use thiserror::Error;

/// Cause of a numerical divergence.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Divergence {
    #[error("negative equilibrium {value:.6e} in direction {direction}")]
    NegativeEquilibrium { direction: usize, value: f64 },

    #[error("negative population {value:.6e} in direction {direction}")]
    NegativePopulation { direction: usize, value: f64 },

    #[error("pressure {pressure:.6e} above ceiling {ceiling:.6e}")]
    PressureCeiling { pressure: f64, ceiling: f64 },
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid {width}x{height} too small, need at least 3x3")]
    InvalidDimensions { width: usize, height: usize },

    #[error("cell ({x}, {y}) outside {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("simulation diverged at ({x}, {y}): {cause}")]
    Diverged { x: usize, y: usize, cause: Divergence },

    #[error("simulation halted by an earlier divergence")]
    Halted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl GridError {
    /// True for errors that leave the scene unusable for further stepping.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GridError::Diverged { .. } | GridError::Halted)
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
