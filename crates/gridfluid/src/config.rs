//! Solver configuration.
//!
//! Every constant the stages read lives here and is fixed for the lifetime
//! of a grid. Only `gravity` can be changed afterwards.

use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};

/// Solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// BGK relaxation factor ω in (0, 1].
    #[serde(default = "default_omega")]
    pub omega: f64,
    /// Pressure above which a cell is considered diverged.
    #[serde(default = "default_pressure_ceiling")]
    pub pressure_ceiling: f64,
    /// Reference pressure of the gas phase, used for surface reconstruction.
    #[serde(default = "default_atmosphere_pressure")]
    pub atmosphere_pressure: f64,
    /// Tolerance on mass beyond [0, 1] before an interface cell fills or empties.
    #[serde(default = "default_change_fudge")]
    pub change_fudge: f64,
    /// Mass given to interface cells created by `set_fluid`.
    #[serde(default = "default_seed_interface_mass")]
    pub seed_interface_mass: f64,
    /// Gravity. Stored and reported, not applied by the collision stage.
    #[serde(default)]
    pub gravity: f64,
}

fn default_omega() -> f64 {
    0.5
}

fn default_pressure_ceiling() -> f64 {
    100_000.0
}

fn default_atmosphere_pressure() -> f64 {
    1.0
}

fn default_change_fudge() -> f64 {
    1e-3
}

fn default_seed_interface_mass() -> f64 {
    0.9
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            omega: default_omega(),
            pressure_ceiling: default_pressure_ceiling(),
            atmosphere_pressure: default_atmosphere_pressure(),
            change_fudge: default_change_fudge(),
            seed_interface_mass: default_seed_interface_mass(),
            gravity: 0.0,
        }
    }
}

impl SimConfig {
    /// Builder-style relaxation factor.
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.omega = omega;
        self
    }

    /// Builder-style divergence ceiling.
    pub fn with_pressure_ceiling(mut self, ceiling: f64) -> Self {
        self.pressure_ceiling = ceiling;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.omega > 0.0 && self.omega <= 1.0) {
            return Err(GridError::InvalidConfig(format!(
                "omega must be in (0, 1], got {}",
                self.omega
            )));
        }
        if !(self.pressure_ceiling > 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "pressure_ceiling must be positive, got {}",
                self.pressure_ceiling
            )));
        }
        if !(self.atmosphere_pressure > 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "atmosphere_pressure must be positive, got {}",
                self.atmosphere_pressure
            )));
        }
        if !(self.change_fudge >= 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "change_fudge must be non-negative, got {}",
                self.change_fudge
            )));
        }
        if !(self.seed_interface_mass > 0.0 && self.seed_interface_mass < 1.0) {
            return Err(GridError::InvalidConfig(format!(
                "seed_interface_mass must be in (0, 1), got {}",
                self.seed_interface_mass
            )));
        }
        if !self.gravity.is_finite() {
            return Err(GridError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }
}
