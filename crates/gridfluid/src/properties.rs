//! Diagnostics snapshot exposed to renderers and drivers.

use crate::cell::Cell;
use serde::Serialize;

/// Aggregated diagnostics of a grid.
///
/// Per-cell arrays are row-major (`x + y * width`) and hold zero for
/// obstacle and empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Properties {
    pub width: usize,
    pub height: usize,
    /// Pressure per cell.
    pub pressure: Vec<f64>,
    /// Mass per cell.
    pub mass: Vec<f64>,
    /// Minimum pressure over fluid and interface cells.
    pub min_pressure: f64,
    /// Maximum pressure over fluid and interface cells.
    pub max_pressure: f64,
    /// Maximum velocity magnitude over fluid and interface cells.
    pub max_speed: f64,
    /// Running total of fluid mass.
    pub total_mass: f64,
    pub gravity: f64,
    pub atmosphere_pressure: f64,
}

impl Properties {
    pub(crate) fn new(width: usize, height: usize, gravity: f64, atmosphere_pressure: f64) -> Self {
        Self {
            width,
            height,
            pressure: vec![0.0; width * height],
            mass: vec![0.0; width * height],
            min_pressure: 0.0,
            max_pressure: 0.0,
            max_speed: 0.0,
            total_mass: 0.0,
            gravity,
            atmosphere_pressure,
        }
    }

    /// Pressure at (x, y), zero outside the grid.
    pub fn pressure_at(&self, x: usize, y: usize) -> f64 {
        if x < self.width && y < self.height {
            self.pressure[x + y * self.width]
        } else {
            0.0
        }
    }

    /// Mass at (x, y), zero outside the grid.
    pub fn mass_at(&self, x: usize, y: usize) -> f64 {
        if x < self.width && y < self.height {
            self.mass[x + y * self.width]
        } else {
            0.0
        }
    }

    /// Pressure mapped to [0, 1] over the current extrema.
    pub fn normalized_pressure(&self, x: usize, y: usize) -> f64 {
        let span = self.max_pressure - self.min_pressure;
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((self.pressure_at(x, y) - self.min_pressure) / span).clamp(0.0, 1.0)
    }

    /// Rebuild pressure, mass, extrema and max speed from cell populations.
    ///
    /// The running total mass is left alone.
    pub(crate) fn recompute(&mut self, cells: &[Cell]) {
        let mut min_pressure = f64::INFINITY;
        let mut max_pressure = f64::NEG_INFINITY;
        let mut max_speed_sq: f64 = 0.0;

        for (i, cell) in cells.iter().enumerate() {
            match cell.parcel() {
                Some(parcel) => {
                    let (pressure, u) = parcel.moments();
                    self.pressure[i] = pressure;
                    self.mass[i] = parcel.mass;
                    min_pressure = min_pressure.min(pressure);
                    max_pressure = max_pressure.max(pressure);
                    max_speed_sq = max_speed_sq.max(u[0] * u[0] + u[1] * u[1]);
                }
                None => {
                    self.pressure[i] = 0.0;
                    self.mass[i] = 0.0;
                }
            }
        }

        if min_pressure > max_pressure {
            // No fluid in the scene.
            min_pressure = 0.0;
            max_pressure = 0.0;
        }
        self.min_pressure = min_pressure;
        self.max_pressure = max_pressure;
        self.max_speed = max_speed_sq.sqrt();
    }

    /// Sum of the per-cell mass array.
    pub fn summed_mass(&self) -> f64 {
        self.mass.iter().sum()
    }
}
