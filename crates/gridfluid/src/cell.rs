//! Cell states and per-cell fluid content.

use crate::lattice::{self, Q};
use serde::{Deserialize, Serialize};

/// Public state tag of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Obstacle,
    Empty,
    Fluid,
    Interface,
}

/// Fluid content carried by fluid and interface cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Distribution functions f_i.
    pub df: [f64; Q],
    /// Stored fluid mass.
    pub mass: f64,
    /// Fill fraction: mass / pressure.
    pub fill: f64,
}

impl Parcel {
    /// Parcel from populations, mass and fill fraction.
    pub fn new(df: [f64; Q], mass: f64, fill: f64) -> Self {
        Self { df, mass, fill }
    }

    #[inline]
    pub fn pressure(&self) -> f64 {
        self.df.iter().sum()
    }

    #[inline]
    pub fn moments(&self) -> (f64, [f64; 2]) {
        lattice::moments(&self.df)
    }

    /// Recompute the fill fraction from mass and current pressure.
    pub fn refresh_fill(&mut self) {
        let pressure = self.pressure();
        self.fill = if pressure > 0.0 {
            self.mass / pressure
        } else {
            0.0
        };
    }
}

/// A lattice cell.
///
/// Only fluid and interface cells carry populations; obstacle and empty
/// cells have nothing to stream or relax.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    #[default]
    Obstacle,
    Empty,
    Fluid(Parcel),
    Interface(Parcel),
}

impl Cell {
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Obstacle => CellType::Obstacle,
            Cell::Empty => CellType::Empty,
            Cell::Fluid(_) => CellType::Fluid,
            Cell::Interface(_) => CellType::Interface,
        }
    }

    pub fn parcel(&self) -> Option<&Parcel> {
        match self {
            Cell::Fluid(p) | Cell::Interface(p) => Some(p),
            Cell::Obstacle | Cell::Empty => None,
        }
    }

    pub fn parcel_mut(&mut self) -> Option<&mut Parcel> {
        match self {
            Cell::Fluid(p) | Cell::Interface(p) => Some(p),
            Cell::Obstacle | Cell::Empty => None,
        }
    }

    /// Stored mass, zero for cells without fluid.
    pub fn mass(&self) -> f64 {
        self.parcel().map_or(0.0, |p| p.mass)
    }

    /// Fill fraction as seen by the surface normal estimate.
    pub fn fill(&self) -> f64 {
        self.parcel().map_or(0.0, |p| p.fill)
    }

    pub fn is_fluid(&self) -> bool {
        matches!(self, Cell::Fluid(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Cell::Interface(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Cell::Obstacle)
    }
}

/// Pending phase change recorded by collision and consumed by cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    #[default]
    None,
    Filled,
    Emptied,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::W;

    #[test]
    fn test_default_cell_is_obstacle() {
        assert_eq!(Cell::default().cell_type(), CellType::Obstacle);
        assert_eq!(Cell::default().mass(), 0.0);
    }

    #[test]
    fn test_refresh_fill() {
        let mut p = Parcel::new(W.map(|w| 2.0 * w), 0.5, 0.0);
        p.refresh_fill();
        assert!((p.fill - 0.25).abs() < 1e-12);
    }
}
