//! Streaming stage: propagate populations and exchange mass.
//!
//! Reads the current buffer and writes every cell of the next buffer. For
//! direction `i` the neighbor at `x + e_i` supplies the population arriving
//! in slot `OPP[i]`, and the mass exchanged with it is
//! `f_OPP[i](x + e_i) - f_i(x)`.
//!
//! Interface cells reconstruct populations coming from the gas side from an
//! equilibrium at the atmosphere pressure.

use crate::cell::{Cell, Parcel};
use crate::config::SimConfig;
use crate::error::{Divergence, Result};
use crate::grid::{neighbor_cell, Dims};
use crate::lattice::{self, AXES, OPP, Q};

/// Stream `src` into `dst` and return the total mass written.
pub(crate) fn stream(src: &[Cell], dst: &mut [Cell], dims: Dims, config: &SimConfig) -> Result<f64> {
    let mut total_mass = 0.0;
    for (idx, source) in src.iter().enumerate() {
        let next = match source {
            Cell::Obstacle | Cell::Empty => *source,
            Cell::Fluid(parcel) => Cell::Fluid(stream_fluid(src, dims, idx, parcel)),
            Cell::Interface(parcel) => Cell::Interface(
                stream_interface(src, dims, idx, parcel, config)
                    .map_err(|cause| dims.diverged(idx, cause))?,
            ),
        };
        total_mass += next.mass();
        dst[idx] = next;
    }
    Ok(total_mass)
}

fn stream_fluid(src: &[Cell], dims: Dims, idx: usize, parcel: &Parcel) -> Parcel {
    let mut out = *parcel;
    for i in 0..Q {
        let o = OPP[i];
        match neighbor_cell(src, dims, idx, i) {
            Cell::Obstacle => out.df[o] = parcel.df[i],
            Cell::Fluid(nb) | Cell::Interface(nb) => {
                out.df[o] = nb.df[o];
                out.mass += nb.df[o] - parcel.df[i];
            }
            // A fluid cell should never touch an empty one.
            Cell::Empty => {}
        }
    }
    out.refresh_fill();
    out
}

fn stream_interface(
    src: &[Cell],
    dims: Dims,
    idx: usize,
    parcel: &Parcel,
    config: &SimConfig,
) -> std::result::Result<Parcel, Divergence> {
    let normal = surface_normal(src, dims, idx);
    let (_, u) = parcel.moments();
    let atmosphere = lattice::equilibrium(config.atmosphere_pressure, u)?;
    let class = NeighborClass::of(src, dims, idx);

    let mut out = *parcel;
    for i in 0..Q {
        let o = OPP[i];
        let reconstructed = atmosphere[o] + atmosphere[i] - parcel.df[i];
        let neighbor = neighbor_cell(src, dims, idx, i);
        match neighbor {
            Cell::Obstacle => out.df[o] = parcel.df[i],
            Cell::Fluid(nb) => {
                out.df[o] = nb.df[o];
                out.mass += nb.df[o] - parcel.df[i];
            }
            Cell::Interface(nb) => {
                out.df[o] = nb.df[o];
                let nb_class = dims
                    .neighbor(idx, i)
                    .map_or(class, |n| NeighborClass::of(src, dims, n));
                let exchange = class.exchange(nb_class, nb.df[o], parcel.df[i]);
                out.mass += exchange * 0.5 * (parcel.fill + nb.fill);
            }
            Cell::Empty => out.df[o] = reconstructed,
        }

        // Outward-facing directions behave as an open boundary.
        if neighbor.parcel().is_some() && lattice::dot(i, normal) > 0.0 {
            out.df[o] = reconstructed;
        }

        if out.df[o] < 0.0 {
            return Err(Divergence::NegativePopulation {
                direction: o,
                value: out.df[o],
            });
        }
    }
    out.refresh_fill();
    Ok(out)
}

/// Outward surface normal from central differences of the fill fraction.
///
/// Points from full toward empty cells. Obstacles mirror the cell's own
/// fill so walls do not tilt the surface.
pub(crate) fn surface_normal(cells: &[Cell], dims: Dims, idx: usize) -> [f64; 2] {
    let own = cells[idx].fill();
    let [east, north, west, south] = AXES.map(|i| match neighbor_cell(cells, dims, idx, i) {
        Cell::Obstacle => own,
        cell => cell.fill(),
    });
    [0.5 * (west - east), 0.5 * (south - north)]
}

/// Local geometry of an interface cell, from its fluid and empty neighbor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NeighborClass {
    /// Both fluid and empty neighbors.
    Standard,
    /// No fluid neighbors.
    NoFluid,
    /// No empty neighbors.
    NoEmpty,
}

impl NeighborClass {
    pub fn of(cells: &[Cell], dims: Dims, idx: usize) -> Self {
        let mut fluid = 0;
        let mut empty = 0;
        for i in 1..Q {
            match neighbor_cell(cells, dims, idx, i) {
                Cell::Fluid(_) => fluid += 1,
                Cell::Empty => empty += 1,
                Cell::Obstacle | Cell::Interface(_) => {}
            }
        }
        if fluid == 0 {
            NeighborClass::NoFluid
        } else if empty == 0 {
            NeighborClass::NoEmpty
        } else {
            NeighborClass::Standard
        }
    }

    /// Unweighted mass exchange between two interface cells.
    ///
    /// Cells of the same class swap the full flux. Otherwise only the
    /// incoming or outgoing half is kept, so mass drains toward the empty
    /// side and fills toward the fluid side. Swapping the arguments negates
    /// the result.
    pub fn exchange(self, other: NeighborClass, incoming: f64, outgoing: f64) -> f64 {
        use NeighborClass::*;
        match (self, other) {
            (a, b) if a == b => incoming - outgoing,
            (NoFluid, _) | (Standard, NoEmpty) => -outgoing,
            (NoEmpty, _) | (Standard, NoFluid) => incoming,
            (Standard, Standard) => incoming - outgoing,
        }
    }
}
