//! Cleanup stage: commit fill/empty transitions and redistribute excess mass.
//!
//! Runs after collision on the authoritative buffer. Filled cells become
//! fluid and pull their empty neighbors into the interface; emptied cells
//! become empty and push their fluid neighbors into the interface. The mass
//! a transitioning cell holds beyond [0, 1] is then handed to neighboring
//! interface cells along the surface normal.

use crate::cell::{Cell, Parcel, Transition};
use crate::error::{Divergence, Result};
use crate::grid::Dims;
use crate::lattice::{self, Q};
use crate::stream::surface_normal;
use log::warn;
use serde::Serialize;

/// Summary of the transitions committed by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StepReport {
    /// Interface cells that became fluid.
    pub filled: usize,
    /// Interface cells that became empty.
    pub emptied: usize,
    /// Emptied flags cancelled because a neighbor filled.
    pub cancelled: usize,
    /// Empty cells promoted to interface.
    pub promoted: usize,
    /// Fluid cells demoted to interface.
    pub demoted: usize,
    /// Mass with no interface neighbor to receive it.
    pub lost_mass: f64,
}

struct Pending {
    idx: usize,
    kind: Transition,
    normal: [f64; 2],
    mass: f64,
}

pub(crate) fn cleanup(
    cells: &mut [Cell],
    transitions: &mut [Transition],
    dims: Dims,
) -> Result<StepReport> {
    let mut report = StepReport::default();

    // Normals and masses are taken before any cell changes type.
    let view: &[Cell] = cells;
    let pending: Vec<Pending> = transitions
        .iter()
        .enumerate()
        .filter(|(_, t)| **t != Transition::None)
        .map(|(idx, &kind)| Pending {
            idx,
            kind,
            normal: surface_normal(view, dims, idx),
            mass: view[idx].mass(),
        })
        .collect();

    if pending.is_empty() {
        return Ok(report);
    }

    // Fill pass.
    for p in pending.iter().filter(|p| p.kind == Transition::Filled) {
        for i in 1..Q {
            let Some(n) = dims.neighbor(p.idx, i) else {
                continue;
            };
            match cells[n] {
                Cell::Empty => {
                    let df = averaged_equilibrium(cells, dims, n)
                        .map_err(|cause| dims.diverged(n, cause))?;
                    cells[n] = Cell::Interface(Parcel::new(df, 0.0, 0.0));
                    report.promoted += 1;
                }
                Cell::Interface(_) if transitions[n] == Transition::Emptied => {
                    transitions[n] = Transition::None;
                    report.cancelled += 1;
                }
                _ => {}
            }
        }
        if let Cell::Interface(parcel) = cells[p.idx] {
            cells[p.idx] = Cell::Fluid(parcel);
            report.filled += 1;
        }
    }

    // Empty pass.
    for p in pending.iter().filter(|p| p.kind == Transition::Emptied) {
        if transitions[p.idx] != Transition::Emptied {
            continue;
        }
        for i in 1..Q {
            let Some(n) = dims.neighbor(p.idx, i) else {
                continue;
            };
            if let Cell::Fluid(parcel) = cells[n] {
                cells[n] = Cell::Interface(parcel);
                report.demoted += 1;
            }
        }
        cells[p.idx] = Cell::Empty;
        report.emptied += 1;
    }

    // Redistribution pass.
    for p in &pending {
        if transitions[p.idx] == Transition::None {
            continue;
        }
        let excess = match (p.kind, &cells[p.idx]) {
            (Transition::Filled, Cell::Fluid(parcel)) => p.mass - parcel.pressure(),
            (Transition::Emptied, _) => p.mass,
            _ => continue,
        };

        let delivered = distribute(cells, dims, p, excess);
        match p.kind {
            Transition::Filled if delivered => {
                if let Some(parcel) = cells[p.idx].parcel_mut() {
                    parcel.mass -= excess;
                    parcel.refresh_fill();
                }
            }
            Transition::Emptied if !delivered => {
                let (x, y) = dims.coords(p.idx);
                warn!("no interface neighbor at ({x}, {y}) to take {excess:.3e} mass");
                report.lost_mass += excess;
            }
            _ => {}
        }
        transitions[p.idx] = Transition::None;
    }

    Ok(report)
}

/// Share `excess` among interface neighbors of a transitioning cell.
///
/// Filled cells push mass along the outward normal, emptied cells take it
/// against the normal. When no neighbor has a positive weight all of them
/// share evenly. Returns false if there was no interface neighbor at all.
fn distribute(cells: &mut [Cell], dims: Dims, p: &Pending, excess: f64) -> bool {
    let sign = if p.kind == Transition::Filled { 1.0 } else { -1.0 };

    let mut weights = [0.0; Q];
    let mut total = 0.0;
    let mut recipients = 0;
    for (i, weight) in weights.iter_mut().enumerate().skip(1) {
        let Some(n) = dims.neighbor(p.idx, i) else {
            continue;
        };
        if cells[n].is_interface() {
            recipients += 1;
            *weight = (sign * lattice::dot(i, p.normal)).max(0.0);
            total += *weight;
        }
    }

    if recipients == 0 {
        return false;
    }
    if total <= 0.0 {
        for (i, weight) in weights.iter_mut().enumerate().skip(1) {
            let receives = dims
                .neighbor(p.idx, i)
                .is_some_and(|n| cells[n].is_interface());
            *weight = if receives { 1.0 } else { 0.0 };
        }
        total = recipients as f64;
    }

    for (i, &weight) in weights.iter().enumerate().skip(1) {
        if weight <= 0.0 {
            continue;
        }
        let Some(n) = dims.neighbor(p.idx, i) else {
            continue;
        };
        if let Some(parcel) = cells[n].parcel_mut() {
            parcel.mass += excess * weight / total;
            parcel.refresh_fill();
        }
    }
    true
}

/// Equilibrium at the mean pressure and velocity of a cell's fluid and
/// interface neighbors. Cells without such neighbors get the zero state.
fn averaged_equilibrium(
    cells: &[Cell],
    dims: Dims,
    idx: usize,
) -> std::result::Result<[f64; Q], Divergence> {
    let mut count = 0usize;
    let mut pressure = 0.0;
    let mut u = [0.0, 0.0];
    for i in 1..Q {
        let Some(parcel) = dims.neighbor(idx, i).and_then(|n| cells[n].parcel()) else {
            continue;
        };
        let (p, v) = parcel.moments();
        pressure += p;
        u[0] += v[0];
        u[1] += v[1];
        count += 1;
    }
    if count == 0 {
        return Ok([0.0; Q]);
    }
    let n = count as f64;
    lattice::equilibrium(pressure / n, [u[0] / n, u[1] / n])
}
