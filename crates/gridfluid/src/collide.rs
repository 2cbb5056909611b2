//! Collision stage: BGK relaxation and transition flagging.

use crate::cell::{Cell, Parcel, Transition};
use crate::config::SimConfig;
use crate::error::{Divergence, Result};
use crate::grid::Dims;
use crate::lattice::{self, Q};
use crate::properties::Properties;

/// Relax every fluid and interface cell in place.
///
/// Clears all transition flags, then marks interface cells whose mass left
/// [0, 1] by more than `change_fudge`. Pressure, mass, extrema and max speed
/// are written to `props`.
pub(crate) fn collide(
    cells: &mut [Cell],
    transitions: &mut [Transition],
    props: &mut Properties,
    dims: Dims,
    config: &SimConfig,
) -> Result<()> {
    transitions.fill(Transition::None);

    let mut min_pressure = f64::INFINITY;
    let mut max_pressure = f64::NEG_INFINITY;
    let mut max_speed_sq: f64 = 0.0;

    for (idx, cell) in cells.iter_mut().enumerate() {
        let (parcel, interface) = match cell {
            Cell::Fluid(p) => (p, false),
            Cell::Interface(p) => (p, true),
            Cell::Obstacle | Cell::Empty => {
                props.pressure[idx] = 0.0;
                props.mass[idx] = 0.0;
                continue;
            }
        };

        let (pressure, u) = relax(parcel, config).map_err(|cause| dims.diverged(idx, cause))?;

        props.pressure[idx] = pressure;
        props.mass[idx] = parcel.mass;
        min_pressure = min_pressure.min(pressure);
        max_pressure = max_pressure.max(pressure);
        max_speed_sq = max_speed_sq.max(u[0] * u[0] + u[1] * u[1]);

        if interface {
            if parcel.mass > 1.0 + config.change_fudge {
                transitions[idx] = Transition::Filled;
            } else if parcel.mass < -config.change_fudge {
                transitions[idx] = Transition::Emptied;
            }
        }
    }

    if min_pressure > max_pressure {
        min_pressure = 0.0;
        max_pressure = 0.0;
    }
    props.min_pressure = min_pressure;
    props.max_pressure = max_pressure;
    props.max_speed = max_speed_sq.sqrt();
    Ok(())
}

/// BGK step toward the local equilibrium; returns the cell's (pressure, velocity).
///
/// Gravity is not added to the velocity here.
pub(crate) fn relax(
    parcel: &mut Parcel,
    config: &SimConfig,
) -> std::result::Result<(f64, [f64; 2]), Divergence> {
    let (pressure, u) = parcel.moments();
    if !pressure.is_finite() || pressure > config.pressure_ceiling {
        return Err(Divergence::PressureCeiling {
            pressure,
            ceiling: config.pressure_ceiling,
        });
    }

    let eq = lattice::equilibrium(pressure, u)?;
    let omega = config.omega;
    for i in 0..Q {
        let relaxed = parcel.df[i] * (1.0 - omega) + omega * eq[i];
        if relaxed < 0.0 {
            return Err(Divergence::NegativePopulation {
                direction: i,
                value: relaxed,
            });
        }
        parcel.df[i] = relaxed;
    }
    parcel.fill = if pressure > 0.0 {
        parcel.mass / pressure
    } else {
        0.0
    };
    Ok((pressure, u))
}
