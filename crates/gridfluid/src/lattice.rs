//! D2Q9 lattice constants and the incompressible equilibrium distribution.
//!
//! Nine velocity directions on the 2D square lattice:
//! ```text
//!   6   2   5
//!    \  |  /
//!   3 - 0 - 1
//!    /  |  \
//!   7   4   8
//! ```

use crate::error::Divergence;

/// Number of discrete velocities.
pub const Q: usize = 9;

/// D2Q9 discrete velocities: [ex, ey]
pub const E: [[i32; 2]; Q] = [
    [0, 0],   // 0: rest
    [1, 0],   // 1: east
    [0, 1],   // 2: north
    [-1, 0],  // 3: west
    [0, -1],  // 4: south
    [1, 1],   // 5: northeast
    [-1, 1],  // 6: northwest
    [-1, -1], // 7: southwest
    [1, -1],  // 8: southeast
];

/// D2Q9 weights
pub const W: [f64; Q] = [
    4.0 / 9.0, // 0: rest
    1.0 / 9.0, // 1-4: cardinal
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0, // 5-8: diagonal
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Opposite direction indices for bounce-back
pub const OPP: [usize; Q] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// Axis-aligned directions used for the fill-fraction gradient.
pub const AXES: [usize; 4] = [1, 2, 3, 4];

/// Dot product of direction `i` with a 2D vector.
#[inline]
pub fn dot(i: usize, v: [f64; 2]) -> f64 {
    E[i][0] as f64 * v[0] + E[i][1] as f64 * v[1]
}

/// Zeroth and first moments: (pressure, velocity).
///
/// The incompressible formulation takes velocity as the raw first moment,
/// without dividing by pressure.
#[inline]
pub fn moments(df: &[f64; Q]) -> (f64, [f64; 2]) {
    let mut pressure = 0.0;
    let mut u = [0.0, 0.0];
    for (i, &f) in df.iter().enumerate() {
        pressure += f;
        u[0] += f * E[i][0] as f64;
        u[1] += f * E[i][1] as f64;
    }
    (pressure, u)
}

/// Compute the equilibrium distribution for all nine directions.
///
/// f_i^eq = w_i (p + 3(e_i·u) - 3/2(u·u) + 9/2(e_i·u)²)
///
/// A negative slot means the macroscopic state left the range the lattice
/// can represent; it is reported as a divergence.
pub fn equilibrium(pressure: f64, u: [f64; 2]) -> Result<[f64; Q], Divergence> {
    let uu = u[0] * u[0] + u[1] * u[1];
    let mut eq = [0.0; Q];
    for i in 0..Q {
        let eu = dot(i, u);
        let value = W[i] * (pressure + 3.0 * eu - 1.5 * uu + 4.5 * eu * eu);
        if value < 0.0 {
            return Err(Divergence::NegativeEquilibrium {
                direction: i,
                value,
            });
        }
        eq[i] = value;
    }
    Ok(eq)
}
