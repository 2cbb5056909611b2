//! Grid ownership, scene construction and the per-step pipeline.

use crate::cell::{Cell, CellType, Parcel, Transition};
use crate::cleanup::{self, StepReport};
use crate::collide;
use crate::config::SimConfig;
use crate::error::{Divergence, GridError, Result};
use crate::lattice::{self, E, Q};
use crate::properties::Properties;
use crate::stream;
use log::{debug, error, trace};

/// Grid shape and neighbor addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dims {
    pub width: usize,
    pub height: usize,
}

impl Dims {
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    /// Index of the cell one step from `idx` along direction `i`, if inside the grid.
    #[inline]
    pub fn neighbor(&self, idx: usize, i: usize) -> Option<usize> {
        let (x, y) = self.coords(idx);
        let nx = x.checked_add_signed(E[i][0] as isize)?;
        let ny = y.checked_add_signed(E[i][1] as isize)?;
        if nx < self.width && ny < self.height {
            Some(nx + ny * self.width)
        } else {
            None
        }
    }

    pub fn diverged(&self, idx: usize, cause: Divergence) -> GridError {
        let (x, y) = self.coords(idx);
        GridError::Diverged { x, y, cause }
    }
}

/// Cell behind direction `i`; positions off the grid read as obstacles.
#[inline]
pub(crate) fn neighbor_cell(cells: &[Cell], dims: Dims, idx: usize, i: usize) -> &Cell {
    static OUTSIDE: Cell = Cell::Obstacle;
    dims.neighbor(idx, i).map_or(&OUTSIDE, |n| &cells[n])
}

/// Free-surface D2Q9 solver on a fixed grid.
///
/// Owns the current/next cell buffers, the pending transition flags and the
/// diagnostics record. One call to [`FluidGrid::step`] runs streaming,
/// swaps the buffers, then runs collision and cleanup.
pub struct FluidGrid {
    dims: Dims,
    config: SimConfig,
    buffers: [Vec<Cell>; 2],
    /// Index of the authoritative buffer.
    current: usize,
    transitions: Vec<Transition>,
    props: Properties,
    steps: u64,
    halted: bool,
}

impl FluidGrid {
    /// Create an empty scene with the default configuration.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, SimConfig::default())
    }

    /// Create an empty scene.
    ///
    /// The one-cell border keeps the default obstacle state and closes the
    /// domain; every interior cell starts empty.
    pub fn with_config(width: usize, height: usize, config: SimConfig) -> Result<Self> {
        if width < 3 || height < 3 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        config.validate()?;

        let dims = Dims { width, height };
        let mut cells = vec![Cell::default(); dims.len()];
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                cells[x + y * width] = Cell::Empty;
            }
        }

        debug!("created {width}x{height} scene, omega={}", config.omega);

        let props = Properties::new(width, height, config.gravity, config.atmosphere_pressure);
        Ok(Self {
            dims,
            config,
            buffers: [cells.clone(), cells],
            current: 0,
            transitions: vec![Transition::None; dims.len()],
            props,
            steps: 0,
            halted: false,
        })
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True once a divergence has stopped the simulation.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Authoritative cell buffer, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.buffers[self.current]
    }

    fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.buffers[self.current]
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x < self.dims.width && y < self.dims.height {
            Ok(x + y * self.dims.width)
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.dims.width,
                height: self.dims.height,
            })
        }
    }

    /// Overwrite a cell, keeping the running total mass in step.
    fn replace(&mut self, idx: usize, cell: Cell) {
        let old = std::mem::replace(&mut self.cells_mut()[idx], cell);
        self.props.total_mass += cell.mass() - old.mass();
    }

    pub fn cell(&self, x: usize, y: usize) -> Result<&Cell> {
        let idx = self.index(x, y)?;
        Ok(&self.cells()[idx])
    }

    pub fn cell_type(&self, x: usize, y: usize) -> Result<CellType> {
        Ok(self.cell(x, y)?.cell_type())
    }

    pub fn set_obstacle(&mut self, x: usize, y: usize) -> Result<()> {
        let idx = self.index(x, y)?;
        self.replace(idx, Cell::Obstacle);
        Ok(())
    }

    /// Clear a cell.
    ///
    /// Fluid 8-neighbors are demoted to interface cells with their
    /// populations and mass intact, so liquid never borders gas directly.
    pub fn set_empty(&mut self, x: usize, y: usize) -> Result<()> {
        let idx = self.index(x, y)?;
        self.replace(idx, Cell::Empty);

        for i in 1..Q {
            let Some(n) = self.dims.neighbor(idx, i) else {
                continue;
            };
            if let Cell::Fluid(parcel) = self.cells()[n] {
                self.cells_mut()[n] = Cell::Interface(parcel);
            }
        }
        Ok(())
    }

    /// Fill a cell with fluid at rest.
    ///
    /// Empty 8-neighbors become interface cells so the next streaming pass
    /// sees a closed surface.
    pub fn set_fluid(&mut self, x: usize, y: usize) -> Result<()> {
        self.set_fluid_with_velocity(x, y, [0.0, 0.0])
    }

    /// Fill a cell with fluid at unit pressure moving with velocity `u`.
    pub fn set_fluid_with_velocity(&mut self, x: usize, y: usize, u: [f64; 2]) -> Result<()> {
        let idx = self.index(x, y)?;
        let df = lattice::equilibrium(1.0, u).map_err(|cause| {
            GridError::InvalidConfig(format!("seed velocity {u:?} is outside the lattice range: {cause}"))
        })?;

        self.replace(idx, Cell::Fluid(Parcel::new(df, 1.0, 1.0)));

        let seed_mass = self.config.seed_interface_mass;
        for i in 1..Q {
            let Some(n) = self.dims.neighbor(idx, i) else {
                continue;
            };
            if self.cells()[n].is_empty() {
                self.replace(n, Cell::Interface(Parcel::new(df, seed_mass, seed_mass)));
            }
        }
        Ok(())
    }

    /// Store gravity. It is reported in the diagnostics only.
    pub fn set_gravity(&mut self, gravity: f64) {
        self.config.gravity = gravity;
        self.props.gravity = gravity;
    }

    pub fn gravity(&self) -> f64 {
        self.config.gravity
    }

    /// Recompute and return the diagnostics snapshot.
    pub fn properties(&mut self) -> &Properties {
        let cells = &self.buffers[self.current];
        self.props.recompute(cells);
        &self.props
    }

    /// Diagnostics as left by the last step, without recomputation.
    pub fn last_properties(&self) -> &Properties {
        &self.props
    }

    /// Running total of fluid mass.
    pub fn total_mass(&self) -> f64 {
        self.props.total_mass
    }

    /// Largest pressure recorded by the last collision pass.
    pub fn max_pressure(&self) -> f64 {
        self.props.max_pressure
    }

    /// Pressure at (x, y), zero for cells without fluid.
    pub fn pressure_at(&self, x: usize, y: usize) -> Result<f64> {
        Ok(self.cell(x, y)?.parcel().map_or(0.0, |p| p.pressure()))
    }

    /// Velocity at (x, y), zero for cells without fluid.
    pub fn velocity_at(&self, x: usize, y: usize) -> Result<[f64; 2]> {
        Ok(self.cell(x, y)?.parcel().map_or([0.0, 0.0], |p| p.moments().1))
    }

    pub fn mass_at(&self, x: usize, y: usize) -> Result<f64> {
        Ok(self.cell(x, y)?.mass())
    }

    /// Advance the simulation by one streaming, collision and cleanup cycle.
    ///
    /// A divergence is terminal: the error is returned once and every later
    /// call fails with [`GridError::Halted`].
    pub fn step(&mut self) -> Result<StepReport> {
        if self.halted {
            return Err(GridError::Halted);
        }
        match self.advance() {
            Ok(report) => {
                self.steps += 1;
                trace!(
                    "step {}: filled={} emptied={} cancelled={} total_mass={:.6}",
                    self.steps,
                    report.filled,
                    report.emptied,
                    report.cancelled,
                    self.props.total_mass
                );
                Ok(report)
            }
            Err(err) => {
                if err.is_fatal() {
                    self.halted = true;
                    error!("halting after step {}: {err}", self.steps);
                }
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<StepReport> {
        let dims = self.dims;
        let [a, b] = &mut self.buffers;
        let (src, dst) = if self.current == 0 { (a, b) } else { (b, a) };
        self.props.total_mass = stream::stream(src, dst, dims, &self.config)?;
        self.current ^= 1;

        let cells = &mut self.buffers[self.current];
        collide::collide(cells, &mut self.transitions, &mut self.props, dims, &self.config)?;
        let report = cleanup::cleanup(cells, &mut self.transitions, dims)?;
        self.props.total_mass -= report.lost_mass;
        Ok(report)
    }
}
