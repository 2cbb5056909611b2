//! Free-surface lattice Boltzmann fluid on a 2D grid.
//!
//! D2Q9 lattice with a BGK collision operator in the incompressible
//! formulation, extended with a volume-of-fluid surface tracker. Cells are
//! obstacle, empty, fluid or interface; interface cells carry a mass in
//! [0, 1] and turn into fluid or empty cells as it fills or drains, keeping
//! a one-cell shell between liquid and gas.
//!
//! Each step streams into a second buffer, swaps buffers, relaxes toward
//! equilibrium, and finally commits phase transitions while handing excess
//! mass to neighboring interface cells.
//!
//! # Example
//!
//! ```
//! use gridfluid::{CellType, FluidGrid};
//!
//! let mut grid = FluidGrid::new(40, 20).unwrap();
//! grid.set_obstacle(5, 7).unwrap();
//! grid.set_fluid(10, 10).unwrap();
//! assert_eq!(grid.cell_type(11, 10).unwrap(), CellType::Interface);
//!
//! for _ in 0..10 {
//!     grid.step().unwrap();
//! }
//!
//! let props = grid.properties();
//! println!("max pressure {:.4}, total mass {:.4}", props.max_pressure, props.total_mass);
//! ```

pub mod cell;
pub mod cleanup;
mod collide;
pub mod config;
pub mod error;
pub mod grid;
pub mod lattice;
pub mod properties;
pub mod scene;
mod stream;

pub use cell::{Cell, CellType, Parcel, Transition};
pub use cleanup::StepReport;
pub use config::SimConfig;
pub use error::{Divergence, GridError, Result};
pub use grid::FluidGrid;
pub use lattice::{equilibrium, E, OPP, Q, W};
pub use properties::Properties;
pub use scene::{load_scene, parse_scene, save_scene, Region, SceneSpec};
