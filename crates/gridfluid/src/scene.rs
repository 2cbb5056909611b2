//! JSON scene descriptions.
//!
//! ```json
//! {
//!   "width": 40,
//!   "height": 20,
//!   "config": { "omega": 0.5 },
//!   "obstacles": [{ "x": 5, "y": 7 }],
//!   "fluid": [{ "x": 1, "y": 1, "width": 38, "height": 6 }],
//!   "velocity": [0.02, 0.0]
//! }
//! ```

use crate::config::SimConfig;
use crate::error::{GridError, Result};
use crate::grid::FluidGrid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rectangle of cells, defaulting to a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    #[serde(default = "default_extent")]
    pub width: usize,
    #[serde(default = "default_extent")]
    pub height: usize,
}

fn default_extent() -> usize {
    1
}

impl Region {
    /// Check that the rectangle lies inside a `width` x `height` grid.
    pub fn check_bounds(&self, width: usize, height: usize) -> Result<()> {
        let x_end = self.x.checked_add(self.width);
        let y_end = self.y.checked_add(self.height);
        match (x_end, y_end) {
            (Some(xe), Some(ye)) if xe <= width && ye <= height => Ok(()),
            _ => Err(GridError::OutOfBounds {
                x: self.x.saturating_add(self.width.saturating_sub(1)),
                y: self.y.saturating_add(self.height.saturating_sub(1)),
                width,
                height,
            }),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.y.saturating_add(self.height))
            .flat_map(move |y| (self.x..self.x.saturating_add(self.width)).map(move |x| (x, y)))
    }
}

/// Scene layout and solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default)]
    pub obstacles: Vec<Region>,
    #[serde(default)]
    pub fluid: Vec<Region>,
    /// Regions cleared after fluid is placed.
    #[serde(default)]
    pub empty: Vec<Region>,
    /// Initial velocity of seeded fluid.
    #[serde(default)]
    pub velocity: [f64; 2],
}

impl SceneSpec {
    /// Construct the grid: obstacles first, then fluid, then empty regions.
    pub fn build(&self) -> Result<FluidGrid> {
        let mut grid = FluidGrid::with_config(self.width, self.height, self.config.clone())?;
        for region in self.obstacles.iter().chain(&self.fluid).chain(&self.empty) {
            region.check_bounds(self.width, self.height)?;
        }
        for (x, y) in self.obstacles.iter().flat_map(Region::cells) {
            grid.set_obstacle(x, y)?;
        }
        for (x, y) in self.fluid.iter().flat_map(Region::cells) {
            grid.set_fluid_with_velocity(x, y, self.velocity)?;
        }
        for (x, y) in self.empty.iter().flat_map(Region::cells) {
            grid.set_empty(x, y)?;
        }
        debug!(
            "built scene {}x{}: {} obstacle, {} fluid regions",
            self.width,
            self.height,
            self.obstacles.len(),
            self.fluid.len()
        );
        Ok(grid)
    }
}

/// Parse a scene from a JSON string.
pub fn parse_scene(json: &str) -> Result<SceneSpec> {
    let spec: SceneSpec = serde_json::from_str(json)?;
    spec.config.validate()?;
    Ok(spec)
}

/// Load a scene from a JSON file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneSpec> {
    let contents = std::fs::read_to_string(path)?;
    parse_scene(&contents)
}

/// Write a scene to a JSON file.
pub fn save_scene(spec: &SceneSpec, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(spec)?;
    std::fs::write(path, json)?;
    Ok(())
}
