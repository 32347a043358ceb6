//! River planning and carving parameters.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Flood-fill search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodParams {
    /// Lattice spacing between expanded cells.
    pub grid_step: i32,
    /// Distance from a border at which a node counts as reaching it.
    pub border_offset: i32,
    /// Candidates closer than twice this to a map corner are ignored.
    pub corner_offset: i32,
    /// Bounds of the threshold increment derived from the start height.
    pub step_min: f32,
    pub step_max: f32,
    /// Lattice spacing / half-extent for the lowest-region scan.
    pub region_radius: i32,
    /// Margin kept clear of the map edge by the lowest-region scan.
    pub region_offset: i32,
}

impl Default for FloodParams {
    fn default() -> Self {
        Self {
            grid_step: 20,
            border_offset: 22,
            corner_offset: 11,
            step_min: 0.01,
            step_max: 0.1,
            region_radius: 10,
            region_offset: 20,
        }
    }
}

impl FloodParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_step < 1 {
            return Err(ConfigError::OutOfRange("flood.grid_step", self.grid_step as f32, 1.0, f32::MAX));
        }
        if !(self.step_min > 0.0 && self.step_min <= self.step_max) {
            return Err(ConfigError::OutOfRange("flood.step_min", self.step_min, f32::EPSILON, self.step_max));
        }
        Ok(())
    }
}

/// River bed shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveParams {
    /// Half-width of the bed; the profile reaches zero at this distance.
    pub width: f32,
    /// Depth scale.
    pub depth_factor: f32,
    /// Maximum lateral jitter applied to path vertices before carving.
    pub max_distort: i32,
}

impl Default for CarveParams {
    fn default() -> Self {
        Self { width: 10.0, depth_factor: 0.45, max_distort: 10 }
    }
}

impl CarveParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width >= 1.0) {
            return Err(ConfigError::OutOfRange("carve.width", self.width, 1.0, f32::MAX));
        }
        if !(self.depth_factor >= 0.0) {
            return Err(ConfigError::NegativeRate("carve.depth_factor", self.depth_factor));
        }
        Ok(())
    }
}

/// How many rivers to plan and how.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    pub count: usize,
    /// Require each river to cross the map between opposite borders.
    pub through: bool,
    pub flood: FloodParams,
    pub carve: CarveParams,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            count: 1,
            through: false,
            flood: FloodParams::default(),
            carve: CarveParams::default(),
        }
    }
}
