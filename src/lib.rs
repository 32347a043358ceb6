//! Procedural heightfield terrain.
//!
//! A square grid of elevations is filled patch by patch with diamond-square
//! displacement, then shaped by hydraulic and thermal erosion, smoothing
//! filters and carved rivers. The map can be streamed one patch at a time in
//! any direction with seams welded to the existing terrain.

pub mod config;
pub mod erosion;
pub mod filters;
pub mod fractal;
pub mod geometry;
pub mod pipeline;
pub mod rivers;
pub mod terrain;
pub mod util;

pub use config::{ConfigError, PassConfig, TerrainConfig};
pub use erosion::{HydraulicParams, ThermalParams, WindParams};
pub use fractal::DiamondSquareParams;
pub use geometry::{Region, Side, Sides};
pub use pipeline::{GenerationStage, Pipeline, PipelineError, StageId};
pub use rivers::{PlanError, RiverInfo, RiverParams, Vertex};
pub use terrain::{GridConfig, HeightfieldGrid, Landscape};
