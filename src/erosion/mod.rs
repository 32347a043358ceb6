//! Hydraulic and thermal erosion.
//!
//! Both solvers mutate a [`HeightfieldGrid`](crate::terrain::HeightfieldGrid)
//! in place and draw randomness from a caller-supplied generator.

mod config;
pub mod hydraulic;
pub mod thermal;

pub use config::{HydraulicParams, ThermalParams, WindParams};
pub use hydraulic::{hydraulic_erosion, hydraulic_step, HydraulicStepStats};
pub use thermal::{relax_from, thermal_erode_region, thermal_erosion, ThermalStats};
