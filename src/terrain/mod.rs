//! Heightfield storage and the landscape context built around it.
//!
//! [`HeightfieldGrid`] holds elevation together with the water, sediment and
//! flow layers the erosion solvers need. [`Landscape`] pairs a grid with the
//! random stream and the rivers planned on it.

mod config;
mod grid;
mod landscape;
mod mountains;
mod stats;

pub use config::GridConfig;
pub use grid::{HeightSnapshot, HeightfieldGrid};
pub use landscape::Landscape;
pub use mountains::{preserve_mountains, MountainParams};
pub use stats::PEAK_BORDER;
