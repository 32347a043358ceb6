//! Fractal height generation.

mod diamond_square;

pub use diamond_square::{diamond_square, extend, generate_patch, DiamondSquareParams, Welds};
