//! Planar grid geometry.
//!
//! Border sides, rectangular regions, Moore-neighbourhood offsets and the
//! small amount of line/quad math the river subsystem needs.

pub mod line;
pub mod neighbors;
mod region;
mod side;

pub use line::{distance_to_line, point_in_quad, segment_quad};
pub use neighbors::{Edge, MOORE, MOORE_DIAGONALS_FIRST};
pub use region::Region;
pub use side::{Side, Sides};
