//! River synthesis: flood-fill path planning and profile carving.
//!
//! The planner floods outward from a low point with a rising water level
//! until the frontier touches a map border, then walks the search tree back
//! into a path. The carver turns that path into a channel.

mod carver;
mod config;
mod info;
mod planner;
mod vertex;

pub use carver::{carve_river, depth_field, distort_path, sinc_depth, CarveStats, DepthField, DepthSample};
pub use config::{CarveParams, FloodParams, RiverParams};
pub use info::RiverInfo;
pub use planner::{flood_across, flood_from_lowest_point, flood_from_point, PlanError};
pub use vertex::{FloodNode, Vertex};
