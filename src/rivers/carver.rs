//! River bed carving with a sinc-shaped cross-section.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use super::{CarveParams, Vertex};
use crate::geometry::{distance_to_line, point_in_quad, segment_quad};
use crate::terrain::HeightfieldGrid;

/// Added to a zero distance before evaluating the profile.
pub const DISTANCE_NUDGE: f32 = 0.01;

/// Lowerings smaller than this are dropped.
const MIN_CUT: f32 = 1e-6;

/// Segments are swept by this multiple of the width when collecting cells.
const REACH_FACTOR: f32 = 2.0;

/// Bed depth (negative) at lateral `distance` from the centre line.
///
/// `-depth_factor * sin(d / (width / pi)) / (d / pi)`: deepest on the centre
/// line, zero at `distance == width`.
pub fn sinc_depth(distance: f32, width: f32, depth_factor: f32) -> f32 {
    let mut d = distance.abs();
    if d == 0.0 {
        d += DISTANCE_NUDGE;
    }
    -depth_factor * (d / (width / PI)).sin() / (d / PI)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    pub distance: f32,
    pub depth: f32,
}

/// Per-cell carve depths; `None` where the river does not reach.
#[derive(Debug, Clone)]
pub struct DepthField {
    size: usize,
    cells: Vec<Option<DepthSample>>,
}

impl DepthField {
    fn new(size: usize) -> Self {
        Self { size, cells: vec![None; size * size] }
    }

    pub fn get(&self, x: usize, z: usize) -> Option<DepthSample> {
        assert!(x < self.size && z < self.size, "depth field index ({x}, {z}) out of range");
        self.cells[z * self.size + x]
    }

    /// Records a contribution unless a closer one is already present.
    fn offer(&mut self, x: usize, z: usize, distance: f32, params: &CarveParams) {
        if distance >= params.width {
            return;
        }
        let slot = &mut self.cells[z * self.size + x];
        if slot.is_some_and(|s| s.distance <= distance) {
            return;
        }
        let depth = sinc_depth(distance, params.width, params.depth_factor);
        *slot = Some(DepthSample { distance, depth });
    }

    pub fn touched(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Builds the depth field of `path`: one pass along every segment, then a
/// pass around every vertex to round off the bends.
pub fn depth_field(grid: &HeightfieldGrid, path: &[Vertex], params: &CarveParams) -> DepthField {
    let mut field = DepthField::new(grid.size());
    let reach = params.width * REACH_FACTOR;
    let pad = reach.ceil() as i32;

    for pair in path.windows(2) {
        let (a, b) = (pair[0].as_vec2(), pair[1].as_vec2());
        let Some(quad) = segment_quad(a, b, reach) else {
            log::trace!("skipping degenerate segment at ({}, {})", pair[0].x, pair[0].z);
            continue;
        };
        let (x0, x1) = (pair[0].x.min(pair[1].x) - pad, pair[0].x.max(pair[1].x) + pad);
        let (z0, z1) = (pair[0].z.min(pair[1].z) - pad, pair[0].z.max(pair[1].z) + pad);
        for z in z0..=z1 {
            for x in x0..=x1 {
                if !grid.check_bounds(x, z, 0, None) {
                    continue;
                }
                let p = Vec2::new(x as f32, z as f32);
                if !point_in_quad(p, &quad) {
                    continue;
                }
                if let Some(distance) = distance_to_line(p, a, b) {
                    field.offer(x as usize, z as usize, distance, params);
                }
            }
        }
    }

    for corner in path {
        let c = corner.as_vec2();
        for z in corner.z - pad..=corner.z + pad {
            for x in corner.x - pad..=corner.x + pad {
                if !grid.check_bounds(x, z, 0, None) {
                    continue;
                }
                let distance = c.distance(Vec2::new(x as f32, z as f32));
                if distance < reach {
                    field.offer(x as usize, z as usize, distance, params);
                }
            }
        }
    }

    field
}

/// Result of carving one river.
#[derive(Debug, Clone, Default)]
pub struct CarveStats {
    /// Cells that were lowered.
    pub touched: Vec<(usize, usize)>,
    /// Largest single lowering (positive).
    pub deepest: f32,
}

/// Carves `path` into the grid, lowering every reached cell by
/// `depth * depth_factor` in one commit.
pub fn carve_river(grid: &mut HeightfieldGrid, path: &[Vertex], params: &CarveParams) -> CarveStats {
    let field = depth_field(grid, path, params);
    let mut stats = CarveStats::default();

    for (x, z) in grid.cell_coords().collect::<Vec<_>>() {
        let Some(sample) = field.get(x, z) else {
            continue;
        };
        let delta = sample.depth * params.depth_factor;
        if delta < -MIN_CUT {
            grid.add_height(x, z, delta);
            stats.touched.push((x, z));
            stats.deepest = stats.deepest.max(-delta);
        }
    }

    log::debug!(
        "carved river of {} vertices: {} cells, deepest {:.4}",
        path.len(),
        stats.touched.len(),
        stats.deepest
    );
    stats
}

/// Jitters the interior vertices of a path by up to `max_distort` cells on
/// each axis. Endpoints stay put so border crossings remain on the border.
pub fn distort_path<R: Rng + ?Sized>(
    grid: &HeightfieldGrid,
    path: &[Vertex],
    max_distort: i32,
    rng: &mut R,
) -> Vec<Vertex> {
    if max_distort <= 0 || path.len() < 3 {
        return path.to_vec();
    }
    let last = grid.size() as i32 - 1;
    let mut out = Vec::with_capacity(path.len());
    out.push(path[0]);
    for v in &path[1..path.len() - 1] {
        let x = (v.x + rng.random_range(-max_distort..max_distort)).clamp(0, last);
        let z = (v.z + rng.random_range(-max_distort..max_distort)).clamp(0, last);
        out.push(grid.vertex(x, z));
    }
    out.push(path[path.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sinc_depth_shape() {
        let params = CarveParams::default();
        let center = sinc_depth(0.0, params.width, params.depth_factor);
        assert!(center < 0.0);
        assert!(sinc_depth(params.width, params.width, params.depth_factor).abs() < 1e-5);
        for d in [0.5f32, 2.0, 7.5] {
            let pos = sinc_depth(d, params.width, params.depth_factor);
            let neg = sinc_depth(-d, params.width, params.depth_factor);
            assert_eq!(pos, neg);
            assert!(pos < 0.0);
        }
        // Deeper towards the centre.
        assert!(sinc_depth(1.0, 10.0, 0.45) < sinc_depth(5.0, 10.0, 0.45));
    }

    #[test]
    fn test_straight_carve_is_symmetric_and_local() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(32, 3), 1.0);
        let path = vec![grid.vertex(10, 50), grid.vertex(80, 50)];
        let params = CarveParams::default();
        let stats = carve_river(&mut grid, &path, &params);

        assert!(!stats.touched.is_empty());
        assert!(grid.height(45, 50) < 1.0);
        assert_eq!(grid.height(45, 45), grid.height(45, 55));
        assert_eq!(grid.height(45, 65), 1.0);
        for &(x, z) in &stats.touched {
            assert!(grid.height(x, z) < 1.0);
        }
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(16, 3), 1.0);
        let v = grid.vertex(25, 25);
        let stats = carve_river(&mut grid, &[v, v], &CarveParams::default());
        // Only the vertex passes reach the grid.
        assert!(stats.touched.iter().all(|&(x, z)| {
            let dx = x as f32 - 25.0;
            let dz = z as f32 - 25.0;
            (dx * dx + dz * dz).sqrt() < 10.0
        }));
    }

    #[test]
    fn test_closest_segment_wins() {
        let grid = HeightfieldGrid::flat(GridConfig::new(32, 3), 1.0);
        let path = vec![grid.vertex(20, 50), grid.vertex(50, 50), grid.vertex(50, 80)];
        let field = depth_field(&grid, &path, &CarveParams::default());
        let sample = field.get(48, 52).unwrap();
        assert!((sample.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_distort_keeps_endpoints_in_grid() {
        let grid = HeightfieldGrid::flat(GridConfig::new(32, 3), 0.0);
        let path: Vec<Vertex> = (0..10).map(|i| grid.vertex(i * 10, 50)).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let out = distort_path(&grid, &path, 10, &mut rng);
        assert_eq!(out.len(), path.len());
        assert_eq!(out[0], path[0]);
        assert_eq!(out[9], path[9]);
        assert!(out.iter().all(|v| (0..99).contains(&v.x) && (0..99).contains(&v.z)));
        assert!(out[1..9].iter().zip(&path[1..9]).all(|(a, b)| (a.x - b.x).abs() <= 10));
    }
}
