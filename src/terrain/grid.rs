//! The heightfield grid and its per-cell simulation layers.

use glam::{Vec2, Vec3, Vec4};

use crate::geometry::{Region, Side, MOORE};
use crate::rivers::Vertex;
use super::GridConfig;

/// Square heightfield with the hydraulic-model layers alongside it.
///
/// Cells are stored row-major with `z` as the row: index `z * size + x`.
#[derive(Debug, Clone)]
pub struct HeightfieldGrid {
    config: GridConfig,
    size: usize,
    /// Elevation.
    pub heights: Vec<f32>,
    /// Surface water depth, never negative.
    pub water: Vec<f32>,
    /// Suspended sediment.
    pub sediment: Vec<f32>,
    /// Horizontal flow velocity.
    pub velocity: Vec<Vec2>,
    /// Per-edge outflow flux: x = left, y = right, z = down, w = up.
    pub outflow: Vec<Vec4>,
}

/// Read-only copy of the heights handed to mesh builders.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSnapshot {
    pub size: usize,
    pub heights: Vec<f32>,
}

impl HeightSnapshot {
    pub fn get(&self, x: usize, z: usize) -> f32 {
        assert!(x < self.size && z < self.size, "snapshot index ({x}, {z}) out of range");
        self.heights[z * self.size + x]
    }
}

impl HeightfieldGrid {
    /// Creates a flat grid at height zero.
    pub fn new(config: GridConfig) -> Self {
        Self::flat(config, 0.0)
    }

    /// Creates a grid with every height set to `height`.
    pub fn flat(config: GridConfig, height: f32) -> Self {
        let size = config.terrain_size();
        let cells = size * size;
        Self {
            config,
            size,
            heights: vec![height; cells],
            water: vec![0.0; cells],
            sediment: vec![0.0; cells],
            velocity: vec![Vec2::ZERO; cells],
            outflow: vec![Vec4::ZERO; cells],
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Side length in cells.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Linear index of a cell.
    ///
    /// # Panics
    /// Panics if `x` or `z` is outside `[0, size)`.
    #[inline]
    pub fn index(&self, x: usize, z: usize) -> usize {
        assert!(
            x < self.size && z < self.size,
            "grid index ({x}, {z}) out of range for size {}",
            self.size
        );
        z * self.size + x
    }

    #[inline]
    pub fn height(&self, x: usize, z: usize) -> f32 {
        self.heights[self.index(x, z)]
    }

    #[inline]
    pub fn set_height(&mut self, x: usize, z: usize, height: f32) {
        let i = self.index(x, z);
        self.heights[i] = height;
    }

    #[inline]
    pub fn add_height(&mut self, x: usize, z: usize, delta: f32) {
        let i = self.index(x, z);
        self.heights[i] += delta;
    }

    /// Height at signed coordinates, replicating the centre cell when the
    /// neighbour falls off the grid.
    pub fn height_or_center(&self, x: usize, z: usize, dx: i32, dz: i32) -> f32 {
        let nx = x as i64 + dx as i64;
        let nz = z as i64 + dz as i64;
        if self.in_bounds(nx, nz) {
            self.heights[nz as usize * self.size + nx as usize]
        } else {
            self.height(x, z)
        }
    }

    pub fn in_bounds(&self, x: i64, z: i64) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.size && (z as usize) < self.size
    }

    /// Samples a cell as a [`Vertex`].
    pub fn vertex(&self, x: i32, z: i32) -> Vertex {
        Vertex::new(x, z, self.height(x as usize, z as usize))
    }

    /// The whole map as a region.
    pub fn full_region(&self) -> Region {
        Region::full(self.size)
    }

    /// True iff `(x, z)` lies strictly inside `region` (or the full map)
    /// shrunk by `offset` on every side.
    pub fn check_bounds(&self, x: i32, z: i32, offset: i32, region: Option<&Region>) -> bool {
        match region {
            Some(r) => r.contains_strict(x, z, offset) && self.in_bounds(x as i64, z as i64),
            None => self.full_region().contains_strict(x, z, offset),
        }
    }

    /// Moore neighbours at Chebyshev distance `step` lower than `threshold`.
    ///
    /// Candidates closer than `2 * corner_offset` to a corner of `region` are
    /// skipped so searches do not latch onto corners.
    pub fn neighbors8(
        &self,
        center: Vertex,
        step: i32,
        threshold: f32,
        region: &Region,
        corner_offset: i32,
    ) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(8);
        for &(dx, dz) in MOORE.iter() {
            let nx = center.x + dx * step;
            let nz = center.z + dz * step;
            if !self.check_bounds(nx, nz, 0, Some(region)) {
                continue;
            }
            if corner_offset > 0 && region.corner_distance(nx, nz) < (2 * corner_offset) as f32 {
                continue;
            }
            let h = self.height(nx as usize, nz as usize);
            if h < threshold {
                out.push(Vertex::new(nx, nz, h));
            }
        }
        out
    }

    /// Slope estimate in `[0.05, 1]`: zero for flat ground (before clamping),
    /// approaching one as the surface turns vertical.
    pub fn slope(&self, x: usize, z: usize) -> f32 {
        let left = self.height_or_center(x, z, -1, 0);
        let right = self.height_or_center(x, z, 1, 0);
        let down = self.height_or_center(x, z, 0, -1);
        let up = self.height_or_center(x, z, 0, 1);

        let tangent_x = Vec3::new(1.0, 0.0, right - left).normalize();
        let tangent_z = Vec3::new(0.0, 1.0, up - down).normalize();
        let normal = tangent_x.cross(tangent_z);
        (1.0 - normal.dot(Vec3::Z).abs()).max(0.05)
    }

    /// True if the cell holds more than `epsilon` of water.
    pub fn has_water(&self, x: usize, z: usize, epsilon: f32) -> bool {
        self.water[self.index(x, z)] > epsilon
    }

    /// Copies the current heights for an external mesh builder.
    pub fn build(&self) -> HeightSnapshot {
        HeightSnapshot { size: self.size, heights: self.heights.clone() }
    }

    /// World-space position of a cell, using the configured scale.
    pub fn world_position(&self, x: usize, z: usize) -> Vec3 {
        let last = (self.size - 1).max(1) as f32;
        let s = self.config.scale;
        Vec3::new(
            x as f32 / last * s.x,
            self.height(x, z) * s.y,
            z as f32 / last * s.z,
        )
    }

    pub fn min_height(&self) -> f32 {
        self.heights.iter().cloned().fold(f32::MAX, f32::min)
    }

    pub fn max_height(&self) -> f32 {
        self.heights.iter().cloned().fold(f32::MIN, f32::max)
    }

    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height(), self.max_height())
    }

    pub fn total_water(&self) -> f64 {
        self.water.iter().map(|&w| w as f64).sum()
    }

    /// Clears water, sediment, velocity and outflow.
    pub fn reset_hydraulics(&mut self) {
        self.water.fill(0.0);
        self.sediment.fill(0.0);
        self.velocity.fill(Vec2::ZERO);
        self.outflow.fill(Vec4::ZERO);
    }

    /// Iterates every `(x, z)` coordinate, row by row.
    pub fn cell_coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size;
        (0..size).flat_map(move |z| (0..size).map(move |x| (x, z)))
    }

    /// Moves every layer `amount` cells away from `side`, as if the window
    /// slid towards it. The strip uncovered at `side` is zeroed.
    pub fn shift_toward(&mut self, side: Side, amount: usize) {
        shift_layer(&mut self.heights, self.size, side, amount, 0.0);
        shift_layer(&mut self.water, self.size, side, amount, 0.0);
        shift_layer(&mut self.sediment, self.size, side, amount, 0.0);
        shift_layer(&mut self.velocity, self.size, side, amount, Vec2::ZERO);
        shift_layer(&mut self.outflow, self.size, side, amount, Vec4::ZERO);
    }
}

fn shift_layer<T: Copy>(layer: &mut [T], size: usize, side: Side, amount: usize, fill: T) {
    let amount = amount.min(size);
    let (dx, dz) = side.offset();
    let mut shifted = vec![fill; layer.len()];
    for z in 0..size {
        for x in 0..size {
            // New cell (x, z) takes the old value `amount` cells towards `side`.
            let sx = x as i64 + dx as i64 * amount as i64;
            let sz = z as i64 + dz as i64 * amount as i64;
            if (0..size as i64).contains(&sx) && (0..size as i64).contains(&sz) {
                shifted[z * size + x] = layer[sz as usize * size + sx as usize];
            }
        }
    }
    layer.copy_from_slice(&shifted);
}
