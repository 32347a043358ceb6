//! Low-pass spike removal.

use serde::{Deserialize, Serialize};

use crate::geometry::{neighbors::neighbor_8, Region};
use crate::terrain::HeightfieldGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeParams {
    /// Filter strength in `[0, 1]`; the clamp band is `1 - strength`.
    pub strength: f32,
}

impl Default for SpikeParams {
    fn default() -> Self {
        Self { strength: 0.995 }
    }
}

impl SpikeParams {
    pub fn epsilon(&self) -> f32 {
        (1.0 - self.strength).max(0.0)
    }
}

/// Clamps every height to `[avg - epsilon, avg + epsilon]`, where `avg` is the
/// mean of its in-bounds Moore neighbours. Returns the largest change.
pub fn spike_filter(grid: &mut HeightfieldGrid, epsilon: f32) -> f32 {
    let region = grid.full_region();
    spike_filter_region(grid, epsilon, &region)
}

/// [`spike_filter`] restricted to the cells of `region`.
///
/// Neighbour averages are read from the pre-pass heights, so the result does
/// not depend on visiting order.
pub fn spike_filter_region(grid: &mut HeightfieldGrid, epsilon: f32, region: &Region) -> f32 {
    let size = grid.size();
    let region = region.clamp_to(size);
    let source = grid.heights.clone();
    let mut max_change = 0.0f32;

    for (x, z) in region.cells() {
        let (x, z) = (x as usize, z as usize);
        let mut sum = 0.0;
        let mut count = 0;
        for (nx, nz) in neighbor_8(size, x, z) {
            sum += source[nz * size + nx];
            count += 1;
        }
        if count == 0 {
            continue;
        }
        let avg = sum / count as f32;
        let i = z * size + x;
        let filtered = source[i].clamp(avg - epsilon, avg + epsilon);
        max_change = max_change.max((filtered - source[i]).abs());
        grid.heights[i] = filtered;
    }

    max_change
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;

    fn spiked() -> HeightfieldGrid {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(9, 9, 1.0);
        grid
    }

    #[test]
    fn test_spike_is_clamped_to_band() {
        let mut grid = spiked();
        let change = spike_filter(&mut grid, 0.1);
        assert!((grid.height(9, 9) - 0.1).abs() < 1e-6);
        assert!((change - 0.9).abs() < 1e-6);
        // Direct neighbours are pulled up towards the spike.
        assert!(grid.height(8, 9) > 0.0);
    }

    #[test]
    fn test_second_pass_changes_less_per_cell() {
        let mut grid = spiked();
        grid.set_height(3, 3, -0.6);

        let h0 = grid.heights.clone();
        let first = spike_filter(&mut grid, 0.1);
        let h1 = grid.heights.clone();
        let second = spike_filter(&mut grid, 0.1);
        assert!(second <= first);

        for (i, &h2) in grid.heights.iter().enumerate() {
            let d1 = (h1[i] - h0[i]).abs();
            let d2 = (h2 - h1[i]).abs();
            assert!(d2 <= d1 + 1e-7, "cell {i}: {d2} after {d1}");
        }
    }

    #[test]
    fn test_flat_grid_untouched() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(4, 2), 0.3);
        let change = spike_filter(&mut grid, 0.005);
        assert_eq!(change, 0.0);
        assert!(grid.heights.iter().all(|&h| h == 0.3));
    }

    #[test]
    fn test_region_limits_writes() {
        let mut grid = spiked();
        let region = Region::new(0, 5, 0, 5);
        spike_filter_region(&mut grid, 0.1, &region);
        assert_eq!(grid.height(9, 9), 1.0);
    }
}
