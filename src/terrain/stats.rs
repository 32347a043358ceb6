//! Aggregate queries over the grid: neighbourhood statistics and peak search.

use super::HeightfieldGrid;
use crate::geometry::Region;
use crate::rivers::Vertex;

/// Cells this close to the map edge are never reported as peaks.
pub const PEAK_BORDER: i32 = 20;

impl HeightfieldGrid {
    /// Mean height over the half-open window `[x - r, x + r) x [z - r, z + r)`,
    /// ignoring cells off the grid.
    pub fn median(&self, x: i32, z: i32, r: i32) -> f32 {
        let (sum, count) = self.window_sum(x - r, x + r, z - r, z + r);
        if count == 0 {
            return self.height(x.clamp(0, self.size() as i32 - 1) as usize, z.clamp(0, self.size() as i32 - 1) as usize);
        }
        sum / count as f32
    }

    /// Sum of heights over the inclusive window `[x - offset, x + offset]`.
    pub fn sum_neighborhood(&self, x: i32, z: i32, offset: i32) -> f32 {
        self.window_sum(x - offset, x + offset + 1, z - offset, z + offset + 1).0
    }

    /// Half-open window sum and the number of in-bounds cells it covered.
    fn window_sum(&self, x0: i32, x1: i32, z0: i32, z1: i32) -> (f32, usize) {
        let mut sum = 0.0;
        let mut count = 0;
        for z in z0..z1 {
            for x in x0..x1 {
                if self.in_bounds(x as i64, z as i64) {
                    sum += self.height(x as usize, z as usize);
                    count += 1;
                }
            }
        }
        (sum, count)
    }

    /// Centre of the lowest `2r x 2r` window on a lattice of spacing `radius`
    /// covering `[offset, size - offset)` on both axes.
    pub fn lowest_region_center(&self, radius: i32, offset: i32) -> Vertex {
        let size = self.size() as i32;
        let radius = radius.max(1);
        let mut best: Option<(f32, i32, i32)> = None;

        let mut x = offset;
        while x < size - offset {
            let mut z = offset;
            while z < size - offset {
                let (sum, _) = self.window_sum(x - radius, x + radius, z - radius, z + radius);
                if best.is_none_or(|(s, _, _)| sum < s) {
                    best = Some((sum, x, z));
                }
                z += radius;
            }
            x += radius;
        }

        match best {
            Some((_, x, z)) => self.vertex(x, z),
            // Grid too small for the lattice; fall back to the centre.
            None => self.vertex(size / 2, size / 2),
        }
    }

    /// Highest interior cell (the outermost ring is ignored).
    pub fn highest_point(&self) -> Vertex {
        let size = self.size() as i32;
        let mut best = self.vertex(1.min(size - 1), 1.min(size - 1));
        for z in 1..size - 1 {
            for x in 1..size - 1 {
                let h = self.height(x as usize, z as usize);
                if h > best.height {
                    best = Vertex::new(x, z, h);
                }
            }
        }
        best
    }

    /// Highest cell at least `2 * radius` away from every peak in `found`,
    /// keeping [`PEAK_BORDER`] cells clear of the map edge.
    pub fn next_highest_peak(&self, radius: i32, found: &[Vertex]) -> Option<Vertex> {
        let size = self.size() as i32;
        let min_distance = (2 * radius) as f32;
        let mut best: Option<Vertex> = None;

        for z in PEAK_BORDER..size - PEAK_BORDER {
            for x in PEAK_BORDER..size - PEAK_BORDER {
                let candidate = self.vertex(x, z);
                if best.is_some_and(|b| candidate.height <= b.height) {
                    continue;
                }
                if found.iter().any(|p| p.distance(&candidate) < min_distance) {
                    continue;
                }
                best = Some(candidate);
            }
        }
        best
    }

    /// Up to `count` peaks, greedily picked highest first and spaced by `2 * radius`.
    pub fn find_peaks(&self, count: usize, radius: i32) -> Vec<Vertex> {
        let mut peaks: Vec<Vertex> = Vec::with_capacity(count);
        while peaks.len() < count {
            match self.next_highest_peak(radius, &peaks) {
                Some(peak) => peaks.push(peak),
                None => break,
            }
        }
        peaks
    }

    /// Lowest cell inside `region` (clipped to the grid).
    pub fn lowest_point_in_area(&self, region: &Region) -> Vertex {
        let r = region.clamp_to(self.size());
        let mut best = self.vertex(r.x_min, r.z_min);
        for (x, z) in r.cells() {
            let h = self.height(x as usize, z as usize);
            if h < best.height {
                best = Vertex::new(x, z, h);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use crate::terrain::{GridConfig, HeightfieldGrid};
    use crate::geometry::Region;

    fn bowl(patch_size: usize, patch_count: usize) -> HeightfieldGrid {
        let mut grid = HeightfieldGrid::new(GridConfig::new(patch_size, patch_count));
        let c = (grid.size() / 2) as f32;
        for (x, z) in grid.cell_coords().collect::<Vec<_>>() {
            let d = ((x as f32 - c).powi(2) + (z as f32 - c).powi(2)).sqrt();
            grid.set_height(x, z, d / c);
        }
        grid
    }

    #[test]
    fn test_median_and_sum_on_constant_grid() {
        let grid = HeightfieldGrid::flat(GridConfig::new(8, 2), 0.5);
        assert!((grid.median(5, 5, 2) - 0.5).abs() < 1e-6);
        assert!((grid.median(0, 0, 3) - 0.5).abs() < 1e-6);
        // 3x3 inclusive window
        assert!((grid.sum_neighborhood(5, 5, 1) - 4.5).abs() < 1e-5);
        // clipped at the corner: 2x2 cells
        assert!((grid.sum_neighborhood(0, 0, 1) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_lowest_region_center_finds_bowl_bottom() {
        let grid = bowl(32, 3);
        let low = grid.lowest_region_center(10, 20);
        let c = (grid.size() / 2) as i32;
        assert!((low.x - c).abs() <= 10 && (low.z - c).abs() <= 10);
    }

    #[test]
    fn test_highest_point_and_peaks() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(32, 3));
        grid.set_height(40, 40, 3.0);
        grid.set_height(41, 40, 2.5);
        grid.set_height(70, 60, 2.0);
        let top = grid.highest_point();
        assert_eq!(top.coords(), (40, 40));

        let peaks = grid.find_peaks(2, 5);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].coords(), (40, 40));
        // (41, 40) is too close to the first peak.
        assert_eq!(peaks[1].coords(), (70, 60));
    }

    #[test]
    fn test_next_highest_peak_exhausts() {
        let grid = HeightfieldGrid::new(GridConfig::new(16, 3));
        let first = grid.next_highest_peak(100, &[]);
        assert!(first.is_some());
        let first = first.unwrap();
        assert!(grid.next_highest_peak(100, &[first]).is_none());
    }

    #[test]
    fn test_lowest_point_in_area() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(8, 2), 1.0);
        grid.set_height(3, 4, -1.0);
        grid.set_height(12, 12, -2.0);
        let low = grid.lowest_point_in_area(&Region::new(0, 6, 0, 6));
        assert_eq!(low.coords(), (3, 4));
    }
}
