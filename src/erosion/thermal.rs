//! Thermal erosion: material slides to the lowest neighbour while the drop
//! exceeds the talus threshold.

use rand::Rng;

use super::ThermalParams;
use crate::geometry::{neighbors::offset_in, Region, MOORE_DIAGONALS_FIRST};
use crate::terrain::HeightfieldGrid;

/// Summary of a batch of thermal events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThermalStats {
    pub events: u32,
    /// Total hops across all events.
    pub moves: u64,
    /// Events stopped by `max_chain` rather than by reaching a stable cell.
    pub capped: u32,
}

/// Lowest Moore neighbour, diagonals checked first; ties keep the first found.
fn lowest_neighbor(grid: &HeightfieldGrid, x: usize, z: usize) -> Option<(usize, usize, f32)> {
    let mut best: Option<(usize, usize, f32)> = None;
    for &(dx, dz) in MOORE_DIAGONALS_FIRST.iter() {
        if let Some((nx, nz)) = offset_in(grid.size(), x, z, dx, dz) {
            let h = grid.height(nx, nz);
            if best.is_none_or(|(_, _, bh)| h < bh) {
                best = Some((nx, nz, h));
            }
        }
    }
    best
}

/// Runs one relaxation chain starting at `(x, z)`.
///
/// Returns the number of hops and whether the chain hit `max_chain`.
pub fn relax_from(grid: &mut HeightfieldGrid, x: usize, z: usize, params: &ThermalParams) -> (u32, bool) {
    let (mut cx, mut cz) = (x, z);
    let mut hops = 0;
    while hops < params.max_chain {
        let Some((nx, nz, low)) = lowest_neighbor(grid, cx, cz) else {
            return (hops, false);
        };
        let diff = grid.height(cx, cz) - low;
        if diff <= params.slope_min {
            return (hops, false);
        }
        let amount = params.deposition * (diff - params.slope_min);
        grid.add_height(cx, cz, -amount);
        grid.add_height(nx, nz, amount);
        (cx, cz) = (nx, nz);
        hops += 1;
    }
    (hops, true)
}

/// Runs `params.iterations` events from random cells anywhere on the map.
pub fn thermal_erosion<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    params: &ThermalParams,
    rng: &mut R,
) -> ThermalStats {
    let last = grid.size() as i32 - 1;
    // Starting cells exclude the last row and column.
    let region = Region::new(0, (last - 1).max(0), 0, (last - 1).max(0));
    thermal_erode_region(grid, params, &region, rng)
}

/// Runs `params.iterations` events whose starting cells are drawn from `region`.
pub fn thermal_erode_region<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    params: &ThermalParams,
    region: &Region,
    rng: &mut R,
) -> ThermalStats {
    let region = region.clamp_to(grid.size());
    let mut stats = ThermalStats::default();
    for _ in 0..params.iterations {
        let x = rng.random_range(region.x_min..=region.x_max) as usize;
        let z = rng.random_range(region.z_min..=region.z_max) as usize;
        let (hops, capped) = relax_from(grid, x, z, params);
        stats.events += 1;
        stats.moves += hops as u64;
        if capped {
            stats.capped += 1;
        }
    }
    if stats.capped > 0 {
        log::debug!("thermal erosion: {} of {} chains hit the hop cap", stats.capped, stats.events);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn total(grid: &HeightfieldGrid) -> f64 {
        grid.heights.iter().map(|&h| h as f64).sum()
    }

    #[test]
    fn test_single_event_conserves_mass() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(9, 9, 1.0);
        let before = total(&grid);
        let (hops, capped) = relax_from(&mut grid, 9, 9, &ThermalParams::default());
        assert!(hops > 0);
        assert!(!capped);
        assert!((total(&grid) - before).abs() < 1e-5);
        assert!(grid.height(9, 9) < 1.0);
    }

    #[test]
    fn test_material_goes_to_diagonal_first_on_tie() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(9, 9, 1.0);
        let params = ThermalParams { max_chain: 1, ..Default::default() };
        relax_from(&mut grid, 9, 9, &params);
        assert!(grid.height(8, 8) > 0.0);
        assert_eq!(grid.height(8, 9), 0.0);
    }

    #[test]
    fn test_stable_slope_untouched() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(9, 9, 0.00001);
        let (hops, _) = relax_from(&mut grid, 9, 9, &ThermalParams::default());
        assert_eq!(hops, 0);
        assert_eq!(grid.height(9, 9), 0.00001);
    }

    #[test]
    fn test_batch_conserves_mass_and_flattens() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(16, 2));
        for (x, z) in grid.cell_coords().collect::<Vec<_>>() {
            grid.set_height(x, z, ((x * 7 + z * 13) % 5) as f32 * 0.1);
        }
        let before = total(&grid);
        let (lo0, hi0) = grid.height_range();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let params = ThermalParams { iterations: 2000, ..Default::default() };
        let stats = thermal_erosion(&mut grid, &params, &mut rng);
        let (lo1, hi1) = grid.height_range();

        assert_eq!(stats.events, 2000);
        assert!((total(&grid) - before).abs() < 1e-3);
        assert!(hi1 - lo1 <= hi0 - lo0);
    }

    #[test]
    fn test_region_events_start_inside() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(2, 2, 1.0);
        grid.set_height(15, 15, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let params = ThermalParams { iterations: 1000, ..Default::default() };
        thermal_erode_region(&mut grid, &params, &Region::new(12, 17, 12, 17), &mut rng);
        assert_eq!(grid.height(2, 2), 1.0);
        assert!(grid.height(15, 15) < 1.0);
    }
}
