//! Patch-wise diamond-square displacement with seam welding.
//!
//! Patch `(px, pz)` covers cells `[px * stride, px * stride + patch_size]` on
//! each axis, where `stride = patch_size + 1`. Adjacent patches therefore own
//! neighbouring columns; after a patch is finished its border is copied one
//! cell outward so the next patch inherits it unchanged.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Side, Sides};
use crate::terrain::HeightfieldGrid;

/// Configuration for diamond-square generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiamondSquareParams {
    /// Initial displacement amplitude; halves with every refinement level.
    pub strength: f32,
    /// Jitter range of the square step, as a fraction of the amplitude.
    pub square_jitter: f32,
    /// Jitter range of the diamond step, as a fraction of the amplitude.
    pub diamond_jitter: f32,
}

impl Default for DiamondSquareParams {
    fn default() -> Self {
        Self {
            strength: 0.7,
            square_jitter: 0.5,
            diamond_jitter: 0.4,
        }
    }
}

impl DiamondSquareParams {
    pub fn with_strength(strength: f32) -> Self {
        Self { strength, ..Default::default() }
    }

    /// Low-amplitude rolling hills.
    pub fn gentle() -> Self {
        Self { strength: 0.3, square_jitter: 0.35, diamond_jitter: 0.3 }
    }

    /// Jagged, high-amplitude relief.
    pub fn rugged() -> Self {
        Self { strength: 1.2, square_jitter: 0.6, diamond_jitter: 0.5 }
    }
}

/// Corner welding flags for one patch.
///
/// A welded corner already holds a final value shared with a finished
/// neighbour and is never re-randomised. Corners: `a = (x0, z0)`,
/// `b = (x1, z0)`, `c = (x1, z1)`, `d = (x0, z1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Welds {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub d: bool,
}

impl Welds {
    /// Derives the flags from which neighbouring patches are already final.
    pub fn from_finished(finished: Sides) -> Self {
        let mut w = Welds::default();
        for side in finished.iter() {
            match side {
                Side::Left => {
                    w.a = true;
                    w.d = true;
                }
                Side::Bottom => {
                    w.a = true;
                    w.b = true;
                }
                Side::Right => {
                    w.b = true;
                    w.c = true;
                }
                Side::Top => {
                    w.c = true;
                    w.d = true;
                }
            }
        }
        w
    }

    /// An edge is fixed when both of its corners are welded.
    fn edge_fixed(&self, side: Side) -> bool {
        match side {
            Side::Left => self.a && self.d,
            Side::Bottom => self.a && self.b,
            Side::Right => self.b && self.c,
            Side::Top => self.c && self.d,
        }
    }
}

#[inline]
fn jitter<R: Rng + ?Sized>(rng: &mut R, range: f32) -> f32 {
    (rng.random::<f32>() * 2.0 - 1.0) * range
}

/// Fills the whole grid, patch by patch (x-major), welding each patch to the
/// ones generated before it.
pub fn diamond_square<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    params: &DiamondSquareParams,
    rng: &mut R,
) {
    let count = grid.config().patch_count;
    for px in 0..count {
        for pz in 0..count {
            let mut finished = Sides::NONE;
            if px > 0 {
                finished.insert(Side::Left);
            }
            if pz > 0 {
                finished.insert(Side::Bottom);
            }
            generate_patch(grid, px, pz, Welds::from_finished(finished), params, rng);
        }
    }
    log::debug!(
        "diamond-square: {count}x{count} patches of {} (strength {})",
        grid.config().patch_size,
        params.strength
    );
}

/// Generates a single patch and copies its border into the adjacent seam cells.
pub fn generate_patch<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    px: usize,
    pz: usize,
    welds: Welds,
    params: &DiamondSquareParams,
    rng: &mut R,
) {
    let ps = grid.config().patch_size;
    let stride = grid.config().patch_stride();
    let (x0, z0) = (px * stride, pz * stride);
    let (x1, z1) = (x0 + ps, z0 + ps);
    let mut scale = params.strength;

    // Corners first.
    if !welds.a {
        grid.set_height(x0, z0, rng.random::<f32>() * scale);
    }
    if !welds.b {
        grid.set_height(x1, z0, rng.random::<f32>() * scale);
    }
    if !welds.c {
        grid.set_height(x1, z1, rng.random::<f32>() * scale);
    }
    if !welds.d {
        grid.set_height(x0, z1, rng.random::<f32>() * scale);
    }

    let mut step = ps;
    while step > 1 {
        let half = step / 2;

        // Square step: centres from their four diagonal corners.
        for x in (x0 + half..x1).step_by(step) {
            for z in (z0 + half..z1).step_by(step) {
                let avg = (grid.height(x - half, z - half)
                    + grid.height(x + half, z - half)
                    + grid.height(x + half, z + half)
                    + grid.height(x - half, z + half))
                    * 0.25;
                grid.set_height(x, z, avg + jitter(rng, params.square_jitter) * scale);
            }
        }

        // Diamond step: edge midpoints from the two corners they join.
        for x in (x0 + half..x1).step_by(step) {
            for z in (z0 + half..z1).step_by(step) {
                let a = grid.height(x - half, z - half);
                let b = grid.height(x + half, z - half);
                let c = grid.height(x + half, z + half);
                let d = grid.height(x - half, z + half);

                if !(x - half == x0 && welds.edge_fixed(Side::Left)) {
                    let v = (a + d) * 0.5 + jitter(rng, params.diamond_jitter) * scale;
                    grid.set_height(x - half, z, v);
                }
                if !(z + half == z1 && welds.edge_fixed(Side::Top)) {
                    let v = (c + d) * 0.5 + jitter(rng, params.diamond_jitter) * scale;
                    grid.set_height(x, z + half, v);
                }
                if !(x + half == x1 && welds.edge_fixed(Side::Right)) {
                    let v = (b + c) * 0.5 + jitter(rng, params.diamond_jitter) * scale;
                    grid.set_height(x + half, z, v);
                }
                if !(z - half == z0 && welds.edge_fixed(Side::Bottom)) {
                    let v = (a + b) * 0.5 + jitter(rng, params.diamond_jitter) * scale;
                    grid.set_height(x, z - half, v);
                }
            }
        }

        step /= 2;
        scale /= 2.0;
    }

    propagate_border(grid, x0, z0, ps);
}

/// Copies the patch border one cell outward into each existing neighbour.
fn propagate_border(grid: &mut HeightfieldGrid, x0: usize, z0: usize, ps: usize) {
    let last = grid.size() - 1;
    let (x1, z1) = (x0 + ps, z0 + ps);

    if x0 != 0 {
        for z in z0..=z1 {
            let h = grid.height(x0, z);
            grid.set_height(x0 - 1, z, h);
        }
    }
    if z0 != 0 {
        for x in x0..=x1 {
            let h = grid.height(x, z0);
            grid.set_height(x, z0 - 1, h);
        }
    }
    if x1 != last {
        for z in z0..=z1 {
            let h = grid.height(x1, z);
            grid.set_height(x1 + 1, z, h);
        }
    }
    if z1 != last {
        for x in x0..=x1 {
            let h = grid.height(x, z1);
            grid.set_height(x, z1 + 1, h);
        }
    }
}

/// Scrolls the map one patch towards `side` and generates the new strip of
/// patches, welded to the existing terrain.
pub fn extend<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    side: Side,
    params: &DiamondSquareParams,
    rng: &mut R,
) {
    let count = grid.config().patch_count;
    let stride = grid.config().patch_stride();
    let size = grid.size();
    let last = size - 1;

    // The old border at `side` becomes the inner seam of the new strip. It is
    // read before the shift because a single-patch map shifts out entirely.
    let seam: Vec<f32> = (0..size)
        .map(|i| match side {
            Side::Top => grid.height(i, last),
            Side::Bottom => grid.height(i, 0),
            Side::Right => grid.height(last, i),
            Side::Left => grid.height(0, i),
        })
        .collect();
    grid.shift_toward(side, stride);

    let strip = match side {
        Side::Top | Side::Right => count - 1,
        Side::Bottom | Side::Left => 0,
    };
    let strip_start = strip * stride;
    let strip_end = strip_start + stride - 1;

    for (i, h) in seam.into_iter().enumerate() {
        match side {
            Side::Top => grid.set_height(i, strip_start, h),
            Side::Bottom => grid.set_height(i, strip_end, h),
            Side::Right => grid.set_height(strip_start, i, h),
            Side::Left => grid.set_height(strip_end, i, h),
        }
    }

    for k in 0..count {
        let mut finished = Sides::NONE.with(side.opposite());
        let (px, pz) = match side {
            Side::Top | Side::Bottom => {
                if k > 0 {
                    finished.insert(Side::Left);
                }
                (k, strip)
            }
            Side::Right | Side::Left => {
                if k > 0 {
                    finished.insert(Side::Bottom);
                }
                (strip, k)
            }
        };
        generate_patch(grid, px, pz, Welds::from_finished(finished), params, rng);
    }

    log::debug!("extended terrain towards {side}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generated(seed: u64) -> HeightfieldGrid {
        let mut grid = HeightfieldGrid::new(GridConfig::new(16, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        diamond_square(&mut grid, &DiamondSquareParams::default(), &mut rng);
        grid
    }

    fn assert_seams_welded(grid: &HeightfieldGrid) {
        let stride = grid.config().patch_stride();
        let count = grid.config().patch_count;
        for p in 0..count - 1 {
            let seam = p * stride + grid.config().patch_size;
            for i in 0..grid.size() {
                assert_eq!(
                    grid.height(seam, i).to_bits(),
                    grid.height(seam + 1, i).to_bits(),
                    "vertical seam at x={seam}, z={i}"
                );
                assert_eq!(
                    grid.height(i, seam).to_bits(),
                    grid.height(i, seam + 1).to_bits(),
                    "horizontal seam at z={seam}, x={i}"
                );
            }
        }
    }

    #[test]
    fn test_seams_are_bit_identical() {
        assert_seams_welded(&generated(7));
        assert_seams_welded(&generated(12345));
    }

    #[test]
    fn test_deterministic_for_seed() {
        assert_eq!(generated(42).heights, generated(42).heights);
        assert_ne!(generated(42).heights, generated(43).heights);
    }

    #[test]
    fn test_every_cell_written() {
        let grid = generated(3);
        // Every height is a finite value, and zero exactly only by accident.
        assert!(grid.heights.iter().all(|h| h.is_finite()));
        let zeros = grid.heights.iter().filter(|&&h| h == 0.0).count();
        assert!(zeros < 4, "{zeros} untouched cells");
    }

    #[test]
    fn test_welds_from_finished() {
        let w = Welds::from_finished(Sides::NONE.with(Side::Left).with(Side::Bottom));
        assert_eq!(w, Welds { a: true, b: true, c: false, d: true });
        assert!(w.edge_fixed(Side::Left));
        assert!(w.edge_fixed(Side::Bottom));
        assert!(!w.edge_fixed(Side::Top));
    }

    #[test]
    fn test_welded_corner_is_kept() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(0, 0, 5.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let welds = Welds { a: true, ..Welds::default() };
        generate_patch(&mut grid, 0, 0, welds, &DiamondSquareParams::default(), &mut rng);
        assert_eq!(grid.height(0, 0), 5.0);
    }

    #[test]
    fn test_extend_keeps_seams_and_shifts() {
        for side in Side::ALL {
            let mut grid = generated(99);
            let before = grid.clone();
            let stride = grid.config().patch_stride();
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            extend(&mut grid, side, &DiamondSquareParams::default(), &mut rng);
            assert_seams_welded(&grid);

            // A cell in the retained part moved by one stride.
            let (dx, dz) = side.offset();
            let (x, z) = (20usize, 20usize);
            let sx = (x as i64 + dx as i64 * stride as i64) as usize;
            let sz = (z as i64 + dz as i64 * stride as i64) as usize;
            assert_eq!(grid.height(x, z), before.height(sx, sz), "side {side}");
        }
    }

    #[test]
    fn test_extend_single_patch_map() {
        for side in Side::ALL {
            let mut grid = HeightfieldGrid::new(GridConfig::new(16, 1));
            let mut rng = ChaCha8Rng::seed_from_u64(8);
            diamond_square(&mut grid, &DiamondSquareParams::default(), &mut rng);
            let before = grid.clone();
            let last = grid.size() - 1;

            extend(&mut grid, side, &DiamondSquareParams::default(), &mut rng);

            // The old border at `side` is now the opposite border, unchanged.
            for i in 0..grid.size() {
                let (old, new) = match side {
                    Side::Top => (before.height(i, last), grid.height(i, 0)),
                    Side::Bottom => (before.height(i, 0), grid.height(i, last)),
                    Side::Right => (before.height(last, i), grid.height(0, i)),
                    Side::Left => (before.height(0, i), grid.height(last, i)),
                };
                assert_eq!(old.to_bits(), new.to_bits(), "side {side}, cell {i}");
            }
            assert!(grid.heights.iter().all(|h| h.is_finite()));
        }
    }
}
