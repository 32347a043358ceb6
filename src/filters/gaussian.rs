//! Gaussian blur over a rectangular window.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::geometry::Region;
use crate::terrain::HeightfieldGrid;

/// Gaussian blur settings.
///
/// `region_start`/`region_end` bound the blurred window (inclusive); when
/// absent the whole map is blurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurParams {
    /// Standard deviation of the kernel, in cells.
    pub blur_factor: f32,
    /// Kernel edge length (odd).
    pub kernel_size: usize,
    pub region_start: Option<[i32; 2]>,
    pub region_end: Option<[i32; 2]>,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            blur_factor: 3.5,
            kernel_size: 5,
            region_start: None,
            region_end: None,
        }
    }
}

impl BlurParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(ConfigError::KernelSize(self.kernel_size));
        }
        if self.blur_factor.is_nan() || self.blur_factor <= 0.0 {
            return Err(ConfigError::BlurFactor(self.blur_factor));
        }
        Ok(())
    }

    /// The window to blur on a map of side `size`.
    pub fn region(&self, size: usize) -> Region {
        let last = size as i32 - 1;
        let [x0, z0] = self.region_start.unwrap_or([0, 0]);
        let [x1, z1] = self.region_end.unwrap_or([last, last]);
        Region::new(x0, x1, z0, z1).clamp_to(size)
    }
}

/// Normalised `size x size` Gaussian kernel, row-major.
pub fn gaussian_kernel(sigma: f32, size: usize) -> Vec<f32> {
    debug_assert!(size % 2 == 1, "kernel size must be odd");
    let half = (size / 2) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel = Vec::with_capacity(size * size);
    for dz in -half..=half {
        for dx in -half..=half {
            let r2 = (dx * dx + dz * dz) as f32;
            kernel.push((-r2 / two_sigma_sq).exp());
        }
    }

    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Blurs the window described by `params`.
pub fn gaussian_blur(grid: &mut HeightfieldGrid, params: &BlurParams) -> Result<(), ConfigError> {
    params.validate()?;
    let region = params.region(grid.size());
    gaussian_blur_region(grid, params.blur_factor, params.kernel_size, &region)
}

/// Convolves `region` with a Gaussian kernel. Taps that fall off the grid
/// read the centre cell. Results go to a shadow buffer and are committed
/// once the whole window is done.
pub fn gaussian_blur_region(
    grid: &mut HeightfieldGrid,
    sigma: f32,
    kernel_size: usize,
    region: &Region,
) -> Result<(), ConfigError> {
    BlurParams { blur_factor: sigma, kernel_size, ..BlurParams::default() }.validate()?;

    let size = grid.size();
    let region = region.clamp_to(size);
    let kernel = gaussian_kernel(sigma, kernel_size);
    let half = (kernel_size / 2) as i32;
    let mut shadow = grid.heights.clone();

    for (x, z) in region.cells() {
        let center = grid.heights[z as usize * size + x as usize];
        let mut acc = 0.0;
        let mut k = 0;
        for dz in -half..=half {
            for dx in -half..=half {
                let (nx, nz) = (x + dx, z + dz);
                let h = if grid.in_bounds(nx as i64, nz as i64) {
                    grid.heights[nz as usize * size + nx as usize]
                } else {
                    center
                };
                acc += kernel[k] * h;
                k += 1;
            }
        }
        shadow[z as usize * size + x as usize] = acc;
    }

    grid.heights = shadow;
    log::trace!(
        "blurred {}x{} window (sigma {sigma}, kernel {kernel_size})",
        region.width(),
        region.depth()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;

    #[test]
    fn test_kernel_is_normalized() {
        for &(sigma, size) in &[(0.5, 1), (1.0, 3), (3.5, 5), (10.0, 9), (0.2, 7)] {
            let kernel = gaussian_kernel(sigma, size);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sigma {sigma} size {size} sum {sum}");
            assert_eq!(kernel.len(), size * size);
        }
    }

    #[test]
    fn test_kernel_peaks_at_center() {
        let kernel = gaussian_kernel(1.0, 5);
        let center = kernel[12];
        assert!(kernel.iter().all(|&w| w <= center));
        assert!((kernel[0] - kernel[24]).abs() < 1e-7);
    }

    #[test]
    fn test_even_kernel_rejected() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(4, 2));
        let params = BlurParams { kernel_size: 4, ..BlurParams::default() };
        assert!(matches!(gaussian_blur(&mut grid, &params), Err(ConfigError::KernelSize(4))));
    }

    #[test]
    fn test_constant_field_is_fixed_point() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(8, 2), 0.7);
        gaussian_blur(&mut grid, &BlurParams::default()).unwrap();
        assert!(grid.heights.iter().all(|&h| (h - 0.7).abs() < 1e-5));
    }

    #[test]
    fn test_blur_only_touches_region() {
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(4, 4, 1.0);
        grid.set_height(14, 14, 1.0);
        let params = BlurParams {
            blur_factor: 1.0,
            kernel_size: 3,
            region_start: Some([2, 2]),
            region_end: Some([6, 6]),
        };
        gaussian_blur(&mut grid, &params).unwrap();
        assert!(grid.height(4, 4) < 1.0);
        assert!(grid.height(5, 4) > 0.0);
        assert_eq!(grid.height(14, 14), 1.0);
        assert_eq!(grid.height(15, 14), 0.0);
    }

    #[test]
    fn test_blur_reads_unperturbed_heights() {
        // A single spike must spread symmetrically; in-place writes would skew it.
        let mut grid = HeightfieldGrid::new(GridConfig::new(8, 2));
        grid.set_height(9, 9, 1.0);
        gaussian_blur_region(&mut grid, 1.0, 3, &Region::full(18)).unwrap();
        assert!((grid.height(8, 9) - grid.height(10, 9)).abs() < 1e-7);
        assert!((grid.height(9, 8) - grid.height(9, 10)).abs() < 1e-7);
    }
}
