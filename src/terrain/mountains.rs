//! Mountain preservation: keep the tallest peaks, flatten everything far from them.

use serde::{Deserialize, Serialize};

use super::HeightfieldGrid;
use crate::config::ConfigError;
use crate::filters::gaussian_blur_region;
use crate::geometry::Region;
use crate::rivers::Vertex;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainParams {
    /// Number of peaks to keep.
    pub count: usize,
    /// Minimum peak spacing is twice this; also sets the blur around each peak.
    pub radius: i32,
    /// Falloff sharpness.
    pub exponent: f32,
}

impl Default for MountainParams {
    fn default() -> Self {
        Self { count: 3, radius: 30, exponent: 20.0 }
    }
}

/// Scales each height by `s^exponent`, where `s = log_size(size - d)` and `d`
/// is the distance to the nearest kept peak. Cells next to a peak keep their
/// height; the rest sink towards zero. A small blur then softens each summit.
///
/// Returns the peaks that were kept.
pub fn preserve_mountains(
    grid: &mut HeightfieldGrid,
    params: &MountainParams,
) -> Result<Vec<Vertex>, ConfigError> {
    let peaks = grid.find_peaks(params.count, params.radius);
    if peaks.is_empty() {
        log::debug!("no peaks found, nothing to preserve");
        return Ok(peaks);
    }

    let size = grid.size() as f32;
    let ln_size = size.ln();
    for (x, z) in grid.cell_coords().collect::<Vec<_>>() {
        let here = Vertex::new(x as i32, z as i32, 0.0);
        let falloff = peaks
            .iter()
            .map(|p| ((size - p.distance(&here)).max(1.0).ln() / ln_size).clamp(0.0, 1.0))
            .fold(0.0f32, f32::max);
        let i = grid.index(x, z);
        grid.heights[i] *= falloff.powf(params.exponent);
    }

    let kernel = (params.radius / 10).max(0) as usize;
    if kernel > 0 {
        let kernel = kernel | 1;
        let sigma = params.radius as f32 / 10.0;
        for peak in &peaks {
            let window = Region::around(peak.x, peak.z, kernel as i32);
            gaussian_blur_region(grid, sigma, kernel, &window)?;
        }
    }

    log::debug!("preserved {} peaks", peaks.len());
    Ok(peaks)
}
