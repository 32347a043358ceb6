//! Grid dimensions.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Patch layout of the heightfield.
///
/// The map is `patch_count x patch_count` patches of `patch_size` cells, with
/// one seam row/column per patch: `terrain_size = patch_size * patch_count + patch_count`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells along one patch edge (power of two).
    pub patch_size: usize,
    /// Patches along one map edge.
    pub patch_count: usize,
    /// Grid-to-world scale (x, height, z).
    pub scale: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            patch_size: 64,
            patch_count: 3,
            scale: Vec3::new(800.0, 100.0, 800.0),
        }
    }
}

impl GridConfig {
    pub fn new(patch_size: usize, patch_count: usize) -> Self {
        Self {
            patch_size,
            patch_count,
            ..Self::default()
        }
    }

    /// Side length of the square grid.
    pub fn terrain_size(&self) -> usize {
        self.patch_size * self.patch_count + self.patch_count
    }

    /// Distance between the first cells of two consecutive patches.
    pub fn patch_stride(&self) -> usize {
        self.patch_size + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_size_includes_seams() {
        let cfg = GridConfig::default();
        assert_eq!(cfg.terrain_size(), 195);
        assert_eq!(cfg.patch_stride() * cfg.patch_count, cfg.terrain_size());
    }
}
