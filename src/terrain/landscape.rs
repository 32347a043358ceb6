//! The simulation context: grid, random stream and everything planned on it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{preserve_mountains, GridConfig, HeightfieldGrid};
use crate::config::{ConfigError, TerrainConfig};
use crate::erosion::thermal_erode_region;
use crate::filters::{gaussian_blur_region, spike_filter_region};
use crate::fractal::extend;
use crate::geometry::{Region, Side, Sides};
use crate::rivers::{
    carve_river, distort_path, flood_across, flood_from_point, PlanError, RiverInfo, RiverParams,
    Vertex,
};
use crate::util::Timed;

/// Cells of overlap with the old terrain smoothed by thermal erosion after a scroll.
const SCROLL_THERMAL_MARGIN: i32 = 5;
/// Cells of overlap blurred after a scroll.
const SCROLL_BLUR_MARGIN: i32 = 2;

/// Owns the grid and the state derived from it.
#[derive(Debug, Clone)]
pub struct Landscape {
    pub grid: HeightfieldGrid,
    pub rivers: Vec<RiverInfo>,
    pub peaks: Vec<Vertex>,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Landscape {
    /// Creates a flat landscape with a seeded random stream.
    pub fn new(grid: GridConfig, seed: u64) -> Self {
        Self {
            grid: HeightfieldGrid::new(grid),
            rivers: Vec::new(),
            peaks: Vec::new(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &TerrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.grid, config.seed))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Grid and random stream borrowed together.
    pub fn parts_mut(&mut self) -> (&mut HeightfieldGrid, &mut ChaCha8Rng) {
        (&mut self.grid, &mut self.rng)
    }

    /// Keeps the highest peaks and flattens the rest of the map.
    pub fn preserve_mountains(&mut self, config: &TerrainConfig) -> Result<(), ConfigError> {
        self.peaks = preserve_mountains(&mut self.grid, &config.mountains)?;
        Ok(())
    }

    /// Scrolls one patch towards `side`, generating fresh terrain in the
    /// uncovered strip and moving every river with the map.
    pub fn scroll(&mut self, side: Side, config: &TerrainConfig) -> Result<(), ConfigError> {
        let _t = Timed::debug("scroll");
        extend(&mut self.grid, side, &config.fractal, &mut self.rng);

        if config.passes.smooth_scrolled {
            let thermal_region = self.strip_region(side, SCROLL_THERMAL_MARGIN);
            thermal_erode_region(&mut self.grid, &config.thermal, &thermal_region, &mut self.rng);
            let blur_region = self.strip_region(side, SCROLL_BLUR_MARGIN);
            spike_filter_region(&mut self.grid, config.spike.epsilon(), &blur_region);
            gaussian_blur_region(
                &mut self.grid,
                config.blur.blur_factor,
                config.blur.kernel_size,
                &blur_region,
            )?;
        }

        let stride = self.grid.config().patch_stride() as i32;
        let size = self.size();
        for river in &mut self.rivers {
            let removed = river.shift(side, stride, size);
            if removed > 0 {
                log::debug!("river lost {removed} vertices to the scroll");
            }
        }
        self.rivers.retain(|r| r.len() >= 2);
        log::info!("scrolled towards {side}, {} rivers kept", self.rivers.len());
        Ok(())
    }

    /// The freshly generated strip at `side`, widened by `margin` cells into
    /// the retained terrain.
    fn strip_region(&self, side: Side, margin: i32) -> Region {
        let last = self.size() as i32 - 1;
        let stride = self.grid.config().patch_stride() as i32;
        let region = match side {
            Side::Top => Region::new(0, last, last + 1 - stride - margin, last),
            Side::Bottom => Region::new(0, last, 0, stride - 1 + margin),
            Side::Right => Region::new(last + 1 - stride - margin, last, 0, last),
            Side::Left => Region::new(0, stride - 1 + margin, 0, last),
        };
        region.clamp_to(self.size())
    }

    /// Plans one river from the lowest region of the map, jitters it and
    /// carves it in. New rivers avoid borders earlier rivers already reach.
    pub fn plan_river(&mut self, params: &RiverParams) -> Result<&RiverInfo, PlanError> {
        let _t = Timed::debug("river");
        let flood = &params.flood;
        let start = self.grid.lowest_region_center(flood.region_radius, flood.region_offset);
        let mut river = if params.through {
            flood_across(&self.grid, start, flood)?
        } else {
            let excluded = self.rivers.iter().fold(Sides::NONE, |acc, r| acc.union(r.reached));
            if Side::ALL.iter().all(|s| excluded.contains(*s)) {
                return Err(PlanError::NoPath(start.x, start.z));
            }
            flood_from_point(&self.grid, start, excluded, None, flood)?
        };

        river.path = distort_path(&self.grid, &river.path, params.carve.max_distort, &mut self.rng);
        river.refresh_endpoints();
        carve_river(&mut self.grid, &river.path, &params.carve);

        let index = self.rivers.len();
        self.rivers.push(river);
        Ok(&self.rivers[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::diamond_square;

    fn small_config() -> TerrainConfig {
        let mut config = TerrainConfig::default();
        config.grid = GridConfig::new(32, 3);
        config.seed = 21;
        config
    }

    #[test]
    fn test_landscape_from_config() {
        let config = small_config();
        let land = Landscape::from_config(&config).unwrap();
        assert_eq!(land.size(), 99);
        assert_eq!(land.seed(), 21);
        assert!(land.rivers.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.grid.patch_count = 0;
        assert!(matches!(Landscape::from_config(&config), Err(ConfigError::PatchCount)));
    }

    #[test]
    fn test_strip_regions() {
        let land = Landscape::new(GridConfig::new(32, 3), 0);
        assert_eq!(land.strip_region(Side::Top, 0), Region::new(0, 98, 66, 98));
        assert_eq!(land.strip_region(Side::Left, 2), Region::new(0, 34, 0, 98));
    }

    #[test]
    fn test_scroll_moves_rivers() {
        let config = small_config();
        let mut land = Landscape::from_config(&config).unwrap();
        let (grid, rng) = land.parts_mut();
        diamond_square(grid, &config.fractal, rng);
        let path = vec![land.grid.vertex(10, 40), land.grid.vertex(10, 60), land.grid.vertex(10, 90)];
        land.rivers.push(RiverInfo::new(path, Sides::NONE.with(Side::Top)));

        land.scroll(Side::Top, &config).unwrap();
        let river = &land.rivers[0];
        assert_eq!(river.path.iter().map(|v| v.z).collect::<Vec<_>>(), vec![7, 27, 57]);
    }

    #[test]
    fn test_scroll_single_patch_map() {
        let mut config = small_config();
        config.grid = GridConfig::new(16, 1);
        let mut land = Landscape::from_config(&config).unwrap();
        let (grid, rng) = land.parts_mut();
        diamond_square(grid, &config.fractal, rng);

        for side in Side::ALL {
            land.scroll(side, &config).unwrap();
        }
        assert_eq!(land.size(), 17);
        assert!(land.grid.heights.iter().all(|h| h.is_finite()));
    }
}
