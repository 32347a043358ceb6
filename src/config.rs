//! Top-level configuration and its validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::erosion::{HydraulicParams, ThermalParams};
use crate::filters::{BlurParams, SpikeParams};
use crate::fractal::DiamondSquareParams;
use crate::geometry::Side;
use crate::rivers::RiverParams;
use crate::terrain::{GridConfig, MountainParams};

/// Invalid or unreadable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("patch size {0} must be a power of two and at least 2")]
    PatchSize(usize),
    #[error("patch count must be at least 1")]
    PatchCount,
    #[error("Gaussian kernel size {0} must be odd and non-zero")]
    KernelSize(usize),
    #[error("blur factor {0} must be positive")]
    BlurFactor(f32),
    #[error("{0} must not be negative (got {1})")]
    NegativeRate(&'static str, f32),
    #[error("{0} = {1} is outside [{2}, {3}]")]
    OutOfRange(&'static str, f32, f32, f32),
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which passes run, how often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    pub spike_filter: bool,
    pub blur: bool,
    pub thermal: bool,
    /// Hydraulic steps; zero skips the pass.
    pub hydraulic_steps: u32,
    pub mountains: bool,
    /// Scrolls applied after generation, in order.
    pub scrolls: Vec<Side>,
    /// Run local thermal erosion, spike filter and blur over each new strip.
    pub smooth_scrolled: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            spike_filter: true,
            blur: true,
            thermal: true,
            hydraulic_steps: 20,
            mountains: false,
            scrolls: Vec::new(),
            smooth_scrolled: true,
        }
    }
}

/// Every tunable of the terrain system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u64,
    pub grid: GridConfig,
    pub fractal: DiamondSquareParams,
    pub spike: SpikeParams,
    pub blur: BlurParams,
    pub thermal: ThermalParams,
    pub hydraulic: HydraulicParams,
    pub mountains: MountainParams,
    pub rivers: RiverParams,
    pub passes: PassConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid: GridConfig::default(),
            fractal: DiamondSquareParams::default(),
            spike: SpikeParams::default(),
            blur: BlurParams::default(),
            thermal: ThermalParams::default(),
            hydraulic: HydraulicParams::default(),
            mountains: MountainParams::default(),
            rivers: RiverParams::default(),
            passes: PassConfig::default(),
        }
    }
}

impl TerrainConfig {
    /// Loads a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ps = self.grid.patch_size;
        if ps < 2 || !ps.is_power_of_two() {
            return Err(ConfigError::PatchSize(ps));
        }
        if self.grid.patch_count == 0 {
            return Err(ConfigError::PatchCount);
        }
        if !(0.0..=1.0).contains(&self.spike.strength) {
            return Err(ConfigError::OutOfRange("spike.strength", self.spike.strength, 0.0, 1.0));
        }
        self.blur.validate()?;
        self.thermal.validate()?;
        self.hydraulic.validate()?;
        self.rivers.flood.validate()?;
        self.rivers.carve.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_patch_size_must_be_power_of_two() {
        let mut config = TerrainConfig::default();
        config.grid.patch_size = 48;
        assert!(matches!(config.validate(), Err(ConfigError::PatchSize(48))));
        config.grid.patch_size = 1;
        assert!(matches!(config.validate(), Err(ConfigError::PatchSize(1))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TerrainConfig =
            serde_json::from_str(r#"{ "seed": 7, "grid": { "patch_size": 32 }, "passes": { "scrolls": ["top", "left"] } }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.grid.patch_size, 32);
        assert_eq!(config.grid.patch_count, 3);
        assert_eq!(config.passes.scrolls, vec![Side::Top, Side::Left]);
        assert_eq!(config.blur.kernel_size, 5);
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let config = TerrainConfig::default();
        let text = config.to_json_pretty().unwrap();
        let back: TerrainConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = TerrainConfig::from_json_file(Path::new("/nonexistent/terrain.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/terrain.json"));
    }
}
