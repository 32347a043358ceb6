//! Erosion configuration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Wind bias applied to the hydraulic outflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindParams {
    /// Wind vector: `x` biases the down/up pipes, `y` the left/right
    /// pipes. Zero disables wind.
    pub direction: Vec2,
    /// Height-difference band within which wind still acts on a pipe.
    pub coverage: f32,
    /// Scale the wind force with the local surface height.
    pub altitude_scaled: bool,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            direction: Vec2::ZERO,
            coverage: 1.0,
            altitude_scaled: true,
        }
    }
}

/// Parameters for the virtual-pipe hydraulic model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicParams {
    /// Drop rain at the start of each step.
    pub rain: bool,
    /// Number of raindrops per step.
    pub rain_intensity: u32,
    /// Water viscosity / sediment capacity (Kc).
    pub viscosity: f32,
    /// Soil dissolving rate (Ks).
    pub dissolving: f32,
    /// Deposition rate (Kd).
    pub deposition: f32,
    /// Evaporation rate (Ke), scaled by 10 inside the step.
    pub evaporation: f32,
    /// Raindrop weight (Kr), scaled by 1/10 inside the step.
    pub rain_amount: f32,
    /// Gravity (G).
    pub gravity: f32,
    pub wind: WindParams,
}

impl Default for HydraulicParams {
    fn default() -> Self {
        Self {
            rain: true,
            rain_intensity: 500,
            viscosity: 0.07,
            dissolving: 0.05,
            deposition: 0.05,
            evaporation: 0.06,
            rain_amount: 0.05,
            gravity: 9.81,
            wind: WindParams::default(),
        }
    }
}

impl HydraulicParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("viscosity", self.viscosity),
            ("dissolving", self.dissolving),
            ("deposition", self.deposition),
            ("evaporation", self.evaporation),
            ("rain_amount", self.rain_amount),
            ("gravity", self.gravity),
        ];
        for (name, value) in rates {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeRate(name, value));
            }
        }
        if self.wind.coverage < 0.0 {
            return Err(ConfigError::NegativeRate("wind.coverage", self.wind.coverage));
        }
        Ok(())
    }
}

/// Parameters for thermal (talus) relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Independent erosion events per call.
    pub iterations: u32,
    /// Height difference below which material stays put.
    pub slope_min: f32,
    /// Fraction of the excess difference moved per hop.
    pub deposition: f32,
    /// Upper bound on hops in one event.
    pub max_chain: u32,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            iterations: 500,
            slope_min: 0.00002,
            deposition: 0.2,
            max_chain: 4096,
        }
    }
}

impl ThermalParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slope_min >= 0.0) {
            return Err(ConfigError::NegativeRate("slope_min", self.slope_min));
        }
        if !(0.0..=0.5).contains(&self.deposition) {
            return Err(ConfigError::OutOfRange("thermal.deposition", self.deposition, 0.0, 0.5));
        }
        Ok(())
    }
}
