//! Generation stage trait and pipeline orchestration.

use thiserror::Error;

use crate::config::{ConfigError, TerrainConfig};
use crate::erosion::{hydraulic_erosion, thermal_erosion};
use crate::filters::{gaussian_blur, spike_filter};
use crate::fractal::diamond_square;
use crate::rivers::PlanError;
use crate::terrain::Landscape;
use crate::util::Timed;

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Diamond-square displacement of the whole grid.
    Fractal,
    SpikeFilter,
    Blur,
    Thermal,
    Hydraulic,
    /// Peak preservation and flattening.
    Mountains,
    Rivers,
    /// Streaming the window by whole patches.
    Scroll,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Fractal => "fractal",
            StageId::SpikeFilter => "spike filter",
            StageId::Blur => "blur",
            StageId::Thermal => "thermal erosion",
            StageId::Hydraulic => "hydraulic erosion",
            StageId::Mountains => "mountains",
            StageId::Rivers => "rivers",
            StageId::Scroll => "scroll",
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// One pass over a [`Landscape`].
///
/// Stages read their parameters from the shared [`TerrainConfig`] and mutate
/// the landscape in place.
pub trait GenerationStage: Send + Sync {
    fn id(&self) -> StageId;

    /// Human-readable name, used in progress callbacks.
    fn name(&self) -> &str;

    /// Stages that must have run earlier in the same pipeline.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError>;
}

/// Runs stages in order over one landscape.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: TerrainConfig,
}

impl Pipeline {
    pub fn new(config: TerrainConfig) -> Self {
        Self { stages: Vec::new(), config }
    }

    /// Builds the stage list the pass flags of `config` ask for.
    pub fn from_config(config: TerrainConfig) -> Self {
        let passes = config.passes.clone();
        let rivers = config.rivers.count;
        let mut pipeline = Self::new(config);
        pipeline.add_stage(FractalStage);
        if passes.spike_filter {
            pipeline.add_stage(SpikeStage);
        }
        if passes.blur {
            pipeline.add_stage(BlurStage);
        }
        if passes.thermal {
            pipeline.add_stage(ThermalStage);
        }
        if passes.hydraulic_steps > 0 {
            pipeline.add_stage(HydraulicStage);
        }
        if passes.mountains {
            pipeline.add_stage(MountainStage);
        }
        if rivers > 0 {
            pipeline.add_stage(RiverStage);
        }
        if !passes.scrolls.is_empty() {
            pipeline.add_stage(ScrollStage);
        }
        pipeline
    }

    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Creates a fresh landscape from the config and runs every stage on it.
    pub fn generate(&self) -> Result<Landscape, PipelineError> {
        let mut land = Landscape::from_config(&self.config)?;
        self.run(&mut land)?;
        Ok(land)
    }

    pub fn run(&self, land: &mut Landscape) -> Result<(), PipelineError> {
        self.run_with_callbacks(land, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages, reporting `(name, index, total)` around each one.
    pub fn run_with_callbacks<F1, F2>(
        &self,
        land: &mut Landscape,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            {
                let _t = Timed::info(stage.id().name());
                stage.execute(land, &self.config)?;
            }
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Fills the grid with diamond-square terrain.
pub struct FractalStage;

impl GenerationStage for FractalStage {
    fn id(&self) -> StageId {
        StageId::Fractal
    }

    fn name(&self) -> &str {
        "Fractal Displacement"
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        let (grid, rng) = land.parts_mut();
        diamond_square(grid, &config.fractal, rng);
        let (lo, hi) = grid.height_range();
        log::debug!("fractal heights in [{lo:.3}, {hi:.3}]");
        Ok(())
    }
}

/// Pulls isolated spikes towards their neighbourhood.
pub struct SpikeStage;

impl GenerationStage for SpikeStage {
    fn id(&self) -> StageId {
        StageId::SpikeFilter
    }

    fn name(&self) -> &str {
        "Spike Filter"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        let change = spike_filter(&mut land.grid, config.spike.epsilon());
        log::debug!("spike filter: largest change {change:.4}");
        Ok(())
    }
}

pub struct BlurStage;

impl GenerationStage for BlurStage {
    fn id(&self) -> StageId {
        StageId::Blur
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        gaussian_blur(&mut land.grid, &config.blur)?;
        Ok(())
    }
}

pub struct ThermalStage;

impl GenerationStage for ThermalStage {
    fn id(&self) -> StageId {
        StageId::Thermal
    }

    fn name(&self) -> &str {
        "Thermal Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        let (grid, rng) = land.parts_mut();
        let stats = thermal_erosion(grid, &config.thermal, rng);
        log::debug!("thermal erosion: {} events moved material {} times", stats.events, stats.moves);
        Ok(())
    }
}

/// Runs `passes.hydraulic_steps` virtual-pipe steps.
pub struct HydraulicStage;

impl GenerationStage for HydraulicStage {
    fn id(&self) -> StageId {
        StageId::Hydraulic
    }

    fn name(&self) -> &str {
        "Hydraulic Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        let (grid, rng) = land.parts_mut();
        let stats = hydraulic_erosion(grid, &config.hydraulic, config.passes.hydraulic_steps, rng);
        if !stats.total_water.is_finite() {
            return Err(PipelineError::StageFailed(
                self.name().to_string(),
                "water volume diverged".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct MountainStage;

impl GenerationStage for MountainStage {
    fn id(&self) -> StageId {
        StageId::Mountains
    }

    fn name(&self) -> &str {
        "Mountain Preservation"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        land.preserve_mountains(config)?;
        log::info!("kept {} peaks", land.peaks.len());
        Ok(())
    }
}

/// Plans, jitters and carves `rivers.count` rivers.
///
/// Failing to place the first river fails the stage; later failures only end
/// the sequence early.
pub struct RiverStage;

impl GenerationStage for RiverStage {
    fn id(&self) -> StageId {
        StageId::Rivers
    }

    fn name(&self) -> &str {
        "River Carving"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        for n in 0..config.rivers.count {
            match land.plan_river(&config.rivers) {
                Ok(river) => {
                    log::info!(
                        "river {n}: {} vertices, length {:.1}, reaches {:?}",
                        river.len(),
                        river.length(),
                        river.reached
                    );
                }
                Err(e) if n == 0 => return Err(e.into()),
                Err(e) => {
                    log::warn!("stopped after {n} rivers: {e}");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Applies `passes.scrolls` in order.
pub struct ScrollStage;

impl GenerationStage for ScrollStage {
    fn id(&self) -> StageId {
        StageId::Scroll
    }

    fn name(&self) -> &str {
        "Scroll"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Fractal]
    }

    fn execute(&self, land: &mut Landscape, config: &TerrainConfig) -> Result<(), PipelineError> {
        for side in &config.passes.scrolls {
            land.scroll(*side, config)?;
        }
        Ok(())
    }
}
