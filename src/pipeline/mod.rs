//! Ordered generation passes over a [`Landscape`](crate::terrain::Landscape).
//!
//! Each pass implements [`GenerationStage`]; a [`Pipeline`] checks stage
//! dependencies and runs them in order.

mod stage;

pub use stage::{
    BlurStage, FractalStage, GenerationStage, HydraulicStage, MountainStage, Pipeline,
    PipelineError, RiverStage, ScrollStage, SpikeStage, StageId, ThermalStage,
};
