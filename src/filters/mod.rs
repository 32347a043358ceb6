//! Smoothing filters: spike removal and Gaussian blur.

mod gaussian;
mod spike;

pub use gaussian::{gaussian_blur, gaussian_blur_region, gaussian_kernel, BlurParams};
pub use spike::{spike_filter, spike_filter_region, SpikeParams};
