//! Virtual-pipe hydraulic erosion.
//!
//! One call advances the shallow-water model by a single time step: rain,
//! outflow flux, water/velocity update, erosion-deposition, sediment
//! advection and evaporation.

use glam::{Vec2, Vec4};
use rand::Rng;

use super::HydraulicParams;
use crate::geometry::Edge;
use crate::terrain::HeightfieldGrid;

/// Time step.
pub const DT: f32 = 0.1;
/// Pipe cross-section.
pub const PIPE_LENGTH: f32 = 1.0;
/// Cell area.
pub const CELL_AREA: f32 = 1.0;

/// Diagnostics from one hydraulic step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HydraulicStepStats {
    /// Cells that received rain (with repetition).
    pub raindrops: u32,
    /// Cells whose outflow had to be scaled down to keep water non-negative.
    pub limited_cells: usize,
    /// Sediment advection lookups that landed off the grid.
    pub advection_misses: usize,
    /// Total water after the step.
    pub total_water: f64,
    /// Net height change summed over the grid.
    pub net_height_change: f64,
}

#[inline]
fn sign(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Wind force added to one pipe's pressure term.
///
/// Wind along the positive axis pushes water out through the positive pipe
/// and holds it back on the negative one, as long as the height difference
/// stays within `coverage`.
fn wind_force(edge: Edge, wind_sign: i8, potential: f32, dh: f32, coverage: f32) -> f32 {
    let positive_pipe = matches!(edge, Edge::Right | Edge::Up);
    match (wind_sign, positive_pipe) {
        (1, false) if dh > -coverage => -potential,
        (-1, false) if dh < coverage => -potential,
        (1, true) if dh < coverage => potential,
        (-1, true) if dh > -coverage => potential,
        _ => 0.0,
    }
}

/// Wind potential at a cell for one axis component.
fn wind_potential(strength: f32, surface: f32, slope: f32, altitude_scaled: bool) -> f32 {
    let height = if altitude_scaled { surface } else { 1.0 };
    strength * height * slope.max(0.005)
}

/// Runs one hydraulic erosion step on `grid`.
pub fn hydraulic_step<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    params: &HydraulicParams,
    rng: &mut R,
) -> HydraulicStepStats {
    let size = grid.size();
    let total = grid.cell_count();
    let mut stats = HydraulicStepStats::default();

    let rain_amount = params.rain_amount / 10.0;
    let evaporation = (params.evaporation * 10.0 * DT).clamp(0.0, 1.0);
    let kc = params.viscosity;
    let ks = params.dissolving;
    let kd = params.deposition;
    let g = params.gravity;
    let wind = params.wind;
    // `direction.y` blows across the left/right pipes, `direction.x` across
    // the down/up pipes.
    let across = sign(wind.direction.y);
    let along = sign(wind.direction.x);

    // Rain.
    if params.rain && size > 1 {
        for _ in 0..params.rain_intensity {
            let x = rng.random_range(0..size - 1);
            let z = rng.random_range(0..size - 1);
            grid.water[z * size + x] += rain_amount;
        }
        stats.raindrops = params.rain_intensity;
    }

    // Slopes from the heights at the start of the step.
    let slopes: Vec<f32> = grid.cell_coords().map(|(x, z)| grid.slope(x, z)).collect();

    // Outflow flux.
    let surface = |g: &HeightfieldGrid, i: usize| g.heights[i] + g.water[i] + g.sediment[i];
    let mut flux_next = vec![Vec4::ZERO; total];
    for z in 0..size {
        for x in 0..size {
            let i = z * size + x;
            let here = surface(grid, i);
            let potential_across = if across != 0 {
                wind_potential(wind.direction.y, here, slopes[i], wind.altitude_scaled)
            } else {
                0.0
            };
            let potential_along = if along != 0 {
                wind_potential(wind.direction.x, here, slopes[i], wind.altitude_scaled)
            } else {
                0.0
            };

            let previous = grid.outflow[i];
            let mut flux = [0.0f32; 4];
            for edge in Edge::ALL {
                let (dx, dz) = edge.offset();
                let (nx, nz) = (x as i64 + dx as i64, z as i64 + dz as i64);
                if !grid.in_bounds(nx, nz) {
                    continue;
                }
                let dh = here - surface(grid, nz as usize * size + nx as usize);
                let force = match edge {
                    Edge::Left | Edge::Right => {
                        wind_force(edge, across, potential_across, dh, wind.coverage)
                    }
                    Edge::Down | Edge::Up => wind_force(edge, along, potential_along, dh, wind.coverage),
                };
                let k = edge.index();
                flux[k] = (previous[k] + DT * CELL_AREA * (g * dh + force) / PIPE_LENGTH).max(0.0);
            }

            let out_sum: f32 = flux.iter().sum();
            let water = grid.water[i];
            if out_sum * DT > water * PIPE_LENGTH * PIPE_LENGTH {
                let scale = (water * PIPE_LENGTH * PIPE_LENGTH / (out_sum * DT)).min(1.0);
                for f in &mut flux {
                    *f *= scale;
                }
                stats.limited_cells += 1;
            }
            flux_next[i] = Vec4::from_array(flux);
        }
    }
    grid.outflow = flux_next;

    // Water, velocity, erosion and deposition.
    let mut heights_next = grid.heights.clone();
    for z in 0..size {
        for x in 0..size {
            let i = z * size + x;
            let out = grid.outflow[i];
            let inflow = |edge: Edge| -> f32 {
                let (dx, dz) = edge.offset();
                let (nx, nz) = (x as i64 + dx as i64, z as i64 + dz as i64);
                if grid.in_bounds(nx, nz) {
                    grid.outflow[nz as usize * size + nx as usize][edge.facing().index()]
                } else {
                    0.0
                }
            };
            let in_left = inflow(Edge::Left);
            let in_right = inflow(Edge::Right);
            let in_down = inflow(Edge::Down);
            let in_up = inflow(Edge::Up);

            let flux_in = in_left + in_right + in_down + in_up;
            let flux_out = out.x + out.y + out.z + out.w;
            let volume = (DT * (flux_in - flux_out)).max(0.0);
            grid.water[i] += volume / (PIPE_LENGTH * PIPE_LENGTH);

            let velocity = Vec2::new(
                in_left - out.x + out.y - in_right,
                in_down - out.z + out.w - in_up,
            ) * 0.5;
            grid.velocity[i] = velocity;

            let capacity = kc * velocity.length() * slopes[i];
            let sediment = grid.sediment[i];
            let height = grid.heights[i];
            let dissolved = (ks * (capacity - sediment)).max(0.0);
            let deposited = (kd * (sediment - capacity)).max(0.0);

            if capacity > sediment && height - dissolved > 0.0 && grid.water[i] > sediment {
                heights_next[i] = height - dissolved;
                grid.sediment[i] = sediment + dissolved;
            } else {
                heights_next[i] = height + deposited;
                grid.sediment[i] = sediment - deposited;
            }
        }
    }
    stats.net_height_change = heights_next
        .iter()
        .zip(&grid.heights)
        .map(|(&a, &b)| (a - b) as f64)
        .sum();
    grid.heights = heights_next;

    // Semi-Lagrangian sediment advection, then evaporation.
    let mut sediment_next = grid.sediment.clone();
    for z in 0..size {
        for x in 0..size {
            let i = z * size + x;
            let v = grid.velocity[i];
            let sx = (x as f32 - v.x) as i64;
            let sz = (z as f32 - v.y) as i64;
            if grid.in_bounds(sx, sz) {
                sediment_next[i] = grid.sediment[sz as usize * size + sx as usize];
            } else {
                // Upstream point is off the map; keep the cell's own sediment.
                stats.advection_misses += 1;
            }
            grid.water[i] *= 1.0 - evaporation;
        }
    }
    grid.sediment = sediment_next;

    if stats.advection_misses > 0 {
        log::warn!(
            "sediment advection read off-grid for {} cells; kept local sediment",
            stats.advection_misses
        );
    }

    stats.total_water = grid.total_water();
    stats
}

/// Runs `steps` hydraulic steps, returning the stats of the last one.
pub fn hydraulic_erosion<R: Rng + ?Sized>(
    grid: &mut HeightfieldGrid,
    params: &HydraulicParams,
    steps: u32,
    rng: &mut R,
) -> HydraulicStepStats {
    let mut last = HydraulicStepStats::default();
    let mut misses = 0;
    for _ in 0..steps {
        last = hydraulic_step(grid, params, rng);
        misses += last.advection_misses;
    }
    log::debug!(
        "hydraulic erosion: {steps} steps, water {:.3}, {misses} advection misses",
        last.total_water
    );
    last
}
