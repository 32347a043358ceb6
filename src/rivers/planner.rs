//! Flood-fill river path planning.
//!
//! The search keeps every visited cell in a flat arena of [`FloodNode`]s;
//! each node points at the node that discovered it, so the arena doubles as
//! the search tree used for path reconstruction.

use std::collections::HashMap;

use thiserror::Error;

use super::{FloodNode, FloodParams, RiverInfo, Vertex};
use crate::geometry::{Region, Side, Sides, MOORE};
use crate::terrain::HeightfieldGrid;

/// Reasons a flood search gives up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("start cell ({0}, {1}) is outside the search region")]
    StartOutOfBounds(i32, i32),
    #[error("flood threshold {threshold:.3} rose above the highest point {max:.3}")]
    ThresholdExceeded { threshold: f32, max: f32 },
    #[error("flood search exceeded {0} expansions")]
    IterationCap(usize),
    #[error("no border reachable from ({0}, {1})")]
    NoPath(i32, i32),
}

struct FloodSearch<'a> {
    grid: &'a HeightfieldGrid,
    params: &'a FloodParams,
    region: Region,
    nodes: Vec<FloodNode>,
    seen: HashMap<(i32, i32), usize>,
    expansions: usize,
    cap: usize,
}

impl<'a> FloodSearch<'a> {
    fn new(grid: &'a HeightfieldGrid, params: &'a FloodParams, region: Region, start: Vertex) -> Self {
        let cap = grid.cell_count();
        // The lattice holds at most one node per `grid_step` cells on each axis.
        let lattice = (grid.size() / params.grid_step.max(1) as usize + 1).pow(2);
        let mut nodes = Vec::with_capacity(lattice.min(cap));
        nodes.push(FloodNode::root(start));
        let mut seen = HashMap::with_capacity(lattice.min(cap));
        seen.insert(start.coords(), 0);
        Self { grid, params, region, nodes, seen, expansions: 0, cap }
    }

    /// Border a vertex sits next to, ignoring the corner zones.
    fn near_side(&self, v: &Vertex) -> Option<Side> {
        let r = &self.region;
        let off = self.params.border_offset;
        let close = |value: i32, border: i32| value > border - off && value < border + off;
        let x_clear = !close(v.x, r.x_min) && !close(v.x, r.x_max);
        let z_clear = !close(v.z, r.z_min) && !close(v.z, r.z_max);

        if close(v.x, r.x_min) && z_clear {
            Some(Side::Left)
        } else if close(v.x, r.x_max) && z_clear {
            Some(Side::Right)
        } else if close(v.z, r.z_min) && x_clear {
            Some(Side::Bottom)
        } else if close(v.z, r.z_max) && x_clear {
            Some(Side::Top)
        } else {
            None
        }
    }

    /// One sweep over the unprocessed frontier at the given water level.
    ///
    /// Stops at the first node that lies near a side not in `excluded`.
    fn sweep(&mut self, threshold: f32, excluded: Sides) -> Result<Option<(usize, Side)>, PlanError> {
        let step = self.params.grid_step;
        let mut i = 0;
        while i < self.nodes.len() {
            if self.nodes[i].processed {
                i += 1;
                continue;
            }
            let v = self.nodes[i].vertex;
            if let Some(side) = self.near_side(&v) {
                if !excluded.contains(side) {
                    return Ok(Some((i, side)));
                }
            }

            self.expansions += 1;
            if self.expansions > self.cap {
                return Err(PlanError::IterationCap(self.cap));
            }

            let found = self.grid.neighbors8(v, step, threshold, &self.region, self.params.corner_offset);
            for n in found {
                if !self.seen.contains_key(&n.coords()) {
                    self.seen.insert(n.coords(), self.nodes.len());
                    self.nodes.push(FloodNode::child(n, i));
                }
            }

            // Nothing left to discover from here once every reachable direction is known.
            let processed = MOORE.iter().all(|&(dx, dz)| {
                let (nx, nz) = (v.x + dx * step, v.z + dz * step);
                !self.grid.check_bounds(nx, nz, 0, Some(&self.region)) || self.seen.contains_key(&(nx, nz))
            });
            self.nodes[i].processed = processed;
            i += 1;
        }
        Ok(None)
    }

    /// Vertices from the root to `index`, inclusive.
    fn branch(&self, index: usize) -> Vec<Vertex> {
        let mut out = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            out.push(self.nodes[i].vertex);
            cursor = self.nodes[i].parent;
        }
        out.reverse();
        out
    }

    /// Projects a vertex onto the border of `side`.
    fn project(&self, v: &Vertex, side: Side) -> Vertex {
        let r = &self.region;
        let (x, z) = match side {
            Side::Left => (r.x_min, v.z),
            Side::Right => (r.x_max, v.z),
            Side::Bottom => (v.x, r.z_min),
            Side::Top => (v.x, r.z_max),
        };
        self.grid.vertex(x, z)
    }
}

fn flood_step(start: &Vertex, params: &FloodParams) -> f32 {
    start.height.abs().clamp(params.step_min, params.step_max)
}

fn push_unique(path: &mut Vec<Vertex>, v: Vertex) {
    if path.last() != Some(&v) {
        path.push(v);
    }
}

/// Floods outward from `start` until the frontier reaches a border of
/// `region` (the whole map when `None`) that is not in `excluded`.
///
/// The returned path runs from `start` to a point projected exactly onto the
/// reached border.
pub fn flood_from_point(
    grid: &HeightfieldGrid,
    start: Vertex,
    excluded: Sides,
    region: Option<Region>,
    params: &FloodParams,
) -> Result<RiverInfo, PlanError> {
    let region = region.unwrap_or_else(|| grid.full_region()).clamp_to(grid.size());
    if !region.contains(start.x, start.z) {
        return Err(PlanError::StartOutOfBounds(start.x, start.z));
    }
    let start = grid.vertex(start.x, start.z);
    let step = flood_step(&start, params);
    let max = grid.max_height();
    let mut threshold = start.height + step;
    let mut search = FloodSearch::new(grid, params, region, start);

    loop {
        let hit = search.sweep(threshold, excluded).inspect_err(|e| {
            log::warn!("flood from ({}, {}) gave up: {e}", start.x, start.z);
        })?;
        if let Some((index, side)) = hit {
            let mut path = search.branch(index);
            let mouth = search.project(&path[path.len() - 1], side);
            push_unique(&mut path, mouth);
            log::debug!(
                "flood from ({}, {}) reached {side} after {} nodes, threshold {threshold:.3}",
                start.x,
                start.z,
                search.nodes.len()
            );
            return Ok(RiverInfo::new(path, Sides::NONE.with(side)));
        }
        threshold += step;
        if threshold > max {
            log::warn!(
                "flood from ({}, {}) found no border below height {max:.3}",
                start.x,
                start.z
            );
            return Err(PlanError::ThresholdExceeded { threshold, max });
        }
    }
}

/// Floods from the centre of the lowest region of the map.
pub fn flood_from_lowest_point(grid: &HeightfieldGrid, params: &FloodParams) -> Result<RiverInfo, PlanError> {
    let start = grid.lowest_region_center(params.region_radius, params.region_offset);
    flood_from_point(grid, start, Sides::NONE, None, params)
}

/// Floods from `start` until the frontier touches two opposite borders and
/// returns a path crossing the map between them, through `start`.
pub fn flood_across(grid: &HeightfieldGrid, start: Vertex, params: &FloodParams) -> Result<RiverInfo, PlanError> {
    let region = grid.full_region();
    if !region.contains(start.x, start.z) {
        return Err(PlanError::StartOutOfBounds(start.x, start.z));
    }
    let start = grid.vertex(start.x, start.z);
    let step = flood_step(&start, params);
    let max = grid.max_height();
    let mut threshold = start.height + step;
    let mut search = FloodSearch::new(grid, params, region, start);
    let mut reached = Sides::NONE;
    let mut first_hit: HashMap<Side, usize> = HashMap::new();

    while !reached.spans_map() {
        match search.sweep(threshold, reached)? {
            Some((index, side)) => {
                reached.insert(side);
                first_hit.insert(side, index);
            }
            None => {
                threshold += step;
                if threshold > max {
                    log::warn!("flood across from ({}, {}) stalled at {reached:?}", start.x, start.z);
                    return Err(PlanError::ThresholdExceeded { threshold, max });
                }
            }
        }
    }

    let (a, b) = if reached.contains(Side::Left) && reached.contains(Side::Right) {
        (Side::Left, Side::Right)
    } else {
        (Side::Bottom, Side::Top)
    };
    let (Some(&ia), Some(&ib)) = (first_hit.get(&a), first_hit.get(&b)) else {
        return Err(PlanError::NoPath(start.x, start.z));
    };

    let branch_a = search.branch(ia);
    let branch_b = search.branch(ib);
    // Drop the shared trunk, keeping the last common vertex once.
    let shared = branch_a.iter().zip(&branch_b).take_while(|(p, q)| p == q).count();
    if shared == 0 {
        return Err(PlanError::NoPath(start.x, start.z));
    }

    let mut path = Vec::with_capacity(branch_a.len() + branch_b.len() + 2);
    path.push(search.project(&branch_a[branch_a.len() - 1], a));
    for v in branch_a[shared - 1..].iter().rev() {
        push_unique(&mut path, *v);
    }
    for v in &branch_b[shared..] {
        push_unique(&mut path, *v);
    }
    push_unique(&mut path, search.project(&branch_b[branch_b.len() - 1], b));

    log::debug!("flood across reached {a} and {b}, {} vertices", path.len());
    let mut info = RiverInfo::new(path, Sides::NONE.with(a).with(b));
    info.orient();
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::GridConfig;

    /// High plateau with a single channel from (60, 40) down to the left border.
    fn channel_grid() -> HeightfieldGrid {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(32, 3), 1.0);
        for x in 0..=60 {
            grid.set_height(x, 40, 0.1 + (60 - x) as f32 * 0.001);
        }
        grid
    }

    #[test]
    fn test_flood_follows_channel_to_border() {
        let grid = channel_grid();
        let start = grid.vertex(60, 40);
        let river = flood_from_point(&grid, start, Sides::NONE, None, &FloodParams::default()).unwrap();

        assert!(river.reached.contains(Side::Left));
        let path = &river.path;
        assert_eq!(path[0].coords(), (60, 40));
        assert_eq!(path.last().unwrap().coords(), (0, 40));
        let step = 0.1;
        for pair in path.windows(2) {
            assert!(pair[1].height + step >= pair[0].height);
        }
    }

    #[test]
    fn test_flood_threshold_exceeded() {
        let mut grid = HeightfieldGrid::flat(GridConfig::new(32, 3), 1.0);
        grid.set_height(50, 50, 0.0);
        let result = flood_from_point(&grid, grid.vertex(50, 50), Sides::NONE, None, &FloodParams::default());
        assert!(matches!(result, Err(PlanError::ThresholdExceeded { .. })));
    }

    #[test]
    fn test_excluded_side_is_skipped() {
        let mut grid = channel_grid();
        // Second channel to the right border.
        for x in 60..99 {
            grid.set_height(x, 40, 0.1 + (x - 60) as f32 * 0.002);
        }
        let start = grid.vertex(60, 40);
        let params = FloodParams::default();
        let first = flood_from_point(&grid, start, Sides::NONE, None, &params).unwrap();
        let first_side = first.reached.iter().next().unwrap();
        let second = flood_from_point(&grid, start, first.reached, None, &params).unwrap();
        let second_side = second.reached.iter().next().unwrap();

        assert_ne!(first_side, second_side);
        assert_eq!(first_side, second_side.opposite());
        for river in [&first, &second] {
            let mouth = river.path.last().unwrap();
            assert!(mouth.x == 0 || mouth.x == 98);
        }
    }

    #[test]
    fn test_flood_stops_at_expansion_cap() {
        // A 3x3 pit in a plateau, flooded one cell at a time with a tiny
        // threshold step: the pit rim is re-expanded on every sweep.
        let mut grid = HeightfieldGrid::flat(GridConfig::new(8, 2), 1.0);
        for x in 8..=10 {
            for z in 8..=10 {
                grid.set_height(x, z, 0.0);
            }
        }
        let params = FloodParams {
            grid_step: 1,
            border_offset: 1,
            corner_offset: 0,
            step_min: 0.001,
            step_max: 0.001,
            ..Default::default()
        };
        let result = flood_from_point(&grid, grid.vertex(9, 9), Sides::NONE, None, &params);
        assert_eq!(result.unwrap_err(), PlanError::IterationCap(grid.cell_count()));
    }

    #[test]
    fn test_start_outside_region() {
        let grid = channel_grid();
        let result = flood_from_point(&grid, Vertex::new(500, 5, 0.0), Sides::NONE, None, &FloodParams::default());
        assert_eq!(result.unwrap_err(), PlanError::StartOutOfBounds(500, 5));
    }

    #[test]
    fn test_flood_across_spans_map() {
        let mut grid = channel_grid();
        for x in 60..99 {
            grid.set_height(x, 40, 0.1 + (x - 60) as f32 * 0.002);
        }
        let river = flood_across(&grid, grid.vertex(60, 40), &FloodParams::default()).unwrap();
        assert!(river.reached.spans_map());
        let first = river.path.first().unwrap();
        let last = river.path.last().unwrap();
        let xs = [first.x, last.x];
        assert!(xs.contains(&0) && xs.contains(&98));
        assert!(river.path.iter().any(|v| v.coords() == (60, 40)));
    }
}
