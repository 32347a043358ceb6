//! River paths and the bookkeeping that keeps them valid while the map scrolls.

use std::collections::HashSet;

use super::Vertex;
use crate::geometry::{Side, Sides};

/// A planned river: an ordered vertex path plus the borders it reaches.
#[derive(Debug, Clone, Default)]
pub struct RiverInfo {
    pub path: Vec<Vertex>,
    pub reached: Sides,
    pub top: Option<Vertex>,
    pub right: Option<Vertex>,
    pub bottom: Option<Vertex>,
    pub left: Option<Vertex>,
}

/// Lower means closer to the border of `side`.
fn border_score(v: &Vertex, side: Side) -> i32 {
    match side {
        Side::Left => v.x,
        Side::Right => -v.x,
        Side::Bottom => v.z,
        Side::Top => -v.z,
    }
}

impl RiverInfo {
    pub fn new(path: Vec<Vertex>, reached: Sides) -> Self {
        let mut info = Self { path, reached, ..Default::default() };
        info.refresh_endpoints();
        info
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// First vertex of the path.
    pub fn source(&self) -> Option<&Vertex> {
        self.path.first()
    }

    /// Last vertex of the path.
    pub fn mouth(&self) -> Option<&Vertex> {
        self.path.last()
    }

    /// Polyline length in cells.
    pub fn length(&self) -> f32 {
        self.path.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    pub fn endpoint(&self, side: Side) -> Option<Vertex> {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    fn endpoint_mut(&mut self, side: Side) -> &mut Option<Vertex> {
        match side {
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
        }
    }

    /// Recomputes the per-side endpoint vertices from the path ends.
    pub fn refresh_endpoints(&mut self) {
        let ends = match (self.path.first(), self.path.last()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        };
        for side in Side::ALL {
            let value = match ends {
                Some((a, b)) if self.reached.contains(side) => {
                    if border_score(&b, side) <= border_score(&a, side) {
                        Some(b)
                    } else {
                        Some(a)
                    }
                }
                _ => None,
            };
            *self.endpoint_mut(side) = value;
        }
    }

    /// Orders the path canonically: a river crossing the map runs towards
    /// increasing coordinates, a river reaching one border runs towards it.
    pub fn orient(&mut self) {
        let (Some(first), Some(last)) = (self.path.first().copied(), self.path.last().copied()) else {
            return;
        };
        let reverse = if self.reached.contains(Side::Left) && self.reached.contains(Side::Right) {
            first.x > last.x
        } else if self.reached.contains(Side::Bottom) && self.reached.contains(Side::Top) {
            first.z > last.z
        } else if let Some(side) = self.reached.iter().next() {
            border_score(&first, side) < border_score(&last, side)
        } else {
            false
        };
        if reverse {
            self.path.reverse();
        }
        self.refresh_endpoints();
    }

    /// Drops vertices outside a `size x size` map. Returns how many were removed.
    pub fn cutoff(&mut self, size: usize) -> usize {
        let before = self.path.len();
        let limit = size as i32;
        self.path.retain(|v| v.x >= 0 && v.z >= 0 && v.x < limit && v.z < limit);
        let removed = before - self.path.len();
        if removed > 0 {
            self.refresh_endpoints();
        }
        removed
    }

    /// Follows a map scroll of `amount` cells towards `side`: coordinates move
    /// the opposite way and vertices that leave the map are cut off.
    pub fn shift(&mut self, side: Side, amount: i32, size: usize) -> usize {
        let (dx, dz) = side.offset();
        for v in &mut self.path {
            v.x -= dx * amount;
            v.z -= dz * amount;
        }
        self.cutoff(size)
    }

    /// Appends another river, skipping its leading vertices that this path
    /// already contains.
    pub fn extend(&mut self, other: &RiverInfo) {
        let seen: HashSet<Vertex> = self.path.iter().copied().collect();
        let fresh = other.path.iter().skip_while(|v| seen.contains(v)).copied();
        self.path.extend(fresh);
        self.reached = self.reached.union(other.reached);
        self.refresh_endpoints();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(i32, i32)]) -> Vec<Vertex> {
        points.iter().map(|&(x, z)| Vertex::new(x, z, 0.0)).collect()
    }

    #[test]
    fn test_endpoints_follow_reached_sides() {
        let info = RiverInfo::new(line(&[(50, 50), (30, 50), (0, 50)]), Sides::NONE.with(Side::Left));
        assert_eq!(info.left.map(|v| v.coords()), Some((0, 50)));
        assert!(info.right.is_none());
        assert!((info.length() - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_orient_single_border_runs_to_border() {
        let mut info = RiverInfo::new(line(&[(0, 50), (30, 50), (50, 50)]), Sides::NONE.with(Side::Left));
        info.orient();
        assert_eq!(info.source().unwrap().coords(), (50, 50));
        assert_eq!(info.mouth().unwrap().coords(), (0, 50));
    }

    #[test]
    fn test_orient_crossing_runs_bottom_to_top() {
        let sides = Sides::NONE.with(Side::Top).with(Side::Bottom);
        let mut info = RiverInfo::new(line(&[(10, 98), (12, 50), (10, 0)]), sides);
        info.orient();
        assert_eq!(info.path[0].coords(), (10, 0));
        assert_eq!(info.bottom.unwrap().coords(), (10, 0));
        assert_eq!(info.top.unwrap().coords(), (10, 98));
    }

    #[test]
    fn test_shift_moves_and_cuts() {
        let mut info = RiverInfo::new(line(&[(10, 5), (10, 30), (10, 60)]), Sides::NONE.with(Side::Top));
        let removed = info.shift(Side::Top, 20, 99);
        assert_eq!(removed, 1);
        assert_eq!(info.path.iter().map(|v| v.coords()).collect::<Vec<_>>(), vec![(10, 10), (10, 40)]);
    }

    #[test]
    fn test_extend_deduplicates_overlap() {
        let mut a = RiverInfo::new(line(&[(0, 0), (5, 0), (10, 0)]), Sides::NONE.with(Side::Left));
        let b = RiverInfo::new(line(&[(5, 0), (10, 0), (15, 0), (20, 0)]), Sides::NONE.with(Side::Right));
        a.extend(&b);
        assert_eq!(a.len(), 5);
        assert!(a.reached.spans_map());
        assert_eq!(a.right.unwrap().coords(), (20, 0));
    }
}
