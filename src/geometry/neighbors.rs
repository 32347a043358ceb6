//! Neighbour offsets on a square grid.
//!
//! Offsets are `(dx, dz)` pairs. The ordering of each table matters: callers
//! that break ties by "first found" rely on it.

/// The four pipe edges of a cell, in outflow-vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Down,
    Up,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Down, Edge::Up];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Edge::Left => (-1, 0),
            Edge::Right => (1, 0),
            Edge::Down => (0, -1),
            Edge::Up => (0, 1),
        }
    }

    /// The edge of the neighbouring cell that faces this one.
    pub fn facing(self) -> Edge {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Down => Edge::Up,
            Edge::Up => Edge::Down,
        }
    }

    /// Component index in a `Vec4` outflow (`x = left, y = right, z = down, w = up`).
    pub fn index(self) -> usize {
        match self {
            Edge::Left => 0,
            Edge::Right => 1,
            Edge::Down => 2,
            Edge::Up => 3,
        }
    }
}

/// Moore neighbourhood: left, up, right, down, then the diagonals
/// left-up, right-up, right-down, left-down.
pub const MOORE: [(i32, i32); 8] = [
    (-1, 0),
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 1),
    (1, 1),
    (1, -1),
    (-1, -1),
];

/// Moore neighbourhood visiting diagonals before axial neighbours.
pub const MOORE_DIAGONALS_FIRST: [(i32, i32); 8] = [
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
    (0, -1),
    (-1, 0),
    (1, 0),
    (0, 1),
];

/// In-bounds Moore neighbours of `(x, z)` on a `size x size` grid.
pub fn neighbor_8(size: usize, x: usize, z: usize) -> impl Iterator<Item = (usize, usize)> {
    debug_assert!(x < size && z < size);
    MOORE.iter().filter_map(move |&(dx, dz)| offset_in(size, x, z, dx, dz))
}

/// Applies an offset, returning `None` when it leaves the grid.
pub fn offset_in(size: usize, x: usize, z: usize, dx: i32, dz: i32) -> Option<(usize, usize)> {
    let nx = x as i64 + dx as i64;
    let nz = z as i64 + dz as i64;
    if (0..size as i64).contains(&nx) && (0..size as i64).contains(&nz) {
        Some((nx as usize, nz as usize))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_8_counts() {
        assert_eq!(neighbor_8(5, 2, 2).count(), 8);
        assert_eq!(neighbor_8(5, 0, 2).count(), 5);
        assert_eq!(neighbor_8(5, 0, 0).count(), 3);
        assert_eq!(neighbor_8(5, 4, 4).count(), 3);
    }

    #[test]
    fn test_edge_facing_roundtrip() {
        for edge in Edge::ALL {
            let (dx, dz) = edge.offset();
            let (fx, fz) = edge.facing().offset();
            assert_eq!((dx + fx, dz + fz), (0, 0));
            assert_eq!(edge.facing().facing(), edge);
        }
    }

    #[test]
    fn test_tables_cover_same_offsets() {
        let mut a = MOORE.to_vec();
        let mut b = MOORE_DIAGONALS_FIRST.to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
