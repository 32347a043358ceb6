//! Map border sides.

use serde::{Deserialize, Serialize};

/// One of the four borders of the square map.
///
/// `Top` is the `z = size - 1` border and `Right` the `x = size - 1` border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Returns the side across the map.
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Unit step `(dx, dz)` pointing out of the map through this side.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::Top => (0, 1),
            Side::Right => (1, 0),
            Side::Bottom => (0, -1),
            Side::Left => (-1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Side::Top => 1,
            Side::Right => 2,
            Side::Bottom => 4,
            Side::Left => 8,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of sides, used for "already reached" / "excluded" bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sides(u8);

impl Sides {
    pub const NONE: Sides = Sides(0);

    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    pub fn remove(&mut self, side: Side) {
        self.0 &= !side.bit();
    }

    pub fn with(mut self, side: Side) -> Self {
        self.insert(side);
        self
    }

    pub fn union(self, other: Sides) -> Sides {
        Sides(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when both sides of an opposite pair are present.
    pub fn spans_map(self) -> bool {
        (self.contains(Side::Top) && self.contains(Side::Bottom))
            || (self.contains(Side::Left) && self.contains(Side::Right))
    }

    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<Side> for Sides {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        let mut sides = Sides::NONE;
        for side in iter {
            sides.insert(side);
        }
        sides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
            assert_ne!(side.opposite(), side);
        }
    }

    #[test]
    fn test_sides_set_ops() {
        let mut sides = Sides::NONE.with(Side::Left);
        assert!(sides.contains(Side::Left));
        assert!(!sides.spans_map());
        sides.insert(Side::Right);
        assert!(sides.spans_map());
        sides.remove(Side::Left);
        assert_eq!(sides.iter().collect::<Vec<_>>(), vec![Side::Right]);
    }
}
