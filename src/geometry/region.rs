//! Inclusive axis-aligned grid rectangles.

use serde::{Deserialize, Serialize};

/// Inclusive rectangle `[x_min, x_max] x [z_min, z_max]` in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x_min: i32,
    pub x_max: i32,
    pub z_min: i32,
    pub z_max: i32,
}

impl Region {
    pub fn new(x_min: i32, x_max: i32, z_min: i32, z_max: i32) -> Self {
        Self { x_min, x_max, z_min, z_max }
    }

    /// The whole map of side `size`.
    pub fn full(size: usize) -> Self {
        let last = size as i32 - 1;
        Self::new(0, last, 0, last)
    }

    /// Square window of half-extent `radius` around a point.
    pub fn around(x: i32, z: i32, radius: i32) -> Self {
        Self::new(x - radius, x + radius, z - radius, z + radius)
    }

    /// Clips the rectangle to a map of side `size`.
    pub fn clamp_to(self, size: usize) -> Self {
        let last = size as i32 - 1;
        Self::new(
            self.x_min.clamp(0, last),
            self.x_max.clamp(0, last),
            self.z_min.clamp(0, last),
            self.z_max.clamp(0, last),
        )
    }

    /// True iff the point lies strictly inside the rectangle shrunk by `offset`.
    pub fn contains_strict(&self, x: i32, z: i32, offset: i32) -> bool {
        x > self.x_min + offset
            && x < self.x_max - offset
            && z > self.z_min + offset
            && z < self.z_max - offset
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.z_min..=self.z_max).contains(&z)
    }

    pub fn corners(&self) -> [(i32, i32); 4] {
        [
            (self.x_min, self.z_min),
            (self.x_max, self.z_min),
            (self.x_max, self.z_max),
            (self.x_min, self.z_max),
        ]
    }

    /// Euclidean distance from a point to the closest of the four corners.
    pub fn corner_distance(&self, x: i32, z: i32) -> f32 {
        self.corners()
            .iter()
            .map(|&(cx, cz)| (((x - cx) as f32).powi(2) + ((z - cz) as f32).powi(2)).sqrt())
            .fold(f32::INFINITY, f32::min)
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min + 1
    }

    pub fn depth(&self) -> i32 {
        self.z_max - self.z_min + 1
    }

    /// Iterates every cell in the rectangle, x-major.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.x_min..=self.x_max).flat_map(move |x| (self.z_min..=self.z_max).map(move |z| (x, z)))
    }
}
