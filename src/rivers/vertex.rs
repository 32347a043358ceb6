//! Grid vertices and flood-search nodes.

use std::hash::{Hash, Hasher};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Integer grid coordinate with a cached height.
///
/// Equality and hashing look at `(x, z)` only, so two samples of the same
/// cell taken at different times deduplicate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i32,
    pub z: i32,
    pub height: f32,
}

impl Vertex {
    pub fn new(x: i32, z: i32, height: f32) -> Self {
        Self { x, z, height }
    }

    pub fn coords(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32)
    }

    pub fn distance(&self, other: &Vertex) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.z == other.z
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.z.hash(state);
    }
}

/// A visited cell in the flood search.
///
/// `parent` indexes the search arena; the root has none.
#[derive(Debug, Clone, Copy)]
pub struct FloodNode {
    pub vertex: Vertex,
    pub parent: Option<usize>,
    pub processed: bool,
}

impl FloodNode {
    pub fn root(vertex: Vertex) -> Self {
        Self { vertex, parent: None, processed: false }
    }

    pub fn child(vertex: Vertex, parent: usize) -> Self {
        Self { vertex, parent: Some(parent), processed: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vertex_identity_ignores_height() {
        let a = Vertex::new(3, 4, 0.25);
        let b = Vertex::new(3, 4, 0.75);
        assert_eq!(a, b);

        let set: HashSet<Vertex> = [a, b, Vertex::new(4, 3, 0.25)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_vertex_distance() {
        let a = Vertex::new(0, 0, 0.0);
        let b = Vertex::new(3, 4, 9.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
