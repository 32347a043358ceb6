//! Line and quad helpers for river carving.

use glam::Vec2;

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
///
/// Returns `None` for coincident endpoints.
pub fn distance_to_line(p: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
    let la = a.y - b.y;
    let lb = -(a.x - b.x);
    let lc = -la * a.x - lb * a.y;
    let norm = (la * la + lb * lb).sqrt();
    if norm <= f32::EPSILON {
        return None;
    }
    Some((la * p.x + lb * p.y + lc).abs() / norm)
}

/// The quad obtained by sweeping segment `a-b` by `half_width` on both sides.
///
/// Endpoints are ordered by `x` first so the winding is stable. Returns `None`
/// for coincident endpoints.
pub fn segment_quad(a: Vec2, b: Vec2, half_width: f32) -> Option<[Vec2; 4]> {
    let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
    let along = right - left;
    if along.length_squared() <= f32::EPSILON {
        return None;
    }
    let normal = Vec2::new(along.y, -along.x).normalize() * half_width;
    Some([left + normal, left - normal, right - normal, right + normal])
}

/// Point-in-convex-polygon test by cross-product sign consistency.
///
/// Points on an edge count as inside.
pub fn point_in_quad(p: Vec2, quad: &[Vec2; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..quad.len() {
        let a = quad[i];
        let b = quad[(i + 1) % quad.len()];
        let cross = (b - a).perp_dot(p - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
