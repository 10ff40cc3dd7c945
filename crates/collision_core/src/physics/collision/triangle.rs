//! Triangles with precomputed data for broad and narrow phase tests

use crate::foundation::math::Vec3;
use super::aabb::Aabb;
use super::plane::Plane;
use super::primitives::Ray;

/// Twice-area (squared) below which a triangle is considered degenerate
const DEGENERATE_EPSILON: f32 = 1e-12;

/// A triangle with its normal, centroid and bounding radius cached
///
/// Construction never fails: a degenerate triangle gets a zero normal and
/// simply never reports ray hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailedTriangle {
    /// Vertices in counter-clockwise order
    pub points: [Vec3; 3],
    /// Unit face normal (zero for degenerate triangles)
    pub normal: Vec3,
    /// Mean of the three vertices
    pub centroid: Vec3,
    /// Largest centroid-to-vertex distance
    pub radius: f32,
}

impl DetailedTriangle {
    /// Build a triangle and its cached data from three points
    pub fn from_points(points: [Vec3; 3]) -> Self {
        let [p0, p1, p2] = points;
        let normal = (p2 - p1)
            .cross(&(p0 - p2))
            .try_normalize(0.0)
            .unwrap_or_else(Vec3::zeros);
        let centroid = (p0 + p1 + p2) / 3.0;
        let radius = points
            .iter()
            .map(|p| (p - centroid).norm())
            .fold(0.0f32, f32::max);

        Self { points, normal, centroid, radius }
    }

    /// Edges `p1 - p0`, `p2 - p1`, `p0 - p2`
    pub fn edges(&self) -> [Vec3; 3] {
        let [p0, p1, p2] = self.points;
        [p1 - p0, p2 - p1, p0 - p2]
    }

    /// Whether the triangle has (almost) no area
    pub fn is_degenerate(&self) -> bool {
        let [e0, e1, _] = self.edges();
        e0.cross(&e1).norm_squared() <= DEGENERATE_EPSILON
    }

    /// Plane containing the triangle
    pub fn plane(&self) -> Plane {
        Plane::from_point_normal(self.points[0], self.normal)
    }

    /// Tight axis-aligned bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::from_triangle(self)
    }

    /// Distance along the ray to the triangle, within `max_length`
    ///
    /// Rejects against the supporting plane first, then runs the
    /// segment test over `[0, max_length]`.
    pub fn ray_distance(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        let t = ray.plane_hit(&self.plane())?;
        if t > max_length {
            return None;
        }
        let [a, b, c] = self.points;
        ray.triangle_hit(max_length, a, b, c).map(|(t, _)| t)
    }
}
