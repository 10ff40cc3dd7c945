//! Primitive collision shapes and intersection algorithms
//!
//! Provides rays and bounding spheres with their intersection tests.
//! Boxes, planes and triangles live in their own modules.

use crate::foundation::math::{Mat4, Point3, Vec3};
use super::aabb::Aabb;
use super::obb::Obb;
use super::plane::{Frustum, Plane};

/// Rays closer than this to parallel (as the sine of the angle) miss a
/// triangle or plane
const PARALLEL_EPSILON: f32 = 0.000001;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray; distances are measured in units of its length
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and a normalized direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Creates a ray starting at `from` and pointing at `to`
    pub fn from_points(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Maps the ray through an affine matrix
    ///
    /// The ray parameter is preserved: `m * point_at(t) == mapped.point_at(t)`.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self {
            origin: m.transform_point(&Point3::from(self.origin)).coords,
            direction: m.transform_vector(&self.direction),
        }
    }

    /// Distance along the ray to a plane, if it is hit in front of the origin
    pub fn plane_hit(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(&self.direction);
        if denom.abs() <= PARALLEL_EPSILON * plane.normal.norm() * self.direction.norm() {
            return None;
        }
        let t = (plane.offset - plane.normal.dot(&self.origin)) / denom;
        // Written this way so a NaN t (degenerate plane) is rejected
        if t >= 0.0 {
            Some(t)
        } else {
            None
        }
    }

    /// Line segment vs triangle test (Möller-Trumbore)
    ///
    /// Treats the ray as the segment `[origin, point_at(length)]` and returns
    /// the hit point together with its distance along the ray. Both
    /// triangle faces are hit.
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by Möller & Trumbore
    pub fn triangle_hit(&self, length: f32, a: Vec3, b: Vec3, c: Vec3) -> Option<(f32, Vec3)> {
        let edge1 = b - a;
        let edge2 = c - a;

        let h = self.direction.cross(&edge2);
        let det = edge1.dot(&h);

        // Ray parallel to triangle? `det` scales with the edge and direction
        // lengths, so the bound does too.
        let scale = edge1.norm() * edge2.norm() * self.direction.norm();
        if det.abs() <= PARALLEL_EPSILON * scale {
            return None;
        }

        let f = 1.0 / det;
        let s = self.origin - a;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if (0.0..=length).contains(&t) {
            Some((t, self.point_at(t)))
        } else {
            None
        }
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn overlap(&self, other: &Sphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Get the penetration depth if intersecting (0.0 if not intersecting)
    pub fn penetration_depth(&self, other: &Sphere) -> f32 {
        let distance = (self.center - other.center).magnitude();
        let radius_sum = self.radius + other.radius;
        (radius_sum - distance).max(0.0)
    }

    /// Check if this sphere touches an axis-aligned box
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let closest = self.center.sup(&aabb.min()).inf(&aabb.max());
        (closest - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Check if this sphere touches an oriented box
    pub fn intersects_obb(&self, obb: &Obb) -> bool {
        let local = obb.orientation.transpose() * (self.center - obb.center);
        let clamped = local.sup(&(-obb.extent)).inf(&obb.extent);
        (local - clamped).magnitude_squared() <= self.radius * self.radius
    }

    /// Test ray intersection with this sphere
    ///
    /// Returns the distance to the nearest hit in front of the ray origin,
    /// or the exit distance when the origin is inside the sphere.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f32> {
        // Closest approach along the ray, then back off by the half chord
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(&ray.direction);
        let t_closest = -oc.dot(&ray.direction) / a;
        let perpendicular = oc + ray.direction * t_closest;
        let h2 = self.radius * self.radius - perpendicular.norm_squared();
        if h2 < 0.0 {
            return None;
        }

        let half_chord = (h2 / a).sqrt();
        let t1 = t_closest - half_chord;
        let t2 = t_closest + half_chord;

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// Returns the penetration depth if the sphere crosses the plane
    pub fn intersects_plane(&self, plane: &Plane) -> Option<f32> {
        let dist = plane.signed_distance(self.center).abs();
        if dist <= self.radius {
            Some(self.radius - dist)
        } else {
            None
        }
    }

    /// Rejects the sphere only if it is fully behind one frustum plane
    pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
        frustum
            .planes
            .iter()
            .all(|plane| plane.signed_distance(self.center) >= -self.radius)
    }

    /// Tight axis-aligned bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.center, Vec3::repeat(self.radius))
    }
}
