//! Planes and view frustums
//!
//! A [`Plane`] is the set of points `x` with `normal · x = offset`. The
//! positive half-space (`signed_distance >= 0`) is "in front" of the plane,
//! which is also the inside of every [`Frustum`] plane.

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// A plane described by a normal and a signed distance constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Plane normal (not necessarily unit length)
    pub normal: Vec3,
    /// Plane constant: `normal · x` for any point `x` on the plane
    pub offset: f32,
}

impl Plane {
    /// Creates a plane from a normal and offset as given
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Creates a plane through `point` with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            offset: normal.dot(&point),
        }
    }

    /// Creates a plane through three counter-clockwise points
    ///
    /// The normal is unit length and follows the right-hand rule.
    pub fn from_ccw(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(&(c - a)).normalize();
        Self {
            normal,
            offset: normal.dot(&a),
        }
    }

    /// Signed distance scaled by the normal length (exact for unit normals)
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) - self.offset
    }

    /// Closest point on the plane; valid for non-unit normals
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let t = self.signed_distance(point) / self.normal.dot(&self.normal);
        point - self.normal * t
    }

    /// Signed distance from the plane; valid for non-unit normals
    pub fn distance(&self, point: Vec3) -> f32 {
        self.signed_distance(point) / self.normal.dot(&self.normal)
    }

    /// Returns a copy with a unit-length normal
    pub fn normalized(&self) -> Self {
        let len = self.normal.norm();
        Self {
            normal: self.normal / len,
            offset: self.offset / len,
        }
    }

    /// As a `(nx, ny, nz, -offset)` vector so that `v · (p, 1)` is the signed distance
    pub fn as_vec4(&self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, -self.offset)
    }

    /// Tests whether `p` lies on the opposite side of plane `abc` from `d`
    ///
    /// Compares the signed volumes of the tetrahedra `(p, a, b, c)` and
    /// `(d, a, b, c)`.
    pub fn point_outside_of_plane(p: Vec3, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> bool {
        let normal = (b - a).cross(&(c - a));
        let sign_p = (p - a).dot(&normal);
        let sign_d = (d - a).dot(&normal);
        sign_p * sign_d < 0.0
    }
}

/// View frustum for visibility culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far), normals facing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six inward-facing planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for clip space with `x, y ∈ [-w, w]` and
    /// depth `z ∈ [0, w]`. Planes are normalized.
    pub fn from_matrix(vp: &Mat4) -> Self {
        let row = |i: usize| Vec4::new(vp[(i, 0)], vp[(i, 1)], vp[(i, 2)], vp[(i, 3)]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let to_plane = |v: Vec4| Plane::new(Vec3::new(v.x, v.y, v.z), -v.w).normalized();

        Self {
            planes: [
                to_plane(r3 + r0),
                to_plane(r3 - r0),
                to_plane(r3 + r1),
                to_plane(r3 - r1),
                to_plane(r2),
                to_plane(r3 - r2),
            ],
        }
    }

    /// Check whether a point is inside (or on) every plane
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(point) >= 0.0)
    }
}
