//! Axis-aligned bounding boxes
//!
//! Stored as center + half-extent. All queries are pure: the box and its
//! arguments are never modified.

use crate::foundation::math::{Vec3, Vec3Ext};
use super::plane::{Frustum, Plane};
use super::primitives::Ray;
use super::triangle::DetailedTriangle;

/// Direction components below this are treated as parallel to a slab
const SLAB_EPSILON: f32 = f32::MIN_POSITIVE;

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Center of the box
    pub center: Vec3,
    /// Half-width along each axis (non-negative)
    pub extent: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl Aabb {
    /// Create an AABB from its center and half-extent
    pub fn new(center: Vec3, extent: Vec3) -> Self {
        Self { center, extent }
    }

    /// Create a cube from its center and half-width
    pub fn from_width(center: Vec3, half_width: f32) -> Self {
        Self::new(center, Vec3::repeat(half_width))
    }

    /// Create an AABB from the minimum and maximum corners
    ///
    /// The result always encloses both corners: when rounding the midpoint
    /// leaves `min()` or `max()` short of the inputs, the extent is grown
    /// until it covers them.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let mut extent = (max - min) * 0.5;
        for i in 0..3 {
            let step = min[i].abs().max(max[i].abs()) * f32::EPSILON + f32::MIN_POSITIVE;
            while center[i] - extent[i] > min[i] || center[i] + extent[i] < max[i] {
                extent[i] += step;
            }
        }
        Self { center, extent }
    }

    /// Tight bounds of a triangle
    pub fn from_triangle(triangle: &DetailedTriangle) -> Self {
        let [a, b, c] = triangle.points;
        Self::from_min_max(a.inf(&b).inf(&c), a.sup(&b).sup(&c))
    }

    /// Smallest box enclosing a set of points, `None` when empty
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
        Some(Self::from_min_max(min, max))
    }

    /// Smallest box enclosing both `a` and `b`
    pub fn union(a: &Aabb, b: &Aabb) -> Self {
        Self::from_min_max(a.min().inf(&b.min()), a.max().sup(&b.max()))
    }

    /// Smallest box enclosing `self` and `other`
    pub fn from_aabb(&self, other: &Aabb) -> Self {
        Self::union(self, other)
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.extent
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.extent
    }

    /// Full size along each axis
    pub fn size(&self) -> Vec3 {
        self.extent * 2.0
    }

    /// Longest axis of the box (0 = X, 1 = Y, 2 = Z)
    pub fn longest_axis(&self) -> usize {
        self.extent.longest_axis()
    }

    /// Sum of the three face areas (half the true surface area)
    ///
    /// Only ratios matter for the SAH, so the factor of two is dropped.
    pub fn surface_area(&self) -> f32 {
        let size = self.size();
        size.x * size.y + size.x * size.z + size.y * size.z
    }

    /// The 8 corners, indexed by bits (bit0 = x, bit1 = y, bit2 = z; set = max)
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.min();
        let max = self.max();
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        })
    }

    /// Gap between two boxes, 0 when they touch or overlap
    pub fn closest_distance(&self, other: &Aabb) -> f32 {
        let d = (self.center - other.center).abs();
        let e = self.extent + other.extent;
        (d - e).sup(&Vec3::zeros()).norm()
    }

    /// Slab-method ray test returning the entry distance
    ///
    /// The interval starts at the ray origin, so an origin inside the box
    /// returns 0.
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        let b_min = self.min();
        let b_max = self.max();

        for i in 0..3 {
            let o = ray.origin[i];
            let d = ray.direction[i];
            if d.abs() < SLAB_EPSILON {
                // Parallel to this slab: must already be inside it
                if o < b_min[i] || o > b_max[i] {
                    return None;
                }
            } else {
                let ood = 1.0 / d;
                let mut t1 = (b_min[i] - o) * ood;
                let mut t2 = (b_max[i] - o) * ood;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }
        Some(t_min)
    }

    /// Slab-method ray test returning the first hit point
    pub fn ray_hit(&self, ray: &Ray) -> Option<Vec3> {
        self.ray_distance(ray).map(|t| ray.point_at(t))
    }

    /// Check if this AABB contains a point (boundary inclusive)
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        (0..3).all(|i| point[i] >= min[i] && point[i] <= max[i])
    }

    /// Check if this AABB fully contains another
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains(other.min()) && self.contains(other.max())
    }

    /// Check if this AABB overlaps another (touching counts)
    pub fn aabb_intersect(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let e = self.extent + other.extent;
        d.x <= e.x && d.y <= e.y && d.z <= e.z
    }

    /// Check if the plane passes through the box
    pub fn plane_intersect(&self, plane: &Plane) -> bool {
        let r = self.extent.dot(&plane.normal.abs());
        plane.signed_distance(self.center).abs() <= r
    }

    /// Separating-axis test against a triangle
    ///
    /// Tests the 9 box-axis × triangle-edge axes, the 3 box face normals and
    /// the triangle normal. The triangle is translated into box-local space
    /// on a copy, so the argument is left untouched.
    pub fn triangle_intersect(&self, triangle: &DetailedTriangle) -> bool {
        let t = triangle.points.map(|p| p - self.center);
        let centroid = triangle.centroid - self.center;

        // Bounding sphere reject
        if centroid.norm() > self.extent.norm() + triangle.radius {
            return false;
        }

        let edges = [t[1] - t[0], t[2] - t[1], t[0] - t[2]];

        for i in 0..3 {
            let box_axis = Vec3::axis(i);
            for edge in &edges {
                let axis = box_axis.cross(edge);
                let p0 = t[0].dot(&axis);
                let p1 = t[1].dot(&axis);
                let p2 = t[2].dot(&axis);
                let r = self.extent.dot(&axis.abs());
                if (-p0.max(p1).max(p2)).max(p0.min(p1).min(p2)) > r {
                    return false;
                }
            }
        }

        for i in 0..3 {
            let lo = t[0][i].min(t[1][i]).min(t[2][i]);
            let hi = t[0][i].max(t[1][i]).max(t[2][i]);
            if hi < -self.extent[i] || lo > self.extent[i] {
                return false;
            }
        }

        let normal = edges[0].cross(&edges[1]);
        let local = Aabb::new(Vec3::zeros(), self.extent);
        local.plane_intersect(&Plane::from_point_normal(t[0], normal))
    }

    /// Conservative frustum test
    ///
    /// Returns false only when all 8 corners lie behind a single plane. A box
    /// that surrounds the frustum without touching it can still report true;
    /// the frustum-corners-vs-box rejection is intentionally not applied.
    pub fn in_frustum(&self, frustum: &Frustum) -> bool {
        let corners = self.corners();
        for plane in &frustum.planes {
            let out = corners
                .iter()
                .filter(|corner| plane.signed_distance(**corner) < 0.0)
                .count();
            if out == corners.len() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Mat4Ext};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::zeros(), Vec3::repeat(1.0))
    }

    fn half_box() -> Aabb {
        Aabb::new(Vec3::zeros(), Vec3::repeat(0.5))
    }

    #[test]
    fn test_min_max_round_trip() {
        let min = Vec3::new(-1.0, 2.0, -3.5);
        let max = Vec3::new(4.0, 2.5, 0.0);
        let aabb = Aabb::from_min_max(min, max);
        assert_relative_eq!(aabb.min(), min, epsilon = EPSILON);
        assert_relative_eq!(aabb.max(), max, epsilon = EPSILON);
    }

    #[test]
    fn test_ray_hit_front_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = unit_box().ray_hit(&ray).expect("should hit");
        assert_relative_eq!(hit, Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_ray_hit_all_axes() {
        let dirs = [Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()];
        for dir in dirs {
            let ray = Ray::new(-dir, dir);
            assert!(half_box().ray_hit(&ray).is_some(), "expected hit along {dir:?}");
        }
    }

    #[test]
    fn test_ray_miss() {
        let origin = Vec3::x();
        for dir in [Vec3::y(), -Vec3::y(), Vec3::x(), Vec3::z(), -Vec3::z()] {
            let ray = Ray::new(origin, dir);
            assert!(half_box().ray_hit(&ray).is_none(), "expected miss along {dir:?}");
        }
    }

    #[test]
    fn test_ray_from_inside_hits_at_origin() {
        let ray = Ray::new(Vec3::new(0.2, 0.1, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let hit = unit_box().ray_hit(&ray).expect("should hit");
        assert_relative_eq!(hit, ray.origin, epsilon = EPSILON);
    }

    #[test]
    fn test_ray_through_contained_point_hits() {
        let aabb = Aabb::from_min_max(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 2.0, 4.0));
        let inside = [Vec3::new(2.0, 1.5, 2.0), Vec3::new(1.5, 1.25, 1.5), Vec3::new(2.9, 1.1, 3.9)];
        let origins = [Vec3::new(-5.0, 0.0, 0.0), Vec3::new(10.0, 10.0, -10.0), Vec3::new(2.0, 8.0, 2.0)];
        for p in inside {
            assert!(aabb.contains(p));
            for origin in origins {
                let ray = Ray::from_points(origin, p);
                assert!(aabb.ray_hit(&ray).is_some(), "{origin:?} -> {p:?}");
            }
        }
    }

    #[test]
    fn test_aabb_intersect_gap_and_overlap() {
        let a = unit_box();
        let far = Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::repeat(1.0));
        let near = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::repeat(1.0));
        assert!(!a.aabb_intersect(&far));
        assert!(a.aabb_intersect(&near));
        assert_relative_eq!(a.closest_distance(&far), 1.0, epsilon = EPSILON);
        assert_relative_eq!(a.closest_distance(&near), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_aabb_intersect_symmetric() {
        let boxes = [
            unit_box(),
            Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::repeat(1.0)),
            Aabb::new(Vec3::new(0.5, -3.0, 1.0), Vec3::new(0.2, 2.0, 0.1)),
            Aabb::new(Vec3::new(-4.0, 4.0, 4.0), Vec3::repeat(0.5)),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(a.aabb_intersect(b), b.aabb_intersect(a));
            }
        }
    }

    #[test]
    fn test_union_contains_both() {
        let a = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::repeat(1.0));
        let b = Aabb::new(Vec3::zeros(), Vec3::repeat(2.0));
        let c = Aabb::new(Vec3::new(-5.0, 3.0, 0.5), Vec3::new(0.5, 0.25, 1.0));
        for (x, y) in [(a, b), (a, c), (b, c)] {
            let u = x.from_aabb(&y);
            assert!(u.contains_aabb(&x));
            assert!(u.contains_aabb(&y));
            for corner in x.corners().iter().chain(y.corners().iter()) {
                assert!(u.contains(*corner));
            }
        }
    }

    #[test]
    fn test_from_min_max_encloses_corners() {
        let coords = [0.1f32, 0.7, 1.3, 27.4, 72.6, -3.3, 1e4 + 0.3, -0.2];
        for &lo in &coords {
            for &hi in &coords {
                let min = Vec3::new(lo, lo * 0.5, lo - 0.1);
                let max = Vec3::new(hi, hi * 3.0, hi + 0.7).sup(&min);
                let aabb = Aabb::from_min_max(min, max);
                assert!(aabb.contains(min) && aabb.contains(max), "{min:?} {max:?} -> {aabb:?}");
                assert!(aabb.extent.iter().all(|e| *e >= 0.0));
            }
        }
    }

    #[test]
    fn test_union_of_unaligned_boxes_encloses_both() {
        let boxes: Vec<Aabb> = (0..20)
            .map(|i| {
                let f = i as f32;
                Aabb::new(Vec3::new(f * 3.7 - 30.1, f * 0.3, -f * 1.9), Vec3::repeat(0.4 + f * 0.01))
            })
            .collect();
        let mut acc = boxes[0];
        for b in &boxes[1..] {
            acc = Aabb::union(&acc, b);
        }
        for b in &boxes {
            assert!(acc.contains_aabb(b), "{b:?} escapes {acc:?}");
        }
    }

    #[test]
    fn test_plane_intersect() {
        let ground = Plane::from_point_normal(Vec3::new(0.0, 0.9, 0.0), Vec3::y());
        assert!(unit_box().plane_intersect(&ground));
        let high = Plane::from_point_normal(Vec3::new(0.0, 1.1, 0.0), Vec3::y());
        assert!(!unit_box().plane_intersect(&high));
        let diagonal = Plane::from_point_normal(Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 1.0, 1.0).normalize());
        assert!(unit_box().plane_intersect(&diagonal));
    }

    #[test]
    fn test_triangle_intersect_inside() {
        let tri = DetailedTriangle::from_points([
            Vec3::new(-0.25, 0.0, 0.25),
            Vec3::new(0.0, 0.0, -0.25),
            Vec3::new(0.25, 0.0, 0.25),
        ]);
        assert!(half_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_crossing_large_triangle() {
        // Triangle much larger than the box, slicing through its middle
        let tri = DetailedTriangle::from_points([
            Vec3::new(-10.0, -10.0, 0.0),
            Vec3::new(10.0, -10.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
        ]);
        assert!(half_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_in_corner() {
        let tri = DetailedTriangle::from_points([
            Vec3::new(0.90, 0.95, 0.95),
            Vec3::new(0.95, 0.90, 0.95),
            Vec3::new(0.95, 0.95, 0.90),
        ]);
        assert!(tri.points.iter().all(|p| unit_box().contains(*p)));
        assert!(unit_box().triangle_intersect(&tri));

        // Same corner, pushed just past it along the diagonal
        let outside = DetailedTriangle::from_points(tri.points.map(|p| p + Vec3::repeat(0.2)));
        assert!(!unit_box().triangle_intersect(&outside));
    }

    #[test]
    fn test_triangle_intersect_along_edge() {
        // Small triangle hugging the (+x, +y) edge, half inside the box
        let tri = DetailedTriangle::from_points([
            Vec3::new(0.95, 1.05, 0.5),
            Vec3::new(1.05, 0.95, 0.5),
            Vec3::new(0.95, 0.95, 0.6),
        ]);
        assert!(unit_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_separated_by_face() {
        let tri = DetailedTriangle::from_points([
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(2.5, 1.0, 0.0),
        ]);
        assert!(!half_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_above_top_face() {
        // Large triangle parallel to the box top face, just above it
        let tri = DetailedTriangle::from_points([
            Vec3::new(-3.0, 0.6, -3.0),
            Vec3::new(3.0, 0.6, -3.0),
            Vec3::new(0.0, 0.6, 3.0),
        ]);
        assert!(!half_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_beyond_edge() {
        // Slab x + y = 1.2 runs past the (+x, +y) edge; no face axis separates it
        let tri = DetailedTriangle::from_points([
            Vec3::new(1.2, 0.0, -1.0),
            Vec3::new(0.0, 1.2, -1.0),
            Vec3::new(0.0, 1.2, 1.0),
        ]);
        assert!(!half_box().triangle_intersect(&tri));
    }

    #[test]
    fn test_triangle_intersect_does_not_modify_triangle() {
        let tri = DetailedTriangle::from_points([
            Vec3::new(4.0, 4.0, 4.0),
            Vec3::new(5.0, 4.0, 4.0),
            Vec3::new(4.0, 5.0, 4.0),
        ]);
        let before = tri;
        let aabb = Aabb::new(Vec3::new(4.5, 4.5, 4.0), Vec3::repeat(1.0));
        assert!(aabb.triangle_intersect(&tri));
        assert!(aabb.triangle_intersect(&tri));
        assert_eq!(tri, before);
    }

    #[test]
    fn test_from_triangle() {
        let tri = DetailedTriangle::from_points([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 3.0, -1.0),
        ]);
        let aabb = Aabb::from_triangle(&tri);
        assert_relative_eq!(aabb.min(), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(aabb.max(), Vec3::new(2.0, 3.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_in_frustum() {
        let frustum = Frustum::from_matrix(&Mat4::identity());

        let coincident = Aabb::from_min_max(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(coincident.in_frustum(&frustum));

        let inside = Aabb::new(Vec3::new(0.0, 0.0, 0.5), Vec3::repeat(0.1));
        assert!(inside.in_frustum(&frustum));

        let straddling = Aabb::new(Vec3::new(1.0, 0.0, 0.5), Vec3::repeat(0.5));
        assert!(straddling.in_frustum(&frustum));

        let beyond_right = Aabb::new(Vec3::new(3.0, 0.0, 0.5), Vec3::repeat(0.5));
        assert!(!beyond_right.in_frustum(&frustum));

        let behind = Aabb::new(Vec3::new(0.0, 0.0, -2.0), Vec3::repeat(0.5));
        assert!(!behind.in_frustum(&frustum));
    }

    #[test]
    fn test_in_frustum_is_conservative_near_far_corner() {
        // Outside the far/right edge but not fully behind either plane
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_matrix(&proj);
        let corner = Aabb::new(Vec3::new(105.5, 0.0, -100.0), Vec3::new(4.5, 1.0, 5.0));
        assert!(corner.corners().iter().all(|c| !frustum.contains_point(*c)));
        assert!(corner.in_frustum(&frustum));
    }

    #[test]
    fn test_corners_and_surface_area() {
        let aabb = Aabb::from_min_max(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        let corners = aabb.corners();
        assert_relative_eq!(corners[0], Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
        assert_relative_eq!(corners[1], Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(aabb.surface_area(), 2.0 + 3.0 + 6.0, epsilon = EPSILON);
        assert_eq!(aabb.longest_axis(), 2);
    }
}
