//! Oriented bounding boxes

use crate::foundation::math::{Mat3, Transform, Vec3};
use super::aabb::Aabb;
use super::primitives::Ray;

/// Slack added to projected intervals before declaring separation
const INTERVAL_EPSILON: f32 = 1e-6;

/// Cross products shorter than this come from near-parallel edges and are skipped
const AXIS_EPSILON: f32 = 1e-6;

/// Box with an arbitrary rotation
///
/// The columns of `orientation` are the box's local X, Y and Z axes in
/// world space and are assumed orthonormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// World-space center
    pub center: Vec3,
    /// Half-width along each local axis
    pub extent: Vec3,
    /// Local-to-world rotation
    pub orientation: Mat3,
}

impl Obb {
    /// Create an OBB from its parts
    pub fn new(center: Vec3, extent: Vec3, orientation: Mat3) -> Self {
        Self { center, extent, orientation }
    }

    /// Axis-aligned box as an OBB with identity orientation
    pub fn from_aabb(aabb: Aabb) -> Self {
        Self::new(aabb.center, aabb.extent, Mat3::identity())
    }

    /// Places a model-space box into the world with a transform
    pub fn from_transform(base: Aabb, transform: &Transform) -> Self {
        Self {
            center: transform.transform_point(base.center),
            extent: base.extent.component_mul(&transform.scale.abs()),
            orientation: transform.rotation_matrix(),
        }
    }

    /// Local axis `i` in world space
    pub fn axis(&self, i: usize) -> Vec3 {
        self.orientation.column(i).into_owned()
    }

    /// Check whether a point lies inside the box (boundary inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        let local = self.orientation.transpose() * (point - self.center);
        (0..3).all(|i| local[i].abs() <= self.extent[i])
    }

    /// The 8 corners, using the same bit layout as [`Aabb::corners`]
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            let mut corner = self.center;
            for axis in 0..3 {
                let sign = if i & (1 << axis) != 0 { 1.0 } else { -1.0 };
                corner += self.axis(axis) * (sign * self.extent[axis]);
            }
            corner
        })
    }

    /// Tight world-space AABB around the rotated box
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.center, self.orientation.abs() * self.extent)
    }

    /// Half the length of the box's shadow on `axis`
    fn projected_radius(&self, axis: &Vec3) -> f32 {
        (0..3).map(|i| self.extent[i] * self.axis(i).dot(axis).abs()).sum()
    }

    /// Separating-axis overlap test
    ///
    /// Tries the 3 face normals of each box and the 9 pairwise edge cross
    /// products. Cross products of near-parallel edges carry no information
    /// and are skipped.
    pub fn intersect(&self, other: &Obb) -> bool {
        let between = other.center - self.center;
        let separated_on = |axis: &Vec3| {
            let distance = between.dot(axis).abs();
            distance > self.projected_radius(axis) + other.projected_radius(axis) + INTERVAL_EPSILON
        };

        for i in 0..3 {
            if separated_on(&self.axis(i)) || separated_on(&other.axis(i)) {
                return false;
            }
        }

        for i in 0..3 {
            for j in 0..3 {
                let axis = self.axis(i).cross(&other.axis(j));
                let length = axis.norm();
                if length <= AXIS_EPSILON {
                    continue;
                }
                if separated_on(&(axis / length)) {
                    return false;
                }
            }
        }

        true
    }

    /// Slab test in the box's local frame, returning the entry distance
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let to_local = self.orientation.transpose();
        let local = Ray {
            origin: to_local * (ray.origin - self.center),
            direction: to_local * ray.direction,
        };
        Aabb::new(Vec3::zeros(), self.extent).ray_distance(&local)
    }

    /// Whether the ray reaches the box within `max_length`
    pub fn ray_intersect(&self, ray: &Ray, max_length: f32) -> bool {
        self.ray_distance(ray).is_some_and(|t| t <= max_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_4, SQRT_2};

    const EPSILON: f32 = 1e-5;

    fn rotated(center: Vec3, axis: nalgebra::Unit<Vec3>, angle: f32) -> Obb {
        let transform = Transform::from_position_rotation(center, Quat::from_axis_angle(&axis, angle));
        Obb::from_transform(Aabb::new(Vec3::zeros(), Vec3::repeat(1.0)), &transform)
    }

    #[test]
    fn test_from_aabb_matches_aabb() {
        let aabb = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 2.0));
        let obb = Obb::from_aabb(aabb);
        assert_relative_eq!(obb.bounds().center, aabb.center, epsilon = EPSILON);
        assert_relative_eq!(obb.bounds().extent, aabb.extent, epsilon = EPSILON);
        assert!(obb.contains_point(Vec3::new(1.4, 2.9, 4.9)));
        assert!(!obb.contains_point(Vec3::new(1.6, 2.0, 3.0)));
    }

    #[test]
    fn test_rotated_bounds_and_corners() {
        let obb = rotated(Vec3::zeros(), Vec3::z_axis(), FRAC_PI_4);
        let bounds = obb.bounds();
        assert_relative_eq!(bounds.extent, Vec3::new(SQRT_2, SQRT_2, 1.0), epsilon = EPSILON);
        for corner in obb.corners() {
            assert!(bounds.contains(corner * (1.0 - EPSILON)));
        }
    }

    #[test]
    fn test_from_transform_scales_extent() {
        let transform = Transform::new(Vec3::new(5.0, 0.0, 0.0), Quat::identity(), Vec3::new(2.0, -3.0, 1.0));
        let obb = Obb::from_transform(Aabb::new(Vec3::zeros(), Vec3::repeat(1.0)), &transform);
        assert_relative_eq!(obb.center, Vec3::new(5.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(obb.extent, Vec3::new(2.0, 3.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_face_axis_separation() {
        let a = Obb::from_aabb(Aabb::new(Vec3::zeros(), Vec3::repeat(1.0)));
        let b = rotated(Vec3::new(4.0, 0.0, 0.0), Vec3::y_axis(), 0.3);
        let c = rotated(Vec3::new(2.0, 0.0, 0.0), Vec3::y_axis(), 0.3);
        assert!(!a.intersect(&b));
        assert!(a.intersect(&c));
        assert!(c.intersect(&a));
    }

    #[test]
    fn test_edge_axis_separation() {
        // Top edge of `a` runs along Z, bottom edge of `b` runs along X.
        // Every face axis overlaps; only Z × X = Y separates them.
        let a = rotated(Vec3::zeros(), Vec3::z_axis(), FRAC_PI_4);
        let apart = rotated(Vec3::new(0.0, 2.0 * SQRT_2 + 0.1, 0.0), Vec3::x_axis(), FRAC_PI_4);
        let touching = rotated(Vec3::new(0.0, 2.0 * SQRT_2 - 0.1, 0.0), Vec3::x_axis(), FRAC_PI_4);

        for i in 0..3 {
            for obb in [&a, &apart] {
                let axis = obb.axis(i);
                let distance = (apart.center - a.center).dot(&axis).abs();
                assert!(distance <= a.projected_radius(&axis) + apart.projected_radius(&axis));
            }
        }

        assert!(!a.intersect(&apart));
        assert!(!apart.intersect(&a));
        assert!(a.intersect(&touching));
    }

    #[test]
    fn test_ray_distance_local_frame() {
        let obb = rotated(Vec3::zeros(), Vec3::z_axis(), FRAC_PI_4);
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let t = obb.ray_distance(&ray).expect("should hit");
        assert_relative_eq!(t, 5.0 - SQRT_2, epsilon = 1e-4);
        assert!(obb.ray_intersect(&ray, 4.0));
        assert!(!obb.ray_intersect(&ray, 3.0));

        let miss = Ray::new(Vec3::new(5.0, 2.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(obb.ray_distance(&miss).is_none());
    }
}
