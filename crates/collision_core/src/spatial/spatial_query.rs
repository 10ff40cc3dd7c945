//! Abstract spatial query interface for broad-phase collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! Both the [`Bvh`](super::Bvh) and the [`Octree`](super::Octree) answer the
//! same questions, so callers can swap one for the other.

use crate::physics::collision::{Aabb, Frustum, Ray};

/// Read-only queries shared by the spatial structures
pub trait SpatialQuery<T> {
    /// Objects hit by the ray within `max_length`
    fn query_ray(&self, ray: &Ray, max_length: f32) -> Vec<&T>;

    /// Objects whose bounds overlap `aabb`
    fn query_aabb(&self, aabb: &Aabb) -> Vec<&T>;

    /// Objects whose bounds pass the conservative frustum test
    fn query_frustum(&self, frustum: &Frustum) -> Vec<&T>;

    /// Number of stored objects
    fn object_count(&self) -> usize;
}
