//! # Collision Core
//!
//! Collision geometry for a game engine runtime: bounding volumes with
//! separating-axis overlap tests, ray casts, frustum culling, and two
//! spatial structures (a BVH and an octree) for broad-phase queries.
//!
//! ## Features
//!
//! - **Primitives**: AABB, OBB, sphere, plane, ray, frustum, triangle
//! - **SAT**: box/triangle (13 axes) and box/box (15 axes) overlap
//! - **BVH**: agglomerative or binned-SAH builds, closest-hit ray casts with
//!   an optional placement transform
//! - **Octree**: fixed-depth broad phase with ray, box, sphere and frustum queries
//! - **Config**: TOML/RON tunables for both trees
//!
//! ## Quick Start
//!
//! ```rust
//! use collision_core::prelude::*;
//!
//! let vertices = [
//!     Vec3::new(-1.0, 0.0, -1.0),
//!     Vec3::new(1.0, 0.0, -1.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//! ];
//! let mesh = CollisionMesh::from_vertices(&vertices, &[0, 2, 1], &BvhConfig::default())
//!     .expect("one triangle");
//!
//! let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
//! let hit = mesh.ray_hit(&ray, 100.0, None).expect("ray hits the triangle");
//! assert!((hit.distance - 5.0).abs() < 1e-5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod physics;
pub mod spatial;

#[cfg(test)]
mod tests;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        core::config::{BuildStrategy, BvhConfig, CollisionConfig, Config, ConfigError, OctreeConfig},
        foundation::math::{Mat3, Mat4, Mat4Ext, Quat, Transform, Vec3, Vec3Ext},
        physics::collision::{
            Aabb, CollisionMesh, CollisionShape, DetailedTriangle, Frustum, HitObject, MeshHit, Obb,
            Plane, Ray, Sphere,
        },
        spatial::{Bvh, BvhHit, Octree, SpatialQuery},
    };
}
