//! Collision geometry
//!
//! Bounding volumes, planes, rays and triangles together with their
//! intersection tests. Every query is read-only: none of them modify the
//! shapes passed in.
//!
//! # Module Organization
//!
//! - [`aabb`] - Axis-aligned boxes: slab ray test, box/triangle SAT, frustum culling
//! - [`obb`] - Oriented boxes with the full 15-axis SAT
//! - [`plane`] - Planes and frustums extracted from view-projection matrices
//! - [`primitives`] - Rays and bounding spheres
//! - [`triangle`] - Triangles with cached normal, centroid and radius
//! - [`shape`] - The [`HitObject`] capability and the [`CollisionShape`] enum
//! - [`mesh`] - BVH-backed triangle meshes

pub mod aabb;
pub mod mesh;
pub mod obb;
pub mod plane;
pub mod primitives;
pub mod shape;
pub mod triangle;

// Re-export commonly used types
pub use aabb::Aabb;
pub use mesh::{CollisionMesh, MeshHit};
pub use obb::Obb;
pub use plane::{Frustum, Plane};
pub use primitives::{Ray, Sphere};
pub use shape::{CollisionShape, HitObject};
pub use triangle::DetailedTriangle;
