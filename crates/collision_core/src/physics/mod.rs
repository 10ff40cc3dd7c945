//! Physics module for collision detection
//!
//! Narrow-phase geometry lives in [`collision`]; the broad phase is in
//! [`crate::spatial`].

pub mod collision;

pub use collision::{
    Aabb,
    CollisionMesh,
    CollisionShape,
    DetailedTriangle,
    Frustum,
    HitObject,
    Obb,
    Plane,
    Ray,
    Sphere,
};
