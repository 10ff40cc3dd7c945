//! The hit-object capability and a closed set of collision shapes
//!
//! Spatial trees store anything implementing [`HitObject`]: it only needs
//! bounds for placement and a ray cast for the narrow phase. Heterogeneous
//! collections can use either `Box<dyn HitObject>` or the [`CollisionShape`]
//! enum.

use crate::foundation::math::{Transform, Vec3};
use super::aabb::Aabb;
use super::mesh::CollisionMesh;
use super::obb::Obb;
use super::primitives::{Ray, Sphere};
use super::triangle::DetailedTriangle;

/// Anything that can be bounded and hit by a ray
pub trait HitObject {
    /// World-space (or tree-local) axis-aligned bounds
    fn bounds(&self) -> Aabb;

    /// Distance along `ray` to the first hit, if it is within `max_length`
    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32>;

    /// Whether `ray` hits within `max_length`
    fn ray_intersect(&self, ray: &Ray, max_length: f32) -> bool {
        self.ray_cast(ray, max_length).is_some()
    }
}

impl HitObject for DetailedTriangle {
    fn bounds(&self) -> Aabb {
        DetailedTriangle::bounds(self)
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.ray_distance(ray, max_length)
    }
}

impl HitObject for Aabb {
    fn bounds(&self) -> Aabb {
        *self
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.ray_distance(ray).filter(|t| *t <= max_length)
    }
}

impl HitObject for Obb {
    fn bounds(&self) -> Aabb {
        Obb::bounds(self)
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.ray_distance(ray).filter(|t| *t <= max_length)
    }
}

impl HitObject for Sphere {
    fn bounds(&self) -> Aabb {
        Sphere::bounds(self)
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.intersects_ray(ray).filter(|t| *t <= max_length)
    }
}

impl<H: HitObject + ?Sized> HitObject for Box<H> {
    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        (**self).ray_cast(ray, max_length)
    }
}

impl<H: HitObject + ?Sized> HitObject for &H {
    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        (**self).ray_cast(ray, max_length)
    }
}

/// Collision shape types
///
/// Primitive variants are stored in world space. A mesh keeps its triangles
/// in model space together with the transform that places it.
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// A bounding sphere
    Sphere(Sphere),
    /// An axis-aligned box
    Aabb(Aabb),
    /// An oriented box
    Obb(Obb),
    /// A single triangle
    Triangle(DetailedTriangle),
    /// A triangle mesh in model space and its placement
    Mesh(Box<CollisionMesh>, Transform),
}

impl CollisionShape {
    /// Places a model-space box with a transform; rotated boxes become OBBs
    pub fn placed_box(base: Aabb, transform: &Transform) -> Self {
        if transform.rotation == Transform::identity().rotation {
            let center = transform.transform_point(base.center);
            Self::Aabb(Aabb::new(center, base.extent.component_mul(&transform.scale.abs())))
        } else {
            Self::Obb(Obb::from_transform(base, transform))
        }
    }

    /// Center of the shape's bounds
    pub fn center(&self) -> Vec3 {
        self.bounds().center
    }

    /// Conservative overlap test against an axis-aligned box
    ///
    /// Exact for every variant except meshes, which are tested triangle by
    /// triangle after mapping the box's corners into model space.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        match self {
            Self::Sphere(sphere) => sphere.intersects_aabb(aabb),
            Self::Aabb(b) => b.aabb_intersect(aabb),
            Self::Obb(obb) => obb.intersect(&Obb::from_aabb(*aabb)),
            Self::Triangle(tri) => aabb.triangle_intersect(tri),
            Self::Mesh(mesh, transform) => {
                if !self.bounds().aabb_intersect(aabb) {
                    return false;
                }
                let Some(inverse) = transform.inverse_matrix() else {
                    return false;
                };
                let local_corners = aabb
                    .corners()
                    .map(|c| inverse.transform_point(&c.into()).coords);
                match Aabb::from_points(local_corners) {
                    Some(local) => mesh.intersects_aabb(&local),
                    None => false,
                }
            }
        }
    }
}

impl HitObject for CollisionShape {
    fn bounds(&self) -> Aabb {
        match self {
            Self::Sphere(sphere) => sphere.bounds(),
            Self::Aabb(aabb) => *aabb,
            Self::Obb(obb) => obb.bounds(),
            Self::Triangle(tri) => tri.bounds(),
            Self::Mesh(mesh, transform) => {
                let world_corners = mesh.bounds().corners().map(|c| transform.transform_point(c));
                Aabb::from_points(world_corners).unwrap_or_default()
            }
        }
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        match self {
            Self::Sphere(sphere) => sphere.ray_cast(ray, max_length),
            Self::Aabb(aabb) => aabb.ray_cast(ray, max_length),
            Self::Obb(obb) => obb.ray_cast(ray, max_length),
            Self::Triangle(tri) => tri.ray_cast(ray, max_length),
            Self::Mesh(mesh, transform) => mesh
                .ray_hit(ray, max_length, Some(transform))
                .map(|hit| hit.distance),
        }
    }
}
