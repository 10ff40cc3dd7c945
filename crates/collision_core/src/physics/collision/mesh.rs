//! Triangle mesh collision geometry
//!
//! A [`CollisionMesh`] keeps its triangles in MODEL SPACE inside a BVH.
//! Queries that carry a [`Transform`] map the ray into model space instead of
//! transforming every triangle, so one mesh can be shared by many instances.

use crate::core::config::BvhConfig;
use crate::foundation::math::{Transform, Vec3};
use crate::spatial::Bvh;
use super::aabb::Aabb;
use super::primitives::{Ray, Sphere};
use super::shape::HitObject;
use super::triangle::DetailedTriangle;

/// Closest triangle hit on a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Distance along the query ray
    pub distance: f32,
    /// Hit point in the query ray's space
    pub point: Vec3,
    /// Model-space normal of the triangle that was hit
    pub normal: Vec3,
}

/// A triangle mesh with a BVH for ray casts and box overlap tests
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    /// Triangles in model space
    bvh: Bvh<DetailedTriangle>,
    /// Model-space bounding sphere used as an early out
    bounding_sphere: Sphere,
}

impl CollisionMesh {
    /// Builds a mesh from MODEL SPACE vertices and triangle indices
    ///
    /// Triangles that reference missing vertices are skipped with a warning,
    /// as is a trailing partial triangle. Returns `None` when no triangle
    /// survives.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32], config: &BvhConfig) -> Option<Self> {
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        let mut skipped = 0usize;

        for chunk in indices.chunks_exact(3) {
            let corner = |i: usize| vertices.get(chunk[i] as usize).copied();
            match (corner(0), corner(1), corner(2)) {
                (Some(a), Some(b), Some(c)) => triangles.push(DetailedTriangle::from_points([a, b, c])),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} triangles with out-of-range vertex indices", skipped);
        }
        if indices.len() % 3 != 0 {
            log::warn!("Ignoring {} trailing indices that do not form a triangle", indices.len() % 3);
        }

        Self::from_triangles(triangles, config)
    }

    /// Builds a mesh from already assembled triangles
    pub fn from_triangles(triangles: Vec<DetailedTriangle>, config: &BvhConfig) -> Option<Self> {
        let Some(bvh) = Bvh::build(triangles, config) else {
            log::warn!("Collision mesh has no triangles");
            return None;
        };

        let center = bvh.bounds().center;
        let radius = bvh
            .iter()
            .flat_map(|tri| tri.points)
            .map(|p| (p - center).norm())
            .fold(0.0f32, f32::max);

        Some(Self {
            bvh,
            bounding_sphere: Sphere::new(center, radius),
        })
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.bvh.len()
    }

    /// Model-space bounds
    pub fn bounds(&self) -> Aabb {
        self.bvh.bounds()
    }

    /// Model-space bounding sphere
    pub fn bounding_sphere(&self) -> Sphere {
        self.bounding_sphere
    }

    /// The underlying triangle hierarchy
    pub fn bvh(&self) -> &Bvh<DetailedTriangle> {
        &self.bvh
    }

    /// Closest triangle hit along `ray`
    ///
    /// With a transform the ray is in world space and the mesh is placed by
    /// `transform`; distances and the hit point stay in world units.
    pub fn ray_hit(&self, ray: &Ray, max_length: f32, transform: Option<&Transform>) -> Option<MeshHit> {
        if transform.is_none() && self.bounding_sphere.intersects_ray(ray).is_none() {
            return None;
        }
        self.bvh.ray_hit(ray, max_length, transform).map(|hit| MeshHit {
            distance: hit.distance,
            point: hit.point,
            normal: hit.item.normal,
        })
    }

    /// Whether any triangle touches the model-space box
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.bvh
            .query_aabb(aabb)
            .into_iter()
            .any(|tri| aabb.triangle_intersect(tri))
    }

    /// Whether any triangle touches the model-space sphere
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        if !self.bounding_sphere.overlap(sphere) {
            return false;
        }
        self.bvh
            .query_aabb(&sphere.bounds())
            .into_iter()
            .any(|tri| {
                let closest = closest_point_on_triangle(tri, sphere.center);
                (closest - sphere.center).norm_squared() <= sphere.radius * sphere.radius
            })
    }
}

impl HitObject for CollisionMesh {
    fn bounds(&self) -> Aabb {
        CollisionMesh::bounds(self)
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.ray_hit(ray, max_length, None).map(|hit| hit.distance)
    }
}

/// Closest point on a triangle (Ericson, Real-Time Collision Detection 5.1.5)
fn closest_point_on_triangle(tri: &DetailedTriangle, p: Vec3) -> Vec3 {
    let [a, b, c] = tri.points;
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = va + vb + vc;
    if denom.abs() <= f32::EPSILON {
        // Degenerate triangle: fall back to the nearest vertex
        return [a, b, c]
            .into_iter()
            .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
            .unwrap_or(a);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BuildStrategy;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    /// Unit quad in the XZ plane at y = 0, two triangles
    fn quad() -> (Vec<Vec3>, Vec<u32>) {
        let vertices = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        (vertices, vec![0, 2, 1, 0, 3, 2])
    }

    #[test]
    fn test_from_vertices_skips_bad_indices() {
        let (vertices, mut indices) = quad();
        indices.extend_from_slice(&[0, 1, 99, 2]);
        let mesh = CollisionMesh::from_vertices(&vertices, &indices, &BvhConfig::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(CollisionMesh::from_vertices(&vertices, &[], &BvhConfig::default()).is_none());
    }

    #[test]
    fn test_ray_hit_reports_normal() {
        let (vertices, indices) = quad();
        for strategy in [BuildStrategy::Agglomerative, BuildStrategy::BinnedSah] {
            let config = BvhConfig { strategy, ..BvhConfig::default() };
            let mesh = CollisionMesh::from_vertices(&vertices, &indices, &config).unwrap();
            let ray = Ray::new(Vec3::new(0.5, 3.0, 0.25), Vec3::new(0.0, -1.0, 0.0));
            let hit = mesh.ray_hit(&ray, 10.0, None).expect("should hit");
            assert_relative_eq!(hit.distance, 3.0, epsilon = EPSILON);
            assert_relative_eq!(hit.point, Vec3::new(0.5, 0.0, 0.25), epsilon = EPSILON);
            assert_relative_eq!(hit.normal.y.abs(), 1.0, epsilon = EPSILON);

            assert!(mesh.ray_hit(&ray, 2.0, None).is_none());
        }
    }

    #[test]
    fn test_ray_hit_with_transform() {
        let (vertices, indices) = quad();
        let mesh = CollisionMesh::from_vertices(&vertices, &indices, &BvhConfig::default()).unwrap();
        // Raise the quad to y = 2 and stand it up so it faces +Z
        let transform = Transform::new(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let ray = Ray::new(Vec3::new(0.5, 2.5, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = mesh.ray_hit(&ray, 100.0, Some(&transform)).expect("should hit");
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-4);
        assert_relative_eq!(hit.point, Vec3::new(0.5, 2.5, 0.0), epsilon = 1e-4);

        // Outside the scaled quad
        let miss = Ray::new(Vec3::new(2.5, 2.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(mesh.ray_hit(&miss, 100.0, Some(&transform)).is_none());
    }

    #[test]
    fn test_intersects_aabb_and_sphere() {
        let (vertices, indices) = quad();
        let mesh = CollisionMesh::from_vertices(&vertices, &indices, &BvhConfig::default()).unwrap();
        assert!(mesh.intersects_aabb(&Aabb::new(Vec3::new(0.5, 0.1, 0.5), Vec3::repeat(0.2))));
        assert!(!mesh.intersects_aabb(&Aabb::new(Vec3::new(0.5, 0.5, 0.5), Vec3::repeat(0.2))));
        assert!(mesh.intersects_sphere(&Sphere::new(Vec3::new(1.2, 0.1, 0.0), 0.3)));
        assert!(!mesh.intersects_sphere(&Sphere::new(Vec3::new(1.2, 0.5, 0.0), 0.3)));
    }

    #[test]
    fn test_small_mesh_in_box_corner() {
        let vertices = [
            Vec3::new(0.90, 0.95, 0.95),
            Vec3::new(0.95, 0.90, 0.95),
            Vec3::new(0.95, 0.95, 0.90),
        ];
        let mesh = CollisionMesh::from_vertices(&vertices, &[0, 1, 2], &BvhConfig::default()).unwrap();
        let unit = Aabb::new(Vec3::zeros(), Vec3::repeat(1.0));
        assert!(mesh.intersects_aabb(&unit));
        assert!(!mesh.intersects_aabb(&Aabb::new(Vec3::repeat(-0.5), Vec3::repeat(1.0))));
    }

    #[test]
    fn test_closest_point_regions() {
        let tri = DetailedTriangle::from_points([Vec3::zeros(), Vec3::x(), Vec3::y()]);
        assert_relative_eq!(closest_point_on_triangle(&tri, Vec3::new(-1.0, -1.0, 0.0)), Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(closest_point_on_triangle(&tri, Vec3::new(0.5, -1.0, 0.0)), Vec3::new(0.5, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(closest_point_on_triangle(&tri, Vec3::new(0.2, 0.2, 3.0)), Vec3::new(0.2, 0.2, 0.0), epsilon = EPSILON);
        assert_relative_eq!(closest_point_on_triangle(&tri, Vec3::new(1.0, 1.0, 0.0)), Vec3::new(0.5, 0.5, 0.0), epsilon = EPSILON);
    }
}
