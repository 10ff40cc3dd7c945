//! Octree spatial partitioning structure
//!
//! A fixed-depth 8-ary tree over hit objects. The whole tree is built up
//! front; objects are pushed down from the root until they straddle a
//! node's center plane or reach a leaf, so each object lives in exactly
//! one node.

use crate::config::ConfigError;
use crate::core::config::OctreeConfig;
use crate::foundation::math::Vec3;
use crate::physics::collision::{Aabb, Frustum, HitObject, Ray, Sphere};
use super::spatial_query::SpatialQuery;

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<T> {
    /// Center of this node's cube
    pub center: Vec3,

    /// Half the side length of this node's cube
    pub half_width: f32,

    /// Depth in the tree (0 = root)
    pub depth: u32,

    /// Child nodes (8 octants), None at the deepest level
    pub children: Option<Box<[OctreeNode<T>; 8]>>,

    /// Objects stored at this node
    pub objects: Vec<T>,

    /// Union of the bounds of every object in this subtree
    content_bounds: Option<Aabb>,
}

impl<T> OctreeNode<T> {
    /// Builds a node and all of its descendants down to `max_depth` levels
    fn build(center: Vec3, half_width: f32, depth: u32, max_depth: u32) -> Self {
        let children = (depth + 1 < max_depth).then(|| {
            let step = half_width * 0.5;
            Box::new(std::array::from_fn(|octant| {
                Self::build(center + octant_offset(octant) * step, step, depth + 1, max_depth)
            }))
        });

        Self {
            center,
            half_width,
            depth,
            children,
            objects: Vec::new(),
            content_bounds: None,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The node's cube
    pub fn cube(&self) -> Aabb {
        Aabb::from_width(self.center, self.half_width)
    }

    /// Union of the bounds of every object in this subtree, `None` when empty
    pub fn content_bounds(&self) -> Option<Aabb> {
        self.content_bounds
    }

    fn children_iter(&self) -> impl Iterator<Item = &OctreeNode<T>> {
        self.children.iter().flat_map(|children| children.iter())
    }

    /// Number of objects in this subtree
    pub fn count_objects(&self) -> usize {
        self.objects.len() + self.children_iter().map(Self::count_objects).sum::<usize>()
    }

    /// Number of nodes in this subtree, including this one
    pub fn count_nodes(&self) -> usize {
        1 + self.children_iter().map(Self::count_nodes).sum::<usize>()
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.content_bounds = None;
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.clear();
            }
        }
    }

    fn find<'a>(&'a self, predicate: &dyn Fn(&T) -> bool) -> Option<(&'a T, &'a OctreeNode<T>)> {
        if let Some(object) = self.objects.iter().find(|object| predicate(object)) {
            return Some((object, self));
        }
        self.children_iter().find_map(|child| child.find(predicate))
    }

    /// Get all leaf nodes (for visualization)
    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode<T>>) {
        match &self.children {
            None => leaves.push(self),
            Some(children) => {
                for child in children.iter() {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    fn collect_at_depth<'a>(&'a self, target_depth: u32, nodes: &mut Vec<&'a OctreeNode<T>>) {
        if self.depth == target_depth {
            nodes.push(self);
            return;
        }
        for child in self.children_iter() {
            child.collect_at_depth(target_depth, nodes);
        }
    }
}

impl<T: HitObject> OctreeNode<T> {
    fn insert(&mut self, object: T, bounds: Aabb) {
        self.content_bounds = Some(match self.content_bounds {
            Some(existing) => existing.from_aabb(&bounds),
            None => bounds,
        });

        let delta = bounds.center - self.center;
        let straddles = (0..3).any(|i| delta[i].abs() <= bounds.extent[i]);

        match self.children.as_mut() {
            Some(children) if !straddles => {
                let octant = octant_index(delta);
                log::trace!("Octree depth {} routes object to octant {}", self.depth, octant);
                children[octant].insert(object, bounds);
            }
            _ => {
                log::trace!("Octree stores object at depth {} (straddles: {})", self.depth, straddles);
                self.objects.push(object);
            }
        }
    }

    /// Walk the subtree, visiting objects of every node whose content passes `visit_node`
    fn visit<'a>(
        &'a self,
        visit_node: &dyn Fn(&Aabb) -> bool,
        keep: &dyn Fn(&T) -> bool,
        results: &mut Vec<&'a T>,
    ) {
        let Some(content) = self.content_bounds else {
            return;
        };
        if !visit_node(&content) {
            return;
        }
        results.extend(self.objects.iter().filter(|object| keep(object)));
        for child in self.children_iter() {
            child.visit(visit_node, keep, results);
        }
    }
}

/// Fixed-depth octree over hit objects
#[derive(Debug, Clone)]
pub struct Octree<T> {
    /// Root node covering the whole partitioned space
    pub root: OctreeNode<T>,

    max_depth: u32,
}

impl<T> Octree<T> {
    /// Create an octree and all of its nodes
    ///
    /// `max_depth` counts levels: 1 is a single root node. Returns `None`
    /// when it is 0.
    pub fn new(center: Vec3, half_width: f32, max_depth: u32) -> Option<Self> {
        if max_depth == 0 {
            log::warn!("Octree requested with max_depth 0");
            return None;
        }
        let root = OctreeNode::build(center, half_width, 0, max_depth);
        log::debug!(
            "Built octree: half width {}, {} levels, {} nodes",
            half_width,
            max_depth,
            root.count_nodes()
        );
        Some(Self { root, max_depth })
    }

    /// Create an octree from validated configuration
    pub fn from_config(center: Vec3, config: &OctreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(center, config.half_width, config.max_depth)
            .ok_or_else(|| ConfigError::Invalid("octree max_depth must be at least 1".to_string()))
    }

    /// Number of levels
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The root cube
    pub fn bounds(&self) -> Aabb {
        self.root.cube()
    }

    /// Get total object count
    pub fn object_count(&self) -> usize {
        self.root.count_objects()
    }

    /// Get total node count
    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// First object matching `predicate` and the node that stores it
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<(&T, &OctreeNode<T>)> {
        self.root.find(&predicate)
    }

    /// Depth of the node storing the first object matching `predicate`
    pub fn depth_of(&self, predicate: impl Fn(&T) -> bool) -> Option<u32> {
        self.find(predicate).map(|(_, node)| node.depth)
    }

    /// Get all leaf nodes (for visualization)
    pub fn leaves(&self) -> Vec<&OctreeNode<T>> {
        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        leaves
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<&OctreeNode<T>> {
        let mut nodes = Vec::new();
        self.root.collect_at_depth(depth, &mut nodes);
        nodes
    }

    /// Remove every object, keeping the node structure
    pub fn clear(&mut self) {
        self.root.clear();
    }
}

impl<T: HitObject> Octree<T> {
    /// Insert an object into the deepest node that fully holds it
    pub fn insert(&mut self, object: T) {
        let bounds = object.bounds();
        if !self.root.cube().contains_aabb(&bounds) {
            log::debug!("Object at {:?} extends past the octree root", bounds.center);
        }
        self.root.insert(object, bounds);
    }

    /// Objects hit by the ray within `max_length`
    pub fn query_ray(&self, ray: &Ray, max_length: f32) -> Vec<&T> {
        let mut results = Vec::new();
        self.root.visit(
            &|content| content.ray_distance(ray).is_some_and(|t| t <= max_length),
            &|object| object.ray_intersect(ray, max_length),
            &mut results,
        );
        results
    }

    /// Objects whose bounds overlap `aabb`
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<&T> {
        let mut results = Vec::new();
        self.root.visit(
            &|content| content.aabb_intersect(aabb),
            &|object| object.bounds().aabb_intersect(aabb),
            &mut results,
        );
        results
    }

    /// Objects whose bounds touch the sphere
    pub fn query_sphere(&self, sphere: &Sphere) -> Vec<&T> {
        let mut results = Vec::new();
        self.root.visit(
            &|content| sphere.intersects_aabb(content),
            &|object| sphere.intersects_aabb(&object.bounds()),
            &mut results,
        );
        results
    }

    /// Objects whose bounds pass the conservative frustum test
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<&T> {
        let mut results = Vec::new();
        self.root.visit(
            &|content| content.in_frustum(frustum),
            &|object| object.bounds().in_frustum(frustum),
            &mut results,
        );
        results
    }
}

impl<T: HitObject> SpatialQuery<T> for Octree<T> {
    fn query_ray(&self, ray: &Ray, max_length: f32) -> Vec<&T> {
        Octree::query_ray(self, ray, max_length)
    }

    fn query_aabb(&self, aabb: &Aabb) -> Vec<&T> {
        Octree::query_aabb(self, aabb)
    }

    fn query_frustum(&self, frustum: &Frustum) -> Vec<&T> {
        Octree::query_frustum(self, frustum)
    }

    fn object_count(&self) -> usize {
        Octree::object_count(self)
    }
}

// Octant layout:
// 0: -X, -Y, -Z    4: -X, -Y, +Z
// 1: +X, -Y, -Z    5: +X, -Y, +Z
// 2: -X, +Y, -Z    6: -X, +Y, +Z
// 3: +X, +Y, -Z    7: +X, +Y, +Z
fn octant_index(delta: Vec3) -> usize {
    let x_bit = usize::from(delta.x > 0.0);
    let y_bit = usize::from(delta.y > 0.0);
    let z_bit = usize::from(delta.z > 0.0);
    (z_bit << 2) | (y_bit << 1) | x_bit
}

fn octant_offset(octant: usize) -> Vec3 {
    let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
    Vec3::new(sign(1), sign(2), sign(4))
}
