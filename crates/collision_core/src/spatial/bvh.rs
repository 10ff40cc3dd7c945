//! Bounding volume hierarchy over hit objects
//!
//! A binary tree whose leaves own one [`HitObject`] each and whose internal
//! nodes own exactly two children. Every node's bounds enclose the bounds of
//! all of its descendants.
//!
//! Two builders are provided:
//! - [`Bvh::bottom_up`]: agglomerative, repeatedly merges the closest pair of
//!   nodes. Quadratic per merge; fine for small sets.
//! - [`Bvh::binned_sah`]: top-down, splits on the longest centroid axis using
//!   a binned surface area heuristic. The default for meshes.

use crate::core::config::{BuildStrategy, BvhConfig};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision::{Aabb, Frustum, HitObject, Ray};
use super::spatial_query::SpatialQuery;

/// Default distance under which the agglomerative builder merges a pair immediately
pub const DEFAULT_MERGE_DISTANCE: f32 = 1.0;

/// A binary bounding volume hierarchy
#[derive(Debug, Clone)]
pub enum Bvh<T> {
    /// A single object and its bounds
    Leaf {
        /// Bounds of `item`
        bounds: Aabb,
        /// The stored object
        item: T,
    },
    /// Two subtrees and the union of their bounds
    Node {
        /// Union of both children's bounds
        bounds: Aabb,
        /// Left subtree
        left: Box<Bvh<T>>,
        /// Right subtree
        right: Box<Bvh<T>>,
    },
}

/// Closest hit found by [`Bvh::ray_hit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit<'a, T> {
    /// The object that was hit
    pub item: &'a T,
    /// Distance along the query ray
    pub distance: f32,
    /// Hit point in the query ray's space
    pub point: Vec3,
}

impl<T> Bvh<T> {
    /// Bounds of the whole subtree
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Node { bounds, .. } => *bounds,
        }
    }

    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Number of leaves (stored objects)
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Node { left, right, .. } => left.len() + right.len(),
        }
    }

    /// Always false; an empty hierarchy is never constructed
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of the tree, counting a lone leaf as 1
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Node { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Stored objects in left-to-right order
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { stack: vec![self] }
    }

    /// Mutable access to the stored objects; call [`Bvh::refit`] afterwards
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut { stack: vec![self] }
    }

    fn merge(left: Self, right: Self) -> Self {
        Self::Node {
            bounds: Aabb::union(&left.bounds(), &right.bounds()),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl<T: HitObject> Bvh<T> {
    /// Wraps a single object in a leaf
    pub fn leaf(item: T) -> Self {
        Self::Leaf {
            bounds: item.bounds(),
            item,
        }
    }

    /// Builds with the strategy chosen in `config`
    pub fn build(items: Vec<T>, config: &BvhConfig) -> Option<Self> {
        let count = items.len();
        let bvh = match config.strategy {
            BuildStrategy::Agglomerative => Self::bottom_up_with(items, config.merge_distance),
            BuildStrategy::BinnedSah => Self::binned_sah(items, config.sah_bins),
        }?;
        log::debug!(
            "Built {:?} BVH over {} objects (depth {})",
            config.strategy,
            count,
            bvh.depth()
        );
        Some(bvh)
    }

    /// Agglomerative build with the default merge distance
    pub fn bottom_up(items: Vec<T>) -> Option<Self> {
        Self::bottom_up_with(items, DEFAULT_MERGE_DISTANCE)
    }

    /// Agglomerative build
    ///
    /// Each round scans all pairs for the smallest center distance, stopping
    /// at the first pair closer than `merge_distance`, and merges it into a
    /// new node. Returns `None` for empty input.
    pub fn bottom_up_with(items: Vec<T>, merge_distance: f32) -> Option<Self> {
        let mut nodes: Vec<Self> = items.into_iter().map(Self::leaf).collect();
        if nodes.is_empty() {
            log::warn!("BVH build requested with no objects");
            return None;
        }

        while nodes.len() > 1 {
            let (i, j) = closest_pair(&nodes, merge_distance);
            // i < j, so removing j first leaves slot i intact
            let right = nodes.swap_remove(j);
            let left = nodes.swap_remove(i);
            nodes.push(Self::merge(left, right));
            let last = nodes.len() - 1;
            nodes.swap(i, last);
        }

        nodes.pop()
    }

    /// Top-down build with a binned surface area heuristic
    ///
    /// `bins` is clamped to at least 2. Returns `None` for empty input.
    pub fn binned_sah(items: Vec<T>, bins: usize) -> Option<Self> {
        if items.is_empty() {
            log::warn!("BVH build requested with no objects");
            return None;
        }
        let leaves = items.into_iter().map(Self::leaf).collect();
        Some(Self::split_sah(leaves, bins.max(2)))
    }

    fn split_sah(mut leaves: Vec<Self>, bins: usize) -> Self {
        if leaves.len() == 1 {
            if let Some(leaf) = leaves.pop() {
                return leaf;
            }
        }

        let centroid_bounds = Aabb::from_points(leaves.iter().map(|leaf| leaf.bounds().center))
            .unwrap_or_default();
        let axis = centroid_bounds.longest_axis();
        let lo = centroid_bounds.min()[axis];
        let span = centroid_bounds.size()[axis];

        let right = if span <= f32::EPSILON {
            // All centroids coincide on every axis: split the list in half
            let mid = leaves.len() / 2;
            leaves.split_off(mid)
        } else {
            let bin_of = |leaf: &Self| {
                let offset = (leaf.bounds().center[axis] - lo) / span;
                ((offset * bins as f32) as usize).min(bins - 1)
            };

            let mut counts = vec![0usize; bins];
            let mut boxes: Vec<Option<Aabb>> = vec![None; bins];
            for leaf in &leaves {
                let b = bin_of(leaf);
                counts[b] += 1;
                boxes[b] = Some(grow(boxes[b], &leaf.bounds()));
            }

            match best_sah_split(&counts, &boxes) {
                Some(split) => {
                    let (left, right): (Vec<Self>, Vec<Self>) =
                        leaves.into_iter().partition(|leaf| bin_of(leaf) < split);
                    leaves = left;
                    right
                }
                None => {
                    leaves.sort_by(|a, b| a.bounds().center[axis].total_cmp(&b.bounds().center[axis]));
                    let mid = leaves.len() / 2;
                    leaves.split_off(mid)
                }
            }
        };

        Self::merge(Self::split_sah(leaves, bins), Self::split_sah(right, bins))
    }

    /// Recomputes all node bounds from the stored objects
    pub fn refit(&mut self) -> Aabb {
        match self {
            Self::Leaf { bounds, item } => {
                *bounds = item.bounds();
                *bounds
            }
            Self::Node { bounds, left, right } => {
                *bounds = Aabb::union(&left.refit(), &right.refit());
                *bounds
            }
        }
    }

    /// Adds an object to a built tree
    ///
    /// Walks down from the root, at each node taking the child whose surface
    /// area grows least (the right one on ties), and pairs the new leaf with
    /// the node it ends at. Bounds on the path are widened on the way back up.
    pub fn insert(self, item: T) -> Self {
        self.insert_node(Self::leaf(item))
    }

    /// Adds a whole subtree as if it were a single object
    pub fn insert_node(self, node: Self) -> Self {
        match self {
            Self::Leaf { .. } => Self::merge(self, node),
            Self::Node { left, right, .. } => {
                let added = node.bounds();
                let growth = |child: &Self| {
                    let bounds = child.bounds();
                    Aabb::union(&bounds, &added).surface_area() - bounds.surface_area()
                };
                if growth(&*left) < growth(&*right) {
                    Self::merge((*left).insert_node(node), *right)
                } else {
                    Self::merge(*left, (*right).insert_node(node))
                }
            }
        }
    }

    /// Removes the first object (left to right) matching `predicate`
    ///
    /// Its sibling takes the parent's place and bounds on the path are
    /// recomputed. Returns the remaining tree, `None` once the last object is
    /// gone, together with the removed object. A tree with no match comes
    /// back unchanged.
    pub fn remove(self, predicate: impl Fn(&T) -> bool) -> (Option<Self>, Option<T>) {
        match self.take_first(&predicate) {
            Ok((rest, item)) => (rest, Some(item)),
            Err(unchanged) => (Some(unchanged), None),
        }
    }

    /// Removes every object matching `predicate`
    pub fn remove_all(self, predicate: impl Fn(&T) -> bool) -> (Option<Self>, Vec<T>) {
        let mut removed = Vec::new();
        let rest = self.split_off(&predicate, &mut removed);
        if !removed.is_empty() {
            log::debug!("Removed {} objects from BVH", removed.len());
        }
        (rest, removed)
    }

    fn take_first(self, predicate: &dyn Fn(&T) -> bool) -> Result<(Option<Self>, T), Self> {
        match self {
            Self::Leaf { bounds, item } => {
                if predicate(&item) {
                    Ok((None, item))
                } else {
                    Err(Self::Leaf { bounds, item })
                }
            }
            Self::Node { bounds, left, right } => match (*left).take_first(predicate) {
                Ok((rest, item)) => Ok((Self::rejoin(rest, Some(*right)), item)),
                Err(left) => match (*right).take_first(predicate) {
                    Ok((rest, item)) => Ok((Self::rejoin(Some(left), rest), item)),
                    Err(right) => Err(Self::Node {
                        bounds,
                        left: Box::new(left),
                        right: Box::new(right),
                    }),
                },
            },
        }
    }

    fn split_off(self, predicate: &dyn Fn(&T) -> bool, removed: &mut Vec<T>) -> Option<Self> {
        match self {
            Self::Leaf { bounds, item } => {
                if predicate(&item) {
                    removed.push(item);
                    None
                } else {
                    Some(Self::Leaf { bounds, item })
                }
            }
            Self::Node { left, right, .. } => {
                let left = (*left).split_off(predicate, removed);
                let right = (*right).split_off(predicate, removed);
                Self::rejoin(left, right)
            }
        }
    }

    /// Parent of whatever survived on each side
    fn rejoin(left: Option<Self>, right: Option<Self>) -> Option<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self::merge(left, right)),
            (only, None) | (None, only) => only,
        }
    }

    /// Closest hit along the ray
    ///
    /// With a transform, the tree is placed in the world by `transform` and
    /// `ray` is in world space. The ray is mapped into the tree's local space
    /// by the inverse matrix, which keeps the ray parameter, so the distance
    /// and point are reported in world units. Returns `None` when the
    /// transform has no inverse.
    pub fn ray_hit(&self, ray: &Ray, max_length: f32, transform: Option<&Transform>) -> Option<BvhHit<'_, T>> {
        let local = local_ray(ray, transform)?;
        let mut best = None;
        self.closest_hit(&local, max_length, &mut best);
        best.map(|(item, distance)| BvhHit {
            item,
            distance,
            point: ray.point_at(distance),
        })
    }

    /// Any hit along the ray, returning as soon as one is found
    pub fn ray_hit_any(&self, ray: &Ray, max_length: f32, transform: Option<&Transform>) -> Option<BvhHit<'_, T>> {
        let local = local_ray(ray, transform)?;
        self.first_hit(&local, max_length).map(|(item, distance)| BvhHit {
            item,
            distance,
            point: ray.point_at(distance),
        })
    }

    fn closest_hit<'a>(&'a self, ray: &Ray, max_length: f32, best: &mut Option<(&'a T, f32)>) {
        let limit = best.map_or(max_length, |(_, distance)| distance);
        match self.bounds().ray_distance(ray) {
            Some(entry) if entry <= limit => {}
            _ => return,
        }

        match self {
            Self::Leaf { item, .. } => {
                if let Some(t) = item.ray_cast(ray, limit) {
                    if best.map_or(true, |(_, distance)| t < distance) {
                        *best = Some((item, t));
                    }
                }
            }
            Self::Node { left, right, .. } => {
                left.closest_hit(ray, max_length, best);
                right.closest_hit(ray, max_length, best);
            }
        }
    }

    fn first_hit(&self, ray: &Ray, max_length: f32) -> Option<(&T, f32)> {
        match self.bounds().ray_distance(ray) {
            Some(entry) if entry <= max_length => {}
            _ => return None,
        }

        match self {
            Self::Leaf { item, .. } => item.ray_cast(ray, max_length).map(|t| (item, t)),
            Self::Node { left, right, .. } => left
                .first_hit(ray, max_length)
                .or_else(|| right.first_hit(ray, max_length)),
        }
    }

    /// Objects whose bounds overlap `aabb`
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<&T> {
        let mut results = Vec::new();
        self.collect(&mut results, &|bounds| bounds.aabb_intersect(aabb));
        results
    }

    /// Objects whose bounds pass the conservative frustum test
    pub fn query_frustum(&self, frustum: &Frustum) -> Vec<&T> {
        let mut results = Vec::new();
        self.collect(&mut results, &|bounds| bounds.in_frustum(frustum));
        results
    }

    /// Every object the ray hits within `max_length`, in tree order
    pub fn query_ray(&self, ray: &Ray, max_length: f32) -> Vec<&T> {
        let mut results = Vec::new();
        self.collect_ray(ray, max_length, &mut results);
        results
    }

    fn collect<'a>(&'a self, results: &mut Vec<&'a T>, keep: &dyn Fn(&Aabb) -> bool) {
        if !keep(&self.bounds()) {
            return;
        }
        match self {
            Self::Leaf { item, .. } => results.push(item),
            Self::Node { left, right, .. } => {
                left.collect(results, keep);
                right.collect(results, keep);
            }
        }
    }

    fn collect_ray<'a>(&'a self, ray: &Ray, max_length: f32, results: &mut Vec<&'a T>) {
        match self.bounds().ray_distance(ray) {
            Some(entry) if entry <= max_length => {}
            _ => return,
        }
        match self {
            Self::Leaf { item, .. } => {
                if item.ray_intersect(ray, max_length) {
                    results.push(item);
                }
            }
            Self::Node { left, right, .. } => {
                left.collect_ray(ray, max_length, results);
                right.collect_ray(ray, max_length, results);
            }
        }
    }
}

impl<T: HitObject> HitObject for Bvh<T> {
    fn bounds(&self) -> Aabb {
        Bvh::bounds(self)
    }

    fn ray_cast(&self, ray: &Ray, max_length: f32) -> Option<f32> {
        self.ray_hit(ray, max_length, None).map(|hit| hit.distance)
    }
}

impl<T: HitObject> SpatialQuery<T> for Bvh<T> {
    fn query_ray(&self, ray: &Ray, max_length: f32) -> Vec<&T> {
        Bvh::query_ray(self, ray, max_length)
    }

    fn query_aabb(&self, aabb: &Aabb) -> Vec<&T> {
        Bvh::query_aabb(self, aabb)
    }

    fn query_frustum(&self, frustum: &Frustum) -> Vec<&T> {
        Bvh::query_frustum(self, frustum)
    }

    fn object_count(&self) -> usize {
        self.len()
    }
}

/// Depth-first iterator over stored objects
pub struct Iter<'a, T> {
    stack: Vec<&'a Bvh<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Bvh::Leaf { item, .. } => return Some(item),
                Bvh::Node { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}

/// Depth-first mutable iterator over stored objects
pub struct IterMut<'a, T> {
    stack: Vec<&'a mut Bvh<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Bvh::Leaf { item, .. } => return Some(item),
                Bvh::Node { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}

fn local_ray(ray: &Ray, transform: Option<&Transform>) -> Option<Ray> {
    match transform {
        Some(transform) => Some(ray.transformed(&transform.inverse_matrix()?)),
        None => Some(*ray),
    }
}

fn grow(acc: Option<Aabb>, bounds: &Aabb) -> Aabb {
    acc.map_or(*bounds, |b| Aabb::union(&b, bounds))
}

/// Indices `(i, j)` with `i < j` of the two nodes whose centers are closest
fn closest_pair<T>(nodes: &[Bvh<T>], merge_distance: f32) -> (usize, usize) {
    let centers: Vec<Vec3> = nodes.iter().map(|node| node.bounds().center).collect();
    let mut best = (0, 1);
    let mut best_distance = f32::INFINITY;

    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            let distance = (centers[i] - centers[j]).norm();
            if distance < best_distance {
                best_distance = distance;
                best = (i, j);
                if distance < merge_distance {
                    return best;
                }
            }
        }
    }
    best
}

/// Bin index to split before, minimising `count * area` on both sides
fn best_sah_split(counts: &[usize], boxes: &[Option<Aabb>]) -> Option<usize> {
    let bins = counts.len();
    let mut best: Option<(usize, f32)> = None;

    for split in 1..bins {
        let (left_count, left_box) = fold_bins(&counts[..split], &boxes[..split]);
        let (right_count, right_box) = fold_bins(&counts[split..], &boxes[split..]);
        let (Some(left_box), Some(right_box)) = (left_box, right_box) else {
            continue;
        };
        let cost = left_count as f32 * left_box.surface_area() + right_count as f32 * right_box.surface_area();
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((split, cost));
        }
    }

    best.map(|(split, _)| split)
}

fn fold_bins(counts: &[usize], boxes: &[Option<Aabb>]) -> (usize, Option<Aabb>) {
    let count = counts.iter().sum();
    let bounds = boxes
        .iter()
        .flatten()
        .fold(None, |acc, b| Some(grow(acc, b)));
    (count, bounds)
}
