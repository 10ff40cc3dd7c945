//! Spatial partitioning data structures
//!
//! Provides spatial indexing for ray casting, overlap and visibility
//! queries in 3D space.

mod bvh;
mod octree;
mod spatial_query;

pub use bvh::{Bvh, BvhHit, Iter, IterMut, DEFAULT_MERGE_DISTANCE};
pub use octree::{Octree, OctreeNode};
pub use spatial_query::SpatialQuery;
