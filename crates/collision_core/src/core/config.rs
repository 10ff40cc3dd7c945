//! # Collision Configuration
//!
//! Tunables for the spatial structures, grouped per subsystem and loadable
//! from TOML or RON through the [`Config`] trait.
//!
//! ```toml
//! [bvh]
//! strategy = "BinnedSah"
//! merge_distance = 1.0
//! sah_bins = 16
//!
//! [octree]
//! half_width = 100.0
//! max_depth = 4
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Deepest octree accepted by validation
///
/// The tree is fully materialized: `max_depth` levels hold
/// `(8^max_depth - 1) / 7` nodes, 37 449 at this cap.
pub const MAX_OCTREE_DEPTH: u32 = 6;

/// How a BVH is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildStrategy {
    /// Bottom-up, merging the closest pair of nodes each round
    Agglomerative,
    /// Top-down, splitting by a binned surface area heuristic
    #[default]
    BinnedSah,
}

/// # BVH Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Construction strategy
    pub strategy: BuildStrategy,
    /// Agglomerative builds merge a pair at once when closer than this
    pub merge_distance: f32,
    /// Number of bins per split for SAH builds
    pub sah_bins: usize,
}

impl BvhConfig {
    /// Create a BVH configuration with defaults
    pub fn new() -> Self {
        Self {
            strategy: BuildStrategy::BinnedSah,
            merge_distance: 1.0,
            sah_bins: 16,
        }
    }

    /// Set the build strategy
    pub fn with_strategy(mut self, strategy: BuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the agglomerative merge distance
    pub fn with_merge_distance(mut self, distance: f32) -> Self {
        self.merge_distance = distance;
        self
    }

    /// Set the SAH bin count
    pub fn with_sah_bins(mut self, bins: usize) -> Self {
        self.sah_bins = bins;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merge_distance.is_nan() || self.merge_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "BVH merge distance must be non-negative, got {}",
                self.merge_distance
            )));
        }
        if self.sah_bins < 2 {
            return Err(ConfigError::Invalid(format!(
                "BVH needs at least 2 SAH bins, got {}",
                self.sah_bins
            )));
        }
        Ok(())
    }
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Octree Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Half the side length of the root cube
    pub half_width: f32,
    /// Number of levels, including the root
    pub max_depth: u32,
}

impl OctreeConfig {
    /// Create an octree configuration with defaults
    pub fn new() -> Self {
        Self {
            half_width: 100.0,
            max_depth: 4,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_width.is_nan() || self.half_width <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Octree half width must be positive, got {}",
                self.half_width
            )));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("Octree max_depth must be at least 1".to_string()));
        }
        if self.max_depth > MAX_OCTREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "Octree max_depth should not exceed {} (got {})",
                MAX_OCTREE_DEPTH, self.max_depth
            )));
        }
        Ok(())
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Collision Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// BVH construction settings
    pub bvh: BvhConfig,
    /// Octree settings
    pub octree: OctreeConfig,
}

impl CollisionConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bvh.validate()?;
        self.octree.validate()?;
        Ok(())
    }
}

impl Config for CollisionConfig {}
