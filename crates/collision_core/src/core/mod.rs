//! # Core Module
//!
//! Shared configuration for the collision subsystems.

pub mod config;

// Re-export commonly used config types
pub use config::{
    BuildStrategy,
    BvhConfig,
    CollisionConfig,
    OctreeConfig,
    Config,
    ConfigError,
};
