//! # Config Crate
//!
//! Centralized configuration constants for skeleton mesh generation.
//! All magic numbers and tunable parameters of the generation pipeline
//! live here so the mesher, the seam welder and the downstream stages
//! agree on the same tolerances.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{SEAM_WELD_DISTANCE, WELD_CHAIN_LIMIT};
//!
//! // Two seam vertices closer than the weld distance collapse into one
//! let gap: f64 = 0.01;
//! assert!(gap < SEAM_WELD_DISTANCE);
//! assert!(WELD_CHAIN_LIMIT > 0);
//! ```
//!
//! ```rust
//! use config::GenerationConfig;
//!
//! let config = GenerationConfig::default();
//! assert_eq!(config.profile_segments, config::constants::DEFAULT_PROFILE_SEGMENTS);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Value Semantics**: `GenerationConfig` is `Copy` and travels with each request
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
pub mod generation;

pub use generation::{ConfigError, GenerationConfig};

#[cfg(test)]
mod tests;
