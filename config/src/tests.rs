//! # Tests for Config Constants
//!
//! Unit tests verifying the correctness of configuration constants
//! and the generation settings builder.

use crate::constants::*;
use crate::{ConfigError, GenerationConfig};

// =============================================================================
// PRECISION TESTS
// =============================================================================

#[test]
fn test_epsilon_is_positive() {
    assert!(EPSILON > 0.0, "EPSILON must be positive");
}

#[test]
fn test_plane_epsilon_between_epsilon_and_weld_distance() {
    assert!(PLANE_EPSILON > EPSILON);
    assert!(PLANE_EPSILON < SEAM_WELD_DISTANCE);
}

#[test]
fn test_vertex_merge_epsilon_larger_than_epsilon() {
    assert!(
        VERTEX_MERGE_EPSILON >= EPSILON,
        "VERTEX_MERGE_EPSILON should be >= EPSILON"
    );
}

#[test]
fn test_position_key_resolution_finer_than_weld() {
    assert!(1.0 / POSITION_KEY_SCALE < SEAM_WELD_DISTANCE);
}

// =============================================================================
// WELDING TESTS
// =============================================================================

#[test]
fn test_weld_limits() {
    assert_eq!(WELD_CHAIN_LIMIT, 500);
    assert_eq!(WELD_MAX_ADJACENT_FACES, 4);
    assert!(WELD_MAX_PASSES >= 1);
}

// =============================================================================
// GENERATION CONFIG TESTS
// =============================================================================

#[test]
fn test_default_config_uses_constants() {
    let cfg = GenerationConfig::default();
    assert_eq!(cfg.weld_distance, SEAM_WELD_DISTANCE);
    assert_eq!(cfg.profile_segments, DEFAULT_PROFILE_SEGMENTS);
    assert_eq!(cfg.texture_size, TEXTURE_SIZE);
    assert_eq!(cfg.cache_capacity, PART_CACHE_CAPACITY);
}

#[test]
fn test_new_validates_inputs() {
    assert_eq!(
        GenerationConfig::new(-1.0, 8).unwrap_err(),
        ConfigError::InvalidWeldDistance(-1.0)
    );
    assert_eq!(
        GenerationConfig::new(0.01, 2).unwrap_err(),
        ConfigError::InvalidSegments(2)
    );
    assert!(GenerationConfig::new(f64::NAN, 8).is_err());
}

#[test]
fn test_zero_weld_distance_is_allowed() {
    let cfg = GenerationConfig::new(0.0, 8).unwrap();
    assert_eq!(cfg.weld_distance, 0.0);
}

#[test]
fn test_texture_size_rejects_zero() {
    assert_eq!(
        GenerationConfig::default().with_texture_size(0).unwrap_err(),
        ConfigError::InvalidTextureSize(0)
    );
}

#[test]
fn test_smooth_normal_cos() {
    let cfg = GenerationConfig::default();
    assert!((cfg.smooth_normal_cos() - 0.5).abs() < 1e-9);
}

#[test]
fn test_error_display() {
    let message = ConfigError::InvalidSegments(1).to_string();
    assert!(message.contains("profile_segments"));
}

// =============================================================================
// RECURSION TESTS
// =============================================================================

#[test]
fn test_stacker_sizes() {
    assert!(STACKER_RED_ZONE_BYTES >= 32 * 1024);
    assert!(STACKER_STACK_SIZE_BYTES >= 1024 * 1024);
}
