//! Per-request generation settings shared by the mesh generator and the
//! downstream stages.
//!
//! Each public item documents its purpose with a minimal usage example so
//! that downstream crates can stay declarative and avoid scattering literals.

use std::fmt;

use crate::constants::{
    DEFAULT_PROFILE_SEGMENTS, MOTION_FRAME_RATE, PART_CACHE_CAPACITY, SEAM_WELD_DISTANCE,
    SMOOTH_NORMAL_ANGLE_DEGREES, TEXTURE_SIZE,
};

/// Immutable snapshot of the tunable generation settings.
///
/// The value is `Copy`, so every worker captures its own version together
/// with the skeleton snapshot.
///
/// # Examples
/// ```
/// use config::GenerationConfig;
/// let config = GenerationConfig::default();
/// assert!(config.weld_distance > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    /// Distance under which seam vertices are welded.
    pub weld_distance: f64,
    /// Point count of the default circular cross-section.
    pub profile_segments: usize,
    /// Angle (degrees) limiting normal smoothing across an edge.
    pub smooth_normal_angle: f64,
    /// Texture atlas edge length in pixels.
    pub texture_size: usize,
    /// Number of part meshes kept by the generated cache context.
    pub cache_capacity: usize,
    /// Frames per second used when sampling motions.
    pub motion_frame_rate: f64,
}

impl GenerationConfig {
    /// Builds a configuration, rejecting values the pipeline cannot work with.
    ///
    /// # Examples
    /// ```
    /// use config::GenerationConfig;
    /// let cfg = GenerationConfig::new(0.01, 12).expect("valid config");
    /// assert_eq!(cfg.profile_segments, 12);
    /// assert!(GenerationConfig::new(0.01, 2).is_err());
    /// ```
    pub fn new(weld_distance: f64, profile_segments: usize) -> Result<Self, ConfigError> {
        if weld_distance.is_nan() || weld_distance < 0.0 {
            return Err(ConfigError::InvalidWeldDistance(weld_distance));
        }
        if profile_segments < 3 {
            return Err(ConfigError::InvalidSegments(profile_segments));
        }
        Ok(Self {
            weld_distance,
            profile_segments,
            ..Self::default()
        })
    }

    /// Returns a copy with a different texture size.
    ///
    /// # Examples
    /// ```
    /// use config::GenerationConfig;
    /// let cfg = GenerationConfig::default().with_texture_size(64).unwrap();
    /// assert_eq!(cfg.texture_size, 64);
    /// ```
    pub fn with_texture_size(self, texture_size: usize) -> Result<Self, ConfigError> {
        if texture_size == 0 {
            return Err(ConfigError::InvalidTextureSize(texture_size));
        }
        Ok(Self {
            texture_size,
            ..self
        })
    }

    /// Cosine of the smoothing angle, the value normal smoothing compares against.
    pub fn smooth_normal_cos(&self) -> f64 {
        self.smooth_normal_angle.to_radians().cos()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            weld_distance: SEAM_WELD_DISTANCE,
            profile_segments: DEFAULT_PROFILE_SEGMENTS,
            smooth_normal_angle: SMOOTH_NORMAL_ANGLE_DEGREES,
            texture_size: TEXTURE_SIZE,
            cache_capacity: PART_CACHE_CAPACITY,
            motion_frame_rate: MOTION_FRAME_RATE,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the weld distance is negative or NaN.
    InvalidWeldDistance(f64),
    /// Raised when the profile segment count cannot form a polygon.
    InvalidSegments(usize),
    /// Raised when the texture atlas would be empty.
    InvalidTextureSize(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWeldDistance(value) => {
                write!(f, "weld_distance must be non-negative: {value}")
            }
            ConfigError::InvalidSegments(value) => {
                write!(f, "profile_segments must be >= 3: {value}")
            }
            ConfigError::InvalidTextureSize(value) => {
                write!(f, "texture_size must be positive: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
