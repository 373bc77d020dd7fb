//! # Configuration Constants
//!
//! Centralized constants for skeleton mesh generation. Geometry tolerances,
//! skinning resolution, seam welding limits and downstream stage
//! parameters are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Skinning**: Cross-section resolution of swept tubes
//! - **Welding**: Seam weld thresholds and safety bounds
//! - **Stages**: Post-process, texture, rig and motion parameters

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Used for determining if two floating-point values are "equal" within
/// numerical tolerance, e.g. zero-length directions or zero-area faces.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Plane thickness used when classifying split-generated vertices.
///
/// Vertices that come straight from an input mesh are classified with exact
/// orientation predicates. Vertices created by splitting a polygon carry
/// rounding error and are classified against this slab instead.
///
/// # Example
///
/// ```rust
/// use config::constants::{EPSILON, PLANE_EPSILON};
///
/// assert!(PLANE_EPSILON > EPSILON);
/// ```
pub const PLANE_EPSILON: f64 = 1e-7;

/// Epsilon for vertex deduplication.
///
/// Slightly larger tolerance used when merging nearly-identical vertices
/// after boolean operations.
///
/// # Example
///
/// ```rust
/// use config::constants::VERTEX_MERGE_EPSILON;
///
/// fn vertices_should_merge(v1: [f64; 3], v2: [f64; 3]) -> bool {
///     let dx = v1[0] - v2[0];
///     let dy = v1[1] - v2[1];
///     let dz = v1[2] - v2[2];
///     (dx * dx + dy * dy + dz * dz).sqrt() < VERTEX_MERGE_EPSILON
/// }
///
/// assert!(vertices_should_merge([0.0; 3], [1e-9, 0.0, 0.0]));
/// ```
pub const VERTEX_MERGE_EPSILON: f64 = 1e-8;

/// Quantization factor for position keys.
///
/// Positions are multiplied by this factor and rounded to build hashable
/// keys that survive re-indexing of the same geometry.
///
/// # Example
///
/// ```rust
/// use config::constants::POSITION_KEY_SCALE;
///
/// let key = (0.123456789_f64 * POSITION_KEY_SCALE).round() as i64;
/// assert_eq!(key, 12346);
/// ```
pub const POSITION_KEY_SCALE: f64 = 1e5;

// =============================================================================
// SKINNING CONSTANTS
// =============================================================================

/// Number of points on the default circular cross-section.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_PROFILE_SEGMENTS;
///
/// assert!(DEFAULT_PROFILE_SEGMENTS >= 3);
/// ```
pub const DEFAULT_PROFILE_SEGMENTS: usize = 8;

/// Smallest radius a node may carry before its part is treated as degenerate.
///
/// # Example
///
/// ```rust
/// use config::constants::MIN_NODE_RADIUS;
///
/// let radius = 0.0;
/// assert!(radius < MIN_NODE_RADIUS);
/// ```
pub const MIN_NODE_RADIUS: f64 = 1e-6;

// =============================================================================
// WELDING CONSTANTS
// =============================================================================

/// Maximum distance between two seam vertices that get welded together.
///
/// # Example
///
/// ```rust
/// use config::constants::SEAM_WELD_DISTANCE;
///
/// assert_eq!(SEAM_WELD_DISTANCE, 0.025);
/// ```
pub const SEAM_WELD_DISTANCE: f64 = 0.025;

/// Maximum number of hops followed when resolving a chain of welds.
///
/// A longer chain means the weld map contains a cycle; the face that
/// triggered the walk is dropped.
///
/// # Example
///
/// ```rust
/// use config::constants::WELD_CHAIN_LIMIT;
///
/// assert_eq!(WELD_CHAIN_LIMIT, 500);
/// ```
pub const WELD_CHAIN_LIMIT: usize = 500;

/// A vertex with more adjacent faces than this is never welded away.
///
/// # Example
///
/// ```rust
/// use config::constants::WELD_MAX_ADJACENT_FACES;
///
/// assert_eq!(WELD_MAX_ADJACENT_FACES, 4);
/// ```
pub const WELD_MAX_ADJACENT_FACES: usize = 4;

/// Upper bound on repeated weld passes during one generation.
///
/// # Example
///
/// ```rust
/// use config::constants::WELD_MAX_PASSES;
///
/// assert!(WELD_MAX_PASSES >= 1);
/// ```
pub const WELD_MAX_PASSES: usize = 16;

// =============================================================================
// STAGE CONSTANTS
// =============================================================================

/// Dihedral angle (degrees) under which neighbouring faces share a smooth normal.
///
/// # Example
///
/// ```rust
/// use config::constants::SMOOTH_NORMAL_ANGLE_DEGREES;
///
/// let threshold = SMOOTH_NORMAL_ANGLE_DEGREES.to_radians().cos();
/// assert!(threshold > 0.0);
/// ```
pub const SMOOTH_NORMAL_ANGLE_DEGREES: f64 = 60.0;

/// Number of part meshes retained by the generated cache context.
///
/// # Example
///
/// ```rust
/// use config::constants::PART_CACHE_CAPACITY;
///
/// assert!(PART_CACHE_CAPACITY > 0);
/// ```
pub const PART_CACHE_CAPACITY: usize = 256;

/// Edge length in pixels of the generated texture atlas.
///
/// # Example
///
/// ```rust
/// use config::constants::TEXTURE_SIZE;
///
/// assert!(TEXTURE_SIZE.is_power_of_two());
/// ```
pub const TEXTURE_SIZE: usize = 256;

/// Maximum number of bone weights stored per vertex.
///
/// # Example
///
/// ```rust
/// use config::constants::MAX_WEIGHT_NUM;
///
/// assert_eq!(MAX_WEIGHT_NUM, 4);
/// ```
pub const MAX_WEIGHT_NUM: usize = 4;

/// Sampling rate (frames per second) of generated motions.
///
/// # Example
///
/// ```rust
/// use config::constants::MOTION_FRAME_RATE;
///
/// let frames = (2.0 * MOTION_FRAME_RATE) as usize;
/// assert_eq!(frames, 60);
/// ```
pub const MOTION_FRAME_RATE: f64 = 30.0;

/// Default RGBA color for parts that do not specify one.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_COLOR;
///
/// assert_eq!(DEFAULT_COLOR[3], 1.0);
/// ```
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

// =============================================================================
// RECURSION CONSTANTS
// =============================================================================

/// Bytes of stack allocated when `stacker` grows the stack for deep
/// recursion (BSP construction on fragmented meshes).
///
/// # Example
///
/// ```rust
/// use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
///
/// assert!(STACKER_STACK_SIZE_BYTES > STACKER_RED_ZONE_BYTES);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Remaining stack below which `stacker` allocates a new segment.
pub const STACKER_RED_ZONE_BYTES: usize = 64 * 1024;
