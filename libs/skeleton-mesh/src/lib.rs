//! # Skeleton Mesh
//!
//! Mesh generation core: turns a skeleton [`Snapshot`](skeleton_snapshot::Snapshot)
//! into one combined surface.
//!
//! ## Architecture
//!
//! ```text
//! Snapshot → PartMesher → Combiner (CSG) → SeamWelder → HoleFixer → Quadifier → Outcome
//! ```
//!
//! ## Algorithms
//!
//! - **Skinning**: swept profiles along parallel-transported frames, convex
//!   hull joints at branch nodes
//! - **Boolean Operations**: BSP trees (csg.js algorithm) with exact
//!   orientation predicates
//! - **Hull**: QuickHull
//! - **Refinement**: Catmull–Clark, midpoint fallback
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use config::GenerationConfig;
//! use skeleton_mesh::{GeneratedCacheContext, MeshGenerator};
//! use skeleton_snapshot::{CombineMode, SnapshotBuilder};
//!
//! let snapshot = SnapshotBuilder::new()
//!     .tube_part("a", [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], 0.1)
//!     .tube_part("b", [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], 0.1)
//!     .leaf_component("ca", "a", CombineMode::Normal)
//!     .leaf_component("cb", "b", CombineMode::Normal)
//!     .root_children(&["ca", "cb"])
//!     .build();
//!
//! let cache = Arc::new(GeneratedCacheContext::default());
//! let outcome = MeshGenerator::new(Arc::new(snapshot), GenerationConfig::default())
//!     .with_cache(cache)
//!     .generate();
//! assert!(outcome.succeeded);
//! assert_eq!(outcome.mesh().shell_count(), 2);
//! ```

pub mod cache;
pub mod combiner;
pub mod csg;
pub mod error;
pub mod fix_holes;
pub mod generator;
pub mod hull;
pub mod mesh;
pub mod normals;
pub mod outcome;
pub mod part_mesher;
pub mod position_key;
pub mod postprocess;
pub mod provenance;
pub mod quadify;
pub mod subdivide;
pub mod uv;
pub mod weld;

pub use cache::{CacheStats, GeneratedCacheContext};
pub use combiner::{Combined, Combiner};
pub use error::{MeshError, Result};
pub use fix_holes::{fix_holes, HoleReport};
pub use generator::MeshGenerator;
pub use mesh::{BoundingBox, Mesh};
pub use outcome::{NodeSource, Outcome, OutcomeEdge, OutcomeNode, UvRect};
pub use part_mesher::{PartMesh, PartMesher};
pub use quadify::quadify;
pub use subdivide::{subdivide, Subdivided, SubdivisionMethod};
pub use weld::{weld_seam, WeldResult};
