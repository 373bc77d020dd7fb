//! # Skeleton Snapshot
//!
//! Immutable, flattened description of a skeleton document at one instant.
//! The snapshot is the only value that crosses from the editing side into
//! the generation workers, so it owns every string it carries and never
//! references live document state.
//!
//! ## Architecture
//!
//! ```text
//! document graph → Snapshot (string maps) → SkeletonGraph (typed, validated)
//! ```
//!
//! ## Conventions
//!
//! - Absent keys mean "not present", never zero
//! - `visible` defaults to true, flags default to false
//! - Positions are made canvas relative while decoding
//!
//! ## Usage
//!
//! ```rust
//! use skeleton_snapshot::{CombineMode, SnapshotBuilder};
//!
//! let snapshot = SnapshotBuilder::new()
//!     .tube_part("arm", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
//!     .leaf_component("arm-component", "arm", CombineMode::Normal)
//!     .root_children(&["arm-component"])
//!     .build();
//!
//! let graph = snapshot.decode().unwrap();
//! assert_eq!(graph.parts.len(), 1);
//! assert_eq!(graph.tree.roots().len(), 1);
//! ```

pub mod builder;
pub mod decode;
pub mod error;
pub mod model;
pub mod snapshot;

pub use builder::SnapshotBuilder;
pub use decode::{ComponentTree, SkeletonGraph};
pub use error::{Result, SnapshotError};
pub use model::{
    BoneMark, CombineMode, Component, ComponentLink, CutFace, Edge, Material, Motion,
    MotionClip, MotionClipKind, Node, Part, PartTarget, Pose,
};
pub use snapshot::Snapshot;
