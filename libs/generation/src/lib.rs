//! # Generation
//!
//! Runs skeleton mesh generation and everything derived from it on worker
//! threads, one [`Coordinator`] per stage.
//!
//! ## Architecture
//!
//! ```text
//! Pipeline
//!   ├── Coordinator<MeshStage>         snapshot      → Outcome
//!   ├── Coordinator<PostProcessStage>  Outcome       → Outcome (normals, colors, uvs)
//!   ├── Coordinator<TextureStage>      Outcome       → TextureImage in ContentStore
//!   ├── Coordinator<RigStage>          Outcome       → Rig
//!   ├── Coordinator<MotionsStage>      Rig, poses    → sampled motions
//!   ├── Coordinator<PosePreviewStage>  Rig, pose     → deformed vertices
//!   └── Coordinator<MousePickStage>    Outcome, ray  → nearest hit
//! ```
//!
//! Requests never block. While a stage's worker runs, further requests only
//! mark its result obsolete; one trailing run picks up the newest inputs.
//!
//! ## Usage
//!
//! ```rust
//! use config::GenerationConfig;
//! use generation::Pipeline;
//! use skeleton_snapshot::{CombineMode, SnapshotBuilder};
//!
//! let snapshot = SnapshotBuilder::new()
//!     .tube_part("arm", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
//!     .leaf_component("arm-component", "arm", CombineMode::Normal)
//!     .root_children(&["arm-component"])
//!     .build();
//!
//! let mut pipeline = Pipeline::new(GenerationConfig::default());
//! pipeline.set_snapshot(snapshot);
//! pipeline.wait_idle();
//!
//! assert!(pipeline.outcome().unwrap().succeeded);
//! assert_eq!(pipeline.rig().unwrap().bones.len(), 1);
//! ```

pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod store;

pub use coordinator::{Coordinator, RequestStatus};
pub use error::{GenerationError, Result};
pub use pipeline::{Pipeline, PipelineInputs};
pub use stage::Stage;
pub use store::{ContentId, ContentStore};
