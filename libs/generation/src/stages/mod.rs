//! # Stages
//!
//! The concrete pipeline steps. Each one captures its input from
//! [`PipelineInputs`](crate::pipeline::PipelineInputs) and produces an
//! output carrying its own `succeeded` flag.
//!
//! ```text
//! mesh ─► post-process ─┬─► texture
//!                       ├─► rig ─┬─► motions
//!                       │        └─► pose preview
//!                       └─► mouse pick
//! ```

pub mod mesh;
pub mod motions;
pub mod mouse_pick;
pub mod pose_preview;
pub mod postprocess;
pub mod rig;
pub mod texture;

pub use mesh::MeshStage;
pub use motions::{MotionFrame, MotionsOutcome, MotionsStage};
pub use mouse_pick::{MousePickStage, PickHit, PickResult, Ray};
pub use pose_preview::{PosePreview, PosePreviewStage};
pub use postprocess::PostProcessStage;
pub use rig::{Bone, Rig, RigStage};
pub use texture::{TextureImage, TextureOutcome, TextureStage};
