//! # Pose Preview Stage
//!
//! Deforms the post-processed mesh by one pose of the snapshot.

use std::sync::Arc;

use glam::DVec3;
use skeleton_mesh::Outcome;
use skeleton_snapshot::Snapshot;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::PipelineInputs;
use crate::stage::Stage;
use crate::stages::rig::Rig;

/// Deformed vertex positions, indexed like the outcome's vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosePreview {
    pub pose_id: String,
    pub vertices: Vec<DVec3>,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl PosePreview {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            messages: vec![message.into()],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PosePreviewInput {
    pub rig: Arc<Rig>,
    pub outcome: Arc<Outcome>,
    pub snapshot: Arc<Snapshot>,
    pub pose_id: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PosePreviewStage;

impl Stage for PosePreviewStage {
    type Context = PipelineInputs;
    type Input = PosePreviewInput;
    type Output = PosePreview;

    const NAME: &'static str = "pose-preview";

    fn capture(&self, inputs: &PipelineInputs) -> Option<PosePreviewInput> {
        let rig = inputs.rig.as_ref().filter(|rig| rig.succeeded)?;
        Some(PosePreviewInput {
            rig: Arc::clone(rig),
            outcome: inputs.processed.clone()?,
            snapshot: rig
                .snapshot
                .clone()
                .unwrap_or_else(|| Arc::clone(&inputs.snapshot)),
            pose_id: inputs.preview_pose.clone()?,
        })
    }

    fn run(input: PosePreviewInput) -> PosePreview {
        preview(&input).unwrap_or_else(|error| PosePreview {
            pose_id: input.pose_id.clone(),
            ..PosePreview::failed(error.to_string())
        })
    }

    fn failed(message: String) -> PosePreview {
        PosePreview::failed(message)
    }

    fn succeeded(output: &PosePreview) -> bool {
        output.succeeded
    }
}

fn preview(input: &PosePreviewInput) -> Result<PosePreview> {
    let graph = input.snapshot.decode()?;
    let Some(pose) = graph.poses.get(&input.pose_id) else {
        return Ok(PosePreview {
            pose_id: input.pose_id.clone(),
            ..PosePreview::failed(format!("Unknown pose {}", input.pose_id))
        });
    };
    let translations = input.rig.pose_translations(&pose.parameters);
    let vertices = input.rig.deform(&input.outcome.vertices, &translations);
    debug!(pose = %input.pose_id, vertices = vertices.len(), "pose preview deformed");
    Ok(PosePreview {
        pose_id: input.pose_id.clone(),
        vertices,
        succeeded: true,
        messages: Vec::new(),
    })
}
