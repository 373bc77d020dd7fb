//! # Rig Stage
//!
//! Builds a skeleton rig from the post-processed outcome: one bone per
//! outcome edge, parented through shared nodes, and up to
//! [`MAX_WEIGHT_NUM`] inverse-distance bone weights per vertex.

use std::collections::BTreeMap;
use std::sync::Arc;

use config::constants::{EPSILON, MAX_WEIGHT_NUM};
use glam::DVec3;
use rayon::prelude::*;
use skeleton_mesh::{NodeSource, Outcome};
use skeleton_snapshot::{BoneMark, Snapshot};
use tracing::debug;

use crate::pipeline::PipelineInputs;
use crate::stage::Stage;

/// Pose parameters: bone name → parameter name → value.
pub type PoseParameters = BTreeMap<String, BTreeMap<String, f64>>;

/// One bone, spanning an edge of the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub index: usize,
    /// Id of the node the bone starts at; pose parameters address bones by it
    pub name: String,
    pub part_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub head: DVec3,
    pub tail: DVec3,
    pub parent: Option<usize>,
    pub bone_mark: BoneMark,
}

impl Bone {
    /// Distance from `point` to the bone segment.
    pub fn distance_to(&self, point: DVec3) -> f64 {
        let axis = self.tail - self.head;
        let length_squared = axis.length_squared();
        let t = if length_squared > EPSILON {
            ((point - self.head).dot(axis) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        point.distance(self.head + axis * t)
    }
}

/// Published rig.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rig {
    pub bones: Vec<Bone>,
    /// Per outcome vertex: `(bone index, weight)`, weights summing to one
    pub vertex_weights: Vec<Vec<(usize, f64)>>,
    pub succeeded: bool,
    pub messages: Vec<String>,
    /// Snapshot of the outcome the rig was built from
    pub snapshot: Option<Arc<Snapshot>>,
}

impl Rig {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            messages: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }

    /// Translation of every bone under a pose (`translateX/Y/Z`
    /// parameters, zero when absent).
    pub fn pose_translations(&self, parameters: &PoseParameters) -> Vec<DVec3> {
        self.bones
            .iter()
            .map(|bone| {
                parameters.get(&bone.name).map_or(DVec3::ZERO, |values| {
                    let value = |key: &str| values.get(key).copied().unwrap_or(0.0);
                    DVec3::new(value("translateX"), value("translateY"), value("translateZ"))
                })
            })
            .collect()
    }

    /// Linear blend of bone translations over the weighted vertices.
    pub fn deform(&self, vertices: &[DVec3], translations: &[DVec3]) -> Vec<DVec3> {
        vertices
            .iter()
            .enumerate()
            .map(|(index, &vertex)| {
                let offset: DVec3 = self
                    .vertex_weights
                    .get(index)
                    .into_iter()
                    .flatten()
                    .filter_map(|&(bone, weight)| translations.get(bone).map(|t| *t * weight))
                    .sum();
                vertex + offset
            })
            .collect()
    }
}

/// Builds the rig for an outcome.
pub fn build_rig(outcome: &Outcome) -> Rig {
    if outcome.edges.is_empty() {
        return Rig::failed("Outcome has no edges to build bones from");
    }

    let mut bones: Vec<Bone> = Vec::with_capacity(outcome.edges.len());
    for edge in &outcome.edges {
        let from = outcome.node(&NodeSource::new(&edge.part_id, &edge.from_node_id));
        let to = outcome.node(&NodeSource::new(&edge.part_id, &edge.to_node_id));
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };
        let index = bones.len();
        let parent = bones
            .iter()
            .find(|other| {
                other.to_node_id == edge.from_node_id
                    || other.from_node_id == edge.from_node_id
                    || other.to_node_id == edge.to_node_id
                    || other.from_node_id == edge.to_node_id
            })
            .map(|other| other.index);
        bones.push(Bone {
            index,
            name: edge.from_node_id.clone(),
            part_id: edge.part_id.clone(),
            from_node_id: edge.from_node_id.clone(),
            to_node_id: edge.to_node_id.clone(),
            head: from.origin,
            tail: to.origin,
            parent,
            bone_mark: from.bone_mark,
        });
    }
    if bones.is_empty() {
        return Rig::failed("No edge connects two known nodes");
    }

    let vertex_weights = outcome
        .vertices
        .par_iter()
        .map(|&vertex| vertex_weights(&bones, vertex))
        .collect();
    debug!(bones = bones.len(), vertices = outcome.vertices.len(), "rig built");
    Rig {
        bones,
        vertex_weights,
        succeeded: true,
        messages: Vec::new(),
        snapshot: outcome.snapshot.clone(),
    }
}

fn vertex_weights(bones: &[Bone], vertex: DVec3) -> Vec<(usize, f64)> {
    let mut nearest: Vec<(usize, f64)> = bones
        .iter()
        .map(|bone| (bone.index, bone.distance_to(vertex)))
        .collect();
    nearest.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    nearest.truncate(MAX_WEIGHT_NUM);

    let inverse: Vec<(usize, f64)> = nearest
        .into_iter()
        .map(|(bone, distance)| (bone, 1.0 / distance.max(EPSILON)))
        .collect();
    let total: f64 = inverse.iter().map(|(_, weight)| weight).sum();
    inverse
        .into_iter()
        .map(|(bone, weight)| (bone, weight / total))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RigStage;

impl Stage for RigStage {
    type Context = PipelineInputs;
    type Input = Arc<Outcome>;
    type Output = Rig;

    const NAME: &'static str = "rig";

    fn capture(&self, inputs: &PipelineInputs) -> Option<Arc<Outcome>> {
        inputs.processed.clone()
    }

    fn run(outcome: Arc<Outcome>) -> Rig {
        build_rig(&outcome)
    }

    fn failed(message: String) -> Rig {
        Rig::failed(message)
    }

    fn succeeded(rig: &Rig) -> bool {
        rig.succeeded
    }
}
