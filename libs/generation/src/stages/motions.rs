//! # Motions Stage
//!
//! Samples every motion of the snapshot at a fixed frame rate. A motion is
//! a timeline of clips: holding a pose, blending from the previous pose to
//! the next one, or playing another motion. Each frame carries the
//! interpolated pose parameters and the resulting bone translations of the
//! current rig.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::DVec3;
use skeleton_snapshot::{MotionClipKind, SkeletonGraph, Snapshot};
use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::PipelineInputs;
use crate::stage::Stage;
use crate::stages::rig::{PoseParameters, Rig};

/// One sampled instant of a motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionFrame {
    /// Seconds from the motion start
    pub time: f64,
    pub parameters: PoseParameters,
    /// Indexed like the rig's bones
    pub bone_translations: Vec<DVec3>,
}

/// Published motions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionsOutcome {
    pub motions: BTreeMap<String, Vec<MotionFrame>>,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl MotionsOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            messages: vec![message.into()],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Pose(String),
    Interpolation,
}

/// Input captured for one motions run.
#[derive(Debug, Clone)]
pub struct MotionsInput {
    pub rig: Arc<Rig>,
    pub snapshot: Arc<Snapshot>,
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionsStage;

impl Stage for MotionsStage {
    type Context = PipelineInputs;
    type Input = MotionsInput;
    type Output = MotionsOutcome;

    const NAME: &'static str = "motions";

    fn capture(&self, inputs: &PipelineInputs) -> Option<MotionsInput> {
        let rig = inputs.rig.as_ref().filter(|rig| rig.succeeded)?;
        // Poses must address the bones of the snapshot the rig came from
        let snapshot = rig
            .snapshot
            .clone()
            .unwrap_or_else(|| Arc::clone(&inputs.snapshot));
        Some(MotionsInput {
            rig: Arc::clone(rig),
            snapshot,
            frame_rate: inputs.config.motion_frame_rate,
        })
    }

    fn run(input: MotionsInput) -> MotionsOutcome {
        match generate_motions(&input) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "motion generation failed");
                MotionsOutcome::failed(error.to_string())
            }
        }
    }

    fn failed(message: String) -> MotionsOutcome {
        MotionsOutcome::failed(message)
    }

    fn succeeded(output: &MotionsOutcome) -> bool {
        output.succeeded
    }
}

/// Samples every motion of the input snapshot.
pub fn generate_motions(input: &MotionsInput) -> Result<MotionsOutcome> {
    let graph = input.snapshot.decode()?;
    let mut outcome = MotionsOutcome {
        succeeded: true,
        ..MotionsOutcome::default()
    };
    for motion_id in graph.motions.keys() {
        let mut segments = Vec::new();
        let mut visiting = Vec::new();
        flatten(&graph, motion_id, &mut visiting, &mut segments, &mut outcome.messages);

        let frames = sample_times(&segments, input.frame_rate)
            .into_iter()
            .map(|time| {
                let parameters = sample(&graph, &segments, time);
                let bone_translations = input.rig.pose_translations(&parameters);
                MotionFrame {
                    time,
                    parameters,
                    bone_translations,
                }
            })
            .collect::<Vec<_>>();
        debug!(motion = %motion_id, frames = frames.len(), "motion sampled");
        outcome.motions.insert(motion_id.clone(), frames);
    }
    Ok(outcome)
}

/// Expands nested motions into one flat timeline. A motion that includes
/// itself, directly or not, is skipped at the point of recursion.
fn flatten(
    graph: &SkeletonGraph,
    motion_id: &str,
    visiting: &mut Vec<String>,
    segments: &mut Vec<(Segment, f64)>,
    messages: &mut Vec<String>,
) {
    let Some(motion) = graph.motions.get(motion_id) else {
        messages.push(format!("Unknown motion {motion_id}"));
        return;
    };
    if visiting.iter().any(|id| id == motion_id) {
        messages.push(format!("Motion {motion_id} includes itself"));
        return;
    }
    visiting.push(motion_id.to_string());
    for clip in &motion.clips {
        match &clip.kind {
            MotionClipKind::Pose(pose_id) => {
                segments.push((Segment::Pose(pose_id.clone()), clip.duration.max(0.0)));
            }
            MotionClipKind::Interpolation => {
                segments.push((Segment::Interpolation, clip.duration.max(0.0)));
            }
            MotionClipKind::Motion(nested) => flatten(graph, nested, visiting, segments, messages),
        }
    }
    visiting.pop();
}

fn sample_times(segments: &[(Segment, f64)], frame_rate: f64) -> Vec<f64> {
    let total: f64 = segments.iter().map(|(_, duration)| duration).sum();
    if total <= 0.0 || frame_rate <= 0.0 {
        return vec![0.0];
    }
    let count = (total * frame_rate).ceil() as usize + 1;
    (0..count)
        .map(|frame| (frame as f64 / frame_rate).min(total))
        .collect()
}

fn pose_parameters(graph: &SkeletonGraph, pose_id: &str) -> PoseParameters {
    graph
        .poses
        .get(pose_id)
        .map(|pose| pose.parameters.clone())
        .unwrap_or_default()
}

fn sample(graph: &SkeletonGraph, segments: &[(Segment, f64)], time: f64) -> PoseParameters {
    let mut start = 0.0;
    for (index, (segment, duration)) in segments.iter().enumerate() {
        let end = start + duration;
        if time < end || index + 1 == segments.len() {
            return match segment {
                Segment::Pose(pose_id) => pose_parameters(graph, pose_id),
                Segment::Interpolation => {
                    let pose_of = |(segment, _): &(Segment, f64)| match segment {
                        Segment::Pose(id) => Some(id.clone()),
                        Segment::Interpolation => None,
                    };
                    let previous = segments[..index].iter().rev().find_map(pose_of);
                    let next = segments[index + 1..].iter().find_map(pose_of);
                    let fraction = if *duration > 0.0 {
                        ((time - start) / duration).clamp(0.0, 1.0)
                    } else {
                        1.0
                    };
                    let from = previous.map(|id| pose_parameters(graph, &id)).unwrap_or_default();
                    let to = next.map(|id| pose_parameters(graph, &id)).unwrap_or_default();
                    lerp_parameters(&from, &to, fraction)
                }
            };
        }
        start = end;
    }
    PoseParameters::new()
}

/// Linear blend; a value missing on one side counts as zero.
fn lerp_parameters(from: &PoseParameters, to: &PoseParameters, t: f64) -> PoseParameters {
    let mut blended = PoseParameters::new();
    for bone in from.keys().chain(to.keys()) {
        let (a, b) = (from.get(bone), to.get(bone));
        let keys = a.into_iter().chain(b).flat_map(|values| values.keys());
        for key in keys {
            let value = |side: Option<&BTreeMap<String, f64>>| {
                side.and_then(|values| values.get(key)).copied().unwrap_or(0.0)
            };
            blended
                .entry(bone.clone())
                .or_default()
                .insert(key.clone(), value(a) + (value(b) - value(a)) * t);
        }
    }
    blended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::rig::Bone;
    use approx::assert_relative_eq;
    use skeleton_snapshot::{BoneMark, SnapshotBuilder};

    fn rig() -> Arc<Rig> {
        Arc::new(Rig {
            bones: vec![Bone {
                index: 0,
                name: "Spine".into(),
                part_id: "p".into(),
                from_node_id: "Spine".into(),
                to_node_id: "Head".into(),
                head: DVec3::ZERO,
                tail: DVec3::Y,
                parent: None,
                bone_mark: BoneMark::None,
            }],
            succeeded: true,
            ..Rig::default()
        })
    }

    fn run(snapshot: Snapshot) -> MotionsOutcome {
        MotionsStage::run(MotionsInput {
            rig: rig(),
            snapshot: Arc::new(snapshot),
            frame_rate: 10.0,
        })
    }

    #[test]
    fn test_held_pose_is_sampled_at_frame_rate() {
        let outcome = run(SnapshotBuilder::new()
            .pose_parameter("up", "Spine", "translateY", 0.5)
            .motion("hold", &[("up", 1.0)])
            .build());
        assert!(outcome.succeeded);
        let frames = &outcome.motions["hold"];
        assert_eq!(frames.len(), 11);
        assert_relative_eq!(frames[10].time, 1.0);
        assert!(frames
            .iter()
            .all(|frame| frame.bone_translations == vec![DVec3::new(0.0, 0.5, 0.0)]));
    }

    #[test]
    fn test_interpolation_blends_neighbor_poses() {
        let mut snapshot = SnapshotBuilder::new()
            .pose_parameter("low", "Spine", "translateY", 0.0)
            .pose_parameter("high", "Spine", "translateY", 1.0)
            .motion("raise", &[("low", 0.0), ("blend", 1.0), ("high", 0.5)])
            .build();
        // Middle clip becomes an interpolation
        let clip = &mut snapshot.motion_clips.get_mut("raise").unwrap()[1];
        clip.insert("linkDataType".into(), "InterpolationType".into());
        clip.remove("linkData");

        let outcome = run(snapshot);
        let frames = &outcome.motions["raise"];
        let at = |time: f64| {
            frames
                .iter()
                .find(|frame| (frame.time - time).abs() < 1e-9)
                .map(|frame| frame.parameters["Spine"]["translateY"])
                .unwrap()
        };
        assert_relative_eq!(at(0.0), 0.0);
        assert_relative_eq!(at(0.5), 0.5, epsilon = 1e-9);
        assert_relative_eq!(at(1.2), 1.0);
    }

    #[test]
    fn test_lerp_treats_missing_values_as_zero() {
        let mut from = PoseParameters::new();
        from.entry("a".into()).or_default().insert("x".into(), 2.0);
        let mut to = PoseParameters::new();
        to.entry("b".into()).or_default().insert("y".into(), 4.0);
        let blended = lerp_parameters(&from, &to, 0.5);
        assert_relative_eq!(blended["a"]["x"], 1.0);
        assert_relative_eq!(blended["b"]["y"], 2.0);
    }

    #[test]
    fn test_self_referencing_motion_is_reported() {
        let mut snapshot = SnapshotBuilder::new()
            .pose_parameter("up", "Spine", "translateY", 0.5)
            .motion("loop", &[("up", 1.0), ("loop", 1.0)])
            .build();
        let clip = &mut snapshot.motion_clips.get_mut("loop").unwrap()[1];
        clip.insert("linkDataType".into(), "motionId".into());

        let outcome = run(snapshot);
        assert!(outcome.messages.iter().any(|m| m.contains("includes itself")));
        assert_eq!(outcome.motions["loop"].len(), 11);
    }

    #[test]
    fn test_capture_uses_the_rigs_snapshot() {
        let rigged = Arc::new(
            SnapshotBuilder::new()
                .pose_parameter("up", "Spine", "translateY", 0.5)
                .motion("hold", &[("up", 1.0)])
                .build(),
        );
        let mut inputs = PipelineInputs::new(config::GenerationConfig::default());
        inputs.rig = Some(Arc::new(Rig {
            snapshot: Some(Arc::clone(&rigged)),
            ..(*rig()).clone()
        }));
        // A newer snapshot whose mesh has not reached the rig yet
        inputs.snapshot = Arc::new(SnapshotBuilder::new().motion("other", &[]).build());

        let input = MotionsStage.capture(&inputs).unwrap();
        assert!(Arc::ptr_eq(&input.snapshot, &rigged));
        let outcome = MotionsStage::run(input);
        assert!(outcome.motions.contains_key("hold"));
        assert!(!outcome.motions.contains_key("other"));
    }
}
