//! # Snapshot Builder
//!
//! Fluent construction of snapshots in raw canvas coordinates. Used by
//! fixtures, tests and any collaborator that assembles a skeleton without a
//! full document model.

use std::collections::BTreeMap;

use crate::model::CombineMode;
use crate::snapshot::{Attributes, Snapshot};

/// Builds a [`Snapshot`] entity by entity.
///
/// Coordinates passed to the builder are raw canvas values; decoding turns
/// them into `(x - originX, originY - y, originZ - z)`.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
    root_children: Vec<String>,
}

impl SnapshotBuilder {
    /// Starts an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the canvas origin.
    pub fn canvas_origin(mut self, x: f64, y: f64, z: f64) -> Self {
        self.snapshot.canvas.insert("originX".into(), x.to_string());
        self.snapshot.canvas.insert("originY".into(), y.to_string());
        self.snapshot.canvas.insert("originZ".into(), z.to_string());
        self
    }

    /// Adds a part with default attributes.
    pub fn part(mut self, id: &str) -> Self {
        self.snapshot.parts.insert(id.to_string(), entity(id, &[]));
        self
    }

    /// Sets one attribute of an existing (or new) part.
    pub fn part_attribute(mut self, id: &str, key: &str, value: &str) -> Self {
        self.snapshot
            .parts
            .entry(id.to_string())
            .or_insert_with(|| entity(id, &[]))
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a node.
    pub fn node(mut self, id: &str, part_id: &str, position: [f64; 3], radius: f64) -> Self {
        self.snapshot.nodes.insert(
            id.to_string(),
            entity(
                id,
                &[
                    ("partId", part_id.to_string()),
                    ("x", position[0].to_string()),
                    ("y", position[1].to_string()),
                    ("z", position[2].to_string()),
                    ("radius", radius.to_string()),
                ],
            ),
        );
        self
    }

    /// Sets one attribute of an existing node.
    pub fn node_attribute(mut self, id: &str, key: &str, value: &str) -> Self {
        if let Some(node) = self.snapshot.nodes.get_mut(id) {
            node.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Adds an edge.
    pub fn edge(mut self, id: &str, part_id: &str, from: &str, to: &str) -> Self {
        self.snapshot.edges.insert(
            id.to_string(),
            entity(
                id,
                &[
                    ("partId", part_id.to_string()),
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                ],
            ),
        );
        self
    }

    /// Adds a part made of a single two-node segment.
    ///
    /// Nodes are named `{part}-n0`, `{part}-n1`; the edge `{part}-e0`.
    pub fn tube_part(self, part_id: &str, from: [f64; 3], to: [f64; 3], radius: f64) -> Self {
        self.chain_part(part_id, &[from, to], radius, false)
    }

    /// Adds a part whose nodes are connected in order, optionally closing
    /// the chain into a loop.
    pub fn chain_part(mut self, part_id: &str, points: &[[f64; 3]], radius: f64, closed: bool) -> Self {
        self = self.part(part_id);
        for (i, point) in points.iter().enumerate() {
            self = self.node(&format!("{part_id}-n{i}"), part_id, *point, radius);
        }
        for i in 1..points.len() {
            self = self.edge(
                &format!("{part_id}-e{}", i - 1),
                part_id,
                &format!("{part_id}-n{}", i - 1),
                &format!("{part_id}-n{i}"),
            );
        }
        if closed && points.len() > 2 {
            let last = points.len() - 1;
            self = self.edge(
                &format!("{part_id}-e{last}"),
                part_id,
                &format!("{part_id}-n{last}"),
                &format!("{part_id}-n0"),
            );
        }
        self
    }

    /// Adds a leaf component wrapping one part.
    pub fn leaf_component(mut self, id: &str, part_id: &str, mode: CombineMode) -> Self {
        self.snapshot.components.insert(
            id.to_string(),
            entity(
                id,
                &[
                    ("linkData", part_id.to_string()),
                    ("linkDataType", "partId".to_string()),
                    ("combineMode", combine_mode_name(mode).to_string()),
                ],
            ),
        );
        self
    }

    /// Adds a group component with ordered children.
    pub fn group_component(mut self, id: &str, children: &[&str], mode: CombineMode) -> Self {
        self.snapshot.components.insert(
            id.to_string(),
            entity(
                id,
                &[
                    ("children", children.join(",")),
                    ("combineMode", combine_mode_name(mode).to_string()),
                ],
            ),
        );
        self
    }

    /// Sets the root component's children.
    pub fn root_children(mut self, children: &[&str]) -> Self {
        self.root_children = children.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Adds a material with a color.
    pub fn material(mut self, id: &str, color: &str) -> Self {
        self.snapshot
            .materials
            .insert(id.to_string(), entity(id, &[("color", color.to_string())]));
        self
    }

    /// Adds or extends a pose with one bone parameter.
    pub fn pose_parameter(mut self, pose_id: &str, bone: &str, key: &str, value: f64) -> Self {
        self.snapshot
            .poses
            .entry(pose_id.to_string())
            .or_insert_with(|| entity(pose_id, &[]));
        self.snapshot
            .pose_parameters
            .entry(pose_id.to_string())
            .or_default()
            .entry(bone.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a motion holding the given poses for the given durations.
    pub fn motion(mut self, id: &str, clips: &[(&str, f64)]) -> Self {
        self.snapshot
            .motions
            .insert(id.to_string(), entity(id, &[]));
        let clips = clips
            .iter()
            .map(|(pose_id, duration)| {
                let mut clip = Attributes::new();
                clip.insert("linkDataType".into(), "poseId".into());
                clip.insert("linkData".into(), pose_id.to_string());
                clip.insert("duration".into(), duration.to_string());
                clip
            })
            .collect();
        self.snapshot.motion_clips.insert(id.to_string(), clips);
        self
    }

    /// Finishes the snapshot.
    pub fn build(mut self) -> Snapshot {
        if !self.root_children.is_empty() {
            self.snapshot
                .root_component
                .insert("children".into(), self.root_children.join(","));
        }
        self.snapshot
    }
}

fn entity(id: &str, attributes: &[(&str, String)]) -> Attributes {
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), id.to_string());
    for (key, value) in attributes {
        map.insert(key.to_string(), value.clone());
    }
    map
}

fn combine_mode_name(mode: CombineMode) -> &'static str {
    match mode {
        CombineMode::Normal => "Normal",
        CombineMode::Inversion => "Inversion",
        CombineMode::Uncombined => "Uncombined",
    }
}
