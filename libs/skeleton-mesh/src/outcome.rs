//! # Outcome
//!
//! The generated result handed to rendering, export and downstream stages.
//! An outcome is never edited after publication; every regeneration builds
//! a new one.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use skeleton_snapshot::{BoneMark, Snapshot};

use crate::mesh::Mesh;

/// The skeleton node a vertex or triangle was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeSource {
    pub part_id: String,
    pub node_id: String,
}

impl NodeSource {
    pub fn new(part_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            node_id: node_id.into(),
        }
    }
}

/// A skeleton node as seen by the stages after mesh generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeNode {
    pub part_id: String,
    pub node_id: String,
    pub origin: DVec3,
    pub radius: f64,
    pub color: [f32; 4],
    pub bone_mark: BoneMark,
    /// Set on the mirrored copies of an `xMirrored` part's nodes
    pub mirror_from_part_id: Option<String>,
}

impl OutcomeNode {
    pub fn source(&self) -> NodeSource {
        NodeSource::new(&self.part_id, &self.node_id)
    }

    pub fn is_mirror(&self) -> bool {
        self.mirror_from_part_id.is_some()
    }
}

/// An edge between two outcome nodes of the same part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEdge {
    pub part_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
}

/// Area of the texture atlas reserved for one part, in `[0, 1]` UV space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UvRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl UvRect {
    /// The whole atlas.
    pub const FULL: UvRect = UvRect {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Maps a `[0, 1]²` coordinate into the rect.
    pub fn map(&self, local: DVec2) -> DVec2 {
        DVec2::new(self.left + local.x * self.width, self.top + local.y * self.height)
    }

    pub fn contains(&self, uv: DVec2) -> bool {
        uv.x >= self.left
            && uv.x <= self.left + self.width
            && uv.y >= self.top
            && uv.y <= self.top + self.height
    }
}

/// Result of one mesh generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[usize; 3]>,
    /// Faces after quad recovery, plus the raw faces of rejected parts
    pub triangle_and_quads: Vec<Vec<usize>>,
    pub vertex_sources: Vec<Option<NodeSource>>,
    pub nodes: Vec<OutcomeNode>,
    pub edges: Vec<OutcomeEdge>,
    pub triangle_normals: Vec<DVec3>,
    pub triangle_colors: Vec<[f32; 4]>,
    pub triangle_sources: Vec<Option<NodeSource>>,
    pub triangle_vertex_normals: Vec<[DVec3; 3]>,
    pub triangle_uvs: Vec<[DVec2; 3]>,
    pub part_uv_rects: BTreeMap<String, UvRect>,
    pub succeeded: bool,
    pub messages: Vec<String>,
    pub error_count: usize,
    /// Snapshot this outcome was generated from
    #[serde(skip)]
    pub snapshot: Option<Arc<Snapshot>>,
}

impl Outcome {
    /// An empty, failed outcome carrying one message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            messages: vec![message.into()],
            error_count: 1,
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// The triangle surface as a [`Mesh`].
    pub fn mesh(&self) -> Mesh {
        Mesh::from_parts(
            self.vertices.clone(),
            self.triangles
                .iter()
                .map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
                .collect(),
        )
    }

    /// Enclosed volume of the triangle surface.
    pub fn volume(&self) -> f64 {
        self.mesh().volume()
    }

    /// Looks up the node a source refers to (the original, not a mirror).
    pub fn node(&self, source: &NodeSource) -> Option<&OutcomeNode> {
        self.nodes.iter().find(|node| {
            !node.is_mirror() && node.part_id == source.part_id && node.node_id == source.node_id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_reports_message() {
        let outcome = Outcome::failed("decode failed");
        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.messages, vec!["decode failed".to_string()]);
        assert!(outcome.mesh().is_empty());
    }

    #[test]
    fn test_uv_rect_maps_into_itself() {
        let rect = UvRect {
            left: 0.5,
            top: 0.25,
            width: 0.5,
            height: 0.25,
        };
        let uv = rect.map(DVec2::new(0.5, 1.0));
        assert_eq!(uv, DVec2::new(0.75, 0.5));
        assert!(rect.contains(uv));
        assert!(!rect.contains(DVec2::new(0.1, 0.1)));
    }
}
