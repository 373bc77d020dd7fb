//! # Post-process
//!
//! Derives the per-triangle attributes renderers and downstream stages read
//! from a generated [`Outcome`]: face normals, angle-thresholded smooth corner
//! normals, the source node of each triangle and its color.

use config::constants::DEFAULT_COLOR;
use config::GenerationConfig;
use tracing::debug;

use crate::normals::{smooth_triangle_vertex_normals, triangle_normals};
use crate::outcome::Outcome;
use crate::provenance::resolve_triangle_sources;

/// Fills the derived triangle attributes of `outcome` in place.
pub fn apply(outcome: &mut Outcome, config: &GenerationConfig) {
    outcome.triangle_normals = triangle_normals(&outcome.vertices, &outcome.triangles);
    outcome.triangle_vertex_normals = smooth_triangle_vertex_normals(
        &outcome.vertices,
        &outcome.triangles,
        &outcome.triangle_normals,
        config.smooth_normal_angle,
    );
    outcome.triangle_sources = resolve_triangle_sources(
        &outcome.vertices,
        &outcome.triangles,
        &outcome.vertex_sources,
        &outcome.nodes,
    );
    outcome.triangle_colors = outcome
        .triangle_sources
        .iter()
        .map(|source| {
            source
                .as_ref()
                .and_then(|source| outcome.node(source))
                .map_or(DEFAULT_COLOR, |node| node.color)
        })
        .collect();
    debug!(
        triangles = outcome.triangles.len(),
        "Post-processed outcome"
    );
}

/// Post-processed copy of `outcome`.
pub fn postprocess(outcome: &Outcome, config: &GenerationConfig) -> Outcome {
    let mut processed = outcome.clone();
    apply(&mut processed, config);
    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{NodeSource, OutcomeNode};
    use approx::assert_relative_eq;
    use glam::DVec3;
    use skeleton_snapshot::BoneMark;

    fn quad_outcome() -> Outcome {
        let red = [1.0, 0.0, 0.0, 1.0];
        Outcome {
            vertices: vec![DVec3::ZERO, DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
            vertex_sources: vec![
                Some(NodeSource::new("p", "a")),
                Some(NodeSource::new("p", "a")),
                Some(NodeSource::new("p", "a")),
                None,
            ],
            nodes: vec![OutcomeNode {
                part_id: "p".into(),
                node_id: "a".into(),
                origin: DVec3::ZERO,
                radius: 0.1,
                color: red,
                bone_mark: BoneMark::None,
                mirror_from_part_id: None,
            }],
            succeeded: true,
            ..Outcome::default()
        }
    }

    #[test]
    fn test_flat_quad_normals() {
        let processed = postprocess(&quad_outcome(), &GenerationConfig::default());
        assert_eq!(processed.triangle_normals, vec![DVec3::Z, DVec3::Z]);
        for corners in &processed.triangle_vertex_normals {
            for normal in corners {
                assert_relative_eq!(normal.z, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_colors_follow_source_nodes() {
        let processed = postprocess(&quad_outcome(), &GenerationConfig::default());
        assert_eq!(processed.triangle_sources.len(), 2);
        assert!(processed
            .triangle_sources
            .iter()
            .all(|source| source.as_ref() == Some(&NodeSource::new("p", "a"))));
        assert_eq!(processed.triangle_colors, vec![[1.0, 0.0, 0.0, 1.0]; 2]);
    }

    #[test]
    fn test_unknown_source_uses_default_color() {
        let mut outcome = quad_outcome();
        outcome.nodes.clear();
        outcome.vertex_sources = vec![None; 4];
        apply(&mut outcome, &GenerationConfig::default());
        assert!(outcome.triangle_sources.iter().all(Option::is_none));
        assert_eq!(outcome.triangle_colors, vec![DEFAULT_COLOR; 2]);
    }
}
