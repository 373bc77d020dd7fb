//! # Provenance
//!
//! Maps generated geometry back to the skeleton nodes it came from. Exact
//! matches come from the positions recorded while skinning; everything the
//! CSG kernel or the hole filler created falls back to the nearest node
//! sphere.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;

use crate::outcome::{NodeSource, OutcomeNode};
use crate::part_mesher::PartMesh;
use crate::position_key::PositionKey;

/// Node whose sphere surface is closest to `point`.
pub fn nearest_node(nodes: &[OutcomeNode], point: DVec3) -> Option<NodeSource> {
    nodes
        .iter()
        .map(|node| (node, point.distance(node.origin) - node.radius))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(node, _)| node.source())
}

/// Source node of every vertex.
pub fn resolve_vertex_sources(
    vertices: &[DVec3],
    part_meshes: &BTreeMap<String, PartMesh>,
    nodes: &[OutcomeNode],
) -> Vec<Option<NodeSource>> {
    let mut recorded: HashMap<PositionKey, NodeSource> = HashMap::new();
    for (part_id, part) in part_meshes {
        for (position, node_id) in &part.node_vertices {
            recorded
                .entry(PositionKey::new(*position))
                .or_insert_with(|| NodeSource::new(part_id, node_id));
        }
    }
    vertices
        .iter()
        .map(|&vertex| {
            recorded
                .get(&PositionKey::new(vertex))
                .cloned()
                .or_else(|| nearest_node(nodes, vertex))
        })
        .collect()
}

/// Source node of every triangle: the source shared by at least two of its
/// corners, otherwise the node nearest to its centroid.
pub fn resolve_triangle_sources(
    vertices: &[DVec3],
    triangles: &[[usize; 3]],
    vertex_sources: &[Option<NodeSource>],
    nodes: &[OutcomeNode],
) -> Vec<Option<NodeSource>> {
    triangles
        .iter()
        .map(|triangle| {
            let corners: Vec<&NodeSource> = triangle
                .iter()
                .filter_map(|&v| vertex_sources.get(v).and_then(Option::as_ref))
                .collect();
            let majority = corners
                .iter()
                .find(|source| corners.iter().filter(|other| other == source).count() >= 2);
            match majority {
                Some(source) => Some((*source).clone()),
                None => {
                    let centroid = triangle.iter().map(|&v| vertices[v]).sum::<DVec3>() / 3.0;
                    nearest_node(nodes, centroid)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skeleton_snapshot::BoneMark;

    fn node(part: &str, id: &str, origin: DVec3, radius: f64) -> OutcomeNode {
        OutcomeNode {
            part_id: part.into(),
            node_id: id.into(),
            origin,
            radius,
            color: [1.0; 4],
            bone_mark: BoneMark::None,
            mirror_from_part_id: None,
        }
    }

    #[test]
    fn test_nearest_node_accounts_for_radius() {
        let nodes = [
            node("p", "small", DVec3::ZERO, 0.1),
            node("p", "large", DVec3::new(2.0, 0.0, 0.0), 1.5),
        ];
        let source = nearest_node(&nodes, DVec3::new(0.8, 0.0, 0.0)).unwrap();
        assert_eq!(source.node_id, "large");
        assert!(nearest_node(&[], DVec3::ZERO).is_none());
    }

    #[test]
    fn test_recorded_positions_win() {
        let mut part = PartMesh::default();
        part.add_vertex(DVec3::new(1.0, 0.0, 0.0), "n1");
        let parts = BTreeMap::from([("p".to_string(), part)]);
        let nodes = [node("p", "n0", DVec3::new(1.0, 0.0, 0.0), 0.1)];
        let sources = resolve_vertex_sources(&[DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO], &parts, &nodes);
        assert_eq!(sources[0], Some(NodeSource::new("p", "n1")));
        assert_eq!(sources[1], Some(NodeSource::new("p", "n0")));
    }

    #[test]
    fn test_triangle_majority_vote() {
        let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let sources = vec![
            Some(NodeSource::new("p", "a")),
            Some(NodeSource::new("p", "b")),
            Some(NodeSource::new("p", "b")),
        ];
        let nodes = [node("p", "a", DVec3::ZERO, 0.1)];
        let resolved = resolve_triangle_sources(&vertices, &[[0, 1, 2]], &sources, &nodes);
        assert_eq!(resolved[0], Some(NodeSource::new("p", "b")));
    }

    #[test]
    fn test_triangle_without_majority_uses_nearest() {
        let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let sources = vec![Some(NodeSource::new("p", "a")), Some(NodeSource::new("p", "b")), None];
        let nodes = [
            node("p", "a", DVec3::new(5.0, 0.0, 0.0), 0.1),
            node("p", "c", DVec3::new(0.3, 0.3, 0.0), 0.1),
        ];
        let resolved = resolve_triangle_sources(&vertices, &[[0, 1, 2]], &sources, &nodes);
        assert_eq!(resolved[0], Some(NodeSource::new("p", "c")));
    }
}
