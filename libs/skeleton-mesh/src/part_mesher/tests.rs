use super::*;
use approx::assert_relative_eq;
use skeleton_snapshot::{Snapshot, SnapshotBuilder};

const SEGMENTS: usize = 8;

fn mesh(snapshot: Snapshot, part: &str) -> Option<PartMesh> {
    let graph = snapshot.decode().unwrap();
    PartMesher::new(&graph, &graph.parts[part], SEGMENTS).build()
}

fn tube(from: [f64; 3], to: [f64; 3]) -> SnapshotBuilder {
    SnapshotBuilder::new().tube_part("arm", from, to, 0.1)
}

/// Volume of a regular octagonal prism with circumradius 0.1.
fn octagon_prism_volume(length: f64) -> f64 {
    4.0 * 0.1 * 0.1 * std::f64::consts::FRAC_1_SQRT_2 * length
}

// =============================================================================
// SINGLE TUBES
// =============================================================================

#[test]
fn test_two_node_tube_is_closed() {
    let part = mesh(tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).build(), "arm").unwrap();
    assert_eq!(part.mesh.vertex_count(), 2 * SEGMENTS + 2);
    assert_eq!(part.mesh.triangle_count(), 4 * SEGMENTS);
    assert!(part.mesh.is_closed());
    assert_relative_eq!(part.mesh.volume(), octagon_prism_volume(1.0), epsilon = 1e-9);
    assert_eq!(part.shared_quad_edges.len(), SEGMENTS);
    assert_eq!(part.node_vertices.len(), part.mesh.vertex_count());
    assert!(part.node_vertices.iter().all(|(_, id)| id.starts_with("arm-n")));
}

#[test]
fn test_seam_exclusions_cover_all_vertices() {
    let part = mesh(tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).build(), "arm").unwrap();
    assert_eq!(part.seam_excluded_positions().len(), part.mesh.vertex_count());
}

#[test]
fn test_path_with_bends_is_closed() {
    let snapshot = SnapshotBuilder::new()
        .chain_part(
            "tail",
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.5, 0.8, 0.2], [1.2, 1.6, 0.4]],
            0.1,
            false,
        )
        .build();
    let part = mesh(snapshot, "tail").unwrap();
    assert_eq!(part.mesh.vertex_count(), 4 * SEGMENTS + 2);
    assert!(part.mesh.is_closed());
    assert!(part.mesh.volume() > 0.0);
}

#[test]
fn test_closed_loop_has_no_caps() {
    let snapshot = SnapshotBuilder::new()
        .chain_part(
            "ring",
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            0.1,
            true,
        )
        .build();
    let part = mesh(snapshot, "ring").unwrap();
    assert_eq!(part.mesh.vertex_count(), 4 * SEGMENTS);
    assert_eq!(part.mesh.triangle_count(), 4 * 2 * SEGMENTS);
    assert!(part.mesh.is_closed());
    assert_eq!(part.mesh.shell_count(), 1);
    assert!(part.mesh.volume() > 0.0);
}

#[test]
fn test_rounded_caps_add_volume() {
    let flat = mesh(tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).build(), "arm").unwrap();
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .part_attribute("arm", "rounded", "true")
        .build();
    let rounded = mesh(snapshot, "arm").unwrap();
    assert_eq!(rounded.mesh.vertex_count(), 4 * SEGMENTS + 2);
    assert!(rounded.mesh.is_closed());
    assert!(rounded.mesh.volume() > flat.mesh.volume());
    let bounds = rounded.mesh.bounding_box().unwrap();
    assert_relative_eq!(bounds.min.x, -0.1, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.x, 1.1, epsilon = 1e-12);
}

#[test]
fn test_chamfered_caps_are_closed() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .part_attribute("arm", "chamfered", "true")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert!(part.mesh.is_closed());
    let bounds = part.mesh.bounding_box().unwrap();
    assert_relative_eq!(bounds.max.x, 1.02, epsilon = 1e-12);
}

#[test]
fn test_deform_scales_cross_section() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .part_attribute("arm", "deformWidth", "2")
        .part_attribute("arm", "deformThickness", "0.5")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert!(part.mesh.is_closed());
    assert_relative_eq!(part.mesh.volume(), octagon_prism_volume(1.0), epsilon = 1e-9);
    let size = part.mesh.bounding_box().unwrap().size();
    assert!((size.y - size.z).abs() > 0.1);
}

#[test]
fn test_node_cut_face_is_resampled() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .node_attribute("arm-n1", "cutFace", "Quad")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert_eq!(part.mesh.vertex_count(), 2 * SEGMENTS + 2);
    assert!(part.mesh.is_closed());
}

#[test]
fn test_quad_cut_face_uses_four_sides() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .part_attribute("arm", "cutFace", "Quad")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert_eq!(part.mesh.vertex_count(), 10);
    assert_relative_eq!(part.mesh.volume(), 0.04, epsilon = 1e-9);
}

// =============================================================================
// DEGENERATE INPUT
// =============================================================================

#[test]
fn test_single_node_part_is_skipped() {
    let snapshot = SnapshotBuilder::new()
        .part("p")
        .node("n", "p", [0.0, 0.0, 0.0], 0.1)
        .build();
    assert!(mesh(snapshot, "p").is_none());
}

#[test]
fn test_zero_radius_is_skipped() {
    let snapshot = SnapshotBuilder::new()
        .tube_part("p", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0)
        .build();
    assert!(mesh(snapshot, "p").is_none());
}

#[test]
fn test_coincident_nodes_are_skipped() {
    let snapshot = SnapshotBuilder::new()
        .tube_part("p", [0.5, 0.5, 0.5], [0.5, 0.5, 0.5], 0.1)
        .build();
    assert!(mesh(snapshot, "p").is_none());
}

#[test]
fn test_self_loop_edge_is_skipped() {
    let snapshot = SnapshotBuilder::new()
        .tube_part("p", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
        .edge("loop", "p", "p-n0", "p-n0")
        .build();
    assert!(mesh(snapshot, "p").is_none());
}

#[test]
fn test_disconnected_part_is_skipped() {
    let snapshot = SnapshotBuilder::new()
        .tube_part("p", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
        .node("extra", "p", [3.0, 0.0, 0.0], 0.1)
        .build();
    assert!(mesh(snapshot, "p").is_none());
}

#[test]
fn test_duplicate_edges_are_ignored() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .edge("again", "arm", "arm-n1", "arm-n0")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert!(part.mesh.is_closed());
    assert_eq!(part.mesh.vertex_count(), 2 * SEGMENTS + 2);
}

// =============================================================================
// CHAINS AND JOINTS
// =============================================================================

fn star() -> SnapshotBuilder {
    SnapshotBuilder::new()
        .part("star")
        .node("c", "star", [0.0, 0.0, 0.0], 0.1)
        .node("a", "star", [1.0, 0.0, 0.0], 0.1)
        .node("b", "star", [-0.5, 0.8, 0.0], 0.1)
        .node("d", "star", [-0.5, -0.8, 0.0], 0.1)
        .edge("e1", "star", "c", "a")
        .edge("e2", "star", "c", "b")
        .edge("e3", "star", "c", "d")
}

#[test]
fn test_path_is_a_single_chain() {
    let snapshot = SnapshotBuilder::new()
        .chain_part("p", &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]], 0.1, false)
        .build();
    let graph = snapshot.decode().unwrap();
    let skeleton = PartSkeleton::extract(&graph, &graph.parts["p"], SEGMENTS).unwrap();
    let chains = skeleton.chains();
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].nodes.len(), 4);
    assert!(!chains[0].closed);
}

#[test]
fn test_branch_splits_into_chains() {
    let graph = star().build().decode().unwrap();
    let skeleton = PartSkeleton::extract(&graph, &graph.parts["star"], SEGMENTS).unwrap();
    assert!(skeleton.is_branched());
    let chains = skeleton.chains();
    assert_eq!(chains.len(), 3);
    assert!(chains.iter().all(|chain| chain.nodes.len() == 2));
}

#[test]
fn test_gridded_part_covers_every_branch() {
    let part = mesh(star().build(), "star").unwrap();
    assert!(!part.mesh.is_empty());
    assert!(part.mesh.volume() > 0.0);
    let bounds = part.mesh.bounding_box().unwrap();
    assert!(bounds.max.x >= 1.0 - 1e-9);
    assert!(bounds.min.x < -0.5);
    assert!(bounds.max.y > 0.8 && bounds.min.y < -0.8);
}

// =============================================================================
// MIRRORING
// =============================================================================

#[test]
fn test_mirrored_disjoint_part_has_two_shells() {
    let snapshot = tube([1.0, 0.0, 0.0], [2.0, 0.0, 0.0])
        .part_attribute("arm", "xMirrored", "true")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    assert_eq!(part.mesh.shell_count(), 2);
    assert!(part.mesh.is_closed());
    assert_relative_eq!(part.mesh.volume(), 2.0 * octagon_prism_volume(1.0), epsilon = 1e-9);
    assert_eq!(part.node_vertices.len(), part.mesh.vertex_count());
    assert_eq!(part.shared_quad_edges.len(), 2 * SEGMENTS);
}

#[test]
fn test_mirrored_crossing_part_is_unioned() {
    let single = mesh(tube([-0.3, 0.0, 0.0], [0.5, 0.5, 0.0]).build(), "arm").unwrap();
    let snapshot = tube([-0.3, 0.0, 0.0], [0.5, 0.5, 0.0])
        .part_attribute("arm", "xMirrored", "true")
        .build();
    let part = mesh(snapshot, "arm").unwrap();
    let volume = part.mesh.volume();
    assert!(volume > single.mesh.volume());
    assert!(volume < 2.0 * single.mesh.volume() - 1e-4);
}

#[test]
fn test_mirrored_x_keeps_orientation() {
    let part = mesh(tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).build(), "arm").unwrap();
    let mirrored = part.mirrored_x();
    assert_relative_eq!(mirrored.mesh.volume(), part.mesh.volume(), epsilon = 1e-12);
    assert_eq!(mirrored.shared_quad_edges.len(), part.shared_quad_edges.len());
}

#[test]
fn test_linked_profile_parts_are_listed() {
    let snapshot = tube([0.0, 0.0, 0.0], [1.0, 0.0, 0.0])
        .part_attribute("arm", "cutFace", "shape")
        .node_attribute("arm-n0", "cutFace", "other")
        .node_attribute("arm-n1", "cutFace", "shape")
        .build();
    let graph = snapshot.decode().unwrap();
    assert_eq!(linked_profile_parts(&graph, &graph.parts["arm"]), vec!["other", "shape"]);
}
