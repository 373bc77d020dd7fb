//! # Seam Welding
//!
//! Collapses short edges along the seams CSG leaves between parts. Only
//! edges shared by two triangles are candidates; the endpoint nearer the
//! triangle's apex is folded into the other one, so the longer edges of the
//! sliver survive.

use std::collections::{BTreeMap, HashMap, HashSet};

use config::constants::{WELD_CHAIN_LIMIT, WELD_MAX_ADJACENT_FACES};
use tracing::{debug, warn};

use crate::mesh::Mesh;
use crate::position_key::PositionKey;

/// Result of one welding pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeldResult {
    pub mesh: Mesh,
    /// Triangles removed because they collapsed
    pub affected: usize,
    /// Triangles dropped because their weld chain exceeded the limit
    pub broken_chains: usize,
}

/// Runs one welding pass.
///
/// `excluded` holds positions that must not move (vertices that came
/// straight from part skinning, as opposed to seams cut by CSG). Pass an
/// empty set to weld everywhere.
pub fn weld_seam(mesh: &Mesh, distance: f64, excluded: &HashSet<PositionKey>) -> WeldResult {
    let triangles = mesh.triangles();
    let weld_to = plan_welds(mesh, distance, excluded);

    let resolve = |vertex: u32| -> Option<u32> {
        let mut current = vertex;
        for _ in 0..WELD_CHAIN_LIMIT {
            match weld_to.get(&current) {
                Some(&next) => current = next,
                None => return Some(current),
            }
        }
        None
    };

    let mut welded = Mesh::with_capacity(mesh.vertex_count(), triangles.len());
    for &vertex in mesh.vertices() {
        welded.add_vertex(vertex);
    }
    let mut affected = 0;
    let mut broken_chains = 0;
    for &[a, b, c] in triangles {
        let (Some(a), Some(b), Some(c)) = (resolve(a), resolve(b), resolve(c)) else {
            broken_chains += 1;
            continue;
        };
        if a == b || b == c || c == a {
            affected += 1;
            continue;
        }
        welded.add_triangle(a, b, c);
    }
    welded.compact();

    if broken_chains > 0 {
        warn!(broken_chains, "weld chains exceeded the limit, triangles dropped");
    }
    debug!(
        welded_vertices = weld_to.len(),
        affected,
        before = triangles.len(),
        after = welded.triangle_count(),
        "seam weld pass"
    );
    WeldResult {
        mesh: welded,
        affected,
        broken_chains,
    }
}

/// Picks which vertex folds into which, one short shared edge per triangle
/// pair. A vertex with more than [`WELD_MAX_ADJACENT_FACES`] faces, one
/// already folded, or one that is already a fold target never moves.
fn plan_welds(mesh: &Mesh, distance: f64, excluded: &HashSet<PositionKey>) -> BTreeMap<u32, u32> {
    let triangles = mesh.triangles();
    let distance_squared = distance * distance;

    // Directed edge -> (triangle, apex)
    let mut edge_faces: HashMap<(u32, u32), (usize, u32)> = HashMap::with_capacity(triangles.len() * 3);
    let mut adjacent_faces: HashMap<u32, usize> = HashMap::new();
    for (face, &[a, b, c]) in triangles.iter().enumerate() {
        for (from, to, apex) in [(a, b, c), (b, c, a), (c, a, b)] {
            edge_faces.insert((from, to), (face, apex));
            *adjacent_faces.entry(from).or_insert(0) += 1;
        }
    }
    let movable: Vec<bool> = mesh
        .vertices()
        .iter()
        .map(|&p| !excluded.contains(&PositionKey::new(p)))
        .collect();

    let mut weld_to: BTreeMap<u32, u32> = BTreeMap::new();
    let mut targets: HashSet<u32> = HashSet::new();
    let mut processed: HashSet<usize> = HashSet::new();
    let can_move = |vertex: u32, weld_to: &BTreeMap<u32, u32>, targets: &HashSet<u32>| {
        adjacent_faces.get(&vertex).copied().unwrap_or(0) <= WELD_MAX_ADJACENT_FACES
            && !weld_to.contains_key(&vertex)
            && !targets.contains(&vertex)
    };

    for (face, &[a, b, c]) in triangles.iter().enumerate() {
        if processed.contains(&face) {
            continue;
        }
        for (first, second, apex) in [(a, b, c), (b, c, a), (c, a, b)] {
            if !movable[first as usize] || !movable[second as usize] {
                continue;
            }
            let (p_first, p_second) = (mesh.vertex(first), mesh.vertex(second));
            if p_first.distance_squared(p_second) >= distance_squared {
                continue;
            }
            let Some(&(opposite, _)) = edge_faces.get(&(second, first)) else {
                continue;
            };
            if opposite == face {
                continue;
            }
            let p_apex = mesh.vertex(apex);
            let (source, target) = if p_first.distance_squared(p_apex) < p_second.distance_squared(p_apex)
                && can_move(second, &weld_to, &targets)
            {
                (second, first)
            } else if can_move(first, &weld_to, &targets) {
                (first, second)
            } else {
                continue;
            };
            weld_to.insert(source, target);
            targets.insert(target);
            processed.insert(face);
            processed.insert(opposite);
            break;
        }
    }
    weld_to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::cube;
    use glam::DVec3;

    /// Two triangles sharing a short edge, both apexes far away.
    fn sliver() -> Mesh {
        Mesh::from_parts(
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.01, 0.0, 0.0),
                DVec3::new(0.005, 1.0, 0.0),
                DVec3::new(0.005, -1.0, 0.0),
            ],
            vec![[0, 1, 2], [1, 0, 3]],
        )
    }

    #[test]
    fn test_short_shared_edge_is_collapsed() {
        let result = weld_seam(&sliver(), 0.025, &HashSet::new());
        assert_eq!(result.affected, 2);
        assert_eq!(result.mesh.triangle_count(), 0);
    }

    #[test]
    fn test_excluded_positions_are_kept() {
        let mesh = sliver();
        let excluded = mesh.vertices().iter().copied().map(PositionKey::new).collect();
        let result = weld_seam(&mesh, 0.025, &excluded);
        assert_eq!(result.affected, 0);
        assert_eq!(result.mesh, mesh);
    }

    #[test]
    fn test_long_edges_are_untouched() {
        let mesh = cube(DVec3::ZERO, 1.0);
        let result = weld_seam(&mesh, 0.025, &HashSet::new());
        assert_eq!(result.affected, 0);
        assert_eq!(result.mesh.triangle_count(), 12);
        assert!(result.mesh.is_closed());
    }

    #[test]
    fn test_boundary_edge_is_not_welded() {
        let mesh = Mesh::from_parts(
            vec![DVec3::ZERO, DVec3::new(0.01, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        );
        assert_eq!(weld_seam(&mesh, 0.025, &HashSet::new()).affected, 0);
    }

    #[test]
    fn test_weld_never_adds_triangles() {
        let mut mesh = cube(DVec3::ZERO, 1.0);
        mesh.merge(&sliver());
        mesh.merge(&cube(DVec3::new(0.01, 0.0, 0.0), 0.005));
        let before = mesh.triangle_count();
        let mut current = mesh;
        for _ in 0..4 {
            let result = weld_seam(&current, 0.025, &HashSet::new());
            assert!(result.mesh.triangle_count() <= current.triangle_count());
            current = result.mesh;
        }
        assert!(current.triangle_count() < before);
    }

    /// Short edge 0-1 shared by faces 0 and 1, with apexes nearer vertex 0.
    fn short_edge_vertices() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.01, 0.0, 0.0),
            DVec3::new(-0.5, 1.0, 0.0),
            DVec3::new(-0.5, -1.0, 0.0),
        ]
    }

    #[test]
    fn test_apex_side_endpoint_moves() {
        let mesh = Mesh::from_parts(short_edge_vertices(), vec![[0, 1, 2], [1, 0, 3]]);
        let plan = plan_welds(&mesh, 0.025, &HashSet::new());
        assert_eq!(plan, BTreeMap::from([(1, 0)]));
    }

    #[test]
    fn test_high_valence_endpoint_stays() {
        let mut vertices = short_edge_vertices();
        vertices.extend([
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(1.0, -1.0, 1.0),
            DVec3::new(1.0, -1.0, -1.0),
            DVec3::new(1.0, 1.0, -1.0),
        ]);
        // Vertex 1 gets three more faces, five in all
        let mesh = Mesh::from_parts(
            vertices,
            vec![[0, 1, 2], [1, 0, 3], [1, 4, 5], [1, 5, 6], [1, 6, 7]],
        );
        let plan = plan_welds(&mesh, 0.025, &HashSet::new());
        assert_eq!(plan, BTreeMap::from([(0, 1)]));

        let result = weld_seam(&mesh, 0.025, &HashSet::new());
        assert_eq!(result.affected, 2);
        assert_eq!(result.mesh.triangle_count(), 3);
        assert!(result.mesh.vertices().contains(&DVec3::new(0.01, 0.0, 0.0)));
        assert!(!result.mesh.vertices().contains(&DVec3::ZERO));
    }

    #[test]
    fn test_weld_target_is_never_moved() {
        let mut vertices = short_edge_vertices();
        vertices.extend([
            DVec3::new(0.0, 0.01, 0.0),
            // Apex nearer vertex 4, so vertex 0 would be the one to move
            DVec3::new(1.0, 0.5, 0.0),
            DVec3::new(-1.0, 0.5, 0.0),
        ]);
        let mesh = Mesh::from_parts(
            vertices,
            vec![[0, 1, 2], [1, 0, 3], [0, 4, 5], [4, 0, 6]],
        );
        let plan = plan_welds(&mesh, 0.025, &HashSet::new());
        assert_eq!(plan, BTreeMap::from([(1, 0), (4, 0)]));
    }
}
