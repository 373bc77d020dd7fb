//! # Quad Recovery
//!
//! Merges triangle pairs back into the quads the part sweep produced. The
//! sweep records each quad diagonal by position, so the lookup survives the
//! re-indexing done by CSG and welding.

use std::collections::{BTreeMap, HashSet};

use crate::mesh::Mesh;
use crate::position_key::{edge_key, EdgeKey};

/// Faces after quad recovery: untouched triangles first, then the quads.
///
/// Quads are ordered `[apex of T1, a, apex of T2, b]` where `a -> b` is the
/// shared diagonal as it runs in T1, which keeps the triangles' winding.
/// Vertex indices refer to `mesh` unchanged.
pub fn quadify(mesh: &Mesh, shared_edges: &HashSet<EdgeKey>) -> Vec<Vec<usize>> {
    let triangles = mesh.triangles();
    let mut edge_faces: BTreeMap<(u32, u32), (usize, u32)> = BTreeMap::new();
    for (face, &[a, b, c]) in triangles.iter().enumerate() {
        edge_faces.insert((a, b), (face, c));
        edge_faces.insert((b, c), (face, a));
        edge_faces.insert((c, a), (face, b));
    }

    let mut merged = vec![false; triangles.len()];
    let mut quads = Vec::new();
    for (&(a, b), &(face, apex)) in &edge_faces {
        if merged[face] || !shared_edges.contains(&edge_key(mesh.vertex(a), mesh.vertex(b))) {
            continue;
        }
        let Some(&(opposite, opposite_apex)) = edge_faces.get(&(b, a)) else {
            continue;
        };
        if opposite == face || merged[opposite] {
            continue;
        }
        merged[face] = true;
        merged[opposite] = true;
        quads.push(vec![apex as usize, a as usize, opposite_apex as usize, b as usize]);
    }

    triangles
        .iter()
        .zip(&merged)
        .filter(|(_, &merged)| !merged)
        .map(|(triangle, _)| triangle.iter().map(|&i| i as usize).collect())
        .chain(quads)
        .collect()
}
