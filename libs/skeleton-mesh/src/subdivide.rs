//! # Subdivision
//!
//! One refinement step for parts flagged `subdived`. Closed 2-manifolds get
//! a Catmull–Clark step; open meshes whose edges have at most two faces get
//! a midpoint (1 → 4) split; anything else is refused.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;
use crate::position_key::{edge_key, EdgeKey};

/// Which scheme [`subdivide`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivisionMethod {
    CatmullClark,
    Midpoint,
}

/// A subdivided mesh and the diagonals of the quads it triangulated.
#[derive(Debug, Clone)]
pub struct Subdivided {
    pub mesh: Mesh,
    pub quad_edges: HashSet<EdgeKey>,
    pub method: SubdivisionMethod,
}

/// Subdivides once, choosing the scheme from the mesh's topology.
///
/// # Errors
///
/// Returns [`MeshError::ValidationFailed`] if an edge is shared by more
/// than two triangles.
pub fn subdivide(mesh: &Mesh) -> Result<Subdivided> {
    let mut faces_per_edge: HashMap<(u32, u32), usize> = HashMap::new();
    for (&(a, b), &count) in &mesh.directed_edge_counts() {
        *faces_per_edge.entry((a.min(b), a.max(b))).or_insert(0) += count;
    }
    if faces_per_edge.values().any(|&count| count > 2) {
        return Err(MeshError::validation("edge shared by more than two triangles"));
    }

    let result = if mesh.is_closed() {
        catmull_clark(mesh)
    } else {
        midpoint(mesh)
    };
    debug!(
        method = ?result.method,
        before = mesh.triangle_count(),
        after = result.mesh.triangle_count(),
        "subdivided"
    );
    Ok(result)
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

fn catmull_clark(mesh: &Mesh) -> Subdivided {
    let triangles = mesh.triangles();
    let face_points: Vec<DVec3> = (0..triangles.len())
        .map(|i| mesh.triangle_positions(i).iter().sum::<DVec3>() / 3.0)
        .collect();

    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    let mut vertex_faces: Vec<Vec<usize>> = vec![Vec::new(); mesh.vertex_count()];
    let mut vertex_edges: Vec<Vec<(u32, u32)>> = vec![Vec::new(); mesh.vertex_count()];
    for (face, &[a, b, c]) in triangles.iter().enumerate() {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            let key = undirected(from, to);
            let faces = edge_faces.entry(key).or_default();
            if faces.is_empty() {
                vertex_edges[from as usize].push(key);
                vertex_edges[to as usize].push(key);
            }
            faces.push(face);
            vertex_faces[from as usize].push(face);
        }
    }

    let mut result = Mesh::with_capacity(
        mesh.vertex_count() + edge_faces.len() + triangles.len(),
        triangles.len() * 6,
    );
    for (index, &position) in mesh.vertices().iter().enumerate() {
        let faces = &vertex_faces[index];
        let edges = &vertex_edges[index];
        let n = edges.len() as f64;
        if faces.is_empty() || edges.is_empty() {
            result.add_vertex(position);
            continue;
        }
        let face_average = faces.iter().map(|&f| face_points[f]).sum::<DVec3>() / faces.len() as f64;
        let edge_average = edges
            .iter()
            .map(|&(a, b)| (mesh.vertex(a) + mesh.vertex(b)) * 0.5)
            .sum::<DVec3>()
            / n;
        result.add_vertex((face_average + edge_average * 2.0 + position * (n - 3.0)) / n);
    }

    let mut edge_points: HashMap<(u32, u32), u32> = HashMap::with_capacity(edge_faces.len());
    let mut sorted_edges: Vec<_> = edge_faces.iter().collect();
    sorted_edges.sort_unstable_by_key(|(key, _)| **key);
    for (&(a, b), faces) in sorted_edges {
        let face_sum: DVec3 = faces.iter().map(|&f| face_points[f]).sum();
        let point = (mesh.vertex(a) + mesh.vertex(b) + face_sum) / (2.0 + faces.len() as f64);
        edge_points.insert((a, b), result.add_vertex(point));
    }

    let mut quad_edges = HashSet::new();
    for (face, &[a, b, c]) in triangles.iter().enumerate() {
        let center = result.add_vertex(face_points[face]);
        let edge = |x: u32, y: u32| edge_points[&undirected(x, y)];
        for (previous, corner, next) in [(c, a, b), (a, b, c), (b, c, a)] {
            let (to_next, from_previous) = (edge(corner, next), edge(previous, corner));
            result.add_triangle(corner, to_next, center);
            result.add_triangle(corner, center, from_previous);
            quad_edges.insert(edge_key(result.vertex(corner), result.vertex(center)));
        }
    }

    Subdivided {
        mesh: result,
        quad_edges,
        method: SubdivisionMethod::CatmullClark,
    }
}

fn midpoint(mesh: &Mesh) -> Subdivided {
    let mut result = Mesh::with_capacity(mesh.vertex_count() * 2, mesh.triangle_count() * 4);
    for &position in mesh.vertices() {
        result.add_vertex(position);
    }
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut split = |result: &mut Mesh, a: u32, b: u32| -> u32 {
        *midpoints
            .entry(undirected(a, b))
            .or_insert_with(|| result.add_vertex((mesh.vertex(a) + mesh.vertex(b)) * 0.5))
    };
    for &[a, b, c] in mesh.triangles() {
        let ab = split(&mut result, a, b);
        let bc = split(&mut result, b, c);
        let ca = split(&mut result, c, a);
        result.add_triangle(a, ab, ca);
        result.add_triangle(ab, b, bc);
        result.add_triangle(ca, bc, c);
        result.add_triangle(ab, bc, ca);
    }
    Subdivided {
        mesh: result,
        quad_edges: HashSet::new(),
        method: SubdivisionMethod::Midpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::cube;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_mesh_uses_catmull_clark() {
        let mesh = cube(DVec3::ZERO, 1.0);
        let result = subdivide(&mesh).unwrap();
        assert_eq!(result.method, SubdivisionMethod::CatmullClark);
        assert_eq!(result.mesh.vertex_count(), 8 + 18 + 12);
        assert_eq!(result.mesh.triangle_count(), 12 * 6);
        assert_eq!(result.quad_edges.len(), 36);
        assert!(result.mesh.is_closed());
        let volume = result.mesh.volume();
        assert!(volume > 0.0 && volume < 8.0);
    }

    #[test]
    fn test_open_mesh_uses_midpoint() {
        let (vertices, mut triangles) = cube(DVec3::ZERO, 1.0).into_parts();
        triangles.pop();
        let mesh = Mesh::from_parts(vertices, triangles);
        let result = subdivide(&mesh).unwrap();
        assert_eq!(result.method, SubdivisionMethod::Midpoint);
        assert_eq!(result.mesh.triangle_count(), 11 * 4);
        assert_relative_eq!(result.mesh.surface_area(), mesh.surface_area(), epsilon = 1e-12);
        assert!(result.quad_edges.is_empty());
    }

    #[test]
    fn test_non_manifold_edge_is_refused() {
        let mesh = Mesh::from_parts(
            vec![
                DVec3::ZERO,
                DVec3::X,
                DVec3::Y,
                DVec3::Z,
                DVec3::new(0.0, -1.0, 0.0),
            ],
            vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        );
        assert!(matches!(subdivide(&mesh), Err(MeshError::ValidationFailed { .. })));
    }
}
