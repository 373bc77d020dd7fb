//! # Output Assembly and Repair
//!
//! Turns clipped polygons back into an indexed mesh and closes the cracks
//! BSP splitting leaves behind: a vertex created on one side of an edge has
//! no counterpart on the other side (a T-junction).

use std::collections::HashMap;

use config::constants::EPSILON;
use glam::DVec3;

use super::polygon::Polygon;
use crate::mesh::Mesh;

/// Distance below which a vertex counts as lying on an edge.
const T_JUNCTION_TOLERANCE: f64 = 1e-6;

/// Repair passes; each pass splits every triangle at most once.
const T_JUNCTION_MAX_PASSES: usize = 8;

/// Fan-triangulates polygons, sharing bit-identical positions.
pub fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let vertex_estimate = polygons.iter().map(|p| p.vertices().len()).sum::<usize>();
    let mut mesh = Mesh::with_capacity(vertex_estimate / 2, vertex_estimate);
    let mut index_of: HashMap<[u64; 3], u32> = HashMap::with_capacity(vertex_estimate / 2);

    for polygon in polygons {
        let indices: Vec<u32> = polygon
            .vertices()
            .iter()
            .map(|vertex| {
                // Adding zero folds -0.0 into 0.0 so both hash alike.
                let position = vertex.position + DVec3::ZERO;
                *index_of
                    .entry(position.to_array().map(f64::to_bits))
                    .or_insert_with(|| mesh.add_vertex(position))
            })
            .collect();

        for i in 1..indices.len().saturating_sub(1) {
            let triangle = [indices[0], indices[i], indices[i + 1]];
            if triangle[0] != triangle[1] && triangle[1] != triangle[2] && triangle[0] != triangle[2] {
                mesh.add_triangle(triangle[0], triangle[1], triangle[2]);
            }
        }
    }

    mesh
}

/// Splits triangles whose boundary edges pass through other boundary
/// vertices. Returns the number of triangles split.
pub fn repair_t_junctions(mesh: &mut Mesh) -> usize {
    let mut total = 0;

    for _ in 0..T_JUNCTION_MAX_PASSES {
        let boundary = mesh.boundary_edges();
        if boundary.is_empty() {
            break;
        }

        let mut boundary_vertices: Vec<u32> =
            boundary.iter().flat_map(|&(a, b)| [a, b]).collect();
        boundary_vertices.sort_unstable();
        boundary_vertices.dedup();

        let mut owner: HashMap<(u32, u32), usize> = HashMap::new();
        for (index, &[a, b, c]) in mesh.triangles().iter().enumerate() {
            for edge in [(a, b), (b, c), (c, a)] {
                owner.entry(edge).or_insert(index);
            }
        }

        let mut replaced: HashMap<usize, Vec<[u32; 3]>> = HashMap::new();
        for &(a, b) in &boundary {
            let Some(&triangle_index) = owner.get(&(a, b)) else {
                continue;
            };
            if replaced.contains_key(&triangle_index) {
                continue;
            }

            let (start, end) = (mesh.vertex(a), mesh.vertex(b));
            let direction = end - start;
            let length = direction.length();
            if length < EPSILON {
                continue;
            }
            let margin = T_JUNCTION_TOLERANCE / length;

            let mut on_edge: Vec<(f64, u32)> = boundary_vertices
                .iter()
                .filter(|&&v| v != a && v != b)
                .filter_map(|&v| {
                    let point = mesh.vertex(v);
                    let t = (point - start).dot(direction) / (length * length);
                    if t <= margin || t >= 1.0 - margin {
                        return None;
                    }
                    let distance = (start + direction * t).distance(point);
                    (distance < T_JUNCTION_TOLERANCE).then_some((t, v))
                })
                .collect();
            if on_edge.is_empty() {
                continue;
            }
            on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));

            let corners = mesh.triangles()[triangle_index];
            let Some(&apex) = corners.iter().find(|&&v| v != a && v != b) else {
                continue;
            };
            let chain: Vec<u32> = std::iter::once(a)
                .chain(on_edge.iter().map(|&(_, v)| v))
                .chain(std::iter::once(b))
                .collect();
            let fan = chain.windows(2).map(|w| [w[0], w[1], apex]).collect();
            replaced.insert(triangle_index, fan);
        }

        if replaced.is_empty() {
            break;
        }
        total += replaced.len();

        let (vertices, triangles) = std::mem::take(mesh).into_parts();
        let mut repaired = Vec::with_capacity(triangles.len() + replaced.len() * 2);
        for (index, triangle) in triangles.into_iter().enumerate() {
            match replaced.remove(&index) {
                Some(fan) => repaired.extend(fan),
                None => repaired.push(triangle),
            }
        }
        *mesh = Mesh::from_parts(vertices, repaired);
    }

    total
}
