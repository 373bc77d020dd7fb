//! Face and per-corner smooth normals.

use glam::DVec3;

/// Unit normal of each triangle, zero for degenerate ones.
pub fn triangle_normals(vertices: &[DVec3], triangles: &[[usize; 3]]) -> Vec<DVec3> {
    triangles
        .iter()
        .map(|&[a, b, c]| {
            (vertices[b] - vertices[a])
                .cross(vertices[c] - vertices[a])
                .normalize_or_zero()
        })
        .collect()
}

/// Smooth normal at each triangle corner.
///
/// A corner averages the area-weighted normals of the triangles around its
/// vertex whose normal is within `threshold_degrees` of its own triangle's
/// normal, so hard edges stay sharp.
pub fn smooth_triangle_vertex_normals(
    vertices: &[DVec3],
    triangles: &[[usize; 3]],
    face_normals: &[DVec3],
    threshold_degrees: f64,
) -> Vec<[DVec3; 3]> {
    let threshold = threshold_degrees.to_radians().cos();
    let weighted: Vec<DVec3> = triangles
        .iter()
        .map(|&[a, b, c]| (vertices[b] - vertices[a]).cross(vertices[c] - vertices[a]))
        .collect();
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    for (face, triangle) in triangles.iter().enumerate() {
        for &v in triangle {
            incident[v].push(face);
        }
    }

    triangles
        .iter()
        .enumerate()
        .map(|(face, triangle)| {
            let own = face_normals[face];
            triangle.map(|v| {
                incident[v]
                    .iter()
                    .filter(|&&other| face_normals[other].dot(own) >= threshold)
                    .map(|&other| weighted[other])
                    .sum::<DVec3>()
                    .try_normalize()
                    .unwrap_or(own)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hinge(angle_degrees: f64) -> (Vec<DVec3>, Vec<[usize; 3]>) {
        let angle = angle_degrees.to_radians();
        let vertices = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, -angle.cos(), angle.sin()),
        ];
        (vertices, vec![[0, 1, 2], [1, 0, 3]])
    }

    #[test]
    fn test_flat_neighbors_share_normal() {
        let (vertices, triangles) = hinge(0.0);
        let normals = triangle_normals(&vertices, &triangles);
        let corners = smooth_triangle_vertex_normals(&vertices, &triangles, &normals, 60.0);
        assert_relative_eq!(corners[0][0].z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(corners[1][0].z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sharp_edge_stays_sharp() {
        let (vertices, triangles) = hinge(90.0);
        let normals = triangle_normals(&vertices, &triangles);
        let corners = smooth_triangle_vertex_normals(&vertices, &triangles, &normals, 60.0);
        assert_relative_eq!(corners[0][0].dot(normals[0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(corners[1][0].dot(normals[1]), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shallow_edge_is_smoothed() {
        let (vertices, triangles) = hinge(30.0);
        let normals = triangle_normals(&vertices, &triangles);
        let corners = smooth_triangle_vertex_normals(&vertices, &triangles, &normals, 60.0);
        assert!(corners[0][0].dot(normals[0]) < 0.999);
        assert_relative_eq!(corners[0][0].length(), 1.0, epsilon = 1e-12);
    }
}
