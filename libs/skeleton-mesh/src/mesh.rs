//! # Mesh Data Structure
//!
//! Indexed triangle mesh used between every stage of the generator: part
//! skinning, CSG, welding, hole fixing and subdivision.

use std::collections::HashMap;

use config::constants::{EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec3;

// =============================================================================
// BOUNDING BOX
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Bounding box of a set of points; `None` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self { min: first, max: first }, |bounds, p| Self {
            min: bounds.min.min(*p),
            max: bounds.max.max(*p),
        }))
    }

    /// Returns true if the boxes overlap once both are grown by `margin`.
    pub fn overlaps(&self, other: &BoundingBox, margin: f64) -> bool {
        self.min.x <= other.max.x + margin
            && self.max.x + margin >= other.min.x
            && self.min.y <= other.max.y + margin
            && self.max.y + margin >= other.min.y
            && self.min.z <= other.max.z + margin
            && self.max.z + margin >= other.min.z
    }

    /// Overlapping region of two boxes, if any.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.x <= max.x && min.y <= max.y && min.z <= max.z).then_some(BoundingBox { min, max })
    }

    /// Box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min: self.min - DVec3::splat(margin),
            max: self.max + DVec3::splat(margin),
        }
    }

    /// Center point.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

// =============================================================================
// MESH
// =============================================================================

/// A triangle mesh with vertices and indices.
///
/// All geometry calculations use f64. Triangles wind counter-clockwise when
/// seen from outside, so closed meshes have positive [`Mesh::volume`].
///
/// # Example
///
/// ```rust
/// use skeleton_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle(0, 1, 2);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    vertices: Vec<DVec3>,
    /// Triangle indices (3 indices per triangle)
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Creates a mesh from raw buffers.
    pub fn from_parts(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Consumes the mesh, returning its buffers.
    pub fn into_parts(self) -> (Vec<DVec3>, Vec<[u32; 3]>) {
        (self.vertices, self.triangles)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no surface.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.triangles.push([v0, v1, v2]);
    }

    /// Returns a reference to the vertices.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns a reference to the triangles.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the vertex at the given index.
    #[inline]
    pub fn vertex(&self, index: u32) -> DVec3 {
        self.vertices[index as usize]
    }

    /// Returns the three corner positions of a triangle.
    #[inline]
    pub fn triangle_positions(&self, index: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[index];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Unit normal of a triangle, zero for degenerate triangles.
    pub fn triangle_normal(&self, index: usize) -> DVec3 {
        let [a, b, c] = self.triangle_positions(index);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Unit normals of all triangles.
    pub fn triangle_normals(&self) -> Vec<DVec3> {
        (0..self.triangles.len())
            .map(|i| self.triangle_normal(i))
            .collect()
    }

    /// Axis-aligned bounds; `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Signed enclosed volume (positive for outward-facing closed meshes).
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                self.vertex(a).dot(self.vertex(b).cross(self.vertex(c)))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len())
            .map(|i| {
                let [a, b, c] = self.triangle_positions(i);
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    /// Translates every vertex.
    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Appends another mesh as separate geometry.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }

    /// Copy with reversed winding (inside out).
    pub fn flipped(&self) -> Mesh {
        Mesh {
            vertices: self.vertices.clone(),
            triangles: self.triangles.iter().map(|&[a, b, c]| [a, c, b]).collect(),
        }
    }

    /// Copy mirrored across the YZ plane, winding reversed to stay outward.
    pub fn mirrored_x(&self) -> Mesh {
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|v| DVec3::new(-v.x, v.y, v.z))
                .collect(),
            triangles: self.triangles.iter().map(|&[a, b, c]| [a, c, b]).collect(),
        }
    }

    // =========================================================================
    // TOPOLOGY QUERIES
    // =========================================================================

    /// Counts directed edges.
    pub fn directed_edge_counts(&self) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::with_capacity(self.triangles.len() * 3);
        for &[a, b, c] in &self.triangles {
            for edge in [(a, b), (b, c), (c, a)] {
                *counts.entry(edge).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Directed edges without an opposite edge.
    pub fn boundary_edges(&self) -> Vec<(u32, u32)> {
        let counts = self.directed_edge_counts();
        let mut edges: Vec<(u32, u32)> = counts
            .keys()
            .filter(|(a, b)| !counts.contains_key(&(*b, *a)))
            .copied()
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Returns true if every directed edge appears once and is matched by
    /// exactly one opposite edge (closed, consistently oriented 2-manifold).
    pub fn is_closed(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }
        let counts = self.directed_edge_counts();
        counts
            .iter()
            .all(|(&(a, b), &count)| count == 1 && counts.get(&(b, a)) == Some(&1))
    }

    /// Number of connected surface pieces (vertices linked through triangles).
    pub fn shell_count(&self) -> usize {
        let mut parent: Vec<u32> = (0..self.vertices.len() as u32).collect();

        fn find(parent: &mut [u32], mut x: u32) -> u32 {
            while parent[x as usize] != x {
                parent[x as usize] = parent[parent[x as usize] as usize];
                x = parent[x as usize];
            }
            x
        }

        for &[a, b, c] in &self.triangles {
            for (x, y) in [(a, b), (b, c)] {
                let (rx, ry) = (find(&mut parent, x), find(&mut parent, y));
                if rx != ry {
                    parent[rx as usize] = ry;
                }
            }
        }

        let mut roots: Vec<u32> = self
            .triangles
            .iter()
            .map(|t| find(&mut parent, t[0]))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }

    /// Splits the mesh into its connected shells.
    pub fn shells(&self) -> Vec<Mesh> {
        let mut parent: Vec<u32> = (0..self.vertices.len() as u32).collect();
        fn find(parent: &mut [u32], mut x: u32) -> u32 {
            while parent[x as usize] != x {
                parent[x as usize] = parent[parent[x as usize] as usize];
                x = parent[x as usize];
            }
            x
        }
        for &[a, b, c] in &self.triangles {
            for (x, y) in [(a, b), (b, c)] {
                let (rx, ry) = (find(&mut parent, x), find(&mut parent, y));
                if rx != ry {
                    parent[rx as usize] = ry;
                }
            }
        }

        let mut shells: Vec<Mesh> = Vec::new();
        let mut shell_of_root: HashMap<u32, usize> = HashMap::new();
        let mut remaps: Vec<HashMap<u32, u32>> = Vec::new();
        for &triangle in &self.triangles {
            let root = find(&mut parent, triangle[0]);
            let shell_index = *shell_of_root.entry(root).or_insert_with(|| {
                shells.push(Mesh::new());
                remaps.push(HashMap::new());
                shells.len() - 1
            });
            let shell = &mut shells[shell_index];
            let remap = &mut remaps[shell_index];
            let mut mapped = [0u32; 3];
            for (slot, &index) in mapped.iter_mut().zip(triangle.iter()) {
                *slot = *remap
                    .entry(index)
                    .or_insert_with(|| shell.add_vertex(self.vertices[index as usize]));
            }
            shell.add_triangle(mapped[0], mapped[1], mapped[2]);
        }
        shells
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    /// Merges vertices closer than `epsilon` using a spatial hash.
    ///
    /// Returns the number of vertices merged away. Triangles that collapse
    /// are removed and unused vertices compacted.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }
        let cell_size = (epsilon * 2.0).max(EPSILON);
        let cell_of = |p: DVec3| -> (i64, i64, i64) {
            (
                (p.x / cell_size).floor() as i64,
                (p.y / cell_size).floor() as i64,
                (p.z / cell_size).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
        for (index, vertex) in self.vertices.iter().enumerate() {
            grid.entry(cell_of(*vertex)).or_default().push(index as u32);
        }

        let mut remap: Vec<u32> = (0..self.vertices.len() as u32).collect();
        let mut merged = 0;
        for index in 0..self.vertices.len() as u32 {
            if remap[index as usize] != index {
                continue;
            }
            let position = self.vertices[index as usize];
            let cell = cell_of(position);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                        else {
                            continue;
                        };
                        for &other in candidates {
                            if other <= index || remap[other as usize] != other {
                                continue;
                            }
                            if (self.vertices[other as usize] - position).length() < epsilon {
                                remap[other as usize] = index;
                                merged += 1;
                            }
                        }
                    }
                }
            }
        }

        if merged > 0 {
            for triangle in &mut self.triangles {
                for index in triangle.iter_mut() {
                    *index = remap[*index as usize];
                }
            }
            self.remove_degenerate_triangles();
            self.compact();
        }
        merged
    }

    /// Drops triangles that reference the same vertex twice.
    pub fn remove_degenerate_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        self.triangles
            .retain(|&[a, b, c]| a != b && b != c && c != a);
        before - self.triangles.len()
    }

    /// Removes vertices no triangle references, preserving order.
    pub fn compact(&mut self) {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in triangle {
                used[index as usize] = true;
            }
        }
        if used.iter().all(|&u| u) {
            return;
        }
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (index, vertex) in self.vertices.iter().enumerate() {
            if used[index] {
                remap[index] = vertices.len() as u32;
                vertices.push(*vertex);
            }
        }
        for triangle in &mut self.triangles {
            for index in triangle.iter_mut() {
                *index = remap[*index as usize];
            }
        }
        self.vertices = vertices;
    }

    /// Validates the mesh for correctness.
    ///
    /// Checks:
    /// - All triangle indices are valid
    /// - No triangle references a vertex twice
    /// - No zero-area triangles
    pub fn validate(&self) -> bool {
        let vertex_count = self.vertices.len() as u32;
        self.triangles.iter().enumerate().all(|(i, &[a, b, c])| {
            a < vertex_count
                && b < vertex_count
                && c < vertex_count
                && a != b
                && b != c
                && a != c
                && {
                    let [p0, p1, p2] = self.triangle_positions(i);
                    (p1 - p0).cross(p2 - p0).length() >= VERTEX_MERGE_EPSILON * VERTEX_MERGE_EPSILON
                }
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::cube;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_new() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_cube_volume_and_area() {
        let mesh = cube(DVec3::ZERO, 1.0);
        assert_relative_eq!(mesh.volume(), 8.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.surface_area(), 24.0, epsilon = 1e-12);
        assert!(mesh.is_closed());
        assert!(mesh.validate());
    }

    #[test]
    fn test_flipped_volume_is_negative() {
        let mesh = cube(DVec3::ZERO, 1.0).flipped();
        assert_relative_eq!(mesh.volume(), -8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirrored_keeps_outward_winding() {
        let mesh = cube(DVec3::new(2.0, 0.0, 0.0), 0.5).mirrored_x();
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
        let bounds = mesh.bounding_box().unwrap();
        assert_relative_eq!(bounds.max.x, -1.5);
    }

    #[test]
    fn test_merge_counts_shells() {
        let mut mesh = cube(DVec3::ZERO, 0.5);
        mesh.merge(&cube(DVec3::new(3.0, 0.0, 0.0), 0.5));
        assert_eq!(mesh.shell_count(), 2);
        assert_eq!(mesh.shells().len(), 2);
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_boundary_edges_of_open_mesh() {
        let mut mesh = cube(DVec3::ZERO, 1.0);
        let (vertices, mut triangles) = mesh.clone().into_parts();
        triangles.pop();
        mesh = Mesh::from_parts(vertices, triangles);
        assert!(!mesh.is_closed());
        assert_eq!(mesh.boundary_edges().len(), 3);
    }

    #[test]
    fn test_weld_vertices_merges_duplicates() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_vertex(DVec3::X);
        mesh.add_vertex(DVec3::Y);
        mesh.add_vertex(DVec3::X + DVec3::splat(1e-12));
        mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(3, 4, 2);
        let merged = mesh.weld_vertices(1e-9);
        assert_eq!(merged, 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_bounding_box_overlap_and_intersection() {
        let a = cube(DVec3::ZERO, 1.0).bounding_box().unwrap();
        let b = cube(DVec3::new(1.5, 0.0, 0.0), 1.0).bounding_box().unwrap();
        let c = cube(DVec3::new(5.0, 0.0, 0.0), 1.0).bounding_box().unwrap();
        assert!(a.overlaps(&b, 0.0));
        assert!(!a.overlaps(&c, 0.0));
        let overlap = a.intersection(&b).unwrap();
        assert_relative_eq!(overlap.min.x, 0.5);
        assert_relative_eq!(overlap.max.x, 1.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_triangle(0, 1, 2);
        assert!(!mesh.validate());
    }
}
