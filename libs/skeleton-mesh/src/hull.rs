//! # QuickHull
//!
//! 3D convex hull used to build joint meshes at branch nodes.
//!
//! ## Algorithm Steps
//!
//! 1. Find extreme points on each axis
//! 2. Build an initial tetrahedron from 4 non-coplanar points
//! 3. Assign remaining points to the first face they lie outside of
//! 4. While some face has outside points:
//!    a. Take its farthest point
//!    b. Collect every face visible from it and their horizon
//!    c. Connect the horizon to the point, keeping the horizon's winding
//!    d. Reassign orphaned outside points to the new faces

use std::collections::{HashMap, HashSet};

use config::constants::EPSILON;
use glam::DVec3;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Tolerance for treating a point as outside a face, relative to the
/// extent of the input.
const HULL_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Computes the convex hull of a point set as an outward-facing mesh.
///
/// # Errors
///
/// Returns [`MeshError::DegenerateGeometry`] when fewer than 4 distinct
/// points are given or all points are coplanar.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use skeleton_mesh::hull::convex_hull;
///
/// let points = [
///     DVec3::ZERO,
///     DVec3::X,
///     DVec3::Y,
///     DVec3::Z,
///     DVec3::splat(0.1),
/// ];
/// let hull = convex_hull(&points).unwrap();
/// assert_eq!(hull.triangle_count(), 4);
/// assert!(hull.volume() > 0.0);
/// ```
pub fn convex_hull(points: &[DVec3]) -> Result<Mesh> {
    let points = remove_duplicates(points);
    if points.len() < 4 {
        return Err(MeshError::degenerate(
            "convex hull requires at least 4 distinct points",
        ));
    }
    let extent = points
        .iter()
        .fold(0.0_f64, |acc, p| acc.max(p.abs().max_element()));
    let tolerance = (extent * HULL_RELATIVE_TOLERANCE).max(EPSILON);

    let (simplex, interior) = initial_simplex(&points)?;
    let mut faces: Vec<HullFace> = simplex
        .iter()
        .map(|&[a, b, c]| HullFace::outward(a, b, c, interior, &points))
        .collect();

    let used: HashSet<usize> = simplex.iter().flatten().copied().collect();
    let remaining: Vec<usize> = (0..points.len()).filter(|i| !used.contains(i)).collect();
    assign(&mut faces, &remaining, &points, tolerance);

    let max_iterations = points.len() * 4;
    for _ in 0..max_iterations {
        let Some(face_index) = faces.iter().position(|f| !f.outside.is_empty()) else {
            break;
        };
        let Some(apex) = faces[face_index].farthest(&points) else {
            break;
        };
        let apex_point = points[apex];

        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.signed_distance(apex_point) > tolerance)
            .map(|(i, _)| i)
            .collect();
        if visible.is_empty() {
            faces[face_index].outside.retain(|&p| p != apex);
            continue;
        }

        let horizon = horizon_edges(&faces, &visible);
        let mut orphans: Vec<usize> = visible
            .iter()
            .flat_map(|&i| faces[i].outside.iter().copied())
            .filter(|&p| p != apex)
            .collect();
        orphans.sort_unstable();
        orphans.dedup();

        let visible_set: HashSet<usize> = visible.into_iter().collect();
        let mut index = 0;
        faces.retain(|_| {
            let keep = !visible_set.contains(&index);
            index += 1;
            keep
        });

        let first_new = faces.len();
        for (a, b) in horizon {
            faces.push(HullFace::new(a, b, apex, &points));
        }
        assign(&mut faces[first_new..], &orphans, &points, tolerance);
    }

    Ok(faces_to_mesh(&faces, &points))
}

// =============================================================================
// HULL FACE
// =============================================================================

#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    normal: DVec3,
    distance: f64,
    outside: Vec<usize>,
}

impl HullFace {
    fn new(a: usize, b: usize, c: usize, points: &[DVec3]) -> Self {
        let normal = (points[b] - points[a])
            .cross(points[c] - points[a])
            .normalize_or_zero();
        Self {
            vertices: [a, b, c],
            normal,
            distance: normal.dot(points[a]),
            outside: Vec::new(),
        }
    }

    /// Face oriented away from an interior point.
    fn outward(a: usize, b: usize, c: usize, interior: DVec3, points: &[DVec3]) -> Self {
        let face = Self::new(a, b, c, points);
        if face.signed_distance(interior) > 0.0 {
            Self::new(a, c, b, points)
        } else {
            face
        }
    }

    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    fn farthest(&self, points: &[DVec3]) -> Option<usize> {
        self.outside.iter().copied().max_by(|&a, &b| {
            self.signed_distance(points[a])
                .total_cmp(&self.signed_distance(points[b]))
        })
    }
}

fn assign(faces: &mut [HullFace], candidates: &[usize], points: &[DVec3], tolerance: f64) {
    for &index in candidates {
        let point = points[index];
        if let Some(face) = faces
            .iter_mut()
            .find(|face| face.signed_distance(point) > tolerance)
        {
            face.outside.push(index);
        }
    }
}

fn remove_duplicates(points: &[DVec3]) -> Vec<DVec3> {
    let mut unique: Vec<DVec3> = Vec::with_capacity(points.len());
    for point in points {
        if !unique.iter().any(|u| u.distance(*point) < EPSILON) {
            unique.push(*point);
        }
    }
    unique
}

/// Four non-coplanar point indices (as the faces of a tetrahedron) and the
/// tetrahedron's centroid.
fn initial_simplex(points: &[DVec3]) -> Result<([[usize; 3]; 4], DVec3)> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[extremes[axis * 2]][axis] {
                extremes[axis * 2] = i;
            }
            if p[axis] > points[extremes[axis * 2 + 1]][axis] {
                extremes[axis * 2 + 1] = i;
            }
        }
    }

    let mut best = (extremes[0], extremes[1]);
    let mut best_distance = -1.0;
    for (i, &a) in extremes.iter().enumerate() {
        for &b in &extremes[i + 1..] {
            let distance = points[a].distance_squared(points[b]);
            if distance > best_distance {
                best_distance = distance;
                best = (a, b);
            }
        }
    }
    let (p0, p1) = best;

    let direction = (points[p1] - points[p0]).normalize_or_zero();
    let p2 = farthest_by(points, &[p0, p1], |p| {
        let v = p - points[p0];
        (v - direction * v.dot(direction)).length()
    })
    .ok_or_else(|| MeshError::degenerate("all hull points are collinear"))?;

    let normal = (points[p1] - points[p0])
        .cross(points[p2] - points[p0])
        .normalize_or_zero();
    let p3 = farthest_by(points, &[p0, p1, p2], |p| normal.dot(p - points[p0]).abs())
        .ok_or_else(|| MeshError::degenerate("all hull points are coplanar"))?;

    let interior = (points[p0] + points[p1] + points[p2] + points[p3]) / 4.0;
    Ok(([[p0, p1, p2], [p0, p2, p3], [p0, p3, p1], [p1, p3, p2]], interior))
}

/// Index maximizing `measure`, ignoring `exclude`; `None` if the maximum is
/// not above [`EPSILON`].
fn farthest_by(points: &[DVec3], exclude: &[usize], measure: impl Fn(DVec3) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(i))
        .map(|(i, p)| (i, measure(*p)))
        .filter(|&(_, m)| m > EPSILON)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Edges of visible faces whose neighbor is not visible, in the visible
/// face's winding.
fn horizon_edges(faces: &[HullFace], visible: &[usize]) -> Vec<(usize, usize)> {
    let mut directed: HashSet<(usize, usize)> = HashSet::new();
    for &index in visible {
        let [a, b, c] = faces[index].vertices;
        directed.extend([(a, b), (b, c), (c, a)]);
    }
    let mut horizon: Vec<(usize, usize)> = directed
        .iter()
        .filter(|(a, b)| !directed.contains(&(*b, *a)))
        .copied()
        .collect();
    horizon.sort_unstable();
    horizon
}

fn faces_to_mesh(faces: &[HullFace], points: &[DVec3]) -> Mesh {
    let mut remap: HashMap<usize, u32> = HashMap::new();
    let mut mesh = Mesh::with_capacity(faces.len() / 2 + 2, faces.len());
    for face in faces {
        let mut corners = [0u32; 3];
        for (slot, &v) in corners.iter_mut().zip(face.vertices.iter()) {
            *slot = *remap.entry(v).or_insert_with(|| mesh.add_vertex(points[v]));
        }
        mesh.add_triangle(corners[0], corners[1], corners[2]);
    }
    mesh
}
