//! # Boolean Operations (CSG)
//!
//! Constructive Solid Geometry on closed triangle meshes using BSP trees.
//!
//! ## Algorithm
//!
//! Based on the csg.js algorithm by Evan Wallace, with two changes that
//! keep untouched geometry untouched:
//!
//! 1. **Bounding-box pruning**: disjoint operands are combined without any
//!    clipping, and triangles outside the overlap region are never split.
//! 2. **Contact partitioning**: a triangle that cannot touch any triangle of
//!    the other operand (exact separating-plane test) is classified whole by
//!    a single point query instead of being clipped.
//!
//! Only the remaining "near" triangles go through BSP clipping. The output
//! is welded and T-junctions created by splitting are repaired.
//!
//! ## Example
//!
//! ```rust
//! use skeleton_mesh::csg::union;
//! use skeleton_mesh::Mesh;
//!
//! let a = Mesh::new();
//! let b = Mesh::new();
//! let result = union(&a, &b).unwrap();
//! assert!(result.is_empty());
//! ```

mod bsp;
mod plane;
mod polygon;
mod predicates;
mod repair;
mod self_intersection;
mod vertex;

pub use self_intersection::{find_self_intersection, is_self_intersecting};

use config::constants::{PLANE_EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec3;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{BoundingBox, Mesh};
use bsp::BspNode;
use polygon::Polygon;
use predicates::{coplanar, strictly_separated};

/// Boolean operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// A ∪ B
    Union,
    /// A − B
    Difference,
    /// A ∩ B
    Intersection,
}

impl BooleanOp {
    /// Returns the operation name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BooleanOp::Union => "union",
            BooleanOp::Difference => "difference",
            BooleanOp::Intersection => "intersection",
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Compute union of two meshes.
pub fn union(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    boolean(a, b, BooleanOp::Union)
}

/// Compute difference of two meshes (A − B).
pub fn difference(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    boolean(a, b, BooleanOp::Difference)
}

/// Compute intersection of two meshes.
pub fn intersection(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    boolean(a, b, BooleanOp::Intersection)
}

/// Applies a boolean operation.
///
/// # Errors
///
/// Returns [`MeshError::BooleanFailed`] when an operand has non-finite
/// coordinates or the result does.
pub fn boolean(a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh> {
    for (label, mesh) in [("first", a), ("second", b)] {
        if mesh.vertices().iter().any(|v| !v.is_finite()) {
            return Err(MeshError::boolean_failed(format!(
                "{} operand of {} has non-finite coordinates",
                label,
                op.name()
            )));
        }
    }

    let (bounds_a, bounds_b) = match (a.bounding_box(), b.bounding_box()) {
        (Some(bounds_a), Some(bounds_b)) if !a.is_empty() && !b.is_empty() => {
            (bounds_a, bounds_b)
        }
        _ => return Ok(trivial(a, b, op)),
    };

    let Some(region) = bounds_a
        .expanded(PLANE_EPSILON)
        .intersection(&bounds_b.expanded(PLANE_EPSILON))
    else {
        debug!(op = op.name(), "operands are disjoint");
        return Ok(disjoint(a, b, op));
    };

    let triangles_a = Triangle::collect(a);
    let triangles_b = Triangle::collect(b);
    let tree_a = BspNode::new(polygons_of(&triangles_a));
    let tree_b = BspNode::new(polygons_of(&triangles_b));

    let split_a = Partition::new(&triangles_a, &triangles_b, &region, &tree_b);
    let split_b = Partition::new(&triangles_b, &triangles_a, &region, &tree_a);
    debug!(
        op = op.name(),
        near_a = split_a.near.len(),
        near_b = split_b.near.len(),
        "partitioned operands"
    );

    let mut polygons = Vec::new();
    match op {
        BooleanOp::Union => {
            polygons.extend(split_a.outside);
            polygons.extend(tree_b.clip_polygons(split_a.near));

            polygons.extend(split_b.outside);
            let kept = tree_a.clip_polygons(split_b.near);
            polygons.extend(flipped(tree_a.clip_polygons(flipped(kept))));
        }
        BooleanOp::Difference => {
            polygons.extend(split_a.outside);
            polygons.extend(flipped(tree_b.clip_polygons(flipped(split_a.near))));

            polygons.extend(flipped(split_b.inside));
            if !split_b.near.is_empty() {
                let tree_a_inverse = BspNode::new(flipped(polygons_of(&triangles_a)));
                let inside = tree_a_inverse.clip_polygons(split_b.near);
                polygons.extend(tree_a_inverse.clip_polygons(flipped(inside)));
            }
        }
        BooleanOp::Intersection => {
            polygons.extend(split_a.inside);
            if !split_a.near.is_empty() {
                let tree_b_inverse = BspNode::new(flipped(polygons_of(&triangles_b)));
                polygons.extend(flipped(
                    tree_b_inverse.clip_polygons(flipped(split_a.near)),
                ));
            }

            polygons.extend(split_b.inside);
            if !split_b.near.is_empty() {
                let tree_a_inverse = BspNode::new(flipped(polygons_of(&triangles_a)));
                let inside = tree_a_inverse.clip_polygons(split_b.near);
                polygons.extend(flipped(tree_a_inverse.clip_polygons(flipped(inside))));
            }
        }
    }

    let result = assemble(&polygons);
    if result.vertices().iter().any(|v| !v.is_finite()) {
        return Err(MeshError::boolean_failed(format!(
            "{} produced non-finite coordinates",
            op.name()
        )));
    }
    Ok(result)
}

// =============================================================================
// SHORTCUTS
// =============================================================================

fn trivial(a: &Mesh, b: &Mesh, op: BooleanOp) -> Mesh {
    match op {
        BooleanOp::Union if a.is_empty() => b.clone(),
        BooleanOp::Union | BooleanOp::Difference => a.clone(),
        BooleanOp::Intersection => Mesh::new(),
    }
}

fn disjoint(a: &Mesh, b: &Mesh, op: BooleanOp) -> Mesh {
    match op {
        BooleanOp::Union => {
            let mut merged = a.clone();
            merged.merge(b);
            merged
        }
        BooleanOp::Difference => a.clone(),
        BooleanOp::Intersection => Mesh::new(),
    }
}

// =============================================================================
// PARTITIONING
// =============================================================================

/// One input triangle with its exact corners.
struct Triangle {
    corners: [DVec3; 3],
    bounds: BoundingBox,
    polygon: Polygon,
}

impl Triangle {
    /// Non-degenerate triangles of a mesh.
    fn collect(mesh: &Mesh) -> Vec<Triangle> {
        (0..mesh.triangle_count())
            .filter_map(|i| {
                let corners = mesh.triangle_positions(i);
                let polygon = Polygon::triangle(corners[0], corners[1], corners[2])?;
                let bounds = BoundingBox::from_points(corners.iter())?;
                Some(Triangle {
                    corners,
                    bounds,
                    polygon,
                })
            })
            .collect()
    }

    fn centroid(&self) -> DVec3 {
        (self.corners[0] + self.corners[1] + self.corners[2]) / 3.0
    }

    /// Conservative contact test: false only when the triangles provably
    /// do not touch.
    fn may_touch(&self, other: &Triangle) -> bool {
        if !self.bounds.overlaps(&other.bounds, PLANE_EPSILON) {
            return false;
        }
        if coplanar(&self.corners, &other.corners) {
            return true;
        }
        !strictly_separated(&self.corners, &other.corners)
            && !strictly_separated(&other.corners, &self.corners)
    }
}

/// Where each triangle of one operand lies relative to the other solid.
struct Partition {
    inside: Vec<Polygon>,
    outside: Vec<Polygon>,
    near: Vec<Polygon>,
}

enum Placement {
    Inside,
    Outside,
    Near,
}

impl Partition {
    fn new(own: &[Triangle], other: &[Triangle], region: &BoundingBox, other_tree: &BspNode) -> Self {
        let placements: Vec<Placement> = own
            .par_iter()
            .map(|triangle| {
                if !triangle.bounds.overlaps(region, 0.0) {
                    return Placement::Outside;
                }
                if other.iter().any(|candidate| triangle.may_touch(candidate)) {
                    return Placement::Near;
                }
                match other_tree.classify_point(triangle.centroid()) {
                    Some(true) => Placement::Inside,
                    Some(false) => Placement::Outside,
                    None => Placement::Near,
                }
            })
            .collect();

        let mut partition = Partition {
            inside: Vec::new(),
            outside: Vec::new(),
            near: Vec::new(),
        };
        for (triangle, placement) in own.iter().zip(placements) {
            let polygon = triangle.polygon.clone();
            match placement {
                Placement::Inside => partition.inside.push(polygon),
                Placement::Outside => partition.outside.push(polygon),
                Placement::Near => partition.near.push(polygon),
            }
        }
        partition
    }
}

// =============================================================================
// CONVERSION HELPERS
// =============================================================================

fn polygons_of(triangles: &[Triangle]) -> Vec<Polygon> {
    triangles.iter().map(|t| t.polygon.clone()).collect()
}

fn flipped(mut polygons: Vec<Polygon>) -> Vec<Polygon> {
    for polygon in &mut polygons {
        polygon.flip();
    }
    polygons
}

/// Polygons of every non-degenerate triangle of a mesh.
#[cfg(test)]
pub(crate) fn mesh_polygons(mesh: &Mesh) -> Vec<Polygon> {
    polygons_of(&Triangle::collect(mesh))
}

fn assemble(polygons: &[Polygon]) -> Mesh {
    let mut mesh = repair::polygons_to_mesh(polygons);
    mesh.weld_vertices(VERTEX_MERGE_EPSILON);
    let repaired = repair::repair_t_junctions(&mut mesh);
    mesh.remove_degenerate_triangles();
    mesh.compact();
    if repaired > 0 {
        debug!(repaired, "split triangles at T-junctions");
    }
    mesh
}

#[cfg(test)]
mod tests;
