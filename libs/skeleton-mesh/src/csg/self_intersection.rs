//! # Self-Intersection Check
//!
//! Sweep-and-prune over triangle bounds followed by the exact
//! triangle/triangle crossing test. Triangles sharing a vertex are adjacent
//! and never count.

use rayon::prelude::*;

use super::predicates::triangles_cross;
use crate::mesh::{BoundingBox, Mesh};

/// Returns the first crossing triangle pair found, if any.
pub fn find_self_intersection(mesh: &Mesh) -> Option<(usize, usize)> {
    let corners: Vec<_> = (0..mesh.triangle_count())
        .map(|i| mesh.triangle_positions(i))
        .collect();
    let bounds: Vec<BoundingBox> = corners
        .iter()
        .filter_map(|c| BoundingBox::from_points(c.iter()))
        .collect();
    if bounds.len() != corners.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..bounds.len()).collect();
    order.sort_by(|&a, &b| bounds[a].min.x.total_cmp(&bounds[b].min.x));
    let triangles = mesh.triangles();

    (0..order.len()).into_par_iter().find_map_any(|i| {
        let first = order[i];
        let first_bounds = &bounds[first];
        for &second in &order[i + 1..] {
            let second_bounds = &bounds[second];
            if second_bounds.min.x > first_bounds.max.x {
                break;
            }
            if !first_bounds.overlaps(second_bounds, 0.0) {
                continue;
            }
            let shares_vertex = triangles[first]
                .iter()
                .any(|v| triangles[second].contains(v));
            if shares_vertex {
                continue;
            }
            if triangles_cross(&corners[first], &corners[second]) {
                return Some((first.min(second), first.max(second)));
            }
        }
        None
    })
}

/// Returns true if any two non-adjacent triangles cross.
pub fn is_self_intersecting(mesh: &Mesh) -> bool {
    find_self_intersection(mesh).is_some()
}
