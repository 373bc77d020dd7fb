//! # Cross-Section Profiles
//!
//! Resolves the 2D cut face swept along a part: a built-in template, or the
//! outline of another part's nodes for [`CutFace::UserDefined`].

use std::collections::{HashMap, HashSet};

use config::constants::EPSILON;
use glam::DVec2;
use skeleton_snapshot::{CutFace, Part, SkeletonGraph};

/// Direction from the profile center used to pick the starting endpoint of
/// a linked profile chain.
const PROFILE_START_DIRECTION: DVec2 = DVec2::new(-1.0, -1.0);

/// Counter-clockwise profile points for a cut face.
///
/// Falls back to the circle template when a linked part cannot provide at
/// least 3 points.
pub fn resolve(face: &CutFace, graph: &SkeletonGraph, circle_segments: usize) -> Vec<DVec2> {
    if let Some(points) = face.template(circle_segments) {
        return points;
    }
    let linked = match face {
        CutFace::UserDefined(part_id) => graph
            .parts
            .get(part_id)
            .and_then(|part| linked_profile(graph, part)),
        _ => None,
    };
    linked.unwrap_or_else(|| circle(circle_segments))
}

fn circle(segments: usize) -> Vec<DVec2> {
    CutFace::Circle.template(segments).unwrap_or_default()
}

/// Profile from another part's nodes: the nodes themselves for a closed
/// loop, the stroke outline (offset by each node's radius) for a chain.
fn linked_profile(graph: &SkeletonGraph, part: &Part) -> Option<Vec<DVec2>> {
    let nodes: HashMap<&str, (DVec2, f64)> = graph
        .part_nodes(part)
        .map(|node| {
            (
                node.id.as_str(),
                (node.position.truncate(), node.radius),
            )
        })
        .collect();
    let mut links: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in graph.part_edges(part) {
        if nodes.contains_key(edge.from.as_str()) && nodes.contains_key(edge.to.as_str()) {
            links.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
            links.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
        }
    }
    if nodes.len() < 2 {
        return None;
    }

    let center = nodes.values().map(|(p, _)| *p).sum::<DVec2>() / nodes.len() as f64;
    let mut endpoints: Vec<&str> = part
        .node_ids
        .iter()
        .map(String::as_str)
        .filter(|id| nodes.contains_key(id) && links.get(id).map_or(0, Vec::len) <= 1)
        .collect();
    let is_ring = endpoints.is_empty();
    if is_ring {
        endpoints = part
            .node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| nodes.contains_key(id))
            .collect();
    }
    let reference = PROFILE_START_DIRECTION.normalize();
    let start = endpoints.iter().copied().min_by(|a, b| {
        let angle = |id: &str| {
            let direction = (nodes[id].0 - center).normalize_or_zero();
            reference.angle_between(direction).abs()
        };
        angle(a).total_cmp(&angle(b))
    })?;

    let mut order = vec![start];
    let mut visited: HashSet<&str> = HashSet::from([start]);
    while let Some(next) = order
        .last()
        .and_then(|current| links.get(current))
        .and_then(|neighbors| neighbors.iter().copied().find(|n| !visited.contains(n)))
    {
        visited.insert(next);
        order.push(next);
    }

    let mut points: Vec<DVec2> = if is_ring {
        if order.len() < 3 {
            return None;
        }
        order.iter().map(|id| nodes[id].0).collect()
    } else {
        stroke_outline(&order.iter().map(|id| nodes[id]).collect::<Vec<_>>())
    };
    normalize(&mut points);
    (points.len() >= 3).then_some(points)
}

/// Outline of a 2D stroke: offset points on one side, then the other side
/// in reverse.
fn stroke_outline(nodes: &[(DVec2, f64)]) -> Vec<DVec2> {
    if nodes.len() < 2 {
        return Vec::new();
    }
    let edges: Vec<DVec2> = nodes
        .windows(2)
        .map(|w| (w[1].0 - w[0].0).normalize_or_zero())
        .collect();
    let direction = |i: usize| -> DVec2 {
        if i == 0 {
            edges[0]
        } else if i == nodes.len() - 1 {
            edges[edges.len() - 1]
        } else {
            (edges[i - 1] + edges[i]).normalize_or_zero()
        }
    };

    let offsets: Vec<(DVec2, DVec2)> = nodes
        .iter()
        .enumerate()
        .map(|(i, &(position, radius))| {
            let d = direction(i);
            // Cross product of the direction with +Z.
            let side = DVec2::new(d.y, -d.x);
            (position + side * radius, position - side * radius)
        })
        .collect();
    offsets
        .iter()
        .map(|(up, _)| *up)
        .chain(offsets.iter().rev().map(|(_, down)| *down))
        .collect()
}

/// Centers points on their bounding box, scales the longer side to
/// `[-1, 1]` and makes the winding counter-clockwise.
pub fn normalize(points: &mut [DVec2]) {
    if points.is_empty() {
        return;
    }
    let (low, high) = points.iter().fold(
        (DVec2::splat(f64::MAX), DVec2::splat(f64::MIN)),
        |(low, high), p| (low.min(*p), high.max(*p)),
    );
    let middle = (low + high) * 0.5;
    let long_size = (high - low).max_element().max(EPSILON);
    for point in points.iter_mut() {
        *point = (*point - middle) * 2.0 / long_size;
    }
    if signed_area(points) < 0.0 {
        points.reverse();
    }
}

/// Twice the signed area (positive for counter-clockwise).
pub fn signed_area(points: &[DVec2]) -> f64 {
    (0..points.len())
        .map(|i| points[i].perp_dot(points[(i + 1) % points.len()]))
        .sum()
}

/// Resamples a closed polygon to `count` points evenly spaced along its
/// perimeter, starting at the first point.
pub fn resample(points: &[DVec2], count: usize) -> Vec<DVec2> {
    if points.len() == count || points.len() < 2 || count == 0 {
        return points.to_vec();
    }
    let lengths: Vec<f64> = (0..points.len())
        .map(|i| points[i].distance(points[(i + 1) % points.len()]))
        .collect();
    let perimeter: f64 = lengths.iter().sum();
    if perimeter < EPSILON {
        return vec![points[0]; count];
    }

    let mut result = Vec::with_capacity(count);
    let mut edge = 0;
    let mut walked = 0.0;
    for k in 0..count {
        let target = perimeter * k as f64 / count as f64;
        while edge + 1 < lengths.len() && walked + lengths[edge] < target {
            walked += lengths[edge];
            edge += 1;
        }
        let t = if lengths[edge] > EPSILON {
            ((target - walked) / lengths[edge]).clamp(0.0, 1.0)
        } else {
            0.0
        };
        result.push(points[edge].lerp(points[(edge + 1) % points.len()], t));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skeleton_snapshot::SnapshotBuilder;

    #[test]
    fn test_builtin_template_is_used() {
        let graph = SkeletonGraph::default();
        assert_eq!(resolve(&CutFace::Hexagon, &graph, 8).len(), 6);
        assert_eq!(resolve(&CutFace::Circle, &graph, 12).len(), 12);
    }

    #[test]
    fn test_missing_linked_part_falls_back_to_circle() {
        let graph = SkeletonGraph::default();
        let points = resolve(&CutFace::UserDefined("ghost".into()), &graph, 8);
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn test_linked_chain_becomes_outline() {
        let graph = SnapshotBuilder::new()
            .chain_part(
                "profile",
                &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
                0.5,
                false,
            )
            .build()
            .decode()
            .unwrap();
        let points = resolve(&CutFace::UserDefined("profile".into()), &graph, 8);
        assert_eq!(points.len(), 6);
        assert!(signed_area(&points) > 0.0);
        let max = points.iter().fold(0.0_f64, |m, p| m.max(p.abs().max_element()));
        assert_relative_eq!(max, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linked_ring_uses_node_points() {
        let graph = SnapshotBuilder::new()
            .chain_part(
                "profile",
                &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
                0.1,
                true,
            )
            .build()
            .decode()
            .unwrap();
        let points = resolve(&CutFace::UserDefined("profile".into()), &graph, 8);
        assert_eq!(points.len(), 4);
        assert!(signed_area(&points) > 0.0);
    }

    #[test]
    fn test_normalize_centers_and_orients() {
        let mut points = vec![
            DVec2::new(2.0, 2.0),
            DVec2::new(2.0, 4.0),
            DVec2::new(6.0, 4.0),
            DVec2::new(6.0, 2.0),
        ];
        normalize(&mut points);
        assert!(signed_area(&points) > 0.0);
        assert!(points.contains(&DVec2::new(-1.0, -0.5)));
    }

    #[test]
    fn test_resample_square() {
        let square = CutFace::Quad.template(4).unwrap();
        let points = resample(&square, 8);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], square[0]);
        assert_relative_eq!(points[1].x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(points[1].y, -1.0, epsilon = 1e-12);
    }
}
