//! Swept tubes: rings placed on parallel-transported frames along a chain,
//! joined by quads and closed with caps.

use std::f64::consts::FRAC_1_SQRT_2;

use config::constants::EPSILON;
use glam::{DQuat, DVec2, DVec3};

use super::{CapStyle, Chain, PartMesh, PartSkeleton, SkinNode};

/// Chamfer cap: inset ring offset and scale, relative to the node radius.
const CHAMFER_OFFSET: f64 = 0.2;
const CHAMFER_SCALE: f64 = 0.8;

/// Orthonormal frame at one chain node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Frame {
    pub tangent: DVec3,
    pub u: DVec3,
    pub v: DVec3,
}

/// Ring positions at the two ends of a swept tube.
#[derive(Debug, Default)]
pub(super) struct TubeEnds {
    pub start: Vec<DVec3>,
    pub end: Vec<DVec3>,
}

/// Sweeps the chain's profiles into `out`. Loops are closed ring to ring
/// and get no caps.
pub(super) fn sweep(
    skeleton: &PartSkeleton,
    chain: &Chain,
    start_cap: CapStyle,
    end_cap: CapStyle,
    out: &mut PartMesh,
) -> TubeEnds {
    let points: Vec<DVec3> = chain
        .nodes
        .iter()
        .map(|&n| skeleton.nodes[n].position)
        .collect();
    let frames = frames(&points, chain.closed);
    let rings: Vec<Vec<u32>> = chain
        .nodes
        .iter()
        .zip(&frames)
        .map(|(&n, frame)| {
            let node = &skeleton.nodes[n];
            node.profile
                .iter()
                .map(|&q| out.add_vertex(ring_point(node, frame, q), &node.id))
                .collect()
        })
        .collect();
    if rings.len() < 2 {
        return TubeEnds::default();
    }

    let segments = if chain.closed { rings.len() } else { rings.len() - 1 };
    for i in 0..segments {
        connect(out, &rings[i], &rings[(i + 1) % rings.len()]);
    }

    let last = rings.len() - 1;
    if !chain.closed {
        cap(out, &skeleton.nodes[chain.nodes[0]], &frames[0], &rings[0], start_cap, -1.0);
        cap(out, &skeleton.nodes[chain.nodes[last]], &frames[last], &rings[last], end_cap, 1.0);
    }

    let positions = |ring: &[u32]| ring.iter().map(|&i| out.mesh.vertex(i)).collect();
    TubeEnds {
        start: positions(&rings[0]),
        end: positions(&rings[last]),
    }
}

fn ring_point(node: &SkinNode, frame: &Frame, q: DVec2) -> DVec3 {
    node.position + (frame.u * q.x + frame.v * q.y) * node.radius
}

/// Joins two rings with quads; `upper` follows `lower` along the tangent.
fn connect(out: &mut PartMesh, lower: &[u32], upper: &[u32]) {
    let n = lower.len().min(upper.len());
    for k in 0..n {
        let next = (k + 1) % n;
        out.add_quad(lower[k], lower[next], upper[next], upper[k]);
    }
}

/// Closes a ring with a fan around `center`; `direction` is -1 at the
/// start of a tube and +1 at its end.
fn fan(out: &mut PartMesh, center: u32, ring: &[u32], direction: f64) {
    let n = ring.len();
    for k in 0..n {
        let next = (k + 1) % n;
        if direction < 0.0 {
            out.add_triangle(center, ring[next], ring[k]);
        } else {
            out.add_triangle(center, ring[k], ring[next]);
        }
    }
}

fn cap(out: &mut PartMesh, node: &SkinNode, frame: &Frame, ring: &[u32], style: CapStyle, direction: f64) {
    let outward = frame.tangent * direction;
    let (offset, scale) = match style {
        CapStyle::Flat => {
            let center = out.add_vertex(node.position, &node.id);
            fan(out, center, ring, direction);
            return;
        }
        CapStyle::Rounded => (node.radius * FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        CapStyle::Chamfered => (node.radius * CHAMFER_OFFSET, CHAMFER_SCALE),
    };

    let inset: Vec<u32> = ring
        .iter()
        .map(|&i| {
            let position =
                node.position + (out.mesh.vertex(i) - node.position) * scale + outward * offset;
            out.add_vertex(position, &node.id)
        })
        .collect();
    if direction < 0.0 {
        connect(out, &inset, ring);
    } else {
        connect(out, ring, &inset);
    }

    let tip = match style {
        CapStyle::Rounded => node.position + outward * node.radius,
        _ => node.position + outward * offset,
    };
    let center = out.add_vertex(tip, &node.id);
    fan(out, center, &inset, direction);
}

// =============================================================================
// FRAMES
// =============================================================================

/// Frames along a polyline. Tangents bisect the adjacent edge directions;
/// normals are parallel transported from the first node. On loops the
/// leftover twist is spread evenly so the last frame meets the first.
pub(super) fn frames(points: &[DVec3], closed: bool) -> Vec<Frame> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let tangents: Vec<DVec3> = (0..n).map(|i| tangent(points, i, closed)).collect();

    let mut normals = Vec::with_capacity(n);
    normals.push(perpendicular(tangents[0]));
    for i in 1..n {
        let previous = normals[i - 1];
        normals.push(transport(previous, tangents[i]));
    }

    if closed {
        let t0 = tangents[0];
        let wrapped = transport(normals[n - 1], t0);
        let angle = wrapped.cross(normals[0]).dot(t0).atan2(wrapped.dot(normals[0]));
        for (i, normal) in normals.iter_mut().enumerate().skip(1) {
            let rotation = DQuat::from_axis_angle(tangents[i], angle * i as f64 / n as f64);
            *normal = (rotation * *normal).normalize();
        }
    }

    tangents
        .into_iter()
        .zip(normals)
        .map(|(tangent, u)| Frame {
            tangent,
            u,
            v: tangent.cross(u),
        })
        .collect()
}

fn tangent(points: &[DVec3], i: usize, closed: bool) -> DVec3 {
    let n = points.len();
    let direction = |a: usize, b: usize| (points[b] - points[a]).normalize_or_zero();
    let (incoming, outgoing) = match (closed, i) {
        (false, 0) => return direction(0, 1),
        (false, i) if i == n - 1 => return direction(n - 2, n - 1),
        (_, i) => (direction((i + n - 1) % n, i), direction(i, (i + 1) % n)),
    };
    let bisector = incoming + outgoing;
    if bisector.length() < EPSILON {
        outgoing
    } else {
        bisector.normalize()
    }
}

/// Unit vector perpendicular to `tangent`, built from the least aligned axis.
fn perpendicular(tangent: DVec3) -> DVec3 {
    let abs = tangent.abs();
    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        DVec3::X
    } else if abs.y <= abs.z {
        DVec3::Y
    } else {
        DVec3::Z
    };
    (axis - tangent * tangent.dot(axis)).normalize()
}

fn transport(normal: DVec3, tangent: DVec3) -> DVec3 {
    let projected = normal - tangent * tangent.dot(normal);
    if projected.length() < EPSILON {
        perpendicular(tangent)
    } else {
        projected.normalize()
    }
}
