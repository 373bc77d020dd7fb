//! Gridded parts: one tube per chain, one convex joint per branch node.

use std::collections::BTreeMap;

use glam::DVec3;
use tracing::{debug, warn};

use super::{tube, CapStyle, Chain, PartMesh, PartSkeleton};
use crate::hull::convex_hull;

/// Sweeps every chain, hulls the end rings meeting at each branch node and
/// unions all pieces into one surface.
pub(super) fn assemble(
    skeleton: &PartSkeleton,
    chains: &[Chain],
    terminal_cap: CapStyle,
    part_id: &str,
) -> PartMesh {
    let cap_at = |node: usize| {
        if skeleton.degree(node) == 1 {
            terminal_cap
        } else {
            CapStyle::Flat
        }
    };

    let mut joint_points: BTreeMap<usize, Vec<DVec3>> = BTreeMap::new();
    let mut pieces = Vec::with_capacity(chains.len());
    for chain in chains {
        let (Some(&first), Some(&last)) = (chain.nodes.first(), chain.nodes.last()) else {
            continue;
        };
        let mut piece = PartMesh::default();
        let ends = tube::sweep(skeleton, chain, cap_at(first), cap_at(last), &mut piece);
        if skeleton.degree(first) >= 3 {
            joint_points.entry(first).or_default().extend(ends.start);
        }
        if skeleton.degree(last) >= 3 {
            joint_points.entry(last).or_default().extend(ends.end);
        }
        pieces.push(piece);
    }

    for (node, points) in joint_points {
        let id = &skeleton.nodes[node].id;
        match convex_hull(&points) {
            Ok(hull) => {
                let mut piece = PartMesh::default();
                for &position in hull.vertices() {
                    piece.add_vertex(position, id);
                }
                for &[a, b, c] in hull.triangles() {
                    piece.add_triangle(a, b, c);
                }
                pieces.push(piece);
            }
            Err(error) => warn!(part = %part_id, node = %id, %error, "skipping branch joint"),
        }
    }

    debug!(part = %part_id, pieces = pieces.len(), "assembling gridded part");
    pieces.into_iter().reduce(PartMesh::union).unwrap_or_default()
}
