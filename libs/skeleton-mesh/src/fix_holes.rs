//! # Hole Filling
//!
//! Best-effort repair of boundary loops left by failed booleans or welding.
//! Boundary edges are chained into rings and each ring is closed with a fan
//! around its centroid. Rings that cannot be traced are reported, never
//! rejected.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use tracing::debug;

use crate::mesh::Mesh;

/// What a hole-filling pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoleReport {
    pub filled: usize,
    pub unfixed: usize,
    pub added_triangles: usize,
}

/// Fills the boundary loops of `mesh` in place.
pub fn fix_holes(mesh: &mut Mesh) -> HoleReport {
    // Boundary edge a -> b is linked b -> a, so rings come out in the
    // winding the patch needs.
    let mut links: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (a, b) in mesh.boundary_edges() {
        links.entry(b).or_default().push(a);
    }
    let link_count: usize = links.values().map(Vec::len).sum();

    let mut report = HoleReport::default();
    let mut rings = Vec::new();
    let starts: Vec<u32> = links.keys().copied().collect();
    for start in starts {
        while links.get(&start).is_some_and(|targets| !targets.is_empty()) {
            match trace_ring(&links, start, link_count) {
                Some(ring) => {
                    remove_ring(&mut links, &ring);
                    if ring.len() >= 3 {
                        rings.push(ring);
                    } else {
                        report.unfixed += 1;
                    }
                }
                None => {
                    if let Some(targets) = links.get_mut(&start) {
                        targets.remove(0);
                    }
                    report.unfixed += 1;
                }
            }
        }
    }

    for ring in rings {
        let center = ring.iter().map(|&v| mesh.vertex(v)).sum::<DVec3>() / ring.len() as f64;
        let center = mesh.add_vertex(center);
        for i in 0..ring.len() {
            mesh.add_triangle(center, ring[i], ring[(i + 1) % ring.len()]);
        }
        report.filled += 1;
        report.added_triangles += ring.len();
    }

    if report.filled > 0 || report.unfixed > 0 {
        debug!(filled = report.filled, unfixed = report.unfixed, "hole filling");
    }
    report
}

fn trace_ring(links: &BTreeMap<u32, Vec<u32>>, start: u32, limit: usize) -> Option<Vec<u32>> {
    let mut ring = vec![start];
    let mut seen: HashMap<u32, usize> = HashMap::from([(start, 0)]);
    let mut current = start;
    while ring.len() <= limit {
        let targets = links.get(&current)?;
        let next = if targets.contains(&start) {
            start
        } else {
            *targets.first()?
        };
        if next == start {
            return Some(ring);
        }
        if let Some(&index) = seen.get(&next) {
            return Some(ring.split_off(index));
        }
        seen.insert(next, ring.len());
        ring.push(next);
        current = next;
    }
    None
}

fn remove_ring(links: &mut BTreeMap<u32, Vec<u32>>, ring: &[u32]) {
    for i in 0..ring.len() {
        let (from, to) = (ring[i], ring[(i + 1) % ring.len()]);
        if let Some(targets) = links.get_mut(&from) {
            if let Some(position) = targets.iter().position(|&t| t == to) {
                targets.remove(position);
            }
        }
    }
}
