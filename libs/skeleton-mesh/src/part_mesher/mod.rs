//! # Part Mesher
//!
//! Skins one part's node/edge graph into a closed triangle surface.
//!
//! ## Pipeline
//!
//! ```text
//! Part ─► PartSkeleton (validated) ─► chains ─► swept tubes ─┐
//!                                   └► branch nodes ─► hulls ─┴► union ─► mirror
//! ```
//!
//! Non-branching parts are a single tube (or a ring-closed tube for loops).
//! Parts with a node of degree ≥ 3 are split into chains between branch and
//! terminal nodes; every branch node gets a joint hull spanning the end
//! rings of its incident chains.

mod joint;
mod profile;
mod tube;

use std::collections::{HashMap, HashSet, VecDeque};

use config::constants::{EPSILON, MIN_NODE_RADIUS};
use glam::{DVec2, DVec3};
use skeleton_snapshot::{CutFace, Part, SkeletonGraph};
use tracing::{debug, warn};

use crate::csg;
use crate::mesh::Mesh;
use crate::position_key::{edge_key, EdgeKey, PositionKey};

pub use profile::{normalize as normalize_profile, resample as resample_profile};

// =============================================================================
// PART MESH
// =============================================================================

/// Surface generated for one part, with the metadata later stages need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartMesh {
    pub mesh: Mesh,
    /// Diagonals of the quads the sweep triangulated
    pub shared_quad_edges: HashSet<EdgeKey>,
    /// Source node of every generated position
    pub node_vertices: Vec<(DVec3, String)>,
}

impl PartMesh {
    /// Adds a vertex generated for `node_id`.
    pub fn add_vertex(&mut self, position: DVec3, node_id: &str) -> u32 {
        self.node_vertices.push((position, node_id.to_string()));
        self.mesh.add_vertex(position)
    }

    /// Adds a triangle.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.mesh.add_triangle(a, b, c);
    }

    /// Adds the quad `a b c d` as triangles `a b c` and `a c d`, recording
    /// the `a c` diagonal as a shared quad edge.
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.mesh.add_triangle(a, b, c);
        self.mesh.add_triangle(a, c, d);
        self.shared_quad_edges
            .insert(edge_key(self.mesh.vertex(a), self.mesh.vertex(c)));
    }

    /// Positions produced by skinning; welding never touches them.
    pub fn seam_excluded_positions(&self) -> HashSet<PositionKey> {
        self.mesh.vertices().iter().copied().map(PositionKey::new).collect()
    }

    /// Unions another part surface into this one, concatenating when the
    /// surfaces are disjoint or the boolean fails.
    pub fn union(mut self, other: PartMesh) -> PartMesh {
        self.mesh = match csg::union(&self.mesh, &other.mesh) {
            Ok(mesh) => mesh,
            Err(error) => {
                warn!(%error, "part piece union failed, concatenating");
                let mut merged = self.mesh.clone();
                merged.merge(&other.mesh);
                merged
            }
        };
        self.shared_quad_edges.extend(other.shared_quad_edges);
        self.node_vertices.extend(other.node_vertices);
        self
    }

    /// Copy mirrored across the YZ plane.
    pub fn mirrored_x(&self) -> PartMesh {
        let mirror = |p: DVec3| DVec3::new(-p.x, p.y, p.z);
        PartMesh {
            mesh: self.mesh.mirrored_x(),
            shared_quad_edges: self
                .mesh
                .triangles()
                .iter()
                .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
                .map(|(a, b)| (self.mesh.vertex(a), self.mesh.vertex(b)))
                .filter(|&(a, b)| self.shared_quad_edges.contains(&edge_key(a, b)))
                .map(|(a, b)| edge_key(mirror(a), mirror(b)))
                .collect(),
            node_vertices: self
                .node_vertices
                .iter()
                .map(|(p, id)| (mirror(*p), id.clone()))
                .collect(),
        }
    }
}

// =============================================================================
// PART SKELETON
// =============================================================================

/// A validated node of the part with its resolved cross-section.
#[derive(Debug, Clone)]
struct SkinNode {
    id: String,
    position: DVec3,
    radius: f64,
    /// Rotated, deformed profile, counter-clockwise
    profile: Vec<DVec2>,
}

/// How the surface ends at a terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapStyle {
    Flat,
    Rounded,
    Chamfered,
}

/// A run of nodes between branch or terminal nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chain {
    nodes: Vec<usize>,
    closed: bool,
}

/// Validated adjacency of one part.
#[derive(Debug)]
struct PartSkeleton {
    nodes: Vec<SkinNode>,
    neighbors: Vec<Vec<usize>>,
}

impl PartSkeleton {
    /// Builds the skeleton, or `None` if the graph cannot be skinned.
    fn extract(graph: &SkeletonGraph, part: &Part, segments: usize) -> Option<Self> {
        let nodes: Vec<_> = graph.part_nodes(part).collect();
        if nodes.len() < 2 {
            debug!(part = %part.id, "part has fewer than 2 nodes");
            return None;
        }

        let part_profile = profile::resolve(&part.cut_face, graph, segments);
        let profile_len = part_profile.len();
        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        let mut skin_nodes = Vec::with_capacity(nodes.len());
        for node in &nodes {
            if !node.position.is_finite() || node.radius.is_nan() || node.radius < MIN_NODE_RADIUS {
                debug!(part = %part.id, node = %node.id, "node radius or position is invalid");
                return None;
            }
            let base = match &node.cut_face {
                Some(face) if *face != part.cut_face => {
                    profile::resample(&profile::resolve(face, graph, segments), profile_len)
                }
                _ => part_profile.clone(),
            };
            let rotation = node.cut_rotation.unwrap_or(part.cut_rotation) * std::f64::consts::PI;
            let (sin, cos) = rotation.sin_cos();
            let mut shaped: Vec<DVec2> = base
                .iter()
                .map(|p| {
                    DVec2::new(
                        (p.x * cos - p.y * sin) * part.deform_width,
                        (p.x * sin + p.y * cos) * part.deform_thickness,
                    )
                })
                .collect();
            if profile::signed_area(&shaped) < 0.0 {
                shaped.reverse();
            }
            index_of.insert(node.id.as_str(), skin_nodes.len());
            skin_nodes.push(SkinNode {
                id: node.id.clone(),
                position: node.position,
                radius: node.radius,
                profile: shaped,
            });
        }

        let mut neighbors = vec![Vec::new(); skin_nodes.len()];
        let mut edge_count = 0;
        for edge in graph.part_edges(part) {
            let (Some(&a), Some(&b)) = (index_of.get(edge.from.as_str()), index_of.get(edge.to.as_str())) else {
                debug!(part = %part.id, edge = %edge.id, "edge references a missing node");
                return None;
            };
            if a == b {
                debug!(part = %part.id, edge = %edge.id, "edge is a self loop");
                return None;
            }
            if skin_nodes[a].position.distance(skin_nodes[b].position) < EPSILON {
                debug!(part = %part.id, edge = %edge.id, "edge connects coincident nodes");
                return None;
            }
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
                neighbors[b].push(a);
                edge_count += 1;
            }
        }
        if edge_count == 0 {
            debug!(part = %part.id, "part has no edges");
            return None;
        }

        let mut seen = vec![false; skin_nodes.len()];
        let mut queue = VecDeque::from([0usize]);
        seen[0] = true;
        while let Some(current) = queue.pop_front() {
            for &next in &neighbors[current] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if seen.iter().any(|s| !s) {
            debug!(part = %part.id, "part graph is not connected");
            return None;
        }

        Some(Self {
            nodes: skin_nodes,
            neighbors,
        })
    }

    fn degree(&self, node: usize) -> usize {
        self.neighbors[node].len()
    }

    fn is_branched(&self) -> bool {
        (0..self.nodes.len()).any(|n| self.degree(n) >= 3)
    }

    /// Splits the graph into chains. A graph without branch nodes yields one
    /// chain: a path from its first terminal node, or a closed loop.
    fn chains(&self) -> Vec<Chain> {
        let anchors: Vec<usize> = (0..self.nodes.len())
            .filter(|&n| self.degree(n) != 2)
            .collect();
        if anchors.is_empty() {
            return vec![self.walk_loop()];
        }

        let mut used: HashSet<(usize, usize)> = HashSet::new();
        let mut chains = Vec::new();
        for &start in &anchors {
            for &first in &self.neighbors[start] {
                if used.contains(&(start, first)) {
                    continue;
                }
                let mut nodes = vec![start, first];
                used.insert((start, first));
                used.insert((first, start));
                while self.degree(nodes[nodes.len() - 1]) == 2 {
                    let current = nodes[nodes.len() - 1];
                    let previous = nodes[nodes.len() - 2];
                    let Some(&next) = self.neighbors[current].iter().find(|&&n| n != previous) else {
                        break;
                    };
                    used.insert((current, next));
                    used.insert((next, current));
                    nodes.push(next);
                    if next == start {
                        break;
                    }
                }
                chains.push(Chain {
                    nodes,
                    closed: false,
                });
            }
        }
        chains
    }

    fn walk_loop(&self) -> Chain {
        let mut nodes = vec![0usize];
        let mut previous = usize::MAX;
        let mut current = 0usize;
        loop {
            let Some(&next) = self.neighbors[current].iter().find(|&&n| n != previous) else {
                break;
            };
            if next == 0 {
                break;
            }
            nodes.push(next);
            previous = current;
            current = next;
        }
        Chain {
            nodes,
            closed: true,
        }
    }
}

// =============================================================================
// PART MESHER
// =============================================================================

/// Generates the surface of one part.
///
/// # Example
///
/// ```rust
/// use skeleton_mesh::PartMesher;
/// use skeleton_snapshot::SnapshotBuilder;
///
/// let graph = SnapshotBuilder::new()
///     .tube_part("arm", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
///     .build()
///     .decode()
///     .unwrap();
/// let part_mesh = PartMesher::new(&graph, &graph.parts["arm"], 8).build().unwrap();
/// assert!(part_mesh.mesh.is_closed());
/// ```
pub struct PartMesher<'a> {
    graph: &'a SkeletonGraph,
    part: &'a Part,
    segments: usize,
}

impl<'a> PartMesher<'a> {
    /// Creates a mesher; `segments` is the circle profile resolution.
    pub fn new(graph: &'a SkeletonGraph, part: &'a Part, segments: usize) -> Self {
        Self {
            graph,
            part,
            segments,
        }
    }

    /// Builds the part surface, or `None` for degenerate input.
    pub fn build(&self) -> Option<PartMesh> {
        let skeleton = PartSkeleton::extract(self.graph, self.part, self.segments)?;
        let terminal_cap = if self.part.rounded {
            CapStyle::Rounded
        } else if self.part.chamfered {
            CapStyle::Chamfered
        } else {
            CapStyle::Flat
        };

        let chains = skeleton.chains();
        let mut surface = if skeleton.is_branched() {
            joint::assemble(&skeleton, &chains, terminal_cap, &self.part.id)
        } else {
            let chain = chains.first()?;
            let mut surface = PartMesh::default();
            tube::sweep(&skeleton, chain, terminal_cap, terminal_cap, &mut surface);
            surface
        };
        if surface.mesh.is_empty() {
            return None;
        }

        if self.part.x_mirrored {
            let mirrored = surface.mirrored_x();
            let disjoint = match (surface.mesh.bounding_box(), mirrored.mesh.bounding_box()) {
                (Some(a), Some(b)) => !a.overlaps(&b, 0.0),
                _ => true,
            };
            surface = if disjoint {
                let mut merged = surface;
                merged.mesh.merge(&mirrored.mesh);
                merged.shared_quad_edges.extend(mirrored.shared_quad_edges);
                merged.node_vertices.extend(mirrored.node_vertices);
                merged
            } else {
                surface.union(mirrored)
            };
        }

        debug!(
            part = %self.part.id,
            vertices = surface.mesh.vertex_count(),
            triangles = surface.mesh.triangle_count(),
            "part meshed"
        );
        Some(surface)
    }
}

/// Convenience for callers that do not keep the mesher around.
pub fn mesh_part(graph: &SkeletonGraph, part: &Part, segments: usize) -> Option<PartMesh> {
    PartMesher::new(graph, part, segments).build()
}

/// Ids of the parts whose nodes define this part's cross-sections.
pub fn linked_profile_parts<'g>(graph: &'g SkeletonGraph, part: &'g Part) -> Vec<&'g str> {
    let mut linked: Vec<&str> = std::iter::once(&part.cut_face)
        .chain(graph.part_nodes(part).filter_map(|node| node.cut_face.as_ref()))
        .filter_map(|face| match face {
            CutFace::UserDefined(id) => Some(id.as_str()),
            _ => None,
        })
        .collect();
    linked.sort_unstable();
    linked.dedup();
    linked
}

#[cfg(test)]
mod tests;
