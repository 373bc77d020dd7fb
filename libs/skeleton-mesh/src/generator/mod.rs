//! # Mesh Generator
//!
//! One full regeneration of a snapshot. Runs on a worker thread; every
//! failure is absorbed into the returned [`Outcome`].
//!
//! ```text
//! Snapshot ─decode─► SkeletonGraph
//!     │
//!     ├─► PartMesher per part (rayon, cached by content hash)
//!     ├─► Subdivider for `subdived` parts
//!     ├─► Combiner (component tree, union / difference)
//!     ├─► SeamWelder passes until nothing collapses
//!     ├─► HoleFixer
//!     ├─► Quadifier
//!     └─► provenance, normals, colors, UV layout
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use config::constants::{DEFAULT_COLOR, WELD_MAX_PASSES};
use config::GenerationConfig;
use rayon::prelude::*;
use skeleton_snapshot::{Node, Part, SkeletonGraph, Snapshot};
use tracing::{debug, info, warn};

use crate::cache::{part_content_hash, GeneratedCacheContext};
use crate::combiner::Combiner;
use crate::fix_holes::fix_holes;
use crate::mesh::Mesh;
use crate::outcome::{Outcome, OutcomeEdge, OutcomeNode};
use crate::part_mesher::{mesh_part, PartMesh};
use crate::position_key::{EdgeKey, PositionKey};
use crate::postprocess;
use crate::provenance::resolve_vertex_sources;
use crate::quadify::quadify;
use crate::subdivide::subdivide;
use crate::uv::{layout_part_rects, triangle_uvs};
use crate::weld::weld_seam;

/// Generates the combined mesh of a snapshot.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use config::GenerationConfig;
/// use skeleton_mesh::MeshGenerator;
/// use skeleton_snapshot::{CombineMode, SnapshotBuilder};
///
/// let snapshot = SnapshotBuilder::new()
///     .tube_part("arm", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
///     .leaf_component("arm-component", "arm", CombineMode::Normal)
///     .root_children(&["arm-component"])
///     .build();
///
/// let outcome = MeshGenerator::new(Arc::new(snapshot), GenerationConfig::default()).generate();
/// assert!(outcome.succeeded);
/// assert!(outcome.mesh().is_closed());
/// ```
#[derive(Debug, Clone)]
pub struct MeshGenerator {
    snapshot: Arc<Snapshot>,
    config: GenerationConfig,
    cache: Option<Arc<GeneratedCacheContext>>,
}

impl MeshGenerator {
    pub fn new(snapshot: Arc<Snapshot>, config: GenerationConfig) -> Self {
        Self {
            snapshot,
            config,
            cache: None,
        }
    }

    /// Serves unchanged parts from `cache` and stores freshly meshed ones.
    pub fn with_cache(mut self, cache: Arc<GeneratedCacheContext>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Runs the whole pipeline.
    pub fn generate(&self) -> Outcome {
        let graph = match self.snapshot.decode() {
            Ok(graph) => graph,
            Err(error) => {
                warn!(%error, "snapshot decode failed");
                return Outcome::failed(format!("Snapshot could not be decoded: {error}"));
            }
        };
        info!(
            parts = graph.parts.len(),
            components = graph.tree.len(),
            "mesh generation started"
        );

        let mut outcome = Outcome {
            error_count: graph.issues.len(),
            messages: graph.issues.clone(),
            snapshot: Some(Arc::clone(&self.snapshot)),
            ..Outcome::default()
        };
        let part_meshes = self.mesh_parts(&graph, &mut outcome);

        let combined = Combiner::new(&graph, &part_meshes).combine();
        outcome.error_count += combined.error_count;
        outcome.messages.extend(combined.messages);

        let excluded: HashSet<PositionKey> = part_meshes
            .values()
            .flat_map(PartMesh::seam_excluded_positions)
            .collect();
        let mut mesh = self.weld(combined.mesh, &excluded, &mut outcome);

        let holes = fix_holes(&mut mesh);
        if holes.unfixed > 0 {
            outcome
                .messages
                .push(format!("{} hole(s) could not be fixed", holes.unfixed));
        }
        mesh.merge(&combined.uncombined);

        let shared_edges: HashSet<EdgeKey> = part_meshes
            .values()
            .flat_map(|part| part.shared_quad_edges.iter().copied())
            .collect();
        outcome.triangle_and_quads = quadify(&mesh, &shared_edges);

        let (vertices, triangles) = mesh.into_parts();
        outcome.vertices = vertices;
        outcome.triangles = triangles
            .into_iter()
            .map(|triangle| triangle.map(|v| v as usize))
            .collect();
        for part_id in &combined.rejected_parts {
            if let Some(part) = part_meshes.get(part_id) {
                append_raw_faces(&mut outcome, &part.mesh);
            }
        }

        let (nodes, edges) = outcome_skeleton(&graph);
        outcome.nodes = nodes;
        outcome.edges = edges;
        outcome.vertex_sources =
            resolve_vertex_sources(&outcome.vertices, &part_meshes, &outcome.nodes);
        postprocess::apply(&mut outcome, &self.config);

        outcome.part_uv_rects = layout_part_rects(part_meshes.keys().map(String::as_str));
        outcome.triangle_uvs = triangle_uvs(
            &outcome.vertices,
            &outcome.triangles,
            &outcome.triangle_normals,
            &outcome.triangle_sources,
            &outcome.part_uv_rects,
        );

        outcome.succeeded = outcome.error_count == 0;
        info!(
            vertices = outcome.vertex_count(),
            triangles = outcome.triangle_count(),
            errors = outcome.error_count,
            "mesh generation finished"
        );
        outcome
    }

    fn mesh_parts(&self, graph: &SkeletonGraph, outcome: &mut Outcome) -> BTreeMap<String, PartMesh> {
        let segments = self.config.profile_segments;
        let parts: Vec<&Part> = graph.generated_parts().collect();

        let results: Vec<Option<PartMesh>> = parts
            .par_iter()
            .map(|part| {
                let Some(cache) = &self.cache else {
                    return mesh_part(graph, part, segments);
                };
                let hash = part_content_hash(&self.snapshot, graph, part, segments);
                if let Some(cached) = cache.get(&part.id, hash) {
                    debug!(part = %part.id, "part served from cache");
                    return cached;
                }
                let mesh = mesh_part(graph, part, segments);
                cache.insert(&part.id, hash, mesh.clone());
                mesh
            })
            .collect();
        if let Some(cache) = &self.cache {
            cache.retain(|id| graph.parts.contains_key(id));
        }

        let mut meshes = BTreeMap::new();
        for (part, result) in parts.into_iter().zip(results) {
            let Some(mut part_mesh) = result else {
                info!(part = %part.id, "part produced no geometry");
                continue;
            };
            if part.subdived {
                match subdivide(&part_mesh.mesh) {
                    Ok(subdivided) => {
                        debug!(part = %part.id, method = ?subdivided.method, "part subdivided");
                        part_mesh.mesh = subdivided.mesh;
                        part_mesh.shared_quad_edges = subdivided.quad_edges;
                    }
                    Err(error) => {
                        warn!(part = %part.id, %error, "subdivision skipped");
                        outcome.error_count += 1;
                        outcome
                            .messages
                            .push(format!("Subdivision of {} skipped: {error}", part.id));
                    }
                }
            }
            meshes.insert(part.id.clone(), part_mesh);
        }
        meshes
    }

    fn weld(&self, mut mesh: Mesh, excluded: &HashSet<PositionKey>, outcome: &mut Outcome) -> Mesh {
        if self.config.weld_distance <= 0.0 {
            return mesh;
        }
        for pass in 0..WELD_MAX_PASSES {
            let result = weld_seam(&mesh, self.config.weld_distance, excluded);
            mesh = result.mesh;
            if result.broken_chains > 0 {
                outcome.error_count += 1;
                outcome.messages.push(format!(
                    "{} triangle(s) dropped on cyclic weld chains",
                    result.broken_chains
                ));
            }
            if result.affected == 0 {
                debug!(passes = pass + 1, "seam welding converged");
                break;
            }
        }
        mesh
    }
}

/// Appends a mesh to the vertex and face lists without touching the
/// triangle surface.
fn append_raw_faces(outcome: &mut Outcome, mesh: &Mesh) {
    let offset = outcome.vertices.len();
    outcome.vertices.extend_from_slice(mesh.vertices());
    outcome.triangle_and_quads.extend(
        mesh.triangles()
            .iter()
            .map(|triangle| triangle.iter().map(|&v| v as usize + offset).collect()),
    );
}

/// Nodes and edges of every generated part; `xMirrored` parts also get
/// mirrored node copies.
fn outcome_skeleton(graph: &SkeletonGraph) -> (Vec<OutcomeNode>, Vec<OutcomeEdge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for part in graph.generated_parts() {
        let color = graph.part_color(part).unwrap_or(DEFAULT_COLOR);
        let outcome_node = |node: &Node| OutcomeNode {
            part_id: part.id.clone(),
            node_id: node.id.clone(),
            origin: node.position,
            radius: node.radius,
            color,
            bone_mark: node.bone_mark,
            mirror_from_part_id: None,
        };
        nodes.extend(graph.part_nodes(part).map(outcome_node));
        if part.x_mirrored {
            nodes.extend(graph.part_nodes(part).map(|node| {
                let mut mirrored = outcome_node(node);
                mirrored.origin.x = -mirrored.origin.x;
                mirrored.mirror_from_part_id = Some(part.id.clone());
                mirrored
            }));
        }
        edges.extend(graph.part_edges(part).map(|edge| OutcomeEdge {
            part_id: part.id.clone(),
            from_node_id: edge.from.clone(),
            to_node_id: edge.to.clone(),
        }));
    }
    (nodes, edges)
}
