//! # Component Combiner
//!
//! Folds the component tree into one surface, children before parents.
//!
//! ```text
//! group ─┬─ child 1 (seed)
//!        ├─ child 2 Normal     acc = acc ∪ child
//!        ├─ child 3 Inversion  acc = acc − child
//!        └─ child 4 Uncombined appended as-is, no boolean
//! ```
//!
//! Candidates are screened with the exact self-intersection test first; a
//! self-intersecting mesh is dropped and counted. A failing boolean keeps
//! the accumulator and is counted too. Nothing here aborts the fold.

use std::collections::{BTreeMap, HashMap};

use skeleton_snapshot::{CombineMode, ComponentLink, SkeletonGraph};
use tracing::{debug, warn};

use crate::csg::{self, find_self_intersection, BooleanOp};
use crate::mesh::Mesh;
use crate::part_mesher::PartMesh;

/// Result of folding the component tree.
#[derive(Debug, Clone, Default)]
pub struct Combined {
    pub mesh: Mesh,
    /// Values of `Uncombined` components, concatenated
    pub uncombined: Mesh,
    pub error_count: usize,
    pub messages: Vec<String>,
    /// Parts whose mesh was refused as self-intersecting
    pub rejected_parts: Vec<String>,
}

/// Folds a decoded component tree over generated part meshes.
pub struct Combiner<'a> {
    graph: &'a SkeletonGraph,
    part_meshes: &'a BTreeMap<String, PartMesh>,
}

impl<'a> Combiner<'a> {
    /// Creates a combiner. Parts missing from `part_meshes` contribute
    /// nothing (disabled, invisible or failed meshing).
    pub fn new(graph: &'a SkeletonGraph, part_meshes: &'a BTreeMap<String, PartMesh>) -> Self {
        Self { graph, part_meshes }
    }

    /// Runs the fold.
    pub fn combine(&self) -> Combined {
        let mut combined = Combined::default();
        let mut values: HashMap<String, Mesh> = HashMap::new();

        for id in self.graph.tree.post_order() {
            let Some(component) = self.graph.components.get(&id) else {
                continue;
            };
            let value = match &component.link {
                ComponentLink::Part(part_id) => self
                    .part_meshes
                    .get(part_id)
                    .map(|part| part.mesh.clone())
                    .unwrap_or_default(),
                ComponentLink::Children(children) => {
                    self.fold(&id, children, &mut values, &mut combined)
                }
            };
            values.insert(id, value);
        }

        combined.mesh = self.fold("root", self.graph.tree.roots(), &mut values, &mut combined);
        debug!(
            triangles = combined.mesh.triangle_count(),
            errors = combined.error_count,
            rejected = combined.rejected_parts.len(),
            "component tree combined"
        );
        combined
    }

    fn fold(
        &self,
        group: &str,
        children: &[String],
        values: &mut HashMap<String, Mesh>,
        combined: &mut Combined,
    ) -> Mesh {
        let mut accumulator: Option<Mesh> = None;
        for child in children {
            let Some(value) = values.remove(child) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let component = self.graph.components.get(child);
            let mode = component.map_or(CombineMode::Normal, |c| c.combine_mode);
            if mode == CombineMode::Uncombined {
                combined.uncombined.merge(&value);
                continue;
            }

            if let Some((first, second)) = find_self_intersection(&value) {
                let source = component.and_then(|c| c.part_id()).unwrap_or(child.as_str());
                let message = format!(
                    "{source} is self-intersecting (triangles {first} and {second}), excluded from {group}"
                );
                warn!(component = %child, %message, "candidate rejected");
                combined.error_count += 1;
                combined.messages.push(message);
                if let Some(part_id) = component.and_then(|c| c.part_id()) {
                    combined.rejected_parts.push(part_id.to_string());
                }
                continue;
            }

            accumulator = Some(match accumulator {
                None => value,
                Some(current) => {
                    let op = match mode {
                        CombineMode::Inversion => BooleanOp::Difference,
                        _ => BooleanOp::Union,
                    };
                    match csg::boolean(&current, &value, op) {
                        Ok(result) => result,
                        Err(error) => {
                            warn!(component = %child, op = op.name(), %error, "boolean failed, operand dropped");
                            combined.error_count += 1;
                            combined.messages.push(format!("{} of {child} failed: {error}", op.name()));
                            current
                        }
                    }
                }
            });
        }
        accumulator.unwrap_or_default()
    }
}
