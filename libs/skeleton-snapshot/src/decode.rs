//! # Snapshot Decoding
//!
//! Turns the raw string maps of a [`Snapshot`] into typed values and checks
//! the structural invariants generation relies on:
//!
//! - the component graph rooted at `rootComponent` is a tree
//! - `gridded` is derived from node degrees, never trusted from input
//!
//! A cycle or a shared child fails the decode. Everything else is local:
//! a malformed entity is dropped, a dangling link is cut, and each case is
//! listed in [`SkeletonGraph::issues`] so generation can count it. Dropping
//! a node leaves its part degenerate; the part mesher rejects such parts
//! individually so the rest of the skeleton still generates.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::DVec3;
use tracing::{debug, warn};

use crate::error::{Result, SnapshotError};
use crate::model::{
    parse_color, parse_flag, BoneMark, CombineMode, Component, ComponentLink, CutFace, Edge,
    Material, Motion, MotionClip, MotionClipKind, Node, Part, PartTarget, Pose,
};
use crate::snapshot::{Attributes, Snapshot};

// =============================================================================
// SKELETON GRAPH
// =============================================================================

/// Typed view over a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGraph {
    pub canvas_origin: DVec3,
    pub nodes: BTreeMap<String, Node>,
    pub edges: BTreeMap<String, Edge>,
    pub parts: BTreeMap<String, Part>,
    pub components: BTreeMap<String, Component>,
    pub materials: BTreeMap<String, Material>,
    pub poses: BTreeMap<String, Pose>,
    pub motions: BTreeMap<String, Motion>,
    pub tree: ComponentTree,
    /// Entities dropped or links cut while decoding, one message each
    pub issues: Vec<String>,
}

impl SkeletonGraph {
    /// Nodes of one part, in node id order.
    pub fn part_nodes<'a>(&'a self, part: &'a Part) -> impl Iterator<Item = &'a Node> + 'a {
        part.node_ids.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Edges of one part, in edge id order.
    pub fn part_edges<'a>(&'a self, part: &'a Part) -> impl Iterator<Item = &'a Edge> + 'a {
        part.edge_ids.iter().filter_map(|id| self.edges.get(id))
    }

    /// Parts that generation should mesh, in id order.
    pub fn generated_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values().filter(|part| part.is_generated())
    }

    /// Looks up a part's color, falling back to its material's color.
    pub fn part_color(&self, part: &Part) -> Option<[f32; 4]> {
        part.color.or_else(|| {
            part.material_id
                .as_ref()
                .and_then(|id| self.materials.get(id))
                .and_then(|material| material.color)
        })
    }
}

// =============================================================================
// COMPONENT TREE
// =============================================================================

/// Validated component hierarchy.
///
/// Only components reachable from the root are part of the tree; each of
/// them is reachable exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTree {
    roots: Vec<String>,
    children: BTreeMap<String, Vec<String>>,
    parents: BTreeMap<String, Option<String>>,
}

impl ComponentTree {
    /// Builds the tree from the root's children, rejecting cycles, shared
    /// children and unknown ids.
    pub fn build(roots: Vec<String>, components: &BTreeMap<String, Component>) -> Result<Self> {
        let mut tree = Self {
            roots: roots.clone(),
            ..Self::default()
        };

        let mut stack: Vec<(String, Option<String>)> =
            roots.into_iter().rev().map(|id| (id, None)).collect();

        while let Some((id, parent)) = stack.pop() {
            if tree.parents.contains_key(&id) {
                return Err(SnapshotError::topology(format!(
                    "component {id} is reachable more than once"
                )));
            }
            let component = components.get(&id).ok_or_else(|| {
                SnapshotError::dangling(
                    "component",
                    parent.clone().unwrap_or_else(|| "root".to_string()),
                    "component",
                    id.clone(),
                )
            })?;
            tree.parents.insert(id.clone(), parent);

            let children = component.children().to_vec();
            for child in children.iter().rev() {
                stack.push((child.clone(), Some(id.clone())));
            }
            tree.children.insert(id, children);
        }

        let unreachable = components
            .keys()
            .filter(|id| !tree.parents.contains_key(*id))
            .count();
        if unreachable > 0 {
            debug!(unreachable, "components not reachable from root are ignored");
        }

        Ok(tree)
    }

    /// Top-level component ids in order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Ordered children of a component.
    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of a component; `None` for top-level components and unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|parent| parent.as_deref())
    }

    /// Returns true if the component is part of the tree.
    pub fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    /// Number of components in the tree.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns true if no component is reachable from the root.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Component ids in post order (children before parents, siblings in order).
    ///
    /// Iterative, so deep hierarchies cannot overflow the stack.
    pub fn post_order(&self) -> Vec<String> {
        let mut order = Vec::with_capacity(self.parents.len());
        let mut stack: Vec<(&str, bool)> = self
            .roots
            .iter()
            .rev()
            .map(|id| (id.as_str(), false))
            .collect();

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id.to_string());
                continue;
            }
            stack.push((id, true));
            for child in self.children_of(id).iter().rev() {
                stack.push((child.as_str(), false));
            }
        }

        order
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a snapshot. See the module documentation for what is validated.
///
/// Only an ill-formed component hierarchy fails the whole decode. A
/// malformed or dangling entity is dropped (or its link cut) and reported in
/// [`SkeletonGraph::issues`].
pub fn decode(snapshot: &Snapshot) -> Result<SkeletonGraph> {
    let mut issues = Vec::new();
    let mut canvas = |key: &str| {
        absorb(&mut issues, optional_number(&snapshot.canvas, "canvas", "", key))
            .flatten()
            .unwrap_or(0.0)
    };
    let canvas_origin = DVec3::new(canvas("originX"), canvas("originY"), canvas("originZ"));

    let mut parts = BTreeMap::new();
    for (id, attributes) in &snapshot.parts {
        if let Some(part) = absorb(&mut issues, decode_part(id, attributes)) {
            parts.insert(id.clone(), part);
        }
    }

    let mut nodes = BTreeMap::new();
    for (id, attributes) in &snapshot.nodes {
        let Some(node) = absorb(&mut issues, decode_node(id, attributes, canvas_origin)).flatten()
        else {
            continue;
        };
        match parts.get_mut(&node.part_id) {
            Some(part) => part.node_ids.push(id.clone()),
            None => {
                warn!(node = %id, part = %node.part_id, "node references unknown part, dropped");
                issues.push(SnapshotError::dangling("node", id.clone(), "part", node.part_id).to_string());
                continue;
            }
        }
        nodes.insert(id.clone(), node);
    }

    let mut edges = BTreeMap::new();
    for (id, attributes) in &snapshot.edges {
        let Some(edge) = absorb(&mut issues, decode_edge(id, attributes)) else {
            continue;
        };
        match parts.get_mut(&edge.part_id) {
            Some(part) => part.edge_ids.push(id.clone()),
            None => {
                warn!(edge = %id, part = %edge.part_id, "edge references unknown part, dropped");
                issues.push(SnapshotError::dangling("edge", id.clone(), "part", edge.part_id).to_string());
                continue;
            }
        }
        edges.insert(id.clone(), edge);
    }

    for part in parts.values_mut() {
        part.gridded = has_branch_node(part, &edges);
    }

    let mut components = BTreeMap::new();
    for (id, attributes) in &snapshot.components {
        let Some(component) = absorb(&mut issues, decode_component(id, attributes)) else {
            continue;
        };
        if let Some(part_id) = component.part_id() {
            // A leaf whose part is gone stays in the tree and contributes nothing
            match parts.get_mut(part_id) {
                Some(part) => part.component_id = Some(id.clone()),
                None => {
                    let error = SnapshotError::dangling("component", id.clone(), "part", part_id);
                    warn!(%error, "leaf component contributes nothing");
                    issues.push(error.to_string());
                }
            }
        }
        components.insert(id.clone(), component);
    }

    let roots = prune_unknown_children(
        "root",
        split_list(snapshot.root_component.get("children").map(String::as_str)),
        &components,
        &mut issues,
    );
    let ids: Vec<String> = components.keys().cloned().collect();
    for id in ids {
        let children = components
            .get(&id)
            .map(|component| component.children().to_vec())
            .unwrap_or_default();
        if children.is_empty() {
            continue;
        }
        let kept = prune_unknown_children(&id, children, &components, &mut issues);
        if let Some(component) = components.get_mut(&id) {
            component.link = ComponentLink::Children(kept);
        }
    }

    let tree = ComponentTree::build(roots, &components)?;
    for (id, component) in components.iter_mut() {
        component.parent_id = tree.parent_of(id).map(str::to_string);
    }

    let mut materials = BTreeMap::new();
    for (id, attributes) in &snapshot.materials {
        if let Some(material) = absorb(&mut issues, decode_material(id, attributes)) {
            materials.insert(id.clone(), material);
        }
    }

    let mut poses = BTreeMap::new();
    for (id, attributes) in &snapshot.poses {
        let parameters = snapshot.pose_parameters.get(id);
        if let Some(pose) = absorb(&mut issues, decode_pose(id, attributes, parameters)) {
            poses.insert(id.clone(), pose);
        }
    }

    let mut motions = BTreeMap::new();
    for (id, attributes) in &snapshot.motions {
        let clips = snapshot.motion_clips.get(id).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(motion) = absorb(&mut issues, decode_motion(id, attributes, clips)) {
            motions.insert(id.clone(), motion);
        }
    }

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        parts = parts.len(),
        components = components.len(),
        issues = issues.len(),
        "snapshot decoded"
    );

    Ok(SkeletonGraph {
        canvas_origin,
        nodes,
        edges,
        parts,
        components,
        materials,
        poses,
        motions,
        tree,
        issues,
    })
}

/// Records a per-entity error and drops the entity.
fn absorb<T>(issues: &mut Vec<String>, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%error, "snapshot entity dropped");
            issues.push(error.to_string());
            None
        }
    }
}

fn prune_unknown_children(
    parent: &str,
    children: Vec<String>,
    components: &BTreeMap<String, Component>,
    issues: &mut Vec<String>,
) -> Vec<String> {
    children
        .into_iter()
        .filter(|child| {
            let known = components.contains_key(child);
            if !known {
                let error = SnapshotError::dangling("component", parent, "component", child.clone());
                warn!(%error, "unknown child dropped");
                issues.push(error.to_string());
            }
            known
        })
        .collect()
}

fn decode_part(id: &str, attributes: &Attributes) -> Result<Part> {
    let flag = |key: &str| parse_flag(attributes.get(key).map(String::as_str));

    let target = match attributes.get("target") {
        Some(value) => PartTarget::parse(value)
            .ok_or_else(|| SnapshotError::invalid_value("part", id, "target", value.clone()))?,
        None => PartTarget::Model,
    };
    let color = match attributes.get("color") {
        Some(value) => Some(
            parse_color(value)
                .ok_or_else(|| SnapshotError::invalid_value("part", id, "color", value.clone()))?,
        ),
        None => None,
    };

    Ok(Part {
        id: id.to_string(),
        name: attributes.get("name").cloned(),
        node_ids: Vec::new(),
        edge_ids: Vec::new(),
        component_id: None,
        visible: attributes.get("visible").map_or(true, |value| value == "true"),
        locked: flag("locked"),
        disabled: flag("disabled"),
        x_mirrored: flag("xMirrored"),
        subdived: flag("subdived"),
        rounded: flag("rounded"),
        chamfered: flag("chamfered"),
        gridded: false,
        dirty: flag("dirty"),
        target,
        cut_face: attributes
            .get("cutFace")
            .and_then(|value| CutFace::parse(value))
            .unwrap_or_default(),
        cut_rotation: optional_number(attributes, "part", id, "cutRotation")?.unwrap_or(0.0),
        deform_thickness: optional_number(attributes, "part", id, "deformThickness")?
            .unwrap_or(1.0),
        deform_width: optional_number(attributes, "part", id, "deformWidth")?.unwrap_or(1.0),
        color,
        material_id: attributes.get("materialId").cloned(),
    })
}

/// Nodes missing a coordinate or radius are dropped, which leaves any edge
/// touching them dangling and makes their part degenerate.
fn decode_node(id: &str, attributes: &Attributes, origin: DVec3) -> Result<Option<Node>> {
    let (Some(part_id), Some(x), Some(y), Some(z), Some(radius)) = (
        attributes.get("partId"),
        optional_number(attributes, "node", id, "x")?,
        optional_number(attributes, "node", id, "y")?,
        optional_number(attributes, "node", id, "z")?,
        optional_number(attributes, "node", id, "radius")?,
    ) else {
        warn!(node = %id, "node lacks partId, position or radius, dropped");
        return Ok(None);
    };

    let bone_mark = match attributes.get("boneMark") {
        Some(value) => BoneMark::parse(value)
            .ok_or_else(|| SnapshotError::invalid_value("node", id, "boneMark", value.clone()))?,
        None => BoneMark::None,
    };

    Ok(Some(Node {
        id: id.to_string(),
        part_id: part_id.clone(),
        name: attributes.get("name").cloned(),
        position: DVec3::new(x - origin.x, origin.y - y, origin.z - z),
        radius,
        bone_mark,
        cut_face: attributes.get("cutFace").and_then(|value| CutFace::parse(value)),
        cut_rotation: optional_number(attributes, "node", id, "cutRotation")?,
    }))
}

fn decode_edge(id: &str, attributes: &Attributes) -> Result<Edge> {
    let required = |key: &str| {
        attributes
            .get(key)
            .cloned()
            .ok_or_else(|| SnapshotError::missing_key("edge", id, key))
    };
    Ok(Edge {
        id: id.to_string(),
        part_id: required("partId")?,
        from: required("from")?,
        to: required("to")?,
    })
}

fn decode_component(id: &str, attributes: &Attributes) -> Result<Component> {
    let children = split_list(attributes.get("children").map(String::as_str));
    let link_data = attributes.get("linkData").filter(|value| !value.is_empty());

    let link = match (link_data, children.is_empty()) {
        (Some(part_id), true) => {
            let link_type = attributes.get("linkDataType").map(String::as_str);
            if link_type != Some("partId") {
                return Err(SnapshotError::invalid_value(
                    "component",
                    id,
                    "linkDataType",
                    link_type.unwrap_or_default(),
                ));
            }
            ComponentLink::Part(part_id.clone())
        }
        // A leaf cannot have children
        (Some(_), false) => {
            return Err(SnapshotError::invalid_value(
                "component",
                id,
                "children",
                children.join(","),
            ))
        }
        (None, _) => ComponentLink::Children(children),
    };

    let combine_mode = match attributes.get("combineMode") {
        Some(value) => CombineMode::parse(value).ok_or_else(|| {
            SnapshotError::invalid_value("component", id, "combineMode", value.clone())
        })?,
        // Older snapshots only carried an `inverse` flag.
        None if parse_flag(attributes.get("inverse").map(String::as_str)) => CombineMode::Inversion,
        None => CombineMode::Normal,
    };

    Ok(Component {
        id: id.to_string(),
        name: attributes.get("name").cloned(),
        parent_id: None,
        link,
        combine_mode,
        smooth_all: optional_number(attributes, "component", id, "smoothAll")?,
        smooth_seam: optional_number(attributes, "component", id, "smoothSeam")?,
        dirty: parse_flag(attributes.get("dirty").map(String::as_str)),
    })
}

fn decode_material(id: &str, attributes: &Attributes) -> Result<Material> {
    let color = match attributes.get("color") {
        Some(value) => Some(
            parse_color(value)
                .ok_or_else(|| SnapshotError::invalid_value("material", id, "color", value.clone()))?,
        ),
        None => None,
    };
    Ok(Material {
        id: id.to_string(),
        name: attributes.get("name").cloned(),
        color,
        metalness: optional_number(attributes, "material", id, "metalness")?,
        roughness: optional_number(attributes, "material", id, "roughness")?,
    })
}

fn decode_pose(
    id: &str,
    attributes: &Attributes,
    parameters: Option<&BTreeMap<String, Attributes>>,
) -> Result<Pose> {
    let mut decoded = BTreeMap::new();
    for (bone, values) in parameters.into_iter().flatten() {
        let mut bone_parameters = BTreeMap::new();
        for (key, value) in values {
            let number = value
                .parse::<f64>()
                .map_err(|_| SnapshotError::invalid_value("pose", id, format!("{bone}.{key}"), value.clone()))?;
            bone_parameters.insert(key.clone(), number);
        }
        decoded.insert(bone.clone(), bone_parameters);
    }
    Ok(Pose {
        id: id.to_string(),
        name: attributes.get("name").cloned(),
        parameters: decoded,
    })
}

fn decode_motion(id: &str, attributes: &Attributes, clips: &[Attributes]) -> Result<Motion> {
    let mut decoded = Vec::with_capacity(clips.len());
    for clip in clips {
        let duration = optional_number(clip, "motion", id, "duration")?.unwrap_or(0.0);
        let link = clip.get("linkData").cloned().unwrap_or_default();
        let kind = match clip.get("linkDataType").map(String::as_str) {
            Some("poseId") => MotionClipKind::Pose(link),
            Some("motionId") => MotionClipKind::Motion(link),
            Some("InterpolationType") | None => MotionClipKind::Interpolation,
            Some(other) => {
                return Err(SnapshotError::invalid_value("motion", id, "linkDataType", other))
            }
        };
        decoded.push(MotionClip { kind, duration });
    }
    Ok(Motion {
        id: id.to_string(),
        name: attributes.get("name").cloned(),
        clips: decoded,
    })
}

// =============================================================================
// HELPERS
// =============================================================================

fn optional_number(
    attributes: &Attributes,
    entity: &'static str,
    id: &str,
    key: &str,
) -> Result<Option<f64>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SnapshotError::invalid_value(entity, id, key, value.clone())),
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn has_branch_node(part: &Part, edges: &BTreeMap<String, Edge>) -> bool {
    let mut degrees: HashMap<&str, usize> = HashMap::new();
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    for edge in part.edge_ids.iter().filter_map(|id| edges.get(id)) {
        let key = if edge.from <= edge.to {
            (edge.from.as_str(), edge.to.as_str())
        } else {
            (edge.to.as_str(), edge.from.as_str())
        };
        if !seen.insert(key) {
            continue;
        }
        *degrees.entry(edge.from.as_str()).or_default() += 1;
        *degrees.entry(edge.to.as_str()).or_default() += 1;
    }
    degrees.values().any(|degree| *degree >= 3)
}
