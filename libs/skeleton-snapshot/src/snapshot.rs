//! # Snapshot
//!
//! The raw, string-keyed form of a skeleton document. Every entity is a
//! flat `key → value` map; nothing is interpreted until [`Snapshot::decode`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decode::{self, SkeletonGraph};
use crate::error::Result;

/// Flat attribute map of one entity.
pub type Attributes = BTreeMap<String, String>;

/// Immutable copy of a skeleton document at one instant.
///
/// Owned values only, so a snapshot can be moved into a worker thread (or
/// shared as `Arc<Snapshot>`) without touching the live document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Canvas attributes (`originX`, `originY`, `originZ`)
    #[serde(default)]
    pub canvas: Attributes,
    /// Node attributes by node id
    #[serde(default)]
    pub nodes: BTreeMap<String, Attributes>,
    /// Edge attributes by edge id
    #[serde(default)]
    pub edges: BTreeMap<String, Attributes>,
    /// Part attributes by part id
    #[serde(default)]
    pub parts: BTreeMap<String, Attributes>,
    /// Component attributes by component id
    #[serde(default)]
    pub components: BTreeMap<String, Attributes>,
    /// Attributes of the implicit root component (`children`)
    #[serde(default)]
    pub root_component: Attributes,
    /// Material attributes by material id
    #[serde(default)]
    pub materials: BTreeMap<String, Attributes>,
    /// Pose attributes by pose id
    #[serde(default)]
    pub poses: BTreeMap<String, Attributes>,
    /// Pose parameters: pose id → bone name → parameter map
    #[serde(default)]
    pub pose_parameters: BTreeMap<String, BTreeMap<String, Attributes>>,
    /// Motion attributes by motion id
    #[serde(default)]
    pub motions: BTreeMap<String, Attributes>,
    /// Ordered clip list per motion id
    #[serde(default)]
    pub motion_clips: BTreeMap<String, Vec<Attributes>>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a snapshot from its JSON form.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skeleton_snapshot::Snapshot;
    ///
    /// let snapshot = Snapshot::from_json(r#"{"nodes": {}}"#).unwrap();
    /// assert!(snapshot.is_empty());
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the snapshot to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns true if the snapshot carries no geometry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.parts.is_empty() && self.components.is_empty()
    }

    /// Decodes the raw maps into a typed, validated [`SkeletonGraph`].
    pub fn decode(&self) -> Result<SkeletonGraph> {
        decode::decode(self)
    }

    /// Reads one attribute of one entity, treating absence as `None`.
    pub fn attribute<'a>(
        map: &'a BTreeMap<String, Attributes>,
        id: &str,
        key: &str,
    ) -> Option<&'a str> {
        map.get(id)
            .and_then(|attributes| attributes.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_new_is_empty() {
        assert!(Snapshot::new().is_empty());
    }

    #[test]
    fn test_snapshot_json_keys_are_camel_case() {
        let mut snapshot = Snapshot::new();
        snapshot
            .root_component
            .insert("children".to_string(), "a,b".to_string());
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("rootComponent"));

        let parsed = Snapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_snapshot_missing_sections_default() {
        let snapshot = Snapshot::from_json(r#"{"parts": {"p": {"id": "p"}}}"#).unwrap();
        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.parts.len(), 1);
    }

    #[test]
    fn test_snapshot_invalid_json() {
        assert!(Snapshot::from_json("{not json").is_err());
    }

    #[test]
    fn test_attribute_lookup() {
        let mut snapshot = Snapshot::new();
        let mut node = Attributes::new();
        node.insert("radius".to_string(), "0.5".to_string());
        snapshot.nodes.insert("n".to_string(), node);

        assert_eq!(Snapshot::attribute(&snapshot.nodes, "n", "radius"), Some("0.5"));
        assert_eq!(Snapshot::attribute(&snapshot.nodes, "n", "x"), None);
        assert_eq!(Snapshot::attribute(&snapshot.nodes, "m", "radius"), None);
    }
}
