//! # Typed Skeleton Model
//!
//! Typed values decoded from a [`Snapshot`](crate::Snapshot). All of them
//! are plain owned data: cloning a value never aliases the snapshot.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Anatomical hint attached to a node, consumed by rigging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoneMark {
    /// No mark
    #[default]
    None,
    /// Neck root
    Neck,
    /// Limb root
    Limb,
    /// Tail root
    Tail,
    /// Joint inside a limb
    Joint,
}

impl BoneMark {
    /// Parses the snapshot spelling; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(Self::None),
            "Neck" => Some(Self::Neck),
            "Limb" => Some(Self::Limb),
            "Tail" => Some(Self::Tail),
            "Joint" => Some(Self::Joint),
            _ => None,
        }
    }

    /// Returns true for any mark other than [`BoneMark::None`].
    pub fn is_marked(self) -> bool {
        self != Self::None
    }
}

/// How a component's value is folded into its parent's accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombineMode {
    /// Union into the accumulator
    #[default]
    Normal,
    /// Subtract from the accumulator
    Inversion,
    /// Appended as a separate shell without any boolean operation
    Uncombined,
}

impl CombineMode {
    /// Parses the snapshot spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Normal" => Some(Self::Normal),
            "Inversion" => Some(Self::Inversion),
            "Uncombined" => Some(Self::Uncombined),
            _ => None,
        }
    }
}

/// Whether a part is meshed or only serves as a cross-section source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartTarget {
    /// Regular geometry
    #[default]
    Model,
    /// Profile for other parts' cut faces, never meshed itself
    CutFace,
}

impl PartTarget {
    /// Parses the snapshot spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Model" => Some(Self::Model),
            "CutFace" => Some(Self::CutFace),
            _ => None,
        }
    }
}

/// Cross-section shape swept along a part's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CutFace {
    /// Regular polygon approximating a circle
    #[default]
    Circle,
    /// Square
    Quad,
    /// Equilateral triangle
    Triangle,
    /// Regular pentagon
    Pentagon,
    /// Regular hexagon
    Hexagon,
    /// Profile taken from another part's nodes
    UserDefined(String),
}

impl CutFace {
    /// Parses a template name; any other non-empty value is a linked part id.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => None,
            "Circle" => Some(Self::Circle),
            "Quad" => Some(Self::Quad),
            "Triangle" => Some(Self::Triangle),
            "Pentagon" => Some(Self::Pentagon),
            "Hexagon" => Some(Self::Hexagon),
            other => Some(Self::UserDefined(other.to_string())),
        }
    }

    /// Counter-clockwise template points for the built-in shapes.
    ///
    /// `circle_segments` only affects [`CutFace::Circle`]. Returns `None`
    /// for [`CutFace::UserDefined`], whose profile depends on another part.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skeleton_snapshot::CutFace;
    ///
    /// assert_eq!(CutFace::Quad.template(8).unwrap().len(), 4);
    /// assert_eq!(CutFace::Circle.template(12).unwrap().len(), 12);
    /// assert!(CutFace::UserDefined("part".into()).template(8).is_none());
    /// ```
    pub fn template(&self, circle_segments: usize) -> Option<Vec<DVec2>> {
        let points = match self {
            Self::Circle => {
                let segments = circle_segments.max(3);
                (0..segments)
                    .map(|i| {
                        let angle = TAU * i as f64 / segments as f64;
                        DVec2::new(angle.cos(), angle.sin())
                    })
                    .collect()
            }
            Self::Quad => vec![
                DVec2::new(-1.0, -1.0),
                DVec2::new(1.0, -1.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(-1.0, 1.0),
            ],
            Self::Triangle => vec![
                DVec2::new(-1.1547, -1.0),
                DVec2::new(1.1547, -1.0),
                DVec2::new(0.0, 1.0),
            ],
            Self::Pentagon => vec![
                DVec2::new(-0.6498, -0.8944),
                DVec2::new(0.6498, -0.8944),
                DVec2::new(1.05146, 0.34164),
                DVec2::new(0.0, 1.10557),
                DVec2::new(-1.05146, 0.34164),
            ],
            Self::Hexagon => vec![
                DVec2::new(-0.577, -1.0),
                DVec2::new(0.577, -1.0),
                DVec2::new(1.1547, 0.0),
                DVec2::new(0.577, 1.0),
                DVec2::new(-0.577, 1.0),
                DVec2::new(-1.1547, 0.0),
            ],
            Self::UserDefined(_) => return None,
        };
        Some(points)
    }
}

// =============================================================================
// GRAPH ENTITIES
// =============================================================================

/// A skeleton node: a sphere of influence on the part's centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub part_id: String,
    pub name: Option<String>,
    /// Canvas-relative position
    pub position: DVec3,
    pub radius: f64,
    pub bone_mark: BoneMark,
    /// Per-node cross-section override
    pub cut_face: Option<CutFace>,
    /// Per-node rotation override, in half turns (`1.0` = 180°)
    pub cut_rotation: Option<f64>,
}

/// An undirected connection between two nodes of the same part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub part_id: String,
    pub from: String,
    pub to: String,
}

/// A connected set of nodes sharing skinning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: Option<String>,
    /// Node ids in id order
    pub node_ids: Vec<String>,
    /// Edge ids in id order
    pub edge_ids: Vec<String>,
    /// Leaf component wrapping this part, if any
    pub component_id: Option<String>,
    pub visible: bool,
    pub locked: bool,
    pub disabled: bool,
    pub x_mirrored: bool,
    pub subdived: bool,
    pub rounded: bool,
    pub chamfered: bool,
    /// True iff any node of the part has degree ≥ 3
    pub gridded: bool,
    pub dirty: bool,
    pub target: PartTarget,
    pub cut_face: CutFace,
    /// Rotation of the cross-section in half turns
    pub cut_rotation: f64,
    pub deform_thickness: f64,
    pub deform_width: f64,
    pub color: Option<[f32; 4]>,
    pub material_id: Option<String>,
}

impl Part {
    /// Returns true if the part takes part in mesh generation.
    pub fn is_generated(&self) -> bool {
        self.visible && !self.disabled && self.target == PartTarget::Model
    }
}

/// What a component stands for in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentLink {
    /// Leaf wrapping exactly one part
    Part(String),
    /// Group node with ordered children
    Children(Vec<String>),
}

/// A node of the component tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub link: ComponentLink,
    pub combine_mode: CombineMode,
    pub smooth_all: Option<f64>,
    pub smooth_seam: Option<f64>,
    pub dirty: bool,
}

impl Component {
    /// Linked part id for leaf components.
    pub fn part_id(&self) -> Option<&str> {
        match &self.link {
            ComponentLink::Part(part_id) => Some(part_id),
            ComponentLink::Children(_) => None,
        }
    }

    /// Ordered children for group components (empty for leaves).
    pub fn children(&self) -> &[String] {
        match &self.link {
            ComponentLink::Part(_) => &[],
            ComponentLink::Children(children) => children,
        }
    }
}

// =============================================================================
// MATERIALS, POSES, MOTIONS
// =============================================================================

/// Surface material referenced by parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<[f32; 4]>,
    pub metalness: Option<f64>,
    pub roughness: Option<f64>,
}

/// A named pose: per-bone numeric parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub id: String,
    pub name: Option<String>,
    /// Bone name → parameter name → value
    pub parameters: BTreeMap<String, BTreeMap<String, f64>>,
}

/// What a motion clip plays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionClipKind {
    /// Hold a pose
    Pose(String),
    /// Play another motion
    Motion(String),
    /// Blend from the previous clip into the next one
    Interpolation,
}

/// One entry of a motion's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionClip {
    pub kind: MotionClipKind,
    /// Seconds
    pub duration: f64,
}

/// A timeline of clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub id: String,
    pub name: Option<String>,
    pub clips: Vec<MotionClip>,
}

// =============================================================================
// VALUE PARSING
// =============================================================================

/// Parses a `#rrggbb` or `#aarrggbb` color into normalized RGBA.
///
/// # Example
///
/// ```rust
/// use skeleton_snapshot::model::parse_color;
///
/// assert_eq!(parse_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
/// assert_eq!(parse_color("#00000000"), Some([0.0, 0.0, 0.0, 0.0]));
/// assert_eq!(parse_color("red"), None);
/// ```
pub fn parse_color(value: &str) -> Option<[f32; 4]> {
    let hex = value.strip_prefix('#')?;
    let channel = |index: usize| -> Option<f32> {
        let byte = u8::from_str_radix(hex.get(index..index + 2)?, 16).ok()?;
        Some(f32::from(byte) / 255.0)
    };
    match hex.len() {
        6 => Some([channel(0)?, channel(2)?, channel(4)?, 1.0]),
        8 => Some([channel(2)?, channel(4)?, channel(6)?, channel(0)?]),
        _ => None,
    }
}

/// Snapshot booleans are the literal string `"true"`; anything else is false.
pub fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_mark_parse() {
        assert_eq!(BoneMark::parse("Limb"), Some(BoneMark::Limb));
        assert_eq!(BoneMark::parse("Wing"), None);
        assert!(!BoneMark::None.is_marked());
        assert!(BoneMark::Tail.is_marked());
    }

    #[test]
    fn test_combine_mode_parse() {
        assert_eq!(CombineMode::parse("Inversion"), Some(CombineMode::Inversion));
        assert_eq!(CombineMode::parse("Uncombined"), Some(CombineMode::Uncombined));
        assert_eq!(CombineMode::parse("inversion"), None);
        assert_eq!(CombineMode::default(), CombineMode::Normal);
    }

    #[test]
    fn test_cut_face_parse_linked_part() {
        assert_eq!(CutFace::parse("Quad"), Some(CutFace::Quad));
        assert_eq!(
            CutFace::parse("profile-part"),
            Some(CutFace::UserDefined("profile-part".to_string()))
        );
        assert_eq!(CutFace::parse(""), None);
    }

    #[test]
    fn test_templates_are_counter_clockwise() {
        for face in [
            CutFace::Circle,
            CutFace::Quad,
            CutFace::Triangle,
            CutFace::Pentagon,
            CutFace::Hexagon,
        ] {
            let points = face.template(10).unwrap();
            let mut area = 0.0;
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                area += a.x * b.y - b.x * a.y;
            }
            assert!(area > 0.0, "{face:?} should wind counter-clockwise");
        }
    }

    #[test]
    fn test_circle_template_has_minimum_segments() {
        assert_eq!(CutFace::Circle.template(1).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_color_rejects_bad_hex() {
        assert_eq!(parse_color("#zz0000"), None);
        assert_eq!(parse_color("#fff"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(None));
    }
}
