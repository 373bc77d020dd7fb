//! # Plane for BSP Operations
//!
//! Plane representation with point classification. Every plane is spanned
//! by three input coordinates, so input vertices can be classified exactly.

use config::constants::{EPSILON, PLANE_EPSILON};
use glam::DVec3;

use super::predicates::orient;
use super::vertex::Vertex;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classification of a point or polygon relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// On the plane
    Coplanar,
    /// Positive side
    Front,
    /// Negative side
    Back,
    /// Polygon has vertices on both sides
    Spanning,
}

// =============================================================================
// PLANE
// =============================================================================

/// An oriented plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    normal: DVec3,
    /// Distance from origin along normal
    w: f64,
    /// Input coordinates spanning the plane, counter-clockwise from the front
    points: [DVec3; 3],
}

impl Plane {
    /// Creates a plane from three counter-clockwise points.
    ///
    /// Returns `None` for collinear points.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let cross = (b - a).cross(c - a);
        let length = cross.length();
        if !length.is_finite() || length < EPSILON {
            return None;
        }
        let normal = cross / length;
        Some(Self {
            normal,
            w: normal.dot(a),
            points: [a, b, c],
        })
    }

    /// Unit normal.
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Plane facing the opposite way.
    pub fn flipped(&self) -> Plane {
        let [a, b, c] = self.points;
        Plane {
            normal: -self.normal,
            w: -self.w,
            points: [a, c, b],
        }
    }

    /// Signed distance; positive in front.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Classifies a vertex. Exact vertices use the orientation predicate,
    /// split vertices a slab of half-width [`PLANE_EPSILON`].
    pub fn classify(&self, vertex: &Vertex) -> Classification {
        if vertex.exact {
            let [a, b, c] = self.points;
            let side = orient(a, b, c, vertex.position);
            if side > 0.0 {
                Classification::Back
            } else if side < 0.0 {
                Classification::Front
            } else {
                Classification::Coplanar
            }
        } else {
            self.classify_point(vertex.position)
        }
    }

    /// Classifies an arbitrary point against the tolerance slab.
    pub fn classify_point(&self, point: DVec3) -> Classification {
        let distance = self.signed_distance(point);
        if distance > PLANE_EPSILON {
            Classification::Front
        } else if distance < -PLANE_EPSILON {
            Classification::Back
        } else {
            Classification::Coplanar
        }
    }
}
