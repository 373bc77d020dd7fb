//! # CSG Vertex
//!
//! Position plus a flag recording whether it came straight from an input
//! mesh. Input vertices are classified with exact predicates; vertices
//! created by splitting are not representable exactly and use a tolerance.

use glam::DVec3;

/// A polygon corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    /// True if the position is an unmodified input coordinate
    pub exact: bool,
}

impl Vertex {
    /// Creates a vertex from an input mesh coordinate.
    pub fn input(position: DVec3) -> Self {
        Self {
            position,
            exact: true,
        }
    }

    /// Interpolates towards `other`; `t` is clamped to `[0, 1]`.
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 {
            return *self;
        }
        if t == 1.0 {
            return *other;
        }
        Vertex {
            position: self.position.lerp(other.position, t),
            exact: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_midpoint_is_inexact() {
        let a = Vertex::input(DVec3::ZERO);
        let b = Vertex::input(DVec3::new(2.0, 0.0, 0.0));
        let mid = a.interpolate(&b, 0.5);
        assert_eq!(mid.position, DVec3::new(1.0, 0.0, 0.0));
        assert!(!mid.exact);
    }

    #[test]
    fn test_interpolate_clamps_to_endpoints() {
        let a = Vertex::input(DVec3::ZERO);
        let b = Vertex::input(DVec3::X);
        assert_eq!(a.interpolate(&b, -0.25), a);
        assert_eq!(a.interpolate(&b, 1.5), b);
        assert!(a.interpolate(&b, 1.5).exact);
    }
}
