//! # Exact Predicates
//!
//! Thin wrappers over `robust::orient3d` for triangle/triangle and
//! segment/triangle tests on input coordinates.

use glam::DVec3;
use robust::{orient3d, Coord3D};

fn coord(p: DVec3) -> Coord3D<f64> {
    Coord3D {
        x: p.x,
        y: p.y,
        z: p.z,
    }
}

/// Exact orientation of `d` relative to the plane through `a`, `b`, `c`.
///
/// Positive when `d` lies below the plane, i.e. behind a counter-clockwise
/// triangle; zero when the four points are coplanar.
pub fn orient(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    orient3d(coord(a), coord(b), coord(c), coord(d))
}

/// Returns true if every corner of `triangle` lies strictly on one side of
/// the plane of `other`.
pub fn strictly_separated(triangle: &[DVec3; 3], other: &[DVec3; 3]) -> bool {
    let [a, b, c] = *other;
    let signs = triangle.map(|p| orient(a, b, c, p));
    signs.iter().all(|&s| s > 0.0) || signs.iter().all(|&s| s < 0.0)
}

/// Returns true if every corner of `triangle` lies exactly in the plane of
/// `other`.
pub fn coplanar(triangle: &[DVec3; 3], other: &[DVec3; 3]) -> bool {
    let [a, b, c] = *other;
    triangle.iter().all(|&p| orient(a, b, c, p) == 0.0)
}

/// Returns true if the open segment `p`-`q` passes through the interior of
/// `triangle`. Touching an edge or a corner does not count.
pub fn segment_crosses_triangle(p: DVec3, q: DVec3, triangle: &[DVec3; 3]) -> bool {
    let [a, b, c] = *triangle;
    let sp = orient(a, b, c, p);
    let sq = orient(a, b, c, q);
    if !((sp > 0.0 && sq < 0.0) || (sp < 0.0 && sq > 0.0)) {
        return false;
    }
    let o1 = orient(p, q, a, b);
    let o2 = orient(p, q, b, c);
    let o3 = orient(p, q, c, a);
    (o1 > 0.0 && o2 > 0.0 && o3 > 0.0) || (o1 < 0.0 && o2 < 0.0 && o3 < 0.0)
}

/// Returns true if the interiors of two non-coplanar triangles cross.
///
/// Coplanar pairs never count: they touch without piercing each other.
pub fn triangles_cross(t: &[DVec3; 3], u: &[DVec3; 3]) -> bool {
    if strictly_separated(t, u) || strictly_separated(u, t) {
        return false;
    }
    let edges = |tri: &[DVec3; 3]| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
    edges(t)
        .iter()
        .any(|&(p, q)| segment_crosses_triangle(p, q, u))
        || edges(u)
            .iter()
            .any(|&(p, q)| segment_crosses_triangle(p, q, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle(z: f64) -> [DVec3; 3] {
        [
            DVec3::new(-1.0, -1.0, z),
            DVec3::new(1.0, -1.0, z),
            DVec3::new(0.0, 1.0, z),
        ]
    }

    #[test]
    fn test_orient_sign_convention() {
        let [a, b, c] = xy_triangle(0.0);
        assert!(orient(a, b, c, DVec3::new(0.0, 0.0, -1.0)) > 0.0);
        assert!(orient(a, b, c, DVec3::new(0.0, 0.0, 1.0)) < 0.0);
        assert_eq!(orient(a, b, c, DVec3::new(0.3, 0.1, 0.0)), 0.0);
    }

    #[test]
    fn test_segment_through_interior() {
        let tri = xy_triangle(0.0);
        assert!(segment_crosses_triangle(
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(0.0, 0.0, 1.0),
            &tri
        ));
        assert!(!segment_crosses_triangle(
            DVec3::new(5.0, 0.0, -1.0),
            DVec3::new(5.0, 0.0, 1.0),
            &tri
        ));
    }

    #[test]
    fn test_segment_ending_on_plane_does_not_cross() {
        let tri = xy_triangle(0.0);
        assert!(!segment_crosses_triangle(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            &tri
        ));
    }

    #[test]
    fn test_piercing_triangles_cross() {
        let t = xy_triangle(0.0);
        let u = [
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(0.0, 2.0, 0.5),
        ];
        assert!(triangles_cross(&t, &u));
    }

    #[test]
    fn test_parallel_and_coplanar_triangles_do_not_cross() {
        assert!(!triangles_cross(&xy_triangle(0.0), &xy_triangle(1.0)));
        assert!(!triangles_cross(&xy_triangle(0.0), &xy_triangle(0.0)));
        assert!(coplanar(&xy_triangle(0.0), &xy_triangle(0.0)));
        assert!(strictly_separated(&xy_triangle(1.0), &xy_triangle(0.0)));
    }
}
