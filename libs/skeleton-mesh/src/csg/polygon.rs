//! # Polygon for BSP Operations
//!
//! Convex polygon with splitting support. Fragments keep the plane of the
//! polygon they were cut from, so classification never depends on
//! rounded split coordinates.

use super::plane::{Classification, Plane};
use super::vertex::Vertex;

/// A convex polygon with its supporting plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices in counter-clockwise order
    vertices: Vec<Vertex>,
    /// Plane containing this polygon
    plane: Plane,
}

impl Polygon {
    /// Creates a polygon from three input coordinates.
    ///
    /// Returns `None` for degenerate triangles.
    pub fn triangle(a: glam::DVec3, b: glam::DVec3, c: glam::DVec3) -> Option<Self> {
        let plane = Plane::from_points(a, b, c)?;
        Some(Self {
            vertices: vec![Vertex::input(a), Vertex::input(b), Vertex::input(c)],
            plane,
        })
    }

    /// Polygon vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Supporting plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Reverses winding and plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    /// Classifies the polygon relative to a plane.
    pub fn classify(&self, plane: &Plane) -> Classification {
        let mut front = false;
        let mut back = false;
        for vertex in &self.vertices {
            match plane.classify(vertex) {
                Classification::Front => front = true,
                Classification::Back => back = true,
                _ => {}
            }
        }
        match (front, back) {
            (true, true) => Classification::Spanning,
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (false, false) => Classification::Coplanar,
        }
    }

    /// Splits the polygon by a plane into the four output lists.
    ///
    /// Coplanar polygons go to `coplanar_front` when they face the same way
    /// as the plane, otherwise to `coplanar_back`.
    pub fn split(
        self,
        plane: &Plane,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        match self.classify(plane) {
            Classification::Coplanar => {
                if self.plane.normal().dot(plane.normal()) > 0.0 {
                    coplanar_front.push(self);
                } else {
                    coplanar_back.push(self);
                }
            }
            Classification::Front => front.push(self),
            Classification::Back => back.push(self),
            Classification::Spanning => {
                let count = self.vertices.len();
                let mut front_vertices = Vec::with_capacity(count + 1);
                let mut back_vertices = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let vi = self.vertices[i];
                    let vj = self.vertices[(i + 1) % count];
                    let ci = plane.classify(&vi);
                    let cj = plane.classify(&vj);

                    if ci != Classification::Back {
                        front_vertices.push(vi);
                    }
                    if ci != Classification::Front {
                        back_vertices.push(vi);
                    }

                    let crosses = matches!(
                        (ci, cj),
                        (Classification::Front, Classification::Back)
                            | (Classification::Back, Classification::Front)
                    );
                    if crosses {
                        let di = plane.signed_distance(vi.position);
                        let dj = plane.signed_distance(vj.position);
                        let denominator = di - dj;
                        let t = if denominator.abs() > f64::MIN_POSITIVE {
                            di / denominator
                        } else {
                            0.5
                        };
                        let intersection = vi.interpolate(&vj, t);
                        front_vertices.push(intersection);
                        back_vertices.push(intersection);
                    }
                }

                if front_vertices.len() >= 3 {
                    front.push(Polygon {
                        vertices: front_vertices,
                        plane: self.plane,
                    });
                }
                if back_vertices.len() >= 3 {
                    back.push(Polygon {
                        vertices: back_vertices,
                        plane: self.plane,
                    });
                }
            }
        }
    }
}
