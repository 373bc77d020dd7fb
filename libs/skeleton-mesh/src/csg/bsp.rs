//! # BSP Tree
//!
//! Binary Space Partitioning tree for CSG boolean operations, after the
//! csg.js algorithm by Evan Wallace.
//!
//! ## Operations
//!
//! - `new`: build a tree whose front leaves are outside the solid
//! - `clip_polygons`: remove the parts of polygons inside the solid
//! - `classify_point`: inside/outside query for points away from the surface
//!
//! ## Stack Safety
//!
//! Construction recurses through `stacker::maybe_grow`; clipping and drop
//! use explicit stacks.

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use glam::DVec3;
use stacker::maybe_grow;

use super::plane::{Classification, Plane};
use super::polygon::Polygon;

/// A node in the BSP tree.
#[derive(Debug, Default)]
pub struct BspNode {
    /// Splitting plane, `None` only for an empty tree
    plane: Option<Plane>,
    /// Polygons coplanar with the plane
    polygons: Vec<Polygon>,
    /// Subtree in front of the plane
    front: Option<Box<BspNode>>,
    /// Subtree behind the plane
    back: Option<Box<BspNode>>,
}

impl BspNode {
    /// Builds a tree from polygons.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut root = Self::default();
        root.build(polygons);
        root
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            self.build_inner(polygons)
        })
    }

    fn build_inner(&mut self, polygons: Vec<Polygon>) {
        let mut polygons = polygons.into_iter();
        let plane = match self.plane {
            Some(plane) => plane,
            None => match polygons.next() {
                Some(splitter) => {
                    let plane = *splitter.plane();
                    self.plane = Some(plane);
                    self.polygons.push(splitter);
                    plane
                }
                None => return,
            },
        };

        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            polygon.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.polygons.extend(coplanar_front);
        self.polygons.extend(coplanar_back);

        if !front.is_empty() {
            self.front.get_or_insert_with(Box::default).build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back);
        }
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    ///
    /// Coplanar polygons facing the same way as a node's plane are treated
    /// as outside, opposite-facing ones as inside.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::with_capacity(polygons.len());
        let mut stack: Vec<(&BspNode, Vec<Polygon>)> = vec![(self, polygons)];

        while let Some((node, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }
            let Some(plane) = node.plane else {
                result.extend(polygons);
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            for polygon in polygons {
                polygon.split(
                    &plane,
                    &mut coplanar_front,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
            }
            front.extend(coplanar_front);
            back.extend(coplanar_back);

            match &node.front {
                Some(child) => stack.push((child, front)),
                None => result.extend(front),
            }
            // Without a back subtree the back half-space is solid.
            if let Some(child) = &node.back {
                stack.push((child, back));
            }
        }

        result
    }

    /// Inside/outside query: `Some(true)` inside, `Some(false)` outside,
    /// `None` when the point lies on a splitting plane and the branches
    /// disagree.
    pub fn classify_point(&self, point: DVec3) -> Option<bool> {
        if self.plane.is_none() {
            return Some(false);
        }

        fn record(inside: bool, verdict: &mut Option<bool>) -> bool {
            match *verdict {
                Some(previous) if previous != inside => false,
                _ => {
                    *verdict = Some(inside);
                    true
                }
            }
        }

        let mut verdict = None;
        let mut stack: Vec<&BspNode> = vec![self];

        while let Some(node) = stack.pop() {
            let Some(plane) = node.plane else {
                continue;
            };
            let side = plane.classify_point(point);
            if side != Classification::Back {
                match &node.front {
                    Some(child) => stack.push(child),
                    None => {
                        if !record(false, &mut verdict) {
                            return None;
                        }
                    }
                }
            }
            if side != Classification::Front {
                match &node.back {
                    Some(child) => stack.push(child),
                    None => {
                        if !record(true, &mut verdict) {
                            return None;
                        }
                    }
                }
            }
        }

        verdict
    }

    /// Number of polygons stored in the tree.
    pub fn polygon_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&BspNode> = vec![self];
        while let Some(node) = stack.pop() {
            count += node.polygons.len();
            stack.extend(node.front.as_deref());
            stack.extend(node.back.as_deref());
        }
        count
    }
}

impl Drop for BspNode {
    fn drop(&mut self) {
        let mut stack: Vec<Box<BspNode>> = Vec::new();
        stack.extend(self.front.take());
        stack.extend(self.back.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.front.take());
            stack.extend(node.back.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::mesh_polygons;
    use crate::mesh::fixtures::cube;

    #[test]
    fn test_empty_tree_keeps_everything() {
        let tree = BspNode::new(Vec::new());
        let polygons = mesh_polygons(&cube(DVec3::ZERO, 1.0));
        assert_eq!(tree.clip_polygons(polygons.clone()).len(), polygons.len());
        assert_eq!(tree.classify_point(DVec3::ZERO), Some(false));
    }

    #[test]
    fn test_tree_stores_every_input_polygon() {
        let tree = BspNode::new(mesh_polygons(&cube(DVec3::ZERO, 1.0)));
        assert_eq!(tree.polygon_count(), 12);
    }

    #[test]
    fn test_classify_point_inside_outside() {
        let tree = BspNode::new(mesh_polygons(&cube(DVec3::ZERO, 1.0)));
        assert_eq!(tree.classify_point(DVec3::new(0.2, -0.3, 0.1)), Some(true));
        assert_eq!(tree.classify_point(DVec3::new(3.0, 0.0, 0.0)), Some(false));
        assert_eq!(tree.classify_point(DVec3::new(1.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_clip_removes_polygons_inside() {
        let tree = BspNode::new(mesh_polygons(&cube(DVec3::ZERO, 1.0)));
        let inner = mesh_polygons(&cube(DVec3::ZERO, 0.5));
        assert!(tree.clip_polygons(inner).is_empty());
        let outer = mesh_polygons(&cube(DVec3::new(5.0, 0.0, 0.0), 0.5));
        assert_eq!(tree.clip_polygons(outer).len(), 12);
    }

    #[test]
    fn test_deep_tree_builds_and_drops() {
        let polygons: Vec<Polygon> = (0..3_000)
            .filter_map(|i| {
                let z = i as f64 * 1e-3;
                Polygon::triangle(
                    DVec3::new(0.0, 0.0, z),
                    DVec3::new(1.0, 0.0, z),
                    DVec3::new(0.0, 1.0, z),
                )
            })
            .collect();
        let tree = BspNode::new(polygons);
        assert_eq!(tree.polygon_count(), 3_000);
    }
}
