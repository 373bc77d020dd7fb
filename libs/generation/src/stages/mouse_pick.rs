//! # Mouse Pick Stage
//!
//! Casts a ray against the post-processed mesh and reports the nearest hit
//! together with the skeleton node that produced the hit triangle.

use std::sync::Arc;

use config::constants::EPSILON;
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skeleton_mesh::{NodeSource, Outcome};

use crate::pipeline::PipelineInputs;
use crate::stage::Stage;

/// Pick ray in model space. The direction need not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub triangle: usize,
    pub position: DVec3,
    /// Distance along the normalized ray
    pub distance: f64,
    pub source: Option<NodeSource>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    pub hit: Option<PickHit>,
    pub succeeded: bool,
    pub messages: Vec<String>,
}

impl PickResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            hit: None,
            succeeded: false,
            messages: vec![message.into()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MousePickStage;

impl Stage for MousePickStage {
    type Context = PipelineInputs;
    type Input = (Arc<Outcome>, Ray);
    type Output = PickResult;

    const NAME: &'static str = "mouse-pick";

    fn capture(&self, inputs: &PipelineInputs) -> Option<(Arc<Outcome>, Ray)> {
        Some((inputs.processed.clone()?, inputs.pick_ray?))
    }

    fn run((outcome, ray): (Arc<Outcome>, Ray)) -> PickResult {
        pick(&outcome, ray)
    }

    fn failed(message: String) -> PickResult {
        PickResult::failed(message)
    }

    fn succeeded(output: &PickResult) -> bool {
        output.succeeded
    }
}

/// Nearest ray hit on the outcome's triangles.
pub fn pick(outcome: &Outcome, ray: Ray) -> PickResult {
    let Some(direction) = ray.direction.try_normalize() else {
        return PickResult::failed("Pick ray has no direction");
    };
    let hit = outcome
        .triangles
        .par_iter()
        .enumerate()
        .filter_map(|(index, triangle)| {
            let corners = triangle.map(|vertex| outcome.vertices.get(vertex).copied());
            let [Some(a), Some(b), Some(c)] = corners else {
                return None;
            };
            intersect(ray.origin, direction, [a, b, c]).map(|distance| (index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    PickResult {
        hit: hit.map(|(triangle, distance)| PickHit {
            triangle,
            position: ray.origin + direction * distance,
            distance,
            source: outcome.triangle_sources.get(triangle).cloned().flatten(),
        }),
        succeeded: true,
        messages: Vec::new(),
    }
}

/// Möller–Trumbore; hits behind the origin are ignored.
fn intersect(origin: DVec3, direction: DVec3, [a, b, c]: [DVec3; 3]) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let determinant = edge1.dot(p);
    if determinant.abs() < EPSILON {
        return None;
    }
    let inverse = 1.0 / determinant;
    let s = origin - a;
    let u = s.dot(p) * inverse;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inverse;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let distance = edge2.dot(q) * inverse;
    (distance > EPSILON).then_some(distance)
}
