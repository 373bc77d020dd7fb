//! # UV Layout
//!
//! Every generated part gets its own rectangle of the texture atlas; the
//! rectangles form a near-square grid in part id order. Triangles are
//! box-projected into their part's rectangle along their dominant normal
//! axis.

use std::collections::{BTreeMap, HashMap};

use glam::{DVec2, DVec3};

use crate::mesh::BoundingBox;
use crate::outcome::{NodeSource, UvRect};

/// Gap kept between neighboring rects, in UV units.
const UV_RECT_PADDING: f64 = 0.005;

/// Lays out one rect per part id.
pub fn layout_part_rects<'a>(part_ids: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, UvRect> {
    let ids: Vec<&str> = part_ids.into_iter().collect();
    if ids.is_empty() {
        return BTreeMap::new();
    }
    let columns = (ids.len() as f64).sqrt().ceil() as usize;
    let rows = ids.len().div_ceil(columns);
    let (cell_width, cell_height) = (1.0 / columns as f64, 1.0 / rows as f64);
    ids.into_iter()
        .enumerate()
        .map(|(index, id)| {
            let (column, row) = (index % columns, index / columns);
            let rect = UvRect {
                left: column as f64 * cell_width + UV_RECT_PADDING,
                top: row as f64 * cell_height + UV_RECT_PADDING,
                width: cell_width - 2.0 * UV_RECT_PADDING,
                height: cell_height - 2.0 * UV_RECT_PADDING,
            };
            (id.to_string(), rect)
        })
        .collect()
}

/// UVs of every triangle corner. Triangles without a source part use the
/// whole atlas.
pub fn triangle_uvs(
    vertices: &[DVec3],
    triangles: &[[usize; 3]],
    triangle_normals: &[DVec3],
    triangle_sources: &[Option<NodeSource>],
    rects: &BTreeMap<String, UvRect>,
) -> Vec<[DVec2; 3]> {
    let part_of = |face: usize| {
        triangle_sources
            .get(face)
            .and_then(Option::as_ref)
            .map(|source| source.part_id.as_str())
    };

    let mut part_bounds: HashMap<Option<&str>, BoundingBox> = HashMap::new();
    for (face, triangle) in triangles.iter().enumerate() {
        let corners = triangle.map(|v| vertices[v]);
        let Some(bounds) = BoundingBox::from_points(corners.iter()) else {
            continue;
        };
        part_bounds
            .entry(part_of(face))
            .and_modify(|existing| {
                existing.min = existing.min.min(bounds.min);
                existing.max = existing.max.max(bounds.max);
            })
            .or_insert(bounds);
    }

    triangles
        .iter()
        .enumerate()
        .map(|(face, triangle)| {
            let part = part_of(face);
            let rect = part.and_then(|id| rects.get(id)).copied().unwrap_or(UvRect::FULL);
            let Some(bounds) = part_bounds.get(&part) else {
                return [DVec2::ZERO; 3];
            };
            let size = bounds.size().max(DVec3::splat(f64::EPSILON));
            let normal = triangle_normals.get(face).copied().unwrap_or(DVec3::Z).abs();
            triangle.map(|v| {
                let local = (vertices[v] - bounds.min) / size;
                let projected = if normal.x >= normal.y && normal.x >= normal.z {
                    DVec2::new(local.y, local.z)
                } else if normal.y >= normal.z {
                    DVec2::new(local.x, local.z)
                } else {
                    DVec2::new(local.x, local.y)
                };
                rect.map(projected)
            })
        })
        .collect()
}
