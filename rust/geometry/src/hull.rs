// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor projections of meshes
//!
//! Exact footprints come from the union of every projected triangle. Past a vertex
//! count threshold that union gets too slow and the convex hull of the projected
//! vertices stands in for it.

use crate::area::PlanarArea;
use crate::contour::MIN_AREA_THRESHOLD;
use crate::triangulation::triangle_cross;
use nalgebra::Point2;
use plan3d_core::MeshBuffer;
use std::cmp::Ordering;
use tracing::debug;

/// Convex hull of a point cloud with Andrew's monotone chain
///
/// Points are sorted by x then by y descending. The hull is counter-clockwise and
/// explicitly closed: its last point repeats the first one. A single distinct point
/// gives `[p, p]`, collinear points give the segment between the extremes and back.
pub fn project_and_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal))
    });
    sorted.dedup();

    match sorted.len() {
        0 => return Vec::new(),
        1 => return vec![sorted[0], sorted[0]],
        _ => {}
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && triangle_cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && triangle_cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    let mut hull = lower;
    hull.extend(upper);
    hull.push(hull[0]);
    hull
}

/// Floor plan of the vertices of a Y-up mesh, as `(x, z)` points
pub fn project_vertices(mesh: &MeshBuffer) -> Vec<Point2<f64>> {
    mesh.positions
        .chunks_exact(3)
        .map(|p| Point2::new(p[0] as f64, p[2] as f64))
        .collect()
}

/// Area covered by a Y-up mesh seen from above
///
/// Up to `vertex_threshold` vertices the footprint is the exact union of the projected
/// triangles; above it, the convex hull of the projected vertices.
pub fn project_footprint(mesh: &MeshBuffer, vertex_threshold: usize) -> PlanarArea {
    let vertices = project_vertices(mesh);
    let indexed = mesh.to_indexed();
    let indices = indexed.indices().unwrap_or(&[]);

    if vertices.len() > vertex_threshold || indices.is_empty() {
        debug!(
            vertices = vertices.len(),
            threshold = vertex_threshold,
            "footprint from convex hull"
        );
        return hull_area(&vertices);
    }

    let triangles: Vec<[Point2<f64>; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            [
                vertices[t[0] as usize],
                vertices[t[1] as usize],
                vertices[t[2] as usize],
            ]
        })
        .filter(|[a, b, c]| triangle_cross(a, b, c).abs() > MIN_AREA_THRESHOLD)
        .collect();
    if triangles.is_empty() {
        return PlanarArea::new();
    }
    PlanarArea::from_polygons(triangles.iter().map(|t| &t[..]))
}

/// Area enclosed by the convex hull of `points`, empty when the hull is flat
pub fn hull_area(points: &[Point2<f64>]) -> PlanarArea {
    let mut hull = project_and_hull(points);
    // Closed output: the area wants an open loop
    hull.pop();
    PlanarArea::from_polygon(&hull)
}
