// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polylines drawn flat on the floor
//!
//! A polyline is stroked into an area made of one rectangle per segment, plus caps,
//! joins and arrows, then laid as an upward facing surface.

use crate::area::PlanarArea;
use crate::builder::MeshGeometryBuilder;
use crate::config::GeometryConfig;
use crate::contour::extract_polygons;
use crate::path::Path2D;
use nalgebra::{Point2, Rotation2, Vector2};
use plan3d_core::{ArrowStyle, CapStyle, Home, JoinStyle, MeshBuffer, Polyline};
use tracing::debug;

/// Lift applied to polylines lying on their level floor so that they stay visible
const FLOOR_OFFSET: f64 = 0.05;

/// Miter joins longer than this many half thicknesses fall back to bevels
const MITER_LIMIT: f64 = 10.0;

/// Delta arrow outline in arrow units, pointing along +x
const DELTA_ARROW: [[f64; 2]; 3] = [[-3.35, -2.0], [1.65, 0.0], [-3.35, 2.0]];

/// Disc arrow center and radius in arrow units
const DISC_ARROW: ([f64; 2], f64) = ([-1.5, 0.0], 2.0);

/// Build the mesh of the polyline at `index` in the home
pub fn generate_polyline(home: &Home, index: usize, config: &GeometryConfig) -> Option<MeshBuffer> {
    let polyline = home.polylines.get(index)?;
    if !polyline.visible_in_3d || !home.is_viewable(polyline.level) {
        return None;
    }
    let area = stroke_polyline(polyline, config.polyline_flatness);
    let elevation = home.ground_elevation(polyline.level, polyline.elevation)
        + if polyline.elevation < FLOOR_OFFSET {
            FLOOR_OFFSET
        } else {
            0.0
        };

    let mut builder = MeshGeometryBuilder::new(0.0);
    for polygon in extract_polygons(&area, true) {
        builder.add_polygon(&polygon, |_| elevation, None);
    }
    let mesh = builder.build();
    debug!(
        polyline = index,
        points = polyline.points.len(),
        triangles = mesh.triangle_count(),
        "generated polyline"
    );
    (!mesh.is_empty()).then_some(mesh)
}

/// Area covered by the stroke of a polyline, with its arrows
pub fn stroke_polyline(polyline: &Polyline, flatness: f64) -> PlanarArea {
    let mut points: Vec<Point2<f64>> = polyline
        .points
        .iter()
        .copied()
        .fold(Vec::new(), |mut points, p| {
            if points.last() != Some(&p) {
                points.push(p);
            }
            points
        });
    if polyline.closed {
        // The closing segment is implicit
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
    }
    let half = polyline.thickness / 2.0;
    if points.len() < 2 || half <= 0.0 {
        return PlanarArea::new();
    }
    let closed = polyline.closed && points.len() > 2;

    let segment_count = if closed { points.len() } else { points.len() - 1 };
    let segments: Vec<(Point2<f64>, Point2<f64>)> = (0..segment_count)
        .map(|i| (points[i], points[(i + 1) % points.len()]))
        .collect();

    let mut pieces: Vec<Vec<Point2<f64>>> = Vec::new();
    let disc = |center: Point2<f64>, radius: f64| Path2D::circle(center, radius).flatten(flatness);

    for (i, &(a, b)) in segments.iter().enumerate() {
        let Some(direction) = (b - a).try_normalize(f64::EPSILON) else {
            continue;
        };
        let normal = Vector2::new(-direction.y, direction.x) * half;
        let extend = |at_end: bool| {
            let is_cap = !closed && if at_end { i == segment_count - 1 } else { i == 0 };
            if is_cap && polyline.cap == CapStyle::Square {
                direction * half
            } else {
                Vector2::zeros()
            }
        };
        let a = a - extend(false);
        let b = b + extend(true);
        pieces.push(vec![a - normal, b - normal, b + normal, a + normal]);
    }

    // Joins between consecutive segments
    let join_count = if closed { segment_count } else { segment_count - 1 };
    for j in 0..join_count {
        let (a, vertex) = segments[j];
        let (_, c) = segments[(j + 1) % segment_count];
        let (Some(d1), Some(d2)) = (
            (vertex - a).try_normalize(f64::EPSILON),
            (c - vertex).try_normalize(f64::EPSILON),
        ) else {
            continue;
        };
        let turn = d1.x * d2.y - d1.y * d2.x;
        if turn.abs() < 1e-12 {
            continue;
        }
        if polyline.join == JoinStyle::Round {
            pieces.extend(disc(vertex, half));
            continue;
        }
        // The outer side of a left turn is on the right
        let side = if turn > 0.0 { -1.0 } else { 1.0 };
        let n1 = Vector2::new(-d1.y, d1.x) * side;
        let n2 = Vector2::new(-d2.y, d2.x) * side;
        let o1 = vertex + n1 * half;
        let o2 = vertex + n2 * half;
        let bisector = (n1 + n2).try_normalize(1e-12);
        let miter = bisector.and_then(|bisector| {
            let cos = bisector.dot(&n1);
            let length = half / cos;
            (polyline.join == JoinStyle::Miter && cos > 0.0 && length <= MITER_LIMIT * half)
                .then(|| vertex + bisector * length)
        });
        match miter {
            Some(m) => pieces.push(vec![vertex, o1, m, o2]),
            None => pieces.push(vec![vertex, o1, o2]),
        }
    }

    if !closed && polyline.cap == CapStyle::Round {
        pieces.extend(disc(points[0], half));
        pieces.extend(disc(points[points.len() - 1], half));
    }

    // Arrows point away from the line at both ends
    let arrow_offset = if polyline.cap != CapStyle::Butt { half } else { 0.0 };
    let first = points[0];
    let last = points[points.len() - 1];
    let arrows = [
        (polyline.start_arrow, first, points[1] - first, -1.0),
        (polyline.end_arrow, last, last - points[points.len() - 2], 1.0),
    ];
    for (style, at, along, sign) in arrows {
        let along = along * sign;
        let angle = along.y.atan2(along.x);
        pieces.extend(arrow_outline(style, at, angle, polyline.thickness, arrow_offset, flatness));
    }

    PlanarArea::from_polygons(pieces.iter().map(Vec::as_slice))
}

/// Outline of an arrow head at `at`, pointing at `angle`
fn arrow_outline(
    style: ArrowStyle,
    at: Point2<f64>,
    angle: f64,
    thickness: f64,
    offset: f64,
    flatness: f64,
) -> Vec<Vec<Point2<f64>>> {
    let scale = thickness.powf(0.66) * 2.0;
    let rotation = Rotation2::new(angle);
    let place = |x: f64, y: f64| at + rotation * Vector2::new(offset + x * scale, y * scale);
    match style {
        ArrowStyle::None => Vec::new(),
        ArrowStyle::Delta => vec![DELTA_ARROW.iter().map(|&[x, y]| place(x, y)).collect()],
        ArrowStyle::Disc => {
            let ([cx, cy], radius) = DISC_ARROW;
            Path2D::circle(place(cx, cy), radius * scale).flatten(flatness)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(points: &[(f64, f64)], thickness: f64) -> Polyline {
        Polyline::new(
            points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
            thickness,
        )
    }

    #[test]
    fn test_butt_segment_is_a_rectangle() {
        let polyline = line(&[(0.0, 0.0), (10.0, 0.0)], 2.0);
        let area = stroke_polyline(&polyline, 0.5);
        assert_relative_eq!(area.area(), 20.0, epsilon = 1e-6);
        let bounds = area.bounds();
        assert_relative_eq!(bounds.min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_square_cap_extends_ends() {
        let mut polyline = line(&[(0.0, 0.0), (10.0, 0.0)], 2.0);
        polyline.cap = CapStyle::Square;
        let area = stroke_polyline(&polyline, 0.5);
        assert_relative_eq!(area.area(), 24.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_cap_adds_half_discs() {
        let mut polyline = line(&[(0.0, 0.0), (100.0, 0.0)], 20.0);
        polyline.cap = CapStyle::Round;
        let area = stroke_polyline(&polyline, 0.5);
        let expected = 2000.0 + std::f64::consts::PI * 100.0;
        assert!((area.area() - expected).abs() < expected * 0.01);
    }

    #[test]
    fn test_miter_join_fills_the_corner() {
        let mut polyline = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], 2.0);
        polyline.join = JoinStyle::Miter;
        let miter = stroke_polyline(&polyline, 0.5).area();
        polyline.join = JoinStyle::Bevel;
        let bevel = stroke_polyline(&polyline, 0.5).area();
        // Two segment rectangles overlap on a 1x1 square, the outer corner is 1x1
        assert_relative_eq!(miter, 40.0 - 1.0 + 1.0, epsilon = 1e-6);
        assert_relative_eq!(bevel, 40.0 - 1.0 + 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_closed_path_repeating_its_first_point() {
        let mut repeated = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)], 2.0);
        repeated.closed = true;
        repeated.join = JoinStyle::Miter;
        let mut implicit = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], 2.0);
        implicit.closed = true;
        implicit.join = JoinStyle::Miter;

        let area = stroke_polyline(&repeated, 0.5);
        assert!(area.area().is_finite() && area.area() > 0.0);
        assert_relative_eq!(area.area(), stroke_polyline(&implicit, 0.5).area(), epsilon = 1e-9);
        assert!(area.shapes().iter().all(|shape| shape
            .outer
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())));
    }

    #[test]
    fn test_closed_path_has_a_hole() {
        let mut polyline = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)], 2.0);
        polyline.closed = true;
        polyline.join = JoinStyle::Miter;
        let area = stroke_polyline(&polyline, 0.5);
        assert_eq!(area.shapes().len(), 1);
        assert_eq!(area.shapes()[0].holes.len(), 1);
        assert_relative_eq!(area.area(), 144.0 - 64.0, epsilon = 1e-6);
    }

    #[test]
    fn test_delta_arrow_grows_the_end() {
        let mut polyline = line(&[(0.0, 0.0), (100.0, 0.0)], 1.0);
        polyline.end_arrow = ArrowStyle::Delta;
        let area = stroke_polyline(&polyline, 0.5);
        let bounds = area.bounds();
        // Arrow tip at 1.65 arrow units past the end, one unit being 2 for a thickness of 1
        assert_relative_eq!(bounds.max.x, 103.3, epsilon = 1e-6);
        assert_relative_eq!(bounds.max.y, 4.0, epsilon = 1e-6);
        assert!(bounds.min.x >= -1e-9);
    }

    #[test]
    fn test_start_arrow_points_backwards() {
        let mut polyline = line(&[(0.0, 0.0), (100.0, 0.0)], 1.0);
        polyline.start_arrow = ArrowStyle::Disc;
        let bounds = stroke_polyline(&polyline, 0.1).bounds();
        // Disc of radius 4 centered 3 units inside the line, past its start by 1
        assert_relative_eq!(bounds.min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.y, 4.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.x, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polyline_mesh_faces_up_above_the_floor() {
        let mut home = Home::new();
        home.polylines.push(line(&[(0.0, 0.0), (10.0, 0.0)], 2.0));
        let mesh = generate_polyline(&home, 0, &GeometryConfig::default()).unwrap();
        for i in 0..mesh.vertex_count() {
            assert_relative_eq!(mesh.position(i).y, 0.05);
            assert!(mesh.normal(i).unwrap().y > 0.99);
        }

        home.polylines[0].visible_in_3d = false;
        assert!(generate_polyline(&home, 0, &GeometryConfig::default()).is_none());
    }
}
