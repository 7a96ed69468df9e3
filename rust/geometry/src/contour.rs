// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour extraction and loop helpers
//!
//! A contour is an open list of points describing a closed loop: the closing point is
//! never repeated. Counter-clockwise loops (positive signed area) are outer boundaries,
//! clockwise loops are holes.

use crate::area::PlanarArea;
use crate::triangulation::triangulate_polygon;
use nalgebra::Point2;
use tracing::trace;

/// Minimum area threshold - loops smaller than this are considered degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// An outer boundary with the holes it encloses
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonWithHoles {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl PolygonWithHoles {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self { outer, holes }
    }

    /// Area enclosed by the outer loop minus its holes
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Every loop, outer first
    pub fn loops(&self) -> impl Iterator<Item = &Vec<Point2<f64>>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Same polygon with every loop in reverse order
    pub fn reversed(&self) -> Self {
        Self {
            outer: self.outer.iter().rev().copied().collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().rev().copied().collect())
                .collect(),
        }
    }
}

/// Extract the boundary loops of a region
///
/// Loops come out shape by shape, outer boundary first then its holes, in the stable
/// order of the region. Outer loops are counter-clockwise and holes clockwise unless
/// `reversed` is set, which flips every loop. Curves were already flattened when the
/// area was built, see [`PlanarArea::from_path`].
pub fn extract_contours(area: &PlanarArea, reversed: bool) -> Vec<Vec<Point2<f64>>> {
    let mut contours = Vec::new();
    for shape in area.shapes() {
        for contour in shape.loops() {
            match clean_loop(contour) {
                Some(mut points) => {
                    if reversed {
                        points.reverse();
                    }
                    contours.push(points);
                }
                None => trace!(points = contour.len(), "dropping degenerate loop"),
            }
        }
    }
    contours
}

/// Extract the region as polygons with their holes, same order as [`extract_contours`]
pub fn extract_polygons(area: &PlanarArea, reversed: bool) -> Vec<PolygonWithHoles> {
    let mut polygons = Vec::with_capacity(area.shapes().len());
    for shape in area.shapes() {
        let Some(outer) = clean_loop(&shape.outer) else {
            trace!("dropping shape with degenerate outer loop");
            continue;
        };
        let holes = shape.holes.iter().filter_map(|h| clean_loop(h)).collect();
        let polygon = PolygonWithHoles::with_holes(outer, holes);
        polygons.push(if reversed { polygon.reversed() } else { polygon });
    }
    polygons
}

/// Drop consecutive duplicates and a closing point equal to the first one
///
/// Returns `None` when fewer than 3 distinct points remain.
pub fn clean_loop(points: &[Point2<f64>]) -> Option<Vec<Point2<f64>>> {
    let mut cleaned: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if cleaned.last() != Some(p) {
            cleaned.push(*p);
        }
    }
    while cleaned.len() > 1 && cleaned.first() == cleaned.last() {
        cleaned.pop();
    }
    (cleaned.len() >= 3).then_some(cleaned)
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    contour.len() >= 3 && signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Compute bounding box of a contour
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let (first, rest) = contour.split_first()?;
    let mut min = *first;
    let mut max = *first;

    for p in rest {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// A point strictly inside a simple loop: the centroid of its largest triangle
pub fn interior_point(contour: &[Point2<f64>]) -> Option<Point2<f64>> {
    let indices = triangulate_polygon(contour).ok()?;
    indices
        .chunks_exact(3)
        .map(|t| (contour[t[0]], contour[t[1]], contour[t[2]]))
        .map(|(a, b, c)| {
            let doubled = ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs();
            (doubled, Point2::from((a.coords + b.coords + c.coords) / 3.0))
        })
        .filter(|(doubled, _)| *doubled > MIN_AREA_THRESHOLD)
        .fold(None, |best: Option<(f64, Point2<f64>)>, candidate| match best {
            Some(b) if b.0 >= candidate.0 => Some(b),
            _ => Some(candidate),
        })
        .map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path2D;

    fn square(min: f64, max: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ]
    }

    #[test]
    fn test_signed_area_ccw_and_cw() {
        let ccw = square(0.0, 1.0);
        assert!((signed_area(&ccw) - 1.0).abs() < 1e-12);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert!((signed_area(&cw) + 1.0).abs() < 1e-12);
        assert!(signed_area(&ensure_ccw(&cw)) > 0.0);
        assert!(signed_area(&ensure_cw(&ccw)) < 0.0);
    }

    #[test]
    fn test_clean_loop_drops_duplicates() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
        ];
        let cleaned = clean_loop(&points).unwrap();
        assert_eq!(
            cleaned,
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]
        );
    }

    #[test]
    fn test_clean_loop_rejects_degenerate() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
        ];
        assert!(clean_loop(&points).is_none());
    }

    #[test]
    fn test_contours_follow_construction_flatness() {
        let circle = Path2D::circle(Point2::origin(), 100.0);
        let coarse = extract_contours(&PlanarArea::from_path(&circle, 5.0), false);
        let fine = extract_contours(&PlanarArea::from_path(&circle, 0.05), false);
        assert_eq!(coarse.len(), 1);
        assert_eq!(fine.len(), 1);
        assert!(fine[0].len() > coarse[0].len());
    }

    #[test]
    fn test_extract_contours_reversed() {
        let area = PlanarArea::from_polygon(&square(0.0, 10.0))
            .subtract(&PlanarArea::from_polygon(&square(4.0, 6.0)));

        let natural = extract_contours(&area, false);
        assert_eq!(natural.len(), 2);
        assert!(signed_area(&natural[0]) > 0.0);
        assert!(signed_area(&natural[1]) < 0.0);

        let reversed = extract_contours(&area, true);
        for (a, b) in natural.iter().zip(&reversed) {
            let flipped: Vec<_> = a.iter().rev().copied().collect();
            assert_eq!(&flipped, b);
        }
    }

    #[test]
    fn test_extract_polygons_keeps_holes() {
        let area = PlanarArea::from_polygon(&square(0.0, 10.0))
            .subtract(&PlanarArea::from_polygon(&square(4.0, 6.0)));
        let polygons = extract_polygons(&area, false);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].holes.len(), 1);
        assert!((polygons[0].area() - 96.0).abs() < 1e-6);
    }

    #[test]
    fn test_interior_point_of_concave_loop() {
        let l_shape = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let p = interior_point(&l_shape).unwrap();
        assert!(point_in_contour(&p, &l_shape));
    }

    #[test]
    fn test_point_in_contour() {
        let contour = square(0.0, 10.0);
        assert!(point_in_contour(&Point2::new(5.0, 5.0), &contour));
        assert!(!point_in_contour(&Point2::new(15.0, 5.0), &contour));
    }
}
