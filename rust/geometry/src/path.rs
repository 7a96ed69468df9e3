// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D paths with curve segments
//!
//! Curves are only ever consumed through [`Path2D::flatten`], which turns them into
//! polylines within a caller supplied tolerance.

use nalgebra::{Point2, Vector2};

/// Control point factor approximating a quarter circle with one cubic segment
const CIRCLE_KAPPA: f64 = 0.552_284_749_830_793_4;

/// Upper bound of line segments produced for a single curve
const MAX_CURVE_SEGMENTS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point2<f64>),
    LineTo(Point2<f64>),
    QuadTo(Point2<f64>, Point2<f64>),
    CubicTo(Point2<f64>, Point2<f64>, Point2<f64>),
    Close,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path2D {
    segments: Vec<PathSegment>,
}

impl Path2D {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed polygon through `points`
    pub fn polygon(points: &[Point2<f64>]) -> Self {
        let mut path = Self::new();
        if let Some((first, rest)) = points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            path.close();
        }
        path
    }

    /// Circle made of four cubic segments, counter-clockwise
    pub fn circle(center: Point2<f64>, radius: f64) -> Self {
        Self::ellipse(center, radius, radius)
    }

    /// Axis aligned ellipse made of four cubic segments, counter-clockwise
    pub fn ellipse(center: Point2<f64>, rx: f64, ry: f64) -> Self {
        let kx = rx * CIRCLE_KAPPA;
        let ky = ry * CIRCLE_KAPPA;
        let c = center;
        let mut path = Self::new();
        path.move_to(Point2::new(c.x + rx, c.y));
        path.cubic_to(
            Point2::new(c.x + rx, c.y + ky),
            Point2::new(c.x + kx, c.y + ry),
            Point2::new(c.x, c.y + ry),
        );
        path.cubic_to(
            Point2::new(c.x - kx, c.y + ry),
            Point2::new(c.x - rx, c.y + ky),
            Point2::new(c.x - rx, c.y),
        );
        path.cubic_to(
            Point2::new(c.x - rx, c.y - ky),
            Point2::new(c.x - kx, c.y - ry),
            Point2::new(c.x, c.y - ry),
        );
        path.cubic_to(
            Point2::new(c.x + kx, c.y - ry),
            Point2::new(c.x + rx, c.y - ky),
            Point2::new(c.x + rx, c.y),
        );
        path.close();
        path
    }

    pub fn move_to(&mut self, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::LineTo(p));
        self
    }

    pub fn quad_to(&mut self, control: Point2<f64>, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::QuadTo(control, p));
        self
    }

    pub fn cubic_to(&mut self, c1: Point2<f64>, c2: Point2<f64>, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::CubicTo(c1, c2, p));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Apply `f` to every point, control points included
    pub fn transform(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|s| match *s {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(f(p)),
                PathSegment::LineTo(p) => PathSegment::LineTo(f(p)),
                PathSegment::QuadTo(c, p) => PathSegment::QuadTo(f(c), f(p)),
                PathSegment::CubicTo(c1, c2, p) => PathSegment::CubicTo(f(c1), f(c2), f(p)),
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        Self { segments }
    }

    /// Flatten every subpath into a polyline, curves approximated within `tolerance`
    ///
    /// Every subpath is treated as closed. The closing point is not repeated.
    pub fn flatten(&self, tolerance: f64) -> Vec<Vec<Point2<f64>>> {
        let tolerance = if tolerance > 0.0 { tolerance } else { 1e-3 };
        let mut loops = Vec::new();
        let mut current: Vec<Point2<f64>> = Vec::new();
        let mut last = Point2::origin();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    if !current.is_empty() {
                        loops.push(std::mem::take(&mut current));
                    }
                    current.push(p);
                    last = p;
                }
                PathSegment::LineTo(p) => {
                    current.push(p);
                    last = p;
                }
                PathSegment::QuadTo(c, p) => {
                    let d: Vector2<f64> = last.coords - 2.0 * c.coords + p.coords;
                    let n = curve_segments(d.norm() * 0.25, tolerance);
                    for i in 1..=n {
                        let t = i as f64 / n as f64;
                        let mt = 1.0 - t;
                        current.push(Point2::from(
                            last.coords * (mt * mt) + c.coords * (2.0 * mt * t) + p.coords * (t * t),
                        ));
                    }
                    last = p;
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    let d1: Vector2<f64> = last.coords - 2.0 * c1.coords + c2.coords;
                    let d2: Vector2<f64> = c1.coords - 2.0 * c2.coords + p.coords;
                    let n = curve_segments(d1.norm().max(d2.norm()) * 0.75, tolerance);
                    for i in 1..=n {
                        let t = i as f64 / n as f64;
                        let mt = 1.0 - t;
                        current.push(Point2::from(
                            last.coords * (mt * mt * mt)
                                + c1.coords * (3.0 * mt * mt * t)
                                + c2.coords * (3.0 * mt * t * t)
                                + p.coords * (t * t * t),
                        ));
                    }
                    last = p;
                }
                PathSegment::Close => {
                    if !current.is_empty() {
                        if current.len() > 1 && current.first() == current.last() {
                            current.pop();
                        }
                        last = current[0];
                        loops.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            loops.push(current);
        }
        loops
    }
}

/// Segment count from Wang's formula, `deviation` being the scaled second difference
fn curve_segments(deviation: f64, tolerance: f64) -> usize {
    let n = (deviation / tolerance).sqrt().ceil();
    if n.is_finite() {
        (n as usize).clamp(1, MAX_CURVE_SEGMENTS)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_flattens_to_itself() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
        ];
        let loops = Path2D::polygon(&points).flatten(1.0);
        assert_eq!(loops, vec![points]);
    }

    #[test]
    fn test_circle_flattening_respects_tolerance() {
        let center = Point2::new(10.0, -4.0);
        for tolerance in [2.0, 1.0, 0.5] {
            let loops = Path2D::circle(center, 50.0).flatten(tolerance);
            assert_eq!(loops.len(), 1);
            let points = &loops[0];
            for (i, p) in points.iter().enumerate() {
                let q = points[(i + 1) % points.len()];
                let mid = Point2::from((p.coords + q.coords) * 0.5);
                let sag = 50.0 - (mid - center).norm();
                assert!(sag <= tolerance * 1.1, "sag {} above {}", sag, tolerance);
            }
        }
    }

    #[test]
    fn test_finer_tolerance_gives_more_points() {
        let circle = Path2D::circle(Point2::origin(), 100.0);
        let coarse = circle.flatten(1.0)[0].len();
        let fine = circle.flatten(0.1)[0].len();
        assert!(fine > coarse);
    }

    #[test]
    fn test_transform_moves_control_points() {
        let moved = Path2D::circle(Point2::origin(), 1.0)
            .transform(|p| Point2::new(p.x + 5.0, p.y));
        let loops = moved.flatten(0.01);
        assert!(loops[0].iter().all(|p| p.x >= 3.99 && p.x <= 6.01));
    }
}
