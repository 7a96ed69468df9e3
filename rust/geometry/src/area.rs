// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar areas and their boolean algebra
//!
//! A [`PlanarArea`] is an immutable set of polygons with holes backed by the i_overlay
//! crate. Every boolean operation returns a new area, so a stored area can feed any
//! number of later operations without being cloned first.
//!
//! After each operation the area holds simple, non-overlapping shapes: outer loops
//! counter-clockwise, holes clockwise, no repeated consecutive points and no zero-area
//! loops. The empty area holds no shape at all.

use crate::contour::{
    clean_loop, ensure_ccw, ensure_cw, is_valid_contour, point_in_contour, PolygonWithHoles,
};
use crate::path::Path2D;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Axis aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Rect {
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self {
            min: Point2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Point2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// True for a zero-size rectangle
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Rectangle grown by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// True when the rectangles share some area or boundary
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// True when `other` lies inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Corners, counter-clockwise from the minimum
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            min: Point2::origin(),
            max: Point2::origin(),
        }
    }
}

/// Possibly disconnected, possibly holed 2D region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanarArea {
    shapes: Vec<PolygonWithHoles>,
}

impl PlanarArea {
    /// Create an empty area
    pub fn new() -> Self {
        Self::default()
    }

    /// Area enclosed by a polygon, using the non-zero winding rule
    ///
    /// A self-intersecting polygon is split into its simple pieces. Fewer than 3
    /// distinct points give an empty area.
    pub fn from_polygon(points: &[Point2<f64>]) -> Self {
        Self::from_polygons(std::iter::once(points))
    }

    /// Union of several polygons, each oriented independently
    pub fn from_polygons<'a>(polygons: impl IntoIterator<Item = &'a [Point2<f64>]>) -> Self {
        // Self-intersecting loops may have a zero net area, so only the point count is checked
        let subject: Vec<Vec<[f64; 2]>> = polygons
            .into_iter()
            .filter_map(clean_loop)
            .map(|points| contour_to_path(&ensure_ccw(&points)))
            .collect();
        if subject.is_empty() {
            return Self::new();
        }
        let clip: Vec<Vec<[f64; 2]>> = Vec::new();
        let result = subject.overlay(&clip, OverlayRule::Subject, FillRule::NonZero);
        Self::from_overlay(result)
    }

    /// Area enclosed by a path, curves flattened within `flatness`
    pub fn from_path(path: &Path2D, flatness: f64) -> Self {
        let loops = path.flatten(flatness);
        Self::from_polygons(loops.iter().map(Vec::as_slice))
    }

    /// Axis aligned rectangle area
    pub fn rectangle(rect: &Rect) -> Self {
        if rect.is_degenerate() {
            return Self::new();
        }
        Self {
            shapes: vec![PolygonWithHoles::new(rect.corners().to_vec())],
        }
    }

    /// The shapes of this area, outer loops counter-clockwise and holes clockwise
    pub fn shapes(&self) -> &[PolygonWithHoles] {
        &self.shapes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// True when the area is one shape without holes
    pub fn is_singular(&self) -> bool {
        self.shapes.len() == 1 && self.shapes[0].holes.is_empty()
    }

    /// Total enclosed area
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(PolygonWithHoles::area).sum()
    }

    /// Smallest rectangle enclosing the area, zero size at the origin when empty
    pub fn bounds(&self) -> Rect {
        let mut points = self.shapes.iter().flat_map(|s| s.outer.iter());
        let Some(first) = points.next() else {
            return Rect::default();
        };
        let mut min = *first;
        let mut max = *first;
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect { min, max }
    }

    /// Check if a point lies inside the area (boundary points are unspecified)
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        self.shapes.iter().any(|shape| {
            point_in_contour(point, &shape.outer)
                && !shape.holes.iter().any(|hole| point_in_contour(point, hole))
        })
    }

    /// Number of loops, holes included
    pub fn loop_count(&self) -> usize {
        self.shapes.iter().map(|s| 1 + s.holes.len()).sum()
    }

    pub fn union(&self, other: &PlanarArea) -> PlanarArea {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        self.overlay(other, OverlayRule::Union)
    }

    pub fn subtract(&self, other: &PlanarArea) -> PlanarArea {
        if self.is_empty() || other.is_empty() || !self.bounds().overlaps(&other.bounds()) {
            return self.clone();
        }
        self.overlay(other, OverlayRule::Difference)
    }

    pub fn intersect(&self, other: &PlanarArea) -> PlanarArea {
        if self.is_empty() || other.is_empty() || !self.bounds().overlaps(&other.bounds()) {
            return PlanarArea::new();
        }
        self.overlay(other, OverlayRule::Intersect)
    }

    pub fn exclusive_or(&self, other: &PlanarArea) -> PlanarArea {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        self.overlay(other, OverlayRule::Xor)
    }

    /// Union of many areas in a single overlay pass
    pub fn union_all<'a>(areas: impl IntoIterator<Item = &'a PlanarArea>) -> PlanarArea {
        // Shapes of every operand are already oriented, so non-zero winding fills
        // any point covered by at least one of them
        let subject: Vec<Vec<[f64; 2]>> = areas
            .into_iter()
            .flat_map(|area| area.to_paths())
            .collect();
        if subject.is_empty() {
            return PlanarArea::new();
        }
        let clip: Vec<Vec<[f64; 2]>> = Vec::new();
        let result = subject.overlay(&clip, OverlayRule::Subject, FillRule::NonZero);
        Self::from_overlay(result)
    }

    fn overlay(&self, other: &PlanarArea, rule: OverlayRule) -> PlanarArea {
        let subject = self.to_paths();
        let clip = other.to_paths();
        let result = subject.overlay(&clip, rule, FillRule::EvenOdd);
        Self::from_overlay(result)
    }

    fn to_paths(&self) -> Vec<Vec<[f64; 2]>> {
        self.shapes
            .iter()
            .flat_map(|shape| shape.loops().map(|l| contour_to_path(l)))
            .collect()
    }

    /// Convert i_overlay result shapes back to an area
    ///
    /// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
    /// - Outer Vec: list of shapes
    /// - Middle Vec: list of contours per shape (first is outer, rest are holes)
    /// - Inner Vec: list of points per contour
    fn from_overlay(result: Vec<Vec<Vec<[f64; 2]>>>) -> PlanarArea {
        let mut shapes = Vec::with_capacity(result.len());
        for shape in result {
            let mut contours = shape.into_iter().map(|c| path_to_contour(&c));
            let Some(outer) = contours.next().and_then(|c| clean_loop(&c)) else {
                continue;
            };
            if !is_valid_contour(&outer) {
                continue;
            }
            let holes = contours
                .filter_map(|c| clean_loop(&c))
                .filter(|c| is_valid_contour(c))
                .map(|c| ensure_cw(&c))
                .collect();
            shapes.push(PolygonWithHoles::with_holes(ensure_ccw(&outer), holes));
        }
        PlanarArea { shapes }
    }
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}
