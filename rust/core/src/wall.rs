// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall descriptors and their plan footprint

use crate::appearance::TextureRef;
use crate::level::LevelId;
use nalgebra::{Point2, Vector2};
use std::f64::consts::FRAC_PI_2;

/// Arc extents below this are drawn as straight walls
const MIN_ARC_EXTENT: f64 = 1e-6;

/// One of the two faces of a wall, seen from its start looking at its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallSide {
    Left,
    Right,
}

/// Surface finish of one wall face
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallFinish {
    pub color: Option<u32>,
    pub texture: Option<TextureRef>,
    pub shininess: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wall {
    pub x_start: f64,
    pub y_start: f64,
    pub x_end: f64,
    pub y_end: f64,
    pub thickness: f64,
    /// Height at start, `None` uses the home default wall height
    pub height: Option<f64>,
    /// Height at end for sloping walls
    pub height_at_end: Option<f64>,
    /// Signed arc extent in radians, `None` for straight walls
    pub arc_extent: Option<f64>,
    pub left: WallFinish,
    pub right: WallFinish,
    pub level: Option<LevelId>,
}

impl Wall {
    pub fn new(x_start: f64, y_start: f64, x_end: f64, y_end: f64, thickness: f64) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
            thickness,
            height: None,
            height_at_end: None,
            arc_extent: None,
            left: WallFinish::default(),
            right: WallFinish::default(),
            level: None,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_height_at_end(mut self, height_at_end: f64) -> Self {
        self.height_at_end = Some(height_at_end);
        self
    }

    pub fn with_arc_extent(mut self, arc_extent: f64) -> Self {
        self.arc_extent = Some(arc_extent);
        self
    }

    pub fn at_level(mut self, level: LevelId) -> Self {
        self.level = Some(level);
        self
    }

    #[inline]
    pub fn start(&self) -> Point2<f64> {
        Point2::new(self.x_start, self.y_start)
    }

    #[inline]
    pub fn end(&self) -> Point2<f64> {
        Point2::new(self.x_end, self.y_end)
    }

    pub fn finish(&self, side: WallSide) -> &WallFinish {
        match side {
            WallSide::Left => &self.left,
            WallSide::Right => &self.right,
        }
    }

    /// Length of the wall baseline (chord length for arced walls)
    pub fn length(&self) -> f64 {
        (self.end() - self.start()).norm()
    }

    /// Angle of the baseline in the plan
    pub fn yaw(&self) -> f64 {
        (self.y_end - self.y_start).atan2(self.x_end - self.x_start)
    }

    /// Height at start, falling back to `default_height`
    pub fn height_at_start_or(&self, default_height: f64) -> f64 {
        self.height.unwrap_or(default_height)
    }

    /// Height at end, falling back to the start height
    pub fn height_at_end_or(&self, default_height: f64) -> f64 {
        self.height_at_end
            .unwrap_or_else(|| self.height_at_start_or(default_height))
    }

    /// True when start and end heights differ
    pub fn is_trapezoidal(&self) -> bool {
        match (self.height, self.height_at_end) {
            (Some(start), Some(end)) => start != end,
            (None, Some(_)) => true,
            _ => false,
        }
    }

    /// Arc extent if the wall is visibly curved
    pub fn effective_arc_extent(&self) -> Option<f64> {
        self.arc_extent
            .filter(|extent| extent.abs() > MIN_ARC_EXTENT && self.length() > 0.0)
    }

    /// Center of the circle the wall baseline follows, for arced walls
    pub fn arc_center(&self) -> Option<Point2<f64>> {
        let extent = self.effective_arc_extent()?;
        let chord = self.end() - self.start();
        let length = chord.norm();
        let middle = self.start() + chord * 0.5;
        let left_normal = Vector2::new(-chord.y, chord.x) / length;
        let half_extent = extent / 2.0;
        // A half circle has its center on the chord
        let offset = if (half_extent.abs() - FRAC_PI_2).abs() < MIN_ARC_EXTENT {
            0.0
        } else {
            (length / 2.0) / half_extent.tan()
        };
        Some(middle + left_normal * offset)
    }

    /// Radius of the baseline circle, for arced walls
    pub fn arc_radius(&self) -> Option<f64> {
        self.arc_center().map(|center| (self.start() - center).norm())
    }

    /// Footprint of the whole wall: left face from start to end, then right face back
    pub fn points(&self, flatness: f64) -> Vec<Point2<f64>> {
        let (left, _, right) = self.faces(flatness);
        let mut points = left;
        points.extend(right.into_iter().rev());
        points
    }

    /// Footprint of the half of the wall between `side` and the centerline
    pub fn side_points(&self, side: WallSide, flatness: f64) -> Vec<Point2<f64>> {
        let (left, center, right) = self.faces(flatness);
        match side {
            WallSide::Left => {
                let mut points = left;
                points.extend(center.into_iter().rev());
                points
            }
            WallSide::Right => {
                let mut points = center;
                points.extend(right.into_iter().rev());
                points
            }
        }
    }

    /// Left face, centerline and right face, each ordered from start to end
    fn faces(&self, flatness: f64) -> (Vec<Point2<f64>>, Vec<Point2<f64>>, Vec<Point2<f64>>) {
        let half = self.thickness / 2.0;
        match (self.effective_arc_extent(), self.arc_center()) {
            (Some(extent), Some(center)) => {
                let radius = (self.start() - center).norm();
                let start_angle = (self.y_start - center.y).atan2(self.x_start - center.x);
                let steps = arc_steps(radius + half, extent, flatness);
                // Left of the travel direction points to the center when turning counter-clockwise
                let inward = if extent > 0.0 { -half } else { half };
                let mut left = Vec::with_capacity(steps + 1);
                let mut middle = Vec::with_capacity(steps + 1);
                let mut right = Vec::with_capacity(steps + 1);
                for i in 0..=steps {
                    let angle = start_angle + extent * i as f64 / steps as f64;
                    let direction = Vector2::new(angle.cos(), angle.sin());
                    left.push(center + direction * (radius + inward));
                    middle.push(center + direction * radius);
                    right.push(center + direction * (radius - inward));
                }
                // Pin the centerline ends to the exact wall ends
                middle[0] = self.start();
                middle[steps] = self.end();
                (left, middle, right)
            }
            _ => {
                let start = self.start();
                let end = self.end();
                let length = self.length();
                let normal = if length > 0.0 {
                    Vector2::new(-(end.y - start.y), end.x - start.x) / length * half
                } else {
                    Vector2::zeros()
                };
                (
                    vec![start + normal, end + normal],
                    vec![start, end],
                    vec![start - normal, end - normal],
                )
            }
        }
    }
}

/// Number of segments keeping the arc within `flatness` of the true circle
fn arc_steps(radius: f64, extent: f64, flatness: f64) -> usize {
    let max_step = if flatness > 0.0 && flatness < radius {
        2.0 * (1.0 - flatness / radius).acos()
    } else {
        FRAC_PI_2
    };
    let steps = (extent.abs() / max_step.max(1e-3)).ceil() as usize;
    steps.clamp(2, 512)
}
