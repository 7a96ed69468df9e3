// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::appearance::TextureRef;
use crate::level::LevelId;
use nalgebra::Point2;

/// A room drawn as a plan polygon, with a floor and a ceiling
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    pub name: String,
    pub points: Vec<Point2<f64>>,
    pub floor_visible: bool,
    pub ceiling_visible: bool,
    pub floor_texture: Option<TextureRef>,
    pub ceiling_texture: Option<TextureRef>,
    pub level: Option<LevelId>,
}

impl Room {
    pub fn new(name: impl Into<String>, points: Vec<Point2<f64>>) -> Self {
        Self {
            name: name.into(),
            points,
            floor_visible: true,
            ceiling_visible: true,
            floor_texture: None,
            ceiling_texture: None,
            level: None,
        }
    }

    pub fn at_level(mut self, level: LevelId) -> Self {
        self.level = Some(level);
        self
    }

    /// Signed area of the polygon, positive when counter-clockwise
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let p = &self.points[i];
            let q = &self.points[(i + 1) % n];
            area += p.x * q.y - q.x * p.y;
        }
        area * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True when the room has enough points to enclose an area
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 3 && self.area() > 0.0
    }

    /// True when no two non-adjacent edges of the polygon cross or touch
    pub fn is_singular(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a1 = self.points[i];
            let a2 = self.points[(i + 1) % n];
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let b1 = self.points[j];
                let b2 = self.points[(j + 1) % n];
                if segments_intersect(a1, a2, b1, b2) {
                    return false;
                }
            }
        }
        true
    }
}

fn orientation(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(a1: Point2<f64>, a2: Point2<f64>, b1: Point2<f64>, b2: Point2<f64>) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}
