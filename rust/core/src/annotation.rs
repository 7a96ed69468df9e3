// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polylines and labels drawn on the plan and optionally shown in 3D

use crate::level::LevelId;
use nalgebra::Point2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CapStyle {
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinStyle {
    Bevel,
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrowStyle {
    None,
    Delta,
    Disc,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polyline {
    pub points: Vec<Point2<f64>>,
    pub thickness: f64,
    pub cap: CapStyle,
    pub join: JoinStyle,
    pub start_arrow: ArrowStyle,
    pub end_arrow: ArrowStyle,
    pub closed: bool,
    /// Elevation relative to the polyline level
    pub elevation: f64,
    pub color: Option<u32>,
    pub visible_in_3d: bool,
    pub level: Option<LevelId>,
}

impl Polyline {
    pub fn new(points: Vec<Point2<f64>>, thickness: f64) -> Self {
        Self {
            points,
            thickness,
            cap: CapStyle::Butt,
            join: JoinStyle::Miter,
            start_arrow: ArrowStyle::None,
            end_arrow: ArrowStyle::None,
            closed: false,
            elevation: 0.0,
            color: None,
            visible_in_3d: true,
            level: None,
        }
    }
}

/// A text label; its extent is measured by the caller
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
    pub angle: f64,
    /// Rotation around the base line; labels without pitch stay in the 2D plan
    pub pitch: Option<f64>,
    pub text_width: f64,
    pub text_height: f64,
    pub level: Option<LevelId>,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f64, y: f64, text_width: f64, text_height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            elevation: 0.0,
            angle: 0.0,
            pitch: None,
            text_width,
            text_height,
            level: None,
        }
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }
}
