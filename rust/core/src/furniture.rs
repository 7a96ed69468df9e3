// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Furniture, doors, windows and staircases placed in the plan

use crate::level::LevelId;
use crate::mesh::MeshBuffer;
use nalgebra::{Point2, Vector2};
use std::sync::Arc;

/// What a piece does to the geometry around it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceKind {
    Furniture,
    /// Cuts an opening in the walls it crosses
    DoorOrWindow,
    /// Cuts the floors and ceilings it goes through.
    /// `cut_out` is a polygon in the unit square mapped on the piece footprint.
    Staircase { cut_out: Option<Vec<Point2<f64>>> },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub name: String,
    /// Center of the footprint
    pub x: f64,
    pub y: f64,
    /// Elevation of the bottom, relative to the piece level
    pub elevation: f64,
    /// Rotation around the vertical axis, in radians
    pub angle: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub visible: bool,
    pub kind: PieceKind,
    /// Loaded model, in its own coordinates (Y up)
    #[cfg_attr(feature = "serde", serde(skip))]
    pub model: Option<Arc<MeshBuffer>>,
    pub level: Option<LevelId>,
}

impl Piece {
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: f64, depth: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            elevation: 0.0,
            angle: 0.0,
            width,
            depth,
            height,
            visible: true,
            kind: PieceKind::Furniture,
            model: None,
            level: None,
        }
    }

    /// A door or window with the given footprint center and size
    pub fn door_or_window(
        name: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        depth: f64,
        height: f64,
    ) -> Self {
        Self {
            kind: PieceKind::DoorOrWindow,
            ..Self::new(name, x, y, width, depth, height)
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_kind(mut self, kind: PieceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_model(mut self, model: Arc<MeshBuffer>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn at_level(mut self, level: LevelId) -> Self {
        self.level = Some(level);
        self
    }

    #[inline]
    pub fn is_door_or_window(&self) -> bool {
        matches!(self.kind, PieceKind::DoorOrWindow)
    }

    #[inline]
    pub fn is_staircase(&self) -> bool {
        matches!(self.kind, PieceKind::Staircase { .. })
    }

    /// Map a point of the unit square (0..1, 0..1) onto the rotated footprint
    pub fn map_unit_point(&self, unit: &Point2<f64>) -> Point2<f64> {
        let local = Vector2::new((unit.x - 0.5) * self.width, (unit.y - 0.5) * self.depth);
        let (sin, cos) = self.angle.sin_cos();
        Point2::new(
            self.x + local.x * cos - local.y * sin,
            self.y + local.x * sin + local.y * cos,
        )
    }

    /// The four corners of the rotated footprint, counter-clockwise for a zero angle
    pub fn points(&self) -> [Point2<f64>; 4] {
        [
            self.map_unit_point(&Point2::new(0.0, 0.0)),
            self.map_unit_point(&Point2::new(1.0, 0.0)),
            self.map_unit_point(&Point2::new(1.0, 1.0)),
            self.map_unit_point(&Point2::new(0.0, 1.0)),
        ]
    }

    /// Outline cut by a staircase in the floors it crosses, `None` for other pieces
    pub fn staircase_outline(&self) -> Option<Vec<Point2<f64>>> {
        match &self.kind {
            PieceKind::Staircase { cut_out: Some(shape) } if shape.len() >= 3 => {
                Some(shape.iter().map(|p| self.map_unit_point(p)).collect())
            }
            PieceKind::Staircase { .. } => Some(self.points().to_vec()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_piece_points() {
        let piece = Piece::new("table", 5.0, 5.0, 4.0, 2.0, 1.0);
        let points = piece.points();
        assert_eq!(points[0], Point2::new(3.0, 4.0));
        assert_eq!(points[2], Point2::new(7.0, 6.0));
    }

    #[test]
    fn test_rotated_piece_points() {
        let piece = Piece::new("bed", 0.0, 0.0, 4.0, 2.0, 1.0).with_angle(FRAC_PI_2);
        let points = piece.points();
        assert_relative_eq!(points[0].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(points[0].y, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_staircase_outline() {
        let stairs = Piece::new("stairs", 0.0, 0.0, 2.0, 2.0, 3.0).with_kind(PieceKind::Staircase {
            cut_out: Some(vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ]),
        });
        let outline = stairs.staircase_outline().unwrap();
        assert_eq!(outline.len(), 3);
        assert_eq!(outline[1], Point2::new(1.0, -1.0));

        assert!(Piece::new("chair", 0.0, 0.0, 1.0, 1.0, 1.0)
            .staircase_outline()
            .is_none());
    }
}
