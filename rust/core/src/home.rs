// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::annotation::{Label, Polyline};
use crate::error::{Error, Result};
use crate::furniture::Piece;
use crate::level::{Level, LevelId};
use crate::room::Room;
use crate::wall::Wall;

/// Default wall height used by walls without their own height
pub const DEFAULT_WALL_HEIGHT: f64 = 250.0;

/// Everything the plan editor hands to the mesh generators
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Home {
    pub levels: Vec<Level>,
    pub walls: Vec<Wall>,
    pub rooms: Vec<Room>,
    pub furniture: Vec<Piece>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub polylines: Vec<Polyline>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub labels: Vec<Label>,
    pub wall_height: f64,
}

impl Home {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            walls: Vec::new(),
            rooms: Vec::new(),
            furniture: Vec::new(),
            polylines: Vec::new(),
            labels: Vec::new(),
            wall_height: DEFAULT_WALL_HEIGHT,
        }
    }

    pub fn add_level(&mut self, level: Level) -> LevelId {
        self.levels.push(level);
        LevelId(self.levels.len() - 1)
    }

    pub fn level(&self, id: Option<LevelId>) -> Option<&Level> {
        id.and_then(|LevelId(index)| self.levels.get(index))
    }

    /// Elevation of a level, 0 for the implicit ground level
    pub fn level_elevation(&self, id: Option<LevelId>) -> f64 {
        self.level(id).map_or(0.0, |level| level.elevation)
    }

    /// Height of a level, the default wall height for the implicit ground level
    pub fn level_height(&self, id: Option<LevelId>) -> f64 {
        self.level(id).map_or(self.wall_height, |level| level.height)
    }

    pub fn floor_thickness(&self, id: Option<LevelId>) -> f64 {
        self.level(id).map_or(0.0, |level| level.floor_thickness)
    }

    /// True if objects at this level are shown
    pub fn is_viewable(&self, id: Option<LevelId>) -> bool {
        self.level(id).map_or(true, |level| level.viewable)
    }

    /// Lowest elevation among levels, 0 without levels
    pub fn lowest_elevation(&self) -> f64 {
        self.levels
            .iter()
            .map(|level| level.elevation)
            .fold(None, |lowest: Option<f64>, e| Some(lowest.map_or(e, |l| l.min(e))))
            .unwrap_or(0.0)
    }

    /// True when both ids designate levels at the same elevation
    pub fn same_elevation(&self, a: Option<LevelId>, b: Option<LevelId>) -> bool {
        (self.level_elevation(a) - self.level_elevation(b)).abs() < 1e-3
    }

    /// Elevation of the bottom of a piece
    pub fn piece_ground_elevation(&self, piece: &Piece) -> f64 {
        self.level_elevation(piece.level) + piece.elevation
    }

    /// Elevation of a label or polyline reference
    pub fn ground_elevation(&self, level: Option<LevelId>, elevation: f64) -> f64 {
        self.level_elevation(level) + elevation
    }

    /// Check that every level reference points to an existing level
    pub fn validate(&self) -> Result<()> {
        let references = self
            .walls
            .iter()
            .map(|w| w.level)
            .chain(self.rooms.iter().map(|r| r.level))
            .chain(self.furniture.iter().map(|p| p.level))
            .chain(self.polylines.iter().map(|p| p.level))
            .chain(self.labels.iter().map(|l| l.level));
        for reference in references.flatten() {
            if reference.0 >= self.levels.len() {
                return Err(Error::UnknownLevel(reference.0));
            }
        }
        Ok(())
    }
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_lookup() {
        let mut home = Home::new();
        let basement = home.add_level(Level::new("basement", -300.0, 20.0, 280.0));
        let ground = home.add_level(Level::new("ground", 0.0, 12.0, 250.0));

        assert_eq!(home.level_elevation(Some(basement)), -300.0);
        assert_eq!(home.level_elevation(None), 0.0);
        assert_eq!(home.level_height(None), DEFAULT_WALL_HEIGHT);
        assert_eq!(home.lowest_elevation(), -300.0);
        assert!(home.same_elevation(Some(ground), None));
    }

    #[test]
    fn test_validate_level_references() {
        let mut home = Home::new();
        home.walls.push(Wall::new(0.0, 0.0, 1.0, 0.0, 0.1).at_level(LevelId(3)));
        assert_eq!(home.validate(), Err(Error::UnknownLevel(3)));
    }
}
