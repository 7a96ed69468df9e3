// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Index of a level in [`crate::Home::levels`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelId(pub usize);

/// A building storey
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Level {
    pub name: String,
    /// Elevation of the level floor top
    pub elevation: f64,
    pub floor_thickness: f64,
    pub height: f64,
    /// Order among levels sharing the same elevation
    pub elevation_index: i32,
    pub viewable: bool,
}

impl Level {
    pub fn new(name: impl Into<String>, elevation: f64, floor_thickness: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            elevation,
            floor_thickness,
            height,
            elevation_index: 0,
            viewable: true,
        }
    }

    /// True for levels dug below the ground plane
    #[inline]
    pub fn is_underground(&self) -> bool {
        self.elevation < 0.0
    }
}
