// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Plan3D Core
//!
//! Value types shared by the plan3d crates: the home plan handed over by the editor
//! and the mesh buffers produced from it.
//!
//! ## Overview
//!
//! - **Plan descriptors**: [`Wall`], [`Room`], [`Piece`], [`Polyline`], [`Label`] and the
//!   [`Level`]s they sit on, gathered in a [`Home`]
//! - **Mesh buffers**: [`MeshBuffer`] with indexed triangles or polygon strips, the one
//!   format exchanged between generators, interchange codecs and the scene sink
//! - **Appearances**: [`Appearance`] and [`TextureRef`], compared by value
//!
//! Plan coordinates are `(x, y)` on the floor; meshes are Y-up with the plan `y` mapped
//! to the 3D `z` axis.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plan3d_core::{Home, Level, Room, Wall};
//! use nalgebra::Point2;
//!
//! let mut home = Home::new();
//! let basement = home.add_level(Level::new("basement", -300.0, 20.0, 280.0));
//! home.walls.push(Wall::new(0.0, 0.0, 500.0, 0.0, 20.0).with_height(260.0));
//! home.rooms.push(Room::new("cellar", vec![
//!     Point2::new(0.0, 0.0),
//!     Point2::new(500.0, 0.0),
//!     Point2::new(500.0, 400.0),
//!     Point2::new(0.0, 400.0),
//! ]).at_level(basement));
//! home.validate()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for plan descriptors and mesh buffers

pub mod annotation;
pub mod appearance;
pub mod error;
pub mod furniture;
pub mod home;
pub mod level;
pub mod mesh;
pub mod room;
pub mod wall;

pub use annotation::{ArrowStyle, CapStyle, JoinStyle, Label, Polyline};
pub use appearance::{Appearance, TextureRef};
pub use error::{Error, Result};
pub use furniture::{Piece, PieceKind};
pub use home::{Home, DEFAULT_WALL_HEIGHT};
pub use level::{Level, LevelId};
pub use mesh::{MeshBuffer, Topology};
pub use room::Room;
pub use wall::{Wall, WallFinish, WallSide};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};
