// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan3D Geometry
//!
//! Planar area algebra and the mesh generators turning a home plan into 3D surfaces,
//! using i_overlay for boolean operations, earcutr for triangulation and nalgebra for
//! transformations.
//!
//! Every generator reads a [`plan3d_core::Home`] snapshot and returns fresh
//! [`plan3d_core::MeshBuffer`]s; nothing is cached between calls.

pub mod area;
pub mod builder;
pub mod config;
pub mod contour;
pub mod error;
pub mod furniture;
pub mod ground;
pub mod hull;
pub mod label;
pub mod path;
pub mod polyline;
pub mod room;
pub mod triangulation;
pub mod wall;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use area::{PlanarArea, Rect};
pub use builder::{build_polygon_mesh, MeshGeometryBuilder};
pub use config::GeometryConfig;
pub use contour::{extract_contours, extract_polygons, PolygonWithHoles};
pub use error::{Error, Result};
pub use furniture::{furniture_footprint, generate_furniture, place_model, staircase_footprint};
pub use ground::{
    build_ground, collect_excavation, generate_ground, Excavation, GroundGeometry, GroundPart,
    GroundPartKind,
};
pub use hull::{project_and_hull, project_footprint};
pub use label::generate_label;
pub use path::{Path2D, PathSegment};
pub use polyline::{generate_polyline, stroke_polyline};
pub use room::{generate_room, RoomGeometry, RoomPart};
pub use triangulation::triangulate_polygon;
pub use wall::{
    generate_wall, generate_wall_side, split_overlapping_openings, Opening, WallPart,
    WallPartKind, WallSideGeometry,
};
