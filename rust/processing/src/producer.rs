// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh producers: one per home object shown in 3D
//!
//! Each producer rebuilds the complete list of shapes of its object from a home
//! snapshot. Nothing is kept between rebuilds.

use crate::error::{Error, Result};
use plan3d_core::{Appearance, Home, MeshBuffer, TextureRef, WallFinish, WallSide};
use plan3d_geometry::{
    generate_furniture, generate_ground, generate_label, generate_polyline, generate_room,
    generate_wall, GeometryConfig, GroundPartKind, Rect,
};
use tracing::debug;

/// A mesh with the appearance it is drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePart {
    /// Name of the part inside its object, like `left` or `floor`
    pub name: String,
    pub appearance: Option<Appearance>,
    pub mesh: MeshBuffer,
}

impl ShapePart {
    pub fn new(name: impl Into<String>, appearance: Option<Appearance>, mesh: MeshBuffer) -> Self {
        Self {
            name: name.into(),
            appearance,
            mesh,
        }
    }
}

/// An object of the home turned into shapes
#[derive(Debug, Clone, PartialEq)]
pub enum MeshProducer {
    /// Wall at an index of `Home::walls`
    Wall(usize),
    /// Room at an index of `Home::rooms`
    Room(usize),
    /// Ground, limited to `tile` when set
    Ground {
        tile: Option<Rect>,
        texture: Option<TextureRef>,
    },
    /// Piece at an index of `Home::furniture`
    Furniture(usize),
    /// Label at an index of `Home::labels`
    Label(usize),
    /// Polyline at an index of `Home::polylines`
    Polyline(usize),
}

impl MeshProducer {
    /// Producers of every object of `home`, ground first
    pub fn all(home: &Home) -> Vec<MeshProducer> {
        let mut producers = vec![MeshProducer::Ground {
            tile: None,
            texture: None,
        }];
        producers.extend((0..home.walls.len()).map(MeshProducer::Wall));
        producers.extend((0..home.rooms.len()).map(MeshProducer::Room));
        producers.extend((0..home.furniture.len()).map(MeshProducer::Furniture));
        producers.extend((0..home.polylines.len()).map(MeshProducer::Polyline));
        producers.extend((0..home.labels.len()).map(MeshProducer::Label));
        producers
    }

    /// Readable identity used in logs and exported group names
    pub fn name(&self) -> String {
        match self {
            MeshProducer::Wall(index) => format!("wall_{}", index),
            MeshProducer::Room(index) => format!("room_{}", index),
            MeshProducer::Ground { .. } => "ground".to_string(),
            MeshProducer::Furniture(index) => format!("piece_{}", index),
            MeshProducer::Label(index) => format!("label_{}", index),
            MeshProducer::Polyline(index) => format!("polyline_{}", index),
        }
    }

    /// Build every shape of the object from `home`
    ///
    /// Objects that show nothing, like hidden pieces or labels without pitch, return
    /// an empty list. An index past the end of its home list is an
    /// [`plan3d_geometry::Error::UnknownIndex`] error for every kind of object.
    pub fn rebuild(&self, home: &Home, config: &GeometryConfig) -> Result<Vec<ShapePart>> {
        let parts = match self {
            MeshProducer::Wall(index) => {
                let wall = lookup(&home.walls, "wall", *index)?;
                generate_wall(home, *index, config)?
                    .into_iter()
                    .filter(|side| !side.is_empty())
                    .map(|side| {
                        let (name, finish) = match side.side {
                            WallSide::Left => ("left", &wall.left),
                            WallSide::Right => ("right", &wall.right),
                        };
                        ShapePart::new(name, finish_appearance(name, finish), side.merged_mesh())
                    })
                    .collect()
            }
            MeshProducer::Room(index) => {
                let room = lookup(&home.rooms, "room", *index)?;
                let geometry = generate_room(home, *index, config)?;
                let floor = room.floor_texture.clone().map(|t| textured("floor", t));
                let ceiling = room.ceiling_texture.clone().map(|t| textured("ceiling", t));
                [
                    ("floor", geometry.floor, floor.clone()),
                    ("ceiling", geometry.ceiling, ceiling),
                    ("border", geometry.border, floor.clone()),
                    ("floor_bottom", geometry.floor_bottom, floor),
                ]
                .into_iter()
                .filter_map(|(name, mesh, appearance)| {
                    mesh.map(|mesh| ShapePart::new(name, appearance, mesh))
                })
                .collect()
            }
            MeshProducer::Ground { tile, texture } => {
                let appearance = texture.clone().map(|t| textured("ground", t));
                generate_ground(home, *tile, texture.as_ref(), config)
                    .parts
                    .into_iter()
                    .map(|part| {
                        let kind = match part.kind {
                            GroundPartKind::Surface => "surface",
                            GroundPartKind::Cliff => "cliff",
                            GroundPartKind::Cover => "cover",
                        };
                        let name = format!("{}_{}", kind, part.elevation.round() as i64);
                        ShapePart::new(name, appearance.clone(), part.mesh)
                    })
                    .collect()
            }
            MeshProducer::Furniture(index) => {
                lookup(&home.furniture, "piece", *index)?;
                generate_furniture(home, *index)
                    .map(|mesh| vec![ShapePart::new("model", None, mesh)])
                    .unwrap_or_default()
            }
            MeshProducer::Label(index) => {
                lookup(&home.labels, "label", *index)?;
                generate_label(home, *index)
                    .map(|mesh| vec![ShapePart::new("text", None, mesh)])
                    .unwrap_or_default()
            }
            MeshProducer::Polyline(index) => {
                let appearance = lookup(&home.polylines, "polyline", *index)?
                    .color
                    .map(|color| Appearance::new("polyline").with_color(color));
                generate_polyline(home, *index, config)
                    .map(|mesh| vec![ShapePart::new("stroke", appearance, mesh)])
                    .unwrap_or_default()
            }
        };

        debug!(
            object = %self.name(),
            parts = parts.len(),
            triangles = parts.iter().map(|p| p.mesh.triangle_count()).sum::<usize>(),
            "rebuilt object"
        );
        Ok(parts)
    }
}

fn lookup<'a, T>(items: &'a [T], kind: &'static str, index: usize) -> Result<&'a T> {
    items
        .get(index)
        .ok_or(Error::Geometry(plan3d_geometry::Error::UnknownIndex { kind, index }))
}

fn textured(name: &str, texture: TextureRef) -> Appearance {
    Appearance::new(name).with_texture(texture)
}

fn finish_appearance(name: &str, finish: &WallFinish) -> Option<Appearance> {
    if finish.color.is_none() && finish.texture.is_none() && finish.shininess == 0.0 {
        return None;
    }
    let mut appearance = Appearance::new(name).with_shininess(finish.shininess);
    if let Some(color) = finish.color {
        appearance = appearance.with_color(color);
    }
    if let Some(texture) = finish.texture.clone() {
        appearance = appearance.with_texture(texture);
    }
    Some(appearance)
}
