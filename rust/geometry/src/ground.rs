// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Terraced ground
//!
//! Underground rooms, walls, sunk furniture and staircases excavate the ground. Each
//! underground elevation gets a flat surface where nothing deeper is dug, cliffs along
//! the edge of everything dug at least that deep, and a downward cover where a deeper
//! pit runs under its area.

use crate::area::{PlanarArea, Rect};
use crate::builder::{MeshGeometryBuilder, TextureFn};
use crate::config::GeometryConfig;
use crate::contour::{extract_contours, extract_polygons, interior_point};
use crate::furniture::{furniture_footprint, staircase_footprint};
use nalgebra::Point2;
use plan3d_core::{Home, MeshBuffer, TextureRef};
use tracing::{debug, trace};

/// Elevations closer than this share one terrace
const SAME_ELEVATION: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroundPartKind {
    /// Upward facing ground, at elevation 0 or at the bottom of a pit
    Surface,
    /// Vertical wall of a pit
    Cliff,
    /// Downward facing ceiling over a pit running under a shallower terrace
    Cover,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundPart {
    pub kind: GroundPartKind,
    /// Elevation of the surface or cover, bottom elevation of a cliff
    pub elevation: f64,
    pub mesh: MeshBuffer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundGeometry {
    pub parts: Vec<GroundPart>,
}

impl GroundGeometry {
    pub fn parts_of(&self, kind: GroundPartKind) -> impl Iterator<Item = &GroundPart> {
        self.parts.iter().filter(move |p| p.kind == kind)
    }
}

/// Areas dug into the ground, deepest last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Excavation {
    /// Negative elevations with the area dug down to each, sorted by descending elevation
    pub levels: Vec<(f64, PlanarArea)>,
    /// Areas cut from the ground plane without digging, like ground level room floors
    pub ground_holes: PlanarArea,
}

impl Excavation {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.ground_holes.is_empty()
    }
}

/// Collect the areas dug at each underground elevation
pub fn collect_excavation(home: &Home, config: &GeometryConfig) -> Excavation {
    let mut levels: Vec<(f64, Vec<PlanarArea>)> = Vec::new();
    let mut ground_holes: Vec<PlanarArea> = Vec::new();
    let mut add = |elevation: f64, area: PlanarArea| {
        if area.is_empty() {
            return;
        }
        if elevation.abs() < SAME_ELEVATION {
            ground_holes.push(area);
        } else if elevation < 0.0 {
            match levels
                .iter_mut()
                .find(|(e, _)| (e - elevation).abs() < SAME_ELEVATION)
            {
                Some((_, areas)) => areas.push(area),
                None => levels.push((elevation, vec![area])),
            }
        }
    };

    for room in &home.rooms {
        if room.floor_visible && room.is_drawable() && home.is_viewable(room.level) {
            add(home.level_elevation(room.level), PlanarArea::from_polygon(&room.points));
        }
    }

    // Walls standing underground, with the rooms they enclose
    let mut walls_by_elevation: Vec<(f64, Vec<PlanarArea>)> = Vec::new();
    for wall in &home.walls {
        let elevation = home.level_elevation(wall.level);
        if elevation >= 0.0 || !home.is_viewable(wall.level) {
            continue;
        }
        let area = PlanarArea::from_polygon(&wall.points(config.wall_flatness));
        match walls_by_elevation
            .iter_mut()
            .find(|(e, _)| (e - elevation).abs() < SAME_ELEVATION)
        {
            Some((_, areas)) => areas.push(area),
            None => walls_by_elevation.push((elevation, vec![area])),
        }
    }
    for (elevation, areas) in walls_by_elevation {
        let walls = PlanarArea::union_all(&areas);
        let enclosed: Vec<&[Point2<f64>]> = walls
            .shapes()
            .iter()
            .flat_map(|shape| shape.holes.iter().map(Vec::as_slice))
            .collect();
        let enclosed = PlanarArea::from_polygons(enclosed);
        add(elevation, walls.union(&enclosed));
    }

    let mut level_elevations: Vec<f64> = home
        .levels
        .iter()
        .filter(|level| level.viewable && level.elevation <= 0.0)
        .map(|level| level.elevation)
        .chain(std::iter::once(0.0))
        .collect();
    level_elevations.sort_by(|a, b| b.total_cmp(a));
    level_elevations.dedup_by(|a, b| (*a - *b).abs() < SAME_ELEVATION);

    for piece in &home.furniture {
        if !piece.visible || piece.is_door_or_window() || !home.is_viewable(piece.level) {
            continue;
        }
        let bottom = home.piece_ground_elevation(piece);
        if piece.is_staircase() {
            let top = bottom + piece.height;
            for &elevation in &level_elevations {
                if bottom < elevation && elevation <= top {
                    if let Some(cut) = staircase_footprint(home, piece, config) {
                        add(elevation, cut);
                    }
                }
            }
        } else if bottom < -SAME_ELEVATION {
            add(bottom, furniture_footprint(home, piece, config));
        }
    }

    let mut levels: Vec<(f64, PlanarArea)> = levels
        .into_iter()
        .map(|(elevation, areas)| (elevation, PlanarArea::union_all(&areas)))
        .filter(|(_, area)| !area.is_empty())
        .collect();
    levels.sort_by(|a, b| b.0.total_cmp(&a.0));

    Excavation {
        levels,
        ground_holes: PlanarArea::union_all(&ground_holes),
    }
}

/// Build the ground over `tile`, or around what the home digs when no tile is given
pub fn generate_ground(
    home: &Home,
    tile: Option<Rect>,
    texture: Option<&TextureRef>,
    config: &GeometryConfig,
) -> GroundGeometry {
    let excavation = collect_excavation(home, config);
    build_ground(&excavation, tile, texture, config)
}

/// Build the ground meshes of an excavation
pub fn build_ground(
    excavation: &Excavation,
    tile: Option<Rect>,
    texture: Option<&TextureRef>,
    config: &GeometryConfig,
) -> GroundGeometry {
    let levels = &excavation.levels;

    // cumulative[i]: everything dug at least as deep as levels[i]
    let mut cumulative: Vec<PlanarArea> = vec![PlanarArea::new(); levels.len()];
    let mut deeper = PlanarArea::new();
    for i in (0..levels.len()).rev() {
        deeper = deeper.union(&levels[i].1);
        cumulative[i] = deeper.clone();
    }
    let all_dug = cumulative.first().cloned().unwrap_or_default();
    let carved = all_dug.union(&excavation.ground_holes);

    let extent = match tile {
        Some(tile) => tile,
        None if carved.is_empty() => {
            let half = config.default_ground_half_size;
            Rect::new(Point2::new(-half, -half), Point2::new(half, half))
        }
        None => carved.bounds().expand(config.ground_margin),
    };

    let origin = extent.min;
    let texture_fn = texture.map(|texture| {
        move |p: &Point2<f64>, _: f64| {
            [
                texture.u(p.x - origin.x) as f64,
                texture.v(p.y - origin.y) as f64,
            ]
        }
    });
    let texture_fn: Option<TextureFn<'_>> = texture_fn.as_ref().map(|f| f as TextureFn<'_>);
    let mut parts = Vec::new();

    // Ground plane
    let ground_areas = if carved.is_empty() {
        vec![PlanarArea::rectangle(&extent)]
    } else {
        let carved_bounds = carved.bounds();
        if extent.contains_rect(&carved_bounds) && !carved_bounds.contains_rect(&extent) {
            vec![
                PlanarArea::rectangle(&carved_bounds).subtract(&carved),
                PlanarArea::rectangle(&extent).subtract(&PlanarArea::rectangle(&carved_bounds)),
            ]
        } else {
            vec![PlanarArea::rectangle(&extent).subtract(&carved)]
        }
    };
    for area in &ground_areas {
        push_surface(&mut parts, GroundPartKind::Surface, area, 0.0, true, texture_fn);
    }

    let mut upper = 0.0;
    for (i, (elevation, area)) in levels.iter().enumerate() {
        let elevation = *elevation;
        let below = cumulative.get(i + 1).cloned().unwrap_or_default();
        let side = area.subtract(&below);
        push_surface(&mut parts, GroundPartKind::Surface, &side, elevation, true, texture_fn);

        let mut cliffs = MeshGeometryBuilder::new(0.0);
        let height = upper - elevation;
        for contour in extract_contours(&cumulative[i], false) {
            cliffs.add_vertical_loop(
                &contour,
                |_| elevation,
                |_| upper,
                texture.map(|t| (t.width, t.height)),
            );
        }
        let mesh = cliffs.build();
        if !mesh.is_empty() {
            parts.push(GroundPart {
                kind: GroundPartKind::Cliff,
                elevation,
                mesh,
            });
        }

        // Pits running under this terrace leave holes inside its own area
        let covered: Vec<Vec<Point2<f64>>> = side
            .shapes()
            .iter()
            .flat_map(|shape| shape.holes.iter())
            .filter(|hole| interior_point(hole).is_some_and(|p| area.contains(&p)))
            .cloned()
            .collect();
        if !covered.is_empty() {
            let cover = PlanarArea::from_polygons(covered.iter().map(Vec::as_slice));
            push_surface(&mut parts, GroundPartKind::Cover, &cover, elevation, false, texture_fn);
        }

        trace!(elevation, height, "terrace built");
        upper = elevation;
    }

    debug!(
        terraces = levels.len(),
        parts = parts.len(),
        carved = !carved.is_empty(),
        "generated ground"
    );
    GroundGeometry { parts }
}

fn push_surface(
    parts: &mut Vec<GroundPart>,
    kind: GroundPartKind,
    area: &PlanarArea,
    elevation: f64,
    facing_up: bool,
    texture: Option<TextureFn<'_>>,
) {
    if area.is_empty() {
        return;
    }
    let mut builder = MeshGeometryBuilder::new(0.0);
    for polygon in extract_polygons(area, facing_up) {
        builder.add_polygon(&polygon, |_| elevation, texture);
    }
    let mesh = builder.build();
    if !mesh.is_empty() {
        parts.push(GroundPart {
            kind,
            elevation,
            mesh,
        });
    }
}
