// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room floors and ceilings
//!
//! Floors face up at the level elevation, ceilings face down at the height given by
//! the nearest wall end. Rooms drawn later at the same elevation hide the part of
//! earlier rooms they cover, and staircases cut through the floors and ceilings they
//! cross.

use crate::area::{PlanarArea, Rect};
use crate::builder::{MeshGeometryBuilder, TextureFn};
use crate::config::GeometryConfig;
use crate::contour::{
    clean_loop, ensure_ccw, ensure_cw, extract_contours, extract_polygons, PolygonWithHoles,
};
use crate::error::{Error, Result};
use crate::furniture::staircase_footprint;
use nalgebra::Point2;
use plan3d_core::{Home, MeshBuffer, Room, TextureRef};
use tracing::debug;

/// Two elevations closer than this are the same
const SAME_ELEVATION: f64 = 1e-3;

/// Upper bound of grid tiles used to subdivide one surface
const MAX_SUBDIVISION_TILES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomPart {
    Floor,
    Ceiling,
}

impl RoomPart {
    fn is_visible(self, room: &Room) -> bool {
        match self {
            RoomPart::Floor => room.floor_visible,
            RoomPart::Ceiling => room.ceiling_visible,
        }
    }

    fn texture(self, room: &Room) -> Option<&TextureRef> {
        match self {
            RoomPart::Floor => room.floor_texture.as_ref(),
            RoomPart::Ceiling => room.ceiling_texture.as_ref(),
        }
    }
}

/// Meshes of one room, each absent when it has no geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomGeometry {
    pub floor: Option<MeshBuffer>,
    pub ceiling: Option<MeshBuffer>,
    /// Vertical band along the floor outline showing the floor thickness
    pub border: Option<MeshBuffer>,
    /// Underside of the floor
    pub floor_bottom: Option<MeshBuffer>,
}

impl RoomGeometry {
    pub fn is_empty(&self) -> bool {
        self.floor.is_none()
            && self.ceiling.is_none()
            && self.border.is_none()
            && self.floor_bottom.is_none()
    }
}

/// Build the floor, ceiling, border and floor bottom of the room at `room_index`
pub fn generate_room(
    home: &Home,
    room_index: usize,
    config: &GeometryConfig,
) -> Result<RoomGeometry> {
    let room = home
        .rooms
        .get(room_index)
        .ok_or(Error::UnknownIndex {
            kind: "room",
            index: room_index,
        })?;
    if let Some(level) = room.level {
        if home.level(Some(level)).is_none() {
            return Err(plan3d_core::Error::UnknownLevel(level.0).into());
        }
    }
    if !room.is_drawable() || !home.is_viewable(room.level) {
        return Ok(RoomGeometry::default());
    }

    let generator = RoomGenerator {
        home,
        room,
        room_index,
        config,
        floor_elevation: home.level_elevation(room.level),
    };

    let (floor_area, floor_cut) = generator.visible_area(RoomPart::Floor);
    let floor = room
        .floor_visible
        .then(|| generator.surface(RoomPart::Floor, &floor_area, floor_cut))
        .flatten();
    let ceiling = room
        .ceiling_visible
        .then(|| {
            let (area, cut) = generator.visible_area(RoomPart::Ceiling);
            generator.surface(RoomPart::Ceiling, &area, cut)
        })
        .flatten();

    let mut geometry = RoomGeometry {
        floor,
        ceiling,
        ..RoomGeometry::default()
    };
    let thickness = home.floor_thickness(room.level);
    if room.floor_visible
        && thickness > 0.0
        && generator.floor_elevation > home.lowest_elevation() + SAME_ELEVATION
    {
        geometry.border = generator.border(&floor_area, thickness);
        geometry.floor_bottom = generator.floor_bottom(&floor_area, thickness);
    }

    debug!(
        room = room_index,
        name = %room.name,
        floor = geometry.floor.as_ref().map_or(0, MeshBuffer::triangle_count),
        ceiling = geometry.ceiling.as_ref().map_or(0, MeshBuffer::triangle_count),
        "generated room"
    );
    Ok(geometry)
}

struct RoomGenerator<'a> {
    home: &'a Home,
    room: &'a Room,
    room_index: usize,
    config: &'a GeometryConfig,
    floor_elevation: f64,
}

impl RoomGenerator<'_> {
    /// Elevation a room part is drawn at, ignoring wall heights
    fn default_elevation(&self, part: RoomPart) -> f64 {
        match part {
            RoomPart::Floor => self.floor_elevation,
            RoomPart::Ceiling => self.floor_elevation + self.home.level_height(self.room.level),
        }
    }

    /// Room polygon minus later rooms and staircases hiding this part, and whether
    /// anything was cut
    fn visible_area(&self, part: RoomPart) -> (PlanarArea, bool) {
        let room_area = PlanarArea::from_polygon(&self.room.points);
        let bounds = room_area.bounds();
        let elevation = self.default_elevation(part);

        let mut hidden: Vec<PlanarArea> = self.home.rooms[self.room_index + 1..]
            .iter()
            .filter(|other| {
                other.is_drawable()
                    && part.is_visible(other)
                    && self.home.same_elevation(other.level, self.room.level)
            })
            .map(|other| PlanarArea::from_polygon(&other.points))
            .filter(|other| {
                other.bounds().overlaps(&bounds) && !other.intersect(&room_area).is_empty()
            })
            .collect();

        hidden.extend(
            self.home
                .furniture
                .iter()
                .filter(|piece| piece.visible && piece.is_staircase())
                .filter(|piece| {
                    let bottom = self.home.piece_ground_elevation(piece);
                    bottom < elevation && elevation <= bottom + piece.height
                })
                .filter_map(|piece| staircase_footprint(self.home, piece, self.config))
                .filter(|cut| cut.bounds().overlaps(&bounds)),
        );

        if hidden.is_empty() {
            return (room_area, false);
        }
        (room_area.subtract(&PlanarArea::union_all(&hidden)), true)
    }

    /// Ceiling elevation above `p`: the height of the nearest wall footprint corner on
    /// the room level
    ///
    /// Corners 0 and 3 of a footprint sit at the wall start, the others take the end
    /// height.
    fn ceiling_elevation_at(&self, p: &Point2<f64>) -> f64 {
        let mut nearest: Option<(f64, f64)> = None;
        for wall in self.home.walls.iter().filter(|w| w.level == self.room.level) {
            let start_height = wall.height_at_start_or(self.home.wall_height);
            let end_height = wall.height_at_end_or(self.home.wall_height);
            for (i, corner) in wall.points(self.config.wall_flatness).iter().enumerate() {
                let height = if i == 0 || i == 3 { start_height } else { end_height };
                let distance_sq = (corner - p).norm_squared();
                // Strict comparison: the first wall found keeps ties
                if nearest.map_or(true, |(best, _)| distance_sq < best) {
                    nearest = Some((distance_sq, height));
                }
            }
        }
        match nearest {
            Some((_, height)) => self.floor_elevation + height,
            None => self.default_elevation(RoomPart::Ceiling),
        }
    }

    fn elevation_at(&self, part: RoomPart, p: &Point2<f64>) -> f64 {
        match part {
            RoomPart::Floor => self.floor_elevation,
            RoomPart::Ceiling => self.ceiling_elevation_at(p),
        }
    }

    /// Floor or ceiling mesh over `area`
    fn surface(&self, part: RoomPart, area: &PlanarArea, cut: bool) -> Option<MeshBuffer> {
        if area.is_empty() {
            return None;
        }
        // Floors face up, so their loops run clockwise
        let reversed = part == RoomPart::Floor;
        let polygons = if !cut && self.room.is_singular() {
            let points = clean_loop(&self.room.points)?;
            let outer = if reversed {
                ensure_cw(&points)
            } else {
                ensure_ccw(&points)
            };
            vec![PolygonWithHoles::new(outer)]
        } else {
            extract_polygons(area, reversed)
        };

        let elevation = |p: &Point2<f64>| self.elevation_at(part, p);
        let polygons = self.subdivide(polygons, &elevation, reversed);

        let texture = part.texture(self.room);
        let texture_fn = texture.map(|texture| {
            move |p: &Point2<f64>, _: f64| {
                let v = texture.v(p.y) as f64;
                match part {
                    RoomPart::Floor => [texture.u(p.x) as f64, -v],
                    RoomPart::Ceiling => [texture.u(p.x) as f64, v],
                }
            }
        });
        let texture_fn: Option<TextureFn<'_>> = texture_fn.as_ref().map(|f| f as TextureFn<'_>);

        let mut builder = MeshGeometryBuilder::new(0.0);
        for polygon in &polygons {
            builder.add_polygon(polygon, &elevation, texture_fn);
        }
        let mesh = builder.build();
        (!mesh.is_empty()).then_some(mesh)
    }

    /// Retile flat surfaces into a grid so that lights shade them finely
    fn subdivide(
        &self,
        polygons: Vec<PolygonWithHoles>,
        elevation: &dyn Fn(&Point2<f64>) -> f64,
        reversed: bool,
    ) -> Vec<PolygonWithHoles> {
        let size = self.config.room_subdivision;
        if size <= 0.0 || polygons.is_empty() {
            return polygons;
        }
        let flat = {
            let mut points = polygons.iter().flat_map(|p| p.loops()).flatten();
            match points.next().map(|p| elevation(p)) {
                None => false,
                Some(reference) => {
                    !points.any(|p| (elevation(p) - reference).abs() > f64::EPSILON)
                }
            }
        };
        if !flat {
            return polygons;
        }

        let area = PlanarArea::from_polygons(polygons.iter().map(|p| p.outer.as_slice()));
        let holes = PlanarArea::from_polygons(
            polygons
                .iter()
                .flat_map(|p| p.holes.iter())
                .map(Vec::as_slice),
        );
        let area = area.subtract(&holes);
        let bounds = area.bounds();
        let x0 = (bounds.min.x / size).floor() * size;
        let y0 = (bounds.min.y / size).floor() * size;
        let columns = ((bounds.max.x - x0) / size).ceil().max(1.0) as usize;
        let rows = ((bounds.max.y - y0) / size).ceil().max(1.0) as usize;
        if columns.saturating_mul(rows) > MAX_SUBDIVISION_TILES {
            debug!(columns, rows, "too many tiles, keeping surface whole");
            return polygons;
        }

        let mut tiles = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let min = Point2::new(x0 + column as f64 * size, y0 + row as f64 * size);
                let tile = Rect::new(min, Point2::new(min.x + size, min.y + size));
                let piece = area.intersect(&PlanarArea::rectangle(&tile));
                tiles.extend(extract_polygons(&piece, reversed));
            }
        }
        tiles
    }

    /// Vertical band between the floor and the floor bottom, facing out of the room
    fn border(&self, floor_area: &PlanarArea, thickness: f64) -> Option<MeshBuffer> {
        let top = self.floor_elevation;
        let bottom = top - thickness;
        let mut builder = MeshGeometryBuilder::new(0.0);
        for contour in extract_contours(floor_area, true) {
            builder.add_vertical_loop(&contour, |_| bottom, |_| top, None);
        }
        let mesh = builder.build();
        (!mesh.is_empty()).then_some(mesh)
    }

    /// Downward surface under the floor, except where a lower room ceiling meets it
    fn floor_bottom(&self, floor_area: &PlanarArea, thickness: f64) -> Option<MeshBuffer> {
        let elevation = self.floor_elevation - thickness;
        let ceilings: Vec<PlanarArea> = self
            .home
            .rooms
            .iter()
            .enumerate()
            .filter(|(i, other)| {
                *i != self.room_index
                    && other.ceiling_visible
                    && other.is_drawable()
                    && self.home.is_viewable(other.level)
                    && (self.home.level_elevation(other.level)
                        + self.home.level_height(other.level)
                        - elevation)
                        .abs()
                        < SAME_ELEVATION
            })
            .map(|(_, other)| PlanarArea::from_polygon(&other.points))
            .collect();
        let area = if ceilings.is_empty() {
            floor_area.clone()
        } else {
            floor_area.subtract(&PlanarArea::union_all(&ceilings))
        };

        let mut builder = MeshGeometryBuilder::new(0.0);
        for polygon in extract_polygons(&area, false) {
            builder.add_polygon(&polygon, |_| elevation, None);
        }
        let mesh = builder.build();
        (!mesh.is_empty()).then_some(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use plan3d_core::{Level, Piece, PieceKind, Wall};

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    fn normals_y(mesh: &MeshBuffer) -> Vec<f32> {
        (0..mesh.vertex_count()).map(|i| mesh.normal(i).unwrap().y).collect()
    }

    fn mesh_area(mesh: &MeshBuffer) -> f64 {
        mesh.indices()
            .unwrap()
            .chunks(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| mesh.position(i as usize));
                ((b - a).cross(&(c - a))).norm() as f64 / 2.0
            })
            .sum()
    }

    #[test]
    fn test_floor_faces_up_and_ceiling_down() {
        let mut home = Home::new();
        home.rooms.push(Room::new("kitchen", square(0.0, 0.0, 400.0)));
        let geometry = generate_room(&home, 0, &GeometryConfig::default()).unwrap();
        let floor = geometry.floor.unwrap();
        let ceiling = geometry.ceiling.unwrap();
        assert!(normals_y(&floor).iter().all(|&y| y > 0.99));
        assert!(normals_y(&ceiling).iter().all(|&y| y < -0.99));
        assert_relative_eq!(ceiling.position(0).y, 250.0);
        assert!(geometry.border.is_none());
        assert!(geometry.floor_bottom.is_none());
    }

    #[test]
    fn test_clockwise_room_gets_the_same_faces() {
        let mut home = Home::new();
        let points: Vec<_> = square(0.0, 0.0, 400.0).into_iter().rev().collect();
        home.rooms.push(Room::new("hall", points));
        let geometry = generate_room(&home, 0, &GeometryConfig::default()).unwrap();
        assert!(normals_y(&geometry.floor.unwrap()).iter().all(|&y| y > 0.99));
        assert!(normals_y(&geometry.ceiling.unwrap()).iter().all(|&y| y < -0.99));
    }

    #[test]
    fn test_later_room_hides_overlap() {
        let mut home = Home::new();
        home.rooms.push(Room::new("living", square(0.0, 0.0, 10.0)));
        home.rooms.push(Room::new("rug", square(5.0, 0.0, 10.0)));
        let config = GeometryConfig::default();
        let first = generate_room(&home, 0, &config).unwrap();
        assert_relative_eq!(mesh_area(&first.floor.unwrap()), 50.0, epsilon = 1e-3);
        let second = generate_room(&home, 1, &config).unwrap();
        assert_relative_eq!(mesh_area(&second.floor.unwrap()), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_staircase_cuts_upper_floor_only() {
        let mut home = Home::new();
        let ground = home.add_level(Level::new("ground", 0.0, 12.0, 250.0));
        let upper = home.add_level(Level::new("upper", 262.0, 12.0, 250.0));
        home.rooms.push(Room::new("below", square(0.0, 0.0, 10.0)).at_level(ground));
        home.rooms.push(Room::new("above", square(0.0, 0.0, 10.0)).at_level(upper));
        home.furniture.push(
            Piece::new("stairs", 2.0, 5.0, 4.0, 10.0, 262.0)
                .with_kind(PieceKind::Staircase { cut_out: None })
                .at_level(ground),
        );
        let config = GeometryConfig::default();
        let below = generate_room(&home, 0, &config).unwrap();
        assert_relative_eq!(mesh_area(below.floor.as_ref().unwrap()), 100.0, epsilon = 1e-3);
        assert_relative_eq!(mesh_area(below.ceiling.as_ref().unwrap()), 60.0, epsilon = 1e-3);
        let above = generate_room(&home, 1, &config).unwrap();
        assert_relative_eq!(mesh_area(above.floor.as_ref().unwrap()), 60.0, epsilon = 1e-3);
        assert!(above.border.is_some());
        // The lower ceiling meets the underside of the upper floor everywhere
        assert!(above.floor_bottom.is_none());
    }

    #[test]
    fn test_floor_bottom_skips_lower_ceiling() {
        let mut home = Home::new();
        let ground = home.add_level(Level::new("ground", 0.0, 10.0, 250.0));
        let upper = home.add_level(Level::new("upper", 260.0, 10.0, 250.0));
        home.rooms.push(Room::new("below", square(0.0, 0.0, 4.0)).at_level(ground));
        home.rooms.push(Room::new("above", square(0.0, 0.0, 10.0)).at_level(upper));
        let above = generate_room(&home, 1, &GeometryConfig::default()).unwrap();
        let bottom = above.floor_bottom.unwrap();
        assert_relative_eq!(mesh_area(&bottom), 84.0, epsilon = 1e-3);
        assert!(normals_y(&bottom).iter().all(|&y| y < -0.99));
        for i in 0..bottom.vertex_count() {
            assert_relative_eq!(bottom.position(i).y, 250.0);
        }

        let border = above.border.unwrap();
        let (min, max) = border.bounds();
        assert_relative_eq!(min.y, 250.0);
        assert_relative_eq!(max.y, 260.0);
    }

    #[test]
    fn test_ceiling_follows_nearest_wall() {
        let mut home = Home::new();
        home.rooms.push(Room::new("attic", square(0.0, 0.0, 10.0)));
        home.walls.push(
            Wall::new(0.0, 0.0, 10.0, 0.0, 0.2)
                .with_height(200.0)
                .with_height_at_end(300.0),
        );
        let geometry = generate_room(&home, 0, &GeometryConfig::default()).unwrap();
        let ceiling = geometry.ceiling.unwrap();
        let at = |x: f32, z: f32| {
            (0..ceiling.vertex_count())
                .map(|i| ceiling.position(i))
                .find(|p| p.x == x && p.z == z)
                .map(|p| p.y)
        };
        assert_eq!(at(0.0, 0.0), Some(200.0));
        assert_eq!(at(10.0, 0.0), Some(300.0));
        // (0, 10) is nearer to the wall start, (10, 10) to its end
        assert_eq!(at(0.0, 10.0), Some(200.0));
        assert_eq!(at(10.0, 10.0), Some(300.0));
    }

    #[test]
    fn test_subdivision_keeps_silhouette() {
        let mut home = Home::new();
        home.rooms.push(Room::new("studio", square(0.0, 0.0, 10.0)));
        let config = GeometryConfig {
            room_subdivision: 2.5,
            ..GeometryConfig::default()
        };
        let floor = generate_room(&home, 0, &config).unwrap().floor.unwrap();
        assert_eq!(floor.triangle_count(), 32);
        assert_relative_eq!(mesh_area(&floor), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_ceiling_uses_wall_footprint_corners() {
        let mut home = Home::new();
        home.rooms.push(Room::new("nook", square(-2.0, 34.0, 4.0)));
        // Thick wall whose left face corner (0, 30) is near the room, its centerline
        // start (0, 0) far from it
        home.walls.push(Wall::new(0.0, 0.0, 100.0, 0.0, 60.0).with_height(200.0));
        // Thin wall whose start (0, 60) is nearer than (0, 0) but farther than (0, 30)
        home.walls.push(Wall::new(0.0, 60.0, 0.0, 160.0, 2.0).with_height(300.0));

        let ceiling = generate_room(&home, 0, &GeometryConfig::default())
            .unwrap()
            .ceiling
            .unwrap();
        for i in 0..ceiling.vertex_count() {
            assert_relative_eq!(ceiling.position(i).y, 200.0);
        }
    }

    #[test]
    fn test_trapezoidal_wall_end_corners_take_end_height() {
        let mut home = Home::new();
        home.rooms.push(Room::new("alcove", square(98.0, 12.0, 4.0)));
        home.walls.push(
            Wall::new(0.0, 0.0, 100.0, 0.0, 20.0)
                .with_height(200.0)
                .with_height_at_end(260.0),
        );
        let ceiling = generate_room(&home, 0, &GeometryConfig::default())
            .unwrap()
            .ceiling
            .unwrap();
        // Every room corner is nearest to the left face end (100, 10)
        for i in 0..ceiling.vertex_count() {
            assert_relative_eq!(ceiling.position(i).y, 260.0);
        }
    }

    #[test]
    fn test_textured_floor_flips_v() {
        let mut home = Home::new();
        let mut room = Room::new("den", square(0.0, 0.0, 10.0));
        room.floor_texture = Some(TextureRef::new("parquet", 5.0, 5.0));
        room.ceiling_texture = Some(TextureRef::new("plaster", 5.0, 5.0));
        home.rooms.push(room);
        let geometry = generate_room(&home, 0, &GeometryConfig::default()).unwrap();
        let floor = geometry.floor.unwrap();
        let ceiling = geometry.ceiling.unwrap();
        let v_at = |mesh: &MeshBuffer, z: f32| {
            (0..mesh.vertex_count())
                .find(|&i| mesh.position(i).z == z)
                .and_then(|i| mesh.tex_coord(i))
                .map(|uv| uv[1])
        };
        let u_at = |mesh: &MeshBuffer, x: f32| {
            (0..mesh.vertex_count())
                .find(|&i| mesh.position(i).x == x)
                .and_then(|i| mesh.tex_coord(i))
                .map(|uv| uv[0])
        };
        assert_eq!(v_at(&floor, 10.0), Some(-2.0));
        assert_eq!(v_at(&ceiling, 10.0), Some(2.0));
        assert_eq!(u_at(&floor, 10.0), Some(2.0));
        assert_eq!(u_at(&ceiling, 10.0), Some(2.0));
    }

    #[test]
    fn test_missing_room_is_an_error() {
        assert!(matches!(
            generate_room(&Home::new(), 0, &GeometryConfig::default()),
            Err(Error::UnknownIndex { kind: "room", index: 0 })
        ));
    }
}
