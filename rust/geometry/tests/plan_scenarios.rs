// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End to end scenarios going from a home plan to meshes

use approx::assert_relative_eq;
use plan3d_core::{Home, Level, MeshBuffer, Piece, Room, Wall};
use plan3d_geometry::contour::signed_area;
use plan3d_geometry::hull::project_vertices;
use plan3d_geometry::{
    build_polygon_mesh, generate_ground, generate_room, generate_wall, project_and_hull,
    GeometryConfig, GroundPartKind, PlanarArea, Point2, PolygonWithHoles, WallPartKind,
};

fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
    vec![
        Point2::new(x0, y0),
        Point2::new(x0 + size, y0),
        Point2::new(x0 + size, y0 + size),
        Point2::new(x0, y0 + size),
    ]
}

/// Sum of the triangle areas projected on the floor
fn horizontal_area(mesh: &MeshBuffer) -> f64 {
    mesh.indices()
        .unwrap_or(&[])
        .chunks_exact(3)
        .map(|t| {
            let a = mesh.position(t[0] as usize);
            let b = mesh.position(t[1] as usize);
            let c = mesh.position(t[2] as usize);
            let cross = (b.x - a.x) as f64 * (c.z - a.z) as f64 - (b.z - a.z) as f64 * (c.x - a.x) as f64;
            cross.abs() / 2.0
        })
        .sum()
}

fn home_with_door() -> Home {
    let mut home = Home::new();
    home.walls.push(Wall::new(0.0, 0.5, 10.0, 0.5, 1.0).with_height(3.0));
    home.furniture.push(Piece::door_or_window("door", 5.0, 0.5, 2.0, 1.0, 2.0));
    home
}

#[test]
fn test_door_carves_wall_sides() {
    let home = home_with_door();
    let sides = generate_wall(&home, 0, &GeometryConfig::default()).unwrap();
    assert_eq!(sides.len(), 2);

    for side in &sides {
        assert!(side.parts.iter().all(|p| p.kind != WallPartKind::BelowOpening));

        let bodies: Vec<_> = side.parts.iter().filter(|p| p.kind == WallPartKind::Body).collect();
        assert_eq!(bodies.len(), 1);
        let body = bodies[0];
        assert_relative_eq!(body.bottom, 0.0);
        assert_relative_eq!(body.top, 3.0);
        let mut spans: Vec<(f64, f64)> = body
            .footprint
            .shapes()
            .iter()
            .map(|shape| {
                let xs = shape.outer.iter().map(|p| p.x);
                (
                    xs.clone().fold(f64::INFINITY, f64::min),
                    xs.fold(f64::NEG_INFINITY, f64::max),
                )
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(spans.len(), 2);
        assert_relative_eq!(spans[0].0, 0.0, epsilon = 1e-6);
        assert_relative_eq!(spans[0].1, 4.0, epsilon = 1e-6);
        assert_relative_eq!(spans[1].0, 6.0, epsilon = 1e-6);
        assert_relative_eq!(spans[1].1, 10.0, epsilon = 1e-6);

        let above: Vec<_> = side
            .parts
            .iter()
            .filter(|p| p.kind == WallPartKind::AboveOpening)
            .collect();
        assert_eq!(above.len(), 1);
        assert_relative_eq!(above[0].bottom, 2.0);
        assert_relative_eq!(above[0].top, 3.0);
        let bounds = above[0].footprint.bounds();
        assert_relative_eq!(bounds.min.x, 4.0, epsilon = 1e-6);
        assert_relative_eq!(bounds.max.x, 6.0, epsilon = 1e-6);
        assert_eq!(above[0].openings.as_slice(), &[0]);
    }
}

#[test]
fn test_basement_room_terraces_the_ground() {
    let mut home = Home::new();
    let basement = home.add_level(Level::new("basement", -3.0, 0.2, 2.8));
    home.rooms.push(Room::new("cellar", square(0.0, 0.0, 5.0)).at_level(basement));

    let ground = generate_ground(&home, None, None, &GeometryConfig::default());

    let surfaces: Vec<_> = ground.parts_of(GroundPartKind::Surface).collect();
    assert_eq!(surfaces.len(), 2);
    let top = surfaces.iter().find(|p| p.elevation == 0.0).unwrap();
    let pit = surfaces.iter().find(|p| p.elevation < 0.0).unwrap();
    assert_relative_eq!(pit.elevation, -3.0);
    assert_relative_eq!(horizontal_area(&pit.mesh), 25.0, epsilon = 1e-3);

    // The ground spans the carved bounds widened on every side, minus the pit
    let (min, max) = top.mesh.bounds();
    let extent = ((max.x - min.x) as f64) * ((max.z - min.z) as f64);
    assert_relative_eq!(horizontal_area(&top.mesh), extent - 25.0, max_relative = 1e-5);
    let indices = top.mesh.indices().unwrap_or(&[]);
    for t in indices.chunks_exact(3) {
        let (x, z) = t.iter().fold((0.0, 0.0), |(x, z), &i| {
            let p = top.mesh.position(i as usize);
            (x + p.x / 3.0, z + p.z / 3.0)
        });
        assert!(!(0.0..5.0).contains(&x) || !(0.0..5.0).contains(&z));
    }

    let cliffs: Vec<_> = ground.parts_of(GroundPartKind::Cliff).collect();
    assert_eq!(cliffs.len(), 1);
    let (min, max) = cliffs[0].mesh.bounds();
    assert_relative_eq!(min.y, -3.0, epsilon = 1e-5);
    assert_relative_eq!(max.y, 0.0, epsilon = 1e-5);
    // Four sides of two triangles each
    assert_eq!(cliffs[0].mesh.triangle_count(), 8);
    assert_eq!(ground.parts_of(GroundPartKind::Cover).count(), 0);
}

#[test]
fn test_floor_and_ceiling_face_away_from_each_other() {
    let mut home = Home::new();
    home.rooms.push(Room::new("hall", square(0.0, 0.0, 400.0)));
    let room = generate_room(&home, 0, &GeometryConfig::default()).unwrap();
    let floor = room.floor.unwrap();
    let ceiling = room.ceiling.unwrap();
    assert_eq!(floor.triangle_count(), ceiling.triangle_count());
    for i in 0..floor.vertex_count() {
        assert_relative_eq!(floor.normal(i).unwrap().y, 1.0);
    }
    for i in 0..ceiling.vertex_count() {
        assert_relative_eq!(ceiling.normal(i).unwrap().y, -1.0);
    }
}

#[test]
fn test_generation_is_repeatable() {
    let mut home = home_with_door();
    home.rooms.push(Room::new("hall", square(0.0, 1.0, 10.0)));
    let config = GeometryConfig::default();

    assert_eq!(
        generate_wall(&home, 0, &config).unwrap(),
        generate_wall(&home, 0, &config).unwrap()
    );
    assert_eq!(
        generate_room(&home, 0, &config).unwrap(),
        generate_room(&home, 0, &config).unwrap()
    );
    assert_eq!(
        generate_ground(&home, None, None, &config),
        generate_ground(&home, None, None, &config)
    );
}

#[test]
fn test_area_algebra_identities() {
    let a = PlanarArea::from_polygon(&square(0.0, 0.0, 10.0));
    let b = PlanarArea::from_polygon(&square(5.0, 5.0, 10.0));

    assert_relative_eq!(a.union(&a).area(), a.area(), epsilon = 1e-9);
    assert!(a.subtract(&a).is_empty());
    let remainder = a.union(&b).subtract(&b);
    assert_relative_eq!(remainder.subtract(&a).area(), 0.0, epsilon = 1e-9);
    assert_relative_eq!(remainder.area(), 75.0, epsilon = 1e-9);
    assert_relative_eq!(a.exclusive_or(&PlanarArea::new()).area(), 100.0, epsilon = 1e-9);
}

#[test]
fn test_hull_of_square_ignores_interior_points() {
    let mut points = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    points.extend((1..=10).map(|i| Point2::new(i as f64 / 11.0, 0.5)));
    let hull = project_and_hull(&points);
    assert_eq!(hull.len(), 5);
    assert_eq!(hull.first(), hull.last());
}

#[test]
fn test_hull_of_convex_slab_matches_its_outline() {
    let hexagon: Vec<Point2<f64>> = (0..6)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI / 3.0;
            Point2::new(10.0 * angle.cos(), 10.0 * angle.sin())
        })
        .collect();
    let slab = build_polygon_mesh(&[PolygonWithHoles::new(hexagon.clone())], |_| 0.0, None, 0.0);

    let hull = project_and_hull(&project_vertices(&slab));
    assert_eq!(hull.len(), 7);
    assert_relative_eq!(signed_area(&hull), signed_area(&hexagon), epsilon = 1e-3);
}
