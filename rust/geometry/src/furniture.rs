// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Furniture placement and footprints

use crate::area::PlanarArea;
use crate::config::GeometryConfig;
use crate::hull::project_footprint;
use nalgebra::{Point3, Rotation3, Vector3};
use plan3d_core::{Home, MeshBuffer, Piece, PieceKind};
use tracing::debug;

/// Place the model of `piece` in the home
///
/// The model bounds are scaled to the piece width, height and depth, turned by the
/// piece angle around the vertical axis and moved so that their bottom center sits at
/// `(x, ground elevation, y)`. Returns `None` for pieces without a visible model.
pub fn place_model(home: &Home, piece: &Piece) -> Option<MeshBuffer> {
    let model = piece.model.as_ref()?;
    if !piece.visible || model.is_empty() || !home.is_viewable(piece.level) {
        return None;
    }

    let (min, max) = model.bounds();
    let extent = max - min;
    let scale_of = |size: f64, model_size: f32| {
        if model_size > f32::EPSILON {
            size / model_size as f64
        } else {
            1.0
        }
    };
    let scale = Vector3::new(
        scale_of(piece.width, extent.x),
        scale_of(piece.height, extent.y),
        scale_of(piece.depth, extent.z),
    );
    let anchor = Vector3::new(
        (min.x + max.x) as f64 / 2.0,
        min.y as f64,
        (min.z + max.z) as f64 / 2.0,
    );
    let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), -piece.angle);
    let translation = Vector3::new(piece.x, home.piece_ground_elevation(piece), piece.y);

    let mut placed = (**model).clone();
    for chunk in placed.positions.chunks_exact_mut(3) {
        let local = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64) - anchor;
        let p = rotation * Point3::from(local.component_mul(&scale)) + translation;
        chunk[0] = p.x as f32;
        chunk[1] = p.y as f32;
        chunk[2] = p.z as f32;
    }
    if let Some(normals) = placed.normals.as_mut() {
        // Normals follow the inverse transpose of the scale
        let inverse = scale.map(|s| if s.abs() > f64::EPSILON { 1.0 / s } else { 1.0 });
        for chunk in normals.chunks_exact_mut(3) {
            let n = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let n = (rotation * n.component_mul(&inverse))
                .try_normalize(f64::EPSILON)
                .unwrap_or(n);
            chunk[0] = n.x as f32;
            chunk[1] = n.y as f32;
            chunk[2] = n.z as f32;
        }
    }

    debug!(
        piece = %piece.name,
        vertices = placed.vertex_count(),
        triangles = placed.triangle_count(),
        "placed furniture model"
    );
    Some(placed)
}

/// Mesh of the piece at `index` in the home furniture
pub fn generate_furniture(home: &Home, index: usize) -> Option<MeshBuffer> {
    home.furniture.get(index).and_then(|piece| place_model(home, piece))
}

/// Floor area covered by a piece
///
/// Pieces with a model use the projection of the placed model, others their rotated
/// rectangle.
pub fn furniture_footprint(home: &Home, piece: &Piece, config: &GeometryConfig) -> PlanarArea {
    match place_model(home, piece) {
        Some(mesh) => {
            let footprint = project_footprint(&mesh, config.hull_vertex_threshold);
            if footprint.is_empty() {
                PlanarArea::from_polygon(&piece.points())
            } else {
                footprint
            }
        }
        None => PlanarArea::from_polygon(&piece.points()),
    }
}

/// Area a staircase cuts in the floors and ceilings it crosses, `None` for other pieces
///
/// An explicit cut out wins; otherwise a model backed staircase cuts its footprint.
pub fn staircase_footprint(
    home: &Home,
    piece: &Piece,
    config: &GeometryConfig,
) -> Option<PlanarArea> {
    match &piece.kind {
        PieceKind::Staircase { cut_out: Some(shape) } if shape.len() >= 3 => {
            piece.staircase_outline().map(|outline| PlanarArea::from_polygon(&outline))
        }
        PieceKind::Staircase { .. } => Some(furniture_footprint(home, piece, config)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use plan3d_core::{Level, Topology};
    use std::sync::Arc;

    /// Unit cube from (-1,-1,-1) to (1,1,1) as 6 quads
    fn cube() -> MeshBuffer {
        let corners = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        let faces = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [3, 7, 6, 2],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        let positions = faces
            .iter()
            .flat_map(|f| f.iter().flat_map(|&i| corners[i]))
            .collect();
        MeshBuffer {
            positions,
            normals: None,
            tex_coords: None,
            topology: Topology::Strips(vec![4; 6]),
        }
    }

    #[test]
    fn test_model_scaled_to_piece() {
        let mut home = Home::new();
        let level = home.add_level(Level::new("first", 100.0, 10.0, 250.0));
        let piece = Piece::new("box", 50.0, 20.0, 10.0, 4.0, 30.0)
            .with_elevation(5.0)
            .with_model(Arc::new(cube()))
            .at_level(level);
        let mesh = place_model(&home, &piece).unwrap();
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, 45.0, epsilon = 1e-4);
        assert_relative_eq!(max.x, 55.0, epsilon = 1e-4);
        assert_relative_eq!(min.y, 105.0, epsilon = 1e-4);
        assert_relative_eq!(max.y, 135.0, epsilon = 1e-4);
        assert_relative_eq!(min.z, 18.0, epsilon = 1e-4);
        assert_relative_eq!(max.z, 22.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_matches_plan_points() {
        let home = Home::new();
        let piece = Piece::new("box", 0.0, 0.0, 10.0, 4.0, 1.0)
            .with_angle(std::f64::consts::FRAC_PI_2)
            .with_model(Arc::new(cube()));
        let mesh = place_model(&home, &piece).unwrap();
        let (min, max) = mesh.bounds();
        // Width now runs along the plan y axis, like the piece points
        assert_relative_eq!(max.z - min.z, 10.0, epsilon = 1e-4);
        assert_relative_eq!(max.x - min.x, 4.0, epsilon = 1e-4);

        let footprint = furniture_footprint(&home, &piece, &GeometryConfig::default());
        assert_relative_eq!(footprint.area(), 40.0, epsilon = 1e-3);
        let corner = piece.points()[0];
        let inside = Point2::new(corner.x * 0.9, corner.y * 0.9);
        assert!(footprint.contains(&inside));
    }

    #[test]
    fn test_staircase_cut_out() {
        let home = Home::new();
        let stairs = Piece::new("stairs", 0.0, 0.0, 4.0, 4.0, 300.0).with_kind(PieceKind::Staircase {
            cut_out: Some(vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.5, 0.0),
                Point2::new(0.5, 1.0),
                Point2::new(0.0, 1.0),
            ]),
        });
        let area = staircase_footprint(&home, &stairs, &GeometryConfig::default()).unwrap();
        assert_relative_eq!(area.area(), 8.0, epsilon = 1e-6);
        assert!(staircase_footprint(&home, &Piece::new("chair", 0.0, 0.0, 1.0, 1.0, 1.0), &GeometryConfig::default()).is_none());
    }

    #[test]
    fn test_piece_without_model_has_no_mesh() {
        let mut home = Home::new();
        home.furniture.push(Piece::new("ghost", 0.0, 0.0, 1.0, 1.0, 1.0));
        assert!(generate_furniture(&home, 0).is_none());
        assert!(generate_furniture(&home, 3).is_none());
    }
}
