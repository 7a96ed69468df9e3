// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerances and tessellation settings shared by the mesh generators.

use std::str::FromStr;

/// Geometry generation settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryConfig {
    /// Curve flattening tolerance for rooms, ground and furniture outlines.
    pub flatness: f64,
    /// Curve flattening tolerance for arced walls.
    pub wall_flatness: f64,
    /// Curve flattening tolerance for stroked polylines.
    pub polyline_flatness: f64,
    /// Size of the shading grid laid over flat room surfaces, 0 disables it.
    pub room_subdivision: f64,
    /// Vertex count above which furniture footprints fall back to a convex hull.
    pub hull_vertex_threshold: usize,
    /// Crease angle in radians used for curved surfaces.
    pub smooth_crease_angle: f64,
    /// Distance kept between carved ground features and the ground border.
    pub ground_margin: f64,
    /// Half size of the ground square when nothing is carved and no tile is requested.
    pub default_ground_half_size: f64,
}

impl GeometryConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            flatness: env_or("PLAN3D_FLATNESS", defaults.flatness),
            wall_flatness: env_or("PLAN3D_WALL_FLATNESS", defaults.wall_flatness),
            polyline_flatness: env_or("PLAN3D_POLYLINE_FLATNESS", defaults.polyline_flatness),
            room_subdivision: env_or("PLAN3D_ROOM_SUBDIVISION", defaults.room_subdivision),
            hull_vertex_threshold: env_or("PLAN3D_HULL_THRESHOLD", defaults.hull_vertex_threshold),
            smooth_crease_angle: std::env::var("PLAN3D_SMOOTH_CREASE_DEG")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .map(f64::to_radians)
                .unwrap_or(defaults.smooth_crease_angle),
            ground_margin: env_or("PLAN3D_GROUND_MARGIN", defaults.ground_margin),
            default_ground_half_size: env_or(
                "PLAN3D_GROUND_HALF_SIZE",
                defaults.default_ground_half_size,
            ),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            flatness: 1.0,
            wall_flatness: 0.1,
            polyline_flatness: 0.5,
            room_subdivision: 0.0,
            hull_vertex_threshold: 10_000,
            smooth_crease_angle: std::f64::consts::FRAC_PI_2,
            ground_margin: 5000.0,
            default_ground_half_size: 1000.0,
        }
    }
}

/// Parse an environment variable, keeping `default` when unset or invalid.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
