// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall meshes
//!
//! Each side of a wall is the half of its footprint between one face and the
//! centerline. Doors and windows are subtracted from that half to get the full height
//! body, and every opening region gets the panels left below, between and above the
//! openings stacked on it.

use crate::area::PlanarArea;
use crate::builder::MeshGeometryBuilder;
use crate::config::GeometryConfig;
use crate::contour::{extract_contours, extract_polygons};
use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector2};
use plan3d_core::{Home, MeshBuffer, Piece, TextureRef, Wall, WallSide};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;
use tracing::debug;

/// Relative tolerance used to decide whether a point lies on a wall face
const FACE_TOLERANCE: f64 = 1e-3;

/// Piece indices of the openings stacked over one region
pub type OpeningStack = SmallVec<[usize; 4]>;

/// A door or window footprint with its vertical span
#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    /// Index of the piece in the home furniture
    pub index: usize,
    pub outline: Vec<Point2<f64>>,
    /// Absolute elevation of the bottom
    pub bottom: f64,
    /// Absolute elevation of the top
    pub top: f64,
}

impl Opening {
    pub fn new(index: usize, outline: Vec<Point2<f64>>, bottom: f64, top: f64) -> Self {
        Self {
            index,
            outline,
            bottom,
            top,
        }
    }

    /// Opening cut by a door or window piece
    pub fn from_piece(home: &Home, index: usize, piece: &Piece) -> Self {
        let bottom = home.piece_ground_elevation(piece);
        Self::new(index, piece.points().to_vec(), bottom, bottom + piece.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WallPartKind {
    /// Full height wall away from any opening
    Body,
    BelowOpening,
    BetweenOpenings,
    AboveOpening,
}

/// One panel of a wall side
#[derive(Debug, Clone, PartialEq)]
pub struct WallPart {
    pub kind: WallPartKind,
    /// Plan region covered by the panel
    pub footprint: PlanarArea,
    /// Lowest elevation of the panel
    pub bottom: f64,
    /// Highest elevation of the panel
    pub top: f64,
    /// Openings around the panel, sorted by bottom elevation
    pub openings: OpeningStack,
    pub mesh: MeshBuffer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallSideGeometry {
    pub side: WallSide,
    pub parts: Vec<WallPart>,
}

impl WallSideGeometry {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All parts merged in one buffer
    pub fn merged_mesh(&self) -> MeshBuffer {
        let mut mesh = MeshBuffer::new();
        for part in &self.parts {
            mesh.merge(&part.mesh);
        }
        mesh
    }
}

/// Build both sides of the wall at `wall_index`, left first
pub fn generate_wall(
    home: &Home,
    wall_index: usize,
    config: &GeometryConfig,
) -> Result<Vec<WallSideGeometry>> {
    let wall = home
        .walls
        .get(wall_index)
        .ok_or(Error::UnknownIndex {
            kind: "wall",
            index: wall_index,
        })?;
    if let Some(level) = wall.level {
        if home.level(Some(level)).is_none() {
            return Err(plan3d_core::Error::UnknownLevel(level.0).into());
        }
    }
    if !home.is_viewable(wall.level) {
        return Ok(Vec::new());
    }

    let elevation = home.level_elevation(wall.level);
    let openings: Vec<Opening> = home
        .furniture
        .iter()
        .enumerate()
        .filter(|(_, piece)| piece.visible && piece.is_door_or_window())
        .map(|(index, piece)| Opening::from_piece(home, index, piece))
        .collect();

    debug!(
        wall = wall_index,
        openings = openings.len(),
        arced = wall.effective_arc_extent().is_some(),
        "generating wall"
    );

    Ok([WallSide::Left, WallSide::Right]
        .into_iter()
        .map(|side| generate_wall_side(wall, side, elevation, home.wall_height, &openings, config))
        .collect())
}

/// Build one side of `wall` standing at `elevation`
///
/// `default_height` applies when the wall has no height of its own. Openings that do
/// not overlap the wall vertically are ignored before any area operation.
pub fn generate_wall_side(
    wall: &Wall,
    side: WallSide,
    elevation: f64,
    default_height: f64,
    openings: &[Opening],
    config: &GeometryConfig,
) -> WallSideGeometry {
    let shape = WallShape::new(wall, side, elevation, default_height, config);
    let mut parts = Vec::new();

    let footprint = PlanarArea::from_polygon(&wall.side_points(side, config.wall_flatness));
    if footprint.is_empty() || shape.max_top <= elevation {
        return WallSideGeometry { side, parts };
    }

    let mut body = footprint.clone();
    let mut cut: Vec<(usize, PlanarArea)> = Vec::new();
    for opening in openings {
        if opening.top <= elevation || opening.bottom >= shape.max_top {
            continue;
        }
        let area = PlanarArea::from_polygon(&opening.outline).intersect(&footprint);
        if area.is_empty() {
            continue;
        }
        body = body.subtract(&area);
        cut.push((opening.index, area));
    }

    shape.push_part(
        &mut parts,
        WallPartKind::Body,
        &body,
        &|_| elevation,
        &|p| shape.top_at(p),
        smallvec![],
    );

    for (mut stack, region) in split_overlapping_openings(cut) {
        let span = |index: usize| {
            openings
                .iter()
                .find(|o| o.index == index)
                .map_or((elevation, elevation), |o| (o.bottom, o.top))
        };
        stack.sort_by(|&a, &b| {
            span(a)
                .0
                .partial_cmp(&span(b).0)
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        let min_top = region_min(&region, |p| shape.top_at(p));

        let (first_bottom, first_top) = span(stack[0]);
        if first_bottom > elevation {
            shape.push_part(
                &mut parts,
                WallPartKind::BelowOpening,
                &region,
                &|_| elevation,
                &|p| first_bottom.min(shape.top_at(p)),
                stack.clone(),
            );
        }

        let mut covered_top = first_top;
        for &index in &stack[1..] {
            let (bottom, top) = span(index);
            if bottom > covered_top && covered_top < min_top {
                let panel_bottom = covered_top;
                shape.push_part(
                    &mut parts,
                    WallPartKind::BetweenOpenings,
                    &region,
                    &|_| panel_bottom,
                    &|p| bottom.min(shape.top_at(p)),
                    stack.clone(),
                );
            }
            covered_top = covered_top.max(top);
        }

        if covered_top < min_top {
            shape.push_part(
                &mut parts,
                WallPartKind::AboveOpening,
                &region,
                &|_| covered_top,
                &|p| shape.top_at(p),
                stack,
            );
        }
    }

    WallSideGeometry { side, parts }
}

/// Split opening regions so that each overlap becomes its own region
///
/// Every returned region carries the indices of all the openings covering it.
pub fn split_overlapping_openings(
    openings: Vec<(usize, PlanarArea)>,
) -> Vec<(OpeningStack, PlanarArea)> {
    let mut groups: Vec<(OpeningStack, PlanarArea)> = Vec::new();
    for (index, area) in openings {
        let mut remaining = area;
        let mut next = Vec::with_capacity(groups.len() + 2);
        for (stack, region) in groups {
            if remaining.is_empty() {
                next.push((stack, region));
                continue;
            }
            let shared = region.intersect(&remaining);
            if shared.is_empty() {
                next.push((stack, region));
                continue;
            }
            let rest = region.subtract(&remaining);
            remaining = remaining.subtract(&region);
            if !rest.is_empty() {
                next.push((stack.clone(), rest));
            }
            let mut shared_stack = stack;
            shared_stack.push(index);
            next.push((shared_stack, shared));
        }
        if !remaining.is_empty() {
            next.push((smallvec![index], remaining));
        }
        groups = next;
    }
    groups
}

/// Smallest value of `f` over the vertices of `region`
fn region_min(region: &PlanarArea, f: impl Fn(&Point2<f64>) -> f64) -> f64 {
    region
        .shapes()
        .iter()
        .flat_map(|s| s.outer.iter())
        .map(f)
        .fold(f64::INFINITY, f64::min)
}

fn region_max(region: &PlanarArea, f: impl Fn(&Point2<f64>) -> f64) -> f64 {
    region
        .shapes()
        .iter()
        .flat_map(|s| s.outer.iter())
        .map(f)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Circle followed by an arced wall
#[derive(Debug, Clone, Copy)]
struct WallArc {
    center: Point2<f64>,
    start_angle: f64,
    extent: f64,
    inner_radius: f64,
    outer_radius: f64,
}

/// What a side needs to know about its wall to lay out panels
struct WallShape<'a> {
    start: Point2<f64>,
    direction: Vector2<f64>,
    half_thickness: f64,
    arc: Option<WallArc>,
    /// Top line `alpha * x' + beta` where `x'` is the projection on the wall yaw axis
    alpha: f64,
    beta: f64,
    yaw_axis: Vector2<f64>,
    max_top: f64,
    texture: Option<&'a TextureRef>,
    crease_angle: f64,
}

impl<'a> WallShape<'a> {
    fn new(
        wall: &'a Wall,
        side: WallSide,
        elevation: f64,
        default_height: f64,
        config: &GeometryConfig,
    ) -> Self {
        let start = wall.start();
        let end = wall.end();
        let length = wall.length();
        let direction = if length > 0.0 {
            (end - start) / length
        } else {
            Vector2::x()
        };
        let (sin, cos) = wall.yaw().sin_cos();
        let yaw_axis = Vector2::new(cos, sin);

        let top_start = elevation + wall.height_at_start_or(default_height);
        let top_end = elevation + wall.height_at_end_or(default_height);
        let x_start = yaw_axis.dot(&start.coords);
        let x_end = yaw_axis.dot(&end.coords);
        let (alpha, beta) = if wall.is_trapezoidal() && (x_end - x_start).abs() > f64::EPSILON {
            let alpha = (top_end - top_start) / (x_end - x_start);
            (alpha, top_start - alpha * x_start)
        } else {
            (0.0, top_start)
        };

        let half_thickness = wall.thickness / 2.0;
        let arc = match (wall.effective_arc_extent(), wall.arc_center()) {
            (Some(extent), Some(center)) => {
                let radius = (start - center).norm();
                Some(WallArc {
                    center,
                    start_angle: (start.y - center.y).atan2(start.x - center.x),
                    extent,
                    inner_radius: radius - half_thickness,
                    outer_radius: radius + half_thickness,
                })
            }
            _ => None,
        };

        Self {
            start,
            direction,
            half_thickness,
            arc,
            alpha,
            beta,
            yaw_axis,
            max_top: top_start.max(top_end),
            texture: wall.finish(side).texture.as_ref(),
            crease_angle: if arc.is_some() {
                config.smooth_crease_angle
            } else {
                0.0
            },
        }
    }

    fn top_at(&self, p: &Point2<f64>) -> f64 {
        self.alpha * self.yaw_axis.dot(&p.coords) + self.beta
    }

    /// True when `p` lies on the left or right face of the wall
    fn is_on_face(&self, p: &Point2<f64>) -> bool {
        match &self.arc {
            Some(arc) => {
                let distance_sq = (p - arc.center).norm_squared();
                [arc.inner_radius, arc.outer_radius].iter().any(|r| {
                    let r_sq = r * r;
                    (distance_sq - r_sq).abs() < r_sq * FACE_TOLERANCE
                })
            }
            None => {
                let offset = p - self.start;
                let cross = self.direction.x * offset.y - self.direction.y * offset.x;
                let half_sq = self.half_thickness * self.half_thickness;
                (cross * cross - half_sq).abs() < half_sq * FACE_TOLERANCE
            }
        }
    }

    /// Distance from the wall start measured along the wall, arc length for arced walls
    fn distance_along(&self, p: &Point2<f64>) -> f64 {
        match &self.arc {
            Some(arc) => {
                let radial = p - arc.center;
                let angle = radial.y.atan2(radial.x);
                let mut delta = angle - arc.start_angle;
                if arc.extent > 0.0 {
                    while delta < 0.0 {
                        delta += std::f64::consts::TAU;
                    }
                } else {
                    while delta > 0.0 {
                        delta -= std::f64::consts::TAU;
                    }
                }
                delta.abs() * radial.norm()
            }
            None => self.direction.dot(&(p - self.start)),
        }
    }

    /// Mesh a panel over `region` and push it unless it has no geometry
    fn push_part(
        &self,
        parts: &mut Vec<WallPart>,
        kind: WallPartKind,
        region: &PlanarArea,
        bottom: &dyn Fn(&Point2<f64>) -> f64,
        top: &dyn Fn(&Point2<f64>) -> f64,
        openings: OpeningStack,
    ) {
        if region.is_empty() {
            return;
        }
        let mesh = self.panel_mesh(region, bottom, top);
        if mesh.is_empty() {
            return;
        }
        parts.push(WallPart {
            kind,
            footprint: region.clone(),
            bottom: region_min(region, bottom),
            top: region_max(region, top),
            openings,
            mesh,
        });
    }

    /// Vertical strips along every loop of `region` plus its bottom and top caps
    fn panel_mesh(
        &self,
        region: &PlanarArea,
        bottom: &dyn Fn(&Point2<f64>) -> f64,
        top: &dyn Fn(&Point2<f64>) -> f64,
    ) -> MeshBuffer {
        let mut builder = MeshGeometryBuilder::new(self.crease_angle);

        // Reversed loops so that the strips face out of the region
        for contour in extract_contours(region, true) {
            let n = contour.len();
            for i in 0..n {
                let p = contour[i];
                let q = contour[(i + 1) % n];
                let (pb, pt, qb, qt) = (bottom(&p), top(&p), bottom(&q), top(&q));
                let uvs = self.texture.map(|texture| {
                    let (up, uq) = if self.is_on_face(&p) && self.is_on_face(&q) {
                        (self.distance_along(&p), self.distance_along(&q))
                    } else {
                        (0.0, (q - p).norm())
                    };
                    let (up, uq) = (texture.u(up) as f64, texture.u(uq) as f64);
                    let v = |e: f64| texture.v(e) as f64;
                    [[up, v(pb)], [uq, v(qb)], [uq, v(qt)], [up, v(pt)]]
                });
                builder.add_quad(
                    [
                        Point3::new(p.x, pb, p.y),
                        Point3::new(q.x, qb, q.y),
                        Point3::new(q.x, qt, q.y),
                        Point3::new(p.x, pt, p.y),
                    ],
                    uvs,
                );
            }
        }

        let cap_texture = self
            .texture
            .map(|texture| move |p: &Point2<f64>, _: f64| [texture.u(p.x) as f64, texture.v(p.y) as f64]);
        let cap_texture = cap_texture.as_ref().map(|f| f as &dyn Fn(&Point2<f64>, f64) -> [f64; 2]);
        // Counter-clockwise loops face down, clockwise ones face up
        for polygon in extract_polygons(region, false) {
            builder.add_polygon(&polygon, bottom, cap_texture);
        }
        for polygon in extract_polygons(region, true) {
            builder.add_polygon(&polygon, top, cap_texture);
        }

        builder.build()
    }
}
