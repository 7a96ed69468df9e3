// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon loops to mesh buffers
//!
//! The builder collects triangles in world space then produces one indexed
//! [`MeshBuffer`] with crease angle normals. Plan points `(x, y)` land at
//! `(x, elevation, y)`, so a counter-clockwise plan triangle faces down and a
//! clockwise one faces up. The builder never reorients the caller's loops.

use crate::contour::{signed_area, PolygonWithHoles, MIN_AREA_THRESHOLD};
use crate::triangulation::{triangle_cross, triangle_normal, triangulate_polygon_with_holes};
use nalgebra::{Point2, Point3, Vector3};
use plan3d_core::{MeshBuffer, Topology};
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

/// Texture coordinates of a plan point at a given elevation
pub type TextureFn<'a> = &'a dyn Fn(&Point2<f64>, f64) -> [f64; 2];

/// Dot product slack when comparing face normals
const NORMAL_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Triangle {
    corners: [Point3<f64>; 3],
    uvs: Option<[[f64; 2]; 3]>,
    normal: Vector3<f64>,
    angles: [f64; 3],
}

/// Accumulates triangles and synthesizes their normals
#[derive(Debug, Clone)]
pub struct MeshGeometryBuilder {
    crease_angle: f64,
    triangles: Vec<Triangle>,
}

impl MeshGeometryBuilder {
    /// Create a builder smoothing faces that meet below `crease_angle` radians
    ///
    /// A crease angle of 0 keeps every face flat shaded.
    pub fn new(crease_angle: f64) -> Self {
        Self {
            crease_angle,
            triangles: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangulate a plan polygon and lift it with `elevation`
    ///
    /// Every emitted triangle has the orientation of the outer loop. Returns the number
    /// of triangles added; a polygon that cannot be triangulated adds none.
    pub fn add_polygon(
        &mut self,
        polygon: &PolygonWithHoles,
        elevation: impl Fn(&Point2<f64>) -> f64,
        texture: Option<TextureFn<'_>>,
    ) -> usize {
        let outer_sign = signed_area(&polygon.outer).signum();
        if outer_sign == 0.0 {
            trace!(points = polygon.outer.len(), "skipping flat polygon");
            return 0;
        }

        let indices = match triangulate_polygon_with_holes(&polygon.outer, &polygon.holes) {
            Ok(indices) => indices,
            Err(e) => {
                warn!(error = %e, points = polygon.outer.len(), "skipping polygon");
                return 0;
            }
        };

        let points: Vec<Point2<f64>> = polygon.loops().flatten().copied().collect();
        let mut added = 0;
        for t in indices.chunks_exact(3) {
            let (a, mut b, mut c) = (points[t[0]], points[t[1]], points[t[2]]);
            let cross = triangle_cross(&a, &b, &c);
            if cross.abs() <= MIN_AREA_THRESHOLD {
                continue;
            }
            if cross.signum() != outer_sign {
                std::mem::swap(&mut b, &mut c);
            }
            let plan = [a, b, c];
            let corners = plan.map(|p| Point3::new(p.x, elevation(&p), p.y));
            let uvs = texture.map(|f| {
                [
                    f(&plan[0], corners[0].y),
                    f(&plan[1], corners[1].y),
                    f(&plan[2], corners[2].y),
                ]
            });
            if self.push_triangle(corners, uvs) {
                added += 1;
            }
        }
        added
    }

    /// Add a quad `a b c d`, split along `a c`, facing by the right-hand rule
    pub fn add_quad(&mut self, corners: [Point3<f64>; 4], uvs: Option<[[f64; 2]; 4]>) -> usize {
        let [a, b, c, d] = corners;
        let mut added = 0;
        if self.push_triangle([a, b, c], uvs.map(|t| [t[0], t[1], t[2]])) {
            added += 1;
        }
        if self.push_triangle([a, c, d], uvs.map(|t| [t[0], t[2], t[3]])) {
            added += 1;
        }
        added
    }

    /// Add vertical quads along a closed loop between two elevation functions
    ///
    /// Quads along a counter-clockwise loop face its inside; reverse the loop to face
    /// out. With `texture_size`, U runs along the loop length and V follows elevation.
    pub fn add_vertical_loop(
        &mut self,
        contour: &[Point2<f64>],
        bottom: impl Fn(&Point2<f64>) -> f64,
        top: impl Fn(&Point2<f64>) -> f64,
        texture_size: Option<(f64, f64)>,
    ) -> usize {
        let n = contour.len();
        if n < 2 {
            return 0;
        }
        let mut added = 0;
        let mut along = 0.0;
        for i in 0..n {
            let p = contour[i];
            let q = contour[(i + 1) % n];
            let length = (q - p).norm();
            let (pb, pt, qb, qt) = (bottom(&p), top(&p), bottom(&q), top(&q));
            let uvs = texture_size.map(|(width, height)| {
                let u0 = along / width;
                let u1 = (along + length) / width;
                [[u0, pb / height], [u1, qb / height], [u1, qt / height], [u0, pt / height]]
            });
            added += self.add_quad(
                [
                    Point3::new(p.x, pb, p.y),
                    Point3::new(q.x, qb, q.y),
                    Point3::new(q.x, qt, q.y),
                    Point3::new(p.x, pt, p.y),
                ],
                uvs,
            );
            along += length;
        }
        added
    }

    fn push_triangle(&mut self, corners: [Point3<f64>; 3], uvs: Option<[[f64; 2]; 3]>) -> bool {
        match triangle_normal(&corners[0], &corners[1], &corners[2]) {
            Some(normal) => {
                let [a, b, c] = corners;
                let angles = [
                    (b - a).angle(&(c - a)),
                    (c - b).angle(&(a - b)),
                    (a - c).angle(&(b - c)),
                ];
                self.triangles.push(Triangle {
                    corners,
                    uvs,
                    normal,
                    angles,
                });
                true
            }
            None => false,
        }
    }

    /// Produce the indexed mesh
    ///
    /// Texture coordinates are kept only when every triangle carries them. Vertices
    /// sharing position, normal and texture coordinates are merged in first-occurrence
    /// order.
    pub fn build(self) -> MeshBuffer {
        if self.triangles.is_empty() {
            return MeshBuffer::new();
        }

        // Triangle corners sharing each exact position
        let mut faces_at: FxHashMap<[u64; 3], Vec<(usize, usize)>> = FxHashMap::default();
        for (i, triangle) in self.triangles.iter().enumerate() {
            for (k, corner) in triangle.corners.iter().enumerate() {
                faces_at.entry(position_key(corner)).or_default().push((i, k));
            }
        }

        let smooth_threshold = self.crease_angle.cos() + NORMAL_EPSILON;
        let with_uvs = self.triangles.iter().all(|t| t.uvs.is_some());
        let mut mesh = MeshBuffer::with_capacity(
            self.triangles.len() * 3,
            self.triangles.len() * 3,
            with_uvs,
        );
        let mut indices: Vec<u32> = Vec::with_capacity(self.triangles.len() * 3);
        let mut vertex_ids: FxHashMap<([u32; 3], [u32; 3], [u32; 2]), u32> = FxHashMap::default();

        for triangle in &self.triangles {
            for (k, corner) in triangle.corners.iter().enumerate() {
                let mut sum = Vector3::zeros();
                if let Some(faces) = faces_at.get(&position_key(corner)) {
                    // Angle weighted so that a face split in several triangles counts once
                    for &(f, corner_of_f) in faces {
                        let other = &self.triangles[f];
                        let dot = triangle.normal.dot(&other.normal);
                        if dot >= 1.0 - NORMAL_EPSILON || dot > smooth_threshold {
                            sum += other.normal * other.angles[corner_of_f];
                        }
                    }
                }
                let normal = sum
                    .try_normalize(f64::EPSILON)
                    .unwrap_or(triangle.normal);

                let position = [corner.x as f32, corner.y as f32, corner.z as f32];
                let normal = [normal.x as f32, normal.y as f32, normal.z as f32];
                let uv = match (with_uvs, triangle.uvs) {
                    (true, Some(uvs)) => [uvs[k][0] as f32, uvs[k][1] as f32],
                    _ => [0.0, 0.0],
                };
                let key = (bits3(position), bits3(normal), [bits(uv[0]), bits(uv[1])]);

                let next_id = vertex_ids.len() as u32;
                let id = *vertex_ids.entry(key).or_insert_with(|| {
                    mesh.positions.extend_from_slice(&position);
                    if let Some(normals) = mesh.normals.as_mut() {
                        normals.extend_from_slice(&normal);
                    }
                    if let Some(tex_coords) = mesh.tex_coords.as_mut() {
                        tex_coords.extend_from_slice(&uv);
                    }
                    next_id
                });
                indices.push(id);
            }
        }

        mesh.topology = Topology::Indexed(indices);
        mesh
    }
}

/// Triangulate `polygons` and build them in one mesh
pub fn build_polygon_mesh(
    polygons: &[PolygonWithHoles],
    elevation: impl Fn(&Point2<f64>) -> f64,
    texture: Option<TextureFn<'_>>,
    crease_angle: f64,
) -> MeshBuffer {
    let mut builder = MeshGeometryBuilder::new(crease_angle);
    for polygon in polygons {
        builder.add_polygon(polygon, &elevation, texture);
    }
    builder.build()
}

#[inline]
fn position_key(p: &Point3<f64>) -> [u64; 3] {
    // -0.0 and 0.0 are the same position
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

#[inline]
fn bits(v: f32) -> u32 {
    (v + 0.0).to_bits()
}

#[inline]
fn bits3(v: [f32; 3]) -> [u32; 3] {
    [bits(v[0]), bits(v[1]), bits(v[2])]
}
