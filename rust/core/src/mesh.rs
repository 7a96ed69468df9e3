// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh buffers exchanged between generators, codecs and the scene sink

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};

/// How the vertices of a [`MeshBuffer`] are connected
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Topology {
    /// Triangle list, three indices per triangle
    Indexed(Vec<u32>),
    /// Polygon strips: each count is the number of consecutive vertices forming one polygon
    Strips(Vec<u32>),
}

/// Vertex data plus connectivity
///
/// Normals and texture coordinates are optional but, when present, parallel to positions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshBuffer {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Option<Vec<f32>>,
    /// Texture coordinates (u, v)
    pub tex_coords: Option<Vec<f32>>,
    /// Connectivity
    pub topology: Topology,
}

impl MeshBuffer {
    /// Create a new empty indexed mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            tex_coords: None,
            topology: Topology::Indexed(Vec::new()),
        }
    }

    /// Create an indexed mesh with room for `vertex_count` vertices
    pub fn with_capacity(vertex_count: usize, index_count: usize, with_tex_coords: bool) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Some(Vec::with_capacity(vertex_count * 3)),
            tex_coords: with_tex_coords.then(|| Vec::with_capacity(vertex_count * 2)),
            topology: Topology::Indexed(Vec::with_capacity(index_count)),
        }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count (polygon strips count as fans)
    pub fn triangle_count(&self) -> usize {
        match &self.topology {
            Topology::Indexed(indices) => indices.len() / 3,
            Topology::Strips(counts) => counts
                .iter()
                .map(|&c| (c as usize).saturating_sub(2))
                .sum(),
        }
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Indices of an indexed mesh, `None` for polygon strips
    pub fn indices(&self) -> Option<&[u32]> {
        match &self.topology {
            Topology::Indexed(indices) => Some(indices),
            Topology::Strips(_) => None,
        }
    }

    /// Position of vertex `i`
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f32> {
        Point3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Normal of vertex `i`, if normals are present
    #[inline]
    pub fn normal(&self, i: usize) -> Option<Vector3<f32>> {
        self.normals
            .as_ref()
            .map(|n| Vector3::new(n[i * 3], n[i * 3 + 1], n[i * 3 + 2]))
    }

    /// Texture coordinates of vertex `i`, if present
    #[inline]
    pub fn tex_coord(&self, i: usize) -> Option<[f32; 2]> {
        self.tex_coords.as_ref().map(|t| [t[i * 2], t[i * 2 + 1]])
    }

    /// Check the buffer invariants: parallel arrays and in-range connectivity
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} position floats is not a multiple of 3",
                self.positions.len()
            )));
        }
        let vertex_count = self.vertex_count();
        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count * 3 {
                return Err(Error::InvalidMesh(format!(
                    "{} normals for {} vertices",
                    normals.len() / 3,
                    vertex_count
                )));
            }
            if normals.iter().any(|n| !n.is_finite()) {
                return Err(Error::InvalidMesh("non finite normal".to_string()));
            }
        }
        if let Some(tex_coords) = &self.tex_coords {
            if tex_coords.len() != vertex_count * 2 {
                return Err(Error::InvalidMesh(format!(
                    "{} texture coordinates for {} vertices",
                    tex_coords.len() / 2,
                    vertex_count
                )));
            }
        }
        match &self.topology {
            Topology::Indexed(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(Error::InvalidMesh(format!(
                        "{} indices is not a multiple of 3",
                        indices.len()
                    )));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(Error::InvalidMesh(format!(
                        "index {} out of range for {} vertices",
                        bad, vertex_count
                    )));
                }
            }
            Topology::Strips(counts) => {
                let total: usize = counts.iter().map(|&c| c as usize).sum();
                if total != vertex_count {
                    return Err(Error::InvalidMesh(format!(
                        "strip counts sum to {} but mesh has {} vertices",
                        total, vertex_count
                    )));
                }
                if counts.iter().any(|&c| c < 3) {
                    return Err(Error::InvalidMesh(
                        "strip with fewer than 3 vertices".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Convert polygon strips to a triangle list by fanning each polygon
    ///
    /// Strips are expected to hold convex polygons, as loaders produce them.
    pub fn to_indexed(&self) -> MeshBuffer {
        match &self.topology {
            Topology::Indexed(_) => self.clone(),
            Topology::Strips(counts) => {
                let mut indices = Vec::with_capacity(self.triangle_count() * 3);
                let mut start = 0u32;
                for &count in counts {
                    for i in 1..count.saturating_sub(1) {
                        indices.push(start);
                        indices.push(start + i);
                        indices.push(start + i + 1);
                    }
                    start += count;
                }
                MeshBuffer {
                    positions: self.positions.clone(),
                    normals: self.normals.clone(),
                    tex_coords: self.tex_coords.clone(),
                    topology: Topology::Indexed(indices),
                }
            }
        }
    }

    /// Merge another mesh into this one
    ///
    /// Optional arrays survive only when both meshes carry them.
    pub fn merge(&mut self, other: &MeshBuffer) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other.to_indexed();
            return;
        }
        if let Topology::Strips(_) = self.topology {
            *self = self.to_indexed();
        }
        let other = other.to_indexed();
        let vertex_offset = self.vertex_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            _ => None,
        };
        self.tex_coords = match (self.tex_coords.take(), &other.tex_coords) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            _ => None,
        };
        if let (Topology::Indexed(indices), Topology::Indexed(other_indices)) =
            (&mut self.topology, &other.topology)
        {
            indices.extend(other_indices.iter().map(|&i| i + vertex_offset));
        }
    }

    /// Translate every position
    pub fn translate(&mut self, offset: Vector3<f32>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
    }

    /// Calculate bounds (min, max)
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });

        (min, max)
    }
}

impl Default for MeshBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_strip() -> MeshBuffer {
        MeshBuffer {
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0,
            ],
            normals: None,
            tex_coords: Some(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]),
            topology: Topology::Strips(vec![4]),
        }
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshBuffer::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_strips_to_indexed() {
        let mesh = quad_strip();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 2);

        let indexed = mesh.to_indexed();
        assert_eq!(indexed.indices(), Some(&[0, 1, 2, 0, 2, 3][..]));
        assert_eq!(indexed.tex_coords, mesh.tex_coords);
    }

    #[test]
    fn test_validate_rejects_mismatched_arrays() {
        let mut mesh = quad_strip();
        mesh.tex_coords = Some(vec![0.0, 0.0]);
        assert!(mesh.validate().is_err());

        let mut mesh = quad_strip();
        mesh.topology = Topology::Strips(vec![3]);
        assert!(mesh.validate().is_err());

        let mut mesh = quad_strip().to_indexed();
        mesh.topology = Topology::Indexed(vec![0, 1, 7]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = quad_strip().to_indexed();
        mesh.merge(&quad_strip());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices().unwrap()[6..9], &[4, 5, 6]);
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.tex_coords.as_ref().map(Vec::len), Some(16));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_bounds_and_translate() {
        let mut mesh = quad_strip();
        mesh.translate(Vector3::new(1.0, 2.0, 3.0));
        let (min, max) = mesh.bounds();
        assert_eq!(min, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(max, Point3::new(2.0, 2.0, 4.0));
    }
}
