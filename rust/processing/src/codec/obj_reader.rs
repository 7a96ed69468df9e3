// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ reader
//!
//! Reads vertices, normals, texture coordinates and polygonal faces, split in one
//! group per `g`/`o` statement and per `usemtl` change. Statements about curves,
//! smoothing groups or material libraries are ignored.

use super::{FormatProbe, LoadedGroup, LoadedModel, ProbeRejection};
use crate::error::{Error, Result};
use plan3d_core::{MeshBuffer, Topology};
use rustc_hash::FxHashMap;

const FORMAT: &str = "OBJ";
const DEFAULT_GROUP: &str = "default";

/// Probe for Wavefront OBJ text
pub struct ObjProbe;

impl FormatProbe for ObjProbe {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn try_load(&self, bytes: &[u8]) -> std::result::Result<LoadedModel, ProbeRejection> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProbeRejection::new(FORMAT, format!("not UTF-8 text: {}", e)))?;
        let model = parse_obj(text).map_err(|e| ProbeRejection::new(FORMAT, e.to_string()))?;
        if model.groups.is_empty() {
            return Err(ProbeRejection::new(FORMAT, "no face found"));
        }
        Ok(model)
    }
}

/// Vertex of a face: position, texture coordinate and normal indices, 0-based
type FaceVertex = (usize, Option<usize>, Option<usize>);

struct GroupBuilder {
    name: String,
    material: Option<String>,
    positions: Vec<f32>,
    normals: Vec<f32>,
    tex_coords: Vec<f32>,
    indices: Vec<u32>,
    vertices: FxHashMap<FaceVertex, u32>,
    all_normals: bool,
    all_tex_coords: bool,
}

impl GroupBuilder {
    fn new(name: String, material: Option<String>) -> Self {
        Self {
            name,
            material,
            positions: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: Vec::new(),
            vertices: FxHashMap::default(),
            all_normals: true,
            all_tex_coords: true,
        }
    }

    fn vertex(&mut self, key: FaceVertex, data: &ObjData) -> u32 {
        if let Some(&index) = self.vertices.get(&key) {
            return index;
        }
        let index = (self.positions.len() / 3) as u32;
        let (v, vt, vn) = key;
        self.positions.extend_from_slice(&data.positions[v]);
        match vn {
            Some(vn) => self.normals.extend_from_slice(&data.normals[vn]),
            None => {
                self.all_normals = false;
                self.normals.extend_from_slice(&[0.0; 3]);
            }
        }
        match vt {
            Some(vt) => self.tex_coords.extend_from_slice(&data.tex_coords[vt]),
            None => {
                self.all_tex_coords = false;
                self.tex_coords.extend_from_slice(&[0.0; 2]);
            }
        }
        self.vertices.insert(key, index);
        index
    }

    fn build(self) -> Option<LoadedGroup> {
        if self.indices.is_empty() {
            return None;
        }
        Some(LoadedGroup {
            name: self.name,
            material: self.material,
            mesh: MeshBuffer {
                positions: self.positions,
                normals: self.all_normals.then_some(self.normals),
                tex_coords: self.all_tex_coords.then_some(self.tex_coords),
                topology: Topology::Indexed(self.indices),
            },
        })
    }
}

#[derive(Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
}

/// Parse OBJ text
pub fn parse_obj(text: &str) -> Result<LoadedModel> {
    let mut data = ObjData::default();
    let mut groups = Vec::new();
    let mut current = GroupBuilder::new(DEFAULT_GROUP.to_string(), None);

    for (number, line) in text.lines().enumerate() {
        let line_number = number + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        match keyword {
            "v" => data.positions.push(parse_floats::<3>(tokens, line_number, 3)?),
            "vn" => data.normals.push(parse_floats::<3>(tokens, line_number, 3)?),
            "vt" => data.tex_coords.push(parse_floats::<2>(tokens, line_number, 1)?),
            "f" | "fo" => {
                let face = tokens
                    .map(|token| parse_face_vertex(token, &data, line_number))
                    .collect::<Result<Vec<_>>>()?;
                if face.len() < 3 {
                    return Err(Error::parse(FORMAT, line_number, "face with less than 3 vertices"));
                }
                let indices: Vec<u32> = face.into_iter().map(|key| current.vertex(key, &data)).collect();
                for i in 1..indices.len() - 1 {
                    current.indices.extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
                }
            }
            "g" | "o" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() { DEFAULT_GROUP.to_string() } else { name };
                let material = current.material.clone();
                let previous = std::mem::replace(&mut current, GroupBuilder::new(name, material));
                groups.extend(previous.build());
            }
            "usemtl" => {
                let material = tokens.collect::<Vec<_>>().join(" ");
                let material = (!material.is_empty()).then_some(material);
                if material != current.material {
                    let name = current.name.clone();
                    let previous = std::mem::replace(&mut current, GroupBuilder::new(name, material));
                    groups.extend(previous.build());
                }
            }
            _ => {}
        }
    }
    groups.extend(current.build());

    Ok(LoadedModel {
        format: FORMAT,
        groups,
    })
}

/// Parse up to `N` floats, at least `required` of them, missing ones being 0
fn parse_floats<'a, const N: usize>(
    tokens: impl Iterator<Item = &'a str>,
    line: usize,
    required: usize,
) -> Result<[f32; N]> {
    let mut values = [0.0f32; N];
    let mut count = 0;
    for token in tokens.take(N) {
        values[count] = token
            .parse()
            .map_err(|_| Error::parse(FORMAT, line, format!("invalid number '{}'", token)))?;
        count += 1;
    }
    if count < required {
        return Err(Error::parse(FORMAT, line, format!("expected {} numbers", required)));
    }
    Ok(values)
}

/// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_face_vertex(token: &str, data: &ObjData, line: usize) -> Result<FaceVertex> {
    let mut parts = token.split('/');
    let v = parts.next().unwrap_or_default();
    let vt = parts.next().filter(|s| !s.is_empty());
    let vn = parts.next().filter(|s| !s.is_empty());
    Ok((
        resolve_index(v, data.positions.len(), line)?,
        vt.map(|vt| resolve_index(vt, data.tex_coords.len(), line)).transpose()?,
        vn.map(|vn| resolve_index(vn, data.normals.len(), line)).transpose()?,
    ))
}

/// Turn a 1-based or negative relative OBJ index into a 0-based one
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize> {
    let index: i64 = token
        .parse()
        .map_err(|_| Error::parse(FORMAT, line, format!("invalid index '{}'", token)))?;
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(Error::parse(FORMAT, line, format!("index {} out of range", index)));
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE: &str = "\
# two quads
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
g front
usemtl red
f 1/1/1 2/2/1 3/3/1 4/4/1
g back
usemtl blue
f -1//1 -2//1 -3//1
";

    #[test]
    fn test_groups_and_materials() {
        let model = parse_obj(CUBE_FACE).unwrap();
        assert_eq!(model.groups.len(), 2);

        let front = &model.groups[0];
        assert_eq!(front.name, "front");
        assert_eq!(front.material.as_deref(), Some("red"));
        assert_eq!(front.mesh.vertex_count(), 4);
        assert_eq!(front.mesh.triangle_count(), 2);
        assert!(front.mesh.tex_coords.is_some());
        assert_eq!(front.mesh.normal(0).unwrap().z, 1.0);

        let back = &model.groups[1];
        assert_eq!(back.name, "back");
        assert_eq!(back.material.as_deref(), Some("blue"));
        assert!(back.mesh.tex_coords.is_none());
        // Relative indices count back from the last vertex
        assert_eq!(back.mesh.position(0).y, 1.0);
        assert_eq!(back.mesh.position(0).x, 0.0);
    }

    #[test]
    fn test_faces_without_normals() {
        let model = parse_obj("v 0 0 0\nv 1 0 0\nv 0 0 1\nf 1 2 3\n").unwrap();
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].name, DEFAULT_GROUP);
        assert!(model.groups[0].mesh.normals.is_none());
        assert!(model.groups[0].mesh.validate().is_ok());
    }

    #[test]
    fn test_shared_vertices_are_reused() {
        let model = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n").unwrap();
        assert_eq!(model.groups[0].mesh.vertex_count(), 4);
        assert_eq!(model.groups[0].mesh.indices(), Some(&[0, 1, 2, 0, 2, 3][..]));
    }

    #[test]
    fn test_index_errors_carry_the_line() {
        let error = parse_obj("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(error.to_string().contains("at 2"));
        assert!(parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").is_err());
        assert!(parse_obj("v 0 zero 0\n").is_err());
    }

    #[test]
    fn test_probe_rejects_text_without_faces() {
        assert!(ObjProbe.try_load(b"v 0 0 0\n").is_err());
        assert!(ObjProbe.try_load(CUBE_FACE.as_bytes()).is_ok());
    }
}
