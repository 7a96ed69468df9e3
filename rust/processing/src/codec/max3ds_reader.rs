// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 3D Studio binary reader
//!
//! Walks the chunk tree down to the triangle meshes of named objects and reads their
//! vertices, faces, face materials and texture coordinates. Coordinates are Z-up in
//! the file and converted to Y-up as `(x, z, -y)`.

use super::{FormatProbe, LoadedGroup, LoadedModel, ProbeRejection};
use crate::error::{Error, Result};
use plan3d_core::{MeshBuffer, Topology};
use rustc_hash::FxHashMap;

const FORMAT: &str = "3DS";

const MAIN: u16 = 0x4D4D;
const EDITOR: u16 = 0x3D3D;
const NAMED_OBJECT: u16 = 0x4000;
const TRIANGLE_MESH: u16 = 0x4100;
const VERTEX_LIST: u16 = 0x4110;
const FACE_LIST: u16 = 0x4120;
const FACE_MATERIAL: u16 = 0x4130;
const TEXTURE_COORDINATES: u16 = 0x4140;

const CHUNK_HEADER_SIZE: usize = 6;

/// Probe for binary 3DS files
pub struct Max3dsProbe;

impl FormatProbe for Max3dsProbe {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn try_load(&self, bytes: &[u8]) -> std::result::Result<LoadedModel, ProbeRejection> {
        if bytes.len() < CHUNK_HEADER_SIZE || u16::from_le_bytes([bytes[0], bytes[1]]) != MAIN {
            return Err(ProbeRejection::new(FORMAT, "missing main chunk"));
        }
        let model = parse_3ds(bytes).map_err(|e| ProbeRejection::new(FORMAT, e.to_string()))?;
        if model.groups.is_empty() {
            return Err(ProbeRejection::new(FORMAT, "no triangle mesh found"));
        }
        Ok(model)
    }
}

/// Little endian cursor over the file bytes
struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.position + N;
        let slice = self
            .bytes
            .get(self.position..end)
            .ok_or_else(|| Error::parse(FORMAT, self.position, "unexpected end of file"))?;
        self.position = end;
        let mut array = [0u8; N];
        array.copy_from_slice(slice);
        Ok(array)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Zero terminated ISO-8859-1 string
    fn string(&mut self) -> Result<String> {
        let rest = &self.bytes[self.position.min(self.bytes.len())..];
        let length = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::parse(FORMAT, self.position, "unterminated string"))?;
        let text = rest[..length].iter().map(|&b| b as char).collect();
        self.position += length + 1;
        Ok(text)
    }

    /// Read a chunk header, returning its id and the offset of its end within `parent_end`
    fn chunk(&mut self, parent_end: usize) -> Result<(u16, usize)> {
        let start = self.position;
        let id = self.u16()?;
        let length = self.u32()? as usize;
        if length < CHUNK_HEADER_SIZE {
            return Err(Error::parse(FORMAT, start, format!("chunk 0x{:04X} too short", id)));
        }
        Ok((id, (start + length).min(parent_end)))
    }
}

/// Raw triangle mesh of one named object
#[derive(Default)]
struct ObjectMesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u16; 3]>,
    tex_coords: Vec<[f32; 2]>,
    /// Material names with the faces using them
    materials: Vec<(String, Vec<u16>)>,
}

/// Parse 3DS bytes
pub fn parse_3ds(bytes: &[u8]) -> Result<LoadedModel> {
    let mut reader = Reader { bytes, position: 0 };
    let (id, main_end) = reader.chunk(bytes.len())?;
    if id != MAIN {
        return Err(Error::parse(FORMAT, 0, format!("unexpected chunk 0x{:04X}", id)));
    }

    let mut groups = Vec::new();
    while reader.position + CHUNK_HEADER_SIZE <= main_end {
        let (id, end) = reader.chunk(main_end)?;
        if id == EDITOR {
            while reader.position + CHUNK_HEADER_SIZE <= end {
                let (id, object_end) = reader.chunk(end)?;
                if id == NAMED_OBJECT {
                    let name = reader.string()?;
                    while reader.position + CHUNK_HEADER_SIZE <= object_end {
                        let (id, mesh_end) = reader.chunk(object_end)?;
                        if id == TRIANGLE_MESH {
                            let mesh = read_triangle_mesh(&mut reader, mesh_end)?;
                            groups.extend(object_groups(&name, mesh, mesh_end)?);
                        }
                        reader.position = mesh_end;
                    }
                }
                reader.position = object_end;
            }
        }
        reader.position = end;
    }

    Ok(LoadedModel {
        format: FORMAT,
        groups,
    })
}

fn read_triangle_mesh(reader: &mut Reader<'_>, end: usize) -> Result<ObjectMesh> {
    let mut mesh = ObjectMesh::default();
    while reader.position + CHUNK_HEADER_SIZE <= end {
        let (id, chunk_end) = reader.chunk(end)?;
        match id {
            VERTEX_LIST => {
                let count = reader.u16()? as usize;
                mesh.vertices.reserve(count);
                for _ in 0..count {
                    let (x, y, z) = (reader.f32()?, reader.f32()?, reader.f32()?);
                    mesh.vertices.push([x, z, -y]);
                }
            }
            FACE_LIST => {
                let count = reader.u16()? as usize;
                mesh.faces.reserve(count);
                for _ in 0..count {
                    let face = [reader.u16()?, reader.u16()?, reader.u16()?];
                    let _flags = reader.u16()?;
                    mesh.faces.push(face);
                }
                // Face sub chunks follow the face list
                while reader.position + CHUNK_HEADER_SIZE <= chunk_end {
                    let (id, sub_end) = reader.chunk(chunk_end)?;
                    if id == FACE_MATERIAL {
                        let name = reader.string()?;
                        let count = reader.u16()? as usize;
                        let faces = (0..count).map(|_| reader.u16()).collect::<Result<Vec<_>>>()?;
                        mesh.materials.push((name, faces));
                    }
                    reader.position = sub_end;
                }
            }
            TEXTURE_COORDINATES => {
                let count = reader.u16()? as usize;
                mesh.tex_coords.reserve(count);
                for _ in 0..count {
                    mesh.tex_coords.push([reader.f32()?, reader.f32()?]);
                }
            }
            _ => {}
        }
        reader.position = chunk_end;
    }
    Ok(mesh)
}

/// Split an object mesh in one group per material, faces without material first
fn object_groups(name: &str, mesh: ObjectMesh, offset: usize) -> Result<Vec<LoadedGroup>> {
    if let Some(face) = mesh
        .faces
        .iter()
        .find(|face| face.iter().any(|&i| i as usize >= mesh.vertices.len()))
    {
        return Err(Error::parse(
            FORMAT,
            offset,
            format!("face {:?} of '{}' out of {} vertices", face, name, mesh.vertices.len()),
        ));
    }

    let mut assigned = vec![false; mesh.faces.len()];
    let mut selections: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    for (material, faces) in &mesh.materials {
        let faces: Vec<usize> = faces
            .iter()
            .map(|&f| f as usize)
            .filter(|&f| f < mesh.faces.len())
            .collect();
        for &f in &faces {
            assigned[f] = true;
        }
        selections.push((Some(material.clone()), faces));
    }
    let unassigned: Vec<usize> = (0..mesh.faces.len()).filter(|&f| !assigned[f]).collect();
    selections.insert(0, (None, unassigned));

    let with_tex_coords = mesh.tex_coords.len() == mesh.vertices.len();
    Ok(selections
        .into_iter()
        .filter(|(_, faces)| !faces.is_empty())
        .map(|(material, faces)| {
            let mut remap: FxHashMap<u16, u32> = FxHashMap::default();
            let mut positions = Vec::new();
            let mut tex_coords = Vec::new();
            let mut indices = Vec::with_capacity(faces.len() * 3);
            for f in faces {
                for &v in &mesh.faces[f] {
                    let index = *remap.entry(v).or_insert_with(|| {
                        positions.extend_from_slice(&mesh.vertices[v as usize]);
                        if with_tex_coords {
                            tex_coords.extend_from_slice(&mesh.tex_coords[v as usize]);
                        }
                        (positions.len() / 3 - 1) as u32
                    });
                    indices.push(index);
                }
            }
            LoadedGroup {
                name: name.to_string(),
                material,
                mesh: MeshBuffer {
                    positions,
                    normals: None,
                    tex_coords: with_tex_coords.then_some(tex_coords),
                    topology: Topology::Indexed(indices),
                },
            }
        })
        .collect())
}
