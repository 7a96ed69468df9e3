// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ and MTL writer
//!
//! Vertices, normals and texture coordinates are written once each across the whole
//! file, identical values sharing one record. Each shape becomes a `g` group and each
//! distinct appearance one material.

use crate::config::DEFAULT_FRACTION_DIGITS;
use crate::error::Result;
use crate::producer::ShapePart;
use plan3d_core::Appearance;
use rustc_hash::FxHashMap;
use std::io::Write;

/// Writer of OBJ text to any output
pub struct ObjWriter<W: Write> {
    out: W,
    header: Option<String>,
    fraction_digits: usize,
    with_materials: bool,
    vertices: FxHashMap<[u32; 3], usize>,
    normals: FxHashMap<[u32; 3], usize>,
    tex_coords: FxHashMap<[u32; 2], usize>,
    materials: FxHashMap<Appearance, String>,
    /// Appearances in the order they were first used
    material_order: Vec<Appearance>,
}

impl<W: Write> ObjWriter<W> {
    /// Start an OBJ file without materials, with an optional header comment
    pub fn new(out: W, header: Option<&str>) -> Result<Self> {
        let mut writer = Self {
            out,
            header: header.map(str::to_string),
            fraction_digits: DEFAULT_FRACTION_DIGITS,
            with_materials: false,
            vertices: FxHashMap::default(),
            normals: FxHashMap::default(),
            tex_coords: FxHashMap::default(),
            materials: FxHashMap::default(),
            material_order: Vec::new(),
        };
        if let Some(header) = &writer.header {
            writeln!(writer.out, "{}", comment(header))?;
        }
        Ok(writer)
    }

    /// Start an OBJ file whose materials go to the library `mtl_name`
    ///
    /// The library itself is written with [`ObjWriter::write_materials`].
    pub fn with_material_library(out: W, header: Option<&str>, mtl_name: &str) -> Result<Self> {
        let mut writer = Self::new(out, header)?;
        writer.with_materials = true;
        writeln!(writer.out, "mtllib {}", mtl_name)?;
        Ok(writer)
    }

    /// Maximum count of fractional digits written for numbers
    pub fn fraction_digits(mut self, digits: usize) -> Self {
        self.fraction_digits = digits;
        self
    }

    /// Write the shapes of one object, one group per shape
    pub fn write_node(&mut self, name: &str, parts: &[ShapePart]) -> Result<()> {
        for part in parts {
            if part.mesh.triangle_count() == 0 {
                continue;
            }
            let mut group = sanitize_name(name);
            if !part.name.is_empty() {
                group.push('_');
                group.push_str(&sanitize_name(&part.name));
            }
            group = format!("{}_{}", group, self.vertices.len());
            writeln!(self.out, "g {}", group)?;

            if self.with_materials {
                if let Some(appearance) = &part.appearance {
                    let material = match self.materials.get(appearance) {
                        Some(material) => material.clone(),
                        None => {
                            self.materials.insert(appearance.clone(), group.clone());
                            self.material_order.push(appearance.clone());
                            group.clone()
                        }
                    };
                    writeln!(self.out, "usemtl {}", material)?;
                }
            }

            let mesh = part.mesh.to_indexed();
            let mut vertex_refs = Vec::with_capacity(mesh.vertex_count());
            for i in 0..mesh.vertex_count() {
                let p = mesh.position(i);
                let v = self.vertex_index([p.x, p.y, p.z])?;
                let vn = match mesh.normal(i) {
                    Some(n) => Some(self.normal_index([n.x, n.y, n.z])?),
                    None => None,
                };
                let vt = match mesh.tex_coord(i) {
                    Some(uv) => Some(self.tex_coord_index(uv)?),
                    None => None,
                };
                vertex_refs.push(face_vertex(v, vt, vn));
            }
            for triangle in mesh.indices().unwrap_or(&[]).chunks_exact(3) {
                writeln!(
                    self.out,
                    "f {} {} {}",
                    vertex_refs[triangle[0] as usize],
                    vertex_refs[triangle[1] as usize],
                    vertex_refs[triangle[2] as usize]
                )?;
            }
        }
        Ok(())
    }

    /// Write the material library of every appearance used so far
    pub fn write_materials<M: Write>(&self, mut mtl: M) -> Result<()> {
        if let Some(header) = &self.header {
            writeln!(mtl, "{}", comment(header))?;
        }
        for appearance in &self.material_order {
            let Some(name) = self.materials.get(appearance) else {
                continue;
            };
            let [r, g, b] = appearance.diffuse_rgb();
            let shininess = appearance.shininess;
            writeln!(mtl, "\nnewmtl {}", name)?;
            writeln!(mtl, "illum {}", if shininess > 0.0 { 2 } else { 1 })?;
            writeln!(mtl, "Ka {}", self.triple(r * 0.2, g * 0.2, b * 0.2))?;
            writeln!(mtl, "Kd {}", self.triple(r, g, b))?;
            writeln!(mtl, "Ks {}", self.triple(shininess, shininess, shininess))?;
            writeln!(mtl, "Ns {}", self.number(1.0 + shininess * 127.0))?;
            writeln!(mtl, "Ni 1")?;
            writeln!(mtl, "d {}", self.number(1.0 - appearance.transparency))?;
            if let Some(texture) = &appearance.texture {
                writeln!(mtl, "map_Kd {}", texture.name)?;
            }
        }
        mtl.flush()?;
        Ok(())
    }

    /// Flush and give back the output
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn vertex_index(&mut self, p: [f32; 3]) -> Result<usize> {
        let key = bits3(p);
        if let Some(&index) = self.vertices.get(&key) {
            return Ok(index);
        }
        writeln!(self.out, "v {}", self.triple(p[0], p[1], p[2]))?;
        let index = self.vertices.len() + 1;
        self.vertices.insert(key, index);
        Ok(index)
    }

    fn normal_index(&mut self, n: [f32; 3]) -> Result<usize> {
        let key = bits3(n);
        if let Some(&index) = self.normals.get(&key) {
            return Ok(index);
        }
        writeln!(self.out, "vn {}", self.triple(n[0], n[1], n[2]))?;
        let index = self.normals.len() + 1;
        self.normals.insert(key, index);
        Ok(index)
    }

    fn tex_coord_index(&mut self, uv: [f32; 2]) -> Result<usize> {
        let key = [bits(uv[0]), bits(uv[1])];
        if let Some(&index) = self.tex_coords.get(&key) {
            return Ok(index);
        }
        writeln!(self.out, "vt {} {} 0", self.number(uv[0]), self.number(uv[1]))?;
        let index = self.tex_coords.len() + 1;
        self.tex_coords.insert(key, index);
        Ok(index)
    }

    fn number(&self, value: f32) -> String {
        format_number(value, self.fraction_digits)
    }

    fn triple(&self, a: f32, b: f32, c: f32) -> String {
        format!("{} {} {}", self.number(a), self.number(b), self.number(c))
    }
}

/// Print `value` with at most `fraction_digits` fractional digits, trailing zeros removed
pub fn format_number(value: f32, fraction_digits: usize) -> String {
    let mut text = format!("{:.*}", fraction_digits, value as f64);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Keep ASCII letters, digits and underscores, replacing anything else by `_`
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "object".to_string();
    }
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn comment(header: &str) -> String {
    if header.starts_with('#') {
        header.to_string()
    } else {
        format!("# {}", header)
    }
}

fn face_vertex(v: usize, vt: Option<usize>, vn: Option<usize>) -> String {
    match (vt, vn) {
        (None, None) => v.to_string(),
        (Some(vt), None) => format!("{}/{}", v, vt),
        (None, Some(vn)) => format!("{}//{}", v, vn),
        (Some(vt), Some(vn)) => format!("{}/{}/{}", v, vt, vn),
    }
}

#[inline]
fn bits(v: f32) -> u32 {
    // -0.0 and 0.0 share one record
    (v + 0.0).to_bits()
}

#[inline]
fn bits3(v: [f32; 3]) -> [u32; 3] {
    [bits(v[0]), bits(v[1]), bits(v[2])]
}
