// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Textures by reference and surface appearances

use std::hash::{Hash, Hasher};

/// A texture identified by name, tiled every `width` x `height` plan units
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureRef {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl TextureRef {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// Texture coordinate along the tiling width
    #[inline]
    pub fn u(&self, distance: f64) -> f32 {
        if self.width > 0.0 {
            (distance / self.width) as f32
        } else {
            0.0
        }
    }

    /// Texture coordinate along the tiling height
    #[inline]
    pub fn v(&self, distance: f64) -> f32 {
        if self.height > 0.0 {
            (distance / self.height) as f32
        } else {
            0.0
        }
    }
}

/// Material of an exported or rendered surface
///
/// Equality and hashing use the exact bit patterns of the float fields, so two
/// appearances are the same material only when every value matches.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Appearance {
    pub name: String,
    /// RGB color packed as 0xRRGGBB
    pub color: Option<u32>,
    /// 0 is opaque, 1 is invisible
    pub transparency: f32,
    /// 0 is matt, 1 is shiny
    pub shininess: f32,
    pub texture: Option<TextureRef>,
}

impl Appearance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            transparency: 0.0,
            shininess: 0.0,
            texture: None,
        }
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color & 0xFFFFFF);
        self
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess.clamp(0.0, 1.0);
        self
    }

    /// Diffuse color as normalized RGB, grey when no color is set
    pub fn diffuse_rgb(&self) -> [f32; 3] {
        match self.color {
            Some(color) => [
                ((color >> 16) & 0xFF) as f32 / 255.0,
                ((color >> 8) & 0xFF) as f32 / 255.0,
                (color & 0xFF) as f32 / 255.0,
            ],
            None => [0.8, 0.8, 0.8],
        }
    }

    fn key(&self) -> (&str, Option<u32>, u32, u32, Option<(&str, u64, u64)>) {
        (
            &self.name,
            self.color,
            self.transparency.to_bits(),
            self.shininess.to_bits(),
            self.texture
                .as_ref()
                .map(|t| (t.name.as_str(), t.width.to_bits(), t.height.to_bits())),
        )
    }
}

impl PartialEq for Appearance {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Appearance {}

impl Hash for Appearance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_appearance_value_identity() {
        let a = Appearance::new("brick").with_color(0xAA3311);
        let b = Appearance::new("brick").with_color(0xAA3311);
        let c = Appearance::new("brick").with_color(0xAA3312);

        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_texture_coordinates() {
        let texture = TextureRef::new("parquet", 50.0, 25.0);
        assert_eq!(texture.u(100.0), 2.0);
        assert_eq!(texture.v(-25.0), -1.0);
        assert_eq!(TextureRef::new("broken", 0.0, 0.0).u(10.0), 0.0);
    }

    #[test]
    fn test_diffuse_rgb() {
        let rgb = Appearance::new("red").with_color(0xFF0000).diffuse_rgb();
        assert_eq!(rgb, [1.0, 0.0, 0.0]);
    }
}
