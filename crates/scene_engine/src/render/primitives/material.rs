//! Surface materials
//!
//! A material is a diffuse and a specular color plus up to three optional
//! textures. Which textures are present decides the geometry shader
//! variant the renderer binds.

use bitflags::bitflags;

use crate::foundation::math::Vec4;
use crate::render::device::TextureHandle;

bitflags! {
    /// Texture capabilities of a material
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Diffuse color comes from a texture
        const DIFFUSE_TEXTURE = 1 << 0;
        /// Specular color comes from a texture
        const SPECULAR_TEXTURE = 1 << 1;
        /// Normals come from a normal map
        const NORMAL_TEXTURE = 1 << 2;
    }
}

/// Texture unit the diffuse map is bound to
pub const DIFFUSE_TEXTURE_UNIT: u32 = 0;
/// Texture unit the specular map is bound to
pub const SPECULAR_TEXTURE_UNIT: u32 = 1;
/// Texture unit the normal map is bound to
pub const NORMAL_TEXTURE_UNIT: u32 = 2;

/// Surface material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Diffuse color, alpha is the blend factor with the diffuse texture
    pub diffuse_color: Vec4,
    /// Specular color, alpha is the shininess
    pub specular_color: Vec4,
    /// Optional diffuse map
    pub diffuse_texture: Option<TextureHandle>,
    /// Optional specular map
    pub specular_texture: Option<TextureHandle>,
    /// Optional normal map
    pub normal_texture: Option<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            diffuse_color: Vec4::new(0.8, 0.8, 0.8, 0.0),
            specular_color: Vec4::new(0.2, 0.2, 0.2, 4.0),
            diffuse_texture: None,
            specular_texture: None,
            normal_texture: None,
        }
    }
}

impl Material {
    /// Create an untextured material
    pub fn new(name: impl Into<String>, diffuse_color: Vec4, specular_color: Vec4) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            specular_color,
            ..Self::default()
        }
    }

    /// Set the diffuse map
    #[must_use]
    pub fn with_diffuse_texture(mut self, texture: TextureHandle) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    /// Set the specular map
    #[must_use]
    pub fn with_specular_texture(mut self, texture: TextureHandle) -> Self {
        self.specular_texture = Some(texture);
        self
    }

    /// Set the normal map
    #[must_use]
    pub fn with_normal_texture(mut self, texture: TextureHandle) -> Self {
        self.normal_texture = Some(texture);
        self
    }

    /// Which textures this material carries
    pub fn flags(&self) -> MaterialFlags {
        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::DIFFUSE_TEXTURE, self.diffuse_texture.is_some());
        flags.set(MaterialFlags::SPECULAR_TEXTURE, self.specular_texture.is_some());
        flags.set(MaterialFlags::NORMAL_TEXTURE, self.normal_texture.is_some());
        flags
    }
}
