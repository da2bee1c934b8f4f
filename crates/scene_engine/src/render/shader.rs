//! Shader programs as values
//!
//! A program is a device handle plus a table of the uniforms it declares.
//! Callers set uniforms by capability through the typed setters below and
//! never look at shader internals. A uniform the linked program optimised
//! away simply resolves to no location and setting it is a no-op.

use std::collections::HashMap;
use std::path::Path;

use log::{trace, warn};

use super::device::{DeviceResult, GraphicsDevice, ProgramHandle, ProgramSource, UniformLocation, UniformValue};
use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Type of a uniform as declared by a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `sampler2D`, set with a texture unit index
    Texture,
}

impl UniformKind {
    /// Kind a value can be uploaded to
    pub const fn of(value: &UniformValue) -> Self {
        match value {
            UniformValue::Int(_) => Self::Int,
            UniformValue::Float(_) => Self::Float,
            UniformValue::Vec2(_) => Self::Vec2,
            UniformValue::Vec3(_) => Self::Vec3,
            UniformValue::Vec4(_) => Self::Vec4,
            UniformValue::Mat3(_) => Self::Mat3,
            UniformValue::Mat4(_) => Self::Mat4,
            UniformValue::TextureUnit(_) => Self::Texture,
        }
    }
}

/// Declarative description of a shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    /// Program name
    pub name: String,
    /// Vertex shader file name, relative to the shader directory
    pub vertex: String,
    /// Fragment shader file name, relative to the shader directory
    pub fragment: String,
    /// Declared uniforms
    pub uniforms: Vec<(&'static str, UniformKind)>,
}

impl ShaderDescriptor {
    /// Describe a program whose sources are `<stem>.vs` and `<stem>.fs`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            vertex: format!("{name}.vs"),
            fragment: format!("{name}.fs"),
            name,
            uniforms: Vec::new(),
        }
    }

    /// Use a different vertex shader file
    #[must_use]
    pub fn with_vertex(mut self, vertex: impl Into<String>) -> Self {
        self.vertex = vertex.into();
        self
    }

    /// Declare uniforms
    #[must_use]
    pub fn with_uniforms(mut self, uniforms: &[(&'static str, UniformKind)]) -> Self {
        self.uniforms.extend_from_slice(uniforms);
        self
    }
}

/// A linked shader program with its uniform table
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    name: String,
    program: ProgramHandle,
    uniforms: HashMap<&'static str, (UniformKind, Option<UniformLocation>)>,
}

impl ShaderProgram {
    /// Compile and link a program and resolve its uniforms
    pub fn load(device: &mut dyn GraphicsDevice, shader_dir: &Path, descriptor: &ShaderDescriptor) -> DeviceResult<Self> {
        let source = ProgramSource {
            name: descriptor.name.clone(),
            vertex: shader_dir.join(&descriptor.vertex),
            fragment: shader_dir.join(&descriptor.fragment),
        };
        let program = device.create_program(&source)?;

        let uniforms = descriptor
            .uniforms
            .iter()
            .map(|&(name, kind)| {
                let location = device.uniform_location(program, name);
                if location.is_none() {
                    trace!("Shader {}: uniform {} is not active", descriptor.name, name);
                }
                (name, (kind, location))
            })
            .collect();

        Ok(Self {
            name: descriptor.name.clone(),
            program,
            uniforms,
        })
    }

    /// Program name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device handle
    pub const fn handle(&self) -> ProgramHandle {
        self.program
    }

    /// Whether the program declares the uniform
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Make this the current program
    pub fn activate(&self, device: &mut dyn GraphicsDevice) {
        device.use_program(self.program);
    }

    /// Set a uniform by name
    ///
    /// Undeclared uniforms and kind mismatches are logged and skipped.
    pub fn set(&self, device: &mut dyn GraphicsDevice, name: &str, value: UniformValue) {
        match self.uniforms.get(name) {
            Some(&(kind, location)) => {
                if kind != UniformKind::of(&value) {
                    warn!("Shader {}: {} expects {:?}, got {:?}", self.name, name, kind, value);
                    return;
                }
                if let Some(location) = location {
                    device.set_uniform(location, value);
                }
            }
            None => trace!("Shader {}: no uniform named {}", self.name, name),
        }
    }
}

macro_rules! uniform_setters {
    ($($(#[$doc:meta])* $setter:ident => $uniform:literal: $variant:ident($ty:ty);)*) => {
        impl ShaderProgram {
            $(
                $(#[$doc])*
                pub fn $setter(&self, device: &mut dyn GraphicsDevice, value: $ty) {
                    self.set(device, $uniform, UniformValue::$variant(value));
                }
            )*
        }
    };
}

uniform_setters! {
    /// Projection * view * model
    set_matrix_pvm => "matrixPVM": Mat4(Mat4);
    /// View * model
    set_matrix_vm => "matrixVM": Mat4(Mat4);
    /// Normal matrix
    set_matrix_n => "matrixN": Mat3(Mat3);
    /// Diffuse color used when the material has no diffuse texture
    set_material_diffuse_color => "materialDiffuseColor": Vec4(Vec4);
    /// Specular color, shininess in w
    set_material_specular_color => "materialSpecularColor": Vec4(Vec4);
    /// Texture unit of the diffuse map
    set_material_diffuse_texture => "materialDiffuseTexture": TextureUnit(u32);
    /// Texture unit of the specular map
    set_material_specular_texture => "materialSpecularTexture": TextureUnit(u32);
    /// Texture unit of the normal map
    set_material_normal_texture => "materialNormalTexture": TextureUnit(u32);
    /// Texture unit of the position target
    set_gbuffer_position_texture => "geometryBufferPositionTexture": TextureUnit(u32);
    /// Texture unit of the diffuse target
    set_gbuffer_diffuse_texture => "geometryBufferDiffuseTexture": TextureUnit(u32);
    /// Texture unit of the specular target
    set_gbuffer_specular_texture => "geometryBufferSpecularTexture": TextureUnit(u32);
    /// Texture unit of the normal target
    set_gbuffer_normal_texture => "geometryBufferNormalTexture": TextureUnit(u32);
    /// Viewport size in pixels
    set_viewport_size => "viewportSize": Vec2(Vec2);
    /// Color in rgb, brightness in w
    set_light_intensity => "lightIntensity": Vec4(Vec4);
    /// Constant, linear and quadratic falloff terms
    set_light_attenuation => "lightAttenuation": Vec4(Vec4);
    /// View-space direction
    set_light_direction => "lightDirection": Vec3(Vec3);
    /// View-space position
    set_light_position => "lightPosition": Vec3(Vec3);
    /// Cosine of half the spot cone angle
    set_light_cosine_half_angle => "lightCosineHalfAngle": Float(f32);
}
