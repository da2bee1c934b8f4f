//! The fixed set of programs the deferred pipeline uses

use std::path::Path;

use log::{debug, info};

use super::primitives::{LightType, MaterialFlags};
use super::shader::{ShaderDescriptor, ShaderProgram, UniformKind};
use super::{GraphicsDevice, RenderError, RenderResult};

const GEOMETRY_VARIANTS: [&str; 8] = ["gp", "gp_d", "gp_s", "gp_ds", "gp_n", "gp_dn", "gp_sn", "gp_dsn"];

const GBUFFER_INPUTS: [(&str, UniformKind); 4] = [
    ("geometryBufferPositionTexture", UniformKind::Texture),
    ("geometryBufferDiffuseTexture", UniformKind::Texture),
    ("geometryBufferSpecularTexture", UniformKind::Texture),
    ("geometryBufferNormalTexture", UniformKind::Texture),
];

/// Descriptor of the geometry pass variant for a set of material textures
pub fn geometry_descriptor(flags: MaterialFlags) -> ShaderDescriptor {
    let index = (flags.bits() & MaterialFlags::all().bits()) as usize;
    let name = GEOMETRY_VARIANTS[index];

    let mut descriptor = ShaderDescriptor::new(name).with_uniforms(&[
        ("matrixPVM", UniformKind::Mat4),
        ("matrixVM", UniformKind::Mat4),
        ("matrixN", UniformKind::Mat3),
        ("materialDiffuseColor", UniformKind::Vec4),
        ("materialSpecularColor", UniformKind::Vec4),
    ]);
    // Only normal mapping needs tangent space in the vertex stage
    if !flags.contains(MaterialFlags::NORMAL_TEXTURE) {
        descriptor = descriptor.with_vertex("gp.vs");
    }
    if flags.contains(MaterialFlags::DIFFUSE_TEXTURE) {
        descriptor = descriptor.with_uniforms(&[("materialDiffuseTexture", UniformKind::Texture)]);
    }
    if flags.contains(MaterialFlags::SPECULAR_TEXTURE) {
        descriptor = descriptor.with_uniforms(&[("materialSpecularTexture", UniformKind::Texture)]);
    }
    if flags.contains(MaterialFlags::NORMAL_TEXTURE) {
        descriptor = descriptor.with_uniforms(&[("materialNormalTexture", UniformKind::Texture)]);
    }
    descriptor
}

/// Descriptor of the light pass program for a light type
pub fn light_descriptor(light_type: LightType) -> ShaderDescriptor {
    match light_type {
        LightType::Ambient => ShaderDescriptor::new("lp_ambient").with_uniforms(&[
            ("geometryBufferDiffuseTexture", UniformKind::Texture),
            ("viewportSize", UniformKind::Vec2),
            ("lightIntensity", UniformKind::Vec4),
        ]),
        LightType::Directional => ShaderDescriptor::new("lp_directional")
            .with_uniforms(&GBUFFER_INPUTS)
            .with_uniforms(&[
                ("viewportSize", UniformKind::Vec2),
                ("lightIntensity", UniformKind::Vec4),
                ("lightDirection", UniformKind::Vec3),
            ]),
        LightType::Point => ShaderDescriptor::new("lp_point")
            .with_uniforms(&GBUFFER_INPUTS)
            .with_uniforms(&[
                ("matrixPVM", UniformKind::Mat4),
                ("viewportSize", UniformKind::Vec2),
                ("lightIntensity", UniformKind::Vec4),
                ("lightAttenuation", UniformKind::Vec4),
                ("lightPosition", UniformKind::Vec3),
            ]),
        LightType::Spot => ShaderDescriptor::new("lp_spot")
            .with_uniforms(&GBUFFER_INPUTS)
            .with_uniforms(&[
                ("matrixPVM", UniformKind::Mat4),
                ("viewportSize", UniformKind::Vec2),
                ("lightIntensity", UniformKind::Vec4),
                ("lightAttenuation", UniformKind::Vec4),
                ("lightPosition", UniformKind::Vec3),
                ("lightDirection", UniformKind::Vec3),
                ("lightCosineHalfAngle", UniformKind::Float),
            ]),
    }
}

/// Every program the renderer needs, loaded once at initialization
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    null: ShaderProgram,
    geometry: Vec<ShaderProgram>,
    ambient: ShaderProgram,
    directional: ShaderProgram,
    point: ShaderProgram,
    spot: ShaderProgram,
}

impl ShaderLibrary {
    /// Load all programs from `shader_dir`
    ///
    /// The first failure aborts loading; the error names the backend and
    /// the program that failed.
    pub fn load(device: &mut dyn GraphicsDevice, shader_dir: &Path) -> RenderResult<Self> {
        let null = Self::load_one(
            device,
            shader_dir,
            &ShaderDescriptor::new("matrix_PVM").with_uniforms(&[("matrixPVM", UniformKind::Mat4)]),
        )?;

        let geometry = (0..GEOMETRY_VARIANTS.len())
            .map(|index| {
                let flags = MaterialFlags::from_bits_truncate(u32::try_from(index).unwrap_or_default());
                Self::load_one(device, shader_dir, &geometry_descriptor(flags))
            })
            .collect::<RenderResult<Vec<_>>>()?;

        let library = Self {
            null,
            geometry,
            ambient: Self::load_one(device, shader_dir, &light_descriptor(LightType::Ambient))?,
            directional: Self::load_one(device, shader_dir, &light_descriptor(LightType::Directional))?,
            point: Self::load_one(device, shader_dir, &light_descriptor(LightType::Point))?,
            spot: Self::load_one(device, shader_dir, &light_descriptor(LightType::Spot))?,
        };
        info!("Loaded {} shader programs from {}", library.iter().count(), shader_dir.display());
        Ok(library)
    }

    fn load_one(device: &mut dyn GraphicsDevice, shader_dir: &Path, descriptor: &ShaderDescriptor) -> RenderResult<ShaderProgram> {
        let program = ShaderProgram::load(device, shader_dir, descriptor).map_err(|source| RenderError::ShaderLoad {
            renderer: device.name().to_string(),
            shader: descriptor.name.clone(),
            source,
        })?;
        debug!("Loaded shader {}", descriptor.name);
        Ok(program)
    }

    /// Position-only program used to mark light volumes in the stencil buffer
    pub const fn null(&self) -> &ShaderProgram {
        &self.null
    }

    /// Geometry pass variant for a material's texture set
    pub fn geometry(&self, flags: MaterialFlags) -> &ShaderProgram {
        let index = (flags.bits() & MaterialFlags::all().bits()) as usize;
        &self.geometry[index]
    }

    /// Light pass program for a light type
    pub const fn light(&self, light_type: LightType) -> &ShaderProgram {
        match light_type {
            LightType::Ambient => &self.ambient,
            LightType::Directional => &self.directional,
            LightType::Point => &self.point,
            LightType::Spot => &self.spot,
        }
    }

    /// All programs
    pub fn iter(&self) -> impl Iterator<Item = &ShaderProgram> {
        std::iter::once(&self.null)
            .chain(self.geometry.iter())
            .chain([&self.ambient, &self.directional, &self.point, &self.spot])
    }
}
