//! # Deferred Rendering
//!
//! The renderer draws a frame in a fixed pass sequence:
//!
//! - **Geometry pass**: every queued entity writes position, diffuse,
//!   specular and normal data into the geometry buffer, using the shader
//!   variant its material selects
//! - **Stencil pass** (per point/spot light, optional): marks the pixels the
//!   light volume covers
//! - **Light pass**: each light is accumulated additively into the
//!   final-color target, reading the geometry buffer as input
//! - **Composite**: the final-color target is blitted to the screen
//!
//! All GPU access goes through [`device::GraphicsDevice`], so the whole
//! pipeline runs against the in-memory [`device::HeadlessDevice`] in tests.

pub mod device;
pub mod gbuffer;
pub mod matrices;
pub mod primitives;
pub mod queue;
pub mod renderer;
pub mod shader;
pub mod shader_library;
pub mod shapes;

pub use device::{DeviceError, GraphicsDevice, HeadlessDevice};
pub use gbuffer::{GBufferTarget, GeometryBuffer};
pub use matrices::{CachedMatrix, MatrixCache, RecomputeStats};
pub use primitives::{Camera, Light, LightType, Material, MaterialFlags, Mesh, ProjectionType};
pub use queue::EntityQueue;
pub use renderer::{FrameStats, Renderer};
pub use shader::{ShaderDescriptor, ShaderProgram, UniformKind};
pub use shader_library::ShaderLibrary;
pub use shapes::{MeshData, Vertex};

/// Rendering errors
///
/// All of these are fatal initialization errors; per-frame work has no
/// error path.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// No usable graphics context
    #[error("Failed to obtain a graphics context: {0}")]
    ContextUnavailable(String),

    /// The geometry buffer could not be completed
    #[error("Frame buffer status was not complete: {0}")]
    IncompleteFramebuffer(u32),

    /// A shader program failed to compile or link
    #[error("{renderer}: Failed to load {shader}: {source}")]
    ShaderLoad {
        /// Name of the graphics backend
        renderer: String,
        /// Shader program that failed
        shader: String,
        /// Backend failure
        source: DeviceError,
    },

    /// Any other backend failure
    #[error("device error: {0}")]
    Device(DeviceError),
}

impl From<DeviceError> for RenderError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::ContextUnavailable(reason) => Self::ContextUnavailable(reason),
            other => Self::Device(other),
        }
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
