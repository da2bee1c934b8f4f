//! Graphics device abstraction
//!
//! Every GPU call the renderer makes goes through [`GraphicsDevice`]. The
//! trait mirrors the small set of fixed-function state, framebuffer, program
//! and draw operations a deferred pipeline needs, so a concrete backend only
//! has to translate them one to one.

use std::any::Any;
use std::path::PathBuf;

use bitflags::bitflags;

use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::render::shapes::MeshData;

pub mod headless;

pub use headless::{DeviceCommand, HeadlessDevice};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Handle to a texture owned by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TextureHandle(pub u32);

/// Handle to a framebuffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u32);

impl FramebufferHandle {
    /// The window's default framebuffer
    pub const DEFAULT: Self = Self(0);
}

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Location of a uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Handle to uploaded mesh geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Texel formats used by the geometry buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 4 x 32-bit float
    Rgba32F,
    /// 4 x 16-bit float
    Rgba16F,
    /// 4 x 8-bit normalised
    Rgba8,
    /// 3 x 8-bit normalised
    Rgb8,
    /// 32-bit float depth with 8-bit stencil
    Depth32FStencil8,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment by index
    Color(u32),
    /// Combined depth and stencil attachment
    DepthStencil,
}

/// Completeness of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// Not usable; carries the backend's status code
    Incomplete(u32),
}

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        /// Color buffers
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Polygon faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Front-facing polygons
    Front,
    /// Back-facing polygons
    Back,
    /// Both
    FrontAndBack,
}

/// Comparison function for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Always passes
    Always,
    /// Passes if the values are equal
    Equal,
    /// Passes if the values differ
    NotEqual,
    /// Passes if the incoming value is less
    Less,
}

/// Stencil buffer update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Keep the current value
    Keep,
    /// Set to zero
    Zero,
    /// Increment, wrapping to zero on overflow
    IncrWrap,
    /// Decrement, wrapping to the maximum on underflow
    DecrWrap,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 1
    One,
    /// 0
    Zero,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// src + dst
    Add,
}

/// Blend state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blend {
    /// Combination of source and destination terms
    pub equation: BlendEquation,
    /// Source factor
    pub src: BlendFactor,
    /// Destination factor
    pub dst: BlendFactor,
}

impl Blend {
    /// `ONE, ONE` additive blending used to accumulate lights
    pub const ADDITIVE: Self = Self {
        equation: BlendEquation::Add,
        src: BlendFactor::One,
        dst: BlendFactor::One,
    };
}

/// Polygon rasterisation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Filled polygons
    Fill,
    /// Outlines only
    Line,
}

/// Filter used when a blit scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitFilter {
    /// Nearest texel
    Nearest,
    /// Linear interpolation
    Linear,
}

/// Pixel rectangle `(x0, y0) .. (x1, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge
    pub x0: u32,
    /// Bottom edge
    pub y0: u32,
    /// Right edge (exclusive)
    pub x1: u32,
    /// Top edge (exclusive)
    pub y1: u32,
}

impl Rect {
    /// Create a rectangle from its corners
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering `width` x `height` from the origin
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// Value uploaded to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Signed integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Texture unit index for a sampler
    TextureUnit(u32),
}

impl UniformValue {
    /// Raw bytes as they would be uploaded (column-major for matrices)
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => bytemuck::bytes_of(v).to_vec(),
            Self::TextureUnit(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Float(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Vec2(v) => bytemuck::cast_slice(v.as_slice()).to_vec(),
            Self::Vec3(v) => bytemuck::cast_slice(v.as_slice()).to_vec(),
            Self::Vec4(v) => bytemuck::cast_slice(v.as_slice()).to_vec(),
            Self::Mat3(m) => bytemuck::cast_slice(m.as_slice()).to_vec(),
            Self::Mat4(m) => bytemuck::cast_slice(m.as_slice()).to_vec(),
        }
    }
}

/// Source files of a shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    /// Program name, used in diagnostics
    pub name: String,
    /// Vertex shader path
    pub vertex: PathBuf,
    /// Fragment shader path
    pub fragment: PathBuf,
}

/// Errors raised by a graphics backend
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No usable GPU context
    #[error("no graphics context: {0}")]
    ContextUnavailable(String),

    /// Shader source could not be read
    #[error("could not read shader source {path}: {reason}")]
    ShaderSource {
        /// File that failed
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// Shader compilation failed
    #[error("compilation failed: {0}")]
    Compile(String),

    /// Program linking failed
    #[error("linking failed: {0}")]
    Link(String),

    /// Any other resource creation failure
    #[error("resource creation failed: {0}")]
    Resource(String),
}

/// GPU command interface used by the renderer
///
/// Implementations are bound to a single GPU context and must only be used
/// from the thread that owns it.
pub trait GraphicsDevice {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Create a 2D texture without initial data
    fn create_texture(&mut self, width: u32, height: u32, format: TextureFormat) -> DeviceResult<TextureHandle>;

    /// Reallocate a texture's storage at a new size
    fn resize_texture(&mut self, texture: TextureHandle, width: u32, height: u32) -> DeviceResult<()>;

    /// Create an empty framebuffer
    fn create_framebuffer(&mut self) -> DeviceResult<FramebufferHandle>;

    /// Attach a texture to a framebuffer
    fn attach_texture(&mut self, framebuffer: FramebufferHandle, attachment: Attachment, texture: TextureHandle);

    /// Completeness of a framebuffer
    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    /// Bind a framebuffer for both drawing and reading
    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer for drawing
    fn bind_draw_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer for reading
    fn bind_read_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Select the color attachments written by subsequent draws; empty disables color writes
    fn set_draw_buffers(&mut self, attachments: &[u32]);

    /// Select the color attachment read by blits
    fn set_read_buffer(&mut self, attachment: u32);

    /// Clear the selected buffers of the bound draw framebuffer
    fn clear(&mut self, mask: ClearMask);

    /// Enable or disable the depth test
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Face culling; `None` disables culling
    fn set_cull_face(&mut self, face: Option<Face>);

    /// Blending; `None` disables blending
    fn set_blend(&mut self, blend: Option<Blend>);

    /// Enable or disable the stencil test
    fn set_stencil_test(&mut self, enabled: bool);

    /// Stencil comparison
    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);

    /// Stencil update operations for one or both faces
    fn set_stencil_op(&mut self, face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp);

    /// Polygon rasterisation mode
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Viewport rectangle
    fn set_viewport(&mut self, rect: Rect);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Copy a rectangle from the read framebuffer to the draw framebuffer
    fn blit(&mut self, src: Rect, dst: Rect, filter: BlitFilter);

    /// Compile and link a program
    fn create_program(&mut self, source: &ProgramSource) -> DeviceResult<ProgramHandle>;

    /// Look up a uniform; `None` when the program does not use it
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make a program current
    fn use_program(&mut self, program: ProgramHandle);

    /// Upload a uniform value to the current program
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Upload mesh geometry
    fn create_mesh(&mut self, data: &MeshData) -> DeviceResult<MeshHandle>;

    /// Draw an uploaded mesh with the current state
    fn draw_mesh(&mut self, mesh: MeshHandle);

    /// Open a named debug group (no-op for backends without markers)
    fn push_debug_group(&mut self, _label: &str) {}

    /// Close the innermost debug group
    fn pop_debug_group(&mut self) {}

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
