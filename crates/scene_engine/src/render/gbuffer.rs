//! Geometry buffer
//!
//! One framebuffer with five color targets and a combined depth/stencil
//! target. The geometry pass writes the first four, the light pass reads
//! them back as textures and accumulates into the final-color target.

use log::debug;

use super::device::{Attachment, FramebufferHandle, FramebufferStatus, GraphicsDevice, TextureFormat, TextureHandle};
use super::{RenderError, RenderResult};

/// Color targets of the geometry buffer, in attachment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GBufferTarget {
    /// View-space position
    Position,
    /// Diffuse albedo
    Diffuse,
    /// Specular color and shininess
    Specular,
    /// View-space normal
    Normal,
    /// Lit result, blitted to the screen
    FinalColor,
}

impl GBufferTarget {
    /// All targets in attachment order
    pub const ALL: [Self; 5] = [Self::Position, Self::Diffuse, Self::Specular, Self::Normal, Self::FinalColor];

    /// The four targets the geometry pass writes
    pub const GEOMETRY: [Self; 4] = [Self::Position, Self::Diffuse, Self::Specular, Self::Normal];

    /// Color attachment index; also the texture unit it is bound to in the light pass
    pub const fn attachment(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Diffuse => 1,
            Self::Specular => 2,
            Self::Normal => 3,
            Self::FinalColor => 4,
        }
    }

    /// Texel format of the target
    pub const fn format(self) -> TextureFormat {
        match self {
            Self::Position => TextureFormat::Rgba32F,
            Self::Diffuse | Self::Specular => TextureFormat::Rgba8,
            Self::Normal => TextureFormat::Rgba16F,
            Self::FinalColor => TextureFormat::Rgb8,
        }
    }
}

/// Framebuffer and textures of the deferred pipeline
#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    framebuffer: FramebufferHandle,
    targets: [TextureHandle; 5],
    depth_stencil: TextureHandle,
    width: u32,
    height: u32,
}

impl GeometryBuffer {
    /// Create all targets at the given size and check completeness
    pub fn new(device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<Self> {
        let framebuffer = device.create_framebuffer()?;
        device.bind_draw_framebuffer(framebuffer);

        let mut targets = [TextureHandle::default(); 5];
        for (slot, target) in targets.iter_mut().zip(GBufferTarget::ALL) {
            *slot = device.create_texture(width, height, target.format())?;
            device.attach_texture(framebuffer, Attachment::Color(target.attachment()), *slot);
        }
        let depth_stencil = device.create_texture(width, height, TextureFormat::Depth32FStencil8)?;
        device.attach_texture(framebuffer, Attachment::DepthStencil, depth_stencil);

        let gbuffer = Self {
            framebuffer,
            targets,
            depth_stencil,
            width,
            height,
        };
        gbuffer.check_complete(device)?;
        device.bind_draw_framebuffer(FramebufferHandle::DEFAULT);

        debug!("Geometry buffer created at {}x{}", width, height);
        Ok(gbuffer)
    }

    /// Reallocate every target at a new size
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        device.bind_draw_framebuffer(self.framebuffer);
        for texture in self.targets.iter().chain(std::iter::once(&self.depth_stencil)) {
            device.resize_texture(*texture, width, height)?;
        }
        self.width = width;
        self.height = height;
        self.check_complete(device)?;
        device.bind_draw_framebuffer(FramebufferHandle::DEFAULT);

        debug!("Geometry buffer resized to {}x{}", width, height);
        Ok(())
    }

    /// Fail with `IncompleteFramebuffer` unless the framebuffer is usable
    pub fn check_complete(&self, device: &dyn GraphicsDevice) -> RenderResult<()> {
        match device.framebuffer_status(self.framebuffer) {
            FramebufferStatus::Complete => Ok(()),
            FramebufferStatus::Incomplete(status) => Err(RenderError::IncompleteFramebuffer(status)),
        }
    }

    /// Framebuffer handle
    pub const fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// Texture backing a target
    pub const fn texture(&self, target: GBufferTarget) -> TextureHandle {
        self.targets[target.attachment() as usize]
    }

    /// Depth/stencil texture
    pub const fn depth_stencil(&self) -> TextureHandle {
        self.depth_stencil
    }

    /// Current size in pixels
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
