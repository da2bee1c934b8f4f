//! In-memory graphics device
//!
//! Records every call as a [`DeviceCommand`] instead of talking to a GPU.
//! Used by tests to assert pass ordering and state, and by tools that need
//! to drive the renderer without a display. Failures can be injected to
//! exercise initialization error paths.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use super::{
    Attachment, Blend, BlitFilter, ClearMask, CompareFunc, DeviceError, DeviceResult, Face,
    FramebufferHandle, FramebufferStatus, GraphicsDevice, MeshHandle, PolygonMode, ProgramHandle,
    ProgramSource, Rect, StencilOp, TextureFormat, TextureHandle, UniformLocation, UniformValue,
};
use crate::render::shapes::MeshData;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// `create_texture`
    CreateTexture(TextureHandle, u32, u32, TextureFormat),
    /// `resize_texture`
    ResizeTexture(TextureHandle, u32, u32),
    /// `create_framebuffer`
    CreateFramebuffer(FramebufferHandle),
    /// `attach_texture`
    AttachTexture(FramebufferHandle, Attachment, TextureHandle),
    /// `bind_framebuffer`
    BindFramebuffer(FramebufferHandle),
    /// `bind_draw_framebuffer`
    BindDrawFramebuffer(FramebufferHandle),
    /// `bind_read_framebuffer`
    BindReadFramebuffer(FramebufferHandle),
    /// `set_draw_buffers`
    DrawBuffers(Vec<u32>),
    /// `set_read_buffer`
    ReadBuffer(u32),
    /// `clear`
    Clear(ClearMask),
    /// `set_depth_test`
    DepthTest(bool),
    /// `set_depth_mask`
    DepthMask(bool),
    /// `set_cull_face`
    CullFace(Option<Face>),
    /// `set_blend`
    Blend(Option<Blend>),
    /// `set_stencil_test`
    StencilTest(bool),
    /// `set_stencil_func`
    StencilFunc(CompareFunc, i32, u32),
    /// `set_stencil_op`
    StencilOp(Face, StencilOp, StencilOp, StencilOp),
    /// `set_polygon_mode`
    PolygonMode(PolygonMode),
    /// `set_viewport`
    Viewport(Rect),
    /// `bind_texture`
    BindTexture(u32, TextureHandle),
    /// `blit`
    Blit(Rect, Rect, BlitFilter),
    /// `create_program`
    CreateProgram(String, ProgramHandle),
    /// `use_program`
    UseProgram(ProgramHandle),
    /// `set_uniform`, resolved back to the uniform name
    SetUniform(String, UniformValue),
    /// `create_mesh`
    CreateMesh(MeshHandle),
    /// `draw_mesh`
    DrawMesh(MeshHandle),
    /// `push_debug_group`
    PushGroup(String),
    /// `pop_debug_group`
    PopGroup,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    name: String,
    uniforms: HashMap<String, UniformLocation>,
}

/// Graphics device that records commands in memory
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    commands: Vec<DeviceCommand>,
    next_handle: u32,
    textures: HashMap<TextureHandle, (u32, u32, TextureFormat)>,
    framebuffers: HashMap<FramebufferHandle, Vec<Attachment>>,
    programs: HashMap<ProgramHandle, ProgramRecord>,
    meshes: HashMap<MeshHandle, Vec<u8>>,
    current_program: Option<ProgramHandle>,
    failing_programs: HashSet<String>,
    incomplete_status: Option<u32>,
    unavailable: Option<String>,
}

impl HeadlessDevice {
    /// Create a device with no recorded commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_program` fail for the program with this name
    #[must_use]
    pub fn with_failing_program(mut self, name: impl Into<String>) -> Self {
        self.failing_programs.insert(name.into());
        self
    }

    /// Report every framebuffer as incomplete with the given status code
    #[must_use]
    pub fn with_incomplete_framebuffers(mut self, status: u32) -> Self {
        self.incomplete_status = Some(status);
        self
    }

    /// Fail every resource creation as if no GPU context existed
    #[must_use]
    pub fn without_context(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    /// Recorded commands, oldest first
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drop the recorded commands
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Name of a created program
    pub fn program_name(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(&program).map(|record| record.name.as_str())
    }

    /// Bytes uploaded for a mesh (vertices followed by indices)
    pub fn mesh_bytes(&self, mesh: MeshHandle) -> Option<&[u8]> {
        self.meshes.get(&mesh).map(Vec::as_slice)
    }

    /// Size and format of a texture
    pub fn texture_info(&self, texture: TextureHandle) -> Option<(u32, u32, TextureFormat)> {
        self.textures.get(&texture).copied()
    }

    /// Number of `draw_mesh` calls recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DeviceCommand::DrawMesh(_)))
            .count()
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_context(&self) -> DeviceResult<()> {
        match &self.unavailable {
            Some(reason) => Err(DeviceError::ContextUnavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn record(&mut self, command: DeviceCommand) {
        self.commands.push(command);
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_texture(&mut self, width: u32, height: u32, format: TextureFormat) -> DeviceResult<TextureHandle> {
        self.check_context()?;
        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, (width, height, format));
        self.record(DeviceCommand::CreateTexture(handle, width, height, format));
        Ok(handle)
    }

    fn resize_texture(&mut self, texture: TextureHandle, width: u32, height: u32) -> DeviceResult<()> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or_else(|| DeviceError::Resource(format!("unknown texture {}", texture.0)))?;
        entry.0 = width;
        entry.1 = height;
        self.record(DeviceCommand::ResizeTexture(texture, width, height));
        Ok(())
    }

    fn create_framebuffer(&mut self) -> DeviceResult<FramebufferHandle> {
        self.check_context()?;
        let handle = FramebufferHandle(self.allocate());
        self.framebuffers.insert(handle, Vec::new());
        self.record(DeviceCommand::CreateFramebuffer(handle));
        Ok(handle)
    }

    fn attach_texture(&mut self, framebuffer: FramebufferHandle, attachment: Attachment, texture: TextureHandle) {
        if let Some(attachments) = self.framebuffers.get_mut(&framebuffer) {
            attachments.retain(|existing| *existing != attachment);
            attachments.push(attachment);
        }
        self.record(DeviceCommand::AttachTexture(framebuffer, attachment, texture));
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        if let Some(status) = self.incomplete_status {
            return FramebufferStatus::Incomplete(status);
        }
        match self.framebuffers.get(&framebuffer) {
            Some(attachments) if !attachments.is_empty() => FramebufferStatus::Complete,
            // Missing attachment
            Some(_) => FramebufferStatus::Incomplete(0x8CD7),
            None if framebuffer == FramebufferHandle::DEFAULT => FramebufferStatus::Complete,
            // Undefined framebuffer
            None => FramebufferStatus::Incomplete(0x8219),
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.record(DeviceCommand::BindFramebuffer(framebuffer));
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.record(DeviceCommand::BindDrawFramebuffer(framebuffer));
    }

    fn bind_read_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.record(DeviceCommand::BindReadFramebuffer(framebuffer));
    }

    fn set_draw_buffers(&mut self, attachments: &[u32]) {
        self.record(DeviceCommand::DrawBuffers(attachments.to_vec()));
    }

    fn set_read_buffer(&mut self, attachment: u32) {
        self.record(DeviceCommand::ReadBuffer(attachment));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(DeviceCommand::Clear(mask));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.record(DeviceCommand::DepthTest(enabled));
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.record(DeviceCommand::DepthMask(enabled));
    }

    fn set_cull_face(&mut self, face: Option<Face>) {
        self.record(DeviceCommand::CullFace(face));
    }

    fn set_blend(&mut self, blend: Option<Blend>) {
        self.record(DeviceCommand::Blend(blend));
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.record(DeviceCommand::StencilTest(enabled));
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.record(DeviceCommand::StencilFunc(func, reference, mask));
    }

    fn set_stencil_op(&mut self, face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp) {
        self.record(DeviceCommand::StencilOp(face, stencil_fail, depth_fail, depth_pass));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.record(DeviceCommand::PolygonMode(mode));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.record(DeviceCommand::Viewport(rect));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.record(DeviceCommand::BindTexture(unit, texture));
    }

    fn blit(&mut self, src: Rect, dst: Rect, filter: BlitFilter) {
        self.record(DeviceCommand::Blit(src, dst, filter));
    }

    fn create_program(&mut self, source: &ProgramSource) -> DeviceResult<ProgramHandle> {
        self.check_context()?;
        if self.failing_programs.contains(&source.name) {
            return Err(DeviceError::Compile(format!(
                "{}: syntax error",
                source.fragment.display()
            )));
        }
        let handle = ProgramHandle(self.allocate());
        self.programs.insert(
            handle,
            ProgramRecord {
                name: source.name.clone(),
                uniforms: HashMap::new(),
            },
        );
        self.record(DeviceCommand::CreateProgram(source.name.clone(), handle));
        Ok(handle)
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let record = self.programs.get_mut(&program)?;
        let next = i32::try_from(record.uniforms.len()).unwrap_or(i32::MAX);
        Some(*record.uniforms.entry(name.to_string()).or_insert(UniformLocation(next)))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
        self.record(DeviceCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = self
            .current_program
            .and_then(|program| self.programs.get(&program))
            .and_then(|record| {
                record
                    .uniforms
                    .iter()
                    .find(|(_, existing)| **existing == location)
                    .map(|(name, _)| name.clone())
            })
            .unwrap_or_else(|| format!("#{}", location.0));
        self.record(DeviceCommand::SetUniform(name, value));
    }

    fn create_mesh(&mut self, data: &MeshData) -> DeviceResult<MeshHandle> {
        self.check_context()?;
        if data.indices.is_empty() {
            return Err(DeviceError::Resource("mesh has no indices".to_string()));
        }
        let handle = MeshHandle(self.allocate());
        let mut bytes = data.vertex_bytes().to_vec();
        bytes.extend_from_slice(data.index_bytes());
        self.meshes.insert(handle, bytes);
        self.record(DeviceCommand::CreateMesh(handle));
        Ok(handle)
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.record(DeviceCommand::DrawMesh(mesh));
    }

    fn push_debug_group(&mut self, label: &str) {
        self.record(DeviceCommand::PushGroup(label.to_string()));
    }

    fn pop_debug_group(&mut self) {
        self.record(DeviceCommand::PopGroup);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
