//! Deferred renderer
//!
//! Owns the device, the window and every GPU object of the pipeline, and
//! drives one frame at a time: geometry pass, optional stencil marking of
//! light volumes, light pass, and at the end of the frame the composite to
//! the screen together with queue swap, clock, input and window signals.

use std::sync::Arc;

use log::{debug, info, trace, warn};

use super::device::{
    Blend, BlitFilter, ClearMask, CompareFunc, Face, FramebufferHandle, GraphicsDevice, MeshHandle, PolygonMode,
    Rect, StencilOp,
};
use super::gbuffer::{GBufferTarget, GeometryBuffer};
use super::matrices::MatrixCache;
use super::primitives::material::{DIFFUSE_TEXTURE_UNIT, NORMAL_TEXTURE_UNIT, SPECULAR_TEXTURE_UNIT};
use super::primitives::{Camera, Light, LightType, Material, MaterialFlags};
use super::queue::EntityQueue;
use super::shader::ShaderProgram;
use super::shader_library::ShaderLibrary;
use super::shapes::MeshData;
use super::RenderResult;
use crate::config::RendererConfig;
use crate::events::{Event, EventArg, EventSystem, EventType};
use crate::foundation::math::{translation_of, Mat4, Vec2, Vec3, Vec4, FORWARD};
use crate::foundation::time::FrameClock;
use crate::input::{InputState, KeyCode, WindowBackend, WindowEvent};
use crate::scene::{Entity, EntityId, Scene};

const SPHERE_RINGS: u32 = 16;
const SPHERE_SEGMENTS: u32 = 16;

/// Counters of the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Index of the frame
    pub frame: u64,
    /// Total `draw_mesh` calls
    pub draw_calls: u32,
    /// Entities drawn in the geometry pass
    pub entities_drawn: u32,
    /// Lights accumulated in the light pass
    pub lights_shaded: u32,
    /// Light volumes marked in the stencil buffer
    pub stencil_volumes: u32,
    /// Queued handles that no longer referred to a live entity
    pub stale_entities: u32,
}

/// A light gathered during the geometry pass
struct QueuedLight {
    light: Arc<Light>,
    global: Mat4,
}

/// Deferred rendering context
pub struct Renderer {
    device: Box<dyn GraphicsDevice>,
    window: Box<dyn WindowBackend>,
    config: RendererConfig,
    gbuffer: GeometryBuffer,
    shaders: ShaderLibrary,
    quad: MeshHandle,
    sphere: MeshHandle,
    default_material: Material,
    matrices: MatrixCache,
    queue: Arc<EntityQueue>,
    clock: FrameClock,
    input: InputState,
    events: EventSystem,
    camera_entity: Option<EntityId>,
    width: u32,
    height: u32,
    wireframe: bool,
    should_close: bool,
    stats: FrameStats,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("device", &self.device.name())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("camera_entity", &self.camera_entity)
            .field("should_close", &self.should_close)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Initialize the pipeline on a device and window
    ///
    /// Creates the geometry buffer, loads every shader program and uploads
    /// the builtin shapes. Any failure here is fatal.
    pub fn new(config: &RendererConfig, mut device: Box<dyn GraphicsDevice>, window: Box<dyn WindowBackend>) -> RenderResult<Self> {
        let (width, height) = window.size();
        info!("Initializing renderer on {} at {}x{}", device.name(), width, height);

        let gbuffer = GeometryBuffer::new(device.as_mut(), width, height)?;
        let shaders = ShaderLibrary::load(device.as_mut(), &config.resolve_shader_dir())?;
        let quad = device.create_mesh(&MeshData::unit_quad())?;
        let sphere = device.create_mesh(&MeshData::unit_sphere(SPHERE_RINGS, SPHERE_SEGMENTS))?;
        device.set_viewport(Rect::sized(width, height));

        Ok(Self {
            device,
            window,
            config: config.clone(),
            gbuffer,
            shaders,
            quad,
            sphere,
            default_material: Material::default(),
            matrices: MatrixCache::new(Camera::default(), width, height),
            queue: Arc::new(EntityQueue::new()),
            clock: FrameClock::new(),
            input: InputState::new(),
            events: EventSystem::new(),
            camera_entity: None,
            width,
            height,
            wireframe: config.wireframe,
            should_close: false,
            stats: FrameStats::default(),
        })
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Render the current queue against `scene`
    ///
    /// Queued handles that were destroyed since submission are skipped.
    pub fn render_frame(&mut self, scene: &Scene) {
        self.stats = FrameStats {
            frame: self.clock.frame_count(),
            ..FrameStats::default()
        };
        self.update_camera(scene);

        let queue = Arc::clone(&self.queue);
        let current = queue.current();
        let mut lights = Vec::new();

        self.device.push_debug_group("geometry");
        self.begin_geometry_pass();
        for &id in current.iter() {
            let Some(entity) = scene.entity(id) else {
                warn!("Renderer: skipping stale entity {:?}", id);
                self.stats.stale_entities += 1;
                continue;
            };
            if let Some(light) = entity.light() {
                lights.push(QueuedLight {
                    light: Arc::clone(light),
                    global: *entity.global_transform(),
                });
            }
            self.draw_entity(entity);
        }
        if self.wireframe {
            self.device.set_polygon_mode(PolygonMode::Fill);
        }
        self.device.pop_debug_group();
        drop(current);

        if !lights.is_empty() {
            self.device.push_debug_group("light");
            self.begin_light_pass();
            for queued in &lights {
                self.shade_light(queued);
            }
            self.device.pop_debug_group();
        } else if self.config.null_light_fallback {
            self.device.push_debug_group("light");
            self.null_light_pass();
            self.device.pop_debug_group();
        }

        if self.config.debug_gbuffer_view {
            self.blit_drawbuffers_to_screen();
        }
        trace!("Renderer: frame {} {:?}", self.stats.frame, self.stats);
    }

    fn update_camera(&mut self, scene: &Scene) {
        let Some(id) = self.camera_entity else {
            self.matrices.set_view(&Mat4::identity());
            return;
        };
        let Some(entity) = scene.entity(id) else {
            warn!("Renderer: camera entity {:?} no longer exists", id);
            self.camera_entity = None;
            self.matrices.set_view(&Mat4::identity());
            return;
        };
        if let Some(camera) = entity.camera() {
            if **camera != *self.matrices.camera() {
                self.matrices.set_camera(Camera::clone(camera));
            }
        }
        if let Ok(view) = scene.view_matrix(id) {
            self.matrices.set_view(&view);
        }
    }

    fn draw_entity(&mut self, entity: &Entity) {
        let Some(mesh) = entity.mesh() else { return };
        let material = entity.material().map_or(&self.default_material, Arc::as_ref);
        let flags = material.flags();
        let shader = self.shaders.geometry(flags);
        let device = self.device.as_mut();

        self.matrices.set_model(entity.global_transform());
        shader.activate(device);
        shader.set_matrix_pvm(device, self.matrices.projection_model_view());
        shader.set_matrix_vm(device, self.matrices.model_view());
        shader.set_matrix_n(device, self.matrices.normal());
        shader.set_material_diffuse_color(device, material.diffuse_color);
        shader.set_material_specular_color(device, material.specular_color);

        if let (true, Some(texture)) = (flags.contains(MaterialFlags::DIFFUSE_TEXTURE), material.diffuse_texture) {
            device.bind_texture(DIFFUSE_TEXTURE_UNIT, texture);
            shader.set_material_diffuse_texture(device, DIFFUSE_TEXTURE_UNIT);
        }
        if let (true, Some(texture)) = (flags.contains(MaterialFlags::SPECULAR_TEXTURE), material.specular_texture) {
            device.bind_texture(SPECULAR_TEXTURE_UNIT, texture);
            shader.set_material_specular_texture(device, SPECULAR_TEXTURE_UNIT);
        }
        if let (true, Some(texture)) = (flags.contains(MaterialFlags::NORMAL_TEXTURE), material.normal_texture) {
            device.bind_texture(NORMAL_TEXTURE_UNIT, texture);
            shader.set_material_normal_texture(device, NORMAL_TEXTURE_UNIT);
        }

        device.draw_mesh(mesh.handle);
        self.stats.draw_calls += 1;
        self.stats.entities_drawn += 1;
    }

    fn shade_light(&mut self, queued: &QueuedLight) {
        let light = queued.light.as_ref();
        let view = *self.matrices.view();
        let viewport = self.viewport_vector();
        let shader = self.shaders.light(light.light_type());

        match light.light_type() {
            LightType::Ambient => {
                let device = self.device.as_mut();
                shader.activate(device);
                shader.set_gbuffer_diffuse_texture(device, GBufferTarget::Diffuse.attachment());
                shader.set_viewport_size(device, viewport);
                shader.set_light_intensity(device, light.intensity());
                device.draw_mesh(self.quad);
            }
            LightType::Directional => {
                let direction = view_direction(&view, &queued.global);
                let device = self.device.as_mut();
                shader.activate(device);
                bind_gbuffer_units(shader, device);
                shader.set_viewport_size(device, viewport);
                shader.set_light_intensity(device, light.intensity());
                shader.set_light_direction(device, direction);
                device.draw_mesh(self.quad);
            }
            LightType::Point | LightType::Spot => {
                let world_position = translation_of(&queued.global);
                let radius = light.cutoff_radius().min(self.matrices.camera().far_plane);
                let volume = Mat4::new_translation(&world_position) * Mat4::new_scaling(radius);
                self.matrices.set_model(&volume);
                let pvm = self.matrices.projection_model_view();

                if self.config.stencil_light_volumes {
                    self.mark_light_volume(&pvm);
                    self.begin_light_pass();
                    self.device.set_stencil_func(CompareFunc::NotEqual, 0, 0xFF);
                }

                let shader = self.shaders.light(light.light_type());
                let device = self.device.as_mut();
                device.set_cull_face(Some(Face::Front));
                shader.activate(device);
                bind_gbuffer_units(shader, device);
                shader.set_matrix_pvm(device, pvm);
                shader.set_viewport_size(device, viewport);
                shader.set_light_intensity(device, light.intensity());
                shader.set_light_attenuation(device, light.attenuation());
                shader.set_light_position(device, (view * world_position.push(1.0)).xyz());
                if light.light_type() == LightType::Spot {
                    shader.set_light_direction(device, view_direction(&view, &queued.global));
                    shader.set_light_cosine_half_angle(device, light.cosine_half_angle());
                }
                device.draw_mesh(self.sphere);
                device.set_cull_face(Some(Face::Back));
                if self.config.stencil_light_volumes {
                    device.set_stencil_test(false);
                }
            }
        }
        self.stats.draw_calls += 1;
        self.stats.lights_shaded += 1;
    }

    fn mark_light_volume(&mut self, pvm: &Mat4) {
        self.device.push_debug_group("stencil");
        self.device.set_stencil_test(true);
        self.begin_stencil_pass();
        let shader = self.shaders.null();
        let device = self.device.as_mut();
        shader.activate(device);
        shader.set_matrix_pvm(device, *pvm);
        device.draw_mesh(self.sphere);
        device.pop_debug_group();
        self.stats.draw_calls += 1;
        self.stats.stencil_volumes += 1;
    }

    // ------------------------------------------------------------------
    // Pass state
    // ------------------------------------------------------------------

    /// Bind the geometry buffer, clear it and set depth/cull state for drawing geometry
    pub fn begin_geometry_pass(&mut self) {
        let device = self.device.as_mut();
        device.bind_draw_framebuffer(self.gbuffer.framebuffer());
        device.set_draw_buffers(&[GBufferTarget::FinalColor.attachment()]);
        device.clear(ClearMask::COLOR);
        let targets = GBufferTarget::GEOMETRY.map(GBufferTarget::attachment);
        device.set_draw_buffers(&targets);
        device.clear(ClearMask::COLOR | ClearMask::DEPTH);
        device.set_depth_mask(true);
        device.set_depth_test(true);
        device.set_blend(None);
        device.set_cull_face(Some(Face::Back));
        if self.wireframe {
            device.set_polygon_mode(PolygonMode::Line);
        }
    }

    /// Disable color writes and set the stencil to count volume crossings
    ///
    /// Back faces increment and front faces decrement on depth failure, so
    /// pixels inside the volume end up non-zero.
    pub fn begin_stencil_pass(&mut self) {
        let device = self.device.as_mut();
        device.set_draw_buffers(&[]);
        device.set_depth_test(true);
        device.set_cull_face(None);
        device.clear(ClearMask::STENCIL);
        device.set_stencil_func(CompareFunc::Always, 0, 0);
        device.set_stencil_op(Face::Back, StencilOp::Keep, StencilOp::IncrWrap, StencilOp::Keep);
        device.set_stencil_op(Face::Front, StencilOp::Keep, StencilOp::DecrWrap, StencilOp::Keep);
    }

    /// Draw into the final-color target with the geometry targets bound as inputs
    pub fn begin_light_pass(&mut self) {
        let device = self.device.as_mut();
        device.set_draw_buffers(&[GBufferTarget::FinalColor.attachment()]);
        for target in GBufferTarget::GEOMETRY {
            device.bind_texture(target.attachment(), self.gbuffer.texture(target));
        }
        device.set_depth_test(false);
        device.set_blend(Some(Blend::ADDITIVE));
    }

    /// Light the scene with full-bright white ambient light
    ///
    /// For scenes without any light. `render_frame` runs it on its own when
    /// `null_light_fallback` is enabled; calling it before `render_frame`
    /// has no effect since the geometry pass clears the final image.
    pub fn null_light_pass(&mut self) {
        self.begin_light_pass();
        let viewport = self.viewport_vector();
        let shader = self.shaders.light(LightType::Ambient);
        let device = self.device.as_mut();
        shader.activate(device);
        shader.set_gbuffer_diffuse_texture(device, GBufferTarget::Diffuse.attachment());
        shader.set_viewport_size(device, viewport);
        shader.set_light_intensity(device, Vec4::new(1.0, 1.0, 1.0, 1.0));
        device.draw_mesh(self.quad);
        self.stats.draw_calls += 1;
    }

    /// Show the four geometry targets in the quadrants of the final image
    ///
    /// Position bottom-left, normal top-left, diffuse top-right, specular
    /// bottom-right.
    pub fn blit_drawbuffers_to_screen(&mut self) {
        let (width, height) = (self.width, self.height);
        let (half_width, half_height) = (width / 2, height / 2);
        let full = Rect::sized(width, height);
        let quadrants = [
            (GBufferTarget::Position, Rect::new(0, 0, half_width, half_height)),
            (GBufferTarget::Normal, Rect::new(0, half_height, half_width, height)),
            (GBufferTarget::Diffuse, Rect::new(half_width, half_height, width, height)),
            (GBufferTarget::Specular, Rect::new(half_width, 0, width, half_height)),
        ];

        let device = self.device.as_mut();
        device.push_debug_group("gbuffer view");
        device.bind_draw_framebuffer(self.gbuffer.framebuffer());
        device.bind_read_framebuffer(self.gbuffer.framebuffer());
        device.set_draw_buffers(&[GBufferTarget::FinalColor.attachment()]);
        for (target, destination) in quadrants {
            device.set_read_buffer(target.attachment());
            device.blit(full, destination, BlitFilter::Linear);
        }
        device.pop_debug_group();
    }

    // ------------------------------------------------------------------
    // End of frame
    // ------------------------------------------------------------------

    /// Finish the frame
    ///
    /// Blits the final image to the screen and presents it, makes the
    /// submitted entities current, advances the clock, rolls the input
    /// state and handles window events. Fails only if a resize leaves the
    /// geometry buffer incomplete.
    pub fn update(&mut self) -> RenderResult<()> {
        let full = Rect::sized(self.width, self.height);
        let device = self.device.as_mut();
        device.push_debug_group("composite");
        device.bind_draw_framebuffer(FramebufferHandle::DEFAULT);
        device.bind_read_framebuffer(self.gbuffer.framebuffer());
        device.set_read_buffer(GBufferTarget::FinalColor.attachment());
        device.blit(full, full, BlitFilter::Linear);
        device.pop_debug_group();

        self.window.swap_buffers();
        self.queue.swap();
        self.clock.tick();
        let now = self.clock.elapsed().as_secs_f64();

        let window_events = self.window.poll_events();
        self.input.roll(self.window.keyboard_state());
        for event in window_events {
            match event {
                WindowEvent::Resized(width, height) => {
                    self.resize(width, height)?;
                    self.events.send(
                        Event::new(EventType::WindowResized, now).with_arg("size", EventArg::Size(width, height)),
                    );
                }
                WindowEvent::MouseMotion(dx, dy) => self.input.add_mouse_motion(dx, dy),
                WindowEvent::MouseEntered => self.events.send(Event::new(EventType::MouseEntered, now)),
                WindowEvent::MouseLeft => self.events.send(Event::new(EventType::MouseLeft, now)),
                WindowEvent::CloseRequested => self.close(),
                WindowEvent::Key(..) => {}
            }
        }

        let delta = self.input.mouse_delta();
        if delta != Vec2::zeros() {
            self.events.send(Event::new(EventType::MouseMoved, now).with_arg("delta", EventArg::Delta(delta.x, delta.y)));
        }
        self.events.dispatch();
        Ok(())
    }

    /// Resize the viewport and the geometry buffer
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width;
        self.height = height;
        self.matrices.resize(width, height);
        self.device.set_viewport(Rect::sized(width, height));
        self.gbuffer.resize(self.device.as_mut(), width, height)?;
        debug!("Renderer: resized to {}x{}", width, height);
        Ok(())
    }

    /// Ask the render loop to stop
    ///
    /// Fires `AboutToClose` right away; the loop sees the flag at the top
    /// of its next iteration.
    pub fn close(&mut self) {
        if self.should_close {
            return;
        }
        self.should_close = true;
        let event = Event::new(EventType::AboutToClose, self.clock.elapsed().as_secs_f64());
        self.events.fire(&event);
        info!("Renderer: close requested");
    }

    /// Whether `close` was called
    pub const fn should_close(&self) -> bool {
        self.should_close
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Submission queue, shareable with producer threads
    pub fn queue(&self) -> Arc<EntityQueue> {
        Arc::clone(&self.queue)
    }

    /// Graphics device
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Graphics device, mutably
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Window backend
    pub fn window(&self) -> &dyn WindowBackend {
        self.window.as_ref()
    }

    /// Window backend, mutably
    pub fn window_mut(&mut self) -> &mut dyn WindowBackend {
        self.window.as_mut()
    }

    /// Event registry for resize, mouse and close signals
    pub fn events_mut(&mut self) -> &mut EventSystem {
        &mut self.events
    }

    /// Matrix cache
    pub const fn matrices(&self) -> &MatrixCache {
        &self.matrices
    }

    /// Matrix cache, mutably
    pub fn matrices_mut(&mut self) -> &mut MatrixCache {
        &mut self.matrices
    }

    /// Geometry buffer
    pub const fn gbuffer(&self) -> &GeometryBuffer {
        &self.gbuffer
    }

    /// Loaded shader programs
    pub const fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Counters of the last rendered frame
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Entity the scene is viewed through
    pub const fn camera_entity(&self) -> Option<EntityId> {
        self.camera_entity
    }

    /// Set the entity the scene is viewed through
    pub fn set_camera_entity(&mut self, entity: Option<EntityId>) {
        self.camera_entity = entity;
    }

    /// World position of the camera entity
    pub fn camera_position(&self, scene: &Scene) -> Option<Vec3> {
        self.camera_entity.and_then(|id| scene.entity(id)).map(Entity::global_position)
    }

    /// Viewport size in pixels
    pub const fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[allow(clippy::cast_precision_loss)]
    fn viewport_vector(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Viewport width over height
    pub fn aspect_ratio(&self) -> f32 {
        let size = self.viewport_vector();
        if size.y == 0.0 {
            1.0
        } else {
            size.x / size.y
        }
    }

    /// Whether geometry is drawn as wireframe
    pub const fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Draw geometry as wireframe
    pub fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    /// Whether frames without lights get the full-bright pass
    pub const fn null_light_fallback(&self) -> bool {
        self.config.null_light_fallback
    }

    /// Enable or disable the full-bright pass for frames without lights
    pub fn set_null_light_fallback(&mut self, enabled: bool) {
        self.config.null_light_fallback = enabled;
    }

    /// Seconds since the renderer started, as of the last `update`
    pub fn elapsed_time(&self) -> f32 {
        self.clock.elapsed().as_secs_f32()
    }

    /// Seconds between the last two `update`s
    pub fn delta_time(&self) -> f32 {
        self.clock.delta_secs()
    }

    /// Frame clock
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Polled input state
    pub const fn input(&self) -> &InputState {
        &self.input
    }

    /// Whether the key is down
    pub fn key(&self, key: KeyCode) -> bool {
        self.input.key(key)
    }

    /// Whether the key was down last frame
    pub fn key_prev(&self, key: KeyCode) -> bool {
        self.input.key_prev(key)
    }

    /// Whether the key went down this frame
    pub fn key_toggle_press(&self, key: KeyCode) -> bool {
        self.input.key_toggle_press(key)
    }

    /// Whether the key went up this frame
    pub fn key_toggle_release(&self, key: KeyCode) -> bool {
        self.input.key_toggle_release(key)
    }

    /// Mouse motion accumulated during the last frame
    pub const fn mouse_delta(&self) -> Vec2 {
        self.input.mouse_delta()
    }
}

fn bind_gbuffer_units(shader: &ShaderProgram, device: &mut dyn GraphicsDevice) {
    shader.set_gbuffer_position_texture(device, GBufferTarget::Position.attachment());
    shader.set_gbuffer_diffuse_texture(device, GBufferTarget::Diffuse.attachment());
    shader.set_gbuffer_specular_texture(device, GBufferTarget::Specular.attachment());
    shader.set_gbuffer_normal_texture(device, GBufferTarget::Normal.attachment());
}

/// View-space forward direction of an entity
fn view_direction(view: &Mat4, global: &Mat4) -> Vec3 {
    (view * global * FORWARD.push(0.0)).xyz().try_normalize(f32::EPSILON).unwrap_or(FORWARD)
}
