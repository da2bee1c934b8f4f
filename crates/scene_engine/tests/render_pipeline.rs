//! Deferred pipeline behavior observed through the headless backends

use std::sync::Arc;
use std::thread;

use scene_engine::config::RendererConfig;
use scene_engine::foundation::math::{Vec3, Vec4};
use scene_engine::input::{HeadlessWindow, WindowEvent};
use scene_engine::render::device::{
    Blend, BlitFilter, ClearMask, DeviceCommand, Face, FramebufferHandle, MeshHandle, PolygonMode, Rect,
    UniformValue,
};
use scene_engine::render::{GBufferTarget, HeadlessDevice, Light, Material, Mesh, RenderError, Renderer};
use scene_engine::scene::{EntityDesc, Scene};
use scene_engine::spatial::AxisAlignedBox;

fn renderer(config: &RendererConfig, device: HeadlessDevice) -> Result<Renderer, RenderError> {
    Renderer::new(config, Box::new(device), Box::new(HeadlessWindow::new(200, 100)))
}

fn recorded(renderer: &Renderer) -> &HeadlessDevice {
    renderer.device().as_any().downcast_ref::<HeadlessDevice>().unwrap()
}

fn reset(renderer: &mut Renderer) {
    renderer.device_mut().as_any_mut().downcast_mut::<HeadlessDevice>().unwrap().clear_commands();
}

fn cube() -> Arc<Mesh> {
    Arc::new(Mesh::new("cube", MeshHandle(500), AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(1.0))))
}

#[test]
fn test_geometry_pass_state_sequence() {
    let mut renderer = renderer(&RendererConfig::default().with_wireframe(true), HeadlessDevice::new()).unwrap();
    let framebuffer = renderer.gbuffer().framebuffer();
    reset(&mut renderer);

    renderer.begin_geometry_pass();

    assert_eq!(
        recorded(&renderer).commands(),
        &[
            DeviceCommand::BindDrawFramebuffer(framebuffer),
            DeviceCommand::DrawBuffers(vec![4]),
            DeviceCommand::Clear(ClearMask::COLOR),
            DeviceCommand::DrawBuffers(vec![0, 1, 2, 3]),
            DeviceCommand::Clear(ClearMask::COLOR | ClearMask::DEPTH),
            DeviceCommand::DepthMask(true),
            DeviceCommand::DepthTest(true),
            DeviceCommand::Blend(None),
            DeviceCommand::CullFace(Some(Face::Back)),
            DeviceCommand::PolygonMode(PolygonMode::Line),
        ]
    );
}

#[test]
fn test_light_pass_binds_gbuffer_inputs() {
    let mut renderer = renderer(&RendererConfig::default(), HeadlessDevice::new()).unwrap();
    let textures: Vec<_> = GBufferTarget::GEOMETRY.iter().map(|&target| renderer.gbuffer().texture(target)).collect();
    reset(&mut renderer);

    renderer.begin_light_pass();

    let commands = recorded(&renderer).commands();
    assert_eq!(commands[0], DeviceCommand::DrawBuffers(vec![4]));
    for (unit, texture) in textures.into_iter().enumerate() {
        assert_eq!(commands[unit + 1], DeviceCommand::BindTexture(u32::try_from(unit).unwrap(), texture));
    }
    assert_eq!(&commands[5..], &[DeviceCommand::DepthTest(false), DeviceCommand::Blend(Some(Blend::ADDITIVE))]);
}

#[test]
fn test_null_light_pass_draws_full_bright_quad() {
    let mut renderer = renderer(&RendererConfig::default(), HeadlessDevice::new()).unwrap();
    reset(&mut renderer);

    renderer.null_light_pass();

    let device = recorded(&renderer);
    assert_eq!(device.draw_count(), 1);
    assert!(device
        .commands()
        .contains(&DeviceCommand::SetUniform("lightIntensity".to_string(), UniformValue::Vec4(Vec4::repeat(1.0)))));
}

#[test]
fn test_debug_view_blits_quadrants() {
    let config = RendererConfig::default().with_debug_gbuffer_view(true);
    let mut renderer = renderer(&config, HeadlessDevice::new()).unwrap();
    reset(&mut renderer);

    renderer.render_frame(&Scene::default());

    let blits: Vec<_> = recorded(&renderer)
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::Blit(source, destination, filter) => Some((*source, *destination, *filter)),
            _ => None,
        })
        .collect();
    let full = Rect::sized(200, 100);
    assert_eq!(
        blits,
        vec![
            (full, Rect::new(0, 0, 100, 50), BlitFilter::Linear),
            (full, Rect::new(0, 50, 100, 100), BlitFilter::Linear),
            (full, Rect::new(100, 50, 200, 100), BlitFilter::Linear),
            (full, Rect::new(100, 0, 200, 50), BlitFilter::Linear),
        ]
    );
}

#[test]
fn test_update_composites_final_color_to_screen() {
    let mut renderer = renderer(&RendererConfig::default(), HeadlessDevice::new()).unwrap();
    let framebuffer = renderer.gbuffer().framebuffer();
    reset(&mut renderer);

    renderer.update().unwrap();

    let full = Rect::sized(200, 100);
    let commands = recorded(&renderer).commands();
    assert_eq!(
        commands,
        &[
            DeviceCommand::PushGroup("composite".to_string()),
            DeviceCommand::BindDrawFramebuffer(FramebufferHandle::DEFAULT),
            DeviceCommand::BindReadFramebuffer(framebuffer),
            DeviceCommand::ReadBuffer(4),
            DeviceCommand::Blit(full, full, BlitFilter::Linear),
            DeviceCommand::PopGroup,
        ]
    );
    assert_eq!(renderer.clock().frame_count(), 1);
}

#[test]
fn test_textured_material_selects_variant() {
    let mut renderer = renderer(&RendererConfig::default(), HeadlessDevice::new()).unwrap();
    let mut scene = Scene::default();
    let material = Material {
        diffuse_texture: Some(renderer.gbuffer().texture(GBufferTarget::Diffuse)),
        ..Material::default()
    };
    let crate_box = scene
        .spawn(EntityDesc::new("crate").with_mesh(cube()).with_material(Arc::new(material)))
        .unwrap();
    renderer.queue().submit(crate_box);
    renderer.update().unwrap();
    reset(&mut renderer);

    renderer.render_frame(&scene);

    let device = recorded(&renderer);
    let programs: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::UseProgram(program) => device.program_name(*program),
            _ => None,
        })
        .collect();
    assert_eq!(programs, vec!["gp_d"]);
    assert!(device
        .commands()
        .contains(&DeviceCommand::SetUniform("materialDiffuseTexture".to_string(), UniformValue::TextureUnit(0))));
}

#[test]
fn test_stencil_volumes_can_be_disabled() {
    let config = RendererConfig::default().with_stencil_light_volumes(false);
    let mut renderer = renderer(&config, HeadlessDevice::new()).unwrap();
    let mut scene = Scene::default();
    let lamp = scene
        .spawn(EntityDesc::new("lamp").with_light(Arc::new(Light::spot(Vec4::repeat(1.0), Vec4::new(1.0, 0.0, 0.1, 0.0), 0.6))))
        .unwrap();
    renderer.queue().submit(lamp);
    renderer.update().unwrap();
    reset(&mut renderer);

    renderer.render_frame(&scene);

    assert_eq!(renderer.stats().stencil_volumes, 0);
    assert_eq!(renderer.stats().lights_shaded, 1);
    assert!(!recorded(&renderer)
        .commands()
        .iter()
        .any(|command| matches!(command, DeviceCommand::StencilTest(_))));
}

#[test]
fn test_shader_failure_names_renderer_and_program() {
    let error = renderer(&RendererConfig::default(), HeadlessDevice::new().with_failing_program("lp_spot")).unwrap_err();
    assert!(matches!(error, RenderError::ShaderLoad { .. }));
    assert!(error.to_string().starts_with("headless: Failed to load lp_spot: "));
}

#[test]
fn test_incomplete_framebuffer_is_fatal() {
    let error = renderer(&RendererConfig::default(), HeadlessDevice::new().with_incomplete_framebuffers(36054)).unwrap_err();
    assert_eq!(error.to_string(), "Frame buffer status was not complete: 36054");
}

#[test]
fn test_missing_context_is_reported() {
    let error = renderer(&RendererConfig::default(), HeadlessDevice::new().without_context("no display")).unwrap_err();
    assert!(matches!(error, RenderError::ContextUnavailable(_)));
}

#[test]
fn test_producers_feed_next_frame() {
    let mut renderer = renderer(&RendererConfig::default(), HeadlessDevice::new()).unwrap();
    let mut scene = Scene::default();
    let ids: Vec<_> = (0..8)
        .map(|index| scene.spawn(EntityDesc::new(format!("cube{index}")).with_mesh(cube())).unwrap())
        .collect();

    let handles: Vec<_> = ids
        .chunks(2)
        .map(|chunk| {
            let queue = renderer.queue();
            let chunk = chunk.to_vec();
            thread::spawn(move || queue.submit_batch(chunk))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    renderer.render_frame(&scene);
    assert_eq!(renderer.stats().entities_drawn, 0);

    renderer.update().unwrap();
    renderer.render_frame(&scene);
    assert_eq!(renderer.stats().entities_drawn, 8);

    renderer.update().unwrap();
    renderer.render_frame(&scene);
    assert_eq!(renderer.stats().entities_drawn, 0);
}

#[test]
fn test_window_events_reach_renderer() {
    let window = HeadlessWindow::new(64, 64).with_frame(vec![WindowEvent::Resized(320, 240), WindowEvent::CloseRequested]);
    let mut renderer = Renderer::new(&RendererConfig::default(), Box::new(HeadlessDevice::new()), Box::new(window)).unwrap();

    renderer.update().unwrap();

    assert_eq!(renderer.viewport_size(), (320, 240));
    assert!(renderer.should_close());
    let (width, height, _) = recorded(&renderer).texture_info(renderer.gbuffer().texture(GBufferTarget::FinalColor)).unwrap();
    assert_eq!((width, height), (320, 240));
}
