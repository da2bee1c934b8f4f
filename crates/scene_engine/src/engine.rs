//! Engine loop
//!
//! Ties a [`Scene`] to a [`Renderer`] and runs an [`Application`] against
//! them until the renderer is asked to close.

use log::info;
use thiserror::Error;

use crate::application::{AppError, Application};
use crate::config::{ConfigError, EngineConfig};
use crate::foundation::logging;
use crate::input::WindowBackend;
use crate::render::{GraphicsDevice, RenderError, Renderer};
use crate::scene::{Scene, SceneError};

/// Top-level engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Renderer initialization or frame failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Error returned by the application
    #[error("Application error: {0}")]
    Application(#[from] AppError),
}

/// Main engine struct
pub struct Engine {
    /// Entity hierarchy and spatial index
    pub scene: Scene,

    /// Deferred renderer, window and input
    pub renderer: Renderer,

    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entities", &self.scene.len())
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine on the given backends
    ///
    /// Validates the configuration, initializes logging and sets up the
    /// renderer. Any failure here is fatal to the application.
    pub fn new(
        config: EngineConfig,
        device: Box<dyn GraphicsDevice>,
        window: Box<dyn WindowBackend>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        logging::init(&config.log_level);
        info!("Initializing engine \"{}\"", config.window.title);

        let scene = Scene::from_config(&config.scene);
        let renderer = Renderer::new(&config.renderer, device, window)?;
        Ok(Self { scene, renderer, config })
    }

    /// Configuration the engine was created with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the main loop with the given application
    ///
    /// The close flag is checked at the top of every iteration, so a close
    /// requested during a frame lets that frame finish.
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.initialize(self)?;
        info!("Starting main loop");

        while !self.renderer.should_close() {
            let delta_time = self.renderer.delta_time();
            app.update(self, delta_time)?;
            self.renderer.render_frame(&self.scene);
            self.renderer.update()?;
        }

        app.cleanup(self);
        info!("Engine shutdown after {} frames", self.renderer.clock().frame_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::RendererConfig;
    use crate::foundation::math::{Vec3, Vec4};
    use crate::input::HeadlessWindow;
    use crate::render::device::{ClearMask, DeviceCommand, MeshHandle, UniformValue};
    use crate::render::{HeadlessDevice, Light, Mesh};
    use crate::scene::{EntityDesc, EntityId};
    use crate::spatial::AxisAlignedBox;

    struct Counter {
        frames: u32,
        limit: u32,
        cleaned: bool,
        lamp: Option<EntityId>,
    }

    impl Application for Counter {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            let lamp = engine.scene.spawn(
                EntityDesc::new("lamp")
                    .with_translation(Vec3::new(0.0, 2.0, 0.0))
                    .with_light(Arc::new(Light::ambient(Vec4::repeat(0.2)))),
            )?;
            self.lamp = Some(lamp);
            Ok(())
        }

        fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.frames += 1;
            if let Some(lamp) = self.lamp {
                engine.renderer.queue().submit(lamp);
            }
            if self.frames == self.limit {
                engine.renderer.close();
            }
            Ok(())
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned = true;
        }
    }

    struct Unlit {
        frames: u32,
        crate_entity: Option<EntityId>,
    }

    impl Application for Unlit {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            let mesh = Arc::new(Mesh::new(
                "crate",
                MeshHandle(900),
                AxisAlignedBox::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5)),
            ));
            self.crate_entity = Some(engine.scene.spawn(EntityDesc::new("crate").with_mesh(mesh))?);
            engine.renderer.set_null_light_fallback(true);
            Ok(())
        }

        fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.frames += 1;
            if let Some(id) = self.crate_entity {
                engine.renderer.queue().submit(id);
            }
            if self.frames == 2 {
                engine.renderer.close();
            }
            Ok(())
        }
    }

    fn engine(config: EngineConfig) -> Result<Engine, EngineError> {
        let window = HeadlessWindow::from_config(&config.window);
        Engine::new(config, Box::new(HeadlessDevice::new()), Box::new(window))
    }

    #[test]
    fn test_run_stops_after_close() {
        let mut engine = engine(EngineConfig::default()).unwrap();
        let mut app = Counter {
            frames: 0,
            limit: 3,
            cleaned: false,
            lamp: None,
        };
        engine.run(&mut app).unwrap();

        assert_eq!(app.frames, 3);
        assert!(app.cleaned);
        assert_eq!(engine.renderer.clock().frame_count(), 3);
        assert_eq!(engine.renderer.stats().lights_shaded, 1);
    }

    #[test]
    fn test_unlit_scene_is_lit_before_composite() {
        let mut engine = engine(EngineConfig::default()).unwrap();
        let mut app = Unlit {
            frames: 0,
            crate_entity: None,
        };
        engine.run(&mut app).unwrap();

        let device = engine.renderer.device().as_any().downcast_ref::<HeadlessDevice>().unwrap();
        let commands = device.commands();
        let composite = commands
            .iter()
            .rposition(|command| *command == DeviceCommand::PushGroup("composite".to_string()))
            .unwrap();
        let final_clear = commands[..composite]
            .iter()
            .rposition(|command| *command == DeviceCommand::Clear(ClearMask::COLOR))
            .unwrap();
        let between = &commands[final_clear..composite];

        assert!(between.contains(&DeviceCommand::DrawMesh(MeshHandle(900))));
        assert!(between.contains(&DeviceCommand::SetUniform(
            "lightIntensity".to_string(),
            UniformValue::Vec4(Vec4::repeat(1.0))
        )));
        let light_draw = between
            .iter()
            .rposition(|command| matches!(command, DeviceCommand::DrawMesh(_)))
            .unwrap();
        assert!(between[..light_draw].contains(&DeviceCommand::PushGroup("light".to_string())));
        assert_eq!(engine.renderer.stats().lights_shaded, 0);
    }

    #[test]
    fn test_unlit_scene_without_fallback_has_no_light_pass() {
        let mut engine = engine(EngineConfig::default()).unwrap();
        let mut app = Unlit {
            frames: 0,
            crate_entity: None,
        };
        app.initialize(&mut engine).unwrap();
        engine.renderer.set_null_light_fallback(false);
        engine.renderer.queue().submit(app.crate_entity.unwrap());
        engine.renderer.update().unwrap();
        engine.renderer.render_frame(&engine.scene);

        let device = engine.renderer.device().as_any().downcast_ref::<HeadlessDevice>().unwrap();
        assert!(!device.commands().contains(&DeviceCommand::PushGroup("light".to_string())));
        assert_eq!(engine.renderer.stats().entities_drawn, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.window.width = 0;
        assert!(matches!(engine(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_shader_failure_is_fatal() {
        let config = EngineConfig::default().with_renderer(RendererConfig::default());
        let window = HeadlessWindow::from_config(&config.window);
        let device = HeadlessDevice::new().with_failing_program("gp_dsn");
        let error = Engine::new(config, Box::new(device), Box::new(window)).unwrap_err();
        assert!(error.to_string().contains("Failed to load gp_dsn"));
    }
}
