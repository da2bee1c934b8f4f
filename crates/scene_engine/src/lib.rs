//! # Scene Engine
//!
//! A 3D scene runtime: an entity hierarchy with transform propagation, an
//! octree spatial index kept in sync with it, and a deferred rendering
//! pipeline driven through a backend-agnostic graphics device.
//!
//! ## Features
//!
//! - **Scene graph**: scale/rotation/translation transforms composed down the
//!   hierarchy, with global bounding boxes and change notifications
//! - **Octree**: loose insertion by bounding box, area queries, cheap
//!   repositioning of moved entities
//! - **Deferred rendering**: geometry, stencil and light passes over a
//!   five-target geometry buffer
//! - **Headless backends**: every GPU and window call can be recorded and
//!   asserted without a display
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let root = engine.scene.spawn(EntityDesc::new("root").indexed(true))?;
//!         engine.renderer.queue().submit(root);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         engine.renderer.close();
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let window = HeadlessWindow::from_config(&config.window);
//!     let mut engine = Engine::new(config, Box::new(HeadlessDevice::new()), Box::new(window))?;
//!     engine.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod events;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;
pub mod spatial;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, RendererConfig, SceneConfig, WindowConfig},
        events::{Event, EventArg, EventSystem, EventType},
        foundation::math::{Mat4, Quat, Sqt, Vec2, Vec3, Vec4},
        input::{HeadlessWindow, InputState, KeyCode, WindowBackend, WindowEvent},
        render::{
            Camera, EntityQueue, GraphicsDevice, HeadlessDevice, Light, LightType, Material, Mesh, RenderError,
            Renderer,
        },
        scene::{Entity, EntityDesc, EntityId, ImportedEntity, ImportedScene, Scene, SceneError},
        spatial::{AxisAlignedBox, Octree},
        AppError, Application, Engine, EngineError,
    };
}
