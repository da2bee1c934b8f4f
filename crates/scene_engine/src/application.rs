//! Application trait and lifecycle management

use thiserror::Error;

use crate::engine::Engine;
use crate::render::RenderError;
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to drive a scene with the engine loop.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the first frame. Build the scene, register event
    /// handlers and pick the camera here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before rendering. Entities submitted to the render
    /// queue here are drawn on the next frame.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once after the loop ends.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Renderer operation failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
