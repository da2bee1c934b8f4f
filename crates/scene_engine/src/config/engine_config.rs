//! Engine, window, scene and renderer settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::spatial::AxisAlignedBox;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Scene graph and octree settings
    pub scene: SceneConfig,
    /// Deferred renderer settings
    pub renderer: RendererConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            scene: SceneConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Set the log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the window settings
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Set the scene settings
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Set the renderer settings
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        self.window.validate()?;
        self.scene.validate()?;
        self.renderer.validate()
    }
}

/// Window settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title, also used as the renderer name in error messages
    pub title: String,
    /// Initial width in pixels
    pub width: u32,
    /// Initial height in pixels
    pub height: u32,
    /// Whether to start fullscreen
    pub fullscreen: bool,
    /// Whether buffer swaps wait for vertical sync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Engine".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

impl WindowConfig {
    /// Create a window config with the given title and size
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Set fullscreen mode
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Set vsync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Validate window settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid("window title must not be empty".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Scene graph and octree settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Minimum corner of the octree root
    pub octree_min: [f32; 3],
    /// Maximum corner of the octree root
    pub octree_max: [f32; 3],
    /// Nodes whose smallest side is at most this size are not subdivided
    pub subdivision_threshold: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            octree_min: [-1000.0; 3],
            octree_max: [1000.0; 3],
            subdivision_threshold: 5.0,
        }
    }
}

impl SceneConfig {
    /// Set the octree root bounds
    pub fn with_bounds(mut self, min: [f32; 3], max: [f32; 3]) -> Self {
        self.octree_min = min;
        self.octree_max = max;
        self
    }

    /// Set the subdivision threshold
    pub fn with_subdivision_threshold(mut self, threshold: f32) -> Self {
        self.subdivision_threshold = threshold;
        self
    }

    /// Octree root bounds as a box
    pub fn octree_bounds(&self) -> AxisAlignedBox {
        AxisAlignedBox::new(Vec3::from(self.octree_min), Vec3::from(self.octree_max))
    }

    /// Validate scene settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.octree_bounds();
        if !bounds.is_valid() || bounds.min_extent() <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "octree bounds must have positive size, got {:?} .. {:?}",
                self.octree_min, self.octree_max
            )));
        }
        if self.subdivision_threshold.is_nan() || self.subdivision_threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "subdivision threshold must be positive, got {}",
                self.subdivision_threshold
            )));
        }
        Ok(())
    }
}

/// Deferred renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Directory containing the shader sources
    pub shader_dir: PathBuf,
    /// Mark point and spot light volumes in the stencil buffer before shading
    pub stencil_light_volumes: bool,
    /// Show the four geometry buffers in screen quadrants after each frame
    pub debug_gbuffer_view: bool,
    /// Draw geometry as wireframe
    pub wireframe: bool,
    /// Light frames that gathered no light with full-bright ambient
    pub null_light_fallback: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            stencil_light_volumes: true,
            debug_gbuffer_view: false,
            wireframe: false,
            null_light_fallback: false,
        }
    }
}

impl RendererConfig {
    /// Set the shader directory
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    /// Enable or disable stencil-marked light volumes
    pub fn with_stencil_light_volumes(mut self, enabled: bool) -> Self {
        self.stencil_light_volumes = enabled;
        self
    }

    /// Enable or disable the geometry buffer debug view
    pub fn with_debug_gbuffer_view(mut self, enabled: bool) -> Self {
        self.debug_gbuffer_view = enabled;
        self
    }

    /// Enable or disable wireframe mode
    pub fn with_wireframe(mut self, enabled: bool) -> Self {
        self.wireframe = enabled;
        self
    }

    /// Enable or disable the full-bright pass for frames without lights
    pub fn with_null_light_fallback(mut self, enabled: bool) -> Self {
        self.null_light_fallback = enabled;
        self
    }

    /// Resolve the shader directory against a few common locations
    ///
    /// Useful for applications run from different working directories.
    /// Falls back to the configured path when none of the candidates exist.
    pub fn resolve_shader_dir(&self) -> PathBuf {
        if self.shader_dir.is_absolute() {
            return self.shader_dir.clone();
        }
        let prefixes = ["", "resources", "..", "target"];
        prefixes
            .iter()
            .map(|prefix| Path::new(prefix).join(&self.shader_dir))
            .find(|candidate| candidate.is_dir())
            .unwrap_or_else(|| self.shader_dir.clone())
    }

    /// Validate renderer settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shader_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("shader directory must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scene_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("engine.toml");
        let config = EngineConfig::default()
            .with_log_level("debug")
            .with_window(WindowConfig::new("Viewer", 800, 600).with_vsync(false))
            .with_scene(SceneConfig::default().with_subdivision_threshold(2.5));

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let path = temp_path("partial.ron");
        std::fs::write(&path, "(log_level: \"warn\", window: (width: 640, height: 480))").unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.log_level, "warn");
        assert_eq!(loaded.window.width, 640);
        assert_eq!(loaded.window.title, WindowConfig::default().title);
        assert_eq!(loaded.scene, SceneConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = EngineConfig::default().save_to_file(temp_path("engine.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_window = EngineConfig::default().with_window(WindowConfig::new("x", 0, 10));
        assert!(matches!(zero_window.validate(), Err(ConfigError::Invalid(_))));

        let inverted = EngineConfig::default()
            .with_scene(SceneConfig::default().with_bounds([1.0; 3], [-1.0; 3]));
        assert!(matches!(inverted.validate(), Err(ConfigError::Invalid(_))));

        let threshold = EngineConfig::default()
            .with_scene(SceneConfig::default().with_subdivision_threshold(0.0));
        assert!(threshold.validate().is_err());

        let level = EngineConfig::default().with_log_level("loud");
        assert!(level.validate().is_err());
    }
}
