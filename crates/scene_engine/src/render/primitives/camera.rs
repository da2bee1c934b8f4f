//! # Camera projection
//!
//! A camera only owns its projection parameters. Where it sits and where it
//! looks is the global transform of the entity carrying it; the renderer
//! builds the view matrix from that entity.

use crate::foundation::math::{Mat4, Vec2};

/// Default vertical field of view in radians (70 degrees)
pub const DEFAULT_FIELD_OF_VIEW: f32 = 1.221_730_5;

/// Projection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionType {
    /// Parallel projection of a `width` x `height` box
    Orthographic,
    /// Perspective projection with a vertical field of view
    Perspective,
}

/// Camera projection parameters
///
/// # Coordinate System
/// Right-handed, Y-up view space looking down -Z, which matches the
/// forward direction of an entity's rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection type
    pub projection: ProjectionType,
    /// Vertical field of view in radians (perspective only)
    pub field_of_view: f32,
    /// View volume width (orthographic only)
    pub width: f32,
    /// View volume height (orthographic only)
    pub height: f32,
    /// Distance to the near clipping plane
    pub near_plane: f32,
    /// Distance to the far clipping plane
    pub far_plane: f32,
    angles: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(DEFAULT_FIELD_OF_VIEW, 0.1, 100.0)
    }
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `field_of_view` - Vertical field of view in radians
    /// * `near_plane` - Distance to near clipping plane (must be > 0)
    /// * `far_plane` - Distance to far clipping plane (must be > near)
    pub fn perspective(field_of_view: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            projection: ProjectionType::Perspective,
            field_of_view,
            width: 1.0,
            height: 1.0,
            near_plane,
            far_plane,
            angles: Vec2::zeros(),
        }
    }

    /// Create an orthographic camera showing a `width` x `height` area
    pub fn orthographic(width: f32, height: f32, near_plane: f32, far_plane: f32) -> Self {
        Self {
            projection: ProjectionType::Orthographic,
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            width,
            height,
            near_plane,
            far_plane,
            angles: Vec2::zeros(),
        }
    }

    /// Accumulated yaw (x) and pitch (y) from mouse input
    pub const fn angles(&self) -> Vec2 {
        self.angles
    }

    /// Add a mouse delta to the accumulated angles
    ///
    /// Pitch is clamped to straight up or down, yaw wraps around.
    pub fn add_mouse(&mut self, delta: Vec2) {
        use std::f32::consts::{FRAC_PI_2, TAU};
        self.angles.x = (self.angles.x + delta.x).rem_euclid(TAU);
        self.angles.y = (self.angles.y + delta.y).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Projection matrix for a viewport of the given size in pixels
    pub fn projection_matrix(&self, viewport_width: u32, viewport_height: u32) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective => {
                #[allow(clippy::cast_precision_loss)]
                let aspect = viewport_width.max(1) as f32 / viewport_height.max(1) as f32;
                Mat4::new_perspective(aspect, self.field_of_view, self.near_plane, self.far_plane)
            }
            ProjectionType::Orthographic => {
                let half_width = self.width * 0.5;
                let half_height = self.height * 0.5;
                Mat4::new_orthographic(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near_plane,
                    self.far_plane,
                )
            }
        }
    }
}
