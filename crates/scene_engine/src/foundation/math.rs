//! Math utilities and types
//!
//! Provides the nalgebra aliases used across the engine, the `Sqt`
//! (scale/rotation/translation) transform and the `MatrixStack` used while
//! walking the scene hierarchy.

use std::ops::{Mul, MulAssign, Rem, RemAssign};

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Local forward direction (-Z)
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Local right direction (+X)
pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Local up direction (+Y)
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Scale, rotation and translation
///
/// The matrix form is `T * R * S`. Composing two transforms with `*` yields
/// "apply the right operand first, then the left one"; the rotation of the
/// result is renormalised so repeated composition does not drift away from
/// unit length.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sqt {
    /// Scale factors
    pub scale: Vec3,

    /// Rotation quaternion (always unit length)
    pub rotation: Quat,

    /// Translation
    pub translation: Vec3,
}

impl Default for Sqt {
    fn default() -> Self {
        Self::identity()
    }
}

impl Sqt {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Quat::identity(),
            translation: Vec3::zeros(),
        }
    }

    /// Create a transform from its three parts
    pub const fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self { scale, rotation, translation }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::identity() }
    }

    /// Create a transform with only a rotation
    pub fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, ..Self::identity() }
    }

    /// Create a transform with only a scale
    pub fn from_scale(scale: Vec3) -> Self {
        Self { scale, ..Self::identity() }
    }

    /// Create a rotation-only transform from yaw (Y), pitch (X) and roll (Z) angles in radians
    pub fn from_yaw_pitch_roll(yaw: f32, pitch: f32, roll: f32) -> Self {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), yaw)
            * Quat::from_axis_angle(&Vec3::x_axis(), pitch)
            * Quat::from_axis_angle(&Vec3::z_axis(), roll);
        Self::from_rotation(rotation)
    }

    /// Convert to a transformation matrix (`T * R * S`)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.rotation * point.component_mul(&self.scale) + self.translation
    }

    /// Compose two transforms: `other` is applied first, then `self`
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let mut rotation = self.rotation * other.rotation;
        rotation.renormalize();
        Self {
            scale: self.scale.component_mul(&other.scale),
            rotation,
            translation: self.transform_point(&other.translation),
        }
    }

    /// Inverse transform
    ///
    /// Exact for uniform scale. A zero scale component maps to zero instead
    /// of infinity.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let scale = self.scale.map(|s| if s == 0.0 { 0.0 } else { 1.0 / s });
        let rotation = self.rotation.inverse();
        let translation = (rotation * -self.translation).component_mul(&scale);
        Self { scale, rotation, translation }
    }

    /// Interpolate between two transforms
    ///
    /// Scale and translation are linearly interpolated, the rotation is
    /// spherically interpolated (falling back to a normalised lerp when the
    /// two rotations are opposite).
    pub fn interpolate(a: &Self, b: &Self, t: f32) -> Self {
        let rotation = a
            .rotation
            .try_slerp(&b.rotation, t, f32::EPSILON)
            .unwrap_or_else(|| a.rotation.nlerp(&b.rotation, t));
        Self {
            scale: a.scale.lerp(&b.scale, t),
            rotation,
            translation: a.translation.lerp(&b.translation, t),
        }
    }

    /// Forward direction of this transform's rotation
    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    /// Right direction of this transform's rotation
    pub fn right(&self) -> Vec3 {
        self.rotation * RIGHT
    }

    /// Up direction of this transform's rotation
    pub fn up(&self) -> Vec3 {
        self.rotation * UP
    }
}

impl Mul for Sqt {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

impl MulAssign for Sqt {
    /// `a *= b` is `a = a * b`
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.compose(&rhs);
    }
}

impl Rem for Sqt {
    type Output = Self;

    /// Reverse composition: `a % b` is `b * a`
    fn rem(self, rhs: Self) -> Self {
        rhs.compose(&self)
    }
}

impl RemAssign for Sqt {
    /// `a %= b` is `a = b * a`
    fn rem_assign(&mut self, rhs: Self) {
        *self = rhs.compose(self);
    }
}

impl From<Sqt> for Mat4 {
    fn from(sqt: Sqt) -> Self {
        sqt.to_matrix()
    }
}

/// Stack of accumulated transformation matrices
///
/// The bottom of the stack is always the identity, so `top` never fails.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    stack: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Create a stack holding only the identity
    pub fn new() -> Self {
        Self { stack: vec![Mat4::identity()] }
    }

    /// Push `top * matrix` and return the new top
    pub fn push(&mut self, matrix: &Mat4) -> Mat4 {
        let composed = self.top() * matrix;
        self.stack.push(composed);
        composed
    }

    /// Push a matrix as-is, ignoring the current top
    pub fn push_absolute(&mut self, matrix: Mat4) {
        self.stack.push(matrix);
    }

    /// Pop the top matrix; the identity at the bottom is never removed
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Current accumulated matrix
    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or_else(Mat4::identity)
    }

    /// Number of pushed matrices (excluding the identity)
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }
}

/// Translation column of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_matrix() {
        assert_relative_eq!(Sqt::identity().to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_compose_applies_right_first() {
        let move_x = Sqt::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let turn = Sqt::from_rotation(Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2));

        // Translate first, then rotate the translated point about Y
        let composed = turn * move_x;
        assert_relative_eq!(composed.translation, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);

        // Rotate first, then translate
        let composed = move_x * turn;
        assert_relative_eq!(composed.translation, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_compose_matches_matrix_product() {
        let a = Sqt::new(
            Vec3::new(2.0, 2.0, 2.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.3),
            Vec3::new(1.0, -2.0, 3.0),
        );
        let b = Sqt::new(
            Vec3::new(0.5, 0.5, 0.5),
            Quat::from_axis_angle(&Vec3::x_axis(), 1.1),
            Vec3::new(-4.0, 0.5, 2.0),
        );
        assert_relative_eq!((a * b).to_matrix(), a.to_matrix() * b.to_matrix(), epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Sqt::new(
            Vec3::new(3.0, 3.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(5.0, 1.0, -2.0),
        );
        let round_trip = t * t.inverse();
        assert_relative_eq!(round_trip.to_matrix(), Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_stays_unit_after_many_compositions() {
        let step = Sqt::from_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 0.01));
        let mut acc = Sqt::identity();
        for _ in 0..10_000 {
            acc *= step;
        }
        assert_relative_eq!(acc.rotation.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = Sqt::from_translation(Vec3::zeros());
        let b = Sqt::new(
            Vec3::new(3.0, 3.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        let mid = Sqt::interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid.translation, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(mid.scale, Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(mid.rotation.angle(), FRAC_PI_2 / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_directions_follow_rotation() {
        let t = Sqt::from_yaw_pitch_roll(FRAC_PI_2, 0.0, 0.0);
        assert_relative_eq!(t.forward(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(t.right(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(t.up(), UP, epsilon = 1e-6);
    }

    #[test]
    fn test_matrix_stack() {
        let mut stack = MatrixStack::new();
        let a = Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0));
        let b = Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0));
        stack.push(&a);
        let top = stack.push(&b);
        assert_relative_eq!(translation_of(&top), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(stack.depth(), 2);
        stack.pop();
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 0);
        assert_relative_eq!(stack.top(), Mat4::identity());
    }
}
