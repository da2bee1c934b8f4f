//! Light sources
//!
//! A light only describes its color and falloff. Position and direction
//! come from the global transform of the entity carrying it.

use crate::foundation::math::Vec4;

/// Contribution below which a pixel does not get any brighter (one step of an 8-bit channel, rounded up)
const CUTOFF_CONTRIBUTION: f32 = 5.0 / 256.0;

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Uniform light from everywhere
    Ambient,
    /// Parallel rays along the entity's forward direction (like sunlight)
    Directional,
    /// Omnidirectional light at the entity's position (like a lightbulb)
    Point,
    /// Cone of light along the entity's forward direction (like a flashlight)
    Spot,
}

/// Light source
///
/// `intensity` is an RGB color with the brightness in the fourth
/// component. `attenuation` holds the constant, linear and quadratic
/// falloff terms: at distance `d` the contribution is scaled by
/// `1 / (a.x + a.y * d + a.z * d^2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    light_type: LightType,
    intensity: Vec4,
    attenuation: Vec4,
    angle: f32,
    cutoff_radius: f32,
}

impl Light {
    /// Create an ambient light
    pub fn ambient(intensity: Vec4) -> Self {
        Self::with_type(LightType::Ambient, intensity, Vec4::new(1.0, 0.0, 0.0, 0.0), 0.0)
    }

    /// Create a directional light
    pub fn directional(intensity: Vec4) -> Self {
        Self::with_type(LightType::Directional, intensity, Vec4::new(1.0, 0.0, 0.0, 0.0), 0.0)
    }

    /// Create a point light
    pub fn point(intensity: Vec4, attenuation: Vec4) -> Self {
        Self::with_type(LightType::Point, intensity, attenuation, 0.0)
    }

    /// Create a spot light with the given full cone angle in radians
    pub fn spot(intensity: Vec4, attenuation: Vec4, angle: f32) -> Self {
        Self::with_type(LightType::Spot, intensity, attenuation, angle)
    }

    fn with_type(light_type: LightType, intensity: Vec4, attenuation: Vec4, angle: f32) -> Self {
        let mut light = Self {
            light_type,
            intensity,
            attenuation,
            angle,
            cutoff_radius: f32::INFINITY,
        };
        light.calculate_cutoff_radius();
        light
    }

    /// Light type
    pub const fn light_type(&self) -> LightType {
        self.light_type
    }

    /// RGB color and brightness
    pub const fn intensity(&self) -> Vec4 {
        self.intensity
    }

    /// Set the intensity; recalculates the cutoff radius
    pub fn set_intensity(&mut self, intensity: Vec4) {
        self.intensity = intensity;
        self.calculate_cutoff_radius();
        log::trace!("Light intensity updated to: {:?}", intensity);
    }

    /// Set only the brightness; recalculates the cutoff radius
    pub fn set_brightness(&mut self, brightness: f32) {
        self.intensity.w = brightness;
        self.calculate_cutoff_radius();
    }

    /// Falloff terms
    pub const fn attenuation(&self) -> Vec4 {
        self.attenuation
    }

    /// Set the falloff terms; recalculates the cutoff radius
    pub fn set_attenuation(&mut self, attenuation: Vec4) {
        self.attenuation = attenuation;
        self.calculate_cutoff_radius();
    }

    /// Full cone angle of a spot light
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Set the full cone angle of a spot light
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Cosine of half the cone angle, as the spot shader expects it
    pub fn cosine_half_angle(&self) -> f32 {
        (self.angle * 0.5).cos()
    }

    /// Distance beyond which the light no longer contributes
    ///
    /// Infinite for ambient and directional lights, and for point or spot
    /// lights without linear or quadratic falloff.
    pub const fn cutoff_radius(&self) -> f32 {
        self.cutoff_radius
    }

    /// Whether the light is drawn as a bounded volume
    pub const fn has_volume(&self) -> bool {
        matches!(self.light_type, LightType::Point | LightType::Spot)
    }

    fn calculate_cutoff_radius(&mut self) {
        if !self.has_volume() {
            self.cutoff_radius = f32::INFINITY;
            return;
        }
        // Solve a.x + a.y * d + a.z * d^2 = brightness / cutoff for d
        let target = self.intensity.w / CUTOFF_CONTRIBUTION;
        let (a, b, c) = (self.attenuation.z, self.attenuation.y, self.attenuation.x - target);
        self.cutoff_radius = if a > 0.0 {
            let discriminant = b.mul_add(b, -4.0 * a * c);
            if discriminant < 0.0 {
                0.0
            } else {
                ((-b + discriminant.sqrt()) / (2.0 * a)).max(0.0)
            }
        } else if b > 0.0 {
            (-c / b).max(0.0)
        } else {
            f32::INFINITY
        };
    }
}
