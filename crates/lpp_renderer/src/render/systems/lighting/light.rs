//! Light sources as the light pre-pass renderer sees them
//!
//! Lights are owned by the application's light manager; the renderer only
//! borrows them for the duration of a frame.

use crate::foundation::math::{constants, Transform, Vec3};
use crate::render::{RenderError, RenderResult};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LightType {
    /// Omnidirectional light with a finite radius
    Point = 0,
    /// Cone of light with a finite radius
    Spot = 1,
    /// Parallel rays with no finite extent (sun, moon)
    Directional = 2,
}

impl TryFrom<u8> for LightType {
    type Error = RenderError;

    /// Decode a raw light discriminant from an external light manager
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Point),
            1 => Ok(Self::Spot),
            2 => Ok(Self::Directional),
            other => Err(RenderError::UnsupportedLightType(other)),
        }
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// World transform; forward (-Z) is the light direction for spot and
    /// directional lights
    pub transform: Transform,
    /// Falloff extent for point/spot lights
    pub radius: f32,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Spot cone half-angle in radians
    pub spot_angle: f32,
    /// Spot falloff exponent
    pub spot_exponent: f32,
    /// Whether this light asks for a shadow map
    pub cast_shadows: bool,
    /// Constant depth bias applied when sampling the shadow map
    pub shadow_depth_bias: f32,
}

impl Light {
    /// Create a point light
    pub fn point(position: Vec3, radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Point,
            transform: Transform::from_position(position),
            radius,
            color,
            intensity,
            spot_angle: 0.0,
            spot_exponent: 0.0,
            cast_shadows: false,
            shadow_depth_bias: 0.0,
        }
    }

    /// Create a spot light
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        radius: f32,
        spot_angle: f32,
        spot_exponent: f32,
        color: Vec3,
        intensity: f32,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            transform: Transform::looking_along(position, direction),
            radius,
            color,
            intensity,
            spot_angle,
            spot_exponent,
            cast_shadows: false,
            shadow_depth_bias: 0.0,
        }
    }

    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            transform: Transform::looking_along(Vec3::zeros(), direction),
            radius: 0.0,
            color,
            intensity,
            spot_angle: 0.0,
            spot_exponent: 0.0,
            cast_shadows: false,
            shadow_depth_bias: 0.0,
        }
    }

    /// Request a shadow map with the given depth bias
    pub fn with_shadows(mut self, depth_bias: f32) -> Self {
        self.cast_shadows = true;
        self.shadow_depth_bias = depth_bias;
        self
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// World direction the light points in
    pub fn direction(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Radius of the spot cone's base disc
    pub fn spot_base_radius(&self) -> f32 {
        self.radius * self.spot_angle.tan()
    }

    /// Check the type-specific invariants
    pub fn validate(&self) -> RenderResult<()> {
        match self.light_type {
            LightType::Point | LightType::Spot if !(self.radius > 0.0) => {
                return Err(RenderError::InvalidLight(format!(
                    "{:?} light radius must be positive, got {}",
                    self.light_type, self.radius
                )));
            }
            _ => {}
        }
        if self.light_type == LightType::Spot
            && !(self.spot_angle > 0.0 && self.spot_angle < constants::HALF_PI)
        {
            return Err(RenderError::InvalidLight(format!(
                "spot angle must be in (0, 90) degrees, got {:.2}",
                self.spot_angle.to_degrees()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unknown_discriminant_is_fatal() {
        assert_eq!(LightType::try_from(1).unwrap(), LightType::Spot);
        assert!(matches!(LightType::try_from(7), Err(RenderError::UnsupportedLightType(7))));
    }

    #[test]
    fn test_spot_direction_is_preserved() {
        let direction = Vec3::new(0.0, -1.0, -1.0).normalize();
        let light = Light::spot(Vec3::new(0.0, 5.0, 0.0), direction, 10.0, 0.5, 8.0, Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert_relative_eq!(light.direction(), direction, epsilon = 1e-5);
    }

    #[test]
    fn test_validation_rejects_bad_radius_and_angle() {
        let point = Light::point(Vec3::zeros(), 0.0, Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert!(matches!(point.validate(), Err(RenderError::InvalidLight(_))));

        let wide = Light::spot(Vec3::zeros(), -Vec3::y(), 5.0, 1.6, 1.0, Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert!(wide.validate().is_err());

        let sun = Light::directional(-Vec3::y(), Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert!(sun.validate().is_ok());
    }

    #[test]
    fn test_nan_radius_rejected() {
        let point = Light::point(Vec3::zeros(), f32::NAN, Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert!(point.validate().is_err());
    }
}
