//! Renderer configuration for application-specific settings
//!
//! This module provides the configuration structure applications use to size
//! the GBuffer and the shadow pool and to tune light-volume classification
//! without hardcoding values in the rendering system itself.

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// Upper bound on cascade splits per directional shadow
///
/// Matches the fixed-size matrix array in the light constant block.
pub const MAX_CASCADE_SPLITS: usize = 3;

/// Configuration for the light pre-pass renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Render surface width in pixels
    pub width: u32,
    /// Render surface height in pixels
    pub height: u32,
    /// Number of spot light shadow maps in the pool
    pub spot_shadow_slots: usize,
    /// Number of directional cascade sets in the pool
    pub cascade_shadow_slots: usize,
    /// Splits per directional cascade set
    pub cascade_splits: usize,
    /// Spot shadow map edge length in texels
    pub spot_shadow_resolution: u32,
    /// Cascade shadow map edge length in texels
    pub cascade_shadow_resolution: u32,
    /// Blend between uniform (0) and logarithmic (1) cascade splits
    pub cascade_split_lambda: f32,
    /// Expansion applied to a point light's radius before the near-plane test
    pub point_volume_scale: f32,
    /// Distance the near plane is pushed forward for the spot volume test
    pub spot_near_plane_bias: f32,
    /// Clear value for the linear depth target (distance beyond the far plane)
    pub depth_clear: f32,
    /// Clear color for the final output
    pub output_clear_color: [f32; 4],
}

impl RendererConfig {
    /// Create a configuration for the given surface size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            spot_shadow_slots: 4,
            cascade_shadow_slots: 1,
            cascade_splits: MAX_CASCADE_SPLITS,
            spot_shadow_resolution: 1024,
            cascade_shadow_resolution: 1024,
            cascade_split_lambda: 0.7,
            point_volume_scale: 1.375,
            spot_near_plane_bias: 3.0,
            depth_clear: 1.0e6,
            output_clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Set surface size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set shadow pool capacity
    pub fn with_shadow_slots(mut self, spot: usize, cascade: usize) -> Self {
        self.spot_shadow_slots = spot;
        self.cascade_shadow_slots = cascade;
        self
    }

    /// Set cascade split count, clamped to `1..=MAX_CASCADE_SPLITS`
    pub fn with_cascade_splits(mut self, splits: usize) -> Self {
        self.cascade_splits = splits.clamp(1, MAX_CASCADE_SPLITS);
        self
    }

    /// Set shadow map resolutions
    pub fn with_shadow_resolution(mut self, spot: u32, cascade: u32) -> Self {
        self.spot_shadow_resolution = spot;
        self.cascade_shadow_resolution = cascade;
        self
    }

    /// Set background clear color [R, G, B, A] (0.0-1.0 range)
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.output_clear_color = color;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.cascade_splits == 0 || self.cascade_splits > MAX_CASCADE_SPLITS {
            return Err(ConfigError::Invalid(format!(
                "cascade_splits must be in 1..={MAX_CASCADE_SPLITS}, got {}",
                self.cascade_splits
            )));
        }
        if self.spot_shadow_resolution == 0 || self.cascade_shadow_resolution == 0 {
            return Err(ConfigError::Invalid("shadow resolutions must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.cascade_split_lambda) {
            return Err(ConfigError::Invalid(format!(
                "cascade_split_lambda must be in [0, 1], got {}",
                self.cascade_split_lambda
            )));
        }
        if self.point_volume_scale < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "point_volume_scale must be at least 1, got {}",
                self.point_volume_scale
            )));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Config for RendererConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RendererConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = RendererConfig::default().with_size(0, 600);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_cascade_splits_clamped() {
        let config = RendererConfig::default().with_cascade_splits(8);
        assert_eq!(config.cascade_splits, MAX_CASCADE_SPLITS);
    }

    #[test]
    fn test_toml_partial_config_uses_defaults() {
        let config = RendererConfig::parse(
            "renderer.toml",
            "width = 640\nheight = 480\nspot_shadow_slots = 1\n",
        )
        .unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.spot_shadow_slots, 1);
        assert_eq!(config.cascade_splits, MAX_CASCADE_SPLITS);
    }

    #[test]
    fn test_ron_config_parses() {
        let config = RendererConfig::parse(
            "renderer.ron",
            "(width: 800, height: 600, point_volume_scale: 1.5)",
        )
        .unwrap();
        assert_eq!((config.width, config.height), (800, 600));
        assert!((config.point_volume_scale - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = RendererConfig::parse("renderer.json", "{}");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
