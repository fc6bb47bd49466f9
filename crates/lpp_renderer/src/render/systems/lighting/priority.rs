//! Per-frame light ordering
//!
//! Lights closer to the camera and with a larger radius win. The order is
//! what decides who gets a shadow slot when the pool runs dry.

use crate::foundation::math::Vec3;
use crate::render::systems::shadows::ShadowSlot;

use super::light::Light;

/// Scale applied to `radius / distance` so priorities read as whole numbers
pub const PRIORITY_SCALE: f32 = 1000.0;

/// A light prepared for this frame
#[derive(Debug, Clone, PartialEq)]
pub struct LightEntry<'a> {
    /// The source light, borrowed for the frame
    pub light: &'a Light,
    /// Distance to the camera, clamped to at least 1
    pub distance: f32,
    /// Sort key, higher first
    pub priority: f32,
    /// Shadow flag after admission
    pub cast_shadows: bool,
    /// Pool slot granted for this frame
    pub shadow: Option<ShadowSlot>,
}

impl<'a> LightEntry<'a> {
    /// Compute distance and priority for a light
    pub fn new(light: &'a Light, camera_position: &Vec3) -> Self {
        let distance = (light.position() - camera_position).norm().max(1.0);
        Self {
            light,
            distance,
            priority: PRIORITY_SCALE * light.radius / distance,
            cast_shadows: light.cast_shadows,
            shadow: None,
        }
    }

    /// Whether the light will be drawn with a shadow map
    pub fn is_shadowed(&self) -> bool {
        self.cast_shadows && self.shadow.is_some()
    }
}

/// Builds and orders light entries
pub struct LightPrioritySorter;

impl LightPrioritySorter {
    /// Entries for `lights`, highest priority first
    ///
    /// The sort is stable and uses a total order on `f32`, so equal
    /// priorities keep their input order from frame to frame.
    pub fn sort<'a>(lights: &'a [Light], camera_position: &Vec3) -> Vec<LightEntry<'a>> {
        let mut entries: Vec<LightEntry<'a>> = lights
            .iter()
            .map(|light| LightEntry::new(light, camera_position))
            .collect();
        entries.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn white() -> Vec3 {
        Vec3::new(1.0, 1.0, 1.0)
    }

    #[test]
    fn test_priority_formula() {
        let light = Light::point(Vec3::new(0.0, 0.0, -10.0), 50.0, white(), 1.0);
        let entry = LightEntry::new(&light, &Vec3::zeros());
        assert_relative_eq!(entry.distance, 10.0);
        assert_relative_eq!(entry.priority, 5000.0);
    }

    #[test]
    fn test_distance_clamped_to_one() {
        let light = Light::point(Vec3::new(0.0, 0.25, 0.0), 2.0, white(), 1.0);
        let entry = LightEntry::new(&light, &Vec3::zeros());
        assert_relative_eq!(entry.distance, 1.0);
        assert_relative_eq!(entry.priority, 2000.0);
    }

    #[test]
    fn test_sort_is_non_increasing() {
        let lights = vec![
            Light::point(Vec3::new(0.0, 0.0, 1000.0), 50.0, white(), 1.0),
            Light::directional(-Vec3::y(), white(), 1.0),
            Light::point(Vec3::new(0.0, 0.0, 10.0), 50.0, white(), 1.0),
            Light::point(Vec3::new(0.0, 0.0, 40.0), 5.0, white(), 1.0),
        ];
        let entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        assert_eq!(entries.len(), 4);
        assert!(entries.windows(2).all(|w| w[0].priority >= w[1].priority));
        assert!(std::ptr::eq(entries[0].light, &lights[2]));
    }

    #[test]
    fn test_equal_priorities_keep_input_order() {
        let lights = vec![
            Light::point(Vec3::new(10.0, 0.0, 0.0), 5.0, white(), 1.0),
            Light::point(Vec3::new(-10.0, 0.0, 0.0), 5.0, white(), 1.0),
            Light::point(Vec3::new(0.0, 10.0, 0.0), 5.0, white(), 1.0),
        ];
        let entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        for (entry, light) in entries.iter().zip(lights.iter()) {
            assert!(std::ptr::eq(entry.light, light));
        }
    }
}
