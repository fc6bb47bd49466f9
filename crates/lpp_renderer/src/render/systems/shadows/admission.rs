//! Shadow caster admission
//!
//! Walks the priority-sorted light list and hands out pool slots until the
//! pool runs dry. Losing a slot is not an error: the light is drawn without
//! shadows and the drop is logged.

use crate::render::systems::lighting::{LightEntry, LightType};

use super::pool::ShadowSlotAllocator;

/// Outcome of one admission pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionStats {
    /// Spot lights granted a shadow map
    pub spot_shadows: usize,
    /// Directional lights granted a cascade set
    pub cascade_shadows: usize,
    /// Shadow requests that were refused
    pub denied: usize,
}

/// Resolve the shadow flag of every entry, in order
///
/// `entries` must already be sorted by priority so that exhaustion drops the
/// lowest-priority casters first. Point lights never get shadows.
pub fn admit_shadow_casters(entries: &mut [LightEntry<'_>], allocator: &mut dyn ShadowSlotAllocator) -> AdmissionStats {
    let mut stats = AdmissionStats::default();

    for entry in entries.iter_mut().filter(|entry| entry.cast_shadows) {
        let acquired = match entry.light.light_type {
            LightType::Point => {
                log::trace!("Point light shadows unsupported; drawing unshadowed");
                entry.cast_shadows = false;
                stats.denied += 1;
                continue;
            }
            LightType::Spot => allocator.acquire_spot(),
            LightType::Directional => allocator.acquire_cascade(),
        };

        match acquired {
            Ok(slot) => {
                match entry.light.light_type {
                    LightType::Directional => stats.cascade_shadows += 1,
                    _ => stats.spot_shadows += 1,
                }
                entry.shadow = Some(slot);
            }
            Err(e) => {
                log::debug!(
                    "{:?} light (priority {:.1}) loses its shadow: {}",
                    entry.light.light_type,
                    entry.priority,
                    e
                );
                entry.cast_shadows = false;
                stats.denied += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::api::RendererConfig;
    use crate::render::backends::RecordingBackend;
    use crate::render::systems::lighting::{Light, LightPrioritySorter};
    use crate::render::systems::shadows::ShadowMapPool;

    fn white() -> Vec3 {
        Vec3::new(1.0, 1.0, 1.0)
    }

    fn spot_at(z: f32) -> Light {
        Light::spot(Vec3::new(0.0, 0.0, z), -Vec3::z(), 20.0, 0.5, 2.0, white(), 1.0).with_shadows(0.002)
    }

    fn pool(spot: usize, cascade: usize) -> ShadowMapPool {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::new(128, 128).with_shadow_slots(spot, cascade);
        ShadowMapPool::new(&mut backend, &config).unwrap()
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let lights = vec![spot_at(-40.0), spot_at(-5.0), spot_at(-20.0)];
        let mut entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        let mut pool = pool(1, 0);

        let stats = admit_shadow_casters(&mut entries, &mut pool);
        assert_eq!(stats.spot_shadows, 1);
        assert_eq!(stats.denied, 2);

        let shadowed: Vec<_> = entries.iter().filter(|e| e.is_shadowed()).collect();
        assert_eq!(shadowed.len(), 1);
        // Closest spot has the highest priority
        assert!(std::ptr::eq(shadowed[0].light, &lights[1]));
        assert!(entries[1..].iter().all(|e| !e.cast_shadows && e.shadow.is_none()));
    }

    #[test]
    fn test_point_lights_are_never_shadowed() {
        let lights = vec![Light::point(Vec3::new(0.0, 0.0, -3.0), 10.0, white(), 1.0).with_shadows(0.001)];
        let mut entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        let mut pool = pool(4, 1);
        admit_shadow_casters(&mut entries, &mut pool);
        assert!(!entries[0].cast_shadows);
        assert_eq!(pool.spot_in_use(), 0);
    }

    #[test]
    fn test_directional_takes_cascade_slot() {
        let lights = vec![
            Light::directional(-Vec3::y(), white(), 1.0).with_shadows(0.001),
            Light::directional(Vec3::new(0.2, -1.0, 0.0), white(), 0.3).with_shadows(0.001),
        ];
        let mut entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        let mut pool = pool(0, 1);
        let stats = admit_shadow_casters(&mut entries, &mut pool);
        assert_eq!(stats.cascade_shadows, 1);
        assert!(entries[0].is_shadowed());
        assert!(!entries[1].cast_shadows);
    }

    #[test]
    fn test_non_casters_untouched() {
        let lights = vec![Light::spot(Vec3::zeros(), -Vec3::z(), 20.0, 0.5, 2.0, white(), 1.0)];
        let mut entries = LightPrioritySorter::sort(&lights, &Vec3::zeros());
        let mut pool = pool(1, 0);
        let stats = admit_shadow_casters(&mut entries, &mut pool);
        assert_eq!(stats, AdmissionStats::default());
        assert_eq!(pool.spot_in_use(), 0);
    }
}
