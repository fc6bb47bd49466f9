//! Shadow map generation
//!
//! The renderer calls a [`ShadowMapGenerator`] once per admitted caster,
//! before any GBuffer work, so every shadow map is complete by the time the
//! lighting pass samples it.

use crate::render::api::{ClearOp, RenderBackend, TargetHandle};
use crate::render::primitives::Camera;
use crate::render::systems::lighting::Light;
use crate::render::RenderResult;

use super::matrices;
use super::pool::{CascadeShadowMap, SpotShadowMap};

/// Fills shadow maps for admitted lights
pub trait ShadowMapGenerator {
    /// Render the depth map of a spot light into its slot
    fn generate_spot(&mut self, backend: &mut dyn RenderBackend, light: &Light, map: &mut SpotShadowMap) -> RenderResult<()>;

    /// Render every cascade of a directional light into its slot
    fn generate_cascade(
        &mut self,
        backend: &mut dyn RenderBackend,
        light: &Light,
        camera: &Camera,
        map: &mut CascadeShadowMap,
    ) -> RenderResult<()>;
}

/// Generator that computes slot matrices and clears the maps
///
/// Drawing shadow casters is left to the application: wrap this generator
/// and render casters after it returns, using the matrices it stored.
#[derive(Debug, Clone)]
pub struct MatrixShadowGenerator {
    split_lambda: f32,
    spot_maps_generated: usize,
    cascades_generated: usize,
}

impl MatrixShadowGenerator {
    /// Create a generator with the given cascade split blend
    pub fn new(split_lambda: f32) -> Self {
        Self {
            split_lambda,
            spot_maps_generated: 0,
            cascades_generated: 0,
        }
    }

    /// Spot maps generated since creation
    pub fn spot_maps_generated(&self) -> usize {
        self.spot_maps_generated
    }

    /// Cascade sets generated since creation
    pub fn cascades_generated(&self) -> usize {
        self.cascades_generated
    }
}

impl Default for MatrixShadowGenerator {
    fn default() -> Self {
        Self::new(0.7)
    }
}

fn clear_shadow_target(backend: &mut dyn RenderBackend, target: TargetHandle) -> RenderResult<()> {
    backend.bind_render_targets(&[target])?;
    backend.clear(&ClearOp::all([1.0, 1.0, 1.0, 1.0], 1.0))
}

impl ShadowMapGenerator for MatrixShadowGenerator {
    fn generate_spot(&mut self, backend: &mut dyn RenderBackend, light: &Light, map: &mut SpotShadowMap) -> RenderResult<()> {
        map.view_projection = matrices::spot_view_projection(light);
        clear_shadow_target(backend, map.target)?;
        self.spot_maps_generated += 1;
        Ok(())
    }

    fn generate_cascade(
        &mut self,
        backend: &mut dyn RenderBackend,
        light: &Light,
        camera: &Camera,
        map: &mut CascadeShadowMap,
    ) -> RenderResult<()> {
        let splits = matrices::cascade_split_distances(camera.near, camera.far, map.split_count(), self.split_lambda);
        let direction = light.direction();

        let mut split_near = camera.near;
        for (index, split_far) in splits.iter().enumerate() {
            let view_projection = matrices::cascade_view_projection(camera, direction, split_near, *split_far);
            if let Some(slot) = map.view_projections.get_mut(index) {
                *slot = view_projection;
            }
            if let Some(target) = map.targets.get(index) {
                clear_shadow_target(backend, *target)?;
            }
            split_near = *split_far;
        }
        log::trace!("Cascade splits {:?}", splits);
        map.split_distances = splits;
        self.cascades_generated += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::api::RendererConfig;
    use crate::render::backends::{RecordedCommand, RecordingBackend};
    use crate::render::systems::shadows::{ShadowMapPool, ShadowSlotAllocator};

    #[test]
    fn test_cascade_generation_fills_every_split() {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::new(128, 128).with_shadow_slots(0, 1);
        let mut pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        let slot = pool.acquire_cascade().unwrap();

        let camera = Camera::default();
        let sun = Light::directional(Vec3::new(0.2, -1.0, 0.1), Vec3::new(1.0, 1.0, 1.0), 1.0);
        let mut generator = MatrixShadowGenerator::default();
        let map = pool.cascade_map_mut(slot).unwrap();
        generator.generate_cascade(&mut backend, &sun, &camera, map).unwrap();

        let map = pool.cascade_map(slot).unwrap();
        assert_eq!(map.split_distances.len(), 3);
        assert_eq!(*map.split_distances.last().unwrap(), camera.far);
        assert!(map.view_projections.iter().all(|vp| *vp != Mat4::identity()));
        let clears = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Clear(_)))
            .count();
        assert_eq!(clears, 3);
        assert_eq!(generator.cascades_generated(), 1);
    }

    #[test]
    fn test_spot_generation_stores_matrix() {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::new(128, 128).with_shadow_slots(1, 0);
        let mut pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        let slot = pool.acquire_spot().unwrap();

        let light = Light::spot(Vec3::new(0.0, 8.0, 0.0), -Vec3::y(), 15.0, 0.4, 2.0, Vec3::new(1.0, 1.0, 1.0), 1.0);
        let mut generator = MatrixShadowGenerator::default();
        generator
            .generate_spot(&mut backend, &light, pool.spot_map_mut(slot).unwrap())
            .unwrap();

        let map = pool.spot_map(slot).unwrap();
        assert_eq!(map.view_projection, matrices::spot_view_projection(&light));
        assert_eq!(generator.spot_maps_generated(), 1);
    }
}
