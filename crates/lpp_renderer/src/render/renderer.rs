//! Light pre-pass frame driver
//!
//! Owns the backend and the GBuffer and runs every pass of a frame in a fixed
//! order. Shadow slots and shadow map generation are supplied by the caller
//! so the pool can outlive renderer resizes.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::utils;
use crate::render::api::{ClearOp, ConstantBlock, FrameContext, RenderBackend, RendererConfig};
use crate::render::frustum::FrustumCorners;
use crate::render::gbuffer::{GBuffer, NORMAL_CLEAR};
use crate::render::primitives::Camera;
use crate::render::systems::depth_reconstruction::DepthReconstructionStage;
use crate::render::systems::lighting::{LightEntry, LightPrioritySorter, LightState, LightingPass};
use crate::render::systems::shading::ShadingReconstructionStage;
use crate::render::systems::shadows::{
    admit_shadow_casters, ShadowMapGenerator, ShadowMapPool, ShadowSlot, ShadowSlotAllocator,
};
use crate::render::{RenderError, RenderResult};

/// Per-frame camera block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraConstants {
    /// World-to-view
    pub view: [[f32; 4]; 4],
    /// View-to-clip, including the coordinate flip
    pub projection: [[f32; 4]; 4],
    /// World-to-clip
    pub view_projection: [[f32; 4]; 4],
    /// World position + near distance
    pub position_near: [f32; 4],
    /// Viewport width, height, far distance, unused
    pub viewport_far: [f32; 4],
}

impl CameraConstants {
    /// Camera block for a frame; fails for a degenerate camera
    pub fn new(camera: &Camera, width: u32, height: u32) -> RenderResult<Self> {
        let view = camera.get_view_matrix();
        let view_projection = camera.get_view_projection_matrix();
        // Projection as seen from view space, so shaders can skip the flip
        let projection = view_projection * camera.inverse_view_matrix()?;
        Ok(Self {
            view: utils::mat4_to_cols(&view),
            projection: utils::mat4_to_cols(&projection),
            view_projection: utils::mat4_to_cols(&view_projection),
            position_near: [camera.position.x, camera.position.y, camera.position.z, camera.near],
            viewport_far: [width as f32, height as f32, camera.far, 0.0],
        })
    }
}

/// Per-frame statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame_index: u64,
    /// Lights accumulated into the light buffer
    pub lights_drawn: usize,
    /// Spot lights drawn with shadows
    pub spot_shadows: usize,
    /// Directional lights drawn with cascades
    pub cascade_shadows: usize,
    /// Shadow requests refused by admission
    pub shadows_denied: usize,
    /// Drawables submitted to the GBuffer pass
    pub gbuffer_drawables: usize,
    /// Drawables submitted to the shading pass
    pub shaded_drawables: usize,
    /// Resolved light states in draw order
    pub light_states: Vec<LightState>,
}

/// Light pre-pass deferred renderer
pub struct LightPrePassRenderer {
    backend: Box<dyn RenderBackend>,
    config: RendererConfig,
    gbuffer: GBuffer,
    frame_count: u64,
}

impl LightPrePassRenderer {
    /// Create the renderer and its GBuffer
    pub fn new(mut backend: Box<dyn RenderBackend>, config: RendererConfig) -> RenderResult<Self> {
        config
            .validate()
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;

        log::info!(
            "Initializing light pre-pass renderer at {}x{}",
            config.width,
            config.height
        );
        let gbuffer = GBuffer::new(backend.as_mut(), config.width, config.height)?;

        Ok(Self {
            backend,
            config,
            gbuffer,
            frame_count: 0,
        })
    }

    /// Allocate a shadow pool sized by the renderer configuration
    pub fn create_shadow_pool(&mut self) -> RenderResult<ShadowMapPool> {
        ShadowMapPool::new(self.backend.as_mut(), &self.config)
    }

    /// Recreate the GBuffer for a new surface size
    ///
    /// Lights and shadow pools are untouched. Returns `Ok(false)` when the
    /// size did not change.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<bool> {
        let resized = self.gbuffer.resize(self.backend.as_mut(), width, height)?;
        if resized {
            self.config.width = width;
            self.config.height = height;
        }
        Ok(resized)
    }

    /// Render one frame
    pub fn render_frame(
        &mut self,
        frame: &FrameContext<'_>,
        shadows: &mut dyn ShadowSlotAllocator,
        generator: &mut dyn ShadowMapGenerator,
    ) -> RenderResult<FrameStats> {
        self.frame_count += 1;
        let camera = frame.camera;
        let backend = self.backend.as_mut();

        for light in frame.lights {
            light.validate()?;
        }
        camera.inverse_view_matrix()?;

        let corners = FrustumCorners::compute(camera);
        shadows.reset();

        let mut entries = LightPrioritySorter::sort(frame.lights, &camera.position);
        let admission = admit_shadow_casters(&mut entries, shadows);
        Self::generate_shadow_maps(backend, camera, &entries, shadows, generator)?;

        let (width, height) = self.gbuffer.size();
        let camera_constants = CameraConstants::new(camera, width, height)?;
        backend.set_constants(ConstantBlock::Camera, bytemuck::bytes_of(&camera_constants))?;

        let gbuffer_drawables = self.fill_gbuffer_with(frame)?;
        let backend = self.backend.as_mut();

        DepthReconstructionStage::new(camera).execute(backend, &self.gbuffer, &corners)?;

        let lighting = LightingPass::new(camera, &self.config, &corners)?;
        let light_states = lighting.execute(backend, &entries, &*shadows, &self.gbuffer)?;

        let shaded_drawables = ShadingReconstructionStage::new(self.config.output_clear_color).execute(
            backend,
            &self.gbuffer,
            camera,
            frame.all_drawables(),
        )?;

        let stats = FrameStats {
            frame_index: self.frame_count,
            lights_drawn: light_states.len(),
            spot_shadows: admission.spot_shadows,
            cascade_shadows: admission.cascade_shadows,
            shadows_denied: admission.denied,
            gbuffer_drawables,
            shaded_drawables,
            light_states,
        };
        log::debug!(
            "Frame {}: {} lights ({} spot / {} cascade shadows, {} denied), {} drawables",
            stats.frame_index,
            stats.lights_drawn,
            stats.spot_shadows,
            stats.cascade_shadows,
            stats.shadows_denied,
            stats.shaded_drawables
        );
        Ok(stats)
    }

    fn generate_shadow_maps(
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        entries: &[LightEntry<'_>],
        shadows: &mut dyn ShadowSlotAllocator,
        generator: &mut dyn ShadowMapGenerator,
    ) -> RenderResult<()> {
        for entry in entries.iter().filter(|entry| entry.is_shadowed()) {
            let Some(slot) = entry.shadow else { continue };
            let missing = || RenderError::RenderingFailed(format!("shadow slot {:?} vanished before generation", slot));
            match slot {
                ShadowSlot::Spot(_) => {
                    let map = shadows.spot_map_mut(slot).ok_or_else(missing)?;
                    generator.generate_spot(backend, entry.light, map)?;
                }
                ShadowSlot::Cascade(_) => {
                    let map = shadows.cascade_map_mut(slot).ok_or_else(missing)?;
                    generator.generate_cascade(backend, entry.light, camera, map)?;
                }
            }
        }
        Ok(())
    }

    fn fill_gbuffer_with(&mut self, frame: &FrameContext<'_>) -> RenderResult<usize> {
        let backend = self.backend.as_mut();
        backend.bind_render_targets(&[self.gbuffer.depth(), self.gbuffer.normal()])?;
        backend.clear(&ClearOp::per_target(
            &[[self.config.depth_clear, 0.0, 0.0, 0.0], NORMAL_CLEAR],
            1.0,
        ))?;

        let mut drawn = 0;
        for drawable in frame.all_drawables() {
            drawable.render_to_gbuffer(backend, frame.camera)?;
            drawn += 1;
        }
        Ok(drawn)
    }

    /// Backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Mutable backend
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Read-only GBuffer targets
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Active configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backends::{RecordedCommand, RecordingBackend};
    use crate::render::systems::lighting::Light;
    use crate::render::systems::shadows::MatrixShadowGenerator;

    #[test]
    fn test_invalid_config_fails_initialization() {
        let config = RendererConfig::new(0, 600);
        let result = LightPrePassRenderer::new(Box::new(RecordingBackend::new()), config);
        assert!(matches!(result, Err(RenderError::InitializationFailed(_))));
    }

    #[test]
    fn test_target_exhaustion_is_fatal() {
        let backend = RecordingBackend::new().with_target_budget(3);
        let result = LightPrePassRenderer::new(Box::new(backend), RendererConfig::new(800, 600));
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
    }

    fn renderer() -> LightPrePassRenderer {
        LightPrePassRenderer::new(Box::new(RecordingBackend::new()), RendererConfig::new(320, 180)).unwrap()
    }

    fn recorded(renderer: &LightPrePassRenderer) -> &RecordingBackend {
        renderer.backend().as_any().downcast_ref::<RecordingBackend>().unwrap()
    }

    #[test]
    fn test_gbuffer_targets_get_their_own_clear_colors() {
        let mut renderer = renderer();
        let mut pool = renderer.create_shadow_pool().unwrap();
        let mut generator = MatrixShadowGenerator::default();
        let camera = Camera::default();
        renderer
            .render_frame(&FrameContext::new(&camera, &[], &[], &[]), &mut pool, &mut generator)
            .unwrap();

        let gbuffer_targets = vec![renderer.gbuffer().depth(), renderer.gbuffer().normal()];
        let commands = recorded(&renderer).commands();
        let bind = commands
            .iter()
            .position(|c| *c == RecordedCommand::BindTargets(gbuffer_targets.clone()))
            .unwrap();
        let RecordedCommand::Clear(clear) = &commands[bind + 1] else {
            panic!("GBuffer bind must be followed by a clear");
        };

        assert_eq!(clear.color_for(0), Some([renderer.config().depth_clear, 0.0, 0.0, 0.0]));
        let normal = clear.color_for(1).unwrap();
        // Unpacked from [0, 1] storage the cleared normal is unit length
        let unpacked = Vec3::new(normal[0], normal[1], normal[2]) * 2.0 - Vec3::new(1.0, 1.0, 1.0);
        approx::assert_relative_eq!(unpacked.norm(), 1.0, epsilon = 1e-6);
        assert_eq!(normal[3], 0.0);
        assert_eq!(clear.color_for(2), None);
    }

    #[test]
    fn test_degenerate_camera_fails_before_any_pass() {
        let mut renderer = renderer();
        let mut pool = renderer.create_shadow_pool().unwrap();
        let mut generator = MatrixShadowGenerator::default();
        let mut camera = Camera::default();
        camera.look_at(camera.position, Vec3::y());

        let lights = [Light::directional(-Vec3::y(), Vec3::new(1.0, 1.0, 1.0), 1.0).with_shadows(0.001)];
        let result = renderer.render_frame(&FrameContext::new(&camera, &lights, &[], &[]), &mut pool, &mut generator);
        assert!(matches!(result, Err(RenderError::RenderingFailed(_))));
        assert!(recorded(&renderer).commands().is_empty());
        assert!(CameraConstants::new(&camera, 320, 180).is_err());
    }

    #[test]
    fn test_camera_constants_projection_excludes_view() {
        let camera = Camera::default();
        let constants = CameraConstants::new(&camera, 1280, 720).unwrap();
        let (scale, offset) = camera.projection_coefficients();
        // Third row of the view-space projection, read from column-major storage
        approx::assert_relative_eq!(constants.projection[2][2], -scale, epsilon = 1e-4);
        approx::assert_relative_eq!(constants.projection[3][2], offset, epsilon = 1e-4);
    }
}
