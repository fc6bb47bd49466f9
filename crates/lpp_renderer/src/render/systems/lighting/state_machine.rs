//! Per-light draw state
//!
//! Each light resolves to one [`LightState`], a pure function of its type,
//! its resolved shadow flag and where its volume sits relative to the camera
//! near plane. The state selects the technique, cull mode and depth test;
//! [`LightingPass`] turns it into a complete [`LightDraw`] and submits it.
//!
//! ```text
//! volume in front of near plane   → cull back faces,  LessEqual
//! volume crossing the near plane  → cull front faces, GreaterEqual
//! directional                     → full-screen quad, no cull, Always
//! ```

use crate::foundation::math::{Mat4, PlaneIntersection, Vec2, Vec3};
use crate::render::api::{ConstantBlock, RenderBackend, RendererConfig, TargetHandle, VolumeMesh};
use crate::render::frustum::{sphere_screen_bounds, FrustumCorners};
use crate::render::gbuffer::GBuffer;
use crate::render::pipeline::{CullMode, DepthState, PipelineState, Technique};
use crate::render::primitives::Camera;
use crate::render::systems::shadows::{ShadowSlot, ShadowSlotAllocator};
use crate::render::{RenderError, RenderResult};

use super::constants::LightConstants;
use super::light::{Light, LightType};
use super::priority::LightEntry;

/// Texture slot of the GBuffer linear depth during lighting
pub const DEPTH_TEXTURE_SLOT: u32 = 0;
/// Texture slot of the GBuffer normals during lighting
pub const NORMAL_TEXTURE_SLOT: u32 = 1;
/// First texture slot used for shadow maps
pub const SHADOW_TEXTURE_SLOT: u32 = 2;

/// Where a light volume sits relative to the camera near plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumePlacement {
    /// Entirely in front; front faces are visible
    InFront,
    /// Crossing the plane (or behind it); only back faces are reliable
    Straddling,
}

impl VolumePlacement {
    fn from_intersection(intersection: PlaneIntersection) -> Self {
        match intersection {
            PlaneIntersection::Front => Self::InFront,
            PlaneIntersection::Back | PlaneIntersection::Intersecting => Self::Straddling,
        }
    }

    /// Cull mode and depth test for a volume with this placement
    pub fn volume_state(self) -> (CullMode, DepthState) {
        match self {
            Self::InFront => (CullMode::Back, DepthState::VOLUME_FRONT),
            Self::Straddling => (CullMode::Front, DepthState::VOLUME_INSIDE),
        }
    }
}

/// Draw state of one light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    /// Point light sphere entirely in front of the near plane
    PointFront,
    /// Point light sphere reaching the near plane
    PointStraddling,
    /// Spot light with a shadow map
    SpotShadowed(VolumePlacement),
    /// Spot light without a shadow map
    SpotUnshadowed(VolumePlacement),
    /// Directional light with cascades
    DirectionalShadowed,
    /// Directional light without cascades
    DirectionalUnshadowed,
}

impl LightState {
    /// Classify a light for this frame
    ///
    /// Point spheres are expanded by `point_volume_scale` before the test.
    /// Spot pyramids (apex plus base corners) are tested against the near
    /// plane pushed forward by `spot_near_plane_bias`.
    pub fn classify(light: &Light, shadowed: bool, camera: &Camera, config: &RendererConfig) -> Self {
        let near_plane = camera.near_plane();
        match light.light_type {
            LightType::Point => {
                let radius = light.radius * config.point_volume_scale;
                match near_plane.classify_sphere(&light.position(), radius) {
                    PlaneIntersection::Front => Self::PointFront,
                    _ => Self::PointStraddling,
                }
            }
            LightType::Spot => {
                let plane = near_plane.offset(config.spot_near_plane_bias);
                let placement = VolumePlacement::from_intersection(plane.classify_points(&spot_pyramid(light)));
                if shadowed {
                    Self::SpotShadowed(placement)
                } else {
                    Self::SpotUnshadowed(placement)
                }
            }
            LightType::Directional if shadowed => Self::DirectionalShadowed,
            LightType::Directional => Self::DirectionalUnshadowed,
        }
    }

    /// Light type this state belongs to
    pub fn light_type(self) -> LightType {
        match self {
            Self::PointFront | Self::PointStraddling => LightType::Point,
            Self::SpotShadowed(_) | Self::SpotUnshadowed(_) => LightType::Spot,
            Self::DirectionalShadowed | Self::DirectionalUnshadowed => LightType::Directional,
        }
    }

    /// Whether the state samples a shadow map
    pub fn is_shadowed(self) -> bool {
        matches!(self, Self::SpotShadowed(_) | Self::DirectionalShadowed)
    }

    /// Complete pipeline state for the light draw
    pub fn pipeline_state(self) -> PipelineState {
        let (cull_mode, depth) = match self {
            Self::PointFront => VolumePlacement::InFront.volume_state(),
            Self::PointStraddling => VolumePlacement::Straddling.volume_state(),
            Self::SpotShadowed(placement) | Self::SpotUnshadowed(placement) => placement.volume_state(),
            Self::DirectionalShadowed | Self::DirectionalUnshadowed => (CullMode::None, DepthState::DISABLED),
        };
        PipelineState::light(light_technique(self.light_type(), self.is_shadowed()), cull_mode, depth)
    }
}

/// Technique table keyed by light type and resolved shadow flag
///
/// Point lights have no shadowed technique and always map to the plain one.
pub fn light_technique(light_type: LightType, shadowed: bool) -> Technique {
    match (light_type, shadowed) {
        (LightType::Point, _) => Technique::PointLight,
        (LightType::Spot, false) => Technique::SpotLight,
        (LightType::Spot, true) => Technique::SpotLightShadowed,
        (LightType::Directional, false) => Technique::DirectionalLight,
        (LightType::Directional, true) => Technique::DirectionalLightShadowed,
    }
}

/// Apex followed by the four base corners of a spot light's frustum
fn spot_pyramid(light: &Light) -> [Vec3; 5] {
    let apex = light.position();
    let base = apex + light.direction() * light.radius;
    let extent = light.spot_base_radius();
    let right = light.transform.right() * extent;
    let up = light.transform.up() * extent;
    [apex, base + up - right, base + up + right, base - up + right, base - up - right]
}

/// What gets rasterized for a light
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightGeometry {
    /// A resident volume mesh
    Volume {
        /// Sphere or cone
        mesh: VolumeMesh,
        /// Mesh-to-world transform
        world: Mat4,
        /// Mesh-to-clip transform
        world_view_projection: Mat4,
    },
    /// A screen-aligned quad
    Quad {
        /// Lower-left NDC corner
        min: Vec2,
        /// Upper-right NDC corner
        max: Vec2,
    },
}

/// Everything needed to draw one light
#[derive(Debug, Clone, PartialEq)]
pub struct LightDraw {
    /// Resolved state
    pub state: LightState,
    /// Pipeline state applied before the draw
    pub pipeline: PipelineState,
    /// Rasterized geometry
    pub geometry: LightGeometry,
    /// Constant block contents
    pub constants: LightConstants,
    /// Shadow maps bound from [`SHADOW_TEXTURE_SLOT`] upward
    pub shadow_textures: Vec<TargetHandle>,
}

/// Light accumulation for one frame
pub struct LightingPass<'a> {
    camera: &'a Camera,
    config: &'a RendererConfig,
    corners: &'a FrustumCorners,
    view: Mat4,
    inverse_view: Mat4,
    view_projection: Mat4,
}

impl<'a> LightingPass<'a> {
    /// Prepare the pass for a camera
    ///
    /// Fails when the camera's view matrix cannot be inverted, since shadow
    /// lookups start from view space.
    pub fn new(camera: &'a Camera, config: &'a RendererConfig, corners: &'a FrustumCorners) -> RenderResult<Self> {
        Ok(Self {
            camera,
            config,
            corners,
            view: camera.get_view_matrix(),
            inverse_view: camera.inverse_view_matrix()?,
            view_projection: camera.get_view_projection_matrix(),
        })
    }

    /// Build the draw for one admitted light
    pub fn plan(&self, entry: &LightEntry<'_>, shadows: &dyn ShadowSlotAllocator) -> RenderResult<LightDraw> {
        let light = entry.light;
        light.validate()?;

        let state = LightState::classify(light, entry.is_shadowed(), self.camera, self.config);
        log::trace!("{:?} light (priority {:.1}) -> {:?}", light.light_type, entry.priority, state);

        let view_position = self.view.transform_point(&light.position().into()).coords;
        let view_direction = self.view.transform_vector(&light.direction());

        let (geometry, (rect_min, rect_max), cos_angle) = match light.light_type {
            LightType::Point => {
                let world = Mat4::new_translation(&light.position()) * Mat4::new_scaling(light.radius);
                let bounds = sphere_screen_bounds(
                    self.camera,
                    &light.position(),
                    light.radius * self.config.point_volume_scale,
                );
                (self.volume(VolumeMesh::Sphere, world), bounds, 0.0)
            }
            LightType::Spot => {
                let extent = light.spot_base_radius();
                let world = light.transform.rigid_matrix()
                    * Mat4::new_nonuniform_scaling(&Vec3::new(extent, extent, light.radius));
                let reach = (light.radius * light.radius + extent * extent).sqrt();
                let bounds = sphere_screen_bounds(self.camera, &light.position(), reach);
                (self.volume(VolumeMesh::Cone, world), bounds, light.spot_angle.cos())
            }
            LightType::Directional => {
                let full = (Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
                (LightGeometry::Quad { min: full.0, max: full.1 }, full, 0.0)
            }
        };

        let corners = FrustumCorners::as_rows(&self.corners.far_corners_for_rect(rect_min, rect_max));
        let mut constants =
            LightConstants::new(view_position, light.radius, view_direction, cos_angle, light.color, light.intensity)
                .with_screen_rect(corners, rect_min, rect_max)
                .with_shadow_params(light.spot_exponent, light.shadow_depth_bias, Vec2::zeros());
        if let LightGeometry::Volume { world_view_projection, .. } = &geometry {
            constants = constants.with_world_view_projection(world_view_projection);
        }

        let mut shadow_textures = Vec::new();
        if let (true, Some(slot)) = (state.is_shadowed(), entry.shadow) {
            let texel_size = match slot {
                ShadowSlot::Spot(_) => {
                    let map = shadows.spot_map(slot).ok_or_else(|| missing_slot(slot))?;
                    constants = constants.with_shadow_matrices(&[map.view_projection * self.inverse_view], &[]);
                    shadow_textures.push(map.target);
                    map.resolution
                }
                ShadowSlot::Cascade(_) => {
                    let map = shadows.cascade_map(slot).ok_or_else(|| missing_slot(slot))?;
                    let matrices: Vec<Mat4> =
                        map.view_projections.iter().map(|vp| vp * self.inverse_view).collect();
                    constants = constants.with_shadow_matrices(&matrices, &map.split_distances);
                    shadow_textures.extend(map.targets.iter().copied());
                    map.resolution
                }
            };
            let texel = 1.0 / texel_size.max(1) as f32;
            constants = constants.with_shadow_params(light.spot_exponent, light.shadow_depth_bias, Vec2::new(texel, texel));
        }

        Ok(LightDraw {
            state,
            pipeline: state.pipeline_state(),
            geometry,
            constants,
            shadow_textures,
        })
    }

    fn volume(&self, mesh: VolumeMesh, world: Mat4) -> LightGeometry {
        LightGeometry::Volume {
            mesh,
            world,
            world_view_projection: self.view_projection * world,
        }
    }

    /// Submit one planned light
    pub fn submit(backend: &mut dyn RenderBackend, draw: &LightDraw) -> RenderResult<()> {
        backend.apply_pipeline_state(&draw.pipeline)?;
        for (slot, target) in (SHADOW_TEXTURE_SLOT..).zip(draw.shadow_textures.iter()) {
            backend.bind_texture(slot, *target)?;
        }
        backend.set_constants(ConstantBlock::Light, draw.constants.as_bytes())?;
        match &draw.geometry {
            LightGeometry::Volume { mesh, world_view_projection, .. } => backend.draw_volume(*mesh, world_view_projection),
            LightGeometry::Quad { min, max } => backend.draw_quad(*min, *max),
        }
    }

    /// Accumulate every light into the light buffer
    ///
    /// The light buffer must still be bound with the depth rebuilt by the
    /// depth reconstruction stage. Returns the resolved states in draw order.
    pub fn execute(
        &self,
        backend: &mut dyn RenderBackend,
        entries: &[LightEntry<'_>],
        shadows: &dyn ShadowSlotAllocator,
        gbuffer: &GBuffer,
    ) -> RenderResult<Vec<LightState>> {
        backend.bind_texture(DEPTH_TEXTURE_SLOT, gbuffer.depth())?;
        backend.bind_texture(NORMAL_TEXTURE_SLOT, gbuffer.normal())?;

        let mut states = Vec::with_capacity(entries.len());
        for entry in entries {
            let draw = self.plan(entry, shadows)?;
            Self::submit(backend, &draw)?;
            states.push(draw.state);
        }
        Ok(states)
    }
}

fn missing_slot(slot: ShadowSlot) -> RenderError {
    RenderError::RenderingFailed(format!("shadow slot {:?} is not borrowed this frame", slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::render::pipeline::CompareFunction;
    use crate::render::systems::shadows::{MatrixShadowGenerator, ShadowMapGenerator, ShadowMapPool};
    use crate::render::backends::{RecordedCommand, RecordingBackend};
    use approx::assert_relative_eq;

    fn white() -> Vec3 {
        Vec3::new(1.0, 1.0, 1.0)
    }

    fn camera_at(z: f32) -> Camera {
        let mut camera = Camera::perspective(Vec3::new(0.0, 0.0, z), 60.0, 1.0, 0.5, 500.0);
        camera.look_at(Vec3::new(0.0, 0.0, z - 10.0), Vec3::y());
        camera
    }

    #[test]
    fn test_point_state_flips_inside_expanded_sphere() {
        let config = RendererConfig::default();
        let light = Light::point(Vec3::zeros(), 10.0, white(), 1.0);

        let far = LightState::classify(&light, false, &camera_at(40.0), &config);
        assert_eq!(far, LightState::PointFront);
        let state = far.pipeline_state();
        assert_eq!(state.cull_mode, CullMode::Back);
        assert_eq!(state.depth.compare, CompareFunction::LessEqual);

        // 10 * 1.375 = 13.75 reaches past a near plane 12.5 units away
        let near = LightState::classify(&light, false, &camera_at(13.0), &config);
        assert_eq!(near, LightState::PointStraddling);
        let state = near.pipeline_state();
        assert_eq!(state.cull_mode, CullMode::Front);
        assert_eq!(state.depth.compare, CompareFunction::GreaterEqual);
        assert!(!state.depth.write);
    }

    #[test]
    fn test_spot_uses_biased_near_plane() {
        let config = RendererConfig::default();
        // Cone pointing away from the camera, apex 2 units past the near plane
        let light = Light::spot(Vec3::new(0.0, 0.0, -2.5), -Vec3::z(), 20.0, 0.4, 1.0, white(), 1.0);
        let state = LightState::classify(&light, false, &camera_at(0.0), &config);
        assert_eq!(state, LightState::SpotUnshadowed(VolumePlacement::Straddling));

        let distant = Light::spot(Vec3::new(0.0, 0.0, -30.0), -Vec3::z(), 20.0, 0.4, 1.0, white(), 1.0);
        let state = LightState::classify(&distant, true, &camera_at(0.0), &config);
        assert_eq!(state, LightState::SpotShadowed(VolumePlacement::InFront));
        assert_eq!(state.pipeline_state().technique, Technique::SpotLightShadowed);
    }

    #[test]
    fn test_directional_is_unculled_quad() {
        let sun = Light::directional(-Vec3::y(), white(), 1.0);
        let state = LightState::classify(&sun, false, &camera_at(0.0), &RendererConfig::default());
        let pipeline = state.pipeline_state();
        assert_eq!(pipeline.cull_mode, CullMode::None);
        assert_eq!(pipeline.depth.compare, CompareFunction::Always);
        assert_eq!(pipeline.technique, Technique::DirectionalLight);
    }

    #[test]
    fn test_technique_table() {
        assert_eq!(light_technique(LightType::Point, true), Technique::PointLight);
        assert_eq!(light_technique(LightType::Spot, false), Technique::SpotLight);
        assert_eq!(light_technique(LightType::Directional, true), Technique::DirectionalLightShadowed);
    }

    #[test]
    fn test_cone_world_matrix_scales_base() {
        let camera = camera_at(50.0);
        let config = RendererConfig::default();
        let corners = FrustumCorners::compute(&camera);
        let pass = LightingPass::new(&camera, &config, &corners).unwrap();

        let mut backend = RecordingBackend::new();
        let pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        let lights = [Light::spot(Vec3::new(1.0, 2.0, 3.0), -Vec3::z(), 8.0, 0.5, 1.0, white(), 1.0)];
        let entry = LightEntry::new(&lights[0], &camera.position);
        let draw = pass.plan(&entry, &pool).unwrap();

        let LightGeometry::Volume { mesh, world, .. } = draw.geometry else {
            panic!("spot light must draw a volume");
        };
        assert_eq!(mesh, VolumeMesh::Cone);
        // Unit cone tip sits at the light, its base center one radius along the light
        let tip = world.transform_point(&Vec3::zeros().into());
        let base = world.transform_point(&Vec3::new(0.0, 0.0, -1.0).into());
        let rim = world.transform_point(&Vec3::new(1.0, 0.0, -1.0).into());
        assert_relative_eq!(tip.coords, Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(base.coords, Vec3::new(1.0, 2.0, -5.0), epsilon = 1e-4);
        assert_relative_eq!((rim - base).norm(), 8.0 * 0.5_f32.tan(), epsilon = 1e-4);
        assert!(draw.shadow_textures.is_empty());
    }

    /// Backend with the light buffer bound, as it is after depth reconstruction
    fn lighting_backend() -> (RecordingBackend, GBuffer) {
        let mut backend = RecordingBackend::new();
        let gbuffer = GBuffer::new(&mut backend, 64, 64).unwrap();
        (backend, gbuffer)
    }

    fn bound_textures(backend: &RecordingBackend) -> Vec<(u32, TargetHandle)> {
        backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::BindTexture { slot, target } => Some((*slot, *target)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_shadowed_spot_binds_map_and_view_to_light_matrix() {
        let camera = camera_at(0.0);
        let config = RendererConfig::default();
        let corners = FrustumCorners::compute(&camera);
        let pass = LightingPass::new(&camera, &config, &corners).unwrap();
        let (mut backend, gbuffer) = lighting_backend();
        let mut pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        let mut generator = MatrixShadowGenerator::default();

        let light = Light::spot(Vec3::new(2.0, 6.0, -30.0), Vec3::new(0.0, -1.0, -0.5), 25.0, 0.6, 2.0, white(), 1.0)
            .with_shadows(0.004);
        let slot = pool.acquire_spot().unwrap();
        generator
            .generate_spot(&mut backend, &light, pool.spot_map_mut(slot).unwrap())
            .unwrap();
        backend.bind_render_targets(&[gbuffer.light_buffer()]).unwrap();

        let mut entry = LightEntry::new(&light, &camera.position);
        entry.shadow = Some(slot);
        let draw = pass.plan(&entry, &pool).unwrap();
        let map_target = pool.spot_map(slot).unwrap().target;

        assert!(matches!(draw.state, LightState::SpotShadowed(_)));
        assert_eq!(draw.pipeline.technique, Technique::SpotLightShadowed);
        assert_eq!(draw.shadow_textures, vec![map_target]);
        let params = draw.constants.shadow_params;
        assert_relative_eq!(params[1], 0.004);
        assert_relative_eq!(params[2], 1.0 / config.spot_shadow_resolution as f32);
        assert_relative_eq!(params[3], 1.0 / config.spot_shadow_resolution as f32);

        // A point on the light axis, given in camera view space, lands in the
        // middle of the shadow map
        let on_axis = light.position() + light.direction() * light.radius * 0.5;
        let view_point = camera.get_view_matrix().transform_point(&on_axis.into());
        let clip = Mat4::from(draw.constants.shadow_matrices[0]) * Vec4::new(view_point.x, view_point.y, view_point.z, 1.0);
        assert!(clip.w > 0.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);
        assert!((0.0..=1.0).contains(&(clip.z / clip.w)));

        LightingPass::submit(&mut backend, &draw).unwrap();
        assert_eq!(bound_textures(&backend), vec![(SHADOW_TEXTURE_SLOT, map_target)]);
    }

    #[test]
    fn test_shadowed_directional_binds_every_cascade() {
        let camera = camera_at(0.0);
        let config = RendererConfig::default();
        let corners = FrustumCorners::compute(&camera);
        let pass = LightingPass::new(&camera, &config, &corners).unwrap();
        let (mut backend, gbuffer) = lighting_backend();
        let mut pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        let mut generator = MatrixShadowGenerator::default();

        let sun = Light::directional(Vec3::new(0.2, -1.0, 0.3), white(), 1.0).with_shadows(0.0015);
        let slot = pool.acquire_cascade().unwrap();
        generator
            .generate_cascade(&mut backend, &sun, &camera, pool.cascade_map_mut(slot).unwrap())
            .unwrap();
        backend.bind_render_targets(&[gbuffer.light_buffer()]).unwrap();

        let mut entry = LightEntry::new(&sun, &camera.position);
        entry.shadow = Some(slot);
        let draw = pass.plan(&entry, &pool).unwrap();
        let map = pool.cascade_map(slot).unwrap();
        let count = map.split_count();

        assert_eq!(draw.state, LightState::DirectionalShadowed);
        assert_eq!(draw.shadow_textures, map.targets);
        assert_relative_eq!(draw.constants.cascade_splits[3], count as f32);
        for (i, split) in map.split_distances.iter().enumerate() {
            assert_relative_eq!(draw.constants.cascade_splits[i], *split);
            assert!(*split > 0.0);
        }
        assert_relative_eq!(draw.constants.shadow_params[1], 0.0015);
        assert_relative_eq!(draw.constants.shadow_params[2], 1.0 / config.cascade_shadow_resolution as f32);
        assert!(draw.constants.shadow_matrices[..count]
            .iter()
            .all(|m| *m != [[0.0; 4]; 4]));

        LightingPass::submit(&mut backend, &draw).unwrap();
        let expected: Vec<(u32, TargetHandle)> = (SHADOW_TEXTURE_SLOT..)
            .zip(map.targets.iter().copied())
            .collect();
        assert_eq!(expected.len(), count);
        assert_eq!(bound_textures(&backend), expected);
    }

    #[test]
    fn test_invalid_light_is_fatal() {
        let camera = camera_at(0.0);
        let config = RendererConfig::default();
        let corners = FrustumCorners::compute(&camera);
        let pass = LightingPass::new(&camera, &config, &corners).unwrap();
        let mut backend = RecordingBackend::new();
        let pool = ShadowMapPool::new(&mut backend, &config).unwrap();

        let lights = [Light::point(Vec3::new(0.0, 0.0, -5.0), -1.0, white(), 1.0)];
        let entry = LightEntry::new(&lights[0], &camera.position);
        assert!(matches!(pass.plan(&entry, &pool), Err(RenderError::InvalidLight(_))));
    }
}
