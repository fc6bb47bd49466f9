//! Hardware depth reconstruction
//!
//! The GBuffer stores linear view depth. Light volumes need a real depth
//! buffer to be depth tested against, so a full-screen pass converts linear
//! depth back into projected depth and writes it into the light buffer's
//! depth-stencil.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec2;
use crate::render::api::{ClearOp, ConstantBlock, RenderBackend};
use crate::render::frustum::FrustumCorners;
use crate::render::gbuffer::GBuffer;
use crate::render::pipeline::PipelineState;
use crate::render::primitives::Camera;
use crate::render::RenderResult;

/// Constants read by the reconstruction shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthReconstructionConstants {
    /// Projection scale, projection offset, near, far
    pub coefficients: [f32; 4],
    /// View-space far corners (TL, TR, BL, BR)
    pub frustum_corners: [[f32; 4]; 4],
}

/// Rebuilds projected depth from linear depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthReconstructionStage {
    scale: f32,
    offset: f32,
    near: f32,
    far: f32,
}

impl DepthReconstructionStage {
    /// Take the projection coefficients from the camera
    pub fn new(camera: &Camera) -> Self {
        let (scale, offset) = camera.projection_coefficients();
        Self {
            scale,
            offset,
            near: camera.near,
            far: camera.far,
        }
    }

    /// `(scale, offset)` such that `z_ndc = scale + offset / d`
    pub fn coefficients(&self) -> (f32, f32) {
        (self.scale, self.offset)
    }

    /// Projected depth for a linear view depth
    ///
    /// 0 at the near plane and 1 at the far plane. Depths past the far
    /// plane (the cleared background) land above 1 and are clamped by the
    /// depth buffer.
    pub fn reconstruct(&self, linear_depth: f32) -> f32 {
        self.scale + self.offset / linear_depth
    }

    /// Constant block for the full-screen pass
    pub fn constants(&self, corners: &FrustumCorners) -> DepthReconstructionConstants {
        DepthReconstructionConstants {
            coefficients: [self.scale, self.offset, self.near, self.far],
            frustum_corners: FrustumCorners::as_rows(&corners.far),
        }
    }

    /// Bind the light buffer, clear it and rebuild its depth
    ///
    /// The light buffer stays bound afterwards and the pipeline is left in
    /// GreaterEqual with depth writes off, ready for the light volumes.
    pub fn execute(&self, backend: &mut dyn RenderBackend, gbuffer: &GBuffer, corners: &FrustumCorners) -> RenderResult<()> {
        backend.bind_render_targets(&[gbuffer.light_buffer()])?;
        backend.clear(&ClearOp::all([0.0, 0.0, 0.0, 0.0], 1.0))?;

        backend.apply_pipeline_state(&PipelineState::depth_reconstruction())?;
        backend.bind_texture(0, gbuffer.depth())?;
        backend.set_constants(ConstantBlock::DepthReconstruction, bytemuck::bytes_of(&self.constants(corners)))?;
        backend.draw_quad(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0))?;

        backend.apply_pipeline_state(&PipelineState::depth_reconstructed())
    }
}
