//! Shading reconstruction
//!
//! Second geometry pass: every drawable is drawn again into the output
//! target, combining its material with the accumulated light buffer.

use crate::render::api::{ClearOp, RenderBackend};
use crate::render::gbuffer::GBuffer;
use crate::render::primitives::Camera;
use crate::render::RenderResult;
use crate::scene::Drawable;

/// Final pass into the output target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingReconstructionStage {
    clear_color: [f32; 4],
}

impl ShadingReconstructionStage {
    /// Create the stage with the output clear color
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self { clear_color }
    }

    /// Draw every drawable into the output; returns the number drawn
    pub fn execute<'a>(
        &self,
        backend: &mut dyn RenderBackend,
        gbuffer: &GBuffer,
        camera: &Camera,
        drawables: impl IntoIterator<Item = &'a Drawable>,
    ) -> RenderResult<usize> {
        backend.bind_render_targets(&[gbuffer.output()])?;
        backend.clear(&ClearOp::all(self.clear_color, 1.0))?;

        let mut drawn = 0;
        for drawable in drawables {
            drawable.reconstruct_shading(backend, camera, gbuffer.light_buffer())?;
            drawn += 1;
        }
        Ok(drawn)
    }
}
