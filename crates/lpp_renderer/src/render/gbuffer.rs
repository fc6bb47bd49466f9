//! G-Buffer render targets for light pre-pass rendering.
//!
//! The store owns four targets of identical size:
//! - **depth** (R32F + D24S8): linear view depth, positive along forward
//! - **normal** (RGBA8): RGB = packed view-space normal, A = specular power
//! - **light** (RGBA16F + D24S8): additive light accumulation; its
//!   depth-stencil receives the reconstructed hardware depth
//! - **output** (RGBA8 + D24S8): final shaded color
//!
//! Every pass overwrites its targets completely, so all four are created
//! with [`ContentsUsage::Discard`].

use crate::render::api::{
    ContentsUsage, DepthFormat, RenderBackend, RenderTargetDesc, SurfaceFormat, TargetHandle,
};
use crate::render::{RenderError, RenderResult};

/// Linear depth target format
pub const GBUFFER_DEPTH_FORMAT: SurfaceFormat = SurfaceFormat::R32Float;
/// Normal + specular target format
pub const GBUFFER_NORMAL_FORMAT: SurfaceFormat = SurfaceFormat::Rgba8Unorm;
/// Light accumulation target format
pub const GBUFFER_LIGHT_FORMAT: SurfaceFormat = SurfaceFormat::Rgba16Float;
/// Final output format
pub const GBUFFER_OUTPUT_FORMAT: SurfaceFormat = SurfaceFormat::Rgba8Unorm;

/// Normal target clear: a packed normal facing the camera, zero specular power
pub const NORMAL_CLEAR: [f32; 4] = [0.5, 0.5, 1.0, 0.0];

/// The four render targets of the light pre-pass
#[derive(Debug)]
pub struct GBuffer {
    depth: TargetHandle,
    normal: TargetHandle,
    light: TargetHandle,
    output: TargetHandle,
    width: u32,
    height: u32,
}

impl GBuffer {
    /// Allocate all four targets
    ///
    /// Allocation failure is fatal: any target already created is released
    /// and the error is returned without retrying.
    pub fn new(backend: &mut dyn RenderBackend, width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSurfaceSize { width, height });
        }

        let mut created = Vec::with_capacity(4);
        for desc in Self::descriptors(width, height) {
            match backend.create_render_target(&desc) {
                Ok(handle) => created.push(handle),
                Err(e) => {
                    for handle in created {
                        backend.destroy_render_target(handle);
                    }
                    log::error!("GBuffer target '{}' allocation failed: {}", desc.label, e);
                    return Err(RenderError::ResourceCreationFailed(format!(
                        "gbuffer target '{}' ({}x{}): {}",
                        desc.label, width, height, e
                    )));
                }
            }
        }

        log::info!("GBuffer created at {}x{}", width, height);
        Ok(Self {
            depth: created[0],
            normal: created[1],
            light: created[2],
            output: created[3],
            width,
            height,
        })
    }

    /// Target descriptions in creation order: depth, normal, light, output
    pub fn descriptors(width: u32, height: u32) -> [RenderTargetDesc; 4] {
        let target = |label, format, depth_stencil| RenderTargetDesc {
            label,
            width,
            height,
            format,
            depth_stencil,
            usage: ContentsUsage::Discard,
        };
        [
            target("gbuffer_depth", GBUFFER_DEPTH_FORMAT, Some(DepthFormat::Depth24Stencil8)),
            target("gbuffer_normal", GBUFFER_NORMAL_FORMAT, None),
            target("gbuffer_light", GBUFFER_LIGHT_FORMAT, Some(DepthFormat::Depth24Stencil8)),
            target("gbuffer_output", GBUFFER_OUTPUT_FORMAT, Some(DepthFormat::Depth24Stencil8)),
        ]
    }

    /// Recreate every target at a new size
    ///
    /// Returns `Ok(false)` when the size is unchanged. The new set is created
    /// before the old one is released, so a failed resize leaves the
    /// current targets intact.
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> RenderResult<bool> {
        if width == self.width && height == self.height {
            return Ok(false);
        }

        let replacement = Self::new(backend, width, height)?;
        let previous = std::mem::replace(self, replacement);
        previous.release(backend);
        log::info!("GBuffer resized to {}x{}", width, height);
        Ok(true)
    }

    /// Release all four targets
    pub fn release(self, backend: &mut dyn RenderBackend) {
        for handle in self.targets() {
            backend.destroy_render_target(handle);
        }
    }

    /// Linear depth target
    pub fn depth(&self) -> TargetHandle {
        self.depth
    }

    /// Normal + specular target
    pub fn normal(&self) -> TargetHandle {
        self.normal
    }

    /// Light accumulation target
    pub fn light_buffer(&self) -> TargetHandle {
        self.light
    }

    /// Final output target
    pub fn output(&self) -> TargetHandle {
        self.output
    }

    /// All targets: depth, normal, light, output
    pub fn targets(&self) -> [TargetHandle; 4] {
        [self.depth, self.normal, self.light, self.output]
    }

    /// Shared resolution
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
