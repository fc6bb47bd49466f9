//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that rendering backends implement so the
//! light pre-pass renderer can drive them without knowing the graphics API.
//! Every call is issued synchronously, in program order, from the frame
//! driver.

use crate::foundation::math::{Mat4, Vec2};
use crate::render::pipeline::PipelineState;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

slotmap::new_key_type! {
    /// Handle to a render target owned by a backend
    pub struct TargetHandle;
}

/// Handle to a mesh resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a material resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Color surface formats used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// Single 32-bit float channel (linear depth, shadow depth)
    R32Float,
    /// 8 bits per channel (packed normals, final color)
    Rgba8Unorm,
    /// Half-float per channel (light accumulation)
    Rgba16Float,
}

/// Depth-stencil formats a render target can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFormat {
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
    /// 32-bit float depth
    Depth32Float,
}

/// What happens to a target's previous contents when it is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentsUsage {
    /// Contents are undefined after binding
    Discard,
    /// Contents survive rebinding
    Preserve,
}

/// Description of a render target allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDesc {
    /// Debug label
    pub label: &'static str,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color format
    pub format: SurfaceFormat,
    /// Depth-stencil surface attached to this target, if any
    pub depth_stencil: Option<DepthFormat>,
    /// Load behavior when bound
    pub usage: ContentsUsage,
}

/// Most color targets bound at once
pub const MAX_BOUND_TARGETS: usize = 4;

/// Values to clear the bound targets to; `None` leaves that aspect alone
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearOp {
    /// Color per bound target, in bind order
    pub colors: [Option<[f32; 4]>; MAX_BOUND_TARGETS],
    /// Depth value
    pub depth: Option<f32>,
    /// Stencil value
    pub stencil: Option<u32>,
}

impl ClearOp {
    /// Clear every bound target to one color, plus depth and stencil
    pub fn all(color: [f32; 4], depth: f32) -> Self {
        Self {
            colors: [Some(color); MAX_BOUND_TARGETS],
            depth: Some(depth),
            stencil: Some(0),
        }
    }

    /// Clear each bound target to its own color, plus depth and stencil
    ///
    /// Targets past the end of `colors` keep their contents.
    pub fn per_target(colors: &[[f32; 4]], depth: f32) -> Self {
        let mut clear = Self {
            depth: Some(depth),
            stencil: Some(0),
            ..Default::default()
        };
        for (slot, color) in clear.colors.iter_mut().zip(colors) {
            *slot = Some(*color);
        }
        clear
    }

    /// Clear color of the target bound at `index`
    pub fn color_for(&self, index: usize) -> Option<[f32; 4]> {
        self.colors.get(index).copied().flatten()
    }
}

/// Light volume meshes the backend keeps resident
///
/// The sphere has unit radius; the cone has its apex at the origin, opens
/// along -Z with length 1 and a unit base radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMesh {
    /// Unit sphere for point lights
    Sphere,
    /// Unit cone for spot lights
    Cone,
}

/// Constant buffer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantBlock {
    /// Per-frame camera matrices
    Camera,
    /// Per-light parameters
    Light,
    /// Depth reconstruction coefficients
    DepthReconstruction,
}

/// Main rendering backend trait
pub trait RenderBackend {
    /// Allocate a render target
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> BackendResult<TargetHandle>;

    /// Release a render target; unknown handles are ignored
    fn destroy_render_target(&mut self, target: TargetHandle);

    /// Bind color targets for drawing
    ///
    /// The depth-stencil surface attached to `colors[0]` becomes the active
    /// depth buffer. Targets are bound with their own [`ContentsUsage`].
    fn bind_render_targets(&mut self, colors: &[TargetHandle]) -> BackendResult<()>;

    /// Clear the currently bound targets
    fn clear(&mut self, clear: &ClearOp) -> BackendResult<()>;

    /// Replace the whole pipeline state at once
    fn apply_pipeline_state(&mut self, state: &PipelineState) -> BackendResult<()>;

    /// Bind a render target as a shader texture
    fn bind_texture(&mut self, slot: u32, target: TargetHandle) -> BackendResult<()>;

    /// Upload a constant block
    fn set_constants(&mut self, block: ConstantBlock, data: &[u8]) -> BackendResult<()>;

    /// Draw a resident light volume with the given world-view-projection
    fn draw_volume(&mut self, volume: VolumeMesh, world_view_projection: &Mat4) -> BackendResult<()>;

    /// Draw a quad covering the NDC rectangle `[min, max]` (+Y up)
    fn draw_quad(&mut self, ndc_min: Vec2, ndc_max: Vec2) -> BackendResult<()>;

    /// Draw a mesh with one world transform
    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, world: &Mat4) -> BackendResult<()>;

    /// Draw a mesh once per instance transform
    fn draw_instanced(&mut self, mesh: MeshHandle, material: MaterialHandle, instances: &[Mat4]) -> BackendResult<()>;

    /// Downcast to concrete backend type for inspection
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to mutable concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
