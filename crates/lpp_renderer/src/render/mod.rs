//! # Rendering System
//!
//! Light pre-pass deferred lighting on top of a backend-agnostic command
//! interface.
//!
//! ## Architecture
//!
//! - **Renderer**: frame driver that sequences every pass
//! - **GBuffer**: the four render targets the passes read and write
//! - **Frustum**: far-plane corners used to rebuild view-space positions
//! - **Systems**: light sorting, shadow admission, the per-light state
//!   machine, depth reconstruction and final shading
//! - **Backends**: implementations of [`RenderBackend`]; the recording
//!   backend runs without a GPU
//!
//! ## Frame Order
//!
//! ```text
//! frustum corners → shadow pool reset → light sort → shadow admission
//!   → shadow maps → GBuffer fill → depth reconstruction
//!   → light accumulation → shading reconstruction
//! ```

pub mod api;
pub mod primitives;
pub mod pipeline;
pub mod systems;
pub mod backends;

mod gbuffer;
mod frustum;
mod renderer;

pub use api::{
    RenderBackend, BackendResult, TargetHandle, MeshHandle, MaterialHandle,
    RenderTargetDesc, SurfaceFormat, DepthFormat, ContentsUsage, ClearOp,
    VolumeMesh, ConstantBlock, RendererConfig, FrameContext, MAX_BOUND_TARGETS,
};
pub use primitives::Camera;
pub use pipeline::{PipelineState, CullMode, CompareFunction, DepthState, BlendMode, ColorWrites, Technique, SurfaceKind};
pub use gbuffer::{GBuffer, NORMAL_CLEAR};
pub use frustum::{FrustumCorners, sphere_screen_bounds};
pub use renderer::{LightPrePassRenderer, FrameStats};
pub use systems::lighting::{Light, LightType, LightEntry, LightPrioritySorter};
pub use systems::shadows::{
    ShadowSlotAllocator, ShadowMapGenerator, ShadowMapPool, ShadowSlot,
    SpotShadowMap, CascadeShadowMap, ShadowPoolError, MatrixShadowGenerator,
};

/// Rendering system errors
///
/// Every variant is fatal for the operation that produced it: pool
/// exhaustion is handled by degrading shadows and never surfaces here.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// GPU resource creation failed
    ///
    /// Render target allocation has no retry path: the caller must abort
    /// initialization (or the resize) that triggered it.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A light violates its invariants (radius, spot angle)
    #[error("Invalid light: {0}")]
    InvalidLight(String),

    /// A light discriminant that the lighting passes cannot draw
    #[error("Unsupported light type discriminant: {0}")]
    UnsupportedLightType(u8),

    /// Render surfaces must have a non-zero size
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
