//! Public rendering API
//!
//! The render backend trait, renderer configuration and the per-frame
//! context handed to the renderer.

pub mod render_backend;
pub mod renderer_config;
pub mod frame_data;

pub use render_backend::{
    RenderBackend, BackendResult, TargetHandle, MeshHandle, MaterialHandle,
    RenderTargetDesc, SurfaceFormat, DepthFormat, ContentsUsage, ClearOp,
    VolumeMesh, ConstantBlock, MAX_BOUND_TARGETS,
};
pub use renderer_config::{RendererConfig, MAX_CASCADE_SPLITS};
pub use frame_data::FrameContext;
