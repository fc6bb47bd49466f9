//! Pipeline state and technique selection

pub mod pipeline_config;

pub use pipeline_config::{
    PipelineState, CullMode, CompareFunction, DepthState, BlendMode, ColorWrites,
    Technique, SurfaceKind,
};
