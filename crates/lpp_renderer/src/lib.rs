//! # LPP Renderer
//!
//! A light pre-pass (deferred lighting) renderer on top of a
//! backend-agnostic command interface.
//!
//! ## Features
//!
//! - **GBuffer**: linear depth, packed normals and specular power
//! - **Light Accumulation**: point spheres, spot cones and directional quads
//!   added into a light buffer with per-light depth/cull state
//! - **Shadows**: a bounded pool of spot maps and directional cascades handed
//!   out by light priority
//! - **Headless Backend**: every command recorded for inspection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lpp_renderer::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let config = RendererConfig::new(1280, 720);
//!     let backend = Box::new(RecordingBackend::new());
//!     let mut renderer = LightPrePassRenderer::new(backend, config)?;
//!     let mut pool = renderer.create_shadow_pool()?;
//!     let mut generator = MatrixShadowGenerator::default();
//!
//!     let camera = Camera::default();
//!     let lights = vec![Light::point(Vec3::new(0.0, 2.0, 0.0), 10.0, Vec3::new(1.0, 0.9, 0.8), 1.0)];
//!     let frame = FrameContext::new(&camera, &lights, &[], &[]);
//!     let stats = renderer.render_frame(&frame, &mut pool, &mut generator)?;
//!     println!("{} lights drawn", stats.lights_drawn);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod render;
pub mod scene;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::math::{Mat4, Transform, Vec2, Vec3},
        render::{
            backends::RecordingBackend, Camera, FrameContext, FrameStats, Light, LightPrePassRenderer, LightType,
            MatrixShadowGenerator, RenderBackend, RenderError, RenderResult, RendererConfig, ShadowMapPool,
        },
        scene::{BillboardCluster, Drawable, Sky, StaticMesh, TerrainTile, Water},
    };
}
