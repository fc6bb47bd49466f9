//! Per-frame rendering stages
//!
//! Each stage owns one step of the light pre-pass and is driven in order by
//! the renderer.

pub mod lighting;
pub mod shadows;
pub mod depth_reconstruction;
pub mod shading;
