//! Frame Rendering Data Structures
//!
//! The application provides one [`FrameContext`] per frame; the renderer
//! reads it and never holds on to it past the frame.

use crate::render::primitives::Camera;
use crate::render::systems::lighting::Light;
use crate::scene::Drawable;

/// Complete per-frame input
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Camera snapshot for this frame
    pub camera: &'a Camera,

    /// Lights that survived visibility culling
    pub lights: &'a [Light],

    /// Terrain, static meshes, sky and water
    pub drawables: &'a [Drawable],

    /// Billboard and vegetation clusters
    pub instanced: &'a [Drawable],
}

impl<'a> FrameContext<'a> {
    /// Create a frame context
    pub fn new(camera: &'a Camera, lights: &'a [Light], drawables: &'a [Drawable], instanced: &'a [Drawable]) -> Self {
        Self {
            camera,
            lights,
            drawables,
            instanced,
        }
    }

    /// Ordinary drawables followed by instanced ones
    pub fn all_drawables(&self) -> impl Iterator<Item = &'a Drawable> {
        self.drawables.iter().chain(self.instanced.iter())
    }
}
