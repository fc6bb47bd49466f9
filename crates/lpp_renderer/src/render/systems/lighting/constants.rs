//! Per-light constant block
//!
//! Uploaded once per light before its draw. Every vector is in view space so
//! the shaders can combine it with positions rebuilt from linear depth.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Mat4, Vec2, Vec3};
use crate::render::api::MAX_CASCADE_SPLITS;

/// Light parameters as the lighting shaders read them
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    /// Rasterization transform of the light volume (identity for quads)
    pub world_view_projection: [[f32; 4]; 4],
    /// View-space far corners for the covered rectangle (TL, TR, BL, BR)
    pub frustum_corners: [[f32; 4]; 4],
    /// NDC rectangle the corners belong to (min.x, min.y, max.x, max.y)
    pub screen_rect: [f32; 4],
    /// Position (xyz) + radius
    pub position_radius: [f32; 4],
    /// Direction (xyz) + cosine of the spot half-angle
    pub direction_cos_angle: [f32; 4],
    /// Color (rgb) + intensity
    pub color_intensity: [f32; 4],
    /// Spot exponent, depth bias, shadow texel width, shadow texel height
    pub shadow_params: [f32; 4],
    /// View-to-light-clip matrices; only the first is used by spot lights
    pub shadow_matrices: [[[f32; 4]; 4]; MAX_CASCADE_SPLITS],
    /// Far distance of each cascade split (xyz) + split count
    pub cascade_splits: [f32; 4],
}

impl LightConstants {
    /// Shading parameters shared by every light type
    pub fn new(position: Vec3, radius: f32, direction: Vec3, cos_angle: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            world_view_projection: utils::mat4_to_cols(&Mat4::identity()),
            position_radius: [position.x, position.y, position.z, radius],
            direction_cos_angle: [direction.x, direction.y, direction.z, cos_angle],
            color_intensity: [color.x, color.y, color.z, intensity],
            ..Self::zeroed()
        }
    }

    /// Set the rasterization transform
    pub fn with_world_view_projection(mut self, wvp: &Mat4) -> Self {
        self.world_view_projection = utils::mat4_to_cols(wvp);
        self
    }

    /// Set the reconstruction corners and the rectangle they span
    pub fn with_screen_rect(mut self, corners: [[f32; 4]; 4], min: Vec2, max: Vec2) -> Self {
        self.frustum_corners = corners;
        self.screen_rect = [min.x, min.y, max.x, max.y];
        self
    }

    /// Set spot exponent and shadow sampling parameters
    pub fn with_shadow_params(mut self, spot_exponent: f32, depth_bias: f32, texel_size: Vec2) -> Self {
        self.shadow_params = [spot_exponent, depth_bias, texel_size.x, texel_size.y];
        self
    }

    /// Set shadow matrices and cascade split distances
    ///
    /// Extra entries beyond [`MAX_CASCADE_SPLITS`] are ignored.
    pub fn with_shadow_matrices(mut self, matrices: &[Mat4], splits: &[f32]) -> Self {
        for (slot, matrix) in self.shadow_matrices.iter_mut().zip(matrices) {
            *slot = utils::mat4_to_cols(matrix);
        }
        for (slot, split) in self.cascade_splits[..MAX_CASCADE_SPLITS].iter_mut().zip(splits) {
            *slot = *split;
        }
        self.cascade_splits[3] = splits.len().min(MAX_CASCADE_SPLITS) as f32;
        self
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
