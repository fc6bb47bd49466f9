//! Shadow projection math
//!
//! Spot lights use a perspective projection matching their cone. Directional
//! lights split the camera view range into slices and fit one orthographic
//! projection around each slice.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::frustum::FrustumCorners;
use crate::render::primitives::Camera;
use crate::render::systems::lighting::Light;

/// Spot shadow near plane as a fraction of the light radius
pub const SPOT_SHADOW_NEAR_FRACTION: f32 = 0.01;

/// Extra depth behind each cascade so off-screen casters still land in the map
pub const CASCADE_CASTER_MARGIN: f32 = 50.0;

/// World-to-view matrix for a light at `position` looking along `direction`
pub fn light_view(position: Vec3, direction: Vec3) -> Mat4 {
    let direction = direction.normalize();
    let up = if direction.dot(&Vec3::y()).abs() > 0.99 {
        Vec3::z()
    } else {
        Vec3::y()
    };
    Mat4::look_at(position, position + direction, up)
}

/// World-to-light-clip matrix for a spot light
///
/// The frustum covers the full cone: vertical field of view twice the spot
/// half-angle, square aspect, far plane at the light radius.
pub fn spot_view_projection(light: &Light) -> Mat4 {
    let view = light_view(light.position(), light.direction());
    let near = (light.radius * SPOT_SHADOW_NEAR_FRACTION).max(0.01);
    let projection = Mat4::perspective(2.0 * light.spot_angle, 1.0, near, light.radius);
    projection * Mat4::vulkan_coordinate_transform() * view
}

/// Far distance of each cascade split
///
/// Practical split scheme: `lambda` blends a logarithmic distribution (1.0)
/// with a uniform one (0.0). The last split always ends exactly at `far`.
pub fn cascade_split_distances(near: f32, far: f32, count: usize, lambda: f32) -> Vec<f32> {
    let range = far - near;
    let ratio = far / near;
    let mut splits: Vec<f32> = (1..=count)
        .map(|i| {
            let p = i as f32 / count as f32;
            let uniform_split = near + range * p;
            let log_split = near * ratio.powf(p);
            lambda * log_split + (1.0 - lambda) * uniform_split
        })
        .collect();
    if let Some(last) = splits.last_mut() {
        *last = far;
    }
    splits
}

/// World-to-light-clip matrix covering one slice of the camera frustum
///
/// The slice is wrapped in its bounding sphere so the projection size does
/// not change as the camera rotates.
pub fn cascade_view_projection(camera: &Camera, direction: Vec3, split_near: f32, split_far: f32) -> Mat4 {
    let near = FrustumCorners::world_plane(camera, split_near);
    let far = FrustumCorners::world_plane(camera, split_far);
    let corners = near.iter().chain(far.iter());

    let center = corners.clone().fold(Vec3::zeros(), |sum, c| sum + c) / 8.0;
    let radius = corners.map(|c| (c - center).norm()).fold(0.0_f32, f32::max);

    let direction = direction.normalize();
    let eye = center - direction * (radius + CASCADE_CASTER_MARGIN);
    let view = light_view(eye, direction);
    let projection = Mat4::orthographic(-radius, radius, -radius, radius, 0.0, 2.0 * radius + CASCADE_CASTER_MARGIN);
    projection * Mat4::vulkan_coordinate_transform() * view
}
